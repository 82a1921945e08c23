//! Color texture export (decoded image -> texture.jpg)

use anyhow::{Context, Result};
use std::path::Path;

use crate::rig::RigTexture;

/// Save the rig's color texture as JPEG.
///
/// JPEG carries no alpha channel, so the decoded RGBA pixels are flattened
/// to RGB before encoding.
pub fn save_jpeg(texture: &RigTexture, output: &Path) -> Result<()> {
    let (width, height) = texture.image.dimensions();
    let rgb = image::DynamicImage::ImageRgba8(texture.image.clone()).to_rgb8();
    rgb.save_with_format(output, image::ImageFormat::Jpeg)
        .with_context(|| format!("Failed to write texture: {:?}", output))?;

    tracing::info!(
        "Exported texture '{}': {}x{} -> {:?}",
        texture.name,
        width,
        height,
        output
    );

    Ok(())
}
