//! Manifest parsing and batch export
//!
//! Parses rigs.toml and coordinates exporting every rig it names into a
//! per-rig output directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::export::{export_rig, ExportOptions};
use crate::skin::DEFAULT_WEIGHT_THRESHOLD;
use crate::source::gltf::{DEFAULT_FRAME_RATE, load_rig};

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub rigs: HashMap<String, RigEntry>,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("export/")
}

#[derive(Debug, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_weight_threshold")]
    pub weight_threshold: f32,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            weight_threshold: default_weight_threshold(),
            frame_rate: default_frame_rate(),
        }
    }
}

fn default_weight_threshold() -> f32 {
    DEFAULT_WEIGHT_THRESHOLD
}

fn default_frame_rate() -> f32 {
    DEFAULT_FRAME_RATE
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RigEntry {
    Simple(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        skin: Option<String>,
        #[serde(default)]
        animation: Option<String>,
    },
}

impl RigEntry {
    pub fn path(&self) -> &Path {
        match self {
            RigEntry::Simple(p) => p,
            RigEntry::Detailed { path, .. } => path,
        }
    }

    pub fn skin(&self) -> Option<&str> {
        match self {
            RigEntry::Simple(_) => None,
            RigEntry::Detailed { skin, .. } => skin.as_deref(),
        }
    }

    pub fn animation(&self) -> Option<&str> {
        match self {
            RigEntry::Simple(_) => None,
            RigEntry::Detailed { animation, .. } => animation.as_deref(),
        }
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
    Ok(manifest)
}

/// Validate a manifest without exporting
pub fn validate(manifest: &Manifest) -> Result<()> {
    // Check that all source files exist
    for (name, entry) in &manifest.rigs {
        if !entry.path().exists() {
            anyhow::bail!("Rig '{}' source not found: {:?}", name, entry.path());
        }
    }
    Ok(())
}

/// Export all rigs from a manifest
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<()> {
    let output_dir = output_override.unwrap_or(&manifest.output.dir);
    std::fs::create_dir_all(output_dir)?;

    let options = ExportOptions {
        weight_threshold: manifest.export.weight_threshold,
    };

    for (name, entry) in &manifest.rigs {
        let rig_dir = output_dir.join(name);
        tracing::info!("Exporting rig: {} -> {:?}", name, rig_dir);

        let (rig, mut source) = load_rig(
            entry.path(),
            entry.skin(),
            entry.animation(),
            manifest.export.frame_rate,
        )
        .with_context(|| format!("Failed to load rig '{}'", name))?;
        export_rig(&rig, &mut source, &rig_dir, &options)
            .with_context(|| format!("Failed to export rig '{}'", name))?;
    }

    Ok(())
}
