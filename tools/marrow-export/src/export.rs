//! Rig export orchestration
//!
//! Drives the full pipeline for one rig: rest mesh, skeleton topology, bone
//! bindings, sampled pose streams and color texture, each under its fixed
//! file name in the output directory. Structural problems (empty mesh,
//! missing or ambiguous root) abort before anything is written; per-stream
//! absences degrade to the documented placeholder with a warning. A failure
//! mid-run leaves already-written files in place.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use marrow_common::{RIG_FILE_SET, write_dmat, write_index_dmat, write_skel};

use crate::animation::sample_action;
use crate::mesh::write_obj;
use crate::rig::{PoseSource, Rig};
use crate::skeleton::build_topology;
use crate::skin::{DEFAULT_WEIGHT_THRESHOLD, resolve_bindings};
use crate::texture::save_jpeg;

/// Tunable export parameters.
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Minimum dominant weight for a vertex to bind to a bone
    pub weight_threshold: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            weight_threshold: DEFAULT_WEIGHT_THRESHOLD,
        }
    }
}

/// Files a completed export wrote, in write order.
#[derive(Debug)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
}

fn create_stream(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create output: {:?}", path))?;
    Ok(BufWriter::new(file))
}

/// Export one rig into `output_dir`.
///
/// Writes `rest.obj`, `rest.skel`, `handles.dmat`, `pose.dmat` and
/// `rootpos.dmat` unconditionally (the latter streams as placeholders when
/// the rig has no action or no bones), plus `texture.jpg` when the rig
/// carries a texture and it encodes cleanly.
pub fn export_rig(
    rig: &Rig,
    source: &mut dyn PoseSource,
    output_dir: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    if rig.mesh.positions.is_empty() {
        bail!("mesh '{}' has no vertices", rig.mesh.name);
    }
    let has_bones = !rig.armature.bones.is_empty();
    if has_bones {
        // Validate the root up front so a malformed skeleton writes nothing
        rig.armature.root_index()?;
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut summary = ExportSummary { files: Vec::new() };

    let mesh_path = output_dir.join(RIG_FILE_SET.mesh);
    {
        let mut writer = create_stream(&mesh_path)?;
        write_obj(&mut writer, &rig.mesh)
            .with_context(|| format!("Failed to write mesh: {:?}", mesh_path))?;
    }
    tracing::info!(
        "Exported rest mesh '{}': {} vertices, {} triangles",
        rig.mesh.name,
        rig.mesh.positions.len(),
        rig.mesh.triangles.len()
    );
    summary.files.push(mesh_path);

    let skeleton = build_topology(&rig.armature);
    let skel_path = output_dir.join(RIG_FILE_SET.skeleton);
    {
        let mut writer = create_stream(&skel_path)?;
        write_skel(&mut writer, &skeleton.bones, &skeleton.edges)
            .with_context(|| format!("Failed to write skeleton: {:?}", skel_path))?;
    }
    tracing::info!(
        "Exported skeleton '{}': {} bones, {} edges",
        rig.armature.name,
        skeleton.bones.len(),
        skeleton.edges.len()
    );
    summary.files.push(skel_path);

    let handles_path = output_dir.join(RIG_FILE_SET.weights);
    let bindings = if rig.mesh.has_weight_groups() {
        resolve_bindings(&rig.mesh, &rig.armature, options.weight_threshold)
    } else {
        tracing::warn!(
            "Mesh '{}' has no weight groups, writing absence marker",
            rig.mesh.name
        );
        Vec::new()
    };
    {
        let mut writer = create_stream(&handles_path)?;
        write_index_dmat(&mut writer, &bindings)
            .with_context(|| format!("Failed to write bindings: {:?}", handles_path))?;
    }
    if !bindings.is_empty() {
        let bound = bindings.iter().filter(|&&b| b >= 0).count();
        tracing::info!(
            "Exported bone bindings: {}/{} vertices bound",
            bound,
            bindings.len()
        );
    }
    summary.files.push(handles_path);

    let pose_path = output_dir.join(RIG_FILE_SET.pose);
    let root_path = output_dir.join(RIG_FILE_SET.root_positions);
    match &rig.action {
        Some(action) if has_bones => {
            let sampled = sample_action(&rig.armature, action, source)?;
            {
                let mut writer = create_stream(&pose_path)?;
                write_dmat(
                    &mut writer,
                    4,
                    &[
                        &sampled.rot_x,
                        &sampled.rot_y,
                        &sampled.rot_z,
                        &sampled.rot_w,
                    ],
                )
                .with_context(|| format!("Failed to write pose stream: {:?}", pose_path))?;
            }
            {
                let mut writer = create_stream(&root_path)?;
                write_dmat(
                    &mut writer,
                    3,
                    &[&sampled.root_x, &sampled.root_y, &sampled.root_z],
                )
                .with_context(|| format!("Failed to write root positions: {:?}", root_path))?;
            }
            tracing::info!(
                "Exported action '{}': {} frames x {} bones",
                action.name,
                sampled.frame_count,
                sampled.bone_count
            );
        }
        _ => {
            if rig.action.is_none() {
                tracing::warn!(
                    "Rig '{}' has no action, writing placeholder pose streams",
                    rig.armature.name
                );
            } else {
                tracing::warn!(
                    "Armature '{}' has no bones, writing placeholder pose streams",
                    rig.armature.name
                );
            }
            create_stream(&pose_path)?;
            create_stream(&root_path)?;
        }
    }
    summary.files.push(pose_path);
    summary.files.push(root_path);

    let texture_path = output_dir.join(RIG_FILE_SET.texture);
    match &rig.texture {
        Some(texture) => match save_jpeg(texture, &texture_path) {
            Ok(()) => summary.files.push(texture_path),
            Err(err) => tracing::warn!("Texture export failed: {:#}", err),
        },
        None => tracing::warn!(
            "Rig '{}' has no texture, skipping {}",
            rig.armature.name,
            RIG_FILE_SET.texture
        ),
    }

    tracing::info!(
        "Export complete: {} files in {:?}",
        summary.files.len(),
        output_dir
    );

    Ok(summary)
}
