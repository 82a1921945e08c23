//! Animation sampling
//!
//! Drives a rig's pose source across its action's frame range and collects
//! the two streams `pose.dmat` and `rootpos.dmat` serialize: per-bone
//! rotation quaternions conjugated into armature space, and the root bone's
//! world-space position remapped to engine axes.

use anyhow::Result;

use crate::math::{checked_inverse, remap_to_engine, rotation_quat};
use crate::rig::{Action, Armature, PoseSource, RigError};

/// Sampled animation streams in frame-major, bone-minor order.
#[derive(Debug, Clone)]
pub struct SampledAnimation {
    pub bone_count: usize,
    pub frame_count: usize,
    /// Quaternion components, each `frame_count * bone_count` long
    pub rot_x: Vec<f32>,
    pub rot_y: Vec<f32>,
    pub rot_z: Vec<f32>,
    pub rot_w: Vec<f32>,
    /// Root world position components, each `frame_count` long
    pub root_x: Vec<f32>,
    pub root_y: Vec<f32>,
    pub root_z: Vec<f32>,
}

/// Sample every frame of `action` through `source`.
///
/// Frames are evaluated in strictly ascending order. For each frame, each
/// bone's pose basis is conjugated into armature space
/// (`rest * basis * rest^-1`) and reduced to a rotation quaternion; the
/// validated root bone additionally contributes its world translation,
/// remapped to engine axes. A snapshot whose bone count disagrees with the
/// armature aborts the run.
pub fn sample_action(
    armature: &Armature,
    action: &Action,
    source: &mut dyn PoseSource,
) -> Result<SampledAnimation> {
    let root = armature.root_index()?;
    let bone_count = armature.bones.len();
    let frame_count = action.frame_count();

    // Rest matrices and their inverses are frame-invariant
    let rest: Vec<_> = armature.bones.iter().map(|b| b.matrix_local).collect();
    let rest_inv = rest
        .iter()
        .map(checked_inverse)
        .collect::<Result<Vec<_>, _>>()?;

    let stream_len = frame_count * bone_count;
    let mut sampled = SampledAnimation {
        bone_count,
        frame_count,
        rot_x: Vec::with_capacity(stream_len),
        rot_y: Vec::with_capacity(stream_len),
        rot_z: Vec::with_capacity(stream_len),
        rot_w: Vec::with_capacity(stream_len),
        root_x: Vec::with_capacity(frame_count),
        root_y: Vec::with_capacity(frame_count),
        root_z: Vec::with_capacity(frame_count),
    };

    for frame in action.frames() {
        let snapshot = source.evaluate(frame)?;
        if snapshot.bones.len() != bone_count {
            return Err(RigError::PoseBoneCountMismatch {
                expected: bone_count,
                got: snapshot.bones.len(),
            }
            .into());
        }

        for (index, pose) in snapshot.bones.iter().enumerate() {
            let armature_space = rest[index] * pose.basis * rest_inv[index];
            let q = rotation_quat(&armature_space);
            sampled.rot_x.push(q.x);
            sampled.rot_y.push(q.y);
            sampled.rot_z.push(q.z);
            sampled.rot_w.push(q.w);
        }

        let world = armature.matrix_world * snapshot.bones[root].matrix;
        let position = remap_to_engine(world.w_axis.truncate());
        sampled.root_x.push(position.x);
        sampled.root_y.push(position.y);
        sampled.root_z.push(position.z);
    }

    Ok(sampled)
}
