//! Skin weight resolution
//!
//! Collapses authored multi-group weights to the single dominant bone per
//! vertex that the viewer's handle stream expects. A vertex binds to the
//! bone whose group carries its highest raw weight, but only when that
//! weight clears the acceptance threshold and the group name resolves to a
//! bone; everything else exports as -1 (unbound).

use hashbrown::HashMap;

use crate::rig::{Armature, SkinnedMesh};

/// Dominant weights at or below this are exported unbound.
pub const DEFAULT_WEIGHT_THRESHOLD: f32 = 0.6;

/// Resolve each vertex to one bone index, or -1 when unbound.
///
/// Acceptance requires the dominant raw weight to be strictly greater than
/// `threshold` and the owning group's name to match a bone. Ties keep the
/// first group seen in membership order, so repeated exports bind
/// identically.
pub fn resolve_bindings(mesh: &SkinnedMesh, armature: &Armature, threshold: f32) -> Vec<i32> {
    let bone_index: HashMap<&str, usize> = armature
        .bones
        .iter()
        .enumerate()
        .map(|(i, b)| (b.name.as_str(), i))
        .collect();

    mesh.vertex_groups
        .iter()
        .map(|memberships| {
            let mut best_group: Option<usize> = None;
            let mut best_weight = -1.0f32;
            for membership in memberships {
                if membership.weight > best_weight {
                    best_weight = membership.weight;
                    best_group = Some(membership.group);
                }
            }

            best_group
                .filter(|_| best_weight > threshold)
                .and_then(|group| mesh.group_names.get(group))
                .and_then(|name| bone_index.get(name.as_str()))
                .map(|&index| index as i32)
                .unwrap_or(-1)
        })
        .collect()
}
