//! Skeleton topology extraction
//!
//! Builds the rest skeleton that `rest.skel` serializes: per-bone head/tail
//! segments with the armature's object scale applied, plus parent edges in
//! deterministic bone order. Edges whose parent name cannot be resolved are
//! skipped with a warning rather than failing the export.

use hashbrown::HashMap;
use marrow_common::SkelBone;

use crate::rig::Armature;

/// Rest skeleton ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonTopology {
    pub bones: Vec<SkelBone>,
    /// `(parent, child)` pairs in child-index order
    pub edges: Vec<(u32, u32)>,
}

/// Build the serializable rest skeleton for an armature.
///
/// Head and tail positions are scaled component-wise by the armature's
/// object scale. Edges come out in child-index order, so repeated exports of
/// the same armature are byte-identical; consumers treat them as a set.
pub fn build_topology(armature: &Armature) -> SkeletonTopology {
    let index_of: HashMap<&str, usize> = armature
        .bones
        .iter()
        .enumerate()
        .map(|(i, b)| (b.name.as_str(), i))
        .collect();

    let bones = armature
        .bones
        .iter()
        .map(|bone| SkelBone {
            head: (bone.head * armature.scale).to_array(),
            tail: (bone.tail * armature.scale).to_array(),
        })
        .collect();

    let mut edges = Vec::new();
    for (child, bone) in armature.bones.iter().enumerate() {
        let Some(parent_name) = bone.parent.as_deref() else {
            continue;
        };
        match index_of.get(parent_name) {
            Some(&parent) if parent != child => {
                edges.push((parent as u32, child as u32));
            }
            Some(_) => {
                tracing::warn!("Bone '{}' names itself as parent, skipping edge", bone.name);
            }
            None => {
                tracing::warn!(
                    "Bone '{}' references unknown parent '{}', skipping edge",
                    bone.name,
                    parent_name
                );
            }
        }
    }

    SkeletonTopology { bones, edges }
}
