//! Rig scene model
//!
//! Owned, host-independent description of one exportable character: an
//! armature of named rest bones, the skinned mesh bound to it, an optional
//! animation action and an optional color texture. Host adapters (see
//! [`crate::source`]) materialize this model from scene files; the export
//! stages consume it without knowing where it came from.

use anyhow::Result;
use glam::{Mat4, Vec2, Vec3};
use thiserror::Error;

/// Structural validation errors for a rig.
#[derive(Debug, Error)]
pub enum RigError {
    #[error("armature '{0}' has no root bone (every bone names a parent)")]
    NoRoot(String),
    #[error("armature '{armature}' has {count} root bones, expected exactly one")]
    MultipleRoots { armature: String, count: usize },
    #[error("pose snapshot has {got} bones but the armature has {expected}")]
    PoseBoneCountMismatch { expected: usize, got: usize },
}

/// One bone in rest pose.
#[derive(Debug, Clone)]
pub struct RestBone {
    pub name: String,
    /// Head position in armature space, unscaled
    pub head: Vec3,
    /// Tail position in armature space, unscaled
    pub tail: Vec3,
    /// Parent bone name; `None` marks a root candidate
    pub parent: Option<String>,
    /// Bone-local -> armature-space rest transform
    pub matrix_local: Mat4,
}

/// A skeleton in rest pose plus its object-level placement.
#[derive(Debug, Clone)]
pub struct Armature {
    pub name: String,
    pub bones: Vec<RestBone>,
    /// Object-level non-uniform scale applied to head/tail positions
    pub scale: Vec3,
    /// Armature-space -> world transform
    pub matrix_world: Mat4,
}

impl Armature {
    /// Index of the bone with the given name.
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Index of the unique parentless bone.
    ///
    /// Fails when no bone, or more than one bone, lacks a parent reference.
    /// An unresolvable parent *name* does not make a bone a root; root-ness
    /// requires an explicitly absent parent.
    pub fn root_index(&self) -> Result<usize, RigError> {
        let mut roots = self
            .bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none());
        let first = roots.next().map(|(i, _)| i);
        let extra = roots.count();
        match (first, extra) {
            (Some(index), 0) => Ok(index),
            (Some(_), extra) => Err(RigError::MultipleRoots {
                armature: self.name.clone(),
                count: extra + 1,
            }),
            (None, _) => Err(RigError::NoRoot(self.name.clone())),
        }
    }
}

/// Per-vertex membership in one weight group.
#[derive(Debug, Clone, Copy)]
pub struct GroupWeight {
    /// Index into [`SkinnedMesh::group_names`]
    pub group: usize,
    /// Raw weight as authored, not renormalized
    pub weight: f32,
}

/// Triangulated rest-pose mesh with its weight-group table.
#[derive(Debug, Clone)]
pub struct SkinnedMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    /// Per-vertex normals; empty when the host provides none
    pub normals: Vec<Vec3>,
    /// Per-vertex texture coordinates; empty when the host provides none
    pub uvs: Vec<Vec2>,
    /// Triangle vertex indices
    pub triangles: Vec<[u32; 3]>,
    /// Weight-group name table (group index -> name)
    pub group_names: Vec<String>,
    /// Per-vertex group memberships, index-aligned with `positions`
    pub vertex_groups: Vec<Vec<GroupWeight>>,
}

impl SkinnedMesh {
    /// Whether the mesh carries any weight groups at all.
    pub fn has_weight_groups(&self) -> bool {
        !self.group_names.is_empty()
    }
}

/// One animation action with an inclusive integer frame range.
#[derive(Debug, Clone)]
pub struct Action {
    pub name: String,
    pub frame_start: i32,
    pub frame_end: i32,
}

impl Action {
    /// Frames in sampling order.
    pub fn frames(&self) -> std::ops::RangeInclusive<i32> {
        self.frame_start..=self.frame_end
    }

    /// Number of frames the range covers (zero when the range is empty).
    pub fn frame_count(&self) -> usize {
        if self.frame_end < self.frame_start {
            0
        } else {
            (self.frame_end - self.frame_start + 1) as usize
        }
    }
}

/// Pose of one bone at one frame.
#[derive(Debug, Clone, Copy)]
pub struct BonePose {
    /// Pose transform relative to the rest pose, in bone-local space
    pub basis: Mat4,
    /// Posed bone-local -> armature-space transform
    pub matrix: Mat4,
}

/// All bone poses at one frame, index-aligned with [`Armature::bones`].
#[derive(Debug, Clone)]
pub struct PoseSnapshot {
    pub bones: Vec<BonePose>,
}

/// Frame-addressed pose evaluation.
///
/// The sampler drives this interface one frame at a time, in strictly
/// ascending order. Implementations own whatever scene state evaluation
/// mutates; evaluating the same frame twice must yield the same snapshot.
pub trait PoseSource {
    fn evaluate(&mut self, frame: i32) -> Result<PoseSnapshot>;
}

/// One exportable character.
#[derive(Debug, Clone)]
pub struct Rig {
    pub armature: Armature,
    pub mesh: SkinnedMesh,
    /// Active animation action; `None` degrades to placeholder streams
    pub action: Option<Action>,
    /// First texture bound to the mesh's material, if any
    pub texture: Option<RigTexture>,
}

/// Decoded color texture carried by a rig.
#[derive(Debug, Clone)]
pub struct RigTexture {
    pub name: String,
    pub image: image::RgbaImage,
}
