//! Programmatic GLB generation for integration tests.
//!
//! Builds a small skinned character entirely in memory: a vertical quad
//! strip bound to a Root -> Spine -> Head joint chain under an off-origin
//! armature node, a base color texture, and a two-keyframe "Wave" animation
//! that translates the root and rotates the spine while leaving the head
//! unanimated.

mod glb;

pub use scene::{ANIMATION_DURATION, ARMATURE_TRANSLATION, JOINT_NAMES, ROOT_END_TRANSLATION};

/// Generate the skinned GLB with its animation.
pub fn generate_skinned_glb() -> Vec<u8> {
    glb::build_glb(&scene::create_scene(), true)
}

/// Generate the same asset without any animation.
pub fn generate_rest_only_glb() -> Vec<u8> {
    glb::build_glb(&scene::create_scene(), false)
}
