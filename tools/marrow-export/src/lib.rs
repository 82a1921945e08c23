//! marrow-export library
//!
//! Provides rig export stages for use by other tools and the export CLI.

pub mod animation;
pub mod export;
pub mod manifest;
pub mod math;
pub mod mesh;
pub mod rig;
pub mod skeleton;
pub mod skin;
pub mod source;
pub mod texture;

// Re-export the stream formats and the viewer file set from marrow-common
pub use marrow_common::{
    Dmat, ParsedSkel, read_dmat, read_skel, RIG_FILE_SET, RigFileSet, SkelBone, write_dmat,
    write_index_dmat, write_skel,
};

// Re-export the rig model and host boundary
pub use rig::{
    Action, Armature, BonePose, GroupWeight, PoseSnapshot, PoseSource, RestBone, Rig, RigError,
    RigTexture, SkinnedMesh,
};

// Re-export the export pipeline entry points
pub use export::{export_rig, ExportOptions, ExportSummary};

// Re-export sampling and binding stages
pub use animation::{sample_action, SampledAnimation};
pub use skeleton::{build_topology, SkeletonTopology};
pub use skin::{DEFAULT_WEIGHT_THRESHOLD, resolve_bindings};

// Re-export the glTF host adapter
pub use source::gltf::{DEFAULT_FRAME_RATE, GltfPoseSource, load_rig};
