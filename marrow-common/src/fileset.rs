//! Output file names for an exported rig.
//!
//! This module defines the `RigFileSet` struct which serves as the single
//! source of truth for the fixed file names an export produces. The viewer
//! loads rigs by directory, so every exporter and loader must agree on these
//! names exactly.
//!
//! # Example
//!
//! ```
//! use marrow_common::RIG_FILE_SET;
//!
//! assert_eq!(RIG_FILE_SET.skeleton, "rest.skel");
//! assert_eq!(RIG_FILE_SET.pose, "pose.dmat");
//! ```

/// File name set for one exported rig directory.
///
/// Each exported rig occupies its own directory containing exactly these
/// files. Names are fixed; the directory carries the rig's identity.
#[derive(Debug, Clone, Copy)]
pub struct RigFileSet {
    /// Format version for backward compatibility
    pub version: u32,

    /// Rest-pose mesh (Wavefront OBJ)
    pub mesh: &'static str,

    /// Skeleton topology (b/p records)
    pub skeleton: &'static str,

    /// Per-vertex bone bindings (dimension-1 DMAT, integer body)
    pub weights: &'static str,

    /// Per-frame bone-local quaternions (dimension-4 DMAT)
    pub pose: &'static str,

    /// Per-frame root world positions (dimension-3 DMAT)
    pub root_positions: &'static str,

    /// Color texture (JPEG, best effort)
    pub texture: &'static str,
}

impl RigFileSet {
    /// Create a new rig file set.
    pub const fn new(
        version: u32,
        mesh: &'static str,
        skeleton: &'static str,
        weights: &'static str,
        pose: &'static str,
        root_positions: &'static str,
        texture: &'static str,
    ) -> Self {
        Self {
            version,
            mesh,
            skeleton,
            weights,
            pose,
            root_positions,
            texture,
        }
    }

    /// All file names in the order the exporter writes them.
    pub const fn names(&self) -> [&'static str; 6] {
        [
            self.mesh,
            self.skeleton,
            self.weights,
            self.pose,
            self.root_positions,
            self.texture,
        ]
    }
}

/// Marrow rig file set.
///
/// Single source of truth for exported rig file names:
/// `rest.obj`, `rest.skel`, `handles.dmat`, `pose.dmat`, `rootpos.dmat`,
/// `texture.jpg`.
pub const RIG_FILE_SET: RigFileSet = RigFileSet::new(
    1,
    "rest.obj",
    "rest.skel",
    "handles.dmat",
    "pose.dmat",
    "rootpos.dmat",
    "texture.jpg",
);
