//! Shared rig stream formats for the Marrow skeletal viewer
//!
//! This crate provides the plain-text formats shared between:
//! - `marrow-export` (rig export pipeline)
//! - the viewer/runtime that loads exported rigs
//!
//! # Modules
//!
//! - [`formats`] - DMAT numeric streams and the skeleton file grammar
//! - [`fileset`] - Fixed output file names for an exported rig

pub mod fileset;
pub mod formats;

// Re-export the file set constants
pub use fileset::{RIG_FILE_SET, RigFileSet};

// Re-export commonly used format items
pub use formats::{
    Dmat, DmatError, ParsedSkel, SkelBone, SkelError, read_dmat, read_skel, write_dmat,
    write_index_dmat, write_skel,
};
