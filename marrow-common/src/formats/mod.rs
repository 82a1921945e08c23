//! Marrow rig stream formats
//!
//! Plain-text formats for exported rig data. All numeric output is fixed
//! six-decimal floating point except bone binding indices, which are plain
//! integers. Writers validate shape (dimension/arity/length coherence) before
//! emitting anything; readers return typed errors with line positions.
//!
//! File name constants live in [`crate::fileset`].

pub mod dmat;
pub mod skel;

pub use dmat::*;
pub use skel::*;
