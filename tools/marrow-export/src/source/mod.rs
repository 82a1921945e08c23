//! Host scene adapters
//!
//! Each adapter loads one scene format and materializes the
//! [`crate::rig::Rig`] model plus a matching [`crate::rig::PoseSource`].

pub mod gltf;
