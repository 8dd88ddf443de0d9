//! # Moment Geometry
//!
//! Surface geometry for the moment solver. This crate provides:
//!
//! - **RWG mesh** ([`mesh`]): vertex table and RWG edge records, topology
//!   derivation from triangles, and the flat per-edge geometry buffers that
//!   excitation kernels consume.
//! - **File parsers** ([`parsers`]): import surfaces from `.obj` files.
//! - **Placement** ([`transform`]): scale and offset a target in the
//!   simulation frame.

pub mod mesh;
pub mod parsers;
pub mod transform;

pub use mesh::{EdgeGeometry, MeshError, RwgEdge, RwgMesh, NO_TRIANGLE};
