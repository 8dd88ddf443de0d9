//! # Moment Core
//!
//! Excitation (right-hand-side) assembly for RWG Method-of-Moments solvers of
//! surface integral equations.
//!
//! ## Architecture
//!
//! Assembly goes through the [`kernel::ExcitationKernel`] trait, which
//! evaluates dyadic Green's functions and the per-edge testing integrals. The
//! default implementation is [`kernel::NativeKernel`]. The
//! [`excitation::ExcitationBuilder`] gathers edge geometry from a
//! [`moment_geometry::RwgMesh`], derives the source parameters and dispatches
//! to the kernel.
//!
//! ## Modules
//!
//! - [`types`]: media, excitation sources and excitation vectors.
//! - [`excitation`]: excitation vector assembly.
//! - [`greens`]: free-space dyadic Green's functions.
//! - [`kernel`]: kernel trait and the native Rust kernel.
//! - [`constants`]: physical constants.

pub mod constants;
pub mod excitation;
pub mod greens;
pub mod kernel;
pub mod types;

pub use excitation::{build_excitation, Excitation, ExcitationBuilder, ExcitationError, ExcitationWarning};
pub use types::{Component, ExcitationKind, ExcitationSource, ExcitationVector, Medium, Precision, StoredExcitation};
