//! Excitation kernel abstraction.
//!
//! The [`ExcitationKernel`] trait is the boundary between excitation assembly
//! and the numerical evaluation of fields and testing integrals. Kernels see
//! only flat numeric buffers ([`EdgeGeometry`]) and plain parameters, so an
//! implementation backed by a native library fits behind the same trait as
//! the pure-Rust [`NativeKernel`].

pub mod native;
pub mod quadrature;

use ndarray::Array1;
use num_complex::Complex64;
use thiserror::Error;

use moment_geometry::EdgeGeometry;

use crate::greens::DyadicGreens;

pub use native::NativeKernel;

/// Errors raised by an excitation kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("Source and observation points coincide at {point:?}")]
    CoincidentPoints { point: [f64; 3] },

    #[error("Edge row {row} has a degenerate {side} triangle")]
    DegenerateTriangle { row: usize, side: &'static str },

    #[error("Kernel returned {got} values for component {component}, expected {expected}")]
    LengthMismatch {
        component: &'static str,
        expected: usize,
        got: usize,
    },
}

/// The four per-edge component arrays returned by a kernel, one entry per
/// geometry row.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentArrays {
    pub te_j: Array1<Complex64>,
    pub ne_j: Array1<Complex64>,
    pub th_j: Array1<Complex64>,
    pub nh_j: Array1<Complex64>,
}

impl ComponentArrays {
    pub fn zeros(n: usize) -> Self {
        Self {
            te_j: Array1::zeros(n),
            ne_j: Array1::zeros(n),
            th_j: Array1::zeros(n),
            nh_j: Array1::zeros(n),
        }
    }

    /// Check every array against the expected edge count.
    pub fn check_len(&self, expected: usize) -> Result<(), KernelError> {
        for (component, array) in [
            ("V_TE_J", &self.te_j),
            ("V_NE_J", &self.ne_j),
            ("V_TH_J", &self.th_j),
            ("V_NH_J", &self.nh_j),
        ] {
            if array.len() != expected {
                return Err(KernelError::LengthMismatch {
                    component,
                    expected,
                    got: array.len(),
                });
            }
        }
        Ok(())
    }
}

/// Field and testing-integral evaluation for excitation assembly.
///
/// Implementations must be pure: the same inputs always give the same
/// outputs, and each geometry row is evaluated independently of the others.
pub trait ExcitationKernel: Send + Sync {
    /// Electric and magnetic dyadic Green's functions of a point source.
    ///
    /// `permittivity` and `permeability` are absolute (F/m, H/m).
    fn dyadic_greens(
        &self,
        source: &[f64; 3],
        observation: &[f64; 3],
        permittivity: f64,
        permeability: f64,
        wavenumber: f64,
    ) -> Result<DyadicGreens, KernelError>;

    /// Test every edge of `geometry` against the near field of a current
    /// element `current` at `source`.
    fn dipole_excitation(
        &self,
        current: &[Complex64; 3],
        source: &[f64; 3],
        geometry: &EdgeGeometry,
        omega: f64,
        eps_r: f64,
        mu_r: f64,
    ) -> Result<ComponentArrays, KernelError>;

    /// Test every edge of `geometry` against a plane wave of amplitude
    /// `amplitude` at `reference`, travelling along `direction`.
    #[allow(clippy::too_many_arguments)]
    fn plane_wave_excitation(
        &self,
        amplitude: &[Complex64; 3],
        direction: &[f64; 3],
        reference: &[f64; 3],
        geometry: &EdgeGeometry,
        omega: f64,
        eps_r: f64,
        mu_r: f64,
    ) -> Result<ComponentArrays, KernelError>;

    /// Human-readable name of the kernel.
    fn name(&self) -> &str;
}
