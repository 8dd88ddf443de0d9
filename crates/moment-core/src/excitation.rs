//! Excitation (right-hand-side) vector assembly.
//!
//! For every RWG edge of a requested subset the builder produces the four
//! testing components $(V_{TE,J}, V_{NE,J}, V_{TH,J}, V_{NH,J})$ of the
//! incident field. The numerical work is done by an [`ExcitationKernel`]; the
//! builder gathers geometry, derives the source parameters and dispatches.
//!
//! - **Dipole**: one vectorised near-field kernel call over all edges.
//! - **Plane wave**: exactly one dyadic Green's evaluation, from the source
//!   location to the reference point, fixes the incident amplitude
//!   $\mathbf{E}_0 = \mathbf{G}_{EJ} \cdot \mathbf{J}$; one vectorised
//!   far-field kernel call then reuses it for every edge.
//! - **Delta gap**: not available; assembled as a plane wave and reported as
//!   an [`ExcitationWarning::UnimplementedExcitationFallback`].

use std::fmt;
use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex64;
use thiserror::Error;

use moment_geometry::{EdgeGeometry, MeshError, RwgMesh};

use crate::greens;
use crate::kernel::{ComponentArrays, ExcitationKernel, KernelError, NativeKernel};
use crate::types::{ExcitationKind, ExcitationSource, ExcitationVector};

/// Reference point of the plane-wave path (the coordinate origin).
pub const REFERENCE_POINT: [f64; 3] = [0.0, 0.0, 0.0];

/// Errors that abort excitation assembly. None of them is recoverable.
#[derive(Debug, Error)]
pub enum ExcitationError {
    #[error("Invalid excitation kind '{0}'. Valid kinds: dipole, plane, delta_gap")]
    InvalidExcitationKind(String),

    #[error("Edge subset is empty")]
    EmptyEdgeSubset,

    #[error("Angular frequency must be finite and positive, got {omega} rad/s")]
    InvalidFrequency { omega: f64 },

    #[error("Medium needs finite positive eps_r and mu_r, got eps_r = {eps_r}, mu_r = {mu_r}")]
    InvalidMedium { eps_r: f64, mu_r: f64 },

    #[error("Plane-wave source at {location:?} coincides with the reference point; no arrival direction")]
    DegenerateSource { location: [f64; 3] },

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    #[error("Kernel '{kernel}' failed: {source}")]
    Kernel {
        kernel: String,
        #[source]
        source: KernelError,
    },
}

/// Non-fatal conditions met while assembling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcitationWarning {
    /// `requested` is not implemented; `substituted` was assembled instead.
    UnimplementedExcitationFallback {
        requested: ExcitationKind,
        substituted: ExcitationKind,
    },
}

impl fmt::Display for ExcitationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExcitationWarning::UnimplementedExcitationFallback {
                requested,
                substituted,
            } => write!(
                f,
                "{} excitation not implemented, substituting {} excitation",
                requested, substituted
            ),
        }
    }
}

/// An assembled excitation vector and the warnings raised on the way.
#[derive(Debug, Clone)]
pub struct Excitation {
    pub vector: ExcitationVector,
    pub warnings: Vec<ExcitationWarning>,
}

/// Assembles excitation vectors through an [`ExcitationKernel`].
#[derive(Clone)]
pub struct ExcitationBuilder {
    pub kernel: Arc<dyn ExcitationKernel>,
}

impl Default for ExcitationBuilder {
    fn default() -> Self {
        Self {
            kernel: Arc::new(NativeKernel::default()),
        }
    }
}

impl ExcitationBuilder {
    pub fn new(kernel: Arc<dyn ExcitationKernel>) -> Self {
        Self { kernel }
    }

    /// Assemble the excitation vector of `source` over `edges`.
    ///
    /// Row `i` of the result belongs to `edges[i]`; repeated indices give
    /// repeated rows.
    pub fn build(
        &self,
        mesh: &RwgMesh,
        edges: &[usize],
        source: &ExcitationSource,
    ) -> Result<Excitation, ExcitationError> {
        build_excitation(self.kernel.as_ref(), mesh, edges, source)
    }
}

/// Assemble the excitation vector of `source` over `edges` with `kernel`.
pub fn build_excitation<K: ExcitationKernel + ?Sized>(
    kernel: &K,
    mesh: &RwgMesh,
    edges: &[usize],
    source: &ExcitationSource,
) -> Result<Excitation, ExcitationError> {
    if edges.is_empty() {
        return Err(ExcitationError::EmptyEdgeSubset);
    }
    check_source(source)?;
    let geometry = mesh.edge_geometry(edges)?;

    let mut warnings = Vec::new();
    let kind = match source.kind {
        ExcitationKind::DeltaGap => {
            let warning = ExcitationWarning::UnimplementedExcitationFallback {
                requested: ExcitationKind::DeltaGap,
                substituted: ExcitationKind::Plane,
            };
            log::warn!("{}", warning);
            warnings.push(warning);
            ExcitationKind::Plane
        }
        other => other,
    };

    let arrays = match kind {
        ExcitationKind::Dipole => kernel
            .dipole_excitation(
                &source.current,
                &source.location,
                &geometry,
                source.omega,
                source.medium.eps_r,
                source.medium.mu_r,
            )
            .map_err(|e| kernel_failure(kernel, e))?,
        ExcitationKind::Plane | ExcitationKind::DeltaGap => plane_wave(kernel, &geometry, source)?,
    };

    arrays
        .check_len(edges.len())
        .map_err(|e| kernel_failure(kernel, e))?;
    Ok(Excitation {
        vector: interleave(arrays),
        warnings,
    })
}

/// A zero frequency or a non-physical medium would reach the kernels as
/// `k = 0` or a NaN wavenumber.
fn check_source(source: &ExcitationSource) -> Result<(), ExcitationError> {
    if !(source.omega.is_finite() && source.omega > 0.0) {
        return Err(ExcitationError::InvalidFrequency { omega: source.omega });
    }
    if !source.medium.is_physical() {
        return Err(ExcitationError::InvalidMedium {
            eps_r: source.medium.eps_r,
            mu_r: source.medium.mu_r,
        });
    }
    Ok(())
}

fn kernel_failure<K: ExcitationKernel + ?Sized>(kernel: &K, source: KernelError) -> ExcitationError {
    ExcitationError::Kernel {
        kernel: kernel.name().to_string(),
        source,
    }
}

/// Plane wave arriving from the source location, referenced at the origin.
fn plane_wave<K: ExcitationKernel + ?Sized>(
    kernel: &K,
    geometry: &EdgeGeometry,
    source: &ExcitationSource,
) -> Result<ComponentArrays, ExcitationError> {
    let r_ref = REFERENCE_POINT;
    let offset = [
        source.location[0] - r_ref[0],
        source.location[1] - r_ref[1],
        source.location[2] - r_ref[2],
    ];
    let distance = (offset[0] * offset[0] + offset[1] * offset[1] + offset[2] * offset[2]).sqrt();
    if distance == 0.0 {
        return Err(ExcitationError::DegenerateSource {
            location: source.location,
        });
    }
    // travels from the source towards the reference point
    let k_hat = [-offset[0] / distance, -offset[1] / distance, -offset[2] / distance];

    let g = kernel
        .dyadic_greens(
            &source.location,
            &r_ref,
            source.medium.permittivity(),
            source.medium.permeability(),
            source.wavenumber(),
        )
        .map_err(|e| kernel_failure(kernel, e))?;
    let e_0 = greens::apply(&g.electric, &source.current);

    kernel
        .plane_wave_excitation(
            &e_0,
            &k_hat,
            &r_ref,
            geometry,
            source.omega,
            source.medium.eps_r,
            source.medium.mu_r,
        )
        .map_err(|e| kernel_failure(kernel, e))
}

fn interleave(arrays: ComponentArrays) -> ExcitationVector {
    let n = arrays.te_j.len();
    let mut values = Array2::<Complex64>::zeros((n, 4));
    for (c, column) in [arrays.te_j, arrays.ne_j, arrays.th_j, arrays.nh_j]
        .iter()
        .enumerate()
    {
        values.column_mut(c).assign(column);
    }
    ExcitationVector::new(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::angular_frequency;
    use crate::types::Medium;

    fn tetrahedron() -> RwgMesh {
        let vertices = vec![
            [0.0, 0.0, 0.0],
            [0.1, 0.0, 0.0],
            [0.0, 0.1, 0.0],
            [0.0, 0.0, 0.1],
        ];
        RwgMesh::from_triangles(vertices, &[[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]]).unwrap()
    }

    fn source(kind: ExcitationKind, location: [f64; 3]) -> ExcitationSource {
        ExcitationSource {
            kind,
            current: [Complex64::from(1.0), Complex64::from(0.0), Complex64::from(0.0)],
            location,
            omega: angular_frequency(1e9),
            medium: Medium::vacuum(),
        }
    }

    #[test]
    fn test_empty_subset_rejected() {
        let result = ExcitationBuilder::default().build(&tetrahedron(), &[], &source(ExcitationKind::Dipole, [0.0, 0.0, 5.0]));
        assert!(matches!(result, Err(ExcitationError::EmptyEdgeSubset)));
    }

    #[test]
    fn test_out_of_range_edge_rejected() {
        let result = ExcitationBuilder::default().build(&tetrahedron(), &[0, 9], &source(ExcitationKind::Dipole, [0.0, 0.0, 5.0]));
        assert!(matches!(result, Err(ExcitationError::Mesh(MeshError::EdgeOutOfRange { edge: 9, .. }))));
    }

    #[test]
    fn test_plane_wave_source_at_reference_rejected() {
        let result = ExcitationBuilder::default().build(&tetrahedron(), &[0], &source(ExcitationKind::Plane, REFERENCE_POINT));
        assert!(matches!(result, Err(ExcitationError::DegenerateSource { .. })));
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let mesh = tetrahedron();
        for kind in [ExcitationKind::Dipole, ExcitationKind::Plane, ExcitationKind::DeltaGap] {
            let mut src = source(kind, [0.1, 0.1, 20.0]);
            src.omega = 0.0;
            let result = ExcitationBuilder::default().build(&mesh, &[0], &src);
            assert!(matches!(result, Err(ExcitationError::InvalidFrequency { omega }) if omega == 0.0));
        }
        let mut src = source(ExcitationKind::Dipole, [0.1, 0.1, 20.0]);
        src.omega = f64::NAN;
        assert!(matches!(
            ExcitationBuilder::default().build(&mesh, &[0], &src),
            Err(ExcitationError::InvalidFrequency { .. })
        ));
    }

    #[test]
    fn test_non_physical_medium_rejected() {
        let mesh = tetrahedron();
        for (eps_r, mu_r) in [(-1.0, 1.0), (1.0, 0.0), (f64::INFINITY, 1.0)] {
            let mut src = source(ExcitationKind::Plane, [0.1, 0.1, 20.0]);
            src.medium = Medium { eps_r, mu_r };
            let result = ExcitationBuilder::default().build(&mesh, &[0], &src);
            assert!(matches!(result, Err(ExcitationError::InvalidMedium { .. })), "eps_r={eps_r} mu_r={mu_r}");
        }
    }

    #[test]
    fn test_dipole_on_quadrature_point_is_a_kernel_error() {
        // dipole placed exactly on a rule point of T+
        let mesh = tetrahedron();
        let geometry = mesh.edge_geometry(&[0]).unwrap();
        let a = geometry.vertex(0, 0);
        let b = geometry.vertex(0, 1);
        let c = geometry.opposite(0, 0);
        let on_rule = crate::kernel::quadrature::DUNAVANT_6[0].position(&a, &b, &c);
        let result = ExcitationBuilder::default().build(&mesh, &[0], &source(ExcitationKind::Dipole, on_rule));
        assert!(matches!(
            result,
            Err(ExcitationError::Kernel { source: KernelError::CoincidentPoints { .. }, .. })
        ));
    }

    #[test]
    fn test_warning_message_names_both_kinds() {
        let warning = ExcitationWarning::UnimplementedExcitationFallback {
            requested: ExcitationKind::DeltaGap,
            substituted: ExcitationKind::Plane,
        };
        let text = warning.to_string();
        assert!(text.contains("delta_gap") && text.contains("plane"));
    }

    #[test]
    fn test_vector_shape_matches_subset() {
        let mesh = tetrahedron();
        let excitation = ExcitationBuilder::default()
            .build(&mesh, &[5, 2, 2], &source(ExcitationKind::Dipole, [0.3, 0.1, 2.0]))
            .unwrap();
        assert_eq!(excitation.vector.len(), 3);
        assert_eq!(excitation.vector.values().ncols(), 4);
        assert_eq!(excitation.vector.row(1), excitation.vector.row(2));
        assert!(excitation.warnings.is_empty());
    }
}
