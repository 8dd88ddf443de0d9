//! Integration tests: excitation assembly properties that hold for any mesh
//! and any kernel.

use std::sync::atomic::{AtomicUsize, Ordering};

use num_complex::Complex64;

use moment_core::constants::angular_frequency;
use moment_core::greens::DyadicGreens;
use moment_core::kernel::{ComponentArrays, ExcitationKernel, KernelError, NativeKernel};
use moment_core::{
    build_excitation, Component, ExcitationBuilder, ExcitationError, ExcitationKind, ExcitationSource,
    ExcitationWarning, Medium, Precision,
};
use moment_geometry::{EdgeGeometry, RwgEdge, RwgMesh};

/// Delegates to [`NativeKernel`] and counts dyadic Green's evaluations.
#[derive(Default)]
struct CountingKernel {
    inner: NativeKernel,
    greens_calls: AtomicUsize,
    kernel_calls: AtomicUsize,
}

impl ExcitationKernel for CountingKernel {
    fn dyadic_greens(
        &self,
        source: &[f64; 3],
        observation: &[f64; 3],
        permittivity: f64,
        permeability: f64,
        wavenumber: f64,
    ) -> Result<DyadicGreens, KernelError> {
        self.greens_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .dyadic_greens(source, observation, permittivity, permeability, wavenumber)
    }

    fn dipole_excitation(
        &self,
        current: &[Complex64; 3],
        source: &[f64; 3],
        geometry: &EdgeGeometry,
        omega: f64,
        eps_r: f64,
        mu_r: f64,
    ) -> Result<ComponentArrays, KernelError> {
        self.kernel_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .dipole_excitation(current, source, geometry, omega, eps_r, mu_r)
    }

    fn plane_wave_excitation(
        &self,
        amplitude: &[Complex64; 3],
        direction: &[f64; 3],
        reference: &[f64; 3],
        geometry: &EdgeGeometry,
        omega: f64,
        eps_r: f64,
        mu_r: f64,
    ) -> Result<ComponentArrays, KernelError> {
        self.kernel_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .plane_wave_excitation(amplitude, direction, reference, geometry, omega, eps_r, mu_r)
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// A closed octahedron: 12 interior edges, all CFIE-capable.
fn octahedron() -> RwgMesh {
    let vertices = vec![
        [0.1, 0.0, 0.0],
        [-0.1, 0.0, 0.0],
        [0.0, 0.1, 0.0],
        [0.0, -0.1, 0.0],
        [0.0, 0.0, 0.1],
        [0.0, 0.0, -0.1],
    ];
    let triangles = [
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];
    RwgMesh::from_triangles(vertices, &triangles).unwrap()
}

/// One interior edge of length 0.1 m shared by two flat triangles.
fn single_edge_pair() -> RwgMesh {
    let vertices = vec![
        [0.0, 0.0, 0.0],
        [0.1, 0.0, 0.0],
        [0.05, 0.08, 0.0],
        [0.05, -0.08, 0.0],
    ];
    let edge = RwgEdge {
        vertices: [0, 1],
        opposite: [2, 3],
        triangles: [0, 1],
        cfie_ok: true,
    };
    RwgMesh::new(vertices, vec![edge]).unwrap()
}

fn source(kind: ExcitationKind, location: [f64; 3], frequency_hz: f64) -> ExcitationSource {
    ExcitationSource {
        kind,
        current: [Complex64::from(1.0), Complex64::from(0.0), Complex64::from(0.0)],
        location,
        omega: angular_frequency(frequency_hz),
        medium: Medium::vacuum(),
    }
}

#[test]
fn test_plane_wave_evaluates_greens_once() {
    let mesh = octahedron();
    let src = source(ExcitationKind::Plane, [0.5, 0.3, 12.0], 1e9);
    for edges in [vec![0], mesh.all_edges()] {
        let kernel = CountingKernel::default();
        build_excitation(&kernel, &mesh, &edges, &src).unwrap();
        assert_eq!(kernel.greens_calls.load(Ordering::SeqCst), 1);
        assert_eq!(kernel.kernel_calls.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn test_dipole_uses_single_kernel_call() {
    let mesh = octahedron();
    let kernel = CountingKernel::default();
    let src = source(ExcitationKind::Dipole, [0.5, 0.3, 2.0], 1e9);
    build_excitation(&kernel, &mesh, &mesh.all_edges(), &src).unwrap();
    assert_eq!(kernel.greens_calls.load(Ordering::SeqCst), 0);
    assert_eq!(kernel.kernel_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_edge_subset_locality() {
    let mesh = octahedron();
    let builder = ExcitationBuilder::default();
    for kind in [ExcitationKind::Dipole, ExcitationKind::Plane] {
        let src = source(kind, [0.4, -0.2, 3.0], 1.5e9);
        let full = builder.build(&mesh, &mesh.all_edges(), &src).unwrap().vector;
        let subset = [7, 2, 11];
        let partial = builder.build(&mesh, &subset, &src).unwrap().vector;
        for (i, &edge) in subset.iter().enumerate() {
            assert_eq!(partial.row(i), full.row(edge), "{kind} edge {edge}");
        }
    }
}

#[test]
fn test_delta_gap_falls_back_to_plane() {
    let mesh = octahedron();
    let builder = ExcitationBuilder::default();
    let edges = mesh.all_edges();
    let location = [0.2, 0.1, 8.0];

    let plane = builder
        .build(&mesh, &edges, &source(ExcitationKind::Plane, location, 2e9))
        .unwrap();
    let gap = builder
        .build(&mesh, &edges, &source(ExcitationKind::DeltaGap, location, 2e9))
        .unwrap();

    assert_eq!(gap.vector, plane.vector);
    assert!(plane.warnings.is_empty());
    assert_eq!(
        gap.warnings,
        vec![ExcitationWarning::UnimplementedExcitationFallback {
            requested: ExcitationKind::DeltaGap,
            substituted: ExcitationKind::Plane,
        }]
    );
}

#[test]
fn test_unknown_kind_name_rejected() {
    let result = ExcitationSource::from_kind_name(
        "gaussian_beam",
        [Complex64::from(1.0), Complex64::from(0.0), Complex64::from(0.0)],
        [0.0, 0.0, 1.0],
        angular_frequency(1e9),
        Medium::vacuum(),
    );
    assert!(matches!(result, Err(ExcitationError::InvalidExcitationKind(ref name)) if name == "gaussian_beam"));
}

#[test]
fn test_single_edge_dipole_and_plane() {
    let mesh = single_edge_pair();
    let builder = ExcitationBuilder::default();
    let location = [0.1, 0.1, 20.0];

    let dipole = builder
        .build(&mesh, &[0], &source(ExcitationKind::Dipole, location, 2.12e9))
        .unwrap();
    let plane = builder
        .build(&mesh, &[0], &source(ExcitationKind::Plane, location, 2.12e9))
        .unwrap();

    assert_eq!(dipole.vector.len(), 1);
    assert_eq!(plane.vector.len(), 1);
    for value in dipole.vector.row(0).iter().chain(plane.vector.row(0).iter()) {
        assert!(value.re.is_finite() && value.im.is_finite());
    }
    assert!(dipole.vector.row(0)[Component::TangentialMagnetic.index()].norm() > 0.0);
    assert_ne!(dipole.vector.row(0), plane.vector.row(0));
}

#[test]
fn test_cfie_components_vanish_on_open_mesh() {
    // one triangle pair from from_triangles is open: no CFIE testing
    let vertices = vec![
        [0.0, 0.0, 0.0],
        [0.1, 0.0, 0.0],
        [0.05, 0.08, 0.0],
        [0.05, -0.08, 0.0],
    ];
    let mesh = RwgMesh::from_triangles(vertices, &[[0, 1, 2], [1, 0, 3]]).unwrap();
    assert!(!mesh.is_closed());
    let excitation = ExcitationBuilder::default()
        .build(&mesh, &mesh.all_edges(), &source(ExcitationKind::Dipole, [0.0, 0.0, 1.0], 1e9))
        .unwrap();
    for i in 0..excitation.vector.len() {
        let row = excitation.vector.row(i);
        assert_eq!(row[Component::NormalElectric.index()], Complex64::from(0.0));
        assert_eq!(row[Component::NormalMagnetic.index()], Complex64::from(0.0));
    }
}

#[test]
fn test_reduced_storage_keeps_shape() {
    let mesh = octahedron();
    let excitation = ExcitationBuilder::default()
        .build(&mesh, &mesh.all_edges(), &source(ExcitationKind::Plane, [1.0, 1.0, 1.0], 1e9))
        .unwrap();
    let stored = excitation.vector.narrow(Precision::Reduced);
    assert_eq!(stored.len(), mesh.num_edges());
    let full = excitation.vector.row(3)[0];
    let narrowed = stored.get(3, Component::TangentialElectric);
    assert!((full - narrowed).norm() <= 1e-6 * full.norm().max(1e-30));
}
