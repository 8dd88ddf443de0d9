//! Pure-Rust excitation kernel.
//!
//! Each RWG function
//! $\mathbf{f}(\mathbf{r}) = \pm \frac{l}{2A^\pm}(\mathbf{r} - \mathbf{r}^\pm_{\text{opp}})$
//! is tested against the incident fields with a six-point rule on $T^+$ and
//! $T^-$:
//!
//! - $V_{TE,J} = \langle \mathbf{f}, \mathbf{E} \rangle$,
//!   $V_{TH,J} = \langle \mathbf{f}, \mathbf{H} \rangle$
//! - $V_{NE,J} = \langle \mathbf{f}, \hat{n} \times \mathbf{E} \rangle$,
//!   $V_{NH,J} = \langle \mathbf{f}, \hat{n} \times \mathbf{H} \rangle$
//!   on CFIE edges, zero elsewhere.
//!
//! Edges are evaluated in parallel with Rayon once the edge count reaches
//! [`NativeKernel::parallel_threshold`].

use nalgebra::Vector3;
use num_complex::Complex64;
use rayon::prelude::*;

use moment_geometry::EdgeGeometry;

use super::quadrature::DUNAVANT_6;
use super::{ComponentArrays, ExcitationKernel, KernelError};
use crate::greens::{dyadic_greens, DyadicGreens};
use crate::types::Medium;

type Fields = ([Complex64; 3], [Complex64; 3]);

/// Kernel evaluating fields and testing integrals in Rust.
#[derive(Debug, Clone)]
pub struct NativeKernel {
    /// Edge count from which rows are evaluated on the Rayon pool.
    pub parallel_threshold: usize,
}

impl Default for NativeKernel {
    fn default() -> Self {
        Self {
            parallel_threshold: 256,
        }
    }
}

impl NativeKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `field` on every edge row and split the results into the four
    /// component arrays.
    fn test_all_edges<F>(&self, geometry: &EdgeGeometry, field: F) -> Result<ComponentArrays, KernelError>
    where
        F: Fn(&[f64; 3]) -> Result<Fields, KernelError> + Sync,
    {
        let n = geometry.len();
        let rows: Vec<[Complex64; 4]> = if n >= self.parallel_threshold {
            (0..n)
                .into_par_iter()
                .map(|row| test_edge(geometry, row, &field))
                .collect::<Result<_, _>>()?
        } else {
            (0..n)
                .map(|row| test_edge(geometry, row, &field))
                .collect::<Result<_, _>>()?
        };

        let mut arrays = ComponentArrays::zeros(n);
        for (i, row) in rows.iter().enumerate() {
            arrays.te_j[i] = row[0];
            arrays.ne_j[i] = row[1];
            arrays.th_j[i] = row[2];
            arrays.nh_j[i] = row[3];
        }
        Ok(arrays)
    }
}

impl ExcitationKernel for NativeKernel {
    fn dyadic_greens(
        &self,
        source: &[f64; 3],
        observation: &[f64; 3],
        permittivity: f64,
        permeability: f64,
        wavenumber: f64,
    ) -> Result<DyadicGreens, KernelError> {
        dyadic_greens(source, observation, permittivity, permeability, wavenumber)
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
        let medium = Medium { eps_r, mu_r };
        let k = medium.wavenumber(omega);
        let (eps, mu) = (medium.permittivity(), medium.permeability());
        self.test_all_edges(geometry, |r| {
            Ok(dyadic_greens(source, r, eps, mu, k)?.fields(current))
        })
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
        let medium = Medium { eps_r, mu_r };
        let k = medium.wavenumber(omega);
        let inv_eta = 1.0 / medium.impedance();
        let k_hat = Vector3::from(*direction);
        let r_ref = Vector3::from(*reference);
        self.test_all_edges(geometry, |r| {
            let path = k_hat.dot(&(Vector3::from(*r) - r_ref));
            let phase = Complex64::new(0.0, -k * path).exp();
            let e = [amplitude[0] * phase, amplitude[1] * phase, amplitude[2] * phase];
            let k_cross_e = cross(&k_hat, &e);
            let h = [k_cross_e[0] * inv_eta, k_cross_e[1] * inv_eta, k_cross_e[2] * inv_eta];
            Ok((e, h))
        })
    }

    fn name(&self) -> &str {
        "native"
    }
}

/// Testing integrals of one RWG edge against `field`.
fn test_edge<F>(geometry: &EdgeGeometry, row: usize, field: &F) -> Result<[Complex64; 4], KernelError>
where
    F: Fn(&[f64; 3]) -> Result<Fields, KernelError>,
{
    let r0 = Vector3::from(geometry.vertex(row, 0));
    let r1 = Vector3::from(geometry.vertex(row, 1));
    let length = (r1 - r0).norm();
    let cfie = geometry.cfie_ok[row];

    // T- walks the edge backwards, which keeps both normals on the same side
    let mut halves = vec![(1.0, r0, r1, Vector3::from(geometry.opposite(row, 0)), "plus")];
    if !geometry.is_boundary(row) {
        halves.push((-1.0, r1, r0, Vector3::from(geometry.opposite(row, 1)), "minus"));
    }

    let mut out = [Complex64::from(0.0); 4];
    for (sign, a, b, opp, side) in halves {
        let normal = (b - a).cross(&(opp - a));
        let double_area = normal.norm();
        if double_area <= 1e-12 * length * length {
            return Err(KernelError::DegenerateTriangle { row, side });
        }
        let n_hat = normal / double_area;

        for q in &DUNAVANT_6 {
            let r = q.position(&a.into(), &b.into(), &opp.into());
            let (e, h) = field(&r)?;
            let f = (Vector3::from(r) - opp) * (sign * 0.5 * length * q.weight);
            out[0] += dot(&f, &e);
            out[2] += dot(&f, &h);
            if cfie {
                out[1] += dot(&f, &cross(&n_hat, &e));
                out[3] += dot(&f, &cross(&n_hat, &h));
            }
        }
    }
    Ok(out)
}

/// Bilinear (unconjugated) product of a real and a complex vector.
fn dot(a: &Vector3<f64>, v: &[Complex64; 3]) -> Complex64 {
    v[0] * a.x + v[1] * a.y + v[2] * a.z
}

/// Cross product of a real and a complex vector.
fn cross(a: &Vector3<f64>, v: &[Complex64; 3]) -> [Complex64; 3] {
    [
        v[2] * a.y - v[1] * a.z,
        v[0] * a.z - v[2] * a.x,
        v[1] * a.x - v[0] * a.y,
    ]
}
