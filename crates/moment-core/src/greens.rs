//! Free-space dyadic Green's functions of an electric current element.
//!
//! With the $e^{+j\omega t}$ time convention and scalar Green's function
//! $g(R) = e^{-jkR} / (4\pi R)$, a current moment $\mathbf{J}$ at
//! $\mathbf{r}'$ radiates
//!
//! $$
//! \mathbf{E}(\mathbf{r}) = \mathbf{G}_{EJ} \cdot \mathbf{J}
//! = -j\omega\mu\, g \left[ a\,\mathbf{I} + b\,\hat{\mathbf{R}}\hat{\mathbf{R}}^T \right] \cdot \mathbf{J},
//! \qquad
//! \mathbf{H}(\mathbf{r}) = \mathbf{G}_{HJ} \cdot \mathbf{J}
//! = g'(R)\, \hat{\mathbf{R}} \times \mathbf{J}
//! $$
//!
//! where $\mathbf{R} = \mathbf{r} - \mathbf{r}'$,
//! $a = 1 + (-jkR - 1)/(kR)^2$, $b = (3 + 3jkR - (kR)^2)/(kR)^2$ and
//! $g'(R) = -(jk + 1/R)\, g(R)$.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::kernel::KernelError;

/// Stack-allocated 3×3 complex tensor.
pub type Tensor3x3 = [[Complex64; 3]; 3];

/// Separations below this (m) are treated as coincident points.
const MIN_SEPARATION: f64 = 1e-12;

/// Electric and magnetic dyadics for one source/observation pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DyadicGreens {
    /// $\mathbf{G}_{EJ}$: current moment to electric field.
    pub electric: Tensor3x3,
    /// $\mathbf{G}_{HJ}$: current moment to magnetic field.
    pub magnetic: Tensor3x3,
}

impl DyadicGreens {
    /// Electric and magnetic field radiated by `current`.
    pub fn fields(&self, current: &[Complex64; 3]) -> ([Complex64; 3], [Complex64; 3]) {
        (apply(&self.electric, current), apply(&self.magnetic, current))
    }
}

/// Matrix-vector product $\mathbf{T} \cdot \mathbf{v}$.
pub fn apply(t: &Tensor3x3, v: &[Complex64; 3]) -> [Complex64; 3] {
    let mut out = [Complex64::from(0.0); 3];
    for (i, row) in t.iter().enumerate() {
        out[i] = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
    }
    out
}

pub fn transpose(t: &Tensor3x3) -> Tensor3x3 {
    let mut out = *t;
    for (i, row) in t.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            out[j][i] = value;
        }
    }
    out
}

/// Evaluate both dyadics for a source at `source` seen from `observation`.
///
/// # Arguments
/// * `permittivity` - Absolute permittivity $\epsilon_0 \epsilon_r$ (F/m).
/// * `permeability` - Absolute permeability $\mu_0 \mu_r$ (H/m).
/// * `k` - Wavenumber in the medium (1/m).
///
/// Fails with [`KernelError::CoincidentPoints`] when the two points coincide.
pub fn dyadic_greens(
    source: &[f64; 3],
    observation: &[f64; 3],
    permittivity: f64,
    permeability: f64,
    k: f64,
) -> Result<DyadicGreens, KernelError> {
    let rx = observation[0] - source[0];
    let ry = observation[1] - source[1];
    let rz = observation[2] - source[2];
    let r = (rx * rx + ry * ry + rz * rz).sqrt();
    if r < MIN_SEPARATION {
        return Err(KernelError::CoincidentPoints {
            point: *observation,
        });
    }

    let omega = k / (permittivity * permeability).sqrt();
    let kr = k * r;
    let kr_sq = Complex64::from(kr * kr);
    let jkr = Complex64::new(0.0, kr);
    let one = Complex64::from(1.0);

    let g = (-jkr).exp() / (4.0 * PI * r);
    let a = one + (-jkr - one) / kr_sq;
    let b = (Complex64::from(3.0) + 3.0 * jkr - kr_sq) / kr_sq;
    let electric_prefactor = Complex64::new(0.0, -omega * permeability) * g;
    let dg_dr = -(Complex64::new(0.0, k) + 1.0 / r) * g;

    let r_hat = [rx / r, ry / r, rz / r];

    let zero = Complex64::from(0.0);
    let mut electric = [[zero; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            let delta_ij = if i == j { 1.0 } else { 0.0 };
            electric[i][j] = electric_prefactor * (a * delta_ij + b * r_hat[i] * r_hat[j]);
        }
    }

    // (R̂ ×) as a matrix
    let [x, y, z] = r_hat;
    let magnetic = [
        [zero, -dg_dr * z, dg_dr * y],
        [dg_dr * z, zero, -dg_dr * x],
        [-dg_dr * y, dg_dr * x, zero],
    ];

    Ok(DyadicGreens { electric, magnetic })
}
