//! Core types shared across the excitation pipeline.
//!
//! This module defines the background medium, the excitation source
//! description, and the excitation vector produced for an RWG edge set.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView1};
use num_complex::{Complex32, Complex64};
use serde::{Deserialize, Serialize};

use crate::constants::{EPS_0, MU_0};
use crate::excitation::ExcitationError;

/// Homogeneous background medium, given relative to vacuum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Medium {
    /// Relative permittivity $\epsilon_r$.
    pub eps_r: f64,
    /// Relative permeability $\mu_r$.
    pub mu_r: f64,
}

impl Default for Medium {
    fn default() -> Self {
        Self::vacuum()
    }
}

impl Medium {
    pub fn vacuum() -> Self {
        Self {
            eps_r: 1.0,
            mu_r: 1.0,
        }
    }

    /// Both relative constants finite and strictly positive.
    pub fn is_physical(&self) -> bool {
        [self.eps_r, self.mu_r].iter().all(|v| v.is_finite() && *v > 0.0)
    }

    /// Absolute permittivity $\epsilon_0 \epsilon_r$ (F/m).
    pub fn permittivity(&self) -> f64 {
        EPS_0 * self.eps_r
    }

    /// Absolute permeability $\mu_0 \mu_r$ (H/m).
    pub fn permeability(&self) -> f64 {
        MU_0 * self.mu_r
    }

    /// Wavenumber $k = \omega \sqrt{\epsilon_0 \epsilon_r \mu_0 \mu_r}$ (1/m).
    pub fn wavenumber(&self, omega: f64) -> f64 {
        omega * (self.permittivity() * self.permeability()).sqrt()
    }

    /// Wave impedance $\eta = \sqrt{\mu / \epsilon}$ (Ω).
    pub fn impedance(&self) -> f64 {
        (self.permeability() / self.permittivity()).sqrt()
    }
}

/// Kind of incident excitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcitationKind {
    /// Elementary current source radiating a near field onto the target.
    Dipole,
    /// Plane wave arriving from the direction of the source location.
    Plane,
    /// Delta-gap feed. Assembled as [`ExcitationKind::Plane`].
    DeltaGap,
}

impl ExcitationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExcitationKind::Dipole => "dipole",
            ExcitationKind::Plane => "plane",
            ExcitationKind::DeltaGap => "delta_gap",
        }
    }
}

impl fmt::Display for ExcitationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExcitationKind {
    type Err = ExcitationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dipole" => Ok(ExcitationKind::Dipole),
            "plane" => Ok(ExcitationKind::Plane),
            "delta_gap" => Ok(ExcitationKind::DeltaGap),
            other => Err(ExcitationError::InvalidExcitationKind(other.to_string())),
        }
    }
}

/// Everything the excitation builder needs to know about the source.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcitationSource {
    pub kind: ExcitationKind,
    /// Current moment of the source (A·m). For a plane wave this sets the
    /// incident polarisation and amplitude.
    pub current: [Complex64; 3],
    /// Source location (m). For a plane wave the arrival direction is taken
    /// from this point towards the reference point.
    pub location: [f64; 3],
    /// Angular frequency $\omega$ (rad/s).
    pub omega: f64,
    pub medium: Medium,
}

impl ExcitationSource {
    /// Build a source from a configured kind name, as it appears in a
    /// parameter file.
    pub fn from_kind_name(
        kind: &str,
        current: [Complex64; 3],
        location: [f64; 3],
        omega: f64,
        medium: Medium,
    ) -> Result<Self, ExcitationError> {
        Ok(Self {
            kind: kind.parse()?,
            current,
            location,
            omega,
            medium,
        })
    }

    /// Wavenumber in the background medium.
    pub fn wavenumber(&self) -> f64 {
        self.medium.wavenumber(self.omega)
    }
}

/// The four testing components of an excitation vector entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// $V_{TE,J}$: RWG function tested against $\mathbf{E}$.
    TangentialElectric,
    /// $V_{NE,J}$: RWG function tested against $\hat{n} \times \mathbf{E}$.
    NormalElectric,
    /// $V_{TH,J}$: RWG function tested against $\mathbf{H}$.
    TangentialMagnetic,
    /// $V_{NH,J}$: RWG function tested against $\hat{n} \times \mathbf{H}$.
    NormalMagnetic,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::TangentialElectric,
        Component::NormalElectric,
        Component::TangentialMagnetic,
        Component::NormalMagnetic,
    ];

    /// Column of this component in the `(E, 4)` layout.
    pub fn index(&self) -> usize {
        match self {
            Component::TangentialElectric => 0,
            Component::NormalElectric => 1,
            Component::TangentialMagnetic => 2,
            Component::NormalMagnetic => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Component::TangentialElectric => "V_TE_J",
            Component::NormalElectric => "V_NE_J",
            Component::TangentialMagnetic => "V_TH_J",
            Component::NormalMagnetic => "V_NH_J",
        }
    }
}

/// Excitation vector over an ordered edge subset.
///
/// Row `i` belongs to the `i`-th edge of the subset it was built for, so the
/// rows can be scattered positionally into the global unknown vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcitationVector {
    /// Shape (E, 4), columns ordered as [`Component::ALL`].
    values: Array2<Complex64>,
}

impl ExcitationVector {
    pub(crate) fn new(values: Array2<Complex64>) -> Self {
        debug_assert_eq!(values.ncols(), 4);
        Self { values }
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn values(&self) -> &Array2<Complex64> {
        &self.values
    }

    /// The four components of edge row `i`.
    pub fn row(&self, i: usize) -> [Complex64; 4] {
        [
            self.values[[i, 0]],
            self.values[[i, 1]],
            self.values[[i, 2]],
            self.values[[i, 3]],
        ]
    }

    pub fn component(&self, component: Component) -> ArrayView1<'_, Complex64> {
        self.values.column(component.index())
    }

    /// Copy the values into storage of the requested precision. The vector
    /// itself is always computed in double precision.
    pub fn narrow(&self, precision: Precision) -> StoredExcitation {
        match precision {
            Precision::Full => StoredExcitation::Full(self.values.clone()),
            Precision::Reduced => StoredExcitation::Reduced(
                self.values
                    .mapv(|v| Complex32::new(v.re as f32, v.im as f32)),
            ),
        }
    }
}

/// Element width used to store an excitation vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// `Complex64` elements.
    #[default]
    Full,
    /// `Complex32` elements.
    Reduced,
}

/// Excitation values narrowed for storage.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredExcitation {
    Full(Array2<Complex64>),
    Reduced(Array2<Complex32>),
}

impl StoredExcitation {
    pub fn precision(&self) -> Precision {
        match self {
            StoredExcitation::Full(_) => Precision::Full,
            StoredExcitation::Reduced(_) => Precision::Reduced,
        }
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        match self {
            StoredExcitation::Full(v) => v.nrows(),
            StoredExcitation::Reduced(v) => v.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored value widened back to `Complex64`.
    pub fn get(&self, edge: usize, component: Component) -> Complex64 {
        let c = component.index();
        match self {
            StoredExcitation::Full(v) => v[[edge, c]],
            StoredExcitation::Reduced(v) => {
                let z = v[[edge, c]];
                Complex64::new(z.re as f64, z.im as f64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vacuum_wavenumber() {
        let omega = crate::constants::angular_frequency(1e9);
        let k = Medium::vacuum().wavenumber(omega);
        assert_relative_eq!(k, omega / crate::constants::C0, max_relative = 1e-12);
    }

    #[test]
    fn test_vacuum_impedance() {
        assert_relative_eq!(Medium::vacuum().impedance(), 376.730_313, max_relative = 1e-6);
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [ExcitationKind::Dipole, ExcitationKind::Plane, ExcitationKind::DeltaGap] {
            assert_eq!(kind.as_str().parse::<ExcitationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = "gaussian_beam".parse::<ExcitationKind>().unwrap_err();
        assert!(matches!(err, ExcitationError::InvalidExcitationKind(ref s) if s == "gaussian_beam"));
    }

    #[test]
    fn test_reduced_precision_only_rounds() {
        let values = Array2::from_shape_fn((2, 4), |(i, j)| {
            Complex64::new(0.1 * (i + 1) as f64, -1.0 / (j + 3) as f64)
        });
        let vector = ExcitationVector::new(values.clone());
        let reduced = vector.narrow(Precision::Reduced);
        assert_eq!(reduced.precision(), Precision::Reduced);
        assert_eq!(reduced.len(), 2);
        for i in 0..2 {
            for c in Component::ALL {
                let full = values[[i, c.index()]];
                let stored = reduced.get(i, c);
                assert_eq!(stored.re, full.re as f32 as f64);
                assert_eq!(stored.im, full.im as f32 as f64);
            }
        }
        assert_eq!(vector.narrow(Precision::Full), StoredExcitation::Full(values));
    }
}
