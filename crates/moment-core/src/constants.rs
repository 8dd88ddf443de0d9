//! Physical constants (SI).

use std::f64::consts::PI;

/// Vacuum permeability $\mu_0$ (H/m).
pub const MU_0: f64 = 4.0 * PI * 1e-7;

/// Speed of light in vacuum (m/s).
pub const C0: f64 = 299_792_458.0;

/// Vacuum permittivity $\epsilon_0 = 1/(\mu_0 c^2)$ (F/m).
pub const EPS_0: f64 = 1.0 / (MU_0 * C0 * C0);

/// Angular frequency for a frequency in hertz.
pub fn angular_frequency(frequency_hz: f64) -> f64 {
    2.0 * PI * frequency_hz
}
