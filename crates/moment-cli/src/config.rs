//! TOML deserialisation of the simulation parameters.

use std::path::Path;

use anyhow::Context;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use moment_core::{Medium, Precision};

/// Parameter file expected inside `--inputdir`.
pub const PARAMETERS_FILE: &str = "simulation_parameters.toml";

/// Top-level simulation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParams {
    pub computation: ComputationConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub medium: Medium,
    pub mesh: MeshConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which far-field computations the run performs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComputationConfig {
    #[serde(default)]
    pub monostatic_rcs: bool,
    #[serde(default)]
    pub monostatic_sar: bool,
    #[serde(default)]
    pub bistatic: bool,
}

/// Raised when no computation is selected.
#[derive(Debug, Error)]
#[error(
    "no computation selected: enable monostatic_rcs, monostatic_sar or bistatic (or a combination) in [computation]"
)]
pub struct ConfigurationSelectionError;

impl ComputationConfig {
    pub fn any_selected(&self) -> bool {
        self.monostatic_rcs || self.monostatic_sar || self.bistatic
    }
}

impl SimulationParams {
    /// Fail unless at least one computation is selected.
    pub fn check_selection(&self) -> Result<(), ConfigurationSelectionError> {
        if self.computation.any_selected() {
            Ok(())
        } else {
            Err(ConfigurationSelectionError)
        }
    }
}

/// Excitation source from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// "dipole", "plane" or "delta_gap". Checked when the excitation is built.
    pub excitation: String,
    pub frequency_hz: f64,
    /// Real part of the current moment (A·m).
    pub current_re: [f64; 3],
    /// Imaginary part of the current moment. Default: zero.
    #[serde(default)]
    pub current_im: [f64; 3],
    /// Source location (m).
    pub location: [f64; 3],
}

impl SourceConfig {
    pub fn current(&self) -> [Complex64; 3] {
        [
            Complex64::new(self.current_re[0], self.current_im[0]),
            Complex64::new(self.current_re[1], self.current_im[1]),
            Complex64::new(self.current_re[2], self.current_im[2]),
        ]
    }
}

/// Target mesh from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Mesh file, relative to the input directory.
    pub file: String,
    /// Uniform scale factor applied to the vertices. Default: 1.0.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Translation along z applied after scaling (m). Default: 0.0.
    #[serde(default)]
    pub z_offset: f64,
    /// Edge subset to assemble. Default: every edge.
    #[serde(default)]
    pub edges: Option<Vec<usize>>,
}

fn default_scale() -> f64 {
    1.0
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Storage precision of the excitation vector (default: "full").
    #[serde(default)]
    pub precision: Precision,
    /// Excitation CSV, relative to the simulation directory.
    #[serde(default = "default_excitation_file")]
    pub excitation_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            precision: Precision::default(),
            excitation_file: default_excitation_file(),
        }
    }
}

fn default_excitation_file() -> String {
    "excitation.csv".into()
}

/// Load and parse `simulation_parameters.toml` from `input_dir`.
pub fn load_parameters(input_dir: &Path) -> anyhow::Result<SimulationParams> {
    let path = input_dir.join(PARAMETERS_FILE);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let params: SimulationParams =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(params)
}
