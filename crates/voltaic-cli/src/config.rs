//! TOML configuration deserialisation for simulation jobs.
//!
//! ```toml
//! [mesh]
//! bounds = { x = [-3, 3], y = [-3, 3], z = [-3, 3] }
//! step = 0.5
//!
//! [sources]
//! charge_position = "r < 0.5"
//! charge_strength = "1"
//! current_position = "s < 0.5 and z > -2 and z < 2"
//! current_strength = "0, 0, sin(t)"
//!
//! [simulation]
//! iterations = 16
//! time_step = 0.05
//!
//! [output]
//! directory = "./frames"
//! frames = 20
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use voltaic_core::{MeshBounds, SimulationParams, SourceExpressions};

/// Top-level job configuration. Every table is optional.
#[derive(Debug, Default, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub mesh: MeshConfig,
    #[serde(default)]
    pub sources: SourceExpressions,
    #[serde(default)]
    pub simulation: SimulationParams,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Grid extent and sampling step.
#[derive(Debug, Deserialize)]
pub struct MeshConfig {
    /// Default: the cube `[-3, 3]` on every axis.
    #[serde(default)]
    pub bounds: MeshBounds,
    /// Default: 0.5.
    #[serde(default = "default_step")]
    pub step: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            bounds: MeshBounds::default(),
            step: default_step(),
        }
    }
}

fn default_step() -> f64 {
    0.5
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Number of frames to compute (default: 11).
    #[serde(default = "default_frames")]
    pub frames: usize,
    /// Whether to save each frame as CSV (default: true).
    #[serde(default = "default_true")]
    pub save_csv: bool,
    /// Whether to also save each frame as JSON (default: false).
    #[serde(default)]
    pub save_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            frames: default_frames(),
            save_csv: true,
            save_json: false,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_frames() -> usize {
    11
}
fn default_true() -> bool {
    true
}

/// Parse a TOML job configuration.
pub fn parse_config(content: &str) -> anyhow::Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    Ok(config)
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parsing {}", path.display()))
}
