//! # Sweep Configuration
//!
//! YAML configuration for gap-estimation sweeps:
//!
//! - Diagonal model (per-qubit Z fields) and state-pair sampling
//! - Noise sweep (`gammas`, `beta`) and sampling grid
//! - Rescaling factors and estimator tuning
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `RESCALE_CONFIG` environment variable
//! 2. `./rescale.yaml` (current directory)
//! 3. `~/.config/rescale/config.yaml` (user config)
//! 4. `/etc/rescale/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! fields: [13.8, 6.9, 3.45]
//! pairs: 10
//! gammas: [0.001, 0.01, 0.1]
//! samples: 400
//! c1: 2.0
//! c2: 1.5
//! estimator:
//!   cutoff: 0.01
//! ```

use rescale_core::rescaling::validate_factors;
use rescale_core::EstimatorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SimError, SimResult};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RESCALE_CONFIG";

/// Widest model the sweep accepts (2^20 basis states).
const MAX_QUBITS: usize = 20;

/// Gap-estimation sweep configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Z field per qubit of the diagonal model
    pub fields: Vec<f64>,
    /// Number of random basis-state pairs
    pub pairs: usize,
    /// Seed for pair sampling and measurement noise
    pub seed: u64,
    /// Relative noise strengths: κ = γ·|ΔE|
    pub gammas: Vec<f64>,
    /// Systematic error ratio: hamError = γ·β·|ΔE|
    pub beta: f64,
    /// Samples per record
    pub samples: usize,
    /// Unscaled time step
    pub base_dt: f64,
    /// First rescaling factor
    pub c1: f64,
    /// Second rescaling factor
    pub c2: f64,
    /// Pole budget of the rescaling estimator
    pub default_poles: usize,
    /// Also run the signal-level Richardson comparison
    pub compare_richardson: bool,
    /// Standard deviation of additive measurement noise (None = noiseless)
    pub measurement_noise: Option<f64>,
    /// Estimator tuning
    pub estimator: EstimatorConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            fields: vec![13.8, 6.9, 3.45, 1.72, 0.86, 0.43],
            pairs: 100,
            seed: 0,
            gammas: vec![
                1e-4, 2e-4, 5e-4, 1e-3, 2e-3, 5e-3, 1e-2, 2e-2, 3e-2, 5e-2, 1e-1,
            ],
            beta: 0.01,
            samples: 2000,
            base_dt: 1e-4,
            c1: 2.0,
            c2: 1.5,
            default_poles: 100,
            compare_richardson: false,
            measurement_noise: None,
            estimator: EstimatorConfig::default(),
        }
    }
}

impl SweepConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the default config if no file is found. A `RESCALE_CONFIG`
    /// that names a missing file is an error.
    pub fn load() -> SimResult<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(SimError::ConfigNotFound(format!(
                    "{}={}",
                    CONFIG_ENV,
                    path.display()
                )));
            }
            return Self::load_from(&path);
        }

        match Self::config_search_paths().into_iter().find(|p| p.exists()) {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("no sweep config found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SimError::ConfigRead(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "loading sweep config");
        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> SimResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| SimError::ConfigParse(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> SimResult<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| SimError::ConfigParse(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| SimError::ConfigRead(format!("{}: {}", path.display(), e)))
    }

    /// Standard search paths, most specific first.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./rescale.yaml")];
        if let Some(dirs) = directories::ProjectDirs::from("", "", "rescale") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }
        paths.push(PathBuf::from("/etc/rescale/config.yaml"));
        paths
    }

    /// Estimator configuration with the sweep's pole budget applied.
    pub fn estimator_config(&self) -> EstimatorConfig {
        EstimatorConfig {
            default_poles: self.default_poles,
            ..self.estimator.clone()
        }
    }

    /// Number of qubits of the diagonal model.
    pub fn num_qubits(&self) -> usize {
        self.fields.len()
    }

    pub fn validate(&self) -> SimResult<()> {
        let invalid = |msg: String| Err(SimError::ConfigValidation(msg));

        if self.fields.is_empty() || self.fields.len() > MAX_QUBITS {
            return invalid(format!("fields must name 1-{} qubits", MAX_QUBITS));
        }
        if self.fields.iter().any(|h| !h.is_finite()) {
            return invalid("fields must be finite".to_string());
        }
        if self.gammas.is_empty() {
            return invalid("gammas must not be empty".to_string());
        }
        if self.gammas.iter().any(|g| !g.is_finite() || *g < 0.0) {
            return invalid("gammas must be finite and non-negative".to_string());
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return invalid("beta must be finite and non-negative".to_string());
        }
        if self.samples < 2 {
            return invalid("samples must be >= 2".to_string());
        }
        if !(self.base_dt.is_finite() && self.base_dt > 0.0) {
            return invalid("base_dt must be positive".to_string());
        }
        if self.default_poles == 0 {
            return invalid("default_poles must be >= 1".to_string());
        }
        if let Some(std_dev) = self.measurement_noise {
            if !std_dev.is_finite() || std_dev < 0.0 {
                return invalid("measurement_noise must be finite and non-negative".to_string());
            }
        }
        validate_factors(self.c1, self.c2).map_err(|e| SimError::ConfigValidation(e.to_string()))?;
        self.estimator_config()
            .validate()
            .map_err(|e| SimError::ConfigValidation(e.to_string()))
    }
}
