//! Estimator Configuration
//!
//! The tunables of the matrix pencil pipeline are passed explicitly through
//! [`EstimatorConfig`] instead of living in module-level constants, so every
//! estimator call is a pure function of its arguments.
//!
//! | Field                | Default | Meaning                                          |
//! |----------------------|---------|--------------------------------------------------|
//! | `pencil_fraction`    | 0.4     | L = ceil(fraction · N)                            |
//! | `cutoff`             | 1e-2    | relative singular-value threshold                 |
//! | `retry_cutoff`       | 1e-12   | threshold used when reconciling mode counts       |
//! | `default_poles`      | 4       | pole budget for the first pass                    |
//! | `num_modes`          | 1       | dominant modes kept by the selector               |
//! | `richardson_poles`   | 100     | pole budget for Richardson-combined signals       |
//! | `residual_bound`     | None    | optional bound flagging poor least-squares fits   |
//!
//! The struct is `serde`-friendly; the boundary layer embeds it in its YAML
//! configuration.

use serde::{Deserialize, Serialize};

use crate::types::{RescaleError, RescaleResult};

/// Tunables for decomposition, selection and reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Pencil length as a fraction of the series length
    pub pencil_fraction: f64,
    /// Relative singular-value cutoff for the first pass
    pub cutoff: f64,
    /// Cutoff used when a result is recomputed to match the mode count
    pub retry_cutoff: f64,
    /// Maximum number of poles retained on the first pass
    pub default_poles: usize,
    /// Number of dominant modes returned by the selector
    pub num_modes: usize,
    /// Pole budget for signal-level Richardson estimates
    pub richardson_poles: usize,
    /// Flag fits whose relative residual exceeds this bound
    pub residual_bound: Option<f64>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            pencil_fraction: 0.4,
            cutoff: 1e-2,
            retry_cutoff: 1e-12,
            default_poles: 4,
            num_modes: 1,
            richardson_poles: 100,
            residual_bound: None,
        }
    }
}

impl EstimatorConfig {
    /// Create a new builder starting from the defaults
    pub fn builder() -> EstimatorConfigBuilder {
        EstimatorConfigBuilder::default()
    }

    /// Pencil length for a series of `len` samples.
    pub fn pencil_length(&self, len: usize) -> usize {
        (self.pencil_fraction * len as f64).ceil() as usize
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RescaleResult<()> {
        if !(self.pencil_fraction > 0.0 && self.pencil_fraction < 1.0) {
            return Err(RescaleError::InvalidParameter(format!(
                "pencil_fraction must be in (0, 1), got {}",
                self.pencil_fraction
            )));
        }
        for (name, value) in [("cutoff", self.cutoff), ("retry_cutoff", self.retry_cutoff)] {
            if !(value > 0.0 && value < 1.0) {
                return Err(RescaleError::InvalidParameter(format!(
                    "{} must be in (0, 1), got {}",
                    name, value
                )));
            }
        }
        if self.default_poles == 0 || self.richardson_poles == 0 {
            return Err(RescaleError::InvalidParameter(
                "pole budgets must be >= 1".to_string(),
            ));
        }
        if self.num_modes == 0 {
            return Err(RescaleError::InvalidParameter(
                "num_modes must be >= 1".to_string(),
            ));
        }
        if let Some(bound) = self.residual_bound {
            if !(bound >= 0.0) {
                return Err(RescaleError::InvalidParameter(format!(
                    "residual_bound must be non-negative, got {}",
                    bound
                )));
            }
        }
        Ok(())
    }
}

/// Builder for EstimatorConfig
#[derive(Debug, Default)]
pub struct EstimatorConfigBuilder {
    config: EstimatorConfig,
}

impl EstimatorConfigBuilder {
    pub fn pencil_fraction(mut self, fraction: f64) -> Self {
        self.config.pencil_fraction = fraction;
        self
    }

    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.config.cutoff = cutoff;
        self
    }

    pub fn retry_cutoff(mut self, cutoff: f64) -> Self {
        self.config.retry_cutoff = cutoff;
        self
    }

    pub fn default_poles(mut self, poles: usize) -> Self {
        self.config.default_poles = poles;
        self
    }

    pub fn num_modes(mut self, modes: usize) -> Self {
        self.config.num_modes = modes;
        self
    }

    pub fn richardson_poles(mut self, poles: usize) -> Self {
        self.config.richardson_poles = poles;
        self
    }

    pub fn residual_bound(mut self, bound: f64) -> Self {
        self.config.residual_bound = Some(bound);
        self
    }

    /// Build the configuration, validating every field.
    pub fn build(self) -> RescaleResult<EstimatorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
