//! Core types for energy-gap estimation
//!
//! This module defines the fundamental types shared by the decomposer and the
//! mitigation protocols: complex samples, the uniformly sampled
//! [`TimeSeries`], and the error taxonomy.
//!
//! ## Time Series Convention
//!
//! A series is a record of an expectation value `s(t)` sampled at
//! `t_k = start_time + k·Δt`. The matrix pencil method models it as
//!
//! ```text
//!   s_k = Σ_j A_j · z_j^k
//! ```
//!
//! which only holds when `k = 0` corresponds to `t = 0`. A shifted record
//! silently rotates every amplitude, so the decomposer refuses series whose
//! `start_time` is not zero.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// A single complex sample of the measured expectation value
pub type Sample = Complex64;

/// Result type for estimation operations
pub type RescaleResult<T> = Result<T, RescaleError>;

/// Errors that can occur during estimation and mitigation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RescaleError {
    #[error("Invalid pencil size: {pencil}. Must be between 1 and {} for a series of {len} samples", .len.saturating_sub(1))]
    InvalidPencilSize { pencil: usize, len: usize },

    #[error("Insufficient rank: series has no usable singular directions")]
    InsufficientRank,

    #[error("Degenerate rescaling factors c1={c1}, c2={c2}: need c1 != c2, c1 != 1, c2 != 1")]
    DegenerateRescaling { c1: f64, c2: f64 },

    #[error("Mode mismatch after reconciliation: noisy={noisy}, c1={c1}, c2={c2}")]
    ModeMismatch { noisy: usize, c1: usize, c2: usize },

    #[error("Time series starts at t={0}, expected t=0")]
    TimeShiftedSeries(f64),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Series length mismatch: expected {expected}, got {actual}")]
    SeriesLengthMismatch { expected: usize, actual: usize },

    #[error("Eigenvalue solver did not converge")]
    EigenSolverFailed,

    #[error("Least-squares amplitude fit failed: {0}")]
    LeastSquaresFailed(String),

    #[error("Signal provider failed: {0}")]
    Provider(String),
}

/// A finite, uniformly sampled complex record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    samples: Vec<Sample>,
    dt: f64,
    start_time: f64,
}

impl TimeSeries {
    /// Create a series starting at `t = 0` with sample spacing `dt`.
    pub fn new(samples: Vec<Sample>, dt: f64) -> Self {
        Self {
            samples,
            dt,
            start_time: 0.0,
        }
    }

    /// Create a series from real-valued samples.
    pub fn from_real(samples: &[f64], dt: f64) -> Self {
        Self::new(samples.iter().map(|&x| Complex::new(x, 0.0)).collect(), dt)
    }

    /// Set the time of the first sample.
    ///
    /// Only series with `start_time == 0` can be decomposed.
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Build `s_k = f(k)` for `k = 0..len`.
    pub fn from_fn(len: usize, dt: f64, f: impl FnMut(usize) -> Sample) -> Self {
        Self::new((0..len).map(f).collect(), dt)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample spacing Δt.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Time of sample `k`.
    pub fn time_at(&self, k: usize) -> f64 {
        self.start_time + k as f64 * self.dt
    }

    /// Check the preconditions shared by every consumer of a series.
    pub fn validate(&self) -> RescaleResult<()> {
        if self.start_time != 0.0 {
            return Err(RescaleError::TimeShiftedSeries(self.start_time));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(RescaleError::InvalidParameter(format!(
                "time step must be positive and finite, got {}",
                self.dt
            )));
        }
        if let Some(k) = self
            .samples
            .iter()
            .position(|s| !(s.re.is_finite() && s.im.is_finite()))
        {
            return Err(RescaleError::InvalidParameter(format!(
                "sample {} is not finite",
                k
            )));
        }
        Ok(())
    }
}

/// Helper functions for working with complex samples
pub mod complex_ops {
    use super::*;

    /// Create a complex number from magnitude and phase
    #[inline]
    pub fn from_polar(magnitude: f64, phase: f64) -> Complex {
        Complex::new(magnitude * phase.cos(), magnitude * phase.sin())
    }

    /// Project onto the closed unit disk, keeping the phase.
    #[inline]
    pub fn clamp_to_unit_disk(z: Complex) -> Complex {
        let r = z.norm();
        if r > 1.0 {
            z / r
        } else {
            z
        }
    }

    /// Linear combination `Σ w_i · x_i` of equally long sample buffers.
    pub fn weighted_sum(terms: &[(f64, &[Sample])]) -> Vec<Sample> {
        let len = terms.first().map(|(_, s)| s.len()).unwrap_or(0);
        (0..len)
            .map(|k| terms.iter().map(|(w, s)| s[k] * *w).sum())
            .collect()
    }
}
