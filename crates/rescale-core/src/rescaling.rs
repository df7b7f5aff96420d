//! Rescaling-based bias mitigation.
//!
//! The generator is run three times: unscaled, divided by `c1` and divided by
//! `c2`, each record sampled with its own time step (`Δt`, `c1·Δt`, `c2·Δt`).
//! Each record yields one frequency estimate `ω(c) = phase / (c·Δt)`; the
//! ideal part of `ω(c)` scales as `T/c` while the systematic and noise bias
//! does not, so the three values can be combined to cancel it:
//!
//! ```text
//!   first  = (ω(1) − ω(c1)) / (1 − 1/c1)
//!   second = −K · [(c1−c2)·ω(1) + (c2−1)·ω(c1) − (c1−1)·ω(c2)]
//!   K      = c1·c2 / [(c2−c1)(c1−1)(c2−1)]
//! ```
//!
//! Equivalently, with the raw phase rate measured per unscaled step
//! `g(c) = c·ω(c)`, the first-order formula is exact when `g` is linear in
//! `c` and the second-order formula when `g` is quadratic.
//!
//! Before combining, all three decompositions must have retrieved the same
//! number of modes. Under-resolved records are decomposed once more with the
//! larger pole budget and the configured retry cutoff; if the counts still
//! disagree the run fails with [`RescaleError::ModeMismatch`].

use serde::{Deserialize, Serialize};

use crate::config::EstimatorConfig;
use crate::mode_selector::{select_dominant_modes, DominantModes};
use crate::provider::{SignalProvider, SignalRequest};
use crate::types::{RescaleError, RescaleResult, TimeSeries};

/// Relative tolerance between a provider's time step and the requested one.
const DT_TOLERANCE: f64 = 1e-9;

/// Rescaling factors and the noise configuration they are applied to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RescalingConfiguration {
    /// First rescaling factor (generator H/c1)
    pub c1: f64,
    /// Second rescaling factor (generator H/c2)
    pub c2: f64,
    /// Noise strength
    pub kappa: f64,
    /// Systematic error strength
    pub ham_error: f64,
}

impl RescalingConfiguration {
    pub fn new(c1: f64, c2: f64, kappa: f64, ham_error: f64) -> Self {
        Self {
            c1,
            c2,
            kappa,
            ham_error,
        }
    }

    pub fn validate(&self) -> RescaleResult<()> {
        validate_factors(self.c1, self.c2)
    }
}

/// Reject factor pairs that make the correction formulas divide by zero.
pub fn validate_factors(c1: f64, c2: f64) -> RescaleResult<()> {
    let degenerate = !c1.is_finite() || !c2.is_finite() || c1 == 1.0 || c2 == 1.0 || c1 == c2;
    if degenerate {
        return Err(RescaleError::DegenerateRescaling { c1, c2 });
    }
    Ok(())
}

/// First-order (single-factor) extrapolation to the unscaled limit.
pub fn first_order_correction(noisy: f64, c1_estimate: f64, c1: f64) -> f64 {
    (noisy - c1_estimate) / (1.0 - 1.0 / c1)
}

/// Second-order (two-factor) extrapolation using all three estimates.
pub fn second_order_correction(
    noisy: f64,
    c1_estimate: f64,
    c2_estimate: f64,
    c1: f64,
    c2: f64,
) -> f64 {
    let coefficient = c1 * c2 / ((c2 - c1) * (c1 - 1.0) * (c2 - 1.0));
    -coefficient * ((c1 - c2) * noisy + (c2 - 1.0) * c1_estimate - (c1 - 1.0) * c2_estimate)
}

/// Frequency estimates at rescaling factors 1, c1 and c2.
///
/// Each value is already divided by its own time step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimateTriple {
    pub noisy: f64,
    pub c1_estimate: f64,
    pub c2_estimate: f64,
}

impl EstimateTriple {
    pub fn new(noisy: f64, c1_estimate: f64, c2_estimate: f64) -> Self {
        Self {
            noisy,
            c1_estimate,
            c2_estimate,
        }
    }

    /// Apply both corrections.
    pub fn mitigate(&self, c1: f64, c2: f64) -> RescaleResult<MitigatedEstimate> {
        validate_factors(c1, c2)?;
        Ok(MitigatedEstimate {
            unmitigated: self.noisy,
            first_order: first_order_correction(self.noisy, self.c1_estimate, c1),
            second_order: second_order_correction(
                self.noisy,
                self.c1_estimate,
                self.c2_estimate,
                c1,
                c2,
            ),
            estimates: *self,
            modes: None,
        })
    }
}

/// Unmitigated, first-order and second-order estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MitigatedEstimate {
    pub unmitigated: f64,
    pub first_order: f64,
    pub second_order: f64,
    /// The three raw estimates the corrections were computed from
    pub estimates: EstimateTriple,
    /// Mode count shared by the three decompositions; None when the
    /// estimates did not come from a decomposition
    pub modes: Option<usize>,
}

/// The three raw records of one rescaling protocol run.
#[derive(Debug, Clone, PartialEq)]
pub struct RescaledSignals {
    pub noisy: TimeSeries,
    pub c1: TimeSeries,
    pub c2: TimeSeries,
}

impl RescaledSignals {
    /// Request the unscaled, c1 and c2 records from `provider`.
    pub fn produce<P: SignalProvider + ?Sized>(
        provider: &P,
        base: &SignalRequest,
        c1: f64,
        c2: f64,
    ) -> RescaleResult<Self> {
        Ok(Self {
            noisy: produce_checked(provider, &base.rescaled(1.0))?,
            c1: produce_checked(provider, &base.rescaled(c1))?,
            c2: produce_checked(provider, &base.rescaled(c2))?,
        })
    }
}

fn produce_checked<P: SignalProvider + ?Sized>(
    provider: &P,
    request: &SignalRequest,
) -> RescaleResult<TimeSeries> {
    let series = provider.produce(request)?;
    let expected = request.dt();
    if (series.dt() - expected).abs() > DT_TOLERANCE * expected.abs() {
        return Err(RescaleError::Provider(format!(
            "record at rescaling {} has time step {}, expected {}",
            request.rescaling,
            series.dt(),
            expected
        )));
    }
    Ok(series)
}

/// Estimate-level rescaling mitigation.
#[derive(Debug, Clone, Default)]
pub struct RescalingEstimator {
    config: EstimatorConfig,
}

impl RescalingEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Run the full protocol: three provider calls, reconciliation, corrections.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rescale_core::prelude::*;
    /// use rescale_core::types::complex_ops::from_polar;
    ///
    /// // Ideal gap 2.0 plus an un-rescaled systematic shift of 0.05.
    /// let provider = |req: &SignalRequest| -> RescaleResult<TimeSeries> {
    ///     let omega = 2.0 / req.rescaling + 0.05;
    ///     Ok(TimeSeries::from_fn(req.samples, req.dt(), |k| {
    ///         from_polar(1.0, omega * req.dt() * k as f64)
    ///     }))
    /// };
    ///
    /// let estimator = RescalingEstimator::default();
    /// let rescaling = RescalingConfiguration::new(2.0, 1.5, 0.0, 0.05);
    /// let result = estimator.estimate(&rescaling, 100, 0.05, &provider).unwrap();
    /// assert!((result.first_order - 2.0).abs() < 1e-6);
    /// ```
    pub fn estimate<P: SignalProvider + ?Sized>(
        &self,
        rescaling: &RescalingConfiguration,
        samples: usize,
        base_dt: f64,
        provider: &P,
    ) -> RescaleResult<MitigatedEstimate> {
        // Validate before any provider call.
        rescaling.validate()?;
        self.config.validate()?;

        let base = SignalRequest::new(rescaling.kappa, rescaling.ham_error, samples, base_dt);
        let signals = RescaledSignals::produce(provider, &base, rescaling.c1, rescaling.c2)?;
        self.estimate_signals(&signals, rescaling.c1, rescaling.c2)
    }

    /// Run selection, reconciliation and corrections on records already produced.
    pub fn estimate_signals(
        &self,
        signals: &RescaledSignals,
        c1: f64,
        c2: f64,
    ) -> RescaleResult<MitigatedEstimate> {
        validate_factors(c1, c2)?;

        let series = [&signals.noisy, &signals.c1, &signals.c2];
        let mut selections = Vec::with_capacity(3);
        for s in series {
            selections.push(self.select(s, self.config.default_poles, self.config.cutoff)?);
        }

        let modes = selections
            .iter()
            .map(DominantModes::modes_found)
            .max()
            .unwrap_or(0);

        for (selection, s) in selections.iter_mut().zip(series) {
            if selection.modes_found() < modes {
                tracing::debug!(
                    found = selection.modes_found(),
                    target = modes,
                    cutoff = self.config.retry_cutoff,
                    "recomputing under-resolved estimate"
                );
                *selection = self.select(s, modes, self.config.retry_cutoff)?;
            }
        }

        let counts: Vec<usize> = selections.iter().map(DominantModes::modes_found).collect();
        if counts.iter().any(|&c| c != modes) {
            return Err(RescaleError::ModeMismatch {
                noisy: counts[0],
                c1: counts[1],
                c2: counts[2],
            });
        }

        if let Some(bound) = self.config.residual_bound {
            for (selection, c) in selections.iter().zip([1.0, c1, c2]) {
                if selection.exceeds_residual(bound) {
                    tracing::warn!(
                        rescaling = c,
                        relative_residual = selection.decomposition.relative_residual,
                        bound,
                        "poor least-squares fit"
                    );
                }
            }
        }

        let mut frequencies = [0.0; 3];
        for (i, (selection, s)) in selections.iter().zip(series).enumerate() {
            let phase = selection
                .leading_phase()
                .ok_or(RescaleError::InsufficientRank)?;
            frequencies[i] = phase / s.dt();
        }

        let triple = EstimateTriple::new(frequencies[0], frequencies[1], frequencies[2]);
        let mut result = triple.mitigate(c1, c2)?;
        result.modes = Some(modes);

        tracing::debug!(
            noisy = result.unmitigated,
            first_order = result.first_order,
            second_order = result.second_order,
            modes,
            "rescaling mitigation"
        );

        Ok(result)
    }

    fn select(
        &self,
        series: &TimeSeries,
        max_poles: usize,
        cutoff: f64,
    ) -> RescaleResult<DominantModes> {
        select_dominant_modes(
            series,
            self.config.num_modes,
            self.config.pencil_length(series.len()),
            max_poles,
            cutoff,
        )
    }
}
