//! Estimate-level versus signal-level mitigation on the same records.
//!
//! One protocol run requests the three rescaled records once, then feeds
//! them both to the [`RescalingEstimator`] (frequency estimates combined after
//! decomposition) and to the Richardson combiner (records combined before
//! decomposition).

use serde::{Deserialize, Serialize};

use crate::config::EstimatorConfig;
use crate::provider::{SignalProvider, SignalRequest};
use crate::rescaling::{MitigatedEstimate, RescaledSignals, RescalingConfiguration, RescalingEstimator};
use crate::richardson::{combine_and_estimate, dominant_frequency, RichardsonEstimate};
use crate::types::RescaleResult;

/// Five estimates from one comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEstimate {
    pub unmitigated: f64,
    pub first_order: f64,
    pub second_order: f64,
    pub one_factor_richardson: f64,
    pub two_factor_richardson: f64,
}

impl ComparisonEstimate {
    fn from_parts(rescaling: MitigatedEstimate, richardson: RichardsonEstimate) -> Self {
        Self {
            unmitigated: rescaling.unmitigated,
            first_order: rescaling.first_order,
            second_order: rescaling.second_order,
            one_factor_richardson: richardson.one_factor,
            two_factor_richardson: richardson.two_factor,
        }
    }
}

/// Runs both mitigation paths on shared records.
#[derive(Debug, Clone, Default)]
pub struct RescalingComparison {
    estimator: RescalingEstimator,
}

impl RescalingComparison {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            estimator: RescalingEstimator::new(config),
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        self.estimator.config()
    }

    pub fn compare<P: SignalProvider + ?Sized>(
        &self,
        rescaling: &RescalingConfiguration,
        samples: usize,
        base_dt: f64,
        provider: &P,
    ) -> RescaleResult<ComparisonEstimate> {
        rescaling.validate()?;
        self.config().validate()?;

        let base = SignalRequest::new(rescaling.kappa, rescaling.ham_error, samples, base_dt);
        let signals = RescaledSignals::produce(provider, &base, rescaling.c1, rescaling.c2)?;
        self.compare_signals(&signals, rescaling.c1, rescaling.c2)
    }

    pub fn compare_signals(
        &self,
        signals: &RescaledSignals,
        c1: f64,
        c2: f64,
    ) -> RescaleResult<ComparisonEstimate> {
        let mitigated = self.estimator.estimate_signals(signals, c1, c2)?;
        let richardson = combine_and_estimate(
            &signals.noisy,
            &signals.c1,
            &signals.c2,
            c1,
            c2,
            dominant_frequency(self.config()),
        )?;
        Ok(ComparisonEstimate::from_parts(mitigated, richardson))
    }
}
