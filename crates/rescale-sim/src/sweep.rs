//! # Noise Sweeps
//!
//! Runs the rescaling protocol over a list of noise strengths for each
//! basis-state pair. For a pair with exact gap ΔE and each γ:
//!
//! ```text
//! κ        = γ·|ΔE|
//! hamError = γ·β·|ΔE|
//! ```
//!
//! A failing γ is logged and reported in [`SweepReport::failures`]; the other
//! γ values still run. A pair that cannot be set up at all is recorded in
//! [`SweepRun::pair_failures`] and the remaining pairs still run. With the
//! `parallel` feature the γ values are processed on the rayon pool; output
//! order always follows `gammas`.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rescale_core::{
    RescaleResult, RescalingComparison, RescalingConfiguration, RescalingEstimator, SignalProvider,
};
use serde::{Deserialize, Serialize};

use crate::config::SweepConfig;
use crate::error::{SimError, SimResult};
use crate::hamiltonian::PauliHamiltonian;
use crate::pairs::sample_state_pairs;
use crate::provider::DiagonalModelProvider;

/// Estimates for one noise strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRecord {
    pub gamma: f64,
    pub kappa: f64,
    pub ham_error: f64,
    pub unmitigated: f64,
    pub first_order: f64,
    pub second_order: f64,
    /// Present when the Richardson comparison ran
    pub one_factor_richardson: Option<f64>,
    pub two_factor_richardson: Option<f64>,
}

impl SweepRecord {
    /// |estimate − ΔE| / |ΔE| for unmitigated, first and second order.
    pub fn relative_errors(&self, exact_gap: f64) -> [f64; 3] {
        let rel = |v: f64| ((v - exact_gap) / exact_gap).abs();
        [rel(self.unmitigated), rel(self.first_order), rel(self.second_order)]
    }
}

/// A noise strength whose estimate failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub gamma: f64,
    pub error: String,
}

/// A basis-state pair whose sweep could not start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFailure {
    pub state_a: usize,
    pub state_b: usize,
    pub error: String,
}

/// Results of a sweep for one basis-state pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub state_a: usize,
    pub state_b: usize,
    pub exact_gap: f64,
    pub records: Vec<SweepRecord>,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn to_json(&self) -> SimResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::Serialization(e.to_string()))
    }

    /// Relative errors averaged over all successful records.
    pub fn mean_relative_errors(&self) -> Option<[f64; 3]> {
        if self.records.is_empty() {
            return None;
        }
        let mut sum = [0.0; 3];
        for record in &self.records {
            for (s, e) in sum.iter_mut().zip(record.relative_errors(self.exact_gap)) {
                *s += e;
            }
        }
        let n = self.records.len() as f64;
        Some(sum.map(|s| s / n))
    }
}

/// Reports for every pair that ran, plus the pairs that failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepRun {
    pub reports: Vec<SweepReport>,
    pub pair_failures: Vec<PairFailure>,
}

impl SweepRun {
    pub fn to_json(&self) -> SimResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::Serialization(e.to_string()))
    }
}

/// Drives the estimator over the configured noise strengths.
#[derive(Debug, Clone)]
pub struct SweepRunner {
    config: SweepConfig,
    comparison: RescalingComparison,
    estimator: RescalingEstimator,
}

impl SweepRunner {
    pub fn new(config: SweepConfig) -> SimResult<Self> {
        config.validate()?;
        let estimator_config = config.estimator_config();
        Ok(Self {
            comparison: RescalingComparison::new(estimator_config.clone()),
            estimator: RescalingEstimator::new(estimator_config),
            config,
        })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Sweep every configured pair of the diagonal model.
    ///
    /// Fails only when the state pairs cannot be sampled.
    pub fn run(&self) -> SimResult<SweepRun> {
        let hamiltonian = PauliHamiltonian::z_fields(&self.config.fields);
        let pairs = sample_state_pairs(hamiltonian.dimension(), self.config.pairs, self.config.seed)?;

        tracing::info!(
            qubits = hamiltonian.num_qubits(),
            pairs = pairs.len(),
            gammas = self.config.gammas.len(),
            "starting sweep"
        );

        Ok(self.run_pairs(&hamiltonian, &pairs))
    }

    /// Sweep the given pairs; a failing pair is logged and recorded.
    pub fn run_pairs(&self, hamiltonian: &PauliHamiltonian, pairs: &[(usize, usize)]) -> SweepRun {
        let mut run = SweepRun::default();
        for &(a, b) in pairs {
            match self.run_pair(hamiltonian, a, b) {
                Ok(report) => run.reports.push(report),
                Err(e) => {
                    tracing::warn!(state_a = a, state_b = b, error = %e, "state pair failed");
                    run.pair_failures.push(PairFailure {
                        state_a: a,
                        state_b: b,
                        error: e.to_string(),
                    });
                }
            }
        }
        run
    }

    /// Sweep one basis-state pair.
    pub fn run_pair(&self, hamiltonian: &PauliHamiltonian, a: usize, b: usize) -> SimResult<SweepReport> {
        let mut provider = DiagonalModelProvider::new(hamiltonian.clone(), a, b)?;
        if let Some(std_dev) = self.config.measurement_noise {
            provider = provider.with_measurement_noise(std_dev, self.config.seed)?;
        }
        let exact_gap = provider.exact_gap()?;
        let mut report = self.run_with_provider(exact_gap, &provider);
        report.state_a = a;
        report.state_b = b;
        Ok(report)
    }

    /// Sweep the configured noise strengths against any provider.
    ///
    /// `exact_gap` sets the noise scale; the returned report has both
    /// state indices set to 0.
    pub fn run_with_provider<P>(&self, exact_gap: f64, provider: &P) -> SweepReport
    where
        P: SignalProvider + Sync + ?Sized,
    {
        #[cfg(feature = "parallel")]
        let outcomes: Vec<(f64, RescaleResult<SweepRecord>)> = self
            .config
            .gammas
            .par_iter()
            .map(|&gamma| (gamma, self.run_gamma(gamma, exact_gap, provider)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<(f64, RescaleResult<SweepRecord>)> = self
            .config
            .gammas
            .iter()
            .map(|&gamma| (gamma, self.run_gamma(gamma, exact_gap, provider)))
            .collect();

        let mut records = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (gamma, outcome) in outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(gamma, error = %e, "sweep point failed");
                    failures.push(SweepFailure {
                        gamma,
                        error: e.to_string(),
                    });
                }
            }
        }

        SweepReport {
            state_a: 0,
            state_b: 0,
            exact_gap,
            records,
            failures,
        }
    }

    fn run_gamma<P>(&self, gamma: f64, exact_gap: f64, provider: &P) -> RescaleResult<SweepRecord>
    where
        P: SignalProvider + ?Sized,
    {
        let scale = gamma * exact_gap.abs();
        let kappa = scale;
        let ham_error = scale * self.config.beta;
        let rescaling = RescalingConfiguration::new(self.config.c1, self.config.c2, kappa, ham_error);
        let (samples, dt) = (self.config.samples, self.config.base_dt);

        let record = if self.config.compare_richardson {
            let estimate = self.comparison.compare(&rescaling, samples, dt, provider)?;
            SweepRecord {
                gamma,
                kappa,
                ham_error,
                unmitigated: estimate.unmitigated,
                first_order: estimate.first_order,
                second_order: estimate.second_order,
                one_factor_richardson: Some(estimate.one_factor_richardson),
                two_factor_richardson: Some(estimate.two_factor_richardson),
            }
        } else {
            let estimate = self.estimator.estimate(&rescaling, samples, dt, provider)?;
            SweepRecord {
                gamma,
                kappa,
                ham_error,
                unmitigated: estimate.unmitigated,
                first_order: estimate.first_order,
                second_order: estimate.second_order,
                one_factor_richardson: None,
                two_factor_richardson: None,
            }
        };

        tracing::debug!(
            gamma,
            noisy = record.unmitigated,
            first_order = record.first_order,
            second_order = record.second_order,
            "sweep point"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescale_core::{RescaleError, SignalRequest, TimeSeries};

    fn small_config() -> SweepConfig {
        SweepConfig {
            fields: vec![3.0, 1.25, 0.5],
            pairs: 3,
            seed: 11,
            gammas: vec![1e-3, 1e-2, 1e-1],
            beta: 0.5,
            samples: 120,
            base_dt: 0.01,
            default_poles: 4,
            ..SweepConfig::default()
        }
    }

    #[test]
    fn test_run_small_sweep() {
        let runner = SweepRunner::new(small_config()).unwrap();
        let run = runner.run().unwrap();
        assert!(run.pair_failures.is_empty());
        assert_eq!(run.reports.len(), 3);
        for report in &run.reports {
            assert!(report.failures.is_empty());
            assert_ne!(report.state_a, report.state_b);
            let gammas: Vec<f64> = report.records.iter().map(|r| r.gamma).collect();
            assert_eq!(gammas, vec![1e-3, 1e-2, 1e-1]);
            for record in &report.records {
                let [noisy, first, second] = record.relative_errors(report.exact_gap);
                assert!(first < 1e-8, "first={} noisy={}", first, noisy);
                assert!(second < 1e-8);
                assert!(record.one_factor_richardson.is_none());
            }
            let [_, first, _] = report.mean_relative_errors().unwrap();
            assert!(first < 1e-8);
        }
    }

    #[test]
    fn test_noise_scaling() {
        let runner = SweepRunner::new(small_config()).unwrap();
        let h = PauliHamiltonian::z_fields(&[3.0, 1.25, 0.5]);
        let report = runner.run_pair(&h, 0b000, 0b011).unwrap();
        assert_eq!((report.state_a, report.state_b), (0, 3));
        let record = &report.records[1];
        assert!((record.kappa - 0.01 * 3.5).abs() < 1e-12);
        assert!((record.ham_error - 0.01 * 0.5 * 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_richardson_comparison_enabled() {
        let config = SweepConfig {
            compare_richardson: true,
            ..small_config()
        };
        let runner = SweepRunner::new(config).unwrap();
        let h = PauliHamiltonian::z_fields(&[3.0, 1.25, 0.5]);
        let report = runner.run_pair(&h, 0b001, 0b110).unwrap();
        assert!(report.failures.is_empty());
        for record in &report.records {
            assert!(record.one_factor_richardson.unwrap().is_finite());
            assert!(record.two_factor_richardson.unwrap().is_finite());
        }
    }

    #[test]
    fn test_failures_isolated() {
        let runner = SweepRunner::new(small_config()).unwrap();
        let provider = |req: &SignalRequest| -> RescaleResult<TimeSeries> {
            if req.kappa > 0.05 {
                return Err(RescaleError::Provider("detector saturated".into()));
            }
            Ok(TimeSeries::from_fn(req.samples, req.dt(), |k| {
                rescale_core::types::complex_ops::from_polar(1.0, 0.02 * k as f64)
            }))
        };
        let report = runner.run_with_provider(1.0, &provider);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].gamma, 1e-1);
        assert!(report.failures[0].error.contains("detector saturated"));
    }

    #[test]
    fn test_pair_failures_isolated() {
        let runner = SweepRunner::new(small_config()).unwrap();
        let h = PauliHamiltonian::z_fields(&[3.0, 1.25, 0.5]);
        let run = runner.run_pairs(&h, &[(0, 3), (0, 8), (1, 6)]);

        let pairs: Vec<(usize, usize)> = run.reports.iter().map(|r| (r.state_a, r.state_b)).collect();
        assert_eq!(pairs, vec![(0, 3), (1, 6)]);
        assert_eq!(run.pair_failures.len(), 1);
        let failure = &run.pair_failures[0];
        assert_eq!((failure.state_a, failure.state_b), (0, 8));
        assert_eq!(failure.error, SimError::StateIndex { index: 8, qubits: 3 }.to_string());
    }

    #[test]
    fn test_pair_sampling_error_fails_run() {
        let config = SweepConfig {
            fields: vec![1.0],
            pairs: 5,
            ..small_config()
        };
        let runner = SweepRunner::new(config).unwrap();
        assert!(matches!(runner.run(), Err(SimError::TooManyPairs { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SweepConfig {
            c2: 2.0,
            ..small_config()
        };
        assert!(SweepRunner::new(config).is_err());
    }

    #[test]
    fn test_report_json() {
        let runner = SweepRunner::new(small_config()).unwrap();
        let h = PauliHamiltonian::z_fields(&[3.0, 1.25, 0.5]);
        let report = runner.run_pair(&h, 0, 1).unwrap();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"first_order\""));
        let parsed: SweepReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.records.len(), report.records.len());

        let run = SweepRun {
            reports: vec![report],
            pair_failures: vec![PairFailure {
                state_a: 0,
                state_b: 9,
                error: "out of range".into(),
            }],
        };
        let parsed: SweepRun = serde_json::from_str(&run.to_json().unwrap()).unwrap();
        assert_eq!(parsed.reports.len(), 1);
        assert_eq!(parsed.pair_failures, run.pair_failures);
    }
}
