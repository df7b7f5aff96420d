//! Richardson extrapolation at the signal level.
//!
//! Instead of combining three frequency estimates, the raw records are
//! combined sample by sample and the combined record is decomposed once:
//!
//! ```text
//!   one-factor: s = s0·c1/(c1−1) − s1/(c1−1)
//!   two-factor: s = s0·c1·c2/[(c1−1)(c2−1)]
//!                 + s1·c2/[(c1−c2)(c1−1)]
//!                 − s2·c1/[(c2−1)(c1−c2)]
//! ```
//!
//! Sample `k` of every rescaled record carries the same ideal phase as sample
//! `k` of the unscaled one, so the combination lives on the unscaled grid
//! (time step of the unscaled record). The weights of each combination sum
//! to one; an already unbiased record passes through unchanged.

use serde::{Deserialize, Serialize};

use crate::config::EstimatorConfig;
use crate::mode_selector::select_dominant_modes;
use crate::rescaling::validate_factors;
use crate::types::{complex_ops, RescaleError, RescaleResult, TimeSeries};

/// Frequencies of the one- and two-factor Richardson-combined records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RichardsonEstimate {
    pub one_factor: f64,
    pub two_factor: f64,
}

/// Weights (w0, w1) of the one-factor combination.
pub fn one_factor_weights(c1: f64) -> (f64, f64) {
    (c1 / (c1 - 1.0), -1.0 / (c1 - 1.0))
}

/// Weights (w0, w1, w2) of the two-factor combination.
pub fn two_factor_weights(c1: f64, c2: f64) -> (f64, f64, f64) {
    (
        c1 * c2 / ((c1 - 1.0) * (c2 - 1.0)),
        c2 / ((c1 - c2) * (c1 - 1.0)),
        -c1 / ((c2 - 1.0) * (c1 - c2)),
    )
}

/// One-factor Richardson combination of two records.
pub fn one_factor_signal(
    noisy: &TimeSeries,
    c1_signal: &TimeSeries,
    c1: f64,
) -> RescaleResult<TimeSeries> {
    check_length(noisy, c1_signal)?;
    let (w0, w1) = one_factor_weights(c1);
    let samples = complex_ops::weighted_sum(&[(w0, noisy.samples()), (w1, c1_signal.samples())]);
    Ok(TimeSeries::new(samples, noisy.dt()))
}

/// Two-factor Richardson combination of three records.
pub fn two_factor_signal(
    noisy: &TimeSeries,
    c1_signal: &TimeSeries,
    c2_signal: &TimeSeries,
    c1: f64,
    c2: f64,
) -> RescaleResult<TimeSeries> {
    check_length(noisy, c1_signal)?;
    check_length(noisy, c2_signal)?;
    let (w0, w1, w2) = two_factor_weights(c1, c2);
    let samples = complex_ops::weighted_sum(&[
        (w0, noisy.samples()),
        (w1, c1_signal.samples()),
        (w2, c2_signal.samples()),
    ]);
    Ok(TimeSeries::new(samples, noisy.dt()))
}

/// Combine the raw records and estimate a frequency from each combination.
///
/// `decompose_fn` maps a combined record to a frequency; it is called once per
/// combination.
pub fn combine_and_estimate<F>(
    noisy: &TimeSeries,
    c1_signal: &TimeSeries,
    c2_signal: &TimeSeries,
    c1: f64,
    c2: f64,
    mut decompose_fn: F,
) -> RescaleResult<RichardsonEstimate>
where
    F: FnMut(&TimeSeries) -> RescaleResult<f64>,
{
    validate_factors(c1, c2)?;
    let one = one_factor_signal(noisy, c1_signal, c1)?;
    let two = two_factor_signal(noisy, c1_signal, c2_signal, c1, c2)?;
    Ok(RichardsonEstimate {
        one_factor: decompose_fn(&one)?,
        two_factor: decompose_fn(&two)?,
    })
}

/// Frequency estimator for combined records: leading dominant phase over Δt,
/// using the Richardson pole budget from `config`.
pub fn dominant_frequency(
    config: &EstimatorConfig,
) -> impl Fn(&TimeSeries) -> RescaleResult<f64> + '_ {
    move |series: &TimeSeries| {
        let selected = select_dominant_modes(
            series,
            config.num_modes,
            config.pencil_length(series.len()),
            config.richardson_poles,
            config.cutoff,
        )?;
        let phase = selected
            .leading_phase()
            .ok_or(RescaleError::InsufficientRank)?;
        Ok(phase / series.dt())
    }
}

fn check_length(reference: &TimeSeries, other: &TimeSeries) -> RescaleResult<()> {
    if reference.len() != other.len() {
        return Err(RescaleError::SeriesLengthMismatch {
            expected: reference.len(),
            actual: other.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::complex_ops::from_polar;

    fn record(len: usize, dt: f64, omega_dt: f64, decay: f64) -> TimeSeries {
        TimeSeries::from_fn(len, dt, |k| {
            from_polar((-decay * k as f64).exp(), omega_dt * k as f64)
        })
    }

    #[test]
    fn test_weights_sum_to_one() {
        for c1 in [2.0, 1.5, 3.0, 0.5] {
            let (a, b) = one_factor_weights(c1);
            assert!((a + b - 1.0).abs() < 1e-12);
        }
        for (c1, c2) in [(2.0, 1.5), (3.0, 2.0), (1.2, 0.7)] {
            let (a, b, c) = two_factor_weights(c1, c2);
            assert!((a + b + c - 1.0).abs() < 1e-12, "c1={} c2={}", c1, c2);
        }
    }

    #[test]
    fn test_noiseless_rescalings_leave_estimate_unchanged() {
        let dt = 0.02;
        let omega_dt = 0.15;
        let noisy = record(100, dt, omega_dt, 0.0);
        // Exact rescalings: H/c sampled at c·dt advances the same phase per sample.
        let c1_signal = record(100, 2.0 * dt, omega_dt, 0.0);
        let c2_signal = record(100, 1.5 * dt, omega_dt, 0.0);

        let config = EstimatorConfig::default();
        let estimate = dominant_frequency(&config);
        let direct = estimate(&noisy).unwrap();
        let combined =
            combine_and_estimate(&noisy, &c1_signal, &c2_signal, 2.0, 1.5, &estimate).unwrap();

        assert!((direct - omega_dt / dt).abs() < 1e-8);
        assert!((combined.one_factor - direct).abs() < 1e-8);
        assert!((combined.two_factor - direct).abs() < 1e-8);
    }

    #[test]
    fn test_one_factor_cancels_linear_amplitude_damping() {
        // s_c[k] = e^{iφk}·(1 − c·ε·k): first-order damping that is linear in c.
        let eps = 1e-3;
        let phase = 0.2;
        let make = |c: f64| {
            TimeSeries::from_fn(60, 1.0, move |k| {
                from_polar(1.0, phase * k as f64) * (1.0 - c * eps * k as f64)
            })
        };
        let one = one_factor_signal(&make(1.0), &make(2.0), 2.0).unwrap();
        for (k, s) in one.samples().iter().enumerate() {
            let ideal = from_polar(1.0, phase * k as f64);
            assert!((s - ideal).norm() < 1e-12);
        }
    }

    #[test]
    fn test_two_factor_weights_cancel_first_and_second_moments() {
        assert_eq!(two_factor_weights(2.0, 1.5), (6.0, 3.0, -8.0));
        for (c1, c2) in [(2.0, 1.5), (3.0, 2.0), (1.2, 0.7), (4.0, 1.25)] {
            let (w0, w1, w2) = two_factor_weights(c1, c2);
            let first = w0 + w1 * c1 + w2 * c2;
            let second = w0 + w1 * c1 * c1 + w2 * c2 * c2;
            assert!(first.abs() < 1e-10, "c1={} c2={} first={}", c1, c2, first);
            assert!(second.abs() < 1e-10, "c1={} c2={} second={}", c1, c2, second);
        }
    }

    #[test]
    fn test_two_factor_cancels_quadratic_amplitude_damping() {
        // s_c[k] = e^{iφk}·(1 + b·c·ε·k + d·c²·ε·k): damping with linear and quadratic terms in c.
        let eps = 1e-3;
        let (b, d) = (-1.0, 0.4);
        let phase = 0.2;
        let make = |c: f64| {
            TimeSeries::from_fn(60, 1.0, move |k| {
                let k = k as f64;
                from_polar(1.0, phase * k) * (1.0 + b * c * eps * k + d * c * c * eps * k)
            })
        };
        let (c1, c2) = (2.0, 1.5);
        let two = two_factor_signal(&make(1.0), &make(c1), &make(c2), c1, c2).unwrap();
        for (k, s) in two.samples().iter().enumerate() {
            let ideal = from_polar(1.0, phase * k as f64);
            assert!((s - ideal).norm() < 1e-10, "k={} err={}", k, (s - ideal).norm());
        }

        // One factor leaves the quadratic term behind.
        let one = one_factor_signal(&make(1.0), &make(c1), c1).unwrap();
        let last = one.samples()[59] - from_polar(1.0, phase * 59.0);
        assert!(last.norm() > 1e-3);
    }

    #[test]
    fn test_combined_grid_is_unscaled() {
        let noisy = record(10, 0.1, 0.3, 0.0);
        let c1_signal = record(10, 0.2, 0.3, 0.0);
        let one = one_factor_signal(&noisy, &c1_signal, 2.0).unwrap();
        assert_eq!(one.dt(), 0.1);
        assert_eq!(one.len(), 10);
    }

    #[test]
    fn test_length_mismatch() {
        let noisy = record(20, 0.1, 0.3, 0.0);
        let short = record(15, 0.2, 0.3, 0.0);
        let err = combine_and_estimate(&noisy, &short, &noisy, 2.0, 1.5, |_| Ok(0.0)).unwrap_err();
        assert_eq!(
            err,
            RescaleError::SeriesLengthMismatch {
                expected: 20,
                actual: 15
            }
        );
    }

    #[test]
    fn test_degenerate_factors() {
        let noisy = record(20, 0.1, 0.3, 0.0);
        let err = combine_and_estimate(&noisy, &noisy, &noisy, 1.0, 1.5, |_| Ok(0.0)).unwrap_err();
        assert!(matches!(err, RescaleError::DegenerateRescaling { .. }));
    }

    #[test]
    fn test_decompose_fn_called_twice() {
        let noisy = record(20, 0.1, 0.3, 0.0);
        let mut calls = 0;
        combine_and_estimate(&noisy, &noisy, &noisy, 2.0, 1.5, |_| {
            calls += 1;
            Ok(1.0)
        })
        .unwrap();
        assert_eq!(calls, 2);
    }
}
