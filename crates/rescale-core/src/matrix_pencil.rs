//! Matrix Pencil Method: Pole/Amplitude Extraction
//!
//! Fits a uniformly sampled complex record with a sum of complex
//! exponentials:
//!
//! ```text
//!   s_k = Σ_j A_j · z_j^k,   k = 0..N-1
//! ```
//!
//! where `z_j` is the pole of mode `j` (modulus = decay per sample, argument =
//! angular frequency · Δt) and `A_j` its complex amplitude.
//!
//! ## Algorithm
//!
//! 1. Hankel matrix `Y` of shape (N−L) × (L+1), row i = `s[i..=i+L]`
//! 2. SVD `Y = U·S·Vᴴ`
//! 3. Keep `r = min(N_poles, #{s > cutoff·s_max})` right singular directions
//! 4. `V1` / `V2` = kept rows of `Vᴴ` without the last / first column
//! 5. Poles = conjugated eigenvalues of `pinv(V1ᴴ)·V2ᴴ`
//! 6. Poles outside the unit circle are projected onto it
//! 7. Amplitudes from the least-squares Vandermonde fit
//!
//! The series must start at `t = 0`; shifted records are rejected.
//!
//! ## Example
//!
//! ```rust
//! use rescale_core::matrix_pencil::{decompose, PencilParameters};
//! use rescale_core::types::{complex_ops::from_polar, TimeSeries};
//!
//! let series = TimeSeries::from_fn(64, 0.1, |k| from_polar(0.99f64.powi(k as i32), 0.3 * k as f64));
//! let result = decompose(&series, &PencilParameters::new(26, 4, 1e-2)).unwrap();
//! assert_eq!(result.num_modes(), 1);
//! assert!((result.poles[0].arg() - 0.3).abs() < 1e-9);
//! ```

use nalgebra::{DMatrix, DVector, Schur};
use serde::{Deserialize, Serialize};

use crate::types::{complex_ops, Complex, RescaleError, RescaleResult, TimeSeries};

/// Singular values below this are dropped by the pencil pseudo-inverse.
const PINV_TOLERANCE: f64 = 1e-12;

/// Iteration cap for the Schur decomposition of the pencil matrix.
const SCHUR_MAX_ITERATIONS: usize = 10_000;

/// A single exponential mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mode {
    /// Pole (per-sample evolution factor), |pole| <= 1
    pub pole: Complex,
    /// Complex least-squares amplitude
    pub amplitude: Complex,
}

impl Mode {
    /// The mode's contribution at sample index n.
    pub fn evaluate(&self, n: usize) -> Complex {
        self.amplitude * self.pole.powi(n as i32)
    }

    /// Phase advance per sample (angular frequency · Δt).
    pub fn phase(&self) -> f64 {
        self.pole.arg()
    }

    /// Decay per sample as a rate (`-ln|pole|`).
    pub fn damping(&self) -> f64 {
        -self.pole.norm().ln()
    }
}

/// Pencil parameters (L, N_poles, cutoff).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PencilParameters {
    /// Pencil length L (Hankel split point)
    pub pencil: usize,
    /// Maximum number of retained singular directions
    pub max_poles: usize,
    /// Relative singular-value threshold
    pub cutoff: f64,
}

impl PencilParameters {
    pub fn new(pencil: usize, max_poles: usize, cutoff: f64) -> Self {
        Self {
            pencil,
            max_poles,
            cutoff,
        }
    }

    /// Check the parameters against a series of `len` samples.
    pub fn validate(&self, len: usize) -> RescaleResult<()> {
        if self.pencil < 1 || self.pencil >= len {
            return Err(RescaleError::InvalidPencilSize {
                pencil: self.pencil,
                len,
            });
        }
        if self.max_poles == 0 {
            return Err(RescaleError::InvalidParameter(
                "max_poles must be >= 1".to_string(),
            ));
        }
        if !(self.cutoff > 0.0 && self.cutoff < 1.0) {
            return Err(RescaleError::InvalidParameter(format!(
                "cutoff must be in (0, 1), got {}",
                self.cutoff
            )));
        }
        Ok(())
    }
}

/// Matrix pencil decomposition result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionResult {
    /// Extracted poles, in eigen-solver order
    pub poles: Vec<Complex>,
    /// Amplitudes matching `poles` index by index
    pub amplitudes: Vec<Complex>,
    /// Sum of squared least-squares residuals
    pub residual: f64,
    /// Residual norm relative to the signal norm
    pub relative_residual: f64,
    /// Singular values of the retained directions
    pub retained_singular_values: Vec<f64>,
    /// All singular values of the Hankel matrix, descending
    pub singular_values: Vec<f64>,
}

impl DecompositionResult {
    /// Number of retained modes.
    pub fn num_modes(&self) -> usize {
        self.poles.len()
    }

    /// Iterate over (pole, amplitude) pairs.
    pub fn modes(&self) -> impl Iterator<Item = Mode> + '_ {
        self.poles
            .iter()
            .zip(self.amplitudes.iter())
            .map(|(&pole, &amplitude)| Mode { pole, amplitude })
    }

    /// Reconstruct the signal from all modes at given length.
    pub fn reconstruct(&self, length: usize) -> Vec<Complex> {
        (0..length)
            .map(|n| self.modes().map(|mode| mode.evaluate(n)).sum())
            .collect()
    }
}

/// Decompose a series into exponential modes.
pub fn decompose(
    series: &TimeSeries,
    params: &PencilParameters,
) -> RescaleResult<DecompositionResult> {
    series.validate()?;
    let n = series.len();
    params.validate(n)?;
    let samples = series.samples();
    let l = params.pencil;

    // Step 1: Hankel matrix
    let hankel = DMatrix::<Complex>::from_fn(n - l, l + 1, |i, j| samples[i + j]);

    // Step 2: SVD (only the right singular vectors are needed)
    let svd = hankel.svd(false, true);
    let v_adjoint = svd
        .v_t
        .ok_or_else(|| RescaleError::InvalidParameter("SVD returned no right vectors".into()))?;
    let order = descending_order(svd.singular_values.as_slice());
    let singular_values: Vec<f64> = order.iter().map(|&i| svd.singular_values[i]).collect();

    // Step 3: retained rank
    let s_max = singular_values.first().copied().unwrap_or(0.0);
    if !(s_max.is_finite() && s_max > f64::MIN_POSITIVE) {
        return Err(RescaleError::InsufficientRank);
    }
    let above_cutoff = singular_values
        .iter()
        .filter(|&&s| s > params.cutoff * s_max)
        .count();
    let rank = params.max_poles.min(above_cutoff);
    if rank == 0 {
        return Err(RescaleError::InsufficientRank);
    }

    // Step 4: shifted sub-matrices of Vᴴ
    let v1 = DMatrix::<Complex>::from_fn(rank, l, |i, j| v_adjoint[(order[i], j)]);
    let v2 = DMatrix::<Complex>::from_fn(rank, l, |i, j| v_adjoint[(order[i], j + 1)]);

    // Step 5: pencil solution and its eigenvalues
    let pencil = v1
        .adjoint()
        .pseudo_inverse(PINV_TOLERANCE)
        .map_err(|e| RescaleError::InvalidParameter(e.to_string()))?
        * v2.adjoint();
    let eigenvalues = complex_eigenvalues(pencil)?;

    // Step 6: conjugate and clamp to the unit disk
    let poles: Vec<Complex> = eigenvalues
        .into_iter()
        .map(|z| complex_ops::clamp_to_unit_disk(z.conj()))
        .collect();

    // Step 7: amplitudes
    let (amplitudes, residual, relative_residual) = fit_amplitudes(samples, &poles)?;

    tracing::trace!(
        len = n,
        pencil = l,
        rank,
        residual,
        "matrix pencil decomposition"
    );

    Ok(DecompositionResult {
        poles,
        amplitudes,
        residual,
        relative_residual,
        retained_singular_values: singular_values[..rank].to_vec(),
        singular_values,
    })
}

// ---- Internal helpers ----

/// Indices ordered by descending value; equal values keep ascending index.
fn descending_order(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

/// Eigenvalues of a general complex square matrix.
fn complex_eigenvalues(matrix: DMatrix<Complex>) -> RescaleResult<Vec<Complex>> {
    if matrix.nrows() == 1 {
        return Ok(vec![matrix[(0, 0)]]);
    }
    // The complex Schur form is upper triangular.
    let schur = Schur::try_new(matrix, f64::EPSILON, SCHUR_MAX_ITERATIONS)
        .ok_or(RescaleError::EigenSolverFailed)?;
    let (_, triangular) = schur.unpack();
    Ok(triangular.diagonal().iter().copied().collect())
}

/// Least-squares amplitudes for `s_k = Σ_j A_j z_j^k`.
///
/// Returns (amplitudes, sum of squared residuals, relative residual norm).
fn fit_amplitudes(
    samples: &[Complex],
    poles: &[Complex],
) -> RescaleResult<(Vec<Complex>, f64, f64)> {
    let n = samples.len();
    let m = poles.len();

    let mut vandermonde = DMatrix::<Complex>::zeros(n, m);
    for (j, &z) in poles.iter().enumerate() {
        let mut power = Complex::new(1.0, 0.0);
        for k in 0..n {
            vandermonde[(k, j)] = power;
            power *= z;
        }
    }
    let rhs = DVector::<Complex>::from_column_slice(samples);

    let svd = vandermonde.clone().svd(true, true);
    let s_max = svd.singular_values.max();
    let eps = s_max * f64::EPSILON * n.max(m) as f64;
    let amplitudes = svd
        .solve(&rhs, eps)
        .map_err(|e| RescaleError::LeastSquaresFailed(e.to_string()))?;

    let residual_vec = &rhs - &vandermonde * &amplitudes;
    let residual = residual_vec.norm_squared();
    let signal_power = rhs.norm_squared();
    let relative_residual = if signal_power > 1e-300 {
        (residual / signal_power).sqrt()
    } else {
        0.0
    };

    Ok((amplitudes.iter().copied().collect(), residual, relative_residual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::complex_ops::from_polar;

    fn exponential_sum(len: usize, modes: &[(Complex, Complex)]) -> TimeSeries {
        TimeSeries::from_fn(len, 1.0, |k| {
            modes
                .iter()
                .map(|&(amp, pole)| amp * pole.powi(k as i32))
                .sum()
        })
    }

    fn closest(poles: &[Complex], target: Complex) -> usize {
        let mut best = 0;
        for (i, p) in poles.iter().enumerate() {
            if (p - target).norm() < (poles[best] - target).norm() {
                best = i;
            }
        }
        best
    }

    #[test]
    fn test_exact_mode_recovery() {
        let modes = [
            (Complex::new(1.0, 0.0), from_polar(0.97, 0.3)),
            (Complex::new(0.5, 0.2), from_polar(0.9, -1.1)),
            (Complex::new(0.0, 0.3), from_polar(1.0, 2.0)),
        ];
        let series = exponential_sum(60, &modes);
        let result = decompose(&series, &PencilParameters::new(24, 5, 1e-10)).unwrap();

        assert_eq!(result.num_modes(), 3);
        for &(amp, pole) in &modes {
            let i = closest(&result.poles, pole);
            assert!(
                (result.poles[i] - pole).norm() < 1e-8,
                "pole {} vs {}",
                result.poles[i],
                pole
            );
            assert!(
                (result.amplitudes[i] - amp).norm() < 1e-8,
                "amplitude {} vs {}",
                result.amplitudes[i],
                amp
            );
        }
        assert!(result.residual < 1e-16);
    }

    #[test]
    fn test_single_mode_phase() {
        let omega = 3.0;
        let dt = 0.05;
        let series = TimeSeries::from_fn(80, dt, |k| from_polar(1.0, omega * dt * k as f64));
        let result = decompose(&series, &PencilParameters::new(32, 4, 1e-2)).unwrap();
        assert_eq!(result.num_modes(), 1);
        assert!((result.poles[0].arg() - omega * dt).abs() < 1e-9);
        assert!((result.poles[0].norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cutoff_limits_rank() {
        let modes = [
            (Complex::new(1.0, 0.0), from_polar(0.99, 0.4)),
            (Complex::new(1e-4, 0.0), from_polar(0.99, -0.9)),
        ];
        let series = exponential_sum(50, &modes);
        let coarse = decompose(&series, &PencilParameters::new(20, 4, 1e-2)).unwrap();
        assert_eq!(coarse.num_modes(), 1);

        let fine = decompose(&series, &PencilParameters::new(20, 4, 1e-8)).unwrap();
        assert_eq!(fine.num_modes(), 2);
    }

    #[test]
    fn test_max_poles_limits_rank() {
        let modes = [
            (Complex::new(1.0, 0.0), from_polar(0.99, 0.4)),
            (Complex::new(0.6, 0.0), from_polar(0.95, -0.9)),
            (Complex::new(0.3, 0.0), from_polar(0.9, 1.7)),
        ];
        let series = exponential_sum(50, &modes);
        let result = decompose(&series, &PencilParameters::new(20, 2, 1e-10)).unwrap();
        assert_eq!(result.num_modes(), 2);
        assert_eq!(result.retained_singular_values.len(), 2);
        assert!(result.singular_values.len() >= 3);
    }

    #[test]
    fn test_growing_pole_is_clamped() {
        let series = exponential_sum(40, &[(Complex::new(1.0, 0.0), from_polar(1.02, 0.5))]);
        let result = decompose(&series, &PencilParameters::new(16, 1, 1e-2)).unwrap();
        assert!((result.poles[0].norm() - 1.0).abs() < 1e-12);
        assert!((result.poles[0].arg() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_singular_values_descending() {
        let series = exponential_sum(
            40,
            &[
                (Complex::new(0.2, 0.0), from_polar(0.9, 0.2)),
                (Complex::new(1.0, 0.0), from_polar(0.95, 1.2)),
            ],
        );
        let result = decompose(&series, &PencilParameters::new(16, 4, 1e-3)).unwrap();
        for pair in result.singular_values.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn test_invalid_pencil_size() {
        let series = TimeSeries::from_real(&[1.0; 10], 1.0);
        for pencil in [0, 10, 11] {
            let err = decompose(&series, &PencilParameters::new(pencil, 2, 1e-2)).unwrap_err();
            assert_eq!(err, RescaleError::InvalidPencilSize { pencil, len: 10 });
        }
    }

    #[test]
    fn test_all_zero_series_is_insufficient_rank() {
        let series = TimeSeries::from_real(&[0.0; 20], 1.0);
        let err = decompose(&series, &PencilParameters::new(8, 2, 1e-2)).unwrap_err();
        assert_eq!(err, RescaleError::InsufficientRank);
    }

    #[test]
    fn test_shifted_series_rejected() {
        let series = TimeSeries::from_real(&[1.0; 20], 1.0).with_start_time(2.0);
        let err = decompose(&series, &PencilParameters::new(8, 2, 1e-2)).unwrap_err();
        assert_eq!(err, RescaleError::TimeShiftedSeries(2.0));
    }

    #[test]
    fn test_invalid_cutoff_and_poles() {
        let series = TimeSeries::from_real(&[1.0; 20], 1.0);
        assert!(matches!(
            decompose(&series, &PencilParameters::new(8, 0, 1e-2)),
            Err(RescaleError::InvalidParameter(_))
        ));
        assert!(matches!(
            decompose(&series, &PencilParameters::new(8, 2, 1.5)),
            Err(RescaleError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_reconstruct_matches_input() {
        let modes = [
            (Complex::new(1.0, 0.5), from_polar(0.98, 0.7)),
            (Complex::new(0.4, 0.0), from_polar(0.93, -0.2)),
        ];
        let series = exponential_sum(40, &modes);
        let result = decompose(&series, &PencilParameters::new(16, 2, 1e-6)).unwrap();
        let recon = result.reconstruct(40);
        for (r, s) in recon.iter().zip(series.samples()) {
            assert!((r - s).norm() < 1e-9);
        }
    }

    #[test]
    fn test_deterministic() {
        let series = exponential_sum(
            48,
            &[
                (Complex::new(1.0, 0.0), from_polar(0.97, 0.3)),
                (Complex::new(0.5, 0.0), from_polar(0.9, -1.0)),
            ],
        );
        let params = PencilParameters::new(19, 4, 1e-3);
        assert_eq!(
            decompose(&series, &params).unwrap(),
            decompose(&series, &params).unwrap()
        );
    }

    #[test]
    fn test_descending_order_tie_break() {
        assert_eq!(descending_order(&[1.0, 3.0, 3.0, 2.0]), vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_mode_evaluate() {
        let mode = Mode {
            amplitude: Complex::new(2.0, 0.0),
            pole: from_polar(0.5, 0.0),
        };
        assert!((mode.evaluate(0).re - 2.0).abs() < 1e-12);
        assert!((mode.evaluate(2).re - 0.5).abs() < 1e-12);
        assert!((mode.damping() - 2f64.ln()).abs() < 1e-12);
    }
}
