//! Analytic signal provider for diagonal Hamiltonians.
//!
//! For basis states `a`, `b` of an I/Z-only Hamiltonian the transition
//! amplitude evolves as a single damped tone, so the record is computed in
//! closed form instead of by integrating a master equation:
//!
//! ```text
//! H_c  = H/c + hamError·Σ Z_i
//! Δt_c = c·Δt
//! s_k  = exp(i·(E_b − E_a)·k·Δt_c) · exp(−κ·k·Δt_c)  (+ measurement noise)
//! ```
//!
//! The systematic error is not rescaled with the generator, so the phase per
//! sample is `(ΔE + δ·c)·Δt`, linear in `c`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rescale_core::types::complex_ops::from_polar;
use rescale_core::{Complex, RescaleError, RescaleResult, SignalProvider, SignalRequest, TimeSeries};

use crate::error::{SimError, SimResult};
use crate::hamiltonian::PauliHamiltonian;

/// Additive complex Gaussian noise on every sample.
#[derive(Debug, Clone, Copy)]
struct MeasurementNoise {
    distribution: Normal<f64>,
    seed: u64,
}

/// Closed-form records for a pair of basis states of a diagonal Hamiltonian.
#[derive(Debug, Clone)]
pub struct DiagonalModelProvider {
    hamiltonian: PauliHamiltonian,
    state_a: usize,
    state_b: usize,
    noise: Option<MeasurementNoise>,
}

impl DiagonalModelProvider {
    pub fn new(hamiltonian: PauliHamiltonian, state_a: usize, state_b: usize) -> SimResult<Self> {
        if let Some(term) = hamiltonian.first_off_diagonal() {
            return Err(SimError::NonDiagonal(term.to_string()));
        }
        for index in [state_a, state_b] {
            if index >= hamiltonian.dimension() {
                return Err(SimError::StateIndex {
                    index,
                    qubits: hamiltonian.num_qubits(),
                });
            }
        }
        Ok(Self {
            hamiltonian,
            state_a,
            state_b,
            noise: None,
        })
    }

    /// Add complex Gaussian noise with total standard deviation `std_dev`.
    ///
    /// Each record is seeded from `seed` and its rescaling factor, so repeated
    /// requests return identical records.
    pub fn with_measurement_noise(mut self, std_dev: f64, seed: u64) -> SimResult<Self> {
        let distribution = Normal::new(0.0, std_dev / 2.0_f64.sqrt())
            .map_err(|e| SimError::InvalidParameter(format!("measurement noise: {}", e)))?;
        self.noise = Some(MeasurementNoise { distribution, seed });
        Ok(self)
    }

    pub fn hamiltonian(&self) -> &PauliHamiltonian {
        &self.hamiltonian
    }

    pub fn states(&self) -> (usize, usize) {
        (self.state_a, self.state_b)
    }

    /// Noise-free gap E_b − E_a of the unscaled Hamiltonian.
    pub fn exact_gap(&self) -> SimResult<f64> {
        gap(&self.hamiltonian, self.state_a, self.state_b)
    }

    /// Build the record for `request`.
    pub fn record(&self, request: &SignalRequest) -> SimResult<TimeSeries> {
        let c = request.rescaling;
        if !(c.is_finite() && c > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "rescaling factor must be positive, got {}",
                c
            )));
        }

        let effective = self.hamiltonian.rescaled(c).with_local_z_error(request.ham_error);
        let omega = gap(&effective, self.state_a, self.state_b)?;
        let dt = request.dt();
        let kappa = request.kappa;

        let mut series = TimeSeries::from_fn(request.samples, dt, |k| {
            let t = k as f64 * dt;
            from_polar((-kappa * t).exp(), omega * t)
        });

        if let Some(noise) = &self.noise {
            let mut rng = StdRng::seed_from_u64(noise.seed ^ c.to_bits());
            let noisy: Vec<Complex> = series
                .samples()
                .iter()
                .map(|&s| {
                    s + Complex::new(
                        noise.distribution.sample(&mut rng),
                        noise.distribution.sample(&mut rng),
                    )
                })
                .collect();
            series = TimeSeries::new(noisy, dt);
        }

        tracing::trace!(
            rescaling = c,
            kappa,
            ham_error = request.ham_error,
            omega,
            samples = request.samples,
            "diagonal model record"
        );

        Ok(series)
    }
}

impl SignalProvider for DiagonalModelProvider {
    fn produce(&self, request: &SignalRequest) -> RescaleResult<TimeSeries> {
        self.record(request).map_err(RescaleError::from)
    }
}

fn gap(hamiltonian: &PauliHamiltonian, a: usize, b: usize) -> SimResult<f64> {
    Ok(hamiltonian.diagonal_energy(b)? - hamiltonian.diagonal_energy(a)?)
}
