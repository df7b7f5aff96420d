//! Signal provider interface.
//!
//! The physical model that produces the raw expectation-value record is an
//! external collaborator. The estimators only see it through
//! [`SignalProvider`]: a request describing noise strength, systematic error
//! strength, rescaling factor and sampling grid goes in, a [`TimeSeries`]
//! starting at `t = 0` comes out.
//!
//! A request with rescaling factor `c` stands for the generator `H/c` sampled
//! with time step `c · base_dt`, so every rescaled record advances by the same
//! ideal phase per sample as the unscaled one.

use serde::{Deserialize, Serialize};

use crate::types::{RescaleResult, TimeSeries};

/// Parameters of one provider call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalRequest {
    /// Noise strength
    pub kappa: f64,
    /// Systematic error strength
    pub ham_error: f64,
    /// Rescaling factor applied to the generator (1 = unscaled)
    pub rescaling: f64,
    /// Number of samples
    pub samples: usize,
    /// Unscaled time step
    pub base_dt: f64,
}

impl SignalRequest {
    pub fn new(kappa: f64, ham_error: f64, samples: usize, base_dt: f64) -> Self {
        Self {
            kappa,
            ham_error,
            rescaling: 1.0,
            samples,
            base_dt,
        }
    }

    /// Same configuration at another rescaling factor.
    pub fn rescaled(&self, rescaling: f64) -> Self {
        Self { rescaling, ..*self }
    }

    /// Time step of the rescaled record.
    pub fn dt(&self) -> f64 {
        self.rescaling * self.base_dt
    }
}

/// Produces the raw complex record for a configuration.
pub trait SignalProvider {
    fn produce(&self, request: &SignalRequest) -> RescaleResult<TimeSeries>;
}

impl<F> SignalProvider for F
where
    F: Fn(&SignalRequest) -> RescaleResult<TimeSeries>,
{
    fn produce(&self, request: &SignalRequest) -> RescaleResult<TimeSeries> {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Complex;

    #[test]
    fn test_rescaled_request() {
        let request = SignalRequest::new(0.1, 0.01, 100, 0.5);
        let scaled = request.rescaled(2.0);
        assert_eq!(scaled.rescaling, 2.0);
        assert_eq!(scaled.dt(), 1.0);
        assert_eq!(scaled.samples, 100);
        assert_eq!(request.dt(), 0.5);
    }

    #[test]
    fn test_closure_provider() {
        let provider = |request: &SignalRequest| -> RescaleResult<TimeSeries> {
            Ok(TimeSeries::new(
                vec![Complex::new(request.rescaling, 0.0); request.samples],
                request.dt(),
            ))
        };
        let series = provider
            .produce(&SignalRequest::new(0.0, 0.0, 3, 1.0).rescaled(1.5))
            .unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.samples()[0].re, 1.5);
        assert_eq!(series.dt(), 1.5);
    }
}
