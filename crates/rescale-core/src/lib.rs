//! # Rescaling-Based Energy Gap Estimation
//!
//! This crate estimates energy gaps (angular frequencies) from complex
//! expectation-value time series and mitigates the bias that noise and
//! systematic generator errors introduce into those estimates.
//!
//! ## Overview
//!
//! A quantum-phase-estimation style experiment produces a record
//! `s_k = Σ_j A_j · z_j^k` whose pole phases encode the energy differences of
//! interest. Noise shifts and damps those poles. The library implements:
//!
//! - **Matrix Pencil Decomposition**: Hankel/SVD/pseudo-inverse pole recovery
//! - **Dominant Mode Selection**: amplitude-ranked phase extraction
//! - **Rescaling Mitigation**: first- and second-order extrapolation from
//!   records taken with the generator rescaled by `c1` and `c2`
//! - **Richardson Combination**: the same extrapolation applied to the raw
//!   records before decomposition, for comparison
//!
//! ## Estimation Flow
//!
//! ```text
//! Provider(c=1, c1, c2) → TimeSeries ×3 → Matrix Pencil → Dominant Phase ×3
//!                                        → Reconcile Modes → Corrections
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rescale_core::prelude::*;
//! use rescale_core::types::complex_ops::from_polar;
//!
//! let series = TimeSeries::from_fn(100, 0.1, |k| from_polar(1.0, 0.35 * k as f64));
//! let params = PencilParameters::new(40, 4, 1e-2);
//! let result = decompose(&series, &params).unwrap();
//! assert_eq!(result.num_modes(), 1);
//! assert!((result.poles[0].arg() - 0.35).abs() < 1e-9);
//! ```

pub mod comparison;
pub mod config;
pub mod matrix_pencil;
pub mod mode_selector;
pub mod provider;
pub mod rescaling;
pub mod richardson;
pub mod types;

pub use comparison::{ComparisonEstimate, RescalingComparison};
pub use config::{EstimatorConfig, EstimatorConfigBuilder};
pub use matrix_pencil::{decompose, DecompositionResult, Mode, PencilParameters};
pub use mode_selector::{select_dominant_modes, DominantModes};
pub use provider::{SignalProvider, SignalRequest};
pub use rescaling::{
    first_order_correction, second_order_correction, EstimateTriple, MitigatedEstimate,
    RescaledSignals, RescalingConfiguration, RescalingEstimator,
};
pub use richardson::{combine_and_estimate, RichardsonEstimate};
pub use types::{Complex, RescaleError, RescaleResult, Sample, TimeSeries};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::comparison::{ComparisonEstimate, RescalingComparison};
    pub use crate::config::EstimatorConfig;
    pub use crate::matrix_pencil::{decompose, DecompositionResult, Mode, PencilParameters};
    pub use crate::mode_selector::{select_dominant_modes, DominantModes};
    pub use crate::provider::{SignalProvider, SignalRequest};
    pub use crate::rescaling::{
        EstimateTriple, MitigatedEstimate, RescaledSignals, RescalingConfiguration,
        RescalingEstimator,
    };
    pub use crate::richardson::{combine_and_estimate, RichardsonEstimate};
    pub use crate::types::{Complex, RescaleError, RescaleResult, Sample, TimeSeries};
}
