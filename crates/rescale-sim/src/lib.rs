//! # Rescaling Simulation Layer
//!
//! Boundary layer around `rescale-core`: qubit Hamiltonians, an analytic
//! [`SignalProvider`](rescale_core::SignalProvider) for diagonal models, random
//! state-pair sampling, YAML sweep configuration and the noise-sweep runner.
//!
//! ## Sweep Flow
//!
//! ```text
//! SweepConfig → PauliHamiltonian → state pairs → DiagonalModelProvider
//!             → for each γ: RescalingEstimator (and Richardson) → SweepReport
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rescale_sim::{SweepConfig, SweepRunner};
//!
//! let config = SweepConfig {
//!     fields: vec![3.0, 1.25, 0.5],
//!     pairs: 2,
//!     gammas: vec![0.01, 0.05],
//!     samples: 100,
//!     base_dt: 0.01,
//!     default_poles: 4,
//!     ..Default::default()
//! };
//! let run = SweepRunner::new(config).unwrap().run().unwrap();
//! assert_eq!(run.reports.len(), 2);
//! assert!(run.pair_failures.is_empty());
//! ```

pub mod config;
pub mod error;
pub mod hamiltonian;
pub mod observe;
pub mod pairs;
pub mod provider;
pub mod sweep;

pub use config::SweepConfig;
pub use error::{SimError, SimResult};
pub use hamiltonian::{Pauli, PauliHamiltonian, PauliString};
pub use pairs::sample_state_pairs;
pub use provider::DiagonalModelProvider;
pub use sweep::{PairFailure, SweepFailure, SweepRecord, SweepReport, SweepRun, SweepRunner};
