//! Error type for the simulation layer.

use rescale_core::RescaleError;
use thiserror::Error;

/// Errors raised while building models, producing records or running sweeps.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("Invalid Pauli character '{0}'")]
    InvalidPauli(char),

    #[error("Pauli string length {actual} does not match Hamiltonian width {expected}")]
    QubitCountMismatch { expected: usize, actual: usize },

    #[error("Hamiltonian contains non-diagonal term {0}")]
    NonDiagonal(String),

    #[error("Qubit {qubit} out of range for {qubits} qubits")]
    QubitIndex { qubit: usize, qubits: usize },

    #[error("Basis state {index} out of range for {qubits} qubits")]
    StateIndex { index: usize, qubits: usize },

    #[error("Requested {requested} state pairs but only {available} exist")]
    TooManyPairs { requested: usize, available: usize },

    #[error("Invalid model parameter: {0}")]
    InvalidParameter(String),

    #[error("Config not found: {0}")]
    ConfigNotFound(String),

    #[error("Failed to read config: {0}")]
    ConfigRead(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    #[error("Invalid config: {0}")]
    ConfigValidation(String),

    #[error("Failed to serialize report: {0}")]
    Serialization(String),

    #[error(transparent)]
    Estimation(#[from] RescaleError),
}

/// Result type for simulation operations
pub type SimResult<T> = Result<T, SimError>;

impl From<SimError> for RescaleError {
    fn from(err: SimError) -> Self {
        match err {
            SimError::Estimation(inner) => inner,
            other => RescaleError::Provider(other.to_string()),
        }
    }
}
