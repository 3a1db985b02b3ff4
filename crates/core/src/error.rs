//! Error types for the zkid core library

use std::time::Duration;

use thiserror::Error;

/// Result type alias for zkid operations
pub type Result<T> = std::result::Result<T, ZkidError>;

/// Error types that can occur while preparing, proving or verifying a disclosure
#[derive(Error, Debug)]
pub enum ZkidError {
    /// A raw attribute could not be mapped to a field element
    #[error("Malformed attribute: {0}")]
    PreprocessingError(String),

    /// A recomputed DID or commitment differs from the supplied one
    #[error("Consistency check failed: {0}")]
    ConsistencyError(String),

    /// The circuit could not be synthesised into a constraint system
    #[error("Circuit compilation failed: {0}")]
    CompilationError(String),

    /// Key material is missing, corrupt or belongs to another circuit
    #[error("Key material error: {0}")]
    KeyIoError(String),

    /// The witness does not satisfy the circuit (the predicate is false)
    #[error("Witness does not satisfy the circuit: {0}")]
    WitnessError(String),

    /// The proof was cryptographically rejected
    #[error("Proof verification failed: {0}")]
    VerificationFailure(String),

    /// Public inputs or envelope do not match the declared circuit layout
    #[error("Configuration mismatch: {0}")]
    ConfigurationError(String),

    /// Proof generation exceeded its deadline
    #[error("Proof generation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Backend (de)serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error
    #[error("Error: {0}")]
    Other(String),
}

impl ZkidError {
    /// True for the two legitimate negative outcomes: the predicate does not
    /// hold, or the proof does not verify. Neither is ever retried.
    pub fn is_negative_outcome(&self) -> bool {
        matches!(
            self,
            ZkidError::WitnessError(_) | ZkidError::VerificationFailure(_)
        )
    }
}

impl From<ark_serialize::SerializationError> for ZkidError {
    fn from(err: ark_serialize::SerializationError) -> Self {
        ZkidError::SerializationError(err.to_string())
    }
}
