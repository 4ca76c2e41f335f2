//! Error types for the Capstan upgrade orchestration system.

use crate::types::Address;
use thiserror::Error;

/// Errors raised by the on-chain ledger state machine.
///
/// Every mutating ledger operation fails with one of these categories; the
/// orchestration layer treats them all as non-retryable since a rejected call
/// reflects real state, not a transport fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("too many contracts adopted")]
    CapacityExceeded,

    #[error("invalid nonce: expected {expected}, submitted {submitted}")]
    NonceConflict { expected: u64, submitted: u64 },

    #[error("call to {target} failed: {reason}")]
    CallFailed { target: Address, reason: String },
}

/// Errors raised by the off-chain orchestration layers.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A ledger call reverted. Surfaced immediately, never retried.
    #[error("ledger rejected call: {0}")]
    Ledger(#[from] LedgerError),

    /// Transient transport-level failure. The execution driver retries these.
    #[error("network error: {0}")]
    Network(String),

    /// The signer's on-chain transaction count has not yet moved past its
    /// pre-submission value. Retryable; distinct from application failure.
    #[error("transaction count for {0} not yet increased")]
    NoncePending(Address),

    #[error("gave up after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    /// Unexpected code found where a known singleton was required. Fatal.
    #[error("integrity failure: {0}")]
    Integrity(String),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("metadata store error: {0}")]
    Store(String),

    #[error("quorum error: {0}")]
    Quorum(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("aborted by user")]
    Aborted,
}

impl OrchestratorError {
    /// Whether the execution driver may retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrchestratorError::Network(_) | OrchestratorError::NoncePending(_)
        )
    }
}
