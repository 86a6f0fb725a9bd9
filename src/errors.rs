//! Error types for the settlement core.
//!
//! `SettlementError` is the caller-facing taxonomy: every failure mode of a
//! settlement maps onto exactly one variant, and none of them may leave a
//! wallet out of sync with its committed ledger entries.

use rust_decimal::Decimal;

/// Caller-facing settlement failures.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    /// Stake is zero, negative, or outside the configured platform bounds.
    /// Rejected before any wallet access is acquired.
    #[error("Invalid bet amount {amount}: allowed range is {min}..={max}")]
    InvalidBet {
        amount: Decimal,
        min: Decimal,
        max: Decimal,
    },

    /// Game-type tag did not match any supported variant.
    #[error("Unknown game type: {0}")]
    UnknownGameType(String),

    /// Required game parameters missing or out of declared range.
    #[error("Invalid game parameters: {0}")]
    InvalidParameters(String),

    /// Authoritative balance check failed; nothing was persisted.
    #[error("Insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: Decimal, required: Decimal },

    /// Atomic commit did not complete; the entire unit was discarded and
    /// the wallet is unchanged. The caller may retry the settlement.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// Wallet lease or commit exceeded its configured bound. No-op from
    /// the wallet's perspective.
    #[error("Settlement timed out after {waited_ms}ms ({phase})")]
    Timeout { phase: TimeoutPhase, waited_ms: u64 },
}

/// Which bounded wait was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPhase {
    /// Waiting for exclusive access to the wallet.
    Lease,
    /// Waiting for the atomic commit to land.
    Commit,
}

impl std::fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutPhase::Lease => write!(f, "wallet lease"),
            TimeoutPhase::Commit => write!(f, "atomic commit"),
        }
    }
}

/// Key-value store failures. Surface to callers as `PersistenceFailure`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database open failed: {0}")]
    OpenFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Corrupted record: {0}")]
    CorruptedData(String),
}

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        StoreError::WriteFailed(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::CorruptedData(e.to_string())
    }
}

impl From<StoreError> for SettlementError {
    fn from(e: StoreError) -> Self {
        SettlementError::PersistenceFailure(e.to_string())
    }
}

/// Convenience alias used throughout the coordinator.
pub type SettlementResult<T> = Result<T, SettlementError>;
