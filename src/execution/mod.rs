//! Transaction lifecycle
//!
//! Turns a venue's [`ContractCall`](crate::types::ContractCall) into a signed,
//! submitted transaction: gas price, fresh nonce, intent, submit.

mod allowance;
mod manager;

pub use allowance::AllowancePolicy;
pub use manager::TransactionManager;

use thiserror::Error;

/// Why a transaction was not submitted
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TxError {
    #[error("gas price unavailable: {0}")]
    GasPrice(String),

    #[error("nonce unavailable: {0}")]
    Nonce(String),

    #[error("call encoding failed: {0}")]
    Encoding(String),

    #[error("swap deadline {deadline} is not after now ({now})")]
    DeadlineExpired { deadline: u64, now: u64 },

    #[error("allowance check failed: {0}")]
    Allowance(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("stale nonce: {0}")]
    StaleNonce(String),

    #[error("gas price too low: {0}")]
    Underpriced(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("rejected by node: {0}")]
    Rejected(String),
}

impl TxError {
    /// Classify a node rejection message
    pub fn from_rejection(message: String) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("nonce too low")
            || lower.contains("already known")
            || lower.contains("account has nonce")
            || lower.contains("invalid nonce")
        {
            TxError::StaleNonce(message)
        } else if lower.contains("underpriced") || lower.contains("fee too low") {
            TxError::Underpriced(message)
        } else if lower.contains("insufficient funds") {
            TxError::InsufficientFunds(message)
        } else {
            TxError::Rejected(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(matches!(
            TxError::from_rejection("nonce too low: next nonce 5, tx nonce 4".into()),
            TxError::StaleNonce(_)
        ));
        assert!(matches!(
            TxError::from_rejection("replacement transaction underpriced".into()),
            TxError::Underpriced(_)
        ));
        assert!(matches!(
            TxError::from_rejection("Insufficient funds for gas * price + value".into()),
            TxError::InsufficientFunds(_)
        ));
        assert!(matches!(
            TxError::from_rejection("connection reset by peer".into()),
            TxError::Rejected(_)
        ));
    }
}
