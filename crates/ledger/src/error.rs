// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::B256;
use std::fmt::Display;
use thiserror::Error;

/// Substrings wallets and remote signers use when the user refuses a request
const REJECTION_MARKERS: &[&str] = &[
    "user rejected",
    "user denied",
    "rejected the request",
    "request rejected",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger unreachable: {0}")]
    Unreachable(String),
    #[error("Could not decode ledger data: {0}")]
    Decode(String),
    #[error("Read call reverted: {0}")]
    CallReverted(String),
    #[error("Invalid signer: {0}")]
    InvalidSigner(String),
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),
    #[error("Transaction reverted{}: {reason}", tx_suffix(.tx_hash))]
    TransactionReverted {
        tx_hash: Option<B256>,
        reason: String,
    },
}

impl LedgerError {
    /// Only network level failures are worth another attempt. Everything else would fail
    /// the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Unreachable(_))
    }

    pub fn timed_out(operation: &str, after_ms: u128) -> Self {
        LedgerError::Unreachable(format!("{operation} timed out after {after_ms}ms"))
    }
}

fn tx_suffix(tx_hash: &Option<B256>) -> String {
    tx_hash.map(|h| format!(" ({h})")).unwrap_or_default()
}

fn is_rejection(lower: &str) -> bool {
    REJECTION_MARKERS.iter().any(|m| lower.contains(m))
}

/// Map an error raised while calling a view function
pub fn classify_read_error(err: impl Display) -> LedgerError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("revert") {
        LedgerError::CallReverted(msg)
    } else if lower.contains("decode") || lower.contains("abi") {
        LedgerError::Decode(msg)
    } else {
        LedgerError::Unreachable(msg)
    }
}

/// Map an error raised while signing, broadcasting or awaiting a transaction
pub fn classify_send_error(err: impl Display) -> LedgerError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();
    if is_rejection(&lower) {
        LedgerError::TransactionRejected(msg)
    } else if lower.contains("revert") {
        LedgerError::TransactionReverted {
            tx_hash: None,
            reason: msg,
        }
    } else {
        LedgerError::Unreachable(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_errors_are_classified() {
        assert!(matches!(
            classify_send_error("MetaMask Tx Signature: User denied transaction signature."),
            LedgerError::TransactionRejected(_)
        ));
        assert!(matches!(
            classify_send_error("server returned an error response: error code 3: execution reverted: already verified"),
            LedgerError::TransactionReverted { tx_hash: None, .. }
        ));
        assert!(matches!(
            classify_send_error("error sending request for url (http://localhost:8545/)"),
            LedgerError::Unreachable(_)
        ));
    }

    #[test]
    fn test_read_errors_are_classified() {
        assert!(matches!(
            classify_read_error("execution reverted: unknown content"),
            LedgerError::CallReverted(_)
        ));
        assert!(matches!(
            classify_read_error("ABI decoding failed: buffer overrun"),
            LedgerError::Decode(_)
        ));
        assert!(classify_read_error("connection refused").is_retryable());
    }

    #[test]
    fn test_reverted_display_includes_hash() {
        let err = LedgerError::TransactionReverted {
            tx_hash: Some(B256::repeat_byte(0xab)),
            reason: "status 0".to_string(),
        };
        let shown = err.to_string();
        assert!(shown.starts_with("Transaction reverted (0xabab"));
        assert!(shown.ends_with(": status 0"));
        assert!(!err.is_retryable());
    }
}
