// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use cg_ledger::LedgerError;
use cg_relayer::{EncryptionError, OracleError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error(transparent)]
    EncryptionUnavailable(#[from] EncryptionError),
    /// Retryable. Nothing was changed on the ledger.
    #[error(transparent)]
    LedgerUnreachable(LedgerError),
    /// The key holder declined. Not a fault.
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),
    #[error(transparent)]
    TransactionReverted(LedgerError),
    #[error(transparent)]
    DecryptionOracleError(#[from] OracleError),
    #[error("Content record {0} not found")]
    RecordNotFound(String),
    #[error("No signing key configured for this session")]
    SignerUnavailable,
}

impl AccessError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, AccessError::TransactionRejected(_))
    }
}

impl From<LedgerError> for AccessError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::TransactionRejected(reason) => AccessError::TransactionRejected(reason),
            LedgerError::TransactionReverted { .. } => AccessError::TransactionReverted(value),
            LedgerError::InvalidSigner(_) => AccessError::SignerUnavailable,
            LedgerError::Unreachable(_) | LedgerError::Decode(_) | LedgerError::CallReverted(_) => {
                AccessError::LedgerUnreachable(value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_map_onto_access_errors() {
        assert!(matches!(
            AccessError::from(LedgerError::Unreachable("refused".into())),
            AccessError::LedgerUnreachable(_)
        ));
        assert!(matches!(
            AccessError::from(LedgerError::Decode("bad abi".into())),
            AccessError::LedgerUnreachable(_)
        ));
        assert!(AccessError::from(LedgerError::TransactionRejected("user rejected".into()))
            .is_rejection());
        assert!(matches!(
            AccessError::from(LedgerError::TransactionReverted {
                tx_hash: None,
                reason: "already verified".into()
            }),
            AccessError::TransactionReverted(_)
        ));
    }

    #[test]
    fn test_transparent_display() {
        let err = AccessError::from(OracleError::Unreachable("gateway timeout".into()));
        assert_eq!(err.to_string(), "Decryption oracle unreachable: gateway timeout");
    }
}
