// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use cg_ledger::Handle;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("Plaintext {value} is outside the accepted range {min}..={max}")]
    OutOfRange { value: u64, min: u64, max: u64 },
    #[error("Encryption service unavailable: {0}")]
    Unavailable(String),
    #[error("Encryption service rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Malformed encryption response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Decryption oracle unreachable: {0}")]
    Unreachable(String),
    #[error("Decryption oracle failed to produce a proof ({status}): {body}")]
    ProofFailed { status: u16, body: String },
    #[error("Malformed oracle response: {0}")]
    Malformed(String),
    #[error("Oracle response is missing a clear value for handle {0}")]
    MissingHandle(Handle),
}

impl From<reqwest::Error> for EncryptionError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            EncryptionError::Malformed(value.to_string())
        } else {
            EncryptionError::Unavailable(value.to_string())
        }
    }
}

impl From<reqwest::Error> for OracleError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            OracleError::Malformed(value.to_string())
        } else {
            OracleError::Unreachable(value.to_string())
        }
    }
}
