// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

/// Opaque on-chain reference to an encrypted value
pub type Handle = B256;

/// The record as the contract stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub title: String,
    pub description: String,
    pub creator: Address,
    /// Block timestamp in seconds
    pub created_at: u64,
    pub public_value1: u32,
    pub public_value2: u32,
    pub is_verified: bool,
    /// Only meaningful once `is_verified` is set
    pub decrypted_value: u32,
}

/// Arguments for `createContentData`
#[derive(Debug)]
pub struct CreateRecordRequest {
    pub content_id: String,
    pub title: String,
    pub description: String,
    pub encrypted_value: Bytes,
    pub input_proof: Bytes,
    pub public_value1: u32,
    pub public_value2: u32,
}

/// Proof that a transaction was mined and succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxConfirmation {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}
