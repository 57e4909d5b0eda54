// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use async_trait::async_trait;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAction {
    CreateRecord,
    SubmitVerification,
}

impl fmt::Display for SigningAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningAction::CreateRecord => write!(f, "create content record"),
            SigningAction::SubmitVerification => write!(f, "submit decryption proof"),
        }
    }
}

/// One discrete authorization request shown to whoever controls the signing key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    pub action: SigningAction,
    pub content_id: String,
    pub contract: Address,
    pub signer: Address,
}

impl fmt::Display for SigningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' on {} as {}",
            self.action, self.content_id, self.contract, self.signer
        )
    }
}

/// Gate in front of every signing call. Returning `false` aborts the call before anything
/// is broadcast.
#[async_trait]
pub trait SigningApprover: Send + Sync {
    async fn approve(&self, request: &SigningRequest) -> bool;
}

/// Approves everything. For non-interactive sessions where the key holder consented up front.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl SigningApprover for AutoApprove {
    async fn approve(&self, _: &SigningRequest) -> bool {
        true
    }
}
