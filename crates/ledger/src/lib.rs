// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod approval;
pub mod contracts;
mod error;
pub mod retry;
mod types;

pub use approval::{AutoApprove, SigningAction, SigningApprover, SigningRequest};
pub use contracts::{
    abi_encode_clear_values, ContentGateContractFactory, ContentGateReadContract,
    ContentGateWriteContract, LedgerRead, LedgerWrite,
};
pub use error::*;
pub use types::*;
