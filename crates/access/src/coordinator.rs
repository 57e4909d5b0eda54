// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::AccessError;
use crate::repository::AccessRecordRepository;
use cg_ledger::{
    retry::call_with_retry,
    LedgerError, LedgerWrite,
};
use cg_relayer::{DecryptionOracle, OracleError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Progress of one decrypt-and-verify run for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptionStage {
    Unstarted,
    /// The ledger already holds a verified value
    AlreadyVerified,
    HandleFetched,
    OraclePending,
    ProofReceived,
    Submitting,
    Verified,
    Failed {
        at: Box<DecryptionStage>,
        error: AccessError,
    },
}

impl DecryptionStage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DecryptionStage::AlreadyVerified
                | DecryptionStage::Verified
                | DecryptionStage::Failed { .. }
        )
    }
}

impl fmt::Display for DecryptionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecryptionStage::Unstarted => write!(f, "UNSTARTED"),
            DecryptionStage::AlreadyVerified => write!(f, "ALREADY_VERIFIED"),
            DecryptionStage::HandleFetched => write!(f, "HANDLE_FETCHED"),
            DecryptionStage::OraclePending => write!(f, "ORACLE_PENDING"),
            DecryptionStage::ProofReceived => write!(f, "PROOF_RECEIVED"),
            DecryptionStage::Submitting => write!(f, "SUBMITTING"),
            DecryptionStage::Verified => write!(f, "VERIFIED"),
            DecryptionStage::Failed { at, .. } => write!(f, "FAILED({at})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionReport {
    pub content_id: String,
    pub stage: DecryptionStage,
    /// Present only on success
    pub value: Option<u64>,
}

impl DecryptionReport {
    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }

    pub fn error(&self) -> Option<&AccessError> {
        match &self.stage {
            DecryptionStage::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The stage the run was in when it failed
    pub fn failed_at(&self) -> Option<&DecryptionStage> {
        match &self.stage {
            DecryptionStage::Failed { at, .. } => Some(at),
            _ => None,
        }
    }
}

struct Run<'a> {
    content_id: &'a str,
    stage: DecryptionStage,
}

impl<'a> Run<'a> {
    fn new(content_id: &'a str) -> Self {
        Self {
            content_id,
            stage: DecryptionStage::Unstarted,
        }
    }

    fn advance(&mut self, next: DecryptionStage) {
        debug!(content_id=%self.content_id, from=%self.stage, to=%next, "Decryption stage");
        self.stage = next;
    }

    fn succeed(mut self, terminal: DecryptionStage, value: u64) -> DecryptionReport {
        self.advance(terminal);
        DecryptionReport {
            content_id: self.content_id.to_string(),
            stage: self.stage,
            value: Some(value),
        }
    }

    fn fail(self, error: impl Into<AccessError>) -> DecryptionReport {
        let error = error.into();
        warn!(content_id=%self.content_id, stage=%self.stage, error=%error, "Decryption failed");
        DecryptionReport {
            content_id: self.content_id.to_string(),
            stage: DecryptionStage::Failed {
                at: Box::new(self.stage),
                error,
            },
            value: None,
        }
    }
}

/// Drives handle -> oracle -> on-chain proof for a single record. Every step can fail
/// without leaving partial on-chain state, so a failed run is retried by starting over.
pub struct DecryptionCoordinator {
    writer: Option<Arc<dyn LedgerWrite>>,
    oracle: Arc<dyn DecryptionOracle>,
    oracle_timeout: Duration,
}

impl DecryptionCoordinator {
    pub fn new(
        writer: Option<Arc<dyn LedgerWrite>>,
        oracle: Arc<dyn DecryptionOracle>,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            writer,
            oracle,
            oracle_timeout,
        }
    }

    pub async fn run(
        &self,
        repository: &AccessRecordRepository,
        content_id: &str,
    ) -> DecryptionReport {
        let mut run = Run::new(content_id);
        // Verification is terminal, so a session copy wins over a lagging node
        let known = repository
            .get(content_id)
            .await
            .and_then(|record| record.verified_clear_value());
        if let Some(value) = known {
            info!(%content_id, "Record already verified in this session");
            return run.succeed(DecryptionStage::AlreadyVerified, value);
        }

        let ledger = repository.ledger();
        let retry = repository.retry_policy();

        let fields = match call_with_retry("getContentData", retry, || {
            ledger.get_record(content_id)
        })
        .await
        {
            Ok(fields) => fields,
            Err(LedgerError::CallReverted(_)) => {
                return run.fail(AccessError::RecordNotFound(content_id.to_string()))
            }
            Err(e) => return run.fail(AccessError::LedgerUnreachable(e)),
        };
        if fields.is_verified {
            let value = fields.decrypted_value as u64;
            repository.mark_verified(content_id, value).await;
            info!(%content_id, "Record already verified on-chain");
            return run.succeed(DecryptionStage::AlreadyVerified, value);
        }

        let Some(writer) = self.writer.as_ref() else {
            return run.fail(AccessError::SignerUnavailable);
        };

        let handle = match call_with_retry("getEncryptedValue", retry, || {
            ledger.get_encrypted_value_handle(content_id)
        })
        .await
        {
            Ok(handle) => handle,
            Err(e) => return run.fail(AccessError::LedgerUnreachable(e)),
        };
        run.advance(DecryptionStage::HandleFetched);

        run.advance(DecryptionStage::OraclePending);
        let handles = [handle];
        let decryption = match timeout(
            self.oracle_timeout,
            self.oracle.public_decrypt(&handles, writer.contract_address()),
        )
        .await
        {
            Ok(Ok(decryption)) => decryption,
            Ok(Err(e)) => return run.fail(e),
            Err(_) => {
                return run.fail(OracleError::Unreachable(format!(
                    "public decryption timed out after {}ms",
                    self.oracle_timeout.as_millis()
                )))
            }
        };
        let Some(value) = decryption.value_for(&handle) else {
            return run.fail(OracleError::MissingHandle(handle));
        };
        run.advance(DecryptionStage::ProofReceived);
        repository.apply_local_decryption(content_id, value).await;

        run.advance(DecryptionStage::Submitting);
        if let Err(e) = writer
            .submit_verification(
                content_id,
                decryption.abi_encoded_clear_values,
                decryption.decryption_proof,
            )
            .await
        {
            return run.fail(e);
        }

        repository.mark_verified(content_id, value).await;
        info!(%content_id, "Decryption verified on-chain");
        if let Err(e) = repository.refresh().await {
            warn!(%content_id, error=%e, "Refresh after verification failed");
        }
        run.succeed(DecryptionStage::Verified, value)
    }
}
