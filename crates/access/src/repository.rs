// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::AccessError;
use crate::notifier::StatusNotifier;
use crate::record::ContentRecord;
use crate::session::SharedSession;
use cg_ledger::{
    retry::{call_with_retry, ReadRetryPolicy},
    CreateRecordRequest, LedgerRead, LedgerWrite,
};
use cg_relayer::{EncryptionError, EncryptionGateway};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

type RefreshResult = Result<Vec<ContentRecord>, AccessError>;
type RefreshFuture = Shared<BoxFuture<'static, RefreshResult>>;

/// Plaintext metadata and the access level to protect for a new record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContent {
    pub title: String,
    pub description: String,
    pub access_level: u64,
}

/// In-memory projection of every on-chain record, rebuilt on refresh and patched in place
/// with decryption results in between
pub struct AccessRecordRepository {
    ledger: Arc<dyn LedgerRead>,
    session: SharedSession,
    retry: ReadRetryPolicy,
    in_flight: Mutex<Option<RefreshFuture>>,
}

impl AccessRecordRepository {
    pub fn new(
        ledger: Arc<dyn LedgerRead>,
        session: SharedSession,
        retry: ReadRetryPolicy,
    ) -> Self {
        Self {
            ledger,
            session,
            retry,
            in_flight: Mutex::new(None),
        }
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerRead> {
        &self.ledger
    }

    pub fn retry_policy(&self) -> &ReadRetryPolicy {
        &self.retry
    }

    /// Rebuild the snapshot from the ledger. A call made while another refresh is running
    /// joins it instead of reading the ledger again.
    pub async fn refresh(&self) -> RefreshResult {
        let refresh = {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match in_flight.as_ref() {
                Some(shared) => {
                    debug!("Joining in-flight refresh");
                    shared.clone()
                }
                None => {
                    let shared = run_refresh(
                        self.ledger.clone(),
                        self.session.clone(),
                        self.retry.clone(),
                    )
                    .boxed()
                    .shared();
                    *in_flight = Some(shared.clone());
                    shared
                }
            }
        };

        let result = refresh.clone().await;

        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if in_flight
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&refresh))
        {
            *in_flight = None;
        }
        result
    }

    /// Record an oracle result that has not been proven on-chain. Leaves verified records alone.
    pub async fn apply_local_decryption(&self, id: &str, value: u64) -> bool {
        let mut session = self.session.write().await;
        match session.record_mut(id) {
            Some(record) => record.apply_local_decryption(value),
            None => false,
        }
    }

    /// Record a confirmed on-chain verification
    pub async fn mark_verified(&self, id: &str, value: u64) -> bool {
        let mut session = self.session.write().await;
        match session.record_mut(id) {
            Some(record) => {
                record.mark_verified(value);
                true
            }
            None => false,
        }
    }

    /// Encrypt the access level, submit the record and refresh. A refresh failure after a
    /// confirmed submission is logged and does not fail the creation.
    pub async fn create_record(
        &self,
        content_id: &str,
        content: NewContent,
        encryption: &EncryptionGateway,
        writer: &dyn LedgerWrite,
        notifier: &StatusNotifier,
    ) -> Result<(), AccessError> {
        let access_level =
            u32::try_from(content.access_level).map_err(|_| EncryptionError::OutOfRange {
                value: content.access_level,
                min: *encryption.accepted().start(),
                max: *encryption.accepted().end(),
            })?;
        let submission = encryption
            .encrypt(
                writer.contract_address(),
                writer.signer_address(),
                content.access_level,
            )
            .await?;

        let request = CreateRecordRequest {
            content_id: content_id.to_string(),
            title: content.title,
            description: content.description,
            encrypted_value: submission.ciphertext,
            input_proof: submission.proof,
            public_value1: access_level,
            public_value2: 0,
        };
        notifier.pending("Waiting for confirmation...");
        let confirmation = writer.create_record(request).await?;
        info!(%content_id, tx=%confirmation.tx_hash, "Content record created");

        if let Err(e) = self.refresh().await {
            warn!(%content_id, error=%e, "Refresh after create failed");
        }
        Ok(())
    }

    pub async fn snapshot(&self) -> Vec<ContentRecord> {
        self.session.read().await.records().to_vec()
    }

    pub async fn get(&self, id: &str) -> Option<ContentRecord> {
        self.session
            .read()
            .await
            .records()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }
}

async fn run_refresh(
    ledger: Arc<dyn LedgerRead>,
    session: SharedSession,
    retry: ReadRetryPolicy,
) -> RefreshResult {
    let listed = call_with_retry("getAllContentIds", &retry, || ledger.list_content_ids())
        .await
        .map_err(|e| {
            warn!(error=%e, "Could not list content ids");
            AccessError::from(e)
        })?;

    let mut seen = HashSet::new();
    let ids: Vec<String> = listed
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();
    debug!(count = ids.len(), "Fetching content records");

    let fetched = join_all(ids.iter().map(|id| {
        let ledger = &ledger;
        let retry = &retry;
        async move {
            call_with_retry("getContentData", retry, || ledger.get_record(id))
                .await
                .map(|fields| ContentRecord::from_ledger(id.clone(), fields))
        }
    }))
    .await;

    let mut session = session.write().await;
    let previous: HashMap<&str, &ContentRecord> = session
        .records()
        .iter()
        .map(|r| (r.id.as_str(), r))
        .collect();

    let mut records = Vec::with_capacity(fetched.len());
    for (id, result) in ids.iter().zip(fetched) {
        match result {
            Ok(record) => records.push(record.reconcile(previous.get(id.as_str()).copied())),
            Err(e) => {
                warn!(content_id=%id, error=%e, "Skipping content record that failed to load")
            }
        }
    }
    drop(previous);

    info!(records = records.len(), "Content snapshot refreshed");
    session.records = records.clone();
    Ok(records)
}
