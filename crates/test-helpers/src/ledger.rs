// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::approver::ScriptedApprover;
use crate::lock;
use alloy::primitives::{keccak256, Address, Bytes, U256};
use async_trait::async_trait;
use cg_ledger::{
    CreateRecordRequest, Handle, LedgerError, LedgerRead, LedgerWrite, RecordFields,
    SigningAction, SigningApprover, SigningRequest, TxConfirmation,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::trace;

const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

#[derive(Debug, Clone)]
struct StoredRecord {
    id: String,
    fields: RecordFields,
    handle: Handle,
    plaintext: u64,
}

#[derive(Debug, Default)]
struct LedgerState {
    records: Vec<StoredRecord>,
    available: bool,
    clock: u64,
    tx_count: u64,
    read_delay: Duration,
    unreachable: bool,
    fail_next_list: usize,
    failing_records: HashSet<String>,
    revert_next_verification: usize,
}

#[derive(Debug, Default)]
struct CallCounters {
    list: AtomicUsize,
    record: AtomicUsize,
    handle: AtomicUsize,
    availability: AtomicUsize,
    create: AtomicUsize,
    verify: AtomicUsize,
}

struct Inner {
    contract: Address,
    signer: Address,
    approver: Arc<dyn SigningApprover>,
    state: Mutex<LedgerState>,
    counters: CallCounters,
}

/// A ContentGate contract that lives in memory. Implements both ledger capabilities and
/// shares its plaintexts with [`crate::FakeOracle`].
#[derive(Clone)]
pub struct InMemoryLedger {
    inner: Arc<Inner>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_approver(Arc::new(ScriptedApprover::approving()))
    }

    pub fn with_approver(approver: Arc<dyn SigningApprover>) -> Self {
        Self {
            inner: Arc::new(Inner {
                contract: Address::repeat_byte(0xc0),
                signer: Address::repeat_byte(0x5e),
                approver,
                state: Mutex::new(LedgerState {
                    available: true,
                    clock: GENESIS_TIMESTAMP,
                    ..Default::default()
                }),
                counters: CallCounters::default(),
            }),
        }
    }

    pub fn contract(&self) -> Address {
        self.inner.contract
    }

    pub fn signer(&self) -> Address {
        self.inner.signer
    }

    fn state(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        lock(&self.inner.state)
    }

    /// Insert an unverified record as if another client had created it
    pub fn seed_record(&self, id: &str, title: &str, access_level: u64) {
        let mut state = self.state();
        let created_at = state.tick();
        state.records.push(StoredRecord {
            id: id.to_string(),
            fields: RecordFields {
                title: title.to_string(),
                description: format!("{title} description"),
                creator: Address::repeat_byte(0xaa),
                created_at,
                public_value1: access_level as u32,
                public_value2: 0,
                is_verified: false,
                decrypted_value: 0,
            },
            handle: handle_for(id),
            plaintext: access_level,
        });
    }

    /// Insert a record whose verification is already on-chain
    pub fn seed_verified(&self, id: &str, title: &str, access_level: u64) {
        self.seed_record(id, title, access_level);
        self.force_verify(id, access_level);
    }

    /// Mark a record verified out-of-band, as a concurrent client would
    pub fn force_verify(&self, id: &str, value: u64) {
        let mut state = self.state();
        if let Some(record) = state.records.iter_mut().find(|r| r.id == id) {
            record.fields.is_verified = true;
            record.fields.decrypted_value = value as u32;
        }
    }

    /// Serve the record as unverified again, as a lagging node would
    pub fn serve_stale(&self, id: &str) {
        let mut state = self.state();
        if let Some(record) = state.records.iter_mut().find(|r| r.id == id) {
            record.fields.is_verified = false;
            record.fields.decrypted_value = 0;
        }
    }

    pub fn set_available(&self, available: bool) {
        self.state().available = available;
    }

    /// Every read fails as unreachable while set
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }

    /// Delay every `list_content_ids` call
    pub fn set_read_delay(&self, delay: Duration) {
        self.state().read_delay = delay;
    }

    pub fn fail_next_list(&self, times: usize) {
        self.state().fail_next_list = times;
    }

    /// `get_record` for this id fails as undecodable until cleared
    pub fn fail_record(&self, id: &str) {
        self.state().failing_records.insert(id.to_string());
    }

    pub fn clear_record_failure(&self, id: &str) {
        self.state().failing_records.remove(id);
    }

    pub fn revert_next_verification(&self, times: usize) {
        self.state().revert_next_verification = times;
    }

    pub fn record(&self, id: &str) -> Option<RecordFields> {
        self.state()
            .records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.fields.clone())
    }

    pub fn record_count(&self) -> usize {
        self.state().records.len()
    }

    /// Plaintext behind a handle. Only the oracle is supposed to know this.
    pub fn plaintext_for(&self, handle: &Handle) -> Option<u64> {
        self.state()
            .records
            .iter()
            .find(|r| r.handle == *handle)
            .map(|r| r.plaintext)
    }

    pub fn list_calls(&self) -> usize {
        self.inner.counters.list.load(Ordering::SeqCst)
    }

    pub fn record_calls(&self) -> usize {
        self.inner.counters.record.load(Ordering::SeqCst)
    }

    pub fn handle_calls(&self) -> usize {
        self.inner.counters.handle.load(Ordering::SeqCst)
    }

    pub fn availability_calls(&self) -> usize {
        self.inner.counters.availability.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.inner.counters.create.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.inner.counters.verify.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), LedgerError> {
        if self.state().unreachable {
            return Err(LedgerError::Unreachable("connection refused".to_string()));
        }
        Ok(())
    }

    async fn approve(&self, action: SigningAction, content_id: &str) -> Result<(), LedgerError> {
        let request = SigningRequest {
            action,
            content_id: content_id.to_string(),
            contract: self.inner.contract,
            signer: self.inner.signer,
        };
        if self.inner.approver.approve(&request).await {
            Ok(())
        } else {
            Err(LedgerError::TransactionRejected(format!(
                "user rejected: {request}"
            )))
        }
    }
}

impl LedgerState {
    fn tick(&mut self) -> u64 {
        self.clock += 12;
        self.clock
    }

    fn confirm(&mut self) -> TxConfirmation {
        self.tx_count += 1;
        self.tick();
        TxConfirmation {
            tx_hash: keccak256(self.tx_count.to_be_bytes()),
            block_number: Some(self.tx_count),
        }
    }
}

pub fn handle_for(content_id: &str) -> Handle {
    keccak256(content_id.as_bytes())
}

#[async_trait]
impl LedgerRead for InMemoryLedger {
    fn contract_address(&self) -> Address {
        self.inner.contract
    }

    async fn list_content_ids(&self) -> Result<Vec<String>, LedgerError> {
        self.inner.counters.list.fetch_add(1, Ordering::SeqCst);
        let delay = self.state().read_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.check_reachable()?;
        let mut state = self.state();
        if state.fail_next_list > 0 {
            state.fail_next_list -= 1;
            return Err(LedgerError::Unreachable("connection reset".to_string()));
        }
        Ok(state.records.iter().map(|r| r.id.clone()).collect())
    }

    async fn get_record(&self, content_id: &str) -> Result<RecordFields, LedgerError> {
        self.inner.counters.record.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        let state = self.state();
        if state.failing_records.contains(content_id) {
            return Err(LedgerError::Decode(format!(
                "could not decode ContentData for {content_id}"
            )));
        }
        state
            .records
            .iter()
            .find(|r| r.id == content_id)
            .map(|r| r.fields.clone())
            .ok_or_else(|| LedgerError::CallReverted(format!("unknown content {content_id}")))
    }

    async fn get_encrypted_value_handle(&self, content_id: &str) -> Result<Handle, LedgerError> {
        self.inner.counters.handle.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        self.state()
            .records
            .iter()
            .find(|r| r.id == content_id)
            .map(|r| r.handle)
            .ok_or_else(|| LedgerError::CallReverted(format!("unknown content {content_id}")))
    }

    async fn is_available(&self) -> Result<bool, LedgerError> {
        self.inner.counters.availability.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        Ok(self.state().available)
    }
}

#[async_trait]
impl LedgerWrite for InMemoryLedger {
    fn contract_address(&self) -> Address {
        self.inner.contract
    }

    fn signer_address(&self) -> Address {
        self.inner.signer
    }

    async fn create_record(
        &self,
        request: CreateRecordRequest,
    ) -> Result<TxConfirmation, LedgerError> {
        self.inner.counters.create.fetch_add(1, Ordering::SeqCst);
        self.approve(SigningAction::CreateRecord, &request.content_id)
            .await?;

        let mut state = self.state();
        if state.records.iter().any(|r| r.id == request.content_id) {
            return Err(LedgerError::TransactionReverted {
                tx_hash: None,
                reason: format!("execution reverted: {} already exists", request.content_id),
            });
        }
        if request.input_proof.is_empty() {
            return Err(LedgerError::TransactionReverted {
                tx_hash: None,
                reason: "execution reverted: invalid input proof".to_string(),
            });
        }
        let plaintext = decode_fake_ciphertext(&request.encrypted_value).ok_or_else(|| {
            LedgerError::TransactionReverted {
                tx_hash: None,
                reason: "execution reverted: malformed ciphertext".to_string(),
            }
        })?;

        let confirmation = state.confirm();
        let created_at = state.clock;
        trace!(content_id=%request.content_id, "InMemoryLedger: record created");
        state.records.push(StoredRecord {
            handle: handle_for(&request.content_id),
            id: request.content_id,
            fields: RecordFields {
                title: request.title,
                description: request.description,
                creator: self.inner.signer,
                created_at,
                public_value1: request.public_value1,
                public_value2: request.public_value2,
                is_verified: false,
                decrypted_value: 0,
            },
            plaintext,
        });
        Ok(confirmation)
    }

    async fn submit_verification(
        &self,
        content_id: &str,
        abi_encoded_clear_values: Bytes,
        decryption_proof: Bytes,
    ) -> Result<TxConfirmation, LedgerError> {
        self.inner.counters.verify.fetch_add(1, Ordering::SeqCst);
        self.approve(SigningAction::SubmitVerification, content_id)
            .await?;

        let mut state = self.state();
        if state.revert_next_verification > 0 {
            state.revert_next_verification -= 1;
            return Err(LedgerError::TransactionReverted {
                tx_hash: Some(keccak256(content_id.as_bytes())),
                reason: "transaction mined with failed status".to_string(),
            });
        }
        if decryption_proof.is_empty() {
            return Err(LedgerError::TransactionReverted {
                tx_hash: None,
                reason: "execution reverted: invalid decryption proof".to_string(),
            });
        }
        let value = first_word(&abi_encoded_clear_values).ok_or_else(|| {
            LedgerError::TransactionReverted {
                tx_hash: None,
                reason: "execution reverted: malformed clear values".to_string(),
            }
        })?;

        let Some(index) = state.records.iter().position(|r| r.id == content_id) else {
            return Err(LedgerError::TransactionReverted {
                tx_hash: None,
                reason: format!("execution reverted: unknown content {content_id}"),
            });
        };
        if state.records[index].fields.is_verified {
            return Err(LedgerError::TransactionReverted {
                tx_hash: None,
                reason: "execution reverted: content already verified".to_string(),
            });
        }
        if state.records[index].plaintext != value {
            return Err(LedgerError::TransactionReverted {
                tx_hash: None,
                reason: "execution reverted: proof does not match clear value".to_string(),
            });
        }
        let confirmation = state.confirm();
        let record = &mut state.records[index];
        record.fields.is_verified = true;
        record.fields.decrypted_value = value as u32;
        Ok(confirmation)
    }
}

/// Fake ciphertexts carry the plaintext in their last eight bytes
pub fn decode_fake_ciphertext(ciphertext: &[u8]) -> Option<u64> {
    let tail: [u8; 8] = ciphertext.get(ciphertext.len().checked_sub(8)?..)?.try_into().ok()?;
    Some(u64::from_be_bytes(tail))
}

fn first_word(encoded: &[u8]) -> Option<u64> {
    let word: [u8; 32] = encoded.get(..32)?.try_into().ok()?;
    u64::try_from(U256::from_be_bytes(word)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_records_are_listed_in_order() {
        let ledger = InMemoryLedger::new();
        ledger.seed_record("content-1", "One", 3);
        ledger.seed_verified("content-2", "Two", 7);

        let ids = ledger.list_content_ids().await.unwrap();
        assert_eq!(ids, vec!["content-1", "content-2"]);

        let verified = ledger.get_record("content-2").await.unwrap();
        assert!(verified.is_verified);
        assert_eq!(verified.decrypted_value, 7);
        assert_eq!(ledger.list_calls(), 1);
        assert_eq!(ledger.record_calls(), 1);
    }

    #[tokio::test]
    async fn test_declined_approval_changes_nothing() {
        let ledger = InMemoryLedger::with_approver(Arc::new(ScriptedApprover::declining()));
        ledger.seed_record("content-1", "One", 3);

        let err = ledger
            .submit_verification(
                "content-1",
                cg_ledger::abi_encode_clear_values(&[3]),
                Bytes::from_static(b"proof"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::TransactionRejected(_)));
        assert!(!ledger.record("content-1").unwrap().is_verified);
    }

    #[tokio::test]
    async fn test_second_verification_reverts() {
        let ledger = InMemoryLedger::new();
        ledger.seed_verified("content-1", "One", 3);

        let err = ledger
            .submit_verification(
                "content-1",
                cg_ledger::abi_encode_clear_values(&[3]),
                Bytes::from_static(b"proof"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::TransactionReverted { .. }));
        assert_eq!(ledger.verify_calls(), 1);
    }

    #[test]
    fn test_decode_fake_ciphertext() {
        let mut ciphertext = vec![0xffu8; 8];
        ciphertext.extend_from_slice(&5u64.to_be_bytes());
        assert_eq!(decode_fake_ciphertext(&ciphertext), Some(5));
        assert_eq!(decode_fake_ciphertext(&[1, 2, 3]), None);
    }
}
