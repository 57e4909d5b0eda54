// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::ledger::InMemoryLedger;
use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use cg_ledger::{abi_encode_clear_values, Handle};
use cg_relayer::{
    DecryptionOracle, DecryptionResult, EncryptedSubmission, EncryptionError, EncryptionService,
    OracleError,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Produces randomized-looking ciphertexts that [`InMemoryLedger`] can read back
#[derive(Debug, Default)]
pub struct FakeEncryptionService {
    calls: AtomicUsize,
    nonce: AtomicU64,
    fail_next: AtomicUsize,
    delay_ms: AtomicU64,
}

impl FakeEncryptionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, times: usize) {
        self.fail_next.store(times, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl EncryptionService for FakeEncryptionService {
    async fn encrypt(
        &self,
        target_contract: Address,
        _recipient: Address,
        plaintext: u64,
    ) -> Result<EncryptedSubmission, EncryptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if take_one(&self.fail_next) {
            return Err(EncryptionError::Unavailable(
                "relayer returned 503".to_string(),
            ));
        }

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut ciphertext = nonce.to_be_bytes().to_vec();
        ciphertext.extend_from_slice(&plaintext.to_be_bytes());
        Ok(EncryptedSubmission {
            ciphertext: Bytes::from(ciphertext),
            proof: Bytes::copy_from_slice(target_contract.as_slice()),
        })
    }
}

/// Decrypts handles by asking the ledger fake for the plaintext behind them
pub struct FakeOracle {
    ledger: InMemoryLedger,
    calls: AtomicUsize,
    fail_next: AtomicUsize,
    drop_handles_next: AtomicUsize,
    delay_ms: AtomicU64,
}

impl FakeOracle {
    pub fn new(ledger: InMemoryLedger) -> Self {
        Self {
            ledger,
            calls: AtomicUsize::new(0),
            fail_next: AtomicUsize::new(0),
            drop_handles_next: AtomicUsize::new(0),
            delay_ms: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The next `times` calls fail as unreachable
    pub fn fail_next(&self, times: usize) {
        self.fail_next.store(times, Ordering::SeqCst);
    }

    /// The next `times` calls answer without the requested handles
    pub fn omit_handles_next(&self, times: usize) {
        self.drop_handles_next.store(times, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl DecryptionOracle for FakeOracle {
    async fn public_decrypt(
        &self,
        handles: &[Handle],
        contract: Address,
    ) -> Result<DecryptionResult, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if take_one(&self.fail_next) {
            return Err(OracleError::Unreachable("gateway timeout".to_string()));
        }
        if contract != self.ledger.contract() {
            return Err(OracleError::ProofFailed {
                status: 400,
                body: format!("{contract} is not allowed to decrypt"),
            });
        }
        if take_one(&self.drop_handles_next) {
            return Ok(DecryptionResult {
                clear_values: HashMap::new(),
                abi_encoded_clear_values: Bytes::new(),
                decryption_proof: Bytes::from_static(b"oracle-proof"),
            });
        }

        let mut clear_values = HashMap::new();
        let mut ordered = Vec::with_capacity(handles.len());
        for handle in handles {
            let value = self
                .ledger
                .plaintext_for(handle)
                .ok_or(OracleError::MissingHandle(*handle))?;
            clear_values.insert(*handle, value);
            ordered.push(value);
        }
        Ok(DecryptionResult {
            clear_values,
            abi_encoded_clear_values: abi_encode_clear_values(&ordered),
            decryption_proof: Bytes::from_static(b"oracle-proof"),
        })
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{decode_fake_ciphertext, handle_for};

    #[tokio::test]
    async fn test_ciphertexts_differ_for_same_plaintext() {
        let service = FakeEncryptionService::new();
        let a = service.encrypt(Address::ZERO, Address::ZERO, 4).await.unwrap();
        let b = service.encrypt(Address::ZERO, Address::ZERO, 4).await.unwrap();

        assert_ne!(a.ciphertext, b.ciphertext);
        assert_eq!(decode_fake_ciphertext(&a.ciphertext), Some(4));
        assert_eq!(decode_fake_ciphertext(&b.ciphertext), Some(4));
    }

    #[tokio::test]
    async fn test_oracle_fails_then_recovers() {
        let ledger = InMemoryLedger::new();
        ledger.seed_record("content-1", "One", 6);
        let oracle = FakeOracle::new(ledger.clone());
        oracle.fail_next(1);

        let handle = handle_for("content-1");
        assert!(oracle
            .public_decrypt(&[handle], ledger.contract())
            .await
            .is_err());
        let result = oracle
            .public_decrypt(&[handle], ledger.contract())
            .await
            .unwrap();
        assert_eq!(result.value_for(&handle), Some(6));
        assert_eq!(oracle.calls(), 2);
    }
}
