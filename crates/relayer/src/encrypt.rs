// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::EncryptionError;
use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

/// Ciphertext plus its proof of well-formedness. Not `Clone`: it is moved into exactly one
/// create call.
#[derive(Debug, PartialEq, Eq)]
pub struct EncryptedSubmission {
    pub ciphertext: Bytes,
    pub proof: Bytes,
}

/// The remote half of input encryption
#[async_trait]
pub trait EncryptionService: Send + Sync {
    async fn encrypt(
        &self,
        target_contract: Address,
        recipient: Address,
        plaintext: u64,
    ) -> Result<EncryptedSubmission, EncryptionError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InputProofRequest {
    contract_address: Address,
    user_address: Address,
    value: u64,
}

#[derive(Deserialize)]
struct InputProofResponse {
    ciphertext: Bytes,
    proof: Bytes,
}

/// Talks to the relayer's `/v1/input-proof` endpoint
#[derive(Clone)]
pub struct HttpEncryptionService {
    client: Client,
    endpoint: Url,
}

impl HttpEncryptionService {
    pub fn new(relayer_url: &Url) -> Result<Self, EncryptionError> {
        let endpoint = relayer_url
            .join("v1/input-proof")
            .map_err(|e| EncryptionError::Unavailable(format!("Invalid relayer url: {e}")))?;
        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl EncryptionService for HttpEncryptionService {
    async fn encrypt(
        &self,
        target_contract: Address,
        recipient: Address,
        plaintext: u64,
    ) -> Result<EncryptedSubmission, EncryptionError> {
        let request = InputProofRequest {
            contract_address: target_contract,
            user_address: recipient,
            value: plaintext,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EncryptionError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: InputProofResponse = response.json().await?;
        if body.ciphertext.is_empty() || body.proof.is_empty() {
            return Err(EncryptionError::Malformed(
                "empty ciphertext or proof".to_string(),
            ));
        }
        debug!(
            contract=%target_contract,
            ciphertext_len = body.ciphertext.len(),
            proof_len = body.proof.len(),
            "Received encrypted input"
        );
        Ok(EncryptedSubmission {
            ciphertext: body.ciphertext,
            proof: body.proof,
        })
    }
}

/// Client-side front of the encryption service: validates the plaintext domain before any
/// network round trip and bounds the remote call.
#[derive(Clone)]
pub struct EncryptionGateway {
    service: Arc<dyn EncryptionService>,
    accepted: RangeInclusive<u64>,
    timeout: Duration,
}

impl EncryptionGateway {
    pub fn new(
        service: Arc<dyn EncryptionService>,
        accepted: RangeInclusive<u64>,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            accepted,
            timeout,
        }
    }

    pub fn accepted(&self) -> &RangeInclusive<u64> {
        &self.accepted
    }

    pub fn validate(&self, plaintext: u64) -> Result<(), EncryptionError> {
        if self.accepted.contains(&plaintext) {
            Ok(())
        } else {
            Err(EncryptionError::OutOfRange {
                value: plaintext,
                min: *self.accepted.start(),
                max: *self.accepted.end(),
            })
        }
    }

    /// Ciphertexts are randomized so two calls with the same input differ. Never compare
    /// them to detect duplicates.
    pub async fn encrypt(
        &self,
        target_contract: Address,
        recipient: Address,
        plaintext: u64,
    ) -> Result<EncryptedSubmission, EncryptionError> {
        self.validate(plaintext)?;
        info!(contract=%target_contract, "Encrypting access level");
        match timeout(
            self.timeout,
            self.service.encrypt(target_contract, recipient, plaintext),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(EncryptionError::Unavailable(format!(
                "encryption timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CountingService {
        calls: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl EncryptionService for CountingService {
        async fn encrypt(
            &self,
            _: Address,
            _: Address,
            plaintext: u64,
        ) -> Result<EncryptedSubmission, EncryptionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(EncryptedSubmission {
                ciphertext: Bytes::from(vec![plaintext as u8; 32]),
                proof: Bytes::from_static(b"proof"),
            })
        }
    }

    fn gateway(delay: Duration) -> (Arc<CountingService>, EncryptionGateway) {
        let service = Arc::new(CountingService {
            calls: AtomicUsize::new(0),
            delay,
        });
        let gateway = EncryptionGateway::new(service.clone(), 1..=10, Duration::from_secs(5));
        (service, gateway)
    }

    #[tokio::test]
    async fn test_out_of_range_fails_before_network() {
        let (service, gateway) = gateway(Duration::ZERO);

        for value in [0, 11, u64::MAX] {
            let err = gateway
                .encrypt(Address::ZERO, Address::ZERO, value)
                .await
                .unwrap_err();
            assert!(matches!(err, EncryptionError::OutOfRange { min: 1, max: 10, .. }));
        }
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);

        gateway
            .encrypt(Address::ZERO, Address::ZERO, 10)
            .await
            .unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_service_times_out() {
        let (_, gateway) = gateway(Duration::from_secs(60));
        let err = gateway
            .encrypt(Address::ZERO, Address::ZERO, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, EncryptionError::Unavailable(msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn test_http_service_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/input-proof"))
            .and(body_partial_json(serde_json::json!({ "value": 5 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ciphertext": "0x0102",
                "proof": "0xbeef"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let service = HttpEncryptionService::new(&url).unwrap();
        let submission = service
            .encrypt(Address::repeat_byte(1), Address::repeat_byte(2), 5)
            .await
            .unwrap();

        assert_eq!(submission.ciphertext, Bytes::from(vec![1u8, 2]));
        assert_eq!(submission.proof, Bytes::from(vec![0xbe, 0xef]));
    }

    #[tokio::test]
    async fn test_http_service_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/input-proof"))
            .respond_with(ResponseTemplate::new(422).set_body_string("value out of range"))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let service = HttpEncryptionService::new(&url).unwrap();
        let err = service
            .encrypt(Address::ZERO, Address::ZERO, 5)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            EncryptionError::Rejected {
                status: 422,
                body: "value out of range".to_string()
            }
        );
    }
}
