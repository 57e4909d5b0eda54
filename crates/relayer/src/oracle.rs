// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::OracleError;
use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use cg_ledger::{abi_encode_clear_values, Handle};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Output of a public decryption: the clear values keyed by handle plus the material the
/// contract needs to verify them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionResult {
    pub clear_values: HashMap<Handle, u64>,
    pub abi_encoded_clear_values: Bytes,
    pub decryption_proof: Bytes,
}

impl DecryptionResult {
    pub fn value_for(&self, handle: &Handle) -> Option<u64> {
        self.clear_values.get(handle).copied()
    }
}

#[async_trait]
pub trait DecryptionOracle: Send + Sync {
    async fn public_decrypt(
        &self,
        handles: &[Handle],
        contract: Address,
    ) -> Result<DecryptionResult, OracleError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicDecryptRequest<'a> {
    handles: &'a [Handle],
    contract_address: Address,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClearValue {
    Number(u64),
    Text(String),
}

impl ClearValue {
    fn to_u64(&self) -> Result<u64, OracleError> {
        match self {
            ClearValue::Number(n) => Ok(*n),
            ClearValue::Text(text) => {
                let parsed: U256 = text
                    .parse()
                    .map_err(|e| OracleError::Malformed(format!("clear value '{text}': {e}")))?;
                u64::try_from(parsed)
                    .map_err(|_| OracleError::Malformed(format!("clear value '{text}' too large")))
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicDecryptResponse {
    clear_values: HashMap<String, ClearValue>,
    #[serde(default)]
    abi_encoded_clear_values: Option<Bytes>,
    decryption_proof: Bytes,
}

impl PublicDecryptResponse {
    fn into_result(self, handles: &[Handle]) -> Result<DecryptionResult, OracleError> {
        let mut clear_values = HashMap::with_capacity(self.clear_values.len());
        for (key, value) in &self.clear_values {
            let handle: Handle = key
                .parse()
                .map_err(|e| OracleError::Malformed(format!("handle '{key}': {e}")))?;
            clear_values.insert(handle, value.to_u64()?);
        }

        let mut ordered = Vec::with_capacity(handles.len());
        for handle in handles {
            let value = clear_values
                .get(handle)
                .copied()
                .ok_or(OracleError::MissingHandle(*handle))?;
            ordered.push(value);
        }

        let abi_encoded_clear_values = match self.abi_encoded_clear_values {
            Some(encoded) if !encoded.is_empty() => encoded,
            _ => abi_encode_clear_values(&ordered),
        };

        Ok(DecryptionResult {
            clear_values,
            abi_encoded_clear_values,
            decryption_proof: self.decryption_proof,
        })
    }
}

/// Talks to the relayer's `/v1/public-decrypt` endpoint
#[derive(Clone)]
pub struct HttpDecryptionOracle {
    client: Client,
    endpoint: Url,
}

impl HttpDecryptionOracle {
    pub fn new(relayer_url: &Url) -> Result<Self, OracleError> {
        let endpoint = relayer_url
            .join("v1/public-decrypt")
            .map_err(|e| OracleError::Unreachable(format!("Invalid relayer url: {e}")))?;
        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl DecryptionOracle for HttpDecryptionOracle {
    async fn public_decrypt(
        &self,
        handles: &[Handle],
        contract: Address,
    ) -> Result<DecryptionResult, OracleError> {
        let request = PublicDecryptRequest {
            handles,
            contract_address: contract,
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
            return Err(OracleError::ProofFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body: PublicDecryptResponse = response.json().await?;
        let result = body.into_result(handles)?;
        debug!(
            handles = handles.len(),
            proof_len = result.decryption_proof.len(),
            "Public decryption returned"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn oracle_with(
        body: serde_json::Value,
        status: u16,
    ) -> (MockServer, HttpDecryptionOracle) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/public-decrypt"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        let url = Url::parse(&server.uri()).unwrap();
        let oracle = HttpDecryptionOracle::new(&url).unwrap();
        (server, oracle)
    }

    #[tokio::test]
    async fn test_public_decrypt_with_relayer_encoding() {
        let handle = B256::repeat_byte(0xab);
        let (_server, oracle) = oracle_with(
            serde_json::json!({
                "clearValues": { handle.to_string(): 7 },
                "abiEncodedClearValues": "0x0007",
                "decryptionProof": "0x99"
            }),
            200,
        )
        .await;

        let result = oracle.public_decrypt(&[handle], Address::ZERO).await.unwrap();
        assert_eq!(result.value_for(&handle), Some(7));
        assert_eq!(result.abi_encoded_clear_values, Bytes::from(vec![0u8, 7]));
        assert_eq!(result.decryption_proof, Bytes::from(vec![0x99u8]));
    }

    #[tokio::test]
    async fn test_public_decrypt_encodes_locally_when_absent() {
        let handle = B256::repeat_byte(0x01);
        let (_server, oracle) = oracle_with(
            serde_json::json!({
                "clearValues": { handle.to_string(): "9" },
                "decryptionProof": "0x01"
            }),
            200,
        )
        .await;

        let result = oracle.public_decrypt(&[handle], Address::ZERO).await.unwrap();
        assert_eq!(result.value_for(&handle), Some(9));
        assert_eq!(result.abi_encoded_clear_values, abi_encode_clear_values(&[9]));
    }

    #[tokio::test]
    async fn test_public_decrypt_missing_handle() {
        let requested = B256::repeat_byte(0x02);
        let other = B256::repeat_byte(0x03);
        let (_server, oracle) = oracle_with(
            serde_json::json!({
                "clearValues": { other.to_string(): 1 },
                "decryptionProof": "0x01"
            }),
            200,
        )
        .await;

        let err = oracle
            .public_decrypt(&[requested], Address::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err, OracleError::MissingHandle(requested));
    }

    #[tokio::test]
    async fn test_public_decrypt_proof_failure() {
        let (_server, oracle) =
            oracle_with(serde_json::json!({ "error": "not decryptable" }), 500).await;

        let err = oracle
            .public_decrypt(&[B256::ZERO], Address::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::ProofFailed { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_relayer() {
        let url = Url::parse("http://127.0.0.1:9").unwrap();
        let oracle = HttpDecryptionOracle::new(&url).unwrap();
        let err = oracle
            .public_decrypt(&[B256::ZERO], Address::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Unreachable(_)));
    }
}
