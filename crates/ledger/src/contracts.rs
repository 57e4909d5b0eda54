// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::approval::{SigningAction, SigningApprover, SigningRequest};
use crate::error::{classify_read_error, classify_send_error, LedgerError};
use crate::retry::with_deadline;
use crate::types::{CreateRecordRequest, Handle, RecordFields, TxConfirmation};
use alloy::providers::fillers::BlobGasFiller;
use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, Bytes, U256},
    providers::fillers::{
        ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
    },
    providers::{Identity, Provider, ProviderBuilder, RootProvider},
    rpc::types::TransactionReceipt,
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

sol! {
    #[derive(Debug)]
    struct ContentData {
        string name;
        string description;
        address creator;
        uint256 timestamp;
        uint32 publicValue1;
        uint32 publicValue2;
        bool isVerified;
        uint32 decryptedValue;
    }

    #[derive(Debug)]
    #[sol(rpc)]
    contract ContentGate {
        function getAllContentIds() external view returns (string[] memory);
        function getContentData(string calldata contentId) external view returns (ContentData memory data);
        function getEncryptedValue(string calldata contentId) external view returns (bytes32);
        function isAvailable() external view returns (bool);
        function createContentData(
            string calldata contentId,
            string calldata name,
            bytes calldata encryptedValue,
            bytes calldata inputProof,
            uint32 publicValue1,
            uint32 publicValue2,
            string calldata description
        ) external;
        function verifyDecryption(
            string calldata contentId,
            bytes calldata abiEncodedClearValues,
            bytes calldata decryptionProof
        ) external;
    }
}

impl TryFrom<ContentData> for RecordFields {
    type Error = LedgerError;

    fn try_from(value: ContentData) -> Result<Self, Self::Error> {
        let created_at = u64::try_from(value.timestamp)
            .map_err(|_| LedgerError::Decode("timestamp larger than 64-bit".to_string()))?;
        Ok(RecordFields {
            title: value.name,
            description: value.description,
            creator: value.creator,
            created_at,
            public_value1: value.publicValue1,
            public_value2: value.publicValue2,
            is_verified: value.isVerified,
            decrypted_value: value.decryptedValue,
        })
    }
}

/// Read-only capability: safe to call any number of times
#[async_trait]
pub trait LedgerRead: Send + Sync {
    /// Address of the contract every call goes to
    fn contract_address(&self) -> Address;

    /// List every content id known to the contract
    async fn list_content_ids(&self) -> Result<Vec<String>, LedgerError>;

    /// Fetch the stored fields for one record
    async fn get_record(&self, content_id: &str) -> Result<RecordFields, LedgerError>;

    /// Fetch the handle of the encrypted access level
    async fn get_encrypted_value_handle(&self, content_id: &str) -> Result<Handle, LedgerError>;

    /// Ask the contract whether it accepts requests
    async fn is_available(&self) -> Result<bool, LedgerError>;
}

/// Signing capability. Every call returns only once the receipt is in and successful.
#[async_trait]
pub trait LedgerWrite: Send + Sync {
    fn contract_address(&self) -> Address;

    /// The identity transactions are signed with
    fn signer_address(&self) -> Address;

    async fn create_record(
        &self,
        request: CreateRecordRequest,
    ) -> Result<TxConfirmation, LedgerError>;

    async fn submit_verification(
        &self,
        content_id: &str,
        abi_encoded_clear_values: Bytes,
        decryption_proof: Bytes,
    ) -> Result<TxConfirmation, LedgerError>;
}

/// Generic type to represent different provider types
pub trait ProviderType: Send + Sync {
    type Provider: Provider + Send + Sync + 'static;
}

/// Marker type for read-only provider
#[derive(Clone)]
pub struct ReadOnly;
impl ProviderType for ReadOnly {
    type Provider = ReadOnlyProvider;
}

/// Marker type for read-write provider
#[derive(Clone)]
pub struct ReadWrite;
impl ProviderType for ReadWrite {
    type Provider = WriteProvider;
}

/// Type alias for read-only provider
pub type ReadOnlyProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
>;

/// Type alias for read-write provider
pub type WriteProvider = FillProvider<
    JoinFill<
        JoinFill<
            JoinFill<
                Identity,
                JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
            >,
            WalletFiller<EthereumWallet>,
        >,
        NonceFiller,
    >,
    RootProvider<Ethereum>,
    Ethereum,
>;

/// Signing state only the write contract carries
#[derive(Clone)]
struct SignerContext {
    signer: Address,
    approver: Arc<dyn SigningApprover>,
    /// One transaction in flight per signer
    tx_lock: Arc<Mutex<()>>,
    /// Bounds broadcast plus receipt, not the time spent on approval
    tx_timeout: Duration,
}

/// Handle to a deployed ContentGate contract
#[derive(Clone)]
pub struct ContentGateContract<T: ProviderType> {
    pub provider: Arc<T::Provider>,
    pub contract_address: Address,
    signer: Option<SignerContext>,
    _marker: PhantomData<T>,
}

pub type ContentGateReadContract = ContentGateContract<ReadOnly>;
pub type ContentGateWriteContract = ContentGateContract<ReadWrite>;

impl<T: ProviderType> ContentGateContract<T> {
    pub fn address(&self) -> &Address {
        &self.contract_address
    }
}

// Factory for creating contract instances
pub struct ContentGateContractFactory;

impl ContentGateContractFactory {
    /// Create a write-capable contract. Every transaction is put to `approver` first, and
    /// once approved must be mined within `tx_timeout`.
    pub async fn create_write(
        http_rpc_url: &str,
        contract_address: &str,
        private_key: &str,
        approver: Arc<dyn SigningApprover>,
        tx_timeout: Duration,
    ) -> Result<ContentGateWriteContract, LedgerError> {
        let contract_address = parse_address(contract_address)?;
        let signer = private_key
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| LedgerError::InvalidSigner(e.to_string()))?;
        let signer_address = signer.address();
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .with_cached_nonce_management()
            .connect(http_rpc_url)
            .await
            .map_err(|e| LedgerError::Unreachable(e.to_string()))?;

        info!(contract=%contract_address, signer=%signer_address, "Connected signing contract");
        Ok(ContentGateContract::<ReadWrite> {
            provider: Arc::new(provider),
            contract_address,
            signer: Some(SignerContext {
                signer: signer_address,
                approver,
                tx_lock: Arc::new(Mutex::new(())),
                tx_timeout,
            }),
            _marker: PhantomData,
        })
    }

    /// Create a read-only contract
    pub async fn create_read(
        http_rpc_url: &str,
        contract_address: &str,
    ) -> Result<ContentGateReadContract, LedgerError> {
        let contract_address = parse_address(contract_address)?;
        let provider = ProviderBuilder::new()
            .connect(http_rpc_url)
            .await
            .map_err(|e| LedgerError::Unreachable(e.to_string()))?;

        Ok(ContentGateContract::<ReadOnly> {
            provider: Arc::new(provider),
            contract_address,
            signer: None,
            _marker: PhantomData,
        })
    }
}

fn parse_address(value: &str) -> Result<Address, LedgerError> {
    value
        .parse()
        .map_err(|e| LedgerError::Decode(format!("Invalid contract address '{value}': {e}")))
}

// Reads work the same regardless of provider type
#[async_trait]
impl<T> LedgerRead for ContentGateContract<T>
where
    T: ProviderType,
{
    fn contract_address(&self) -> Address {
        self.contract_address
    }

    async fn list_content_ids(&self) -> Result<Vec<String>, LedgerError> {
        let contract = ContentGate::new(self.contract_address, &self.provider);
        let ids = contract
            .getAllContentIds()
            .call()
            .await
            .map_err(classify_read_error)?;
        Ok(ids)
    }

    async fn get_record(&self, content_id: &str) -> Result<RecordFields, LedgerError> {
        let contract = ContentGate::new(self.contract_address, &self.provider);
        let data = contract
            .getContentData(content_id.to_string())
            .call()
            .await
            .map_err(classify_read_error)?;
        data.try_into()
    }

    async fn get_encrypted_value_handle(&self, content_id: &str) -> Result<Handle, LedgerError> {
        let contract = ContentGate::new(self.contract_address, &self.provider);
        let handle = contract
            .getEncryptedValue(content_id.to_string())
            .call()
            .await
            .map_err(classify_read_error)?;
        Ok(handle)
    }

    async fn is_available(&self) -> Result<bool, LedgerError> {
        let contract = ContentGate::new(self.contract_address, &self.provider);
        let available = contract
            .isAvailable()
            .call()
            .await
            .map_err(classify_read_error)?;
        Ok(available)
    }
}

impl ContentGateContract<ReadWrite> {
    fn signer_context(&self) -> Result<&SignerContext, LedgerError> {
        self.signer
            .as_ref()
            .ok_or_else(|| LedgerError::InvalidSigner("no signer configured".to_string()))
    }

    async fn request_approval(
        &self,
        action: SigningAction,
        content_id: &str,
    ) -> Result<&SignerContext, LedgerError> {
        let ctx = self.signer_context()?;
        let request = SigningRequest {
            action,
            content_id: content_id.to_string(),
            contract: self.contract_address,
            signer: ctx.signer,
        };
        if !ctx.approver.approve(&request).await {
            warn!(%request, "Signing request declined");
            return Err(LedgerError::TransactionRejected(format!(
                "user rejected: {request}"
            )));
        }
        debug!(%request, "Signing request approved");
        Ok(ctx)
    }
}

fn confirm(receipt: TransactionReceipt) -> Result<TxConfirmation, LedgerError> {
    let tx_hash = receipt.transaction_hash;
    if !receipt.status() {
        return Err(LedgerError::TransactionReverted {
            tx_hash: Some(tx_hash),
            reason: "transaction mined with failed status".to_string(),
        });
    }
    Ok(TxConfirmation {
        tx_hash,
        block_number: receipt.block_number,
    })
}

#[async_trait]
impl LedgerWrite for ContentGateContract<ReadWrite> {
    fn contract_address(&self) -> Address {
        self.contract_address
    }

    fn signer_address(&self) -> Address {
        self.signer
            .as_ref()
            .map(|ctx| ctx.signer)
            .unwrap_or(Address::ZERO)
    }

    async fn create_record(
        &self,
        request: CreateRecordRequest,
    ) -> Result<TxConfirmation, LedgerError> {
        let ctx = self
            .request_approval(SigningAction::CreateRecord, &request.content_id)
            .await?;
        let _guard = ctx.tx_lock.lock().await;

        let contract = ContentGate::new(self.contract_address, &self.provider);
        let builder = contract.createContentData(
            request.content_id.clone(),
            request.title,
            request.encrypted_value,
            request.input_proof,
            request.public_value1,
            request.public_value2,
            request.description,
        );
        let content_id = request.content_id;
        with_deadline("createContentData", ctx.tx_timeout, async {
            let pending = builder.send().await.map_err(classify_send_error)?;
            debug!(tx=%pending.tx_hash(), %content_id, "createContentData sent");
            let receipt = pending.get_receipt().await.map_err(classify_send_error)?;
            confirm(receipt)
        })
        .await
    }

    async fn submit_verification(
        &self,
        content_id: &str,
        abi_encoded_clear_values: Bytes,
        decryption_proof: Bytes,
    ) -> Result<TxConfirmation, LedgerError> {
        let ctx = self
            .request_approval(SigningAction::SubmitVerification, content_id)
            .await?;
        let _guard = ctx.tx_lock.lock().await;

        let contract = ContentGate::new(self.contract_address, &self.provider);
        let builder = contract.verifyDecryption(
            content_id.to_string(),
            abi_encoded_clear_values,
            decryption_proof,
        );
        with_deadline("verifyDecryption", ctx.tx_timeout, async {
            let pending = builder.send().await.map_err(classify_send_error)?;
            debug!(tx=%pending.tx_hash(), %content_id, "verifyDecryption sent");
            let receipt = pending.get_receipt().await.map_err(classify_send_error)?;
            confirm(receipt)
        })
        .await
    }
}

/// Encode clear values the way `verifyDecryption` expects them: one static `uint256` word
/// per handle, in request order
pub fn abi_encode_clear_values(values: &[u64]) -> Bytes {
    let mut out = Vec::with_capacity(values.len() * 32);
    for value in values {
        out.extend_from_slice(&U256::from(*value).to_be_bytes::<32>());
    }
    Bytes::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::AutoApprove;

    // Well-known development key, never funded outside local chains
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const CLOSED_RPC: &str = "http://127.0.0.1:9";

    struct SlowApprover {
        delay: Duration,
        approve: bool,
    }

    #[async_trait]
    impl SigningApprover for SlowApprover {
        async fn approve(&self, _: &SigningRequest) -> bool {
            tokio::time::sleep(self.delay).await;
            self.approve
        }
    }

    async fn writer(approver: SlowApprover, tx_timeout: Duration) -> ContentGateWriteContract {
        ContentGateContractFactory::create_write(
            CLOSED_RPC,
            &Address::repeat_byte(0xc0).to_string(),
            DEV_KEY,
            Arc::new(approver),
            tx_timeout,
        )
        .await
        .unwrap()
    }

    fn request() -> CreateRecordRequest {
        CreateRecordRequest {
            content_id: "content-1".to_string(),
            title: "Deep dive".to_string(),
            description: String::new(),
            encrypted_value: Bytes::from(vec![1u8; 16]),
            input_proof: Bytes::from(vec![2u8; 4]),
            public_value1: 5,
            public_value2: 0,
        }
    }

    #[tokio::test]
    async fn test_invalid_private_key_is_rejected() {
        let result = ContentGateContractFactory::create_write(
            CLOSED_RPC,
            &Address::repeat_byte(0xc0).to_string(),
            "not-a-key",
            Arc::new(AutoApprove),
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(LedgerError::InvalidSigner(_))));
    }

    #[tokio::test]
    async fn test_declined_request_is_never_sent() {
        let contract = writer(
            SlowApprover {
                delay: Duration::ZERO,
                approve: false,
            },
            Duration::from_secs(1),
        )
        .await;
        let err = contract.create_record(request()).await.unwrap_err();
        assert!(matches!(err, LedgerError::TransactionRejected(_)));
    }

    #[tokio::test]
    async fn test_approval_time_does_not_count_against_tx_timeout() {
        let contract = writer(
            SlowApprover {
                delay: Duration::from_millis(300),
                approve: true,
            },
            Duration::from_millis(100),
        )
        .await;
        let err = contract
            .submit_verification("content-1", Bytes::new(), Bytes::new())
            .await
            .unwrap_err();
        // The closed port fails the broadcast itself, well inside the deadline
        assert!(matches!(err, LedgerError::Unreachable(_)));
        assert!(!err.to_string().contains("timed out"), "{err}");
    }

    #[test]
    fn test_content_data_conversion() {
        let data = ContentData {
            name: "Deep dive".to_string(),
            description: "members only".to_string(),
            creator: Address::repeat_byte(0x11),
            timestamp: U256::from(1_700_000_000u64),
            publicValue1: 5,
            publicValue2: 0,
            isVerified: true,
            decryptedValue: 5,
        };
        let fields = RecordFields::try_from(data).unwrap();
        assert_eq!(fields.title, "Deep dive");
        assert_eq!(fields.created_at, 1_700_000_000);
        assert!(fields.is_verified);
        assert_eq!(fields.decrypted_value, 5);
    }

    #[test]
    fn test_oversized_timestamp_is_a_decode_error() {
        let data = ContentData {
            name: String::new(),
            description: String::new(),
            creator: Address::ZERO,
            timestamp: U256::MAX,
            publicValue1: 0,
            publicValue2: 0,
            isVerified: false,
            decryptedValue: 0,
        };
        assert!(matches!(
            RecordFields::try_from(data),
            Err(LedgerError::Decode(_))
        ));
    }

    #[test]
    fn test_abi_encode_clear_values() {
        let encoded = abi_encode_clear_values(&[5, 256]);
        assert_eq!(encoded.len(), 64);
        assert_eq!(encoded[31], 5);
        assert_eq!(encoded[62], 1);
        assert_eq!(encoded[63], 0);
        assert!(encoded[..31].iter().all(|b| *b == 0));
    }
}
