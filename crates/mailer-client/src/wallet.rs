//! Wallet capabilities and the sum type that carries them.
//!
//! A [`WalletHandle`] is either an EVM signer or a Solana signer, never
//! both. Adapters receive the handle and pull out the capability of their
//! own family; a handle of the other family is a [`ClientError::WalletMismatch`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chain_eth::transaction::{build_contract_call, sign_transaction, FeeParams};
use chain_sol::SolTransaction;
use serde_json::json;
use tracing::debug;
use zeroize::Zeroizing;

use crate::detect::{detect_wallet_type, WalletProbe};
use crate::error::{ClientError, ProviderError, Result};
use crate::rpc::{parse_quantity, EvmProvider};
use crate::types::ChainFamily;

/// A contract call for an EVM wallet to sign and submit. Unset gas fields
/// are filled by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmTransactionRequest {
    pub to: String,
    pub data: Vec<u8>,
    pub gas_limit: Option<u64>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

/// An EVM account that can sign and submit transactions.
#[async_trait]
pub trait EvmSigner: WalletProbe + Send + Sync {
    /// The account address, `0x`-prefixed.
    fn address(&self) -> String;

    /// Chain id the signer is bound to, if it signs locally. Injected
    /// wallets that follow the node's active chain return `None`.
    fn chain_id(&self) -> Option<u64> {
        None
    }

    /// Signs and submits `request`, returning the transaction hash.
    async fn send_transaction(
        &self,
        request: EvmTransactionRequest,
    ) -> std::result::Result<String, ProviderError>;
}

/// A Solana keypair holder that signs compiled transactions.
#[async_trait]
pub trait SolanaSigner: WalletProbe + Send + Sync {
    fn public_key(&self) -> [u8; 32];

    /// Returns the signed transaction in wire format.
    async fn sign_transaction(
        &self,
        tx: &SolTransaction,
    ) -> std::result::Result<Vec<u8>, ProviderError>;

    async fn sign_all_transactions(
        &self,
        txs: &[SolTransaction],
    ) -> std::result::Result<Vec<Vec<u8>>, ProviderError> {
        let mut signed = Vec::with_capacity(txs.len());
        for tx in txs {
            signed.push(self.sign_transaction(tx).await?);
        }
        Ok(signed)
    }
}

#[derive(Clone)]
pub enum WalletHandle {
    Evm(Arc<dyn EvmSigner>),
    Solana(Arc<dyn SolanaSigner>),
}

impl WalletHandle {
    pub fn evm(signer: impl EvmSigner + 'static) -> Self {
        WalletHandle::Evm(Arc::new(signer))
    }

    pub fn solana(signer: impl SolanaSigner + 'static) -> Self {
        WalletHandle::Solana(Arc::new(signer))
    }

    /// The family this handle was built as.
    pub fn chain_family(&self) -> ChainFamily {
        match self {
            WalletHandle::Evm(_) => ChainFamily::Evm,
            WalletHandle::Solana(_) => ChainFamily::Solana,
        }
    }

    /// Runs structural detection and checks it agrees with the variant.
    pub fn detect(&self) -> Result<ChainFamily> {
        let detected = detect_wallet_type(self)?;
        if detected != self.chain_family() {
            return Err(ClientError::WalletMismatch(format!(
                "{} wallet exposes a {} fingerprint",
                self.chain_family(),
                detected
            )));
        }
        Ok(detected)
    }

    /// Hex address on EVM, Base58 public key on Solana.
    pub fn address(&self) -> String {
        match self {
            WalletHandle::Evm(signer) => signer.address(),
            WalletHandle::Solana(signer) => chain_sol::bytes_to_address(&signer.public_key()),
        }
    }

    pub fn as_evm(&self) -> Result<&Arc<dyn EvmSigner>> {
        match self {
            WalletHandle::Evm(signer) => Ok(signer),
            WalletHandle::Solana(_) => Err(ClientError::WalletMismatch(
                "EVM operation requires an EVM wallet".into(),
            )),
        }
    }

    pub fn as_solana(&self) -> Result<&Arc<dyn SolanaSigner>> {
        match self {
            WalletHandle::Solana(signer) => Ok(signer),
            WalletHandle::Evm(_) => Err(ClientError::WalletMismatch(
                "Solana operation requires a Solana wallet".into(),
            )),
        }
    }
}

impl fmt::Debug for WalletHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletHandle")
            .field("chain", &self.chain_family())
            .field("address", &self.address())
            .finish()
    }
}

impl WalletProbe for WalletHandle {
    fn exposes_public_key(&self) -> bool {
        match self {
            WalletHandle::Evm(s) => s.exposes_public_key(),
            WalletHandle::Solana(s) => s.exposes_public_key(),
        }
    }

    fn exposes_sign_transaction(&self) -> bool {
        match self {
            WalletHandle::Evm(s) => s.exposes_sign_transaction(),
            WalletHandle::Solana(s) => s.exposes_sign_transaction(),
        }
    }

    fn exposes_address(&self) -> bool {
        match self {
            WalletHandle::Evm(s) => s.exposes_address(),
            WalletHandle::Solana(s) => s.exposes_address(),
        }
    }

    fn exposes_request(&self) -> bool {
        match self {
            WalletHandle::Evm(s) => s.exposes_request(),
            WalletHandle::Solana(s) => s.exposes_request(),
        }
    }

    fn exposes_provider(&self) -> bool {
        match self {
            WalletHandle::Evm(s) => s.exposes_provider(),
            WalletHandle::Solana(s) => s.exposes_provider(),
        }
    }

    fn exposes_adapter_name(&self) -> bool {
        match self {
            WalletHandle::Evm(s) => s.exposes_adapter_name(),
            WalletHandle::Solana(s) => s.exposes_adapter_name(),
        }
    }
}

// ---------------------------------------------------------------------------
// Local key wallets
// ---------------------------------------------------------------------------

/// An EVM account backed by a raw secp256k1 key and a node connection.
pub struct LocalEvmSigner {
    private_key: Zeroizing<[u8; 32]>,
    address: String,
    chain_id: u64,
    provider: Arc<dyn EvmProvider>,
}

impl LocalEvmSigner {
    pub fn new(private_key: &[u8; 32], chain_id: u64, provider: Arc<dyn EvmProvider>) -> Result<Self> {
        let address = chain_eth::address::private_key_to_address(private_key)?;
        Ok(Self {
            private_key: Zeroizing::new(*private_key),
            address,
            chain_id,
            provider,
        })
    }

    /// Accepts the key with or without a `0x` prefix.
    pub fn from_hex(private_key: &str, chain_id: u64, provider: Arc<dyn EvmProvider>) -> Result<Self> {
        let digits = private_key.strip_prefix("0x").unwrap_or(private_key);
        let bytes = Zeroizing::new(hex::decode(digits).map_err(|e| {
            ClientError::Validation(format!("private key is not hex: {e}"))
        })?);
        let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            ClientError::Validation(format!("private key must be 32 bytes, got {}", bytes.len()))
        })?;
        let key = Zeroizing::new(key);
        Self::new(&key, chain_id, provider)
    }

    async fn quantity(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> std::result::Result<u128, ProviderError> {
        parse_quantity(&self.provider.request(method, params).await?)
    }

    async fn fill_fees(
        &self,
        request: &EvmTransactionRequest,
    ) -> std::result::Result<FeeParams, ProviderError> {
        let gas_limit = match request.gas_limit {
            Some(gas) => gas,
            None => {
                let estimate = self
                    .quantity(
                        "eth_estimateGas",
                        json!([{
                            "from": self.address,
                            "to": request.to,
                            "data": format!("0x{}", hex::encode(&request.data)),
                        }]),
                    )
                    .await?;
                u64::try_from(estimate).map_err(|_| {
                    ProviderError::InvalidResponse(format!("gas estimate {estimate} overflows"))
                })?
            }
        };

        let max_priority_fee_per_gas = match request.max_priority_fee_per_gas {
            Some(fee) => fee,
            None => self.quantity("eth_maxPriorityFeePerGas", json!([])).await?,
        };

        let max_fee_per_gas = match request.max_fee_per_gas {
            Some(fee) => fee,
            None => {
                let block = self
                    .provider
                    .request("eth_getBlockByNumber", json!(["latest", false]))
                    .await?;
                let base_fee = block
                    .get("baseFeePerGas")
                    .map(parse_quantity)
                    .transpose()?
                    .ok_or_else(|| {
                        ProviderError::InvalidResponse("latest block has no base fee".into())
                    })?;
                base_fee
                    .saturating_mul(2)
                    .saturating_add(max_priority_fee_per_gas)
            }
        };

        Ok(FeeParams {
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
        })
    }
}

impl fmt::Debug for LocalEvmSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEvmSigner")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl WalletProbe for LocalEvmSigner {
    fn exposes_address(&self) -> bool {
        true
    }

    fn exposes_request(&self) -> bool {
        true
    }
}

#[async_trait]
impl EvmSigner for LocalEvmSigner {
    fn address(&self) -> String {
        self.address.clone()
    }

    fn chain_id(&self) -> Option<u64> {
        Some(self.chain_id)
    }

    async fn send_transaction(
        &self,
        request: EvmTransactionRequest,
    ) -> std::result::Result<String, ProviderError> {
        let nonce = self
            .quantity("eth_getTransactionCount", json!([self.address, "pending"]))
            .await?;
        let nonce = u64::try_from(nonce)
            .map_err(|_| ProviderError::InvalidResponse(format!("nonce {nonce} overflows")))?;
        let fees = self.fill_fees(&request).await?;

        let tx = build_contract_call(self.chain_id, nonce, &request.to, request.data, fees)
            .map_err(|e| ProviderError::Signer(e.to_string()))?;
        let signed = sign_transaction(&tx, &self.private_key)
            .map_err(|e| ProviderError::Signer(e.to_string()))?;
        debug!(tx = %signed.tx_hash, nonce, gas = fees.gas_limit, "signed evm transaction");

        let raw = format!("0x{}", hex::encode(&signed.raw_tx));
        let hash = self
            .provider
            .request("eth_sendRawTransaction", json!([raw]))
            .await?;
        hash.as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse("transaction hash is not a string".into()))
    }
}

/// A Solana keypair held in memory.
pub struct LocalSolanaSigner {
    seed: Zeroizing<[u8; 32]>,
    public_key: [u8; 32],
}

impl LocalSolanaSigner {
    pub fn new(seed: &[u8; 32]) -> Self {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(seed);
        Self {
            seed: Zeroizing::new(*seed),
            public_key: signing_key.verifying_key().to_bytes(),
        }
    }

    /// Accepts a 32-byte seed or a 64-byte `seed || public_key` keypair.
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self> {
        let seed: [u8; 32] = bytes
            .get(..32)
            .filter(|_| bytes.len() == 32 || bytes.len() == 64)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                ClientError::Validation(format!(
                    "keypair must be 32 or 64 bytes, got {}",
                    bytes.len()
                ))
            })?;
        let seed = Zeroizing::new(seed);
        let signer = Self::new(&seed);

        if bytes.len() == 64 && bytes[32..] != signer.public_key {
            return Err(ClientError::Validation(
                "keypair public key does not match its seed".into(),
            ));
        }
        Ok(signer)
    }
}

impl fmt::Debug for LocalSolanaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSolanaSigner")
            .field("public_key", &chain_sol::bytes_to_address(&self.public_key))
            .finish_non_exhaustive()
    }
}

impl WalletProbe for LocalSolanaSigner {
    fn exposes_public_key(&self) -> bool {
        true
    }

    fn exposes_sign_transaction(&self) -> bool {
        true
    }
}

#[async_trait]
impl SolanaSigner for LocalSolanaSigner {
    fn public_key(&self) -> [u8; 32] {
        self.public_key
    }

    async fn sign_transaction(
        &self,
        tx: &SolTransaction,
    ) -> std::result::Result<Vec<u8>, ProviderError> {
        chain_sol::sign_transaction(tx, &self.seed).map_err(|e| ProviderError::Signer(e.to_string()))
    }
}
