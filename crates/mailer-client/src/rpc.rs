//! Chain connection seams and the JSON-RPC transport behind them.
//!
//! [`EvmProvider`] and [`SolanaConnection`] each need only `request`; the
//! typed calls the adapters use are default methods layered on top, so a
//! test double only has to answer raw JSON-RPC methods.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{EvmConfig, SolanaConfig};
use crate::error::{ProviderError, Result};

/// Read access to an EVM node.
#[async_trait]
pub trait EvmProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: &str, data: &[u8]) -> std::result::Result<Vec<u8>, ProviderError> {
        let params = json!([{ "to": to, "data": format!("0x{}", hex::encode(data)) }, "latest"]);
        let result = self.request("eth_call", params).await?;
        parse_hex_bytes(&result)
    }

    /// `None` while the transaction is still pending.
    async fn transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> std::result::Result<Option<EvmReceipt>, ProviderError> {
        let result = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }

        let block_number = result
            .get("blockNumber")
            .filter(|v| !v.is_null())
            .map(parse_quantity)
            .transpose()?;
        let Some(block_number) = block_number else {
            return Ok(None);
        };
        let status = result.get("status").map(parse_quantity).transpose()?;

        Ok(Some(EvmReceipt {
            block_number: u64::try_from(block_number).map_err(|_| {
                ProviderError::InvalidResponse(format!("block number {block_number} overflows"))
            })?,
            success: status != Some(0),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvmReceipt {
    pub block_number: u64,
    /// `false` when the transaction reverted.
    pub success: bool,
}

/// Access to a Solana cluster.
#[async_trait]
pub trait SolanaConnection: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError>;

    async fn latest_blockhash(&self) -> std::result::Result<[u8; 32], ProviderError> {
        let result = self
            .request("getLatestBlockhash", json!([{ "commitment": "confirmed" }]))
            .await?;
        let blockhash = result
            .pointer("/value/blockhash")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::InvalidResponse("missing blockhash".into()))?;
        chain_sol::address_to_bytes(blockhash)
            .map_err(|e| ProviderError::InvalidResponse(format!("blockhash: {e}")))
    }

    /// Submits a signed wire transaction and returns its signature.
    async fn send_transaction(&self, wire: &[u8]) -> std::result::Result<String, ProviderError> {
        let params = json!([
            BASE64.encode(wire),
            { "encoding": "base64", "preflightCommitment": "confirmed" }
        ]);
        let result = self.request("sendTransaction", params).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse("signature is not a string".into()))
    }

    /// Raw account data, or `None` if the account does not exist.
    async fn account_data(&self, address: &str) -> std::result::Result<Option<Vec<u8>>, ProviderError> {
        let params = json!([address, { "encoding": "base64", "commitment": "confirmed" }]);
        let result = self.request("getAccountInfo", params).await?;
        let account = match result.get("value") {
            Some(v) if !v.is_null() => v,
            _ => return Ok(None),
        };

        let encoded = account
            .pointer("/data/0")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::InvalidResponse("missing account data".into()))?;
        BASE64
            .decode(encoded)
            .map(Some)
            .map_err(|e| ProviderError::InvalidResponse(format!("account data: {e}")))
    }

    /// Lamport balance.
    async fn balance(&self, address: &str) -> std::result::Result<u64, ProviderError> {
        let result = self
            .request("getBalance", json!([address, { "commitment": "confirmed" }]))
            .await?;
        result
            .get("value")
            .and_then(Value::as_u64)
            .ok_or_else(|| ProviderError::InvalidResponse("missing balance".into()))
    }

    /// `None` while the cluster has not seen the signature.
    async fn signature_status(
        &self,
        signature: &str,
    ) -> std::result::Result<Option<SignatureStatus>, ProviderError> {
        let result = self
            .request("getSignatureStatuses", json!([[signature]]))
            .await?;
        match result.pointer("/value/0") {
            Some(status) if !status.is_null() => serde_json::from_value(status.clone())
                .map(Some)
                .map_err(ProviderError::from),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    pub slot: u64,
    #[serde(default)]
    pub confirmation_status: Option<String>,
    #[serde(default)]
    pub err: Option<Value>,
}

impl SignatureStatus {
    /// Reached `confirmed` or `finalized` commitment.
    pub fn is_confirmed(&self) -> bool {
        matches!(
            self.confirmation_status.as_deref(),
            Some("confirmed") | Some("finalized")
        )
    }
}

/// Parses a `0x`-prefixed JSON-RPC quantity.
pub fn parse_quantity(value: &Value) -> std::result::Result<u128, ProviderError> {
    let s = value
        .as_str()
        .ok_or_else(|| ProviderError::InvalidResponse(format!("expected hex quantity, got {value}")))?;
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| ProviderError::InvalidResponse(format!("quantity '{s}' lacks 0x")))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::InvalidResponse(format!("quantity '{s}': {e}")))
}

/// Parses `0x`-prefixed hex data.
pub fn parse_hex_bytes(value: &Value) -> std::result::Result<Vec<u8>, ProviderError> {
    let s = value
        .as_str()
        .ok_or_else(|| ProviderError::InvalidResponse(format!("expected hex data, got {value}")))?;
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| ProviderError::InvalidResponse(format!("hex data: {e}")))
}

// ---------------------------------------------------------------------------
// JSON-RPC over HTTP
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 client. Serves both EVM nodes and Solana clusters.
#[derive(Debug)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: Arc<str>,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<Arc<str>>) -> Self {
        Self::with_http_client(reqwest::Client::new(), url)
    }

    pub fn with_http_client(http: reqwest::Client, url: impl Into<Arc<str>>) -> Self {
        Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        debug!(url = %self.url, method, id, "json-rpc request");

        let response = self.http.post(&*self.url).json(&body).send().await?;

        // Some nodes pair a JSON-RPC error body with a 4xx/5xx status.
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            debug!(url = %self.url, method, id, %status, "json-rpc http error");
            return Err(match serde_json::from_str::<RpcResponse>(&text) {
                Ok(RpcResponse {
                    error: Some(err), ..
                }) => ProviderError::Rpc {
                    code: err.code,
                    message: err.message,
                },
                _ => ProviderError::Transport(format!("{status}: {text}")),
            });
        }

        let response: RpcResponse = response.json().await?;
        match response.error {
            Some(err) => Err(ProviderError::Rpc {
                code: err.code,
                message: err.message,
            }),
            None => Ok(response.result),
        }
    }
}

#[async_trait]
impl EvmProvider for JsonRpcClient {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError> {
        self.send(method, params).await
    }
}

#[async_trait]
impl SolanaConnection for JsonRpcClient {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError> {
        self.send(method, params).await
    }
}

/// Opens chain connections for a configuration. Swapped out in tests.
pub trait ChainConnector: Send + Sync {
    fn evm_provider(&self, config: &EvmConfig) -> Result<Arc<dyn EvmProvider>>;
    fn solana_connection(&self, config: &SolanaConfig) -> Result<Arc<dyn SolanaConnection>>;
}

/// Connects over HTTP JSON-RPC, sharing one connection pool.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    http: reqwest::Client,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl ChainConnector for HttpConnector {
    fn evm_provider(&self, config: &EvmConfig) -> Result<Arc<dyn EvmProvider>> {
        Ok(Arc::new(JsonRpcClient::with_http_client(
            self.http.clone(),
            config.rpc.as_str(),
        )))
    }

    fn solana_connection(&self, config: &SolanaConfig) -> Result<Arc<dyn SolanaConnection>> {
        Ok(Arc::new(JsonRpcClient::with_http_client(
            self.http.clone(),
            config.rpc.as_str(),
        )))
    }
}
