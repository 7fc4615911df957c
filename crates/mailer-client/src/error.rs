use thiserror::Error;

use crate::types::ChainFamily;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the dispatch client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The wallet matched neither chain family's structural fingerprint.
    #[error("unsupported wallet: {0}")]
    UnsupportedWallet(String),

    #[error("wallet mismatch: {0}")]
    WalletMismatch(String),

    #[error("invalid {expected} address: '{address}'")]
    AddressFormat {
        expected: ChainFamily,
        address: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("{} configuration required", .0.label())]
    ConfigurationMissing(ChainFamily),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("{chain} operation failed: {message}")]
    ChainCall { chain: ChainFamily, message: String },

    #[error("{chain} operation failed: timeout after {ms}ms")]
    Timeout { chain: ChainFamily, ms: u64 },
}

impl ClientError {
    pub(crate) fn chain_call(chain: ChainFamily, message: impl std::fmt::Display) -> Self {
        ClientError::ChainCall {
            chain,
            message: message.to_string(),
        }
    }

    /// The chain the failing operation ran on, for chain-level failures.
    pub fn chain(&self) -> Option<ChainFamily> {
        match self {
            ClientError::ChainCall { chain, .. } | ClientError::Timeout { chain, .. } => {
                Some(*chain)
            }
            ClientError::ConfigurationMissing(chain) => Some(*chain),
            _ => None,
        }
    }
}

impl From<chain_eth::EthError> for ClientError {
    fn from(e: chain_eth::EthError) -> Self {
        ClientError::chain_call(ChainFamily::Evm, e)
    }
}

impl From<chain_sol::SolError> for ClientError {
    fn from(e: chain_sol::SolError) -> Self {
        ClientError::chain_call(ChainFamily::Solana, e)
    }
}

/// Failures of the RPC transport and wallet signing seams.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("signer error: {0}")]
    Signer(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::InvalidResponse(e.to_string())
    }
}
