//! Deployment configuration and client options.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::{is_evm_address, is_solana_address};
use crate::error::{ClientError, Result};

/// Contract and program locations for both chains. At least one must be
/// present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm: Option<EvmConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solana: Option<SolanaConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmConfig {
    pub rpc: String,
    pub chain_id: u64,
    pub contracts: EvmContracts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmContracts {
    pub mailer: String,
    pub usdc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaConfig {
    pub rpc: String,
    /// Cluster name such as `mainnet-beta` or `devnet`. Informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    pub programs: SolanaPrograms,
    pub usdc_mint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaPrograms {
    pub mailer: String,
}

impl MailerConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MailerConfig = serde_json::from_str(json)
            .map_err(|e| ClientError::InvalidConfig(format!("malformed JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ClientError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.evm.is_none() && self.solana.is_none() {
            return Err(ClientError::InvalidConfig(
                "at least one of evm or solana must be configured".into(),
            ));
        }

        if let Some(evm) = &self.evm {
            check_rpc_url("evm.rpc", &evm.rpc)?;
            if evm.chain_id == 0 {
                return Err(ClientError::InvalidConfig("evm.chainId must be > 0".into()));
            }
            check_address("evm.contracts.mailer", &evm.contracts.mailer, is_evm_address)?;
            check_address("evm.contracts.usdc", &evm.contracts.usdc, is_evm_address)?;
        }

        if let Some(solana) = &self.solana {
            check_rpc_url("solana.rpc", &solana.rpc)?;
            check_address(
                "solana.programs.mailer",
                &solana.programs.mailer,
                is_solana_address,
            )?;
            check_address("solana.usdcMint", &solana.usdc_mint, is_solana_address)?;
        }

        Ok(())
    }
}

fn check_rpc_url(field: &str, rpc: &str) -> Result<()> {
    let url = reqwest::Url::parse(rpc)
        .map_err(|e| ClientError::InvalidConfig(format!("{field}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ClientError::InvalidConfig(format!(
            "{field}: unsupported scheme '{scheme}'"
        ))),
    }
}

fn check_address(field: &str, address: &str, shaped: fn(&str) -> bool) -> Result<()> {
    if shaped(address) {
        Ok(())
    } else {
        Err(ClientError::InvalidConfig(format!(
            "{field}: '{address}' is not a valid address"
        )))
    }
}

/// Execution knobs passed through to transactions unchanged. Unset values
/// are filled in by the wallet or the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    pub gas_limit: Option<u64>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub compute_unit_limit: Option<u32>,
    /// Micro-lamports per compute unit.
    pub compute_unit_price: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Bound on every single RPC round trip.
    pub rpc_timeout: Duration,
    /// Bound on waiting for a submitted transaction to confirm.
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    pub tx: TxOptions,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            rpc_timeout: Duration::from_secs(10),
            confirmation_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
            tx: TxOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "evm": {
            "rpc": "https://sepolia.example.org",
            "chainId": 11155111,
            "contracts": {
                "mailer": "0x000000000000000000000000000000000000dEaD",
                "usdc": "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"
            }
        },
        "solana": {
            "rpc": "https://api.devnet.solana.com",
            "cluster": "devnet",
            "programs": { "mailer": "9FLkBDqfnMr9A6eBzYRxiGR5Sjk9PSwPnTvW5eqDyvpy" },
            "usdcMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
        }
    }"#;

    #[test]
    fn parses_full_config() {
        let config = MailerConfig::from_json_str(FULL).unwrap();
        let evm = config.evm.unwrap();
        assert_eq!(evm.chain_id, 11155111);
        assert_eq!(evm.contracts.mailer, "0x000000000000000000000000000000000000dEaD");
        let solana = config.solana.unwrap();
        assert_eq!(solana.cluster.as_deref(), Some("devnet"));
        assert_eq!(solana.usdc_mint, "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
    }

    #[test]
    fn single_chain_is_enough() {
        let config = MailerConfig::from_json_str(
            r#"{ "solana": {
                "rpc": "http://127.0.0.1:8899",
                "programs": { "mailer": "9FLkBDqfnMr9A6eBzYRxiGR5Sjk9PSwPnTvW5eqDyvpy" },
                "usdcMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
            } }"#,
        )
        .unwrap();
        assert!(config.evm.is_none());
        assert!(config.solana.unwrap().cluster.is_none());
    }

    #[test]
    fn empty_config_is_invalid() {
        let err = MailerConfig::from_json_str("{}").unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn wrong_family_addresses_are_invalid() {
        let json = FULL.replace(
            "0x000000000000000000000000000000000000dEaD",
            "9FLkBDqfnMr9A6eBzYRxiGR5Sjk9PSwPnTvW5eqDyvpy",
        );
        let err = MailerConfig::from_json_str(&json).unwrap_err();
        assert!(err.to_string().contains("evm.contracts.mailer"));
    }

    #[test]
    fn rpc_must_be_http() {
        let json = FULL.replace("https://api.devnet.solana.com", "ws://api.devnet.solana.com");
        let err = MailerConfig::from_json_str(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));

        let json = FULL.replace("https://sepolia.example.org", "not a url");
        assert!(MailerConfig::from_json_str(&json).is_err());
    }

    #[test]
    fn malformed_json() {
        let err = MailerConfig::from_json_str("{").unwrap_err();
        assert!(err.to_string().starts_with("invalid config: malformed JSON"));
    }

    #[test]
    fn missing_file() {
        let err = MailerConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn serializes_camel_case_without_absent_chains() {
        let mut config = MailerConfig::from_json_str(FULL).unwrap();
        config.solana = None;
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["evm"]["chainId"], 11155111);
        assert!(value.get("solana").is_none());
    }

    #[test]
    fn default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.rpc_timeout, Duration::from_secs(10));
        assert_eq!(options.confirmation_timeout, Duration::from_secs(60));
        assert_eq!(options.tx, TxOptions::default());
    }
}
