//! Structural wallet detection.
//!
//! Wallets arrive without a nominal type, so the chain family is inferred
//! from which capabilities a wallet exposes. The checks in
//! [`detect_wallet_type`] run in a fixed order and the first match wins:
//!
//! 1. public key + `signTransaction`, no address      -> Solana
//! 2. address + `request`, no public key              -> EVM
//! 3. any provider indicator (`currentProvider`, `_provider`, `provider`) -> EVM
//! 4. nested `adapter.name`                           -> Solana
//! 5. otherwise                                       -> [`ClientError::UnsupportedWallet`]

use serde_json::Value;

use crate::address::classify_address;
use crate::error::{ClientError, Result};
use crate::types::ChainFamily;

/// The capability surface a wallet exposes. Every check defaults to "not
/// exposed".
pub trait WalletProbe {
    fn exposes_public_key(&self) -> bool {
        false
    }

    fn exposes_sign_transaction(&self) -> bool {
        false
    }

    fn exposes_address(&self) -> bool {
        false
    }

    fn exposes_request(&self) -> bool {
        false
    }

    /// `currentProvider`, `_provider` or `provider`.
    fn exposes_provider(&self) -> bool {
        false
    }

    /// A wallet-adapter wrapper with `adapter.name`.
    fn exposes_adapter_name(&self) -> bool {
        false
    }
}

pub fn detect_wallet_type(wallet: &dyn WalletProbe) -> Result<ChainFamily> {
    let public_key = wallet.exposes_public_key();
    let address = wallet.exposes_address();

    if public_key && wallet.exposes_sign_transaction() && !address {
        return Ok(ChainFamily::Solana);
    }
    if address && wallet.exposes_request() && !public_key {
        return Ok(ChainFamily::Evm);
    }
    if wallet.exposes_provider() {
        return Ok(ChainFamily::Evm);
    }
    if wallet.exposes_adapter_name() {
        return Ok(ChainFamily::Solana);
    }

    Err(ClientError::UnsupportedWallet(
        "wallet matches neither the EVM nor the Solana fingerprint".into(),
    ))
}

/// Same as [`classify_address`]; `None` is a normal outcome.
pub fn detect_chain_from_address(address: &str) -> Option<ChainFamily> {
    classify_address(address)
}

/// A wallet described as loose JSON, as handed over by browser bridges or
/// FFI callers. A key counts as exposed when present and not `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletDescriptor(pub Value);

impl WalletDescriptor {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    fn has(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|v| !v.is_null())
    }
}

impl From<Value> for WalletDescriptor {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl WalletProbe for WalletDescriptor {
    fn exposes_public_key(&self) -> bool {
        self.has("publicKey")
    }

    fn exposes_sign_transaction(&self) -> bool {
        self.has("signTransaction")
    }

    fn exposes_address(&self) -> bool {
        self.has("address")
    }

    fn exposes_request(&self) -> bool {
        self.has("request")
    }

    fn exposes_provider(&self) -> bool {
        ["currentProvider", "_provider", "provider"]
            .iter()
            .any(|key| self.has(key))
    }

    fn exposes_adapter_name(&self) -> bool {
        self.0
            .get("adapter")
            .and_then(|adapter| adapter.get("name"))
            .is_some_and(|name| !name.is_null())
    }
}
