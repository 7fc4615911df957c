//! Address classification by shape alone.
//!
//! Everything here is total: inputs are never rejected with an error, only
//! classified or left unclassified.

use crate::types::ChainFamily;

/// `0x` followed by exactly 40 hex digits, any case. No checksum check.
pub fn is_evm_address(s: &str) -> bool {
    chain_eth::is_evm_address(s)
}

/// Valid Base58 decoding to exactly 32 bytes.
pub fn is_solana_address(s: &str) -> bool {
    chain_sol::is_solana_address(s)
}

/// Classifies an address string, or returns `None` when it fits neither
/// family.
pub fn classify_address(s: &str) -> Option<ChainFamily> {
    if is_evm_address(s) {
        Some(ChainFamily::Evm)
    } else if is_solana_address(s) {
        Some(ChainFamily::Solana)
    } else {
        None
    }
}

/// Whether `address` is shaped for `family`.
pub fn is_address_for(family: ChainFamily, address: &str) -> bool {
    match family {
        ChainFamily::Evm => is_evm_address(address),
        ChainFamily::Solana => is_solana_address(address),
    }
}
