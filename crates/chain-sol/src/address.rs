//! Solana address encoding and validation.
//!
//! A Solana address is the Base58 encoding (Bitcoin alphabet) of a raw
//! 32-byte Ed25519 public key or program-derived address.

use crate::error::SolError;

/// Returns `true` iff `s` is valid Base58 that decodes to exactly 32 bytes.
///
/// The Base58 alphabet has no `0`, so EVM-style `0x…` strings never pass.
/// Never panics.
pub fn is_solana_address(s: &str) -> bool {
    address_to_bytes(s).is_ok()
}

/// Decode a Solana address string to its 32-byte representation.
pub fn address_to_bytes(address: &str) -> Result<[u8; 32], SolError> {
    // Base58 of 32 bytes is at most 44 characters; skip decoding anything longer.
    if address.is_empty() || address.len() > 44 {
        return Err(SolError::InvalidAddress(format!(
            "expected 1-44 base58 characters, got {}",
            address.len()
        )));
    }

    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })
}

/// Encode 32 bytes as a Solana address (Base58 string).
pub fn bytes_to_address(bytes: &[u8; 32]) -> String {
    bs58::encode(bytes).into_string()
}
