use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// The zero address, used by the mailer contract to mean "no delegate".
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Returns `true` iff `s` is `0x` followed by exactly 40 hex digits.
///
/// Format-only: the EIP-55 checksum is not consulted, so lowercase,
/// uppercase and mixed-case inputs are all accepted. Never panics.
pub fn is_evm_address(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(hex_part) => hex_part.len() == 40 && hex_part.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Parses a 0x-prefixed hex address string into a 20-byte array.
pub fn parse_address(address: &str) -> Result<[u8; 20], EthError> {
    if !is_evm_address(address) {
        return Err(EthError::InvalidAddress(format!(
            "expected 0x followed by 40 hex characters, got '{address}'"
        )));
    }

    let bytes = hex::decode(&address[2..])
        .map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;

    let mut addr = [0u8; 20];
    addr.copy_from_slice(&bytes);
    Ok(addr)
}

/// Derives an EIP-55 checksummed address from an uncompressed secp256k1
/// public key (65 bytes, starting with 0x04).
///
/// The derivation takes the Keccak-256 hash of the 64-byte public key (without
/// the 0x04 prefix) and uses the last 20 bytes as the address.
pub fn pubkey_to_eth_address(uncompressed_pubkey: &[u8; 65]) -> Result<String, EthError> {
    if uncompressed_pubkey[0] != 0x04 {
        return Err(EthError::InvalidPublicKey(
            "uncompressed key must start with 0x04".into(),
        ));
    }

    let hash = Keccak256::digest(&uncompressed_pubkey[1..]);

    let addr_hex = hex::encode(&hash[12..]);
    checksum_address(&format!("0x{addr_hex}"))
}

/// Derives the checksummed address that owns a raw secp256k1 private key.
pub fn private_key_to_address(private_key: &[u8; 32]) -> Result<String, EthError> {
    let secret = SecretKey::from_bytes(private_key.into())
        .map_err(|e| EthError::InvalidPrivateKey(e.to_string()))?;

    let uncompressed = secret.public_key().to_encoded_point(false);
    let mut key_65 = [0u8; 65];
    key_65.copy_from_slice(uncompressed.as_bytes());

    pubkey_to_eth_address(&key_65)
}

/// Applies EIP-55 mixed-case checksum encoding to an address.
///
/// Accepts any casing of a 0x-prefixed 40-hex-digit address and returns the
/// canonical checksummed form.
pub fn checksum_address(address: &str) -> Result<String, EthError> {
    if !is_evm_address(address) {
        return Err(EthError::InvalidAddress(format!(
            "expected 0x followed by 40 hex characters, got '{address}'"
        )));
    }

    let hex_part = address[2..].to_lowercase();

    // EIP-55: hash the lowercase hex address (without 0x).
    let hash = Keccak256::digest(hex_part.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");

    for (i, c) in hex_part.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    Ok(checksummed)
}
