//! Minimal ABI encoding for EVM function calls.
//!
//! Just enough of the Solidity ABI to build mailer-contract calldata and
//! decode its view results without pulling in a full ABI parser. Static
//! parameters occupy one 32-byte head word; dynamic parameters (`string`)
//! put an offset in the head and their length-prefixed, right-padded bytes
//! in the tail.

use alloy_primitives::U256;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// A single ABI-encoded parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiParam {
    /// A 20-byte address, left-padded to 32 bytes.
    Address([u8; 20]),
    /// A 256-bit unsigned integer.
    Uint256(U256),
    /// A boolean, encoded as a uint256 of 0 or 1.
    Bool(bool),
    /// A dynamic UTF-8 string.
    String(String),
}

impl AbiParam {
    fn is_dynamic(&self) -> bool {
        matches!(self, AbiParam::String(_))
    }
}

/// Computes the 4-byte function selector: `keccak256(signature)[..4]`.
///
/// The signature must be canonical, e.g. `"delegateTo(address)"`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encodes a function call as `selector || head || tail`.
pub fn encode_function_call(selector: [u8; 4], params: &[AbiParam]) -> Vec<u8> {
    let encoded = encode_params(params);
    let mut data = Vec::with_capacity(4 + encoded.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&encoded);
    data
}

/// Encodes a parameter tuple (no selector).
pub fn encode_params(params: &[AbiParam]) -> Vec<u8> {
    let head_len = params.len() * 32;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for param in params {
        if param.is_dynamic() {
            let offset = U256::from(head_len + tail.len());
            head.extend_from_slice(&offset.to_be_bytes::<32>());
            tail.extend_from_slice(&encode_dynamic(param));
        } else {
            head.extend_from_slice(&encode_static(param));
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Encodes a static [`AbiParam`] as a single 32-byte word.
fn encode_static(param: &AbiParam) -> [u8; 32] {
    match param {
        AbiParam::Address(addr) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(addr);
            word
        }
        AbiParam::Uint256(value) => value.to_be_bytes::<32>(),
        AbiParam::Bool(flag) => {
            let mut word = [0u8; 32];
            word[31] = u8::from(*flag);
            word
        }
        AbiParam::String(_) => [0u8; 32],
    }
}

/// Encodes the tail section of a dynamic parameter: length word followed by
/// the data right-padded to a multiple of 32 bytes.
fn encode_dynamic(param: &AbiParam) -> Vec<u8> {
    let bytes = match param {
        AbiParam::String(s) => s.as_bytes(),
        _ => return Vec::new(),
    };

    let padded_len = bytes.len().div_ceil(32) * 32;
    let mut out = Vec::with_capacity(32 + padded_len);
    out.extend_from_slice(&U256::from(bytes.len()).to_be_bytes::<32>());
    out.extend_from_slice(bytes);
    out.resize(32 + padded_len, 0);
    out
}

/// Returns the `index`-th 32-byte word of ABI return data.
pub fn decode_word(data: &[u8], index: usize) -> Result<[u8; 32], EthError> {
    let start = index * 32;
    let end = start + 32;
    if data.len() < end {
        return Err(EthError::DecodingError(format!(
            "expected at least {end} bytes of return data, got {}",
            data.len()
        )));
    }

    let mut word = [0u8; 32];
    word.copy_from_slice(&data[start..end]);
    Ok(word)
}

/// Decodes the `index`-th word as a uint256.
pub fn decode_uint256(data: &[u8], index: usize) -> Result<U256, EthError> {
    decode_word(data, index).map(U256::from_be_bytes)
}

/// Decodes the `index`-th word as a uint256 that must fit in a `u128`.
///
/// Token amounts are carried as integers end to end; an amount too large
/// for `u128` is an error rather than a silent truncation.
pub fn decode_u128(data: &[u8], index: usize) -> Result<u128, EthError> {
    let value = decode_uint256(data, index)?;
    u128::try_from(value)
        .map_err(|_| EthError::DecodingError(format!("uint256 {value} does not fit in u128")))
}

/// Decodes the `index`-th word as an address (the low 20 bytes).
pub fn decode_address(data: &[u8], index: usize) -> Result<[u8; 20], EthError> {
    let word = decode_word(data, index)?;
    if word[..12].iter().any(|&b| b != 0) {
        return Err(EthError::DecodingError(
            "address word has non-zero padding".into(),
        ));
    }

    let mut addr = [0u8; 20];
    addr.copy_from_slice(&word[12..]);
    Ok(addr)
}

/// Decodes the `index`-th word as a bool.
pub fn decode_bool(data: &[u8], index: usize) -> Result<bool, EthError> {
    let word = decode_word(data, index)?;
    if word[..31].iter().any(|&b| b != 0) || word[31] > 1 {
        return Err(EthError::DecodingError("invalid bool word".into()));
    }
    Ok(word[31] == 1)
}
