//! EVM chain support for the mailer client.
//!
//! This crate provides:
//! - Address format checks and EIP-55 checksums
//! - Function selectors and ABI encoding/decoding (static and dynamic params)
//! - Calldata builders and return decoders for the mailer contract
//! - EIP-1559 transaction building and signing

pub mod abi;
pub mod address;
pub mod error;
pub mod mailer;
pub mod transaction;

pub use address::{checksum_address, is_evm_address, parse_address};
pub use error::EthError;
