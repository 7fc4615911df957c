//! Multi-chain client for the mailer protocol.
//!
//! Classifies wallets and addresses into EVM or Solana, validates inputs
//! locally, and dispatches send, delegation and claim operations to the
//! matching chain adapter. Results come back in one chain-agnostic shape.
//!
//! This crate provides:
//! - Address classification and structural wallet detection
//! - Local validation of messages, emails, domains and amounts
//! - `serde` configuration for both chains
//! - Wallet and RPC seams with local-key and JSON-RPC implementations
//! - The EVM and Solana adapters
//! - A stateless [`MailerClient`] and a wallet-bound [`WalletMailerClient`]

pub mod adapter;
pub mod address;
pub mod client;
pub mod config;
pub mod detect;
pub mod error;
pub mod rpc;
pub mod types;
pub mod validation;
pub mod wallet;

pub use adapter::{EvmMailer, MailerAdapter, SolanaMailer};
pub use address::{classify_address, is_evm_address, is_solana_address};
pub use client::{MailerClient, WalletMailerClient};
pub use config::{
    ClientOptions, EvmConfig, EvmContracts, MailerConfig, SolanaConfig, SolanaPrograms, TxOptions,
};
pub use detect::{detect_chain_from_address, detect_wallet_type, WalletDescriptor, WalletProbe};
pub use error::{ClientError, ProviderError, Result};
pub use rpc::{ChainConnector, EvmProvider, HttpConnector, JsonRpcClient, SolanaConnection};
pub use types::{ChainFamily, Claimable, Confirmation, OperationDetails, OperationResult};
pub use validation::{
    validate_address_for, validate_amount, validate_domain, validate_email, validate_mail_id,
    validate_message, AmountInput,
};
pub use wallet::{
    EvmSigner, EvmTransactionRequest, LocalEvmSigner, LocalSolanaSigner, SolanaSigner,
    WalletHandle,
};
