//! Solana chain support for the mailer client.
//!
//! Address checks, program-derived addresses, the compact transaction wire
//! format and the mailer program's instructions and account layouts. Built
//! by hand on `ed25519-dalek`, `curve25519-dalek`, `sha2` and `bs58` rather
//! than `solana-sdk`.

pub mod address;
pub mod error;
pub mod mailer;
pub mod pda;
pub mod transaction;

pub use address::{address_to_bytes, bytes_to_address, is_solana_address};
pub use error::SolError;
pub use mailer::{Delegation, MailerProgram, MailerState, RecipientClaim};
pub use pda::{derive_associated_token_address, find_program_address};
pub use transaction::{
    compile_transaction, decode_compact_u16, encode_compact_u16, serialize_message,
    set_compute_unit_limit, set_compute_unit_price, sign_transaction, transaction_signature,
    CompiledInstruction, SolAccountMeta, SolInstruction, SolTransaction, SYSTEM_PROGRAM_ID,
};
