//! Calldata builders and return decoders for the mailer contract.
//!
//! Every state-changing entry point has an `encode_*` builder and every
//! view has an `encode_*` builder plus a `decode_*` for its return data.

use alloy_primitives::U256;

use crate::abi::{self, AbiParam};
use crate::address::{checksum_address, parse_address};
use crate::error::EthError;

pub const SEND: &str = "send(string,string,bool,bool)";
pub const SEND_PREPARED: &str = "sendPrepared(string,bool,bool)";
pub const SEND_TO_EMAIL_ADDRESS: &str = "sendToEmailAddress(string,string,string)";
pub const DELEGATE_TO: &str = "delegateTo(address)";
pub const REJECT_DELEGATION: &str = "rejectDelegation(address)";
pub const CLAIM_RECIPIENT_SHARE: &str = "claimRecipientShare()";
pub const CLAIM_OWNER_SHARE: &str = "claimOwnerShare()";
pub const SEND_FEE: &str = "sendFee()";
pub const DELEGATION_FEE: &str = "delegationFee()";
pub const DELEGATIONS: &str = "delegations(address)";
pub const GET_RECIPIENT_CLAIMABLE: &str = "getRecipientClaimable(address)";
pub const GET_OWNER_CLAIMABLE: &str = "getOwnerClaimable()";

/// Claimable revenue for one recipient as reported by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipientClaimable {
    pub amount: u128,
    /// Unix timestamp after which the share can no longer be claimed.
    pub expires_at: u64,
    pub is_expired: bool,
}

/// `send(subject, body, revenueShareToReceiver, resolveSenderToName)`.
pub fn encode_send(
    subject: &str,
    body: &str,
    revenue_share_to_receiver: bool,
    resolve_sender_to_name: bool,
) -> Vec<u8> {
    abi::encode_function_call(
        abi::selector(SEND),
        &[
            AbiParam::String(subject.to_string()),
            AbiParam::String(body.to_string()),
            AbiParam::Bool(revenue_share_to_receiver),
            AbiParam::Bool(resolve_sender_to_name),
        ],
    )
}

/// `sendPrepared(mailId, revenueShareToReceiver, resolveSenderToName)`.
pub fn encode_send_prepared(
    mail_id: &str,
    revenue_share_to_receiver: bool,
    resolve_sender_to_name: bool,
) -> Vec<u8> {
    abi::encode_function_call(
        abi::selector(SEND_PREPARED),
        &[
            AbiParam::String(mail_id.to_string()),
            AbiParam::Bool(revenue_share_to_receiver),
            AbiParam::Bool(resolve_sender_to_name),
        ],
    )
}

/// `sendToEmailAddress(email, subject, body)`.
pub fn encode_send_to_email(email: &str, subject: &str, body: &str) -> Vec<u8> {
    abi::encode_function_call(
        abi::selector(SEND_TO_EMAIL_ADDRESS),
        &[
            AbiParam::String(email.to_string()),
            AbiParam::String(subject.to_string()),
            AbiParam::String(body.to_string()),
        ],
    )
}

/// `delegateTo(delegate)`. The zero address clears the delegation.
pub fn encode_delegate_to(delegate: &str) -> Result<Vec<u8>, EthError> {
    let addr = parse_address(delegate)?;
    Ok(abi::encode_function_call(
        abi::selector(DELEGATE_TO),
        &[AbiParam::Address(addr)],
    ))
}

/// `rejectDelegation(delegatingAddress)`.
pub fn encode_reject_delegation(delegating_address: &str) -> Result<Vec<u8>, EthError> {
    let addr = parse_address(delegating_address)?;
    Ok(abi::encode_function_call(
        abi::selector(REJECT_DELEGATION),
        &[AbiParam::Address(addr)],
    ))
}

pub fn encode_claim_recipient_share() -> Vec<u8> {
    abi::encode_function_call(abi::selector(CLAIM_RECIPIENT_SHARE), &[])
}

pub fn encode_claim_owner_share() -> Vec<u8> {
    abi::encode_function_call(abi::selector(CLAIM_OWNER_SHARE), &[])
}

pub fn encode_send_fee() -> Vec<u8> {
    abi::encode_function_call(abi::selector(SEND_FEE), &[])
}

pub fn encode_delegation_fee() -> Vec<u8> {
    abi::encode_function_call(abi::selector(DELEGATION_FEE), &[])
}

pub fn encode_get_owner_claimable() -> Vec<u8> {
    abi::encode_function_call(abi::selector(GET_OWNER_CLAIMABLE), &[])
}

/// `delegations(delegator)`.
pub fn encode_delegations(delegator: &str) -> Result<Vec<u8>, EthError> {
    let addr = parse_address(delegator)?;
    Ok(abi::encode_function_call(
        abi::selector(DELEGATIONS),
        &[AbiParam::Address(addr)],
    ))
}

/// `getRecipientClaimable(recipient)`.
pub fn encode_get_recipient_claimable(recipient: &str) -> Result<Vec<u8>, EthError> {
    let addr = parse_address(recipient)?;
    Ok(abi::encode_function_call(
        abi::selector(GET_RECIPIENT_CLAIMABLE),
        &[AbiParam::Address(addr)],
    ))
}

/// Decodes a single uint256 token amount (`sendFee`, `delegationFee`,
/// `getOwnerClaimable`).
pub fn decode_amount(data: &[u8]) -> Result<u128, EthError> {
    abi::decode_u128(data, 0)
}

/// Decodes `delegations(address)`. The zero address means no delegate.
pub fn decode_delegation(data: &[u8]) -> Result<Option<String>, EthError> {
    let addr = abi::decode_address(data, 0)?;
    if addr == [0u8; 20] {
        return Ok(None);
    }
    checksum_address(&format!("0x{}", hex::encode(addr))).map(Some)
}

/// Decodes `getRecipientClaimable(address)`.
pub fn decode_recipient_claimable(data: &[u8]) -> Result<RecipientClaimable, EthError> {
    let amount = abi::decode_u128(data, 0)?;
    let expires_at: U256 = abi::decode_uint256(data, 1)?;
    let expires_at = u64::try_from(expires_at).map_err(|_| {
        EthError::DecodingError(format!("expiry {expires_at} does not fit in u64"))
    })?;
    let is_expired = abi::decode_bool(data, 2)?;

    Ok(RecipientClaimable {
        amount,
        expires_at,
        is_expired,
    })
}
