use std::fmt;

use serde::{Deserialize, Serialize};

/// The two supported execution environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    Solana,
}

impl ChainFamily {
    /// Wire name: `"evm"` or `"solana"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainFamily::Evm => "evm",
            ChainFamily::Solana => "solana",
        }
    }

    /// Human-readable name used in configuration errors.
    pub fn label(&self) -> &'static str {
        match self {
            ChainFamily::Evm => "EVM",
            ChainFamily::Solana => "Solana",
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a transaction landed: a block on EVM, a slot on Solana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Confirmation {
    BlockNumber(u64),
    Slot(u64),
}

/// Operation-specific payload of an [`OperationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OperationDetails {
    Send {
        /// Contract `sendFee` read just before submission, in USDC base
        /// units. This is the full-fee price; a non-priority send is debited
        /// only the reduced share the contract computes from it.
        #[serde(rename = "fee")]
        fee_quote: u128,
        is_priority: bool,
        resolve_sender_to_name: bool,
    },
    SendPrepared {
        mail_id: String,
        #[serde(rename = "fee")]
        fee_quote: u128,
        is_priority: bool,
        resolve_sender_to_name: bool,
    },
    SendToEmail {
        email: String,
        #[serde(rename = "fee")]
        fee_quote: u128,
    },
    /// `delegate` is `None` when the delegation was cleared.
    Delegate {
        delegate: Option<String>,
        /// `delegationFee` when setting a delegate, zero when clearing.
        #[serde(rename = "fee")]
        fee_quote: u128,
    },
    RejectDelegation {
        delegating_address: String,
    },
    ClaimRecipientShare,
    ClaimOwnerShare,
}

/// Chain-agnostic result of every state-changing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    /// `0x`-prefixed hash on EVM, Base58 signature on Solana.
    pub transaction_hash: String,
    pub chain_type: ChainFamily,
    pub confirmation: Option<Confirmation>,
    pub details: OperationDetails,
}

impl OperationResult {
    pub fn block_number(&self) -> Option<u64> {
        match self.confirmation {
            Some(Confirmation::BlockNumber(n)) => Some(n),
            _ => None,
        }
    }

    pub fn slot(&self) -> Option<u64> {
        match self.confirmation {
            Some(Confirmation::Slot(n)) => Some(n),
            _ => None,
        }
    }

    /// On-chain fee read before submission, if the operation carries one.
    /// Not the amount debited; see [`OperationDetails::Send`].
    pub fn fee_quote(&self) -> Option<u128> {
        match &self.details {
            OperationDetails::Send { fee_quote, .. }
            | OperationDetails::SendPrepared { fee_quote, .. }
            | OperationDetails::SendToEmail { fee_quote, .. }
            | OperationDetails::Delegate { fee_quote, .. } => Some(*fee_quote),
            _ => None,
        }
    }
}

/// Revenue share currently owed to a recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claimable {
    pub amount: u128,
    /// Unix timestamp after which the share lapses. Zero when nothing is owed.
    pub expires_at: u64,
    pub is_expired: bool,
}
