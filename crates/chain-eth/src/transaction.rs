use alloy_rlp::{length_of_length, BufMut, Encodable, Header, EMPTY_LIST_CODE};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey};
use sha3::{Digest, Keccak256};
use zeroize::Zeroizing;

use crate::address::parse_address;
use crate::error::EthError;

/// EIP-1559 typed transaction prefix.
const EIP1559_TX_TYPE: u8 = 0x02;

/// An unsigned EIP-1559 (type 2) contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    /// Contract address as a 0x-prefixed hex string.
    pub to: String,
    /// Native value attached to the call, in wei.
    pub value: u128,
    pub data: Vec<u8>,
}

/// A signed EIP-1559 transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub struct SignedEthTransaction {
    /// Type byte followed by the RLP-encoded signed fields.
    pub raw_tx: Vec<u8>,
    /// Transaction hash as a 0x-prefixed hex string.
    pub tx_hash: String,
}

/// Gas pricing for a single EIP-1559 transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParams {
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
}

/// Builds an unsigned EIP-1559 call to `contract` carrying `data`.
pub fn build_contract_call(
    chain_id: u64,
    nonce: u64,
    contract: &str,
    data: Vec<u8>,
    fees: FeeParams,
) -> Result<EthTransaction, EthError> {
    parse_address(contract)?;

    if fees.gas_limit == 0 {
        return Err(EthError::TransactionBuildError(
            "gas limit must be > 0".into(),
        ));
    }
    if fees.max_priority_fee_per_gas > fees.max_fee_per_gas {
        return Err(EthError::TransactionBuildError(format!(
            "priority fee {} exceeds max fee {}",
            fees.max_priority_fee_per_gas, fees.max_fee_per_gas
        )));
    }

    Ok(EthTransaction {
        chain_id,
        nonce,
        max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        max_fee_per_gas: fees.max_fee_per_gas,
        gas_limit: fees.gas_limit,
        to: contract.to_string(),
        value: 0,
        data,
    })
}

/// Signs an EIP-1559 transaction with the given secp256k1 private key.
///
/// The signing payload is `0x02 || rlp(unsigned_fields)`; its Keccak-256
/// hash is signed and `(y_parity, r, s)` appended to form the raw
/// transaction. The transaction hash is the Keccak-256 of the raw bytes.
pub fn sign_transaction(
    tx: &EthTransaction,
    private_key: &[u8; 32],
) -> Result<SignedEthTransaction, EthError> {
    let unsigned = Eip1559Fields::new(tx)?;
    let msg_hash = Keccak256::digest(unsigned.typed_payload());

    let key_bytes = Zeroizing::new(*private_key);
    let signing_key = SigningKey::from_bytes((&*key_bytes).into())
        .map_err(|e| EthError::InvalidPrivateKey(e.to_string()))?;

    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash(msg_hash.as_slice())
        .map_err(|e| EthError::SigningError(e.to_string()))?;

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature.r().to_bytes());
    s.copy_from_slice(&signature.s().to_bytes());

    let raw_tx = unsigned
        .with_signature(recovery_id.is_y_odd() as u8, r, s)
        .typed_payload();
    let tx_hash = format!("0x{}", hex::encode(Keccak256::digest(&raw_tx)));

    Ok(SignedEthTransaction { raw_tx, tx_hash })
}

/// Encodes the unsigned transaction as `0x02 || rlp(fields)`.
///
/// Field order: `[chain_id, nonce, max_priority_fee_per_gas,
/// max_fee_per_gas, gas_limit, to, value, data, access_list]`.
pub fn encode_unsigned_tx(tx: &EthTransaction) -> Result<Vec<u8>, EthError> {
    Ok(Eip1559Fields::new(tx)?.typed_payload())
}

// ---------------------------------------------------------------------------
// RLP
// ---------------------------------------------------------------------------

/// RLP view of an [`EthTransaction`]. The access list is always empty.
struct Eip1559Fields<'a> {
    tx: &'a EthTransaction,
    to: [u8; 20],
    signature: Option<(u8, [u8; 32], [u8; 32])>,
}

impl<'a> Eip1559Fields<'a> {
    fn new(tx: &'a EthTransaction) -> Result<Self, EthError> {
        Ok(Self {
            tx,
            to: parse_address(&tx.to)?,
            signature: None,
        })
    }

    fn with_signature(self, y_parity: u8, r: [u8; 32], s: [u8; 32]) -> Self {
        Self {
            signature: Some((y_parity, r, s)),
            ..self
        }
    }

    fn payload_length(&self) -> usize {
        let tx = self.tx;
        let mut len = tx.chain_id.length()
            + tx.nonce.length()
            + tx.max_priority_fee_per_gas.length()
            + tx.max_fee_per_gas.length()
            + tx.gas_limit.length()
            + self.to.as_slice().length()
            + tx.value.length()
            + tx.data.as_slice().length()
            + 1;
        if let Some((y_parity, r, s)) = &self.signature {
            len += y_parity.length() + trim_word(r).length() + trim_word(s).length();
        }
        len
    }

    fn typed_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.length());
        out.push(EIP1559_TX_TYPE);
        self.encode(&mut out);
        out
    }
}

impl Encodable for Eip1559Fields<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        let tx = self.tx;
        Header {
            list: true,
            payload_length: self.payload_length(),
        }
        .encode(out);
        tx.chain_id.encode(out);
        tx.nonce.encode(out);
        tx.max_priority_fee_per_gas.encode(out);
        tx.max_fee_per_gas.encode(out);
        tx.gas_limit.encode(out);
        self.to.as_slice().encode(out);
        tx.value.encode(out);
        tx.data.as_slice().encode(out);
        out.put_u8(EMPTY_LIST_CODE);
        if let Some((y_parity, r, s)) = &self.signature {
            y_parity.encode(out);
            trim_word(r).encode(out);
            trim_word(s).encode(out);
        }
    }

    fn length(&self) -> usize {
        let payload = self.payload_length();
        payload + length_of_length(payload)
    }
}

/// Signature scalars are RLP integers: no leading zero bytes.
fn trim_word(word: &[u8; 32]) -> &[u8] {
    let start = word.iter().position(|&b| b != 0).unwrap_or(32);
    &word[start..]
}
