//! Instruction builders and account decoders for the mailer program.
//!
//! The program follows Anchor conventions: instruction data starts with
//! `sha256("global:<name>")[..8]`, account data with
//! `sha256("account:<Name>")[..8]`, and arguments use Borsh encoding.

use sha2::{Digest, Sha256};

use crate::address::bytes_to_address;
use crate::error::SolError;
use crate::pda::{derive_associated_token_address, find_program_address, TOKEN_PROGRAM_ID};
use crate::transaction::{SolAccountMeta, SolInstruction, SYSTEM_PROGRAM_ID};

pub const MAILER_SEED: &[u8] = b"mailer";
pub const CLAIM_SEED: &[u8] = b"claim";
pub const DELEGATION_SEED: &[u8] = b"delegation";

/// Anchor instruction discriminator: `sha256("global:<name>")[..8]`.
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    discriminator("global", name)
}

/// Anchor account discriminator: `sha256("account:<Name>")[..8]`.
pub fn account_discriminator(name: &str) -> [u8; 8] {
    discriminator("account", name)
}

fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Addresses of one mailer deployment: the program, its USDC mint and the
/// accounts derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailerProgram {
    pub program_id: [u8; 32],
    pub usdc_mint: [u8; 32],
    /// The `["mailer"]` state PDA.
    pub mailer_state: [u8; 32],
    /// USDC token account owned by the mailer state PDA.
    pub mailer_usdc: [u8; 32],
}

impl MailerProgram {
    pub fn new(program_id: [u8; 32], usdc_mint: [u8; 32]) -> Result<Self, SolError> {
        let (mailer_state, _) = find_program_address(&[MAILER_SEED], &program_id)?;
        let mailer_usdc = derive_associated_token_address(&mailer_state, &usdc_mint)?;
        Ok(Self {
            program_id,
            usdc_mint,
            mailer_state,
            mailer_usdc,
        })
    }

    /// The `["claim", recipient]` PDA holding a recipient's revenue share.
    pub fn claim_address(&self, recipient: &[u8; 32]) -> Result<[u8; 32], SolError> {
        find_program_address(&[CLAIM_SEED, recipient.as_ref()], &self.program_id)
            .map(|(address, _)| address)
    }

    /// The `["delegation", delegator]` PDA.
    pub fn delegation_address(&self, delegator: &[u8; 32]) -> Result<[u8; 32], SolError> {
        find_program_address(&[DELEGATION_SEED, delegator.as_ref()], &self.program_id)
            .map(|(address, _)| address)
    }

    /// `send(subject, body, revenue_share_to_receiver, resolve_sender_to_name)`.
    ///
    /// The sender is also the revenue-share recipient.
    pub fn send(
        &self,
        sender: &[u8; 32],
        subject: &str,
        body: &str,
        revenue_share_to_receiver: bool,
        resolve_sender_to_name: bool,
    ) -> Result<SolInstruction, SolError> {
        let mut args = ArgWriter::new("send");
        args.string(subject)?;
        args.string(body)?;
        args.bool(revenue_share_to_receiver);
        args.bool(resolve_sender_to_name);

        Ok(self.instruction(self.send_accounts(sender)?, args.finish()))
    }

    /// `send_prepared(mail_id, revenue_share_to_receiver, resolve_sender_to_name)`.
    pub fn send_prepared(
        &self,
        sender: &[u8; 32],
        mail_id: &str,
        revenue_share_to_receiver: bool,
        resolve_sender_to_name: bool,
    ) -> Result<SolInstruction, SolError> {
        let mut args = ArgWriter::new("send_prepared");
        args.string(mail_id)?;
        args.bool(revenue_share_to_receiver);
        args.bool(resolve_sender_to_name);

        Ok(self.instruction(self.send_accounts(sender)?, args.finish()))
    }

    /// `send_to_email(email, subject, body)`. Always the standard fee, so no
    /// claim account is touched.
    pub fn send_to_email(
        &self,
        sender: &[u8; 32],
        email: &str,
        subject: &str,
        body: &str,
    ) -> Result<SolInstruction, SolError> {
        let mut args = ArgWriter::new("send_to_email");
        args.string(email)?;
        args.string(subject)?;
        args.string(body)?;

        let accounts = vec![
            SolAccountMeta::writable(*sender, true),
            SolAccountMeta::writable(self.mailer_state, false),
            SolAccountMeta::writable(self.token_account(sender)?, false),
            SolAccountMeta::writable(self.mailer_usdc, false),
            SolAccountMeta::readonly(TOKEN_PROGRAM_ID, false),
        ];
        Ok(self.instruction(accounts, args.finish()))
    }

    /// `delegate_to(Option<Pubkey>)`. `None` clears the delegation.
    pub fn delegate_to(
        &self,
        delegator: &[u8; 32],
        delegate: Option<&[u8; 32]>,
    ) -> Result<SolInstruction, SolError> {
        let mut args = ArgWriter::new("delegate_to");
        args.option_pubkey(delegate);

        let accounts = vec![
            SolAccountMeta::writable(*delegator, true),
            SolAccountMeta::writable(self.delegation_address(delegator)?, false),
            SolAccountMeta::readonly(self.mailer_state, false),
            SolAccountMeta::writable(self.token_account(delegator)?, false),
            SolAccountMeta::writable(self.mailer_usdc, false),
            SolAccountMeta::readonly(TOKEN_PROGRAM_ID, false),
            SolAccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
        ];
        Ok(self.instruction(accounts, args.finish()))
    }

    /// `reject_delegation()`, signed by the delegate and targeting the
    /// delegator's delegation account.
    pub fn reject_delegation(
        &self,
        rejector: &[u8; 32],
        delegator: &[u8; 32],
    ) -> Result<SolInstruction, SolError> {
        let accounts = vec![
            SolAccountMeta::writable(*rejector, true),
            SolAccountMeta::writable(self.delegation_address(delegator)?, false),
            SolAccountMeta::readonly(self.mailer_state, false),
        ];
        Ok(self.instruction(accounts, ArgWriter::new("reject_delegation").finish()))
    }

    pub fn claim_recipient_share(&self, recipient: &[u8; 32]) -> Result<SolInstruction, SolError> {
        let accounts = vec![
            SolAccountMeta::writable(*recipient, true),
            SolAccountMeta::writable(self.claim_address(recipient)?, false),
            SolAccountMeta::readonly(self.mailer_state, false),
            SolAccountMeta::writable(self.token_account(recipient)?, false),
            SolAccountMeta::writable(self.mailer_usdc, false),
            SolAccountMeta::readonly(TOKEN_PROGRAM_ID, false),
        ];
        Ok(self.instruction(
            accounts,
            ArgWriter::new("claim_recipient_share").finish(),
        ))
    }

    pub fn claim_owner_share(&self, owner: &[u8; 32]) -> Result<SolInstruction, SolError> {
        let accounts = vec![
            SolAccountMeta::writable(*owner, true),
            SolAccountMeta::writable(self.mailer_state, false),
            SolAccountMeta::writable(self.token_account(owner)?, false),
            SolAccountMeta::writable(self.mailer_usdc, false),
            SolAccountMeta::readonly(TOKEN_PROGRAM_ID, false),
        ];
        Ok(self.instruction(accounts, ArgWriter::new("claim_owner_share").finish()))
    }

    fn send_accounts(&self, sender: &[u8; 32]) -> Result<Vec<SolAccountMeta>, SolError> {
        Ok(vec![
            SolAccountMeta::writable(*sender, true),
            SolAccountMeta::writable(self.claim_address(sender)?, false),
            SolAccountMeta::writable(self.mailer_state, false),
            SolAccountMeta::writable(self.token_account(sender)?, false),
            SolAccountMeta::writable(self.mailer_usdc, false),
            SolAccountMeta::readonly(TOKEN_PROGRAM_ID, false),
            SolAccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
        ])
    }

    fn token_account(&self, owner: &[u8; 32]) -> Result<[u8; 32], SolError> {
        derive_associated_token_address(owner, &self.usdc_mint)
    }

    fn instruction(&self, accounts: Vec<SolAccountMeta>, data: Vec<u8>) -> SolInstruction {
        SolInstruction {
            program_id: self.program_id,
            accounts,
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// Borsh argument encoding
// ---------------------------------------------------------------------------

struct ArgWriter {
    buf: Vec<u8>,
}

impl ArgWriter {
    fn new(instruction: &str) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&instruction_discriminator(instruction));
        Self { buf }
    }

    fn string(&mut self, value: &str) -> Result<(), SolError> {
        let len = u32::try_from(value.len()).map_err(|_| {
            SolError::SerializationError(format!("string of {} bytes is too long", value.len()))
        })?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    fn option_pubkey(&mut self, value: Option<&[u8; 32]>) {
        match value {
            Some(key) => {
                self.buf.push(1);
                self.buf.extend_from_slice(key);
            }
            None => self.buf.push(0),
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

// ---------------------------------------------------------------------------
// Account decoding
// ---------------------------------------------------------------------------

/// Global program state stored at the `["mailer"]` PDA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailerState {
    pub owner: [u8; 32],
    pub usdc_mint: [u8; 32],
    pub send_fee: u64,
    pub delegation_fee: u64,
    pub owner_claimable: u64,
    /// Seconds a recipient share stays claimable.
    pub claim_period: i64,
    pub bump: u8,
}

impl MailerState {
    pub fn decode(data: &[u8]) -> Result<Self, SolError> {
        let mut r = AccountReader::new(data, "MailerState")?;
        Ok(Self {
            owner: r.pubkey()?,
            usdc_mint: r.pubkey()?,
            send_fee: r.u64()?,
            delegation_fee: r.u64()?,
            owner_claimable: r.u64()?,
            claim_period: r.i64()?,
            bump: r.u8()?,
        })
    }
}

/// Revenue share owed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientClaim {
    pub recipient: [u8; 32],
    pub amount: u64,
    /// Unix timestamp of the most recent credit.
    pub timestamp: i64,
    pub bump: u8,
}

impl RecipientClaim {
    pub fn decode(data: &[u8]) -> Result<Self, SolError> {
        let mut r = AccountReader::new(data, "RecipientClaim")?;
        Ok(Self {
            recipient: r.pubkey()?,
            amount: r.u64()?,
            timestamp: r.i64()?,
            bump: r.u8()?,
        })
    }

    /// Unix timestamp after which the claim lapses to the owner.
    pub fn expires_at(&self, claim_period: i64) -> i64 {
        self.timestamp.saturating_add(claim_period)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegation {
    pub delegator: [u8; 32],
    pub delegate: Option<[u8; 32]>,
    pub bump: u8,
}

impl Delegation {
    pub fn decode(data: &[u8]) -> Result<Self, SolError> {
        let mut r = AccountReader::new(data, "Delegation")?;
        Ok(Self {
            delegator: r.pubkey()?,
            delegate: r.option_pubkey()?,
            bump: r.u8()?,
        })
    }

    /// The delegate as a Base58 address.
    pub fn delegate_address(&self) -> Option<String> {
        self.delegate.as_ref().map(bytes_to_address)
    }
}

struct AccountReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> AccountReader<'a> {
    fn new(data: &'a [u8], account: &str) -> Result<Self, SolError> {
        let expected = account_discriminator(account);
        match data.get(..8) {
            Some(found) if found == expected => Ok(Self { data, pos: 8 }),
            Some(_) => Err(SolError::AccountDecodeError(format!(
                "account is not a {account}"
            ))),
            None => Err(SolError::AccountDecodeError(format!(
                "{account} data too short for discriminator"
            ))),
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], SolError> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .ok_or_else(|| {
                SolError::AccountDecodeError(format!(
                    "unexpected end of account data at offset {}",
                    self.pos
                ))
            })?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn pubkey(&mut self) -> Result<[u8; 32], SolError> {
        self.take::<32>()
    }

    fn u8(&mut self) -> Result<u8, SolError> {
        Ok(self.take::<1>()?[0])
    }

    fn u64(&mut self) -> Result<u64, SolError> {
        Ok(u64::from_le_bytes(self.take::<8>()?))
    }

    fn i64(&mut self) -> Result<i64, SolError> {
        Ok(i64::from_le_bytes(self.take::<8>()?))
    }

    fn option_pubkey(&mut self) -> Result<Option<[u8; 32]>, SolError> {
        match self.u8()? {
            0 => Ok(None),
            1 => self.pubkey().map(Some),
            tag => Err(SolError::AccountDecodeError(format!(
                "invalid option tag {tag}"
            ))),
        }
    }
}
