use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chain_sol::{
    address_to_bytes, bytes_to_address, compile_transaction, set_compute_unit_limit,
    set_compute_unit_price, transaction_signature, Delegation, MailerProgram, MailerState,
    RecipientClaim, SolInstruction,
};
use tracing::{debug, info, warn};

use super::{bounded, duration_ms, MailerAdapter};
use crate::config::{ClientOptions, SolanaConfig};
use crate::error::{ClientError, Result};
use crate::rpc::SolanaConnection;
use crate::types::{ChainFamily, Claimable, Confirmation, OperationDetails, OperationResult};
use crate::validation::{validate_address_for, validate_email, validate_mail_id, validate_message};
use crate::wallet::{SolanaSigner, WalletHandle};

const CHAIN: ChainFamily = ChainFamily::Solana;

/// The mailer program on one Solana cluster.
pub struct SolanaMailer {
    connection: Arc<dyn SolanaConnection>,
    program: MailerProgram,
    options: ClientOptions,
}

impl SolanaMailer {
    pub fn new(
        config: &SolanaConfig,
        connection: Arc<dyn SolanaConnection>,
        options: ClientOptions,
    ) -> Result<Self> {
        let program_id = address_to_bytes(&config.programs.mailer)
            .map_err(|e| ClientError::InvalidConfig(format!("solana.programs.mailer: {e}")))?;
        let usdc_mint = address_to_bytes(&config.usdc_mint)
            .map_err(|e| ClientError::InvalidConfig(format!("solana.usdcMint: {e}")))?;
        let program = MailerProgram::new(program_id, usdc_mint)?;

        debug!(
            chain = %CHAIN,
            cluster = config.cluster.as_deref().unwrap_or("unspecified"),
            program = %config.programs.mailer,
            state = %bytes_to_address(&program.mailer_state),
            "solana adapter ready"
        );
        Ok(Self {
            connection,
            program,
            options,
        })
    }

    pub fn program(&self) -> &MailerProgram {
        &self.program
    }

    async fn account(&self, address: &[u8; 32]) -> Result<Option<Vec<u8>>> {
        let address = bytes_to_address(address);
        bounded(
            CHAIN,
            self.options.rpc_timeout,
            self.connection.account_data(&address),
        )
        .await
    }

    async fn state(&self) -> Result<MailerState> {
        let data = self
            .account(&self.program.mailer_state)
            .await?
            .ok_or_else(|| ClientError::chain_call(CHAIN, "mailer program is not initialized"))?;
        Ok(MailerState::decode(&data)?)
    }

    async fn submit(
        &self,
        signer: &Arc<dyn SolanaSigner>,
        instruction: SolInstruction,
        details: OperationDetails,
    ) -> Result<OperationResult> {
        let mut instructions = Vec::with_capacity(3);
        if let Some(units) = self.options.tx.compute_unit_limit {
            instructions.push(set_compute_unit_limit(units)?);
        }
        if let Some(price) = self.options.tx.compute_unit_price {
            instructions.push(set_compute_unit_price(price)?);
        }
        instructions.push(instruction);

        let payer = signer.public_key();
        let blockhash = bounded(
            CHAIN,
            self.options.rpc_timeout,
            self.connection.latest_blockhash(),
        )
        .await?;
        let tx = compile_transaction(&instructions, &payer, &blockhash)?;

        let wire = bounded(CHAIN, self.options.rpc_timeout, signer.sign_transaction(&tx)).await?;
        let local_signature = transaction_signature(&wire)?;
        debug!(chain = %CHAIN, tx = %local_signature, bytes = wire.len(), "signed solana transaction");

        let signature = bounded(
            CHAIN,
            self.options.rpc_timeout,
            self.connection.send_transaction(&wire),
        )
        .await?;
        info!(chain = %CHAIN, tx = %signature, from = %bytes_to_address(&payer), "transaction submitted");

        let slot = self.wait_for_confirmation(&signature).await?;
        info!(chain = %CHAIN, tx = %signature, slot, "transaction confirmed");

        Ok(OperationResult {
            transaction_hash: signature,
            chain_type: CHAIN,
            confirmation: Some(Confirmation::Slot(slot)),
            details,
        })
    }

    async fn wait_for_confirmation(&self, signature: &str) -> Result<u64> {
        let limit = self.options.confirmation_timeout;
        match tokio::time::timeout(limit, self.poll_status(signature)).await {
            Ok(result) => result,
            Err(_) => {
                let ms = duration_ms(limit);
                warn!(chain = %CHAIN, tx = %signature, ms, "not confirmed before timeout");
                Err(ClientError::Timeout { chain: CHAIN, ms })
            }
        }
    }

    async fn poll_status(&self, signature: &str) -> Result<u64> {
        loop {
            let status = bounded(
                CHAIN,
                self.options.rpc_timeout,
                self.connection.signature_status(signature),
            )
            .await?;

            if let Some(status) = status {
                if let Some(err) = status.err.as_ref().filter(|e| !e.is_null()) {
                    warn!(chain = %CHAIN, tx = %signature, slot = status.slot, error = %err, "transaction failed");
                    return Err(ClientError::chain_call(
                        CHAIN,
                        format!("transaction {signature} failed: {err}"),
                    ));
                }
                if status.is_confirmed() {
                    return Ok(status.slot);
                }
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    fn pubkey(address: &str) -> Result<[u8; 32]> {
        validate_address_for(CHAIN, address)?;
        Ok(address_to_bytes(address)?)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[async_trait]
impl MailerAdapter for SolanaMailer {
    fn chain_family(&self) -> ChainFamily {
        CHAIN
    }

    async fn send_message(
        &self,
        wallet: &WalletHandle,
        subject: &str,
        body: &str,
        priority: bool,
        resolve_sender_to_name: bool,
    ) -> Result<OperationResult> {
        validate_message(subject, body)?;
        let signer = wallet.as_solana()?;

        let fee = self.get_send_fee().await?;
        debug!(chain = %CHAIN, priority, fee, "sending message");
        let ix = self.program.send(
            &signer.public_key(),
            subject,
            body,
            priority,
            resolve_sender_to_name,
        )?;
        self.submit(
            signer,
            ix,
            OperationDetails::Send {
                fee_quote: fee,
                is_priority: priority,
                resolve_sender_to_name,
            },
        )
        .await
    }

    async fn send_prepared(
        &self,
        wallet: &WalletHandle,
        mail_id: &str,
        priority: bool,
        resolve_sender_to_name: bool,
    ) -> Result<OperationResult> {
        validate_mail_id(mail_id)?;
        let signer = wallet.as_solana()?;

        let fee = self.get_send_fee().await?;
        let ix = self.program.send_prepared(
            &signer.public_key(),
            mail_id,
            priority,
            resolve_sender_to_name,
        )?;
        self.submit(
            signer,
            ix,
            OperationDetails::SendPrepared {
                mail_id: mail_id.to_string(),
                fee_quote: fee,
                is_priority: priority,
                resolve_sender_to_name,
            },
        )
        .await
    }

    async fn send_to_email(
        &self,
        wallet: &WalletHandle,
        email: &str,
        subject: &str,
        body: &str,
    ) -> Result<OperationResult> {
        validate_email(email)?;
        validate_message(subject, body)?;
        let signer = wallet.as_solana()?;

        let fee = self.get_send_fee().await?;
        let ix = self
            .program
            .send_to_email(&signer.public_key(), email, subject, body)?;
        self.submit(
            signer,
            ix,
            OperationDetails::SendToEmail {
                email: email.to_string(),
                fee_quote: fee,
            },
        )
        .await
    }

    async fn delegate_to(
        &self,
        wallet: &WalletHandle,
        delegate: Option<&str>,
    ) -> Result<OperationResult> {
        let delegate_key = delegate.map(Self::pubkey).transpose()?;
        let signer = wallet.as_solana()?;

        let fee = match delegate_key {
            Some(_) => self.get_delegation_fee().await?,
            None => 0,
        };
        debug!(chain = %CHAIN, delegate = ?delegate, fee, "delegating");
        let ix = self
            .program
            .delegate_to(&signer.public_key(), delegate_key.as_ref())?;
        self.submit(
            signer,
            ix,
            OperationDetails::Delegate {
                delegate: delegate.map(str::to_string),
                fee_quote: fee,
            },
        )
        .await
    }

    async fn reject_delegation(
        &self,
        wallet: &WalletHandle,
        delegating_address: &str,
    ) -> Result<OperationResult> {
        let delegator = Self::pubkey(delegating_address)?;
        let signer = wallet.as_solana()?;

        let ix = self
            .program
            .reject_delegation(&signer.public_key(), &delegator)?;
        self.submit(
            signer,
            ix,
            OperationDetails::RejectDelegation {
                delegating_address: delegating_address.to_string(),
            },
        )
        .await
    }

    async fn claim_recipient_share(&self, wallet: &WalletHandle) -> Result<OperationResult> {
        let signer = wallet.as_solana()?;
        let ix = self.program.claim_recipient_share(&signer.public_key())?;
        self.submit(signer, ix, OperationDetails::ClaimRecipientShare)
            .await
    }

    async fn claim_owner_share(&self, wallet: &WalletHandle) -> Result<OperationResult> {
        let signer = wallet.as_solana()?;
        let ix = self.program.claim_owner_share(&signer.public_key())?;
        self.submit(signer, ix, OperationDetails::ClaimOwnerShare)
            .await
    }

    async fn get_send_fee(&self) -> Result<u128> {
        let fee = self.state().await?.send_fee;
        debug!(chain = %CHAIN, fee, "read send fee");
        Ok(fee.into())
    }

    async fn get_delegation_fee(&self) -> Result<u128> {
        let fee = self.state().await?.delegation_fee;
        debug!(chain = %CHAIN, fee, "read delegation fee");
        Ok(fee.into())
    }

    async fn get_delegation(&self, delegator: &str) -> Result<Option<String>> {
        let delegator_key = Self::pubkey(delegator)?;
        let address = self.program.delegation_address(&delegator_key)?;

        let delegate = match self.account(&address).await? {
            Some(data) => Delegation::decode(&data)?.delegate_address(),
            None => None,
        };
        debug!(chain = %CHAIN, delegator, delegate = ?delegate, "read delegation");
        Ok(delegate)
    }

    async fn get_recipient_claimable(&self, recipient: &str) -> Result<Claimable> {
        let recipient_key = Self::pubkey(recipient)?;
        let address = self.program.claim_address(&recipient_key)?;

        let Some(data) = self.account(&address).await? else {
            debug!(chain = %CHAIN, recipient, "no claim account");
            return Ok(Claimable {
                amount: 0,
                expires_at: 0,
                is_expired: false,
            });
        };
        let claim = RecipientClaim::decode(&data)?;
        let claim_period = self.state().await?.claim_period;

        let expires_at = claim.expires_at(claim_period);
        let is_expired = claim.amount > 0 && unix_now() > expires_at;
        debug!(chain = %CHAIN, recipient, amount = claim.amount, expires_at, "read recipient claimable");

        Ok(Claimable {
            amount: claim.amount.into(),
            expires_at: u64::try_from(expires_at).unwrap_or(0),
            is_expired,
        })
    }

    async fn get_owner_claimable(&self) -> Result<u128> {
        let amount = self.state().await?.owner_claimable;
        debug!(chain = %CHAIN, amount, "read owner claimable");
        Ok(amount.into())
    }
}
