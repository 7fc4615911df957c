use std::sync::Arc;

use async_trait::async_trait;
use chain_eth::address::{checksum_address, ZERO_ADDRESS};
use chain_eth::mailer;
use tracing::{debug, info, warn};

use super::{bounded, duration_ms, MailerAdapter};
use crate::config::{ClientOptions, EvmConfig};
use crate::error::{ClientError, Result};
use crate::rpc::{EvmProvider, EvmReceipt};
use crate::types::{ChainFamily, Claimable, Confirmation, OperationDetails, OperationResult};
use crate::validation::{validate_address_for, validate_email, validate_mail_id, validate_message};
use crate::wallet::{EvmSigner, EvmTransactionRequest, WalletHandle};

const CHAIN: ChainFamily = ChainFamily::Evm;

/// The mailer contract on one EVM chain.
pub struct EvmMailer {
    provider: Arc<dyn EvmProvider>,
    mailer: String,
    chain_id: u64,
    options: ClientOptions,
}

impl EvmMailer {
    pub fn new(config: &EvmConfig, provider: Arc<dyn EvmProvider>, options: ClientOptions) -> Self {
        debug!(chain = %CHAIN, chain_id = config.chain_id, mailer = %config.contracts.mailer, "evm adapter ready");
        Self {
            provider,
            mailer: config.contracts.mailer.clone(),
            chain_id: config.chain_id,
            options,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The wallet's EVM signer, refused if it signs for another chain.
    fn signer<'w>(&self, wallet: &'w WalletHandle) -> Result<&'w Arc<dyn EvmSigner>> {
        let signer = wallet.as_evm()?;
        match signer.chain_id() {
            Some(id) if id != self.chain_id => {
                warn!(chain = %CHAIN, signer_chain = id, chain_id = self.chain_id, "signer chain mismatch");
                Err(ClientError::WalletMismatch(format!(
                    "signer is bound to chain {id}, mailer is on chain {}",
                    self.chain_id
                )))
            }
            _ => Ok(signer),
        }
    }

    async fn read(&self, calldata: Vec<u8>) -> Result<Vec<u8>> {
        bounded(
            CHAIN,
            self.options.rpc_timeout,
            self.provider.call(&self.mailer, &calldata),
        )
        .await
    }

    async fn submit(
        &self,
        signer: &Arc<dyn EvmSigner>,
        calldata: Vec<u8>,
        details: OperationDetails,
    ) -> Result<OperationResult> {
        let tx = &self.options.tx;
        let request = EvmTransactionRequest {
            to: self.mailer.clone(),
            data: calldata,
            gas_limit: tx.gas_limit,
            max_fee_per_gas: tx.max_fee_per_gas,
            max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
        };

        let hash = bounded(
            CHAIN,
            self.options.rpc_timeout,
            signer.send_transaction(request),
        )
        .await?;
        info!(chain = %CHAIN, tx = %hash, from = %signer.address(), "transaction submitted");

        let receipt = self.wait_for_receipt(&hash).await?;
        if !receipt.success {
            warn!(chain = %CHAIN, tx = %hash, block = receipt.block_number, "transaction reverted");
            return Err(ClientError::chain_call(
                CHAIN,
                format!("transaction {hash} reverted"),
            ));
        }
        info!(chain = %CHAIN, tx = %hash, block = receipt.block_number, "transaction confirmed");

        Ok(OperationResult {
            transaction_hash: hash,
            chain_type: CHAIN,
            confirmation: Some(Confirmation::BlockNumber(receipt.block_number)),
            details,
        })
    }

    async fn wait_for_receipt(&self, hash: &str) -> Result<EvmReceipt> {
        let limit = self.options.confirmation_timeout;
        match tokio::time::timeout(limit, self.poll_receipt(hash)).await {
            Ok(result) => result,
            Err(_) => {
                let ms = duration_ms(limit);
                warn!(chain = %CHAIN, tx = %hash, ms, "no receipt before timeout");
                Err(ClientError::Timeout { chain: CHAIN, ms })
            }
        }
    }

    async fn poll_receipt(&self, hash: &str) -> Result<EvmReceipt> {
        loop {
            let receipt = bounded(
                CHAIN,
                self.options.rpc_timeout,
                self.provider.transaction_receipt(hash),
            )
            .await?;
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }
}

#[async_trait]
impl MailerAdapter for EvmMailer {
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
        let signer = self.signer(wallet)?;

        let fee = self.get_send_fee().await?;
        debug!(chain = %CHAIN, priority, fee, "sending message");
        let calldata = mailer::encode_send(subject, body, priority, resolve_sender_to_name);
        self.submit(
            signer,
            calldata,
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
        let signer = self.signer(wallet)?;

        let fee = self.get_send_fee().await?;
        let calldata = mailer::encode_send_prepared(mail_id, priority, resolve_sender_to_name);
        self.submit(
            signer,
            calldata,
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
        let signer = self.signer(wallet)?;

        let fee = self.get_send_fee().await?;
        let calldata = mailer::encode_send_to_email(email, subject, body);
        self.submit(
            signer,
            calldata,
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
        if let Some(delegate) = delegate {
            validate_address_for(CHAIN, delegate)?;
        }
        let signer = self.signer(wallet)?;

        let (calldata, delegate, fee) = match delegate {
            Some(delegate) => {
                let fee = self.get_delegation_fee().await?;
                (
                    mailer::encode_delegate_to(delegate)?,
                    Some(checksum_address(delegate)?),
                    fee,
                )
            }
            None => (mailer::encode_delegate_to(ZERO_ADDRESS)?, None, 0),
        };
        debug!(chain = %CHAIN, delegate = ?delegate, fee, "delegating");
        self.submit(
            signer,
            calldata,
            OperationDetails::Delegate {
                delegate,
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
        validate_address_for(CHAIN, delegating_address)?;
        let signer = self.signer(wallet)?;

        let calldata = mailer::encode_reject_delegation(delegating_address)?;
        self.submit(
            signer,
            calldata,
            OperationDetails::RejectDelegation {
                delegating_address: checksum_address(delegating_address)?,
            },
        )
        .await
    }

    async fn claim_recipient_share(&self, wallet: &WalletHandle) -> Result<OperationResult> {
        let signer = self.signer(wallet)?;
        self.submit(
            signer,
            mailer::encode_claim_recipient_share(),
            OperationDetails::ClaimRecipientShare,
        )
        .await
    }

    async fn claim_owner_share(&self, wallet: &WalletHandle) -> Result<OperationResult> {
        let signer = self.signer(wallet)?;
        self.submit(
            signer,
            mailer::encode_claim_owner_share(),
            OperationDetails::ClaimOwnerShare,
        )
        .await
    }

    async fn get_send_fee(&self) -> Result<u128> {
        let fee = mailer::decode_amount(&self.read(mailer::encode_send_fee()).await?)?;
        debug!(chain = %CHAIN, fee, "read send fee");
        Ok(fee)
    }

    async fn get_delegation_fee(&self) -> Result<u128> {
        let fee = mailer::decode_amount(&self.read(mailer::encode_delegation_fee()).await?)?;
        debug!(chain = %CHAIN, fee, "read delegation fee");
        Ok(fee)
    }

    async fn get_delegation(&self, delegator: &str) -> Result<Option<String>> {
        validate_address_for(CHAIN, delegator)?;
        let data = self.read(mailer::encode_delegations(delegator)?).await?;
        let delegate = mailer::decode_delegation(&data)?;
        debug!(chain = %CHAIN, delegator, delegate = ?delegate, "read delegation");
        Ok(delegate)
    }

    async fn get_recipient_claimable(&self, recipient: &str) -> Result<Claimable> {
        validate_address_for(CHAIN, recipient)?;
        let data = self
            .read(mailer::encode_get_recipient_claimable(recipient)?)
            .await?;
        let claimable = mailer::decode_recipient_claimable(&data)?;
        debug!(chain = %CHAIN, recipient, amount = claimable.amount, "read recipient claimable");
        Ok(Claimable {
            amount: claimable.amount,
            expires_at: claimable.expires_at,
            is_expired: claimable.is_expired,
        })
    }

    async fn get_owner_claimable(&self) -> Result<u128> {
        let amount = mailer::decode_amount(&self.read(mailer::encode_get_owner_claimable()).await?)?;
        debug!(chain = %CHAIN, amount, "read owner claimable");
        Ok(amount)
    }
}
