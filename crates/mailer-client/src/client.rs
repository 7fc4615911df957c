//! The dispatch façades.
//!
//! [`MailerClient`] is stateless: every call names its chain and carries
//! its wallet. [`WalletMailerClient`] binds one wallet, detects its chain
//! once and forwards to a [`MailerClient`].

use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::adapter::{EvmMailer, MailerAdapter, SolanaMailer};
use crate::config::{ClientOptions, MailerConfig};
use crate::error::{ClientError, Result};
use crate::rpc::{ChainConnector, HttpConnector};
use crate::types::{ChainFamily, Claimable, OperationResult};
use crate::wallet::WalletHandle;

/// Routes each call to the adapter of the chain it names.
///
/// Adapters are built on first use and then reused for the client's
/// lifetime.
pub struct MailerClient {
    config: MailerConfig,
    options: ClientOptions,
    connector: Arc<dyn ChainConnector>,
    evm: OnceCell<Arc<dyn MailerAdapter>>,
    solana: OnceCell<Arc<dyn MailerAdapter>>,
}

impl MailerClient {
    /// Validates `config` and connects over HTTP JSON-RPC.
    pub fn new(config: MailerConfig) -> Result<Self> {
        Self::with_options(config, ClientOptions::default())
    }

    pub fn with_options(config: MailerConfig, options: ClientOptions) -> Result<Self> {
        Self::with_connector(config, options, Arc::new(HttpConnector::new()))
    }

    pub fn with_connector(
        config: MailerConfig,
        options: ClientOptions,
        connector: Arc<dyn ChainConnector>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            options,
            connector,
            evm: OnceCell::new(),
            solana: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &MailerConfig {
        &self.config
    }

    pub fn is_configured(&self, chain: ChainFamily) -> bool {
        match chain {
            ChainFamily::Evm => self.config.evm.is_some(),
            ChainFamily::Solana => self.config.solana.is_some(),
        }
    }

    /// The adapter for `chain`, built on first request.
    pub async fn adapter(&self, chain: ChainFamily) -> Result<Arc<dyn MailerAdapter>> {
        let adapter = match chain {
            ChainFamily::Evm => {
                let config = self
                    .config
                    .evm
                    .as_ref()
                    .ok_or(ClientError::ConfigurationMissing(ChainFamily::Evm))?;
                self.evm
                    .get_or_try_init(|| async {
                        let provider = self.connector.evm_provider(config)?;
                        let adapter: Arc<dyn MailerAdapter> =
                            Arc::new(EvmMailer::new(config, provider, self.options.clone()));
                        Ok::<_, ClientError>(adapter)
                    })
                    .await?
            }
            ChainFamily::Solana => {
                let config = self
                    .config
                    .solana
                    .as_ref()
                    .ok_or(ClientError::ConfigurationMissing(ChainFamily::Solana))?;
                self.solana
                    .get_or_try_init(|| async {
                        let connection = self.connector.solana_connection(config)?;
                        let adapter: Arc<dyn MailerAdapter> = Arc::new(SolanaMailer::new(
                            config,
                            connection,
                            self.options.clone(),
                        )?);
                        Ok::<_, ClientError>(adapter)
                    })
                    .await?
            }
        };
        Ok(Arc::clone(adapter))
    }

    pub async fn send_message(
        &self,
        wallet: &WalletHandle,
        chain: ChainFamily,
        subject: &str,
        body: &str,
        priority: bool,
        resolve_sender_to_name: bool,
    ) -> Result<OperationResult> {
        debug!(%chain, priority, "dispatch send_message");
        self.adapter(chain)
            .await?
            .send_message(wallet, subject, body, priority, resolve_sender_to_name)
            .await
    }

    pub async fn send_prepared(
        &self,
        wallet: &WalletHandle,
        chain: ChainFamily,
        mail_id: &str,
        priority: bool,
        resolve_sender_to_name: bool,
    ) -> Result<OperationResult> {
        self.adapter(chain)
            .await?
            .send_prepared(wallet, mail_id, priority, resolve_sender_to_name)
            .await
    }

    pub async fn send_to_email(
        &self,
        wallet: &WalletHandle,
        chain: ChainFamily,
        email: &str,
        subject: &str,
        body: &str,
    ) -> Result<OperationResult> {
        self.adapter(chain)
            .await?
            .send_to_email(wallet, email, subject, body)
            .await
    }

    pub async fn delegate_to(
        &self,
        wallet: &WalletHandle,
        chain: ChainFamily,
        delegate: &str,
    ) -> Result<OperationResult> {
        self.adapter(chain)
            .await?
            .delegate_to(wallet, Some(delegate))
            .await
    }

    pub async fn clear_delegation(
        &self,
        wallet: &WalletHandle,
        chain: ChainFamily,
    ) -> Result<OperationResult> {
        self.adapter(chain).await?.delegate_to(wallet, None).await
    }

    pub async fn reject_delegation(
        &self,
        wallet: &WalletHandle,
        chain: ChainFamily,
        delegating_address: &str,
    ) -> Result<OperationResult> {
        self.adapter(chain)
            .await?
            .reject_delegation(wallet, delegating_address)
            .await
    }

    /// Claims the wallet's recipient revenue share.
    pub async fn claim_revenue(
        &self,
        wallet: &WalletHandle,
        chain: ChainFamily,
    ) -> Result<OperationResult> {
        self.adapter(chain)
            .await?
            .claim_recipient_share(wallet)
            .await
    }

    pub async fn claim_owner_share(
        &self,
        wallet: &WalletHandle,
        chain: ChainFamily,
    ) -> Result<OperationResult> {
        self.adapter(chain).await?.claim_owner_share(wallet).await
    }

    pub async fn get_send_fee(&self, chain: ChainFamily) -> Result<u128> {
        self.adapter(chain).await?.get_send_fee().await
    }

    pub async fn get_delegation_fee(&self, chain: ChainFamily) -> Result<u128> {
        self.adapter(chain).await?.get_delegation_fee().await
    }

    pub async fn get_delegation(
        &self,
        chain: ChainFamily,
        delegator: &str,
    ) -> Result<Option<String>> {
        self.adapter(chain).await?.get_delegation(delegator).await
    }

    pub async fn get_claimable(&self, chain: ChainFamily, recipient: &str) -> Result<Claimable> {
        self.adapter(chain)
            .await?
            .get_recipient_claimable(recipient)
            .await
    }

    pub async fn get_owner_claimable(&self, chain: ChainFamily) -> Result<u128> {
        self.adapter(chain).await?.get_owner_claimable().await
    }
}

impl fmt::Debug for MailerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailerClient")
            .field("config", &self.config)
            .field("options", &self.options)
            .field("evm_ready", &self.evm.initialized())
            .field("solana_ready", &self.solana.initialized())
            .finish_non_exhaustive()
    }
}

/// A client bound to one wallet. The chain is detected once, at
/// construction.
#[derive(Debug)]
pub struct WalletMailerClient {
    wallet: WalletHandle,
    chain: ChainFamily,
    inner: MailerClient,
}

impl WalletMailerClient {
    pub fn new(wallet: WalletHandle, config: MailerConfig) -> Result<Self> {
        Self::from_client(wallet, MailerClient::new(config)?)
    }

    /// Binds `wallet` to an existing client. Fails if the wallet's
    /// structure matches no chain or disagrees with its variant.
    pub fn from_client(wallet: WalletHandle, client: MailerClient) -> Result<Self> {
        let chain = wallet.detect()?;
        debug!(%chain, address = %wallet.address(), "wallet bound");
        Ok(Self {
            wallet,
            chain,
            inner: client,
        })
    }

    pub fn chain_type(&self) -> ChainFamily {
        self.chain
    }

    pub fn wallet(&self) -> &WalletHandle {
        &self.wallet
    }

    pub fn address(&self) -> String {
        self.wallet.address()
    }

    pub fn client(&self) -> &MailerClient {
        &self.inner
    }

    pub async fn send_message(
        &self,
        subject: &str,
        body: &str,
        priority: bool,
        resolve_sender_to_name: bool,
    ) -> Result<OperationResult> {
        self.inner
            .send_message(
                &self.wallet,
                self.chain,
                subject,
                body,
                priority,
                resolve_sender_to_name,
            )
            .await
    }

    pub async fn send_prepared(
        &self,
        mail_id: &str,
        priority: bool,
        resolve_sender_to_name: bool,
    ) -> Result<OperationResult> {
        self.inner
            .send_prepared(
                &self.wallet,
                self.chain,
                mail_id,
                priority,
                resolve_sender_to_name,
            )
            .await
    }

    pub async fn send_to_email(
        &self,
        email: &str,
        subject: &str,
        body: &str,
    ) -> Result<OperationResult> {
        self.inner
            .send_to_email(&self.wallet, self.chain, email, subject, body)
            .await
    }

    pub async fn delegate_to(&self, delegate: &str) -> Result<OperationResult> {
        self.inner
            .delegate_to(&self.wallet, self.chain, delegate)
            .await
    }

    pub async fn clear_delegation(&self) -> Result<OperationResult> {
        self.inner.clear_delegation(&self.wallet, self.chain).await
    }

    pub async fn reject_delegation(&self, delegating_address: &str) -> Result<OperationResult> {
        self.inner
            .reject_delegation(&self.wallet, self.chain, delegating_address)
            .await
    }

    pub async fn claim_revenue(&self) -> Result<OperationResult> {
        self.inner.claim_revenue(&self.wallet, self.chain).await
    }

    pub async fn claim_owner_share(&self) -> Result<OperationResult> {
        self.inner.claim_owner_share(&self.wallet, self.chain).await
    }

    pub async fn get_send_fee(&self) -> Result<u128> {
        self.inner.get_send_fee(self.chain).await
    }

    pub async fn get_delegation_fee(&self) -> Result<u128> {
        self.inner.get_delegation_fee(self.chain).await
    }

    /// The bound wallet's current delegate.
    pub async fn get_delegation(&self) -> Result<Option<String>> {
        self.inner
            .get_delegation(self.chain, &self.wallet.address())
            .await
    }

    /// Revenue share owed to the bound wallet.
    pub async fn get_claimable(&self) -> Result<Claimable> {
        self.inner
            .get_claimable(self.chain, &self.wallet.address())
            .await
    }

    pub async fn get_owner_claimable(&self) -> Result<u128> {
        self.inner.get_owner_claimable(self.chain).await
    }
}
