//! The per-chain operation contract and its two implementations.
//!
//! Both adapters validate every input locally before touching the network,
//! submit exactly one transaction per state-changing call and never retry.

mod evm;
mod solana;

pub use evm::EvmMailer;
pub use solana::SolanaMailer;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{ClientError, ProviderError, Result};
use crate::types::{ChainFamily, Claimable, OperationResult};
use crate::wallet::WalletHandle;

#[async_trait]
pub trait MailerAdapter: Send + Sync {
    fn chain_family(&self) -> ChainFamily;

    /// `priority` selects the full-fee path with revenue share to the
    /// sender; otherwise the reduced fee with no share.
    async fn send_message(
        &self,
        wallet: &WalletHandle,
        subject: &str,
        body: &str,
        priority: bool,
        resolve_sender_to_name: bool,
    ) -> Result<OperationResult>;

    async fn send_prepared(
        &self,
        wallet: &WalletHandle,
        mail_id: &str,
        priority: bool,
        resolve_sender_to_name: bool,
    ) -> Result<OperationResult>;

    async fn send_to_email(
        &self,
        wallet: &WalletHandle,
        email: &str,
        subject: &str,
        body: &str,
    ) -> Result<OperationResult>;

    /// `None` clears the delegation.
    async fn delegate_to(
        &self,
        wallet: &WalletHandle,
        delegate: Option<&str>,
    ) -> Result<OperationResult>;

    async fn reject_delegation(
        &self,
        wallet: &WalletHandle,
        delegating_address: &str,
    ) -> Result<OperationResult>;

    async fn claim_recipient_share(&self, wallet: &WalletHandle) -> Result<OperationResult>;

    async fn claim_owner_share(&self, wallet: &WalletHandle) -> Result<OperationResult>;

    async fn get_send_fee(&self) -> Result<u128>;

    async fn get_delegation_fee(&self) -> Result<u128>;

    async fn get_delegation(&self, delegator: &str) -> Result<Option<String>>;

    async fn get_recipient_claimable(&self, recipient: &str) -> Result<Claimable>;

    async fn get_owner_claimable(&self) -> Result<u128>;
}

/// Bounds a provider call and lifts its failure into a chain-prefixed
/// [`ClientError`].
pub(crate) async fn bounded<T, F>(chain: ChainFamily, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ClientError::chain_call(chain, e)),
        Err(_) => {
            let ms = duration_ms(limit);
            warn!(%chain, ms, "rpc call timed out");
            Err(ClientError::Timeout { chain, ms })
        }
    }
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_passes_values_through() {
        let value = bounded(ChainFamily::Evm, Duration::from_secs(1), async {
            Ok::<_, ProviderError>(7)
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn bounded_prefixes_failures() {
        let err = bounded(ChainFamily::Solana, Duration::from_secs(1), async {
            Err::<(), _>(ProviderError::Transport("connection refused".into()))
        })
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "solana operation failed: transport error: connection refused"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_times_out() {
        let err = bounded(
            ChainFamily::Evm,
            Duration::from_millis(10_000),
            std::future::pending::<std::result::Result<(), ProviderError>>(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "evm operation failed: timeout after 10000ms");
    }
}
