use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{
    fillers::{
        BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
    },
    Provider, ProviderBuilder, RootProvider,
};

use crate::config::LedgerConfig;
use crate::identity::Identity;
use crate::ledger::{Commitment, Ledger, LedgerError};
use crate::TIP20;

/// Concrete provider type from `ProviderBuilder::new().wallet(...).connect_http(...)`.
pub type WalletProvider = FillProvider<
    JoinFill<
        JoinFill<
            alloy::providers::Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider,
>;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// [`Ledger`] backed by a TIP-20 token contract.
///
/// Transfers are signed by the provider's wallet filler, so the provider must
/// be built with the paying identity's wallet (see [`TipLedger::connect`]).
pub struct TipLedger<P> {
    provider: P,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl<P> TipLedger<P> {
    pub fn new(provider: P, confirmation_timeout: Duration) -> Self {
        Self {
            provider,
            confirmation_timeout,
            poll_interval: RECEIPT_POLL_INTERVAL,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl TipLedger<WalletProvider> {
    /// Connect to `config.rpc_url`, signing with `identity`.
    pub fn connect(identity: &Identity, config: &LedgerConfig) -> Result<Self, LedgerError> {
        let url = config
            .rpc_url
            .parse()
            .map_err(|e| LedgerError::Rpc(format!("invalid RPC URL '{}': {e}", config.rpc_url)))?;
        let provider = ProviderBuilder::new()
            .wallet(identity.wallet())
            .connect_http(url);
        Ok(Self::new(provider, config.confirmation_timeout))
    }
}

impl<P> Ledger for TipLedger<P>
where
    P: Provider + Send + Sync,
{
    async fn balance(&self, owner: Address, token: Address) -> Result<U256, LedgerError> {
        let contract = TIP20::new(token, &self.provider);
        contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| LedgerError::Rpc(format!("balanceOf failed: {e}")))
    }

    async fn submit_transfer(
        &self,
        to: Address,
        amount: U256,
        token: Address,
    ) -> Result<TxHash, LedgerError> {
        let contract = TIP20::new(token, &self.provider);
        tracing::debug!(%to, %amount, %token, "submitting TIP-20 transfer");
        // An unresponsive RPC must not hang the payment step forever.
        let pending = tokio::time::timeout(SEND_TIMEOUT, contract.transfer(to, amount).send())
            .await
            .map_err(|_| {
                LedgerError::Rpc(format!(
                    "transfer send timed out after {}s",
                    SEND_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| LedgerError::Rpc(format!("transfer send failed: {e}")))?;

        Ok(*pending.tx_hash())
    }

    async fn confirm(&self, tx: TxHash, commitment: Commitment) -> Result<(), LedgerError> {
        let depth = commitment.required_confirmations();
        // RPC errors are retried until the deadline; only a revert is final.
        let wait = async {
            loop {
                match self.provider.get_transaction_receipt(tx).await {
                    Ok(Some(receipt)) => {
                        if !receipt.status() {
                            return Err(LedgerError::Reverted(tx));
                        }
                        if let Some(mined_at) = receipt.block_number {
                            match self.provider.get_block_number().await {
                                Ok(head) => {
                                    let confirmations = head.saturating_sub(mined_at) + 1;
                                    if confirmations >= depth {
                                        return Ok(());
                                    }
                                    tracing::debug!(
                                        %tx,
                                        confirmations,
                                        depth,
                                        "waiting for confirmations"
                                    );
                                }
                                Err(e) => {
                                    tracing::debug!(%tx, error = %e, "block number lookup failed")
                                }
                            }
                        }
                    }
                    Ok(None) => tracing::debug!(%tx, "receipt not available yet"),
                    Err(e) => tracing::debug!(%tx, error = %e, "receipt lookup failed"),
                }

                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::time::timeout(self.confirmation_timeout, wait)
            .await
            .map_err(|_| LedgerError::Timeout {
                tx,
                secs: self.confirmation_timeout.as_secs(),
            })?
    }
}
