//! Budget-guarded voicemail handling for unattended agents.

use std::env;

use voicemail::tip20::WalletProvider;
use voicemail::{
    ConfigError, Ledger, ProcessResult, TipLedger, TokenAmount, VoicemailApi, VoicemailError,
};
use voicemail_client::{HttpVoicemailApi, VoicemailClient};

use crate::budget::{BudgetGuard, BudgetReceipt};

/// Budget used when `AGENT_BUDGET` is unset: 10 tokens.
pub const DEFAULT_BUDGET: TokenAmount = TokenAmount::from_units(10_000_000);

/// A [`VoicemailClient`] whose paid calls are charged against a [`BudgetGuard`].
pub struct AutonomousAgent<A, L> {
    client: VoicemailClient<A, L>,
    guard: BudgetGuard,
}

impl AutonomousAgent<HttpVoicemailApi, TipLedger<WalletProvider>> {
    /// Build the client from the environment, with the ceiling from `AGENT_BUDGET`
    /// and the per-operation cap from `AGENT_MAX_COST` (defaulting to the ceiling).
    pub fn from_env() -> Result<Self, VoicemailError> {
        let client = VoicemailClient::from_env()?;

        let budget = amount_from_env("AGENT_BUDGET")?.unwrap_or(DEFAULT_BUDGET);
        let max_cost = amount_from_env("AGENT_MAX_COST")?.unwrap_or(budget);

        tracing::info!(
            agent = %client.address(),
            %budget,
            %max_cost,
            "autonomous agent ready"
        );
        Ok(Self::new(client, BudgetGuard::new(budget, max_cost)))
    }
}

impl<A: VoicemailApi, L: Ledger> AutonomousAgent<A, L> {
    pub fn new(client: VoicemailClient<A, L>, guard: BudgetGuard) -> Self {
        Self { client, guard }
    }

    /// An agent with `budget` as both the ceiling and the per-operation cap.
    pub fn with_budget(client: VoicemailClient<A, L>, budget: TokenAmount) -> Self {
        Self::new(client, BudgetGuard::with_budget(budget))
    }

    pub fn client(&self) -> &VoicemailClient<A, L> {
        &self.client
    }

    pub fn guard(&self) -> &BudgetGuard {
        &self.guard
    }

    pub fn spent(&self) -> TokenAmount {
        self.guard.spent()
    }

    pub fn remaining(&self) -> TokenAmount {
        self.guard.remaining()
    }

    /// Submit a voicemail, declaring the current quote as its cost.
    ///
    /// The declared quote is also the most the client will pay, so a
    /// re-quote above it fails with [`VoicemailError::CostExceedsMax`]
    /// instead of overspending. Free-tier results are charged nothing. Paid
    /// results, and failures after a transfer was broadcast, are charged the
    /// declared quote.
    pub async fn handle_voicemail(
        &self,
        audio_url: &str,
        webhook_url: &str,
        priority: bool,
    ) -> Result<BudgetReceipt<ProcessResult>, VoicemailError> {
        let cost = self.client.quote(priority).await?;
        let client = &self.client;

        self.guard
            .execute_metered(cost, move || async move {
                let result = client
                    .process_voicemail_within(audio_url, webhook_url, priority, cost)
                    .await?;
                let charged = if result.payment.is_some() {
                    cost
                } else {
                    TokenAmount::ZERO
                };
                Ok((result, charged))
            })
            .await
    }
}

fn amount_from_env(name: &'static str) -> Result<Option<TokenAmount>, ConfigError> {
    match env::var(name) {
        Ok(s) if !s.is_empty() => TokenAmount::parse(&s)
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: s }),
        _ => Ok(None),
    }
}
