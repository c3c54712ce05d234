//! Pay-on-demand request flow.
//!
//! ```text
//! submit (no proof) ──2xx──▶ free result
//!        │
//!       402
//!        ▼
//! balance check ──short──▶ InsufficientFunds
//!        ▼
//! transfer ──err──▶ PaymentFailed
//!        ▼
//! confirm ──revert──▶ PaymentFailed
//!        │   └─timeout──▶ PaymentUnconfirmed
//!        ▼
//! submit (proof) ×max_retries ──2xx──▶ paid result
//!        │                    └─other──▶ Unreconciled
//!   402 every time
//!        ▼
//! PaymentRejected
//! ```

use std::time::Duration;

use alloy::primitives::Address;
use voicemail::tip20::WalletProvider;
use voicemail::{
    ClientConfig, HealthStatus, Identity, JobStatus, Ledger, LedgerError, PaymentProof,
    PricingInfo, PricingResponse, ProcessRequest, ProcessResult, SubmitOutcome, TipLedger,
    TokenAmount, VoicemailApi, VoicemailError, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT,
};

use crate::http_api::HttpVoicemailApi;
use crate::poller;

/// Client that submits voicemail jobs, paying automatically once the free tier is exhausted.
pub struct VoicemailClient<A, L> {
    api: A,
    ledger: L,
    identity: Identity,
    config: ClientConfig,
}

impl VoicemailClient<HttpVoicemailApi, TipLedger<WalletProvider>> {
    /// Build a client that talks HTTP to `config.endpoint` and pays over `config.ledger.rpc_url`.
    pub fn connect(identity: Identity, config: ClientConfig) -> Result<Self, VoicemailError> {
        let api = HttpVoicemailApi::new(&config.endpoint, config.http_timeout)?;
        let ledger = TipLedger::connect(&identity, &config.ledger)
            .map_err(|e| VoicemailError::Config(e.to_string()))?;
        Ok(Self::new(api, ledger, identity, config))
    }

    /// Load the signing key and settings from the environment.
    pub fn from_env() -> Result<Self, VoicemailError> {
        let identity = Identity::from_env()?;
        let config = ClientConfig::from_env()?;
        Self::connect(identity, config)
    }
}

impl<A: VoicemailApi, L: Ledger> VoicemailClient<A, L> {
    pub fn new(api: A, ledger: L, identity: Identity, config: ClientConfig) -> Self {
        Self {
            api,
            ledger,
            identity,
            config,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The paying address, also sent to the service as `agent_id`.
    pub fn address(&self) -> Address {
        self.identity.address()
    }

    /// Token balance of [`Self::address`]. Lookup failures are reported, never read as zero.
    pub async fn balance(&self) -> Result<TokenAmount, VoicemailError> {
        let units = self
            .ledger
            .balance(self.address(), self.config.ledger.token)
            .await
            .map_err(|e| VoicemailError::BalanceUnavailable(e.to_string()))?;
        Ok(TokenAmount::from_u256_saturating(units))
    }

    pub async fn pricing(&self) -> Result<PricingInfo, VoicemailError> {
        Ok(self.api.pricing().await?.prices.voicemail)
    }

    /// Current price of one voicemail, doubled for priority.
    pub async fn quote(&self, priority: bool) -> Result<TokenAmount, VoicemailError> {
        let pricing = self.pricing().await?;
        quote(&pricing, priority)
    }

    pub async fn health(&self) -> Result<HealthStatus, VoicemailError> {
        self.api.health().await
    }

    pub async fn job_status(&self, job_id: &str) -> Result<JobStatus, VoicemailError> {
        self.api.job_status(job_id).await
    }

    /// Poll a job to completion with the default timeout (120s) and interval (5s).
    pub async fn wait_for_completion(&self, job_id: &str) -> Result<JobStatus, VoicemailError> {
        self.wait_for_completion_with(job_id, DEFAULT_POLL_TIMEOUT, DEFAULT_POLL_INTERVAL)
            .await
    }

    pub async fn wait_for_completion_with(
        &self,
        job_id: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<JobStatus, VoicemailError> {
        poller::wait_for_completion(&self.api, job_id, timeout, poll_interval).await
    }

    /// Submit a voicemail for transcription.
    ///
    /// Tries the free tier first. On `402 Payment Required` it checks the
    /// balance, transfers exactly the quoted price once, waits for
    /// confirmation, and resubmits with the transaction hash as proof.
    ///
    /// Errors raised after the transfer carry the proof (see
    /// [`VoicemailError::payment_sent`]) so the caller can reconcile.
    pub async fn process_voicemail(
        &self,
        audio_url: &str,
        webhook_url: &str,
        priority: bool,
    ) -> Result<ProcessResult, VoicemailError> {
        self.process(audio_url, webhook_url, priority, None).await
    }

    /// Like [`Self::process_voicemail`], but refuses to pay more than `max_price`.
    ///
    /// The price is re-read before paying; a quote above `max_price` fails
    /// with [`VoicemailError::CostExceedsMax`] before the balance check.
    pub async fn process_voicemail_within(
        &self,
        audio_url: &str,
        webhook_url: &str,
        priority: bool,
        max_price: TokenAmount,
    ) -> Result<ProcessResult, VoicemailError> {
        self.process(audio_url, webhook_url, priority, Some(max_price)).await
    }

    async fn process(
        &self,
        audio_url: &str,
        webhook_url: &str,
        priority: bool,
        max_price: Option<TokenAmount>,
    ) -> Result<ProcessResult, VoicemailError> {
        let pricing = self.api.pricing().await?;
        let price = quote(&pricing.prices.voicemail, priority)?;
        tracing::info!(
            %price,
            currency = %pricing.prices.voicemail.currency,
            priority,
            "quoted voicemail price"
        );

        let mut request = ProcessRequest {
            audio_url: audio_url.to_string(),
            webhook_url: webhook_url.to_string(),
            agent_id: self.identity.address_string(),
            priority,
            payment: None,
        };

        let required = match self.api.submit(&request).await? {
            SubmitOutcome::Accepted(result) => {
                tracing::info!(
                    job_id = result.job_id.as_deref().unwrap_or("-"),
                    free_tier = result.free_tier,
                    remaining_free = result.remaining_free,
                    "voicemail accepted without payment"
                );
                return Ok(result);
            }
            SubmitOutcome::PaymentRequired(body) => body,
        };
        tracing::info!(
            reason = required.message.as_deref().unwrap_or("payment required"),
            %price,
            "free tier exhausted, paying"
        );

        if let Some(max) = max_price.filter(|max| price > *max) {
            tracing::warn!(%price, %max, "quoted price above ceiling, not paying");
            return Err(VoicemailError::CostExceedsMax { cost: price, max });
        }
        let pay_to = self.resolve_service_wallet(&pricing)?;
        let proof = self.pay(pay_to, price).await?;

        request.payment = Some(proof.clone());
        self.submit_with_proof(&request, proof).await
    }

    /// Resubmit using a proof from an earlier transfer, without paying again.
    ///
    /// Intended for recovering from [`VoicemailError::Unreconciled`] or
    /// [`VoicemailError::PaymentRejected`].
    pub async fn resubmit_with_proof(
        &self,
        audio_url: &str,
        webhook_url: &str,
        priority: bool,
        proof: PaymentProof,
    ) -> Result<ProcessResult, VoicemailError> {
        let request = ProcessRequest {
            audio_url: audio_url.to_string(),
            webhook_url: webhook_url.to_string(),
            agent_id: self.identity.address_string(),
            priority,
            payment: Some(proof.clone()),
        };
        self.submit_with_proof(&request, proof).await
    }

    fn resolve_service_wallet(
        &self,
        pricing: &PricingResponse,
    ) -> Result<Address, VoicemailError> {
        if let Some(wallet) = self.config.service_wallet {
            return Ok(wallet);
        }
        match pricing.service_wallet.as_deref() {
            Some(s) => s.parse().map_err(|_| {
                VoicemailError::Config(format!("service advertised invalid wallet '{s}'"))
            }),
            None => Err(VoicemailError::Config(
                "no receiving wallet: set SERVICE_WALLET or use a service that advertises one"
                    .to_string(),
            )),
        }
    }

    /// Check funds, then transfer `price` to `pay_to` and wait for confirmation.
    async fn pay(
        &self,
        pay_to: Address,
        price: TokenAmount,
    ) -> Result<PaymentProof, VoicemailError> {
        let ledger_config = &self.config.ledger;

        let balance = self.balance().await?;
        if balance < price {
            tracing::warn!(%balance, %price, "insufficient balance for payment");
            return Err(VoicemailError::InsufficientFunds {
                balance,
                required: price,
            });
        }

        let tx = self
            .ledger
            .submit_transfer(pay_to, price.to_u256(), ledger_config.token)
            .await
            .map_err(|e| VoicemailError::PaymentFailed(e.to_string()))?;
        let tx_hash = tx.to_string();
        tracing::info!(
            tx = %tx_hash,
            to = %pay_to,
            amount = %price,
            explorer = %ledger_config.tx_url(&tx_hash),
            "payment transfer submitted"
        );

        let proof = PaymentProof {
            signature: tx_hash,
            token: ledger_config.token_symbol.clone(),
        };

        match self.ledger.confirm(tx, ledger_config.commitment).await {
            Ok(()) => {
                tracing::info!(
                    tx = %proof.signature,
                    commitment = %ledger_config.commitment,
                    "payment confirmed"
                );
                Ok(proof)
            }
            // A reverted transfer moved no tokens.
            Err(e @ LedgerError::Reverted(_)) => Err(VoicemailError::PaymentFailed(e.to_string())),
            Err(e) => {
                tracing::error!(tx = %proof.signature, error = %e, "payment outcome unknown");
                Err(VoicemailError::PaymentUnconfirmed {
                    proof,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Send `request` (which carries `proof`) until it is accepted or attempts run out.
    async fn submit_with_proof(
        &self,
        request: &ProcessRequest,
        proof: PaymentProof,
    ) -> Result<ProcessResult, VoicemailError> {
        // Money has left the wallet; at least one attempt is always made.
        let attempts = self.config.max_retries.max(1);

        for attempt in 1..=attempts {
            let outcome = match self.api.submit(request).await {
                Ok(outcome) => outcome,
                Err(source) => {
                    tracing::error!(
                        tx = %proof.signature,
                        attempt,
                        error = %source,
                        "paid request failed"
                    );
                    return Err(VoicemailError::Unreconciled {
                        proof,
                        source: Box::new(source),
                    });
                }
            };

            match outcome {
                SubmitOutcome::Accepted(mut result) => {
                    tracing::info!(
                        job_id = result.job_id.as_deref().unwrap_or("-"),
                        tx = %proof.signature,
                        attempt,
                        payment_verified = result.payment_verified,
                        "voicemail accepted with payment"
                    );
                    result.payment = Some(proof);
                    return Ok(result);
                }
                SubmitOutcome::PaymentRequired(body) => {
                    tracing::warn!(
                        tx = %proof.signature,
                        attempt,
                        attempts,
                        reason = body.message.as_deref().unwrap_or("payment required"),
                        "payment not yet accepted"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        Err(VoicemailError::PaymentRejected { proof, attempts })
    }
}

fn quote(pricing: &PricingInfo, priority: bool) -> Result<TokenAmount, VoicemailError> {
    pricing.quote(priority).ok_or_else(|| {
        VoicemailError::Config(format!("quoted price {} overflows", pricing.amount))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        amount, free_result, job, paid_result, payment_required, FakeLedger, ScriptedApi,
        SERVICE_WALLET,
    };
    use alloy::primitives::U256;
    use voicemail::{Commitment, JobState, DEFAULT_TOKEN};

    const AUDIO: &str = "https://example.com/voicemail.mp3";
    const WEBHOOK: &str = "https://my-agent.com/webhook";

    fn config() -> ClientConfig {
        ClientConfig::default()
    }

    fn client(api: ScriptedApi, ledger: FakeLedger) -> VoicemailClient<ScriptedApi, FakeLedger> {
        VoicemailClient::new(api, ledger, Identity::random(), config())
    }

    #[tokio::test(start_paused = true)]
    async fn test_free_tier_accepted_without_payment() {
        let api = ScriptedApi::new("0.001").then_submit(free_result(2));
        let client = client(api, FakeLedger::with_balance("0"));

        let result = client.process_voicemail(AUDIO, WEBHOOK, false).await.unwrap();
        assert!(result.free_tier);
        assert_eq!(result.remaining_free, 2);
        assert!(result.payment.is_none());

        assert_eq!(client.ledger().balance_calls(), 0);
        assert!(client.ledger().transfers().is_empty());
        let requests = client.api().requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].payment.is_none());
        assert_eq!(requests[0].agent_id, client.identity.address_string());
    }

    #[tokio::test(start_paused = true)]
    async fn test_insufficient_funds_stops_before_transfer() {
        let api = ScriptedApi::new("0.001").then_submit(payment_required());
        let client = client(api, FakeLedger::with_balance("0.0005"));

        let err = client
            .process_voicemail(AUDIO, WEBHOOK, false)
            .await
            .unwrap_err();
        match err {
            VoicemailError::InsufficientFunds { balance, required } => {
                assert_eq!(balance, amount("0.0005"));
                assert_eq!(required, amount("0.001"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(client.ledger().transfers().is_empty());
        assert_eq!(client.api().requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pays_once_and_retries_with_proof() {
        let api = ScriptedApi::new("0.001")
            .then_submit(payment_required())
            .then_submit(paid_result());
        let client = client(api, FakeLedger::with_balance("0.01"));

        let result = client.process_voicemail(AUDIO, WEBHOOK, false).await.unwrap();
        assert!(!result.free_tier);
        assert!(result.payment_verified);

        let transfers = client.ledger().transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].to, SERVICE_WALLET);
        assert_eq!(transfers[0].amount, U256::from(1_000u64));
        assert_eq!(transfers[0].token, DEFAULT_TOKEN);

        let proof = result.payment.expect("paid result carries its proof");
        assert_eq!(proof.signature, transfers[0].tx.to_string());
        assert_eq!(proof.token, "USDC");

        let requests = client.api().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].payment.as_ref(), Some(&proof));
        assert_eq!(
            client.ledger().confirmations(),
            vec![(transfers[0].tx, Commitment::Confirmed)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_pays_double() {
        let api = ScriptedApi::new("0.001")
            .then_submit(payment_required())
            .then_submit(paid_result());
        let client = client(api, FakeLedger::with_balance("0.01"));

        client.process_voicemail(AUDIO, WEBHOOK, true).await.unwrap();
        let transfers = client.ledger().transfers();
        assert_eq!(transfers[0].amount, U256::from(2_000u64));
        assert!(client.api().requests().iter().all(|r| r.priority));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_accepted_without_paying_again() {
        let api = ScriptedApi::new("0.001")
            .then_submit(payment_required())
            .then_submit(payment_required())
            .then_submit(paid_result());
        let client = client(api, FakeLedger::with_balance("0.01"));

        let started = tokio::time::Instant::now();
        let result = client.process_voicemail(AUDIO, WEBHOOK, false).await.unwrap();
        assert!(result.payment_verified);
        assert_eq!(client.ledger().transfers().len(), 1);
        assert_eq!(client.api().requests().len(), 3);
        // One retry delay between the two paid attempts.
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_payment_rejected_after_all_attempts() {
        let api = ScriptedApi::new("0.001")
            .then_submit(payment_required())
            .then_submit(payment_required())
            .then_submit(payment_required())
            .then_submit(payment_required());
        let client = client(api, FakeLedger::with_balance("0.01"));

        let started = tokio::time::Instant::now();
        let err = client
            .process_voicemail(AUDIO, WEBHOOK, false)
            .await
            .unwrap_err();
        match &err {
            VoicemailError::PaymentRejected { attempts, .. } => assert_eq!(*attempts, 3),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.payment_sent().is_some());
        assert_eq!(client.ledger().transfers().len(), 1);
        assert_eq!(client.api().requests().len(), 4);
        // No sleep after the final attempt.
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_after_payment_is_unreconciled() {
        let api = ScriptedApi::new("0.001")
            .then_submit(payment_required())
            .then_submit_err(VoicemailError::from_response(
                500,
                serde_json::json!({ "error": "INTERNAL_ERROR", "message": "boom" }),
            ));
        let client = client(api, FakeLedger::with_balance("0.01"));

        let err = client
            .process_voicemail(AUDIO, WEBHOOK, false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PAYMENT_UNRECONCILED");
        let proof = err.payment_sent().expect("proof attached");
        assert_eq!(proof.signature, client.ledger().transfers()[0].tx.to_string());
        match err {
            VoicemailError::Unreconciled { source, .. } => {
                assert_eq!(source.code(), "INTERNAL_ERROR")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_error_before_payment_is_request_failed() {
        let api = ScriptedApi::new("0.001").then_submit_err(VoicemailError::from_response(
            429,
            serde_json::json!({ "error": "RATE_LIMITED", "message": "Too many requests" }),
        ));
        let client = client(api, FakeLedger::with_balance("0.01"));

        let err = client
            .process_voicemail(AUDIO, WEBHOOK, false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "RATE_LIMITED");
        assert!(err.payment_sent().is_none());
        assert_eq!(client.ledger().balance_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_balance_lookup_failure_is_not_zero() {
        let api = ScriptedApi::new("0.001").then_submit(payment_required());
        let client = client(api, FakeLedger::unreachable());

        let err = client
            .process_voicemail(AUDIO, WEBHOOK, false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BALANCE_UNAVAILABLE");
        assert!(client.ledger().transfers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_transfer_is_payment_failed() {
        let api = ScriptedApi::new("0.001").then_submit(payment_required());
        let client = client(api, FakeLedger::with_balance("0.01").rejecting_transfers());

        let err = client
            .process_voicemail(AUDIO, WEBHOOK, false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PAYMENT_FAILED");
        assert!(err.payment_sent().is_none());
        assert_eq!(client.api().requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverted_transfer_is_payment_failed() {
        let api = ScriptedApi::new("0.001").then_submit(payment_required());
        let client = client(api, FakeLedger::with_balance("0.01").reverting());

        let err = client
            .process_voicemail(AUDIO, WEBHOOK, false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PAYMENT_FAILED");
        assert!(err.payment_sent().is_none());
        let tx = client.ledger().transfers()[0].tx;
        assert!(err.to_string().contains(&tx.to_string()));
        assert_eq!(client.api().requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_transfer_carries_proof() {
        let api = ScriptedApi::new("0.001").then_submit(payment_required());
        let client = client(api, FakeLedger::with_balance("0.01").failing_confirmation());

        let err = client
            .process_voicemail(AUDIO, WEBHOOK, false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PAYMENT_UNCONFIRMED");
        let tx = client.ledger().transfers()[0].tx;
        let proof = err.payment_sent().expect("broadcast transfer is reported");
        assert_eq!(proof.signature, tx.to_string());
        // No paid resubmission without a confirmed transfer.
        assert_eq!(client.api().requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_price_ceiling_blocks_requote() {
        let api = ScriptedApi::new("0.5").then_submit(payment_required());
        let client = client(api, FakeLedger::with_balance("1"));

        let err = client
            .process_voicemail_within(AUDIO, WEBHOOK, false, amount("0.25"))
            .await
            .unwrap_err();
        match err {
            VoicemailError::CostExceedsMax { cost, max } => {
                assert_eq!(cost, amount("0.5"));
                assert_eq!(max, amount("0.25"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.ledger().balance_calls(), 0);
        assert!(client.ledger().transfers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_price_ceiling_allows_free_tier_and_cheaper_quote() {
        let api = ScriptedApi::new("0.25")
            .with_prices(&["0.5", "0.2"])
            .then_submit(free_result(1))
            .then_submit(payment_required())
            .then_submit(paid_result());
        let client = client(api, FakeLedger::with_balance("1"));

        let free = client
            .process_voicemail_within(AUDIO, WEBHOOK, false, amount("0.25"))
            .await
            .unwrap();
        assert!(free.free_tier);

        client
            .process_voicemail_within(AUDIO, WEBHOOK, false, amount("0.25"))
            .await
            .unwrap();
        assert_eq!(client.ledger().transfers()[0].amount, U256::from(200_000u64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_service_wallet_fails_before_transfer() {
        let api = ScriptedApi::new("0.001")
            .without_service_wallet()
            .then_submit(payment_required());
        let client = client(api, FakeLedger::with_balance("0.01"));

        let err = client
            .process_voicemail(AUDIO, WEBHOOK, false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
        assert!(client.ledger().transfers().is_empty());
        assert_eq!(client.ledger().balance_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_service_wallet_wins() {
        let override_wallet = Address::repeat_byte(0x42);
        let api = ScriptedApi::new("0.001")
            .then_submit(payment_required())
            .then_submit(paid_result());
        let client = VoicemailClient::new(
            api,
            FakeLedger::with_balance("0.01"),
            Identity::random(),
            config().with_service_wallet(override_wallet),
        );

        client.process_voicemail(AUDIO, WEBHOOK, false).await.unwrap();
        assert_eq!(client.ledger().transfers()[0].to, override_wallet);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pricing_fetched_fresh_each_invocation() {
        let api = ScriptedApi::new("0.001")
            .with_prices(&["0.001", "0.003"])
            .then_submit(payment_required())
            .then_submit(paid_result())
            .then_submit(payment_required())
            .then_submit(paid_result());
        let client = client(api, FakeLedger::with_balance("1"));

        client.process_voicemail(AUDIO, WEBHOOK, false).await.unwrap();
        client.process_voicemail(AUDIO, WEBHOOK, false).await.unwrap();

        let amounts: Vec<U256> = client
            .ledger()
            .transfers()
            .iter()
            .map(|t| t.amount)
            .collect();
        assert_eq!(amounts, vec![U256::from(1_000u64), U256::from(3_000u64)]);
        assert_eq!(client.api().pricing_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_still_submits_proof_once() {
        let api = ScriptedApi::new("0.001")
            .then_submit(payment_required())
            .then_submit(payment_required());
        let client = VoicemailClient::new(
            api,
            FakeLedger::with_balance("0.01"),
            Identity::random(),
            config().with_retry_policy(0, Duration::from_secs(2)),
        );

        let err = client
            .process_voicemail(AUDIO, WEBHOOK, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VoicemailError::PaymentRejected { attempts: 1, .. }
        ));
        assert_eq!(client.api().requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubmit_reuses_proof() {
        let api = ScriptedApi::new("0.001").then_submit(paid_result());
        let client = client(api, FakeLedger::with_balance("0"));
        let proof = PaymentProof {
            signature: "0xfeed".to_string(),
            token: "USDC".to_string(),
        };

        let result = client
            .resubmit_with_proof(AUDIO, WEBHOOK, false, proof.clone())
            .await
            .unwrap();
        assert_eq!(result.payment, Some(proof));
        assert!(client.ledger().transfers().is_empty());
        assert_eq!(client.api().pricing_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_convenience_reads() {
        let api = ScriptedApi::new("0.25").then_status(job(JobState::Completed));
        let client = client(api, FakeLedger::with_balance("1.5"));

        assert_eq!(client.quote(false).await.unwrap(), amount("0.25"));
        assert_eq!(client.quote(true).await.unwrap(), amount("0.5"));
        assert_eq!(client.balance().await.unwrap(), amount("1.5"));
        assert!(client.health().await.unwrap().is_operational());
        let status = client.wait_for_completion("job_1").await.unwrap();
        assert_eq!(status.status, JobState::Completed);
    }

    #[tokio::test]
    async fn test_balance_unavailable() {
        let client = client(ScriptedApi::new("0.001"), FakeLedger::unreachable());
        assert!(matches!(
            client.balance().await,
            Err(VoicemailError::BalanceUnavailable(_))
        ));
    }
}
