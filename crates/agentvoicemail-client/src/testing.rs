//! Scripted [`VoicemailApi`] and [`Ledger`] implementations for tests.
//!
//! Enabled for this crate's own tests and, through the `test-util` feature,
//! for downstream crates.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, TxHash, U256};
use voicemail::{
    ApiErrorBody, Commitment, HealthStatus, JobState, JobStatus, Ledger, LedgerError, PricingInfo,
    PricingResponse, Prices, ProcessRequest, ProcessResult, SubmitOutcome, TokenAmount,
    VoicemailApi, VoicemailError,
};

/// Receiving wallet used by the scripted service.
pub const SERVICE_WALLET: Address = Address::repeat_byte(0xaa);

pub fn amount(s: &str) -> TokenAmount {
    TokenAmount::parse(s).expect("valid test amount")
}

pub fn free_result(remaining_free: u32) -> SubmitOutcome {
    SubmitOutcome::Accepted(ProcessResult {
        job_id: Some("job_free".to_string()),
        status: JobState::Queued,
        free_tier: true,
        remaining_free,
        charged: None,
        payment_verified: false,
        eta: Some("30s".to_string()),
        message: None,
        idempotent: false,
        payment: None,
    })
}

pub fn paid_result() -> SubmitOutcome {
    SubmitOutcome::Accepted(ProcessResult {
        job_id: Some("job_paid".to_string()),
        status: JobState::Queued,
        free_tier: false,
        remaining_free: 0,
        charged: None,
        payment_verified: true,
        eta: Some("30s".to_string()),
        message: None,
        idempotent: false,
        payment: None,
    })
}

pub fn payment_required() -> SubmitOutcome {
    SubmitOutcome::PaymentRequired(ApiErrorBody {
        error: Some("PAYMENT_REQUIRED".to_string()),
        message: Some("Free tier exhausted. Payment required.".to_string()),
    })
}

pub fn job(status: JobState) -> JobStatus {
    JobStatus {
        job_id: Some("job_1".to_string()),
        status,
        result: None,
        error: None,
    }
}

/// Service double that replays scripted responses in order and records submissions.
pub struct ScriptedApi {
    prices: Mutex<VecDeque<TokenAmount>>,
    service_wallet: Option<String>,
    submissions: Mutex<VecDeque<Result<SubmitOutcome, VoicemailError>>>,
    statuses: Mutex<VecDeque<Result<JobStatus, VoicemailError>>>,
    requests: Mutex<Vec<ProcessRequest>>,
    pricing_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl ScriptedApi {
    /// A service quoting `price` per voicemail and advertising [`SERVICE_WALLET`].
    pub fn new(price: &str) -> Self {
        Self {
            prices: Mutex::new(VecDeque::from([amount(price)])),
            service_wallet: Some(SERVICE_WALLET.to_string()),
            submissions: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            pricing_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    /// Quote these prices on successive pricing reads; the last one repeats.
    pub fn with_prices(self, prices: &[&str]) -> Self {
        *self.prices.lock().unwrap() = prices.iter().map(|p| amount(p)).collect();
        self
    }

    pub fn without_service_wallet(mut self) -> Self {
        self.service_wallet = None;
        self
    }

    pub fn then_submit(self, outcome: SubmitOutcome) -> Self {
        self.submissions.lock().unwrap().push_back(Ok(outcome));
        self
    }

    pub fn then_submit_err(self, err: VoicemailError) -> Self {
        self.submissions.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn then_status(self, status: JobStatus) -> Self {
        self.statuses.lock().unwrap().push_back(Ok(status));
        self
    }

    pub fn then_status_err(self, err: VoicemailError) -> Self {
        self.statuses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<ProcessRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn pricing_calls(&self) -> usize {
        self.pricing_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

impl VoicemailApi for ScriptedApi {
    async fn pricing(&self) -> Result<PricingResponse, VoicemailError> {
        self.pricing_calls.fetch_add(1, Ordering::SeqCst);
        let mut prices = self.prices.lock().unwrap();
        let price = if prices.len() > 1 {
            prices.pop_front().unwrap()
        } else {
            *prices.front().unwrap()
        };
        Ok(PricingResponse {
            prices: Prices {
                voicemail: PricingInfo {
                    amount: price,
                    currency: "USDC".to_string(),
                    usd_equiv: price,
                },
            },
            timestamp: None,
            service_wallet: self.service_wallet.clone(),
        })
    }

    async fn health(&self) -> Result<HealthStatus, VoicemailError> {
        Ok(HealthStatus {
            status: Some("operational".to_string()),
            ..HealthStatus::default()
        })
    }

    async fn submit(&self, request: &ProcessRequest) -> Result<SubmitOutcome, VoicemailError> {
        self.requests.lock().unwrap().push(request.clone());
        self.submissions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(VoicemailError::Http("no scripted submission".to_string())))
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobStatus, VoicemailError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(job(JobState::Processing)))
    }
}

/// A transfer the fake ledger was asked to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub to: Address,
    pub amount: U256,
    pub token: Address,
    pub tx: TxHash,
}

#[derive(Debug, Clone, Copy)]
enum ConfirmFailure {
    Reverted,
    Timeout,
}

/// In-memory ledger with a fixed balance that records every transfer.
pub struct FakeLedger {
    balance: Option<TokenAmount>,
    reject_transfer: bool,
    confirm_failure: Option<ConfirmFailure>,
    transfers: Mutex<Vec<Transfer>>,
    confirmations: Mutex<Vec<(TxHash, Commitment)>>,
    balance_calls: AtomicUsize,
}

impl FakeLedger {
    pub fn with_balance(balance: &str) -> Self {
        Self {
            balance: Some(amount(balance)),
            reject_transfer: false,
            confirm_failure: None,
            transfers: Mutex::new(Vec::new()),
            confirmations: Mutex::new(Vec::new()),
            balance_calls: AtomicUsize::new(0),
        }
    }

    /// A ledger whose balance lookups fail.
    pub fn unreachable() -> Self {
        Self {
            balance: None,
            ..Self::with_balance("0")
        }
    }

    pub fn rejecting_transfers(mut self) -> Self {
        self.reject_transfer = true;
        self
    }

    /// Transfers are broadcast but never confirm.
    pub fn failing_confirmation(mut self) -> Self {
        self.confirm_failure = Some(ConfirmFailure::Timeout);
        self
    }

    /// Transfers are mined but revert.
    pub fn reverting(mut self) -> Self {
        self.confirm_failure = Some(ConfirmFailure::Reverted);
        self
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn confirmations(&self) -> Vec<(TxHash, Commitment)> {
        self.confirmations.lock().unwrap().clone()
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

impl Ledger for FakeLedger {
    async fn balance(&self, _owner: Address, _token: Address) -> Result<U256, LedgerError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.balance
            .map(TokenAmount::to_u256)
            .ok_or_else(|| LedgerError::Rpc("connection refused".to_string()))
    }

    async fn submit_transfer(
        &self,
        to: Address,
        amount: U256,
        token: Address,
    ) -> Result<TxHash, LedgerError> {
        if self.reject_transfer {
            return Err(LedgerError::Rpc("insufficient gas".to_string()));
        }
        let mut transfers = self.transfers.lock().unwrap();
        let tx = TxHash::with_last_byte(transfers.len() as u8 + 1);
        transfers.push(Transfer {
            to,
            amount,
            token,
            tx,
        });
        Ok(tx)
    }

    async fn confirm(&self, tx: TxHash, commitment: Commitment) -> Result<(), LedgerError> {
        self.confirmations.lock().unwrap().push((tx, commitment));
        match self.confirm_failure {
            None => Ok(()),
            Some(ConfirmFailure::Reverted) => Err(LedgerError::Reverted(tx)),
            Some(ConfirmFailure::Timeout) => Err(LedgerError::Timeout { tx, secs: 60 }),
        }
    }
}
