use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::constants::PRIORITY_MULTIPLIER;

/// Unit price for one service operation, as published by `GET /api/pricing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingInfo {
    pub amount: TokenAmount,
    pub currency: String,
    #[serde(default)]
    pub usd_equiv: TokenAmount,
}

impl PricingInfo {
    /// Price for one voicemail, doubled for priority processing.
    pub fn quote(&self, priority: bool) -> Option<TokenAmount> {
        let multiplier = if priority { PRIORITY_MULTIPLIER } else { 1 };
        self.amount.checked_mul(multiplier)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prices {
    pub voicemail: PricingInfo,
}

/// Body of `GET /api/pricing`. Only the fields the client acts on are typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingResponse {
    pub prices: Prices,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<serde_json::Value>,
    /// Receiving wallet advertised by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_wallet: Option<String>,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl HealthStatus {
    pub fn is_operational(&self) -> bool {
        self.status.as_deref() == Some("operational")
    }
}

/// Evidence of a confirmed transfer, attached to paid requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProof {
    /// Transaction hash of the confirmed transfer.
    pub signature: String,
    /// Token label, e.g. `USDC`.
    pub token: String,
}

/// Body of `POST /api/voicemail/process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub audio_url: String,
    pub webhook_url: String,
    pub agent_id: String,
    pub priority: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentProof>,
}

/// Lifecycle state of a voicemail job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// What the service charged for a paid job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    pub amount: TokenAmount,
    pub currency: String,
    #[serde(default)]
    pub usd_equiv: TokenAmount,
}

/// Accepted-submission response of `POST /api/voicemail/process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: JobState,
    #[serde(default)]
    pub free_tier: bool,
    #[serde(default)]
    pub remaining_free: u32,
    #[serde(default)]
    pub charged: Option<Charge>,
    #[serde(default)]
    pub payment_verified: bool,
    #[serde(default)]
    pub eta: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Set when the service replayed a cached response for a duplicate submission.
    #[serde(default)]
    pub idempotent: bool,
    /// Proof the client attached to obtain this result, if it paid.
    #[serde(skip)]
    pub payment: Option<PaymentProof>,
}

/// Body of `GET /api/voicemail/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default, alias = "jobId")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: JobState,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl JobStatus {
    /// Service-reported failure reason, flattened to text.
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "no error reported".to_string(),
        }
    }

    pub fn transcription(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|r| r.get("transcription"))
            .and_then(|t| t.as_str())
    }
}

/// `{ error, message }` body of 402 and other non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
