use std::time::Duration;

use thiserror::Error;

use crate::amount::TokenAmount;
use crate::types::PaymentProof;

/// Errors returned by AgentVoicemail operations.
///
/// Each variant is a distinct failure kind; [`VoicemailError::code`] gives the
/// stable string form agents can log or match on.
#[derive(Debug, Error)]
pub enum VoicemailError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientFunds {
        balance: TokenAmount,
        required: TokenAmount,
    },

    #[error("balance lookup failed: {0}")]
    BalanceUnavailable(String),

    #[error("payment failed: {0}")]
    PaymentFailed(String),

    /// The transfer was broadcast but never confirmed; it may still land.
    #[error("payment {} submitted but not confirmed: {reason}", .proof.signature)]
    PaymentUnconfirmed { proof: PaymentProof, reason: String },

    #[error("payment {} not accepted after {attempts} attempts", .proof.signature)]
    PaymentRejected { proof: PaymentProof, attempts: u32 },

    #[error(
        "request failed ({status}): {} - {}",
        .error.as_deref().unwrap_or("UNKNOWN"),
        .message.as_deref().unwrap_or("")
    )]
    RequestFailed {
        status: u16,
        error: Option<String>,
        message: Option<String>,
        /// Upstream body, verbatim.
        body: serde_json::Value,
    },

    #[error("job {job_id} failed: {error}")]
    JobFailed { job_id: String, error: String },

    #[error("job {job_id} did not complete within {}s", .elapsed.as_secs_f64())]
    JobTimeout { job_id: String, elapsed: Duration },

    #[error("budget exceeded: spent {spent} of {budget}, need {required}")]
    BudgetExceeded {
        budget: TokenAmount,
        spent: TokenAmount,
        required: TokenAmount,
    },

    #[error("cost {cost} exceeds per-operation maximum {max}")]
    CostExceedsMax { cost: TokenAmount, max: TokenAmount },

    #[error("payment {} sent but request did not complete: {source}", .proof.signature)]
    Unreconciled {
        proof: PaymentProof,
        #[source]
        source: Box<VoicemailError>,
    },

    #[error("http error: {0}")]
    Http(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl VoicemailError {
    /// Stable machine-readable kind. Upstream failures keep the service's own code.
    pub fn code(&self) -> &str {
        match self {
            VoicemailError::Config(_) => "CONFIGURATION_ERROR",
            VoicemailError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            VoicemailError::BalanceUnavailable(_) => "BALANCE_UNAVAILABLE",
            VoicemailError::PaymentFailed(_) => "PAYMENT_FAILED",
            VoicemailError::PaymentUnconfirmed { .. } => "PAYMENT_UNCONFIRMED",
            VoicemailError::PaymentRejected { .. } => "PAYMENT_REJECTED",
            VoicemailError::RequestFailed { error, .. } => {
                error.as_deref().unwrap_or("REQUEST_FAILED")
            }
            VoicemailError::JobFailed { .. } => "JOB_FAILED",
            VoicemailError::JobTimeout { .. } => "JOB_TIMEOUT",
            VoicemailError::BudgetExceeded { .. } => "BUDGET_EXCEEDED",
            VoicemailError::CostExceedsMax { .. } => "COST_EXCEEDS_MAX",
            VoicemailError::Unreconciled { .. } => "PAYMENT_UNRECONCILED",
            VoicemailError::Http(_) => "HTTP_ERROR",
            VoicemailError::Serde(_) => "SERIALIZATION_ERROR",
        }
    }

    /// The transfer made before this failure, if money already left the wallet.
    pub fn payment_sent(&self) -> Option<&PaymentProof> {
        match self {
            VoicemailError::PaymentUnconfirmed { proof, .. }
            | VoicemailError::PaymentRejected { proof, .. }
            | VoicemailError::Unreconciled { proof, .. } => Some(proof),
            _ => None,
        }
    }

    /// Build a `RequestFailed` from a non-2xx status and its raw body.
    pub fn from_response(status: u16, body: serde_json::Value) -> Self {
        let field = |name: &str| body.get(name).and_then(|v| v.as_str()).map(str::to_string);
        VoicemailError::RequestFailed {
            status,
            error: field("error"),
            message: field("message"),
            body,
        }
    }
}

impl From<crate::config::ConfigError> for VoicemailError {
    fn from(e: crate::config::ConfigError) -> Self {
        VoicemailError::Config(e.to_string())
    }
}

impl From<crate::identity::IdentityError> for VoicemailError {
    fn from(e: crate::identity::IdentityError) -> Self {
        VoicemailError::Config(e.to_string())
    }
}
