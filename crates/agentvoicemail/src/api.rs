//! The remote service contract.
//!
//! `voicemail_client::HttpVoicemailApi` implements it over HTTP; tests swap in
//! scripted implementations.

use crate::error::VoicemailError;
use crate::types::{
    ApiErrorBody, HealthStatus, JobStatus, PricingResponse, ProcessRequest, ProcessResult,
};

/// Outcome of a submission that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 2xx: the job was accepted.
    Accepted(ProcessResult),
    /// 402: free tier exhausted, or the attached proof was not (yet) accepted.
    PaymentRequired(ApiErrorBody),
}

/// Operations exposed by the AgentVoicemail service.
///
/// Non-2xx responses other than 402 are returned as
/// [`VoicemailError::RequestFailed`] carrying the upstream body.
pub trait VoicemailApi: Send + Sync {
    /// `GET /api/pricing`
    fn pricing(
        &self,
    ) -> impl std::future::Future<Output = Result<PricingResponse, VoicemailError>> + Send;

    /// `GET /api/health`
    fn health(&self)
        -> impl std::future::Future<Output = Result<HealthStatus, VoicemailError>> + Send;

    /// `POST /api/voicemail/process`
    fn submit(
        &self,
        request: &ProcessRequest,
    ) -> impl std::future::Future<Output = Result<SubmitOutcome, VoicemailError>> + Send;

    /// `GET /api/voicemail/status?job_id=...`
    fn job_status(
        &self,
        job_id: &str,
    ) -> impl std::future::Future<Output = Result<JobStatus, VoicemailError>> + Send;
}
