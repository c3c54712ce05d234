use std::time::Duration;

use serde::de::DeserializeOwned;
use voicemail::{
    ApiErrorBody, HealthStatus, JobStatus, PricingResponse, ProcessRequest, ProcessResult,
    SubmitOutcome, VoicemailApi, VoicemailError, HEALTH_PATH, PRICING_PATH, PROCESS_PATH,
    STATUS_PATH,
};

/// [`VoicemailApi`] over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpVoicemailApi {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpVoicemailApi {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, VoicemailError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| VoicemailError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_http_client(endpoint, http))
    }

    /// Create an API client with a custom reqwest::Client.
    pub fn with_http_client(endpoint: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, VoicemailError> {
        let resp = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| VoicemailError::Http(format!("GET {path} failed: {e}")))?;

        let status = resp.status();
        let body = read_body(resp, path).await?;
        if !status.is_success() {
            return Err(VoicemailError::from_response(status.as_u16(), body));
        }
        Ok(serde_json::from_value(body)?)
    }
}

/// Read a response body as JSON, keeping non-JSON bodies as a string value.
async fn read_body(
    resp: reqwest::Response,
    path: &str,
) -> Result<serde_json::Value, VoicemailError> {
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| VoicemailError::Http(format!("reading {path} response failed: {e}")))?;
    if bytes.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
    }))
}

impl VoicemailApi for HttpVoicemailApi {
    async fn pricing(&self) -> Result<PricingResponse, VoicemailError> {
        self.get_json(PRICING_PATH, &[]).await
    }

    async fn health(&self) -> Result<HealthStatus, VoicemailError> {
        self.get_json(HEALTH_PATH, &[]).await
    }

    async fn submit(&self, request: &ProcessRequest) -> Result<SubmitOutcome, VoicemailError> {
        let resp = self
            .http
            .post(self.url(PROCESS_PATH))
            .json(request)
            .send()
            .await
            .map_err(|e| VoicemailError::Http(format!("POST {PROCESS_PATH} failed: {e}")))?;

        let status = resp.status();
        let body = read_body(resp, PROCESS_PATH).await?;

        if status == reqwest::StatusCode::PAYMENT_REQUIRED {
            let details: ApiErrorBody = serde_json::from_value(body).unwrap_or_default();
            return Ok(SubmitOutcome::PaymentRequired(details));
        }
        if !status.is_success() {
            return Err(VoicemailError::from_response(status.as_u16(), body));
        }

        let result: ProcessResult = serde_json::from_value(body)?;
        Ok(SubmitOutcome::Accepted(result))
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, VoicemailError> {
        self.get_json(STATUS_PATH, &[("job_id", job_id)]).await
    }
}
