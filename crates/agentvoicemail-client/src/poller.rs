//! Job completion polling.

use std::time::Duration;

use tokio::time::Instant;
use voicemail::{JobState, JobStatus, VoicemailApi, VoicemailError};

/// Poll `job_id` until it completes, fails, or `timeout` elapses.
///
/// The deadline is checked before every status query and sleeps are clipped
/// to the time remaining, so no query is issued after the deadline.
pub async fn wait_for_completion<A: VoicemailApi>(
    api: &A,
    job_id: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<JobStatus, VoicemailError> {
    let started = Instant::now();
    let deadline = started + timeout;
    let mut polls: u32 = 0;

    loop {
        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(job_id, polls, "job did not reach a terminal state in time");
            return Err(VoicemailError::JobTimeout {
                job_id: job_id.to_string(),
                elapsed: now - started,
            });
        }

        let status = api.job_status(job_id).await?;
        polls += 1;

        match status.status {
            JobState::Completed => {
                tracing::info!(
                    job_id,
                    polls,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "job completed"
                );
                return Ok(status);
            }
            JobState::Failed => {
                let error = status.error_message();
                tracing::warn!(job_id, %error, "job failed");
                return Err(VoicemailError::JobFailed {
                    job_id: job_id.to_string(),
                    error,
                });
            }
            state => tracing::debug!(job_id, ?state, polls, "job still pending"),
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        tokio::time::sleep(poll_interval.min(remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{job, ScriptedApi};

    const TIMEOUT: Duration = Duration::from_secs(120);
    const INTERVAL: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_returns_completed_payload() {
        let mut done = job(JobState::Completed);
        done.result = Some(serde_json::json!({ "transcription": "call me back" }));
        let api = ScriptedApi::new("0.001")
            .then_status(job(JobState::Queued))
            .then_status(job(JobState::Processing))
            .then_status(done);

        let status = wait_for_completion(&api, "job_1", TIMEOUT, INTERVAL)
            .await
            .unwrap();
        assert_eq!(status.transcription(), Some("call me back"));
        assert_eq!(api.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_raises_service_error() {
        let mut failed = job(JobState::Failed);
        failed.error = Some(serde_json::json!("audio could not be fetched"));
        let api = ScriptedApi::new("0.001").then_status(failed);

        let err = wait_for_completion(&api, "job_1", TIMEOUT, INTERVAL)
            .await
            .unwrap_err();
        match err {
            VoicemailError::JobFailed { job_id, error } => {
                assert_eq!(job_id, "job_1");
                assert_eq!(error, "audio could not be fetched");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_names_job_and_elapsed() {
        // Unscripted statuses stay `processing` forever.
        let api = ScriptedApi::new("0.001");

        let err = wait_for_completion(&api, "job_slow", TIMEOUT, INTERVAL)
            .await
            .unwrap_err();
        match err {
            VoicemailError::JobTimeout { job_id, elapsed } => {
                assert_eq!(job_id, "job_slow");
                assert_eq!(elapsed, TIMEOUT);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Polls at 0s, 5s, ... 115s; none at or after the deadline.
        assert_eq!(api.status_calls(), 24);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_longer_than_timeout_polls_once() {
        let api = ScriptedApi::new("0.001");

        let err = wait_for_completion(
            &api,
            "job_1",
            Duration::from_secs(3),
            Duration::from_secs(10),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "JOB_TIMEOUT");
        assert_eq!(api.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_error_propagates() {
        let api = ScriptedApi::new("0.001").then_status_err(VoicemailError::from_response(
            404,
            serde_json::json!({
                "error": "JOB_NOT_FOUND",
                "message": "Job ID not found or expired"
            }),
        ));

        let err = wait_for_completion(&api, "missing", TIMEOUT, INTERVAL)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "JOB_NOT_FOUND");
    }
}
