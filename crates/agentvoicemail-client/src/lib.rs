//! AgentVoicemail client for autonomous agents.
//!
//! Submits voicemail transcription jobs and pays for them on demand: the free
//! tier is tried first, and on `402 Payment Required` the client transfers the
//! quoted price and retries with the transaction hash as proof.
//!
//! # Quick Example
//!
//! ```no_run
//! use voicemail_client::VoicemailClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), voicemail_client::VoicemailError> {
//! let client = VoicemailClient::from_env()?;
//!
//! let result = client
//!     .process_voicemail(
//!         "https://example.com/voicemail.mp3",
//!         "https://my-agent.com/webhook",
//!         false,
//!     )
//!     .await?;
//!
//! if let Some(job_id) = result.job_id.as_deref() {
//!     let done = client.wait_for_completion(job_id).await?;
//!     println!("{:?}", done.transcription());
//! }
//! # Ok(())
//! # }
//! ```

mod http_api;
mod orchestrator;
pub mod poller;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use http_api::HttpVoicemailApi;
pub use orchestrator::VoicemailClient;
pub use poller::wait_for_completion;

// Re-export commonly needed types from core
pub use voicemail::{
    ClientConfig, Commitment, Identity, JobState, JobStatus, Ledger, LedgerConfig, PaymentProof,
    PricingInfo, ProcessResult, TipLedger, TokenAmount, VoicemailApi, VoicemailError,
};
