//! Pay-on-demand client core for the AgentVoicemail transcription service.
//!
//! Agents get a small free allowance of voicemail jobs. Once it runs out the
//! service answers `402 Payment Required`; the agent then transfers the quoted
//! price in a TIP-20 (ERC-20 compatible) token and retries with the transfer
//! hash as proof of payment.
//!
//! This crate holds the pieces shared by the client and agent crates:
//!
//! - [`TokenAmount`]: integer base-unit amounts, no floating point
//! - [`Identity`]: signing key and derived address
//! - [`Ledger`] / [`TipLedger`]: balance, transfer and confirmation
//! - [`VoicemailApi`]: the remote service contract
//! - [`VoicemailError`]: the closed set of failure kinds callers branch on

// Core types
pub mod amount;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Collaborators
pub mod api;
pub mod identity;
pub mod ledger;
pub mod tip20;

use alloy::sol;

// TIP-20 (ERC-20 compatible) contract interface used for payments.
sol! {
    #[sol(rpc)]
    interface TIP20 {
        function balanceOf(address owner) external view returns (uint256);
        function transfer(address to, uint256 value) external returns (bool);
    }
}

// Re-exports
pub use amount::TokenAmount;
pub use api::{SubmitOutcome, VoicemailApi};
pub use config::{ClientConfig, ConfigError, LedgerConfig};
pub use constants::*;
pub use error::VoicemailError;
pub use identity::{Identity, IdentityError};
pub use ledger::{Commitment, Ledger, LedgerError};
pub use tip20::TipLedger;
pub use types::*;
