//! Ledger collaborator: token balance, signed transfers, and confirmation.
//!
//! The orchestrator only talks to the chain through [`Ledger`]; see
//! [`crate::tip20::TipLedger`] for the on-chain implementation.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, TxHash, U256};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error("transaction {tx} not confirmed within {secs}s")]
    Timeout { tx: TxHash, secs: u64 },
}

/// How final a transfer must be before it is presented as proof.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Commitment {
    /// Included in a block.
    Processed,
    /// Included with one block on top.
    #[default]
    Confirmed,
    /// Buried deep enough that a reorg is not a practical concern.
    Finalized,
}

impl Commitment {
    /// Blocks (including the inclusion block) the receipt must be buried under.
    pub fn required_confirmations(self) -> u64 {
        match self {
            Commitment::Processed => 1,
            Commitment::Confirmed => 2,
            Commitment::Finalized => 6,
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        };
        f.write_str(s)
    }
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(format!("unknown commitment level '{other}'")),
        }
    }
}

/// Chain access needed to pay for a job.
pub trait Ledger: Send + Sync {
    /// Balance of `owner` in `token`, in base units.
    fn balance(
        &self,
        owner: Address,
        token: Address,
    ) -> impl std::future::Future<Output = Result<U256, LedgerError>> + Send;

    /// Build, sign and submit a transfer of `amount` base units of `token` to `to`.
    /// Returns once the node accepted the transaction, before it is confirmed.
    fn submit_transfer(
        &self,
        to: Address,
        amount: U256,
        token: Address,
    ) -> impl std::future::Future<Output = Result<TxHash, LedgerError>> + Send;

    /// Wait until `tx` has succeeded at `commitment`.
    fn confirm(
        &self,
        tx: TxHash,
        commitment: Commitment,
    ) -> impl std::future::Future<Output = Result<(), LedgerError>> + Send;
}
