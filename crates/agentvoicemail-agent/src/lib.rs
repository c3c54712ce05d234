//! Spending controls for agents paying the AgentVoicemail service.
//!
//! Provides a [`BudgetGuard`] that caps per-operation and cumulative spend,
//! and [`AutonomousAgent`], which runs voicemail submissions under one.
//! Depends on `voicemail_client` for the payment flow.

pub mod agent;
pub mod budget;

pub use agent::{AutonomousAgent, DEFAULT_BUDGET};
pub use budget::{BudgetGuard, BudgetReceipt};
