//! Spending ceiling for paid operations.
//!
//! A [`BudgetGuard`] holds a total budget and a per-operation cap. Each
//! operation declares its cost up front; the cost is reserved while the
//! operation runs and committed to `spent` when it finishes.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use voicemail::{TokenAmount, VoicemailError};

/// Outcome of an operation run under a [`BudgetGuard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetReceipt<T> {
    pub value: T,
    /// Amount committed for this operation.
    pub charged: TokenAmount,
    /// Cumulative spend after this operation.
    pub total_spent: TokenAmount,
}

#[derive(Debug, Default)]
struct Counters {
    spent: TokenAmount,
    /// Declared costs of operations currently running.
    reserved: TokenAmount,
}

/// Enforces a spending ceiling and a per-operation cap across many operations.
///
/// Safe to share between tasks: the check and reservation happen under one
/// lock, so concurrent operations cannot jointly overshoot the ceiling.
#[derive(Debug)]
pub struct BudgetGuard {
    budget: TokenAmount,
    max_per_operation: TokenAmount,
    counters: Mutex<Counters>,
}

impl BudgetGuard {
    pub fn new(budget: TokenAmount, max_per_operation: TokenAmount) -> Self {
        Self {
            budget,
            max_per_operation,
            counters: Mutex::new(Counters::default()),
        }
    }

    /// A guard whose per-operation cap equals the whole budget.
    pub fn with_budget(budget: TokenAmount) -> Self {
        Self::new(budget, budget)
    }

    pub fn budget(&self) -> TokenAmount {
        self.budget
    }

    pub fn max_per_operation(&self) -> TokenAmount {
        self.max_per_operation
    }

    /// Committed spend; excludes operations still running.
    pub fn spent(&self) -> TokenAmount {
        self.lock().spent
    }

    pub fn remaining(&self) -> TokenAmount {
        self.budget.saturating_sub(self.spent())
    }

    /// Run `operation` if `declared_cost` fits, charging the full declared cost on success.
    ///
    /// Nothing is charged when the operation fails cleanly. A failure that
    /// reports [`VoicemailError::payment_sent`] is charged, since the money
    /// has already left the wallet.
    pub async fn execute<T, F, Fut>(
        &self,
        declared_cost: TokenAmount,
        operation: F,
    ) -> Result<BudgetReceipt<T>, VoicemailError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, VoicemailError>>,
    {
        self.execute_metered(declared_cost, move || async move {
            operation().await.map(|value| (value, declared_cost))
        })
        .await
    }

    /// Like [`Self::execute`], but the operation reports what it actually cost.
    ///
    /// The reported cost is clamped to `declared_cost`.
    pub async fn execute_metered<T, F, Fut>(
        &self,
        declared_cost: TokenAmount,
        operation: F,
    ) -> Result<BudgetReceipt<T>, VoicemailError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(T, TokenAmount), VoicemailError>>,
    {
        let reservation = self.reserve(declared_cost)?;

        match operation().await {
            Ok((value, actual)) => {
                let charged = actual.min(declared_cost);
                let total_spent = reservation.commit(charged);
                tracing::info!(%charged, %total_spent, budget = %self.budget, "operation charged");
                Ok(BudgetReceipt {
                    value,
                    charged,
                    total_spent,
                })
            }
            Err(e) => {
                if let Some(proof) = e.payment_sent() {
                    let total_spent = reservation.commit(declared_cost);
                    tracing::warn!(
                        tx = %proof.signature,
                        charged = %declared_cost,
                        %total_spent,
                        error = %e,
                        "operation failed after payment; cost committed"
                    );
                }
                Err(e)
            }
        }
    }

    fn reserve(&self, cost: TokenAmount) -> Result<Reservation<'_>, VoicemailError> {
        if cost > self.max_per_operation {
            return Err(VoicemailError::CostExceedsMax {
                cost,
                max: self.max_per_operation,
            });
        }

        let mut counters = self.lock();
        let committed = counters.spent.checked_add(counters.reserved);
        let fits = committed
            .and_then(|c| c.checked_add(cost))
            .is_some_and(|total| total <= self.budget);
        if !fits {
            let spent = committed.unwrap_or(self.budget);
            tracing::warn!(budget = %self.budget, %spent, required = %cost, "budget exceeded");
            return Err(VoicemailError::BudgetExceeded {
                budget: self.budget,
                spent,
                required: cost,
            });
        }
        counters.reserved = counters.reserved.checked_add(cost).unwrap_or(self.budget);

        Ok(Reservation {
            guard: self,
            cost,
            settled: false,
        })
    }

    // Counters stay consistent even if a holder panicked; every update is a single assignment.
    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Reserved cost, released on drop unless committed.
struct Reservation<'a> {
    guard: &'a BudgetGuard,
    cost: TokenAmount,
    settled: bool,
}

impl Reservation<'_> {
    /// Move the reservation into `spent`, charging `charged`. Returns the new total.
    fn commit(mut self, charged: TokenAmount) -> TokenAmount {
        let mut counters = self.guard.lock();
        counters.reserved = counters.reserved.saturating_sub(self.cost);
        counters.spent = counters.spent.checked_add(charged).unwrap_or(self.guard.budget);
        self.settled = true;
        counters.spent
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let mut counters = self.guard.lock();
            counters.reserved = counters.reserved.saturating_sub(self.cost);
        }
    }
}
