//! Per-request time budgets for store calls.
//!
//! Every cart operation computes one deadline when it starts, and every
//! store call in that operation races against the same instant. A call that
//! is still pending when the deadline passes is abandoned.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tracing::warn;

/// Default budget for single-document cart mutations.
pub const DEFAULT_MUTATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default budget for checkout and cart summary aggregation.
pub const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(100);

/// Clamp for budgets that overflow the clock.
pub const MAX_BUDGET: Duration = Duration::from_secs(86_400);

/// Time budgets for cart operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Add-to-cart, remove-item and instant-buy.
    pub mutation: Duration,
    /// Checkout and cart summary.
    pub checkout: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            mutation: DEFAULT_MUTATION_TIMEOUT,
            checkout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }
}

/// The store call did not finish before the operation's deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded {
    pub operation: &'static str,
}

/// A fixed instant by which an operation's store calls must finish.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    operation: &'static str,
}

impl Deadline {
    /// A deadline `budget` from now.
    ///
    /// A budget past the clock's range is clamped to [`MAX_BUDGET`].
    #[must_use]
    pub fn after(budget: Duration, operation: &'static str) -> Self {
        let now = Instant::now();
        let at = now
            .checked_add(budget)
            .unwrap_or_else(|| now + MAX_BUDGET);
        Self { at, operation }
    }

    /// Await `future`, giving up at the deadline.
    ///
    /// # Errors
    ///
    /// Returns `DeadlineExceeded` if the deadline passes first.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, DeadlineExceeded> {
        timeout_at(self.at, future).await.map_err(|_| {
            warn!(operation = self.operation, "Store call exceeded its deadline");
            DeadlineExceeded {
                operation: self.operation,
            }
        })
    }
}
