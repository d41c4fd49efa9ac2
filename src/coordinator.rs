//! Retry coordination: run an operation until success, exhaustion, or a
//! permanent failure.
//!
//! The coordinator owns the loop and the session bookkeeping. The policy
//! decides whether a failure is worth another attempt; the backoff strategy
//! decides how long to wait before it. An operation is a plain closure,
//! wrapped by passing it to [`RetryCoordinator::invoke`] rather than by
//! proxying the caller.

use crate::backoff::{Backoff, ExponentialBackoff};
use crate::error::RetryError;
use crate::failure::DbFailure;
use crate::policy::{AttemptContext, RecoverablePolicy};
use crate::session::{self, SessionGuard};
use crate::transaction::{ThreadBoundTransactions, TransactionProbe};

/// Wraps database operations in a bounded retry loop, one session per thread
/// at a time. Nested calls on the same thread participate in the outer
/// session instead of retrying on their own.
#[derive(Debug)]
pub struct RetryCoordinator<B = ExponentialBackoff, T = ThreadBoundTransactions> {
    policy: RecoverablePolicy,
    backoff: B,
    transactions: T,
}

impl RetryCoordinator {
    /// Coordinator with the default exponential backoff and the thread-bound
    /// transaction probe.
    pub fn new(policy: RecoverablePolicy) -> Self {
        Self {
            policy,
            backoff: ExponentialBackoff::default(),
            transactions: ThreadBoundTransactions,
        }
    }
}

impl<B, T> RetryCoordinator<B, T>
where
    B: Backoff,
    T: TransactionProbe,
{
    /// Coordinator with caller-supplied backoff and transaction collaborators.
    pub fn with_collaborators(policy: RecoverablePolicy, backoff: B, transactions: T) -> Self {
        Self {
            policy,
            backoff,
            transactions,
        }
    }

    pub fn policy(&self) -> &RecoverablePolicy {
        &self.policy
    }

    /// True iff a retry session is active on the current thread (whether or
    /// not this coordinator started it).
    pub fn is_session_active(&self) -> bool {
        session::is_session_active()
    }

    /// Runs `operation`, retrying recoverable failures until it succeeds, the
    /// policy refuses, or a precondition blocks the session.
    ///
    /// When a session is already active on this thread the operation runs
    /// exactly once and its failure is passed through as
    /// [`RetryError::Operation`]; the outer session governs retries. When a
    /// transaction is active, the call is refused with
    /// [`RetryError::ActiveTransaction`] before any attempt is made.
    pub fn invoke<R>(
        &self,
        mut operation: impl FnMut() -> Result<R, DbFailure>,
    ) -> Result<R, RetryError> {
        if session::is_session_active() {
            tracing::debug!("participating in existing retry session");
            return operation().map_err(RetryError::Operation);
        }

        if self.transactions.is_transaction_active() {
            tracing::warn!("active transaction found when starting a retryable operation");
            return Err(RetryError::ActiveTransaction);
        }

        // Checked free above; if the slot is somehow taken, participate
        // rather than start a second session.
        let Some(_session) = SessionGuard::start() else {
            tracing::debug!("participating in existing retry session");
            return operation().map_err(RetryError::Operation);
        };

        let mut ctx = AttemptContext::new();
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(failure) => {
                    ctx.record_failure(failure);
                    if !self.policy.can_retry(&ctx) {
                        return Err(self.give_up(ctx));
                    }
                    tracing::debug!(attempts = ctx.attempts(), "recoverable failure, will retry");
                    self.backoff.wait(ctx.attempts());
                }
            }
        }
    }

    /// Converts an ended session into its terminal error: exhaustion when the
    /// budget ran out, a permanent failure otherwise.
    fn give_up(&self, ctx: AttemptContext) -> RetryError {
        let attempts = ctx.attempts();
        let budget_exhausted = attempts > self.policy.max_retries();
        let Some(source) = ctx.into_last_failure() else {
            unreachable!("retry refused before any failure was recorded");
        };
        if budget_exhausted {
            RetryError::Exhausted { attempts, source }
        } else {
            RetryError::Permanent { attempts, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::FixedBackoff;
    use crate::failure::DatabaseError;
    use crate::transaction::NoTransactions;
    use std::cell::Cell;
    use std::time::Duration;

    fn coordinator(max_retries: u32) -> RetryCoordinator<FixedBackoff, NoTransactions> {
        RetryCoordinator::with_collaborators(
            RecoverablePolicy::new(max_retries, [3113], "recoverable"),
            FixedBackoff::new(Duration::ZERO),
            NoTransactions,
        )
    }

    #[test]
    fn success_on_first_attempt_makes_one_call() {
        let calls = Cell::new(0u32);
        let result = coordinator(5).invoke(|| {
            calls.set(calls.get() + 1);
            Ok::<_, DbFailure>(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn session_is_active_inside_the_operation_and_cleared_after() {
        let c = coordinator(5);
        let result = c.invoke(|| {
            assert!(session::is_session_active());
            Ok::<_, DbFailure>(())
        });
        assert!(result.is_ok());
        assert!(!c.is_session_active());
    }

    #[test]
    fn session_is_cleared_after_a_permanent_failure() {
        let c = coordinator(5);
        let result = c.invoke(|| -> Result<(), _> {
            Err(DatabaseError::new("bad sql").with_code(942).into())
        });
        assert!(matches!(result, Err(RetryError::Permanent { attempts: 1, .. })));
        assert!(!c.is_session_active());
    }
}
