//! Terminal errors surfaced by the coordinator.
//!
//! Every way a session can end badly is a distinct variant, so callers can
//! tell "failed and never retried" from "gave up after retrying" from
//! "refused before any attempt was made".

use crate::failure::DbFailure;

/// How a retry session (or a participating call) failed.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// The last failure was not recoverable; surfaced as soon as it was
    /// observed, without consuming further budget.
    #[error("operation failed permanently after {attempts} attempt(s)")]
    Permanent {
        attempts: u32,
        #[source]
        source: DbFailure,
    },

    /// The failure stayed recoverable but the attempt budget ran out. The
    /// last observed failure is attached as the cause.
    #[error("retry budget exhausted after {attempts} attempt(s)")]
    Exhausted {
        attempts: u32,
        #[source]
        source: DbFailure,
    },

    /// A transaction was active when a new retry session was requested.
    /// Retrying inside an open transaction can silently duplicate effects,
    /// so this is refused outright before any attempt is made.
    #[error("an active transaction was found; a retryable operation must start outside a transaction")]
    ActiveTransaction,

    /// Failure observed while participating in an outer session. Passed
    /// through unclassified; the outer session governs retries.
    #[error("operation failed while participating in an outer retry session")]
    Operation(#[source] DbFailure),
}

impl RetryError {
    /// Attempts made before the session ended, where that is meaningful.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::Permanent { attempts, .. } | RetryError::Exhausted { attempts, .. } => {
                Some(*attempts)
            }
            RetryError::ActiveTransaction | RetryError::Operation(_) => None,
        }
    }
}

/// Re-enter the operation's failure type, so an inner participating call's
/// error propagates through the outer closure with `?`.
impl From<RetryError> for DbFailure {
    fn from(e: RetryError) -> Self {
        match e {
            RetryError::Operation(failure) => failure,
            RetryError::Permanent { source, .. } | RetryError::Exhausted { source, .. } => source,
            refused @ RetryError::ActiveTransaction => DbFailure::other(refused.to_string(), None),
        }
    }
}
