//! Transient-failure survival for operations against a clustered database.
//!
//! When a cluster node fails over, in-flight connections die with errors that
//! look fatal but are not: the statement would succeed against a surviving
//! node. This crate tells those recoverable infrastructure faults apart from
//! permanent ones (bad SQL, constraint violations) and retries only the
//! former, up to a bound. Sessions that would be unsafe to retry, nested or
//! inside an open transaction, are refused before any attempt is made.

pub mod backoff;
pub mod classify;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod failure;
pub mod logging;
pub mod policy;
pub mod session;
pub mod transaction;

pub use backoff::{Backoff, ExponentialBackoff, FixedBackoff};
pub use config::{BackoffConfig, FailoverConfig};
pub use coordinator::RetryCoordinator;
pub use error::RetryError;
pub use failure::{DatabaseError, DbFailure};
pub use policy::{AttemptContext, RecoverablePolicy};
pub use session::is_session_active;
pub use transaction::{NoTransactions, ThreadBoundTransactions, TransactionProbe, TransactionScope};
