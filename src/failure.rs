//! Failure chain observed from a database operation.
//!
//! A failed operation rarely surfaces the driver error directly: transaction
//! machinery wraps data-access errors, which wrap the driver error, which may
//! chain further driver errors behind it. The chain is captured once when the
//! attempt fails and never mutated afterwards. Children are owned boxes, so a
//! captured chain is a finite tree and traversal always terminates.

use std::error::Error;
use std::fmt;

/// One node in a failure chain. Wrapper variants carry their cause branches;
/// only [`DbFailure::Database`] nodes take part in classification.
#[derive(Debug)]
pub enum DbFailure {
    /// Raised by transaction infrastructure (commit, rollback, synchronization).
    /// Exposes the root cause and, separately, the application-level failure
    /// that aborted the transaction. Either branch may be absent.
    Transaction {
        message: String,
        root: Option<Box<DbFailure>>,
        application: Option<Box<DbFailure>>,
    },
    /// Data-access layer wrapper around a lower-level cause.
    DataAccess {
        message: String,
        root: Option<Box<DbFailure>>,
    },
    /// An error reported by the database driver itself.
    Database(DatabaseError),
    /// Any other failure; may still wrap a deeper cause worth walking.
    Other {
        message: String,
        cause: Option<Box<DbFailure>>,
    },
}

/// Driver-level error payload: the only node kind the classifier inspects.
#[derive(Debug)]
pub struct DatabaseError {
    pub message: String,
    /// Numeric vendor error code, when the driver reported one.
    pub code: Option<i32>,
    /// Identity of a driver error type known to be recoverable on its own,
    /// independent of any code (e.g. an error the driver flags as safe to
    /// retry after failover). Matched exactly against the policy's marker.
    pub type_marker: Option<String>,
    /// Next driver error in the chain, if the driver linked one.
    pub cause: Option<Box<DbFailure>>,
}

impl DatabaseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            type_marker: None,
            cause: None,
        }
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_type_marker(mut self, marker: impl Into<String>) -> Self {
        self.type_marker = Some(marker.into());
        self
    }

    pub fn with_cause(mut self, cause: DbFailure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl DbFailure {
    /// Transaction-infrastructure failure with optional root and application branches.
    pub fn transaction(
        message: impl Into<String>,
        root: Option<DbFailure>,
        application: Option<DbFailure>,
    ) -> Self {
        DbFailure::Transaction {
            message: message.into(),
            root: root.map(Box::new),
            application: application.map(Box::new),
        }
    }

    /// Data-access wrapper around an optional root cause.
    pub fn data_access(message: impl Into<String>, root: Option<DbFailure>) -> Self {
        DbFailure::DataAccess {
            message: message.into(),
            root: root.map(Box::new),
        }
    }

    /// Failure outside the known wrapper kinds, with an optional cause.
    pub fn other(message: impl Into<String>, cause: Option<DbFailure>) -> Self {
        DbFailure::Other {
            message: message.into(),
            cause: cause.map(Box::new),
        }
    }
}

impl From<DatabaseError> for DbFailure {
    fn from(e: DatabaseError) -> Self {
        DbFailure::Database(e)
    }
}

impl fmt::Display for DbFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbFailure::Transaction { message, .. } => write!(f, "transaction failure: {}", message),
            DbFailure::DataAccess { message, .. } => write!(f, "data access failure: {}", message),
            DbFailure::Database(e) => write!(f, "{}", e),
            DbFailure::Other { message, .. } => write!(f, "{}", message),
        }
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for DatabaseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn Error + 'static))
    }
}

impl Error for DbFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        let cause = match self {
            DbFailure::Transaction {
                root, application, ..
            } => root.as_deref().or(application.as_deref()),
            DbFailure::DataAccess { root, .. } => root.as_deref(),
            DbFailure::Database(e) => return e.source(),
            DbFailure::Other { cause, .. } => cause.as_deref(),
        };
        cause.map(|c| c as &(dyn Error + 'static))
    }
}
