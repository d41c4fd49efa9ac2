//! Transaction-activity probe for the current thread.
//!
//! The coordinator refuses to start a retry session while a transaction is
//! open, so it needs to ask "is a transaction active right now?". Real
//! deployments answer from their transaction manager via the
//! [`TransactionProbe`] trait. [`ThreadBoundTransactions`] and
//! [`TransactionScope`] provide a thread-bound implementation for callers that
//! mark transaction boundaries in-process; [`NoTransactions`] is for callers
//! whose operations never run inside one.

use std::cell::Cell;

/// Answers whether a transaction is active on the current thread.
pub trait TransactionProbe {
    fn is_transaction_active(&self) -> bool;
}

/// Probe for deployments without transactions: always answers no.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransactions;

impl TransactionProbe for NoTransactions {
    fn is_transaction_active(&self) -> bool {
        false
    }
}

thread_local! {
    /// Open-transaction depth for this thread; scopes nest.
    static OPEN_TRANSACTIONS: Cell<u32> = Cell::new(0);
}

/// Probe backed by the thread-bound transaction marker below.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadBoundTransactions;

impl TransactionProbe for ThreadBoundTransactions {
    fn is_transaction_active(&self) -> bool {
        OPEN_TRANSACTIONS.with(|depth| depth.get() > 0)
    }
}

/// Marks a transaction as open on this thread for the guard's lifetime.
/// Scopes nest; the transaction counts as active until the outermost guard
/// drops.
#[derive(Debug)]
pub struct TransactionScope {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl TransactionScope {
    pub fn enter() -> Self {
        OPEN_TRANSACTIONS.with(|depth| depth.set(depth.get() + 1));
        Self {
            _not_send: std::marker::PhantomData,
        }
    }
}

impl Drop for TransactionScope {
    fn drop(&mut self) {
        OPEN_TRANSACTIONS.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
