//! Thread-scoped retry session marker.
//!
//! At most one retry session runs per thread. Nested calls observe the active
//! session and participate in it instead of starting their own; the outer
//! loop governs all retries. The slot is thread-local, so no locking is
//! needed. The guard clears the slot on drop, so the session ends on every
//! exit path, panics included.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

thread_local! {
    /// Id of the invocation holding this thread's retry session.
    static ACTIVE_SESSION: Cell<Option<u64>> = Cell::new(None);
}

/// Session ids are identity-only, used in logs to tell sessions apart.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// True iff a retry session is active on the current thread.
pub fn is_session_active() -> bool {
    ACTIVE_SESSION.with(|slot| slot.get().is_some())
}

/// Holds the thread's session slot for its lifetime.
#[derive(Debug)]
pub(crate) struct SessionGuard {
    id: u64,
}

impl SessionGuard {
    /// Claims the thread's session slot. Returns `None` when a session is
    /// already active; the caller should participate in it instead.
    pub(crate) fn start() -> Option<SessionGuard> {
        ACTIVE_SESSION.with(|slot| {
            if slot.get().is_some() {
                return None;
            }
            let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
            slot.set(Some(id));
            tracing::debug!(session = id, "starting retry session");
            Some(SessionGuard { id })
        })
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        tracing::debug!(session = self.id, "clearing retry session");
        ACTIVE_SESSION.with(|slot| slot.set(None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_marks_and_clears_session() {
        assert!(!is_session_active());
        let guard = SessionGuard::start().expect("no session active yet");
        assert!(is_session_active());
        drop(guard);
        assert!(!is_session_active());
    }

    #[test]
    fn second_start_on_same_thread_is_refused() {
        let _guard = SessionGuard::start().expect("no session active yet");
        assert!(SessionGuard::start().is_none());
    }

    #[test]
    fn panic_clears_the_slot() {
        let result = std::panic::catch_unwind(|| {
            let _guard = SessionGuard::start().expect("no session active yet");
            panic!("attempt blew up");
        });
        assert!(result.is_err());
        assert!(!is_session_active());
    }

    #[test]
    fn sessions_are_per_thread() {
        let _guard = SessionGuard::start().expect("no session active yet");
        let other = std::thread::spawn(|| is_session_active())
            .join()
            .expect("spawned thread");
        assert!(!other, "other threads must not see this thread's session");
    }
}
