//! Retry permission: attempt budget plus recoverable-failure classification.
//!
//! The policy answers one question per failed attempt: is another attempt
//! permitted? It is a pure decision (aside from logging); looping, waiting,
//! and session bookkeeping live in the coordinator.

use std::collections::BTreeSet;

use crate::classify;
use crate::config::FailoverConfig;
use crate::failure::DbFailure;

/// Default maximum number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Stock recoverable error codes: the instance-down / connection-lost family
/// a clustered database raises while a node fails over. 3113/3114 are
/// end-of-file and connection-lost, 1033/1034 instance starting or down,
/// 1089 shutdown in progress, 17002/17008/17410 connection resets reported
/// by the driver.
pub const DEFAULT_RECOVERABLE_ERROR_CODES: [i32; 8] =
    [3113, 3114, 1033, 1034, 1089, 17002, 17008, 17410];

/// Default type marker: the tag an adapter puts on errors the driver itself
/// flags as recoverable, independent of any code.
pub const DEFAULT_RECOVERABLE_TYPE_MARKER: &str = "recoverable";

/// Attempt bookkeeping for one retry session. Created fresh per
/// [`invoke`](crate::coordinator::RetryCoordinator::invoke) call, bumped once
/// per observed failure, dropped when the session ends.
#[derive(Debug, Default)]
pub struct AttemptContext {
    attempts: u32,
    last_failure: Option<DbFailure>,
}

impl AttemptContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of failed attempts observed so far (0 before the first attempt).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The failure that ended the most recent attempt, if any attempt failed.
    pub fn last_failure(&self) -> Option<&DbFailure> {
        self.last_failure.as_ref()
    }

    /// Records a failed attempt: bumps the count and replaces the last failure.
    pub(crate) fn record_failure(&mut self, failure: DbFailure) {
        self.attempts += 1;
        self.last_failure = Some(failure);
    }

    /// Consumes the context, yielding the failure that ended the session.
    pub(crate) fn into_last_failure(self) -> Option<DbFailure> {
        self.last_failure
    }
}

/// Which failures are worth another attempt, and how many attempts to allow.
/// Immutable once constructed; supplied by the caller or loaded from
/// [`FailoverConfig`].
#[derive(Debug, Clone)]
pub struct RecoverablePolicy {
    max_retries: u32,
    recoverable_codes: BTreeSet<i32>,
    recoverable_type_marker: String,
}

impl RecoverablePolicy {
    pub fn new(
        max_retries: u32,
        recoverable_codes: impl IntoIterator<Item = i32>,
        recoverable_type_marker: impl Into<String>,
    ) -> Self {
        Self {
            max_retries,
            recoverable_codes: recoverable_codes.into_iter().collect(),
            recoverable_type_marker: recoverable_type_marker.into(),
        }
    }

    pub fn from_config(cfg: &FailoverConfig) -> Self {
        Self::new(
            cfg.max_retries,
            cfg.recoverable_error_codes.iter().copied(),
            cfg.recoverable_type_marker.clone(),
        )
    }

    /// Maximum number of retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn recoverable_codes(&self) -> &BTreeSet<i32> {
        &self.recoverable_codes
    }

    pub fn recoverable_type_marker(&self) -> &str {
        &self.recoverable_type_marker
    }

    /// Whether another attempt is permitted given the session's context.
    ///
    /// False once the attempt count exceeds `max_retries` (so a session makes
    /// at most `max_retries + 1` attempts in total). Before the first attempt
    /// nothing has failed and the answer is always yes; an absent failure
    /// never reaches the classifier.
    pub fn can_retry(&self, ctx: &AttemptContext) -> bool {
        if ctx.attempts > self.max_retries {
            tracing::warn!(
                attempts = ctx.attempts,
                max_retries = self.max_retries,
                "retry count exceeds maximum, giving up"
            );
            return false;
        }
        match ctx.last_failure() {
            None => true,
            Some(failure) => classify::is_recoverable(failure, self),
        }
    }
}

impl Default for RecoverablePolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            DEFAULT_RECOVERABLE_ERROR_CODES,
            DEFAULT_RECOVERABLE_TYPE_MARKER,
        )
    }
}
