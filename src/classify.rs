//! Failure classification: is there a recoverable database error in the chain?
//!
//! Walks every branch of a wrapped failure collecting driver-level error
//! nodes, then matches each against the policy's type marker and recoverable
//! code set. Higher layers (policy, coordinator) share this one definition of
//! "recoverable" so a failure never classifies differently between attempts.

use crate::failure::{DatabaseError, DbFailure};
use crate::policy::RecoverablePolicy;

/// Returns true if any database-error node reachable from `failure` matches
/// the policy's recoverable type marker or one of its recoverable codes.
///
/// Nodes are checked in depth-first traversal order; the first match decides.
/// A node with neither a marker nor a code is skipped. A chain with no
/// database-error node at all is never recoverable.
pub fn is_recoverable(failure: &DbFailure, policy: &RecoverablePolicy) -> bool {
    let mut found = Vec::new();
    collect_database_errors(failure, &mut found);

    for db in found {
        if let Some(marker) = db.type_marker.as_deref() {
            if marker == policy.recoverable_type_marker() {
                tracing::debug!(marker, %db, "recoverable cause: type marker match");
                return true;
            }
        }
        if let Some(code) = db.code {
            if policy.recoverable_codes().contains(&code) {
                tracing::debug!(code, %db, "recoverable cause: error code match");
                return true;
            }
        }
    }

    tracing::debug!("no recoverable cause found");
    false
}

/// Collects every database-error node reachable from `failure`, depth-first.
///
/// Transaction wrappers contribute both their root and application branches;
/// a leaf reachable through both is simply collected twice, which is harmless
/// because classification only looks for the first match.
fn collect_database_errors<'a>(failure: &'a DbFailure, out: &mut Vec<&'a DatabaseError>) {
    match failure {
        DbFailure::Transaction {
            root, application, ..
        } => {
            if let Some(root) = root {
                collect_database_errors(root, out);
            }
            if let Some(application) = application {
                collect_database_errors(application, out);
            }
        }
        DbFailure::DataAccess { root, .. } => {
            if let Some(root) = root {
                collect_database_errors(root, out);
            }
        }
        DbFailure::Database(db) => {
            out.push(db);
            if let Some(cause) = db.cause.as_deref() {
                collect_database_errors(cause, out);
            }
        }
        DbFailure::Other { cause, .. } => {
            if let Some(cause) = cause {
                collect_database_errors(cause, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::DatabaseError;

    fn policy() -> RecoverablePolicy {
        RecoverablePolicy::default()
    }

    /// Four levels deep: transaction → data access → other → database error.
    fn deep_chain(code: i32) -> DbFailure {
        DbFailure::transaction(
            "commit failed",
            Some(DbFailure::data_access(
                "statement aborted",
                Some(DbFailure::other(
                    "driver call failed",
                    Some(DatabaseError::new("connection lost").with_code(code).into()),
                )),
            )),
            None,
        )
    }

    #[test]
    fn deep_chain_with_recoverable_code() {
        assert!(is_recoverable(&deep_chain(1034), &policy()));
    }

    #[test]
    fn deep_chain_with_unknown_code() {
        assert!(!is_recoverable(&deep_chain(9999), &policy()));
    }

    #[test]
    fn type_marker_match_wins_without_code() {
        let failure: DbFailure = DatabaseError::new("driver flagged recoverable")
            .with_type_marker("recoverable")
            .into();
        assert!(is_recoverable(&failure, &policy()));
    }

    #[test]
    fn marker_must_match_exactly() {
        let failure: DbFailure = DatabaseError::new("close but no")
            .with_type_marker("Recoverable")
            .into();
        assert!(!is_recoverable(&failure, &policy()));
    }

    #[test]
    fn application_branch_is_walked() {
        let failure = DbFailure::transaction(
            "rollback failed",
            None,
            Some(DatabaseError::new("instance going down").with_code(1033).into()),
        );
        assert!(is_recoverable(&failure, &policy()));
    }

    #[test]
    fn both_branches_walked_root_first() {
        let failure = DbFailure::transaction(
            "commit failed",
            Some(DatabaseError::new("harmless").with_code(1).into()),
            Some(DatabaseError::new("connection lost").with_code(3113).into()),
        );
        assert!(is_recoverable(&failure, &policy()));
    }

    #[test]
    fn bare_node_is_skipped_not_recoverable() {
        let failure: DbFailure = DatabaseError::new("no code, no marker").into();
        assert!(!is_recoverable(&failure, &policy()));
    }

    #[test]
    fn chained_database_errors_are_all_collected() {
        let failure: DbFailure = DatabaseError::new("outer")
            .with_code(17)
            .with_cause(DatabaseError::new("inner").with_code(17410).into())
            .into();
        assert!(is_recoverable(&failure, &policy()));
    }

    #[test]
    fn chain_without_database_error_is_not_recoverable() {
        let failure = DbFailure::data_access(
            "mapping failed",
            Some(DbFailure::other("oops", None)),
        );
        assert!(!is_recoverable(&failure, &policy()));
    }
}
