//! Identity selection and failure tracking.

use tracing::debug;

use sarab_store::{Database, DatabaseError, Identity};

/// Selects which stored identity a session acts as, and records the
/// rotation signals that deprioritise identities over time.
///
/// No internal locking: each session holds at most one identity, and every
/// mutation is a single-row write the store performs atomically.
#[derive(Clone)]
pub struct IdentityRotator {
    db: Database,
}

impl IdentityRotator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The active identity with the fewest recorded failures, or `None`
    /// when no active identity exists. Ties resolve in insertion order.
    pub async fn select_next(&self) -> Result<Option<Identity>, DatabaseError> {
        self.db.best_identity().await
    }

    /// Case-insensitive exact alias match among active identities. Absence
    /// is `None`, not an error; the caller decides whether that is fatal.
    pub async fn select_by_alias(&self, alias: &str) -> Result<Option<Identity>, DatabaseError> {
        self.db.find_by_alias(alias).await
    }

    /// Record a rotation signal against an identity and persist it.
    ///
    /// Fired whenever a fresh account-id verification was required, not
    /// only on hard authentication failures.
    pub async fn report_failure(&self, identity: &mut Identity) -> Result<(), DatabaseError> {
        identity.failure_count += 1;
        debug!(alias = %identity.alias, failures = identity.failure_count, "Recorded identity failure");
        self.db.update_identity(identity).await
    }

    /// Stamp an identity as used now and persist it.
    pub async fn mark_used(&self, identity: &mut Identity) -> Result<(), DatabaseError> {
        self.db.touch_identity(identity).await
    }

    /// All active identities, for fleet-wide scans.
    pub async fn list_all(&self) -> Result<Vec<Identity>, DatabaseError> {
        self.db.list_identities().await
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn rotator_with(identities: &[(&str, i64)]) -> IdentityRotator {
        let db = Database::open_in_memory().await.unwrap();
        for (alias, failures) in identities {
            let mut identity = db.add_identity(alias, "secret", None).await.unwrap();
            if *failures > 0 {
                identity.failure_count = *failures;
                db.update_identity(&identity).await.unwrap();
            }
        }
        IdentityRotator::new(db)
    }

    #[tokio::test]
    async fn select_next_prefers_fewest_failures() {
        let rotator = rotator_with(&[("busy", 4), ("fresh", 1), ("burned", 9)]).await;
        let best = rotator.select_next().await.unwrap().unwrap();
        assert_eq!(best.alias, "fresh");
    }

    #[tokio::test]
    async fn select_next_tie_breaks_by_insertion_order() {
        let rotator = rotator_with(&[("first", 2), ("second", 2)]).await;
        let best = rotator.select_next().await.unwrap().unwrap();
        assert_eq!(best.alias, "first");
    }

    #[tokio::test]
    async fn select_next_returns_none_without_identities() {
        let rotator = rotator_with(&[]).await;
        assert!(rotator.select_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn select_by_alias_is_case_insensitive() {
        let rotator = rotator_with(&[("Work", 0)]).await;
        let a = rotator.select_by_alias("work").await.unwrap().unwrap();
        let b = rotator.select_by_alias("WORK").await.unwrap().unwrap();
        assert_eq!(a.id, b.id);
        assert!(rotator.select_by_alias("home").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn report_failure_increments_and_persists() {
        let rotator = rotator_with(&[("work", 0)]).await;
        let mut identity = rotator.select_next().await.unwrap().unwrap();

        rotator.report_failure(&mut identity).await.unwrap();
        rotator.report_failure(&mut identity).await.unwrap();
        assert_eq!(identity.failure_count, 2);

        let reloaded = rotator.select_by_alias("work").await.unwrap().unwrap();
        assert_eq!(reloaded.failure_count, 2);
    }
}
