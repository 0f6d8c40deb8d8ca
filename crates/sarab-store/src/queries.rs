//! Database queries for the identity store.

use sarab_core::db::unix_timestamp;

use super::db::Database;
use super::models::Identity;
use sarab_core::db::DatabaseError;

impl Database {
    // =========================================================================
    // Identity queries
    // =========================================================================

    /// Store a new identity. The alias must be unique.
    pub async fn add_identity(
        &self,
        alias: &str,
        secret: &str,
        account_id: Option<&str>,
    ) -> Result<Identity, DatabaseError> {
        sqlx::query(
            r"
            INSERT INTO identities (alias, secret, account_id, active, failure_count)
            VALUES (?, ?, ?, 1, 0)
            ",
        )
        .bind(alias)
        .bind(secret)
        .bind(account_id)
        .execute(self.pool())
        .await?;

        sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE alias = ?")
            .bind(alias)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Identity {alias}")))
    }

    /// All active identities, in insertion order.
    pub async fn list_identities(&self) -> Result<Vec<Identity>, DatabaseError> {
        let identities =
            sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE active = 1 ORDER BY id")
                .fetch_all(self.pool())
                .await?;
        Ok(identities)
    }

    /// Soft-delete an identity by alias. Returns `false` if nothing matched.
    pub async fn remove_identity(&self, alias: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE identities SET active = 0 WHERE alias = ? AND active = 1")
            .bind(alias)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The active identity with the fewest recorded failures.
    ///
    /// Ties resolve by ascending id, i.e. insertion order.
    pub async fn best_identity(&self) -> Result<Option<Identity>, DatabaseError> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT * FROM identities WHERE active = 1 ORDER BY failure_count ASC, id ASC LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await?;
        Ok(identity)
    }

    /// Find an active identity by alias, case-insensitively.
    pub async fn find_by_alias(&self, alias: &str) -> Result<Option<Identity>, DatabaseError> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT * FROM identities WHERE active = 1 AND alias = ? COLLATE NOCASE",
        )
        .bind(alias)
        .fetch_optional(self.pool())
        .await?;
        Ok(identity)
    }

    /// Persist the mutable fields of an identity (single-row write).
    pub async fn update_identity(&self, identity: &Identity) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            UPDATE identities
            SET failure_count = ?, last_used_at = ?, account_id = ?
            WHERE id = ?
            ",
        )
        .bind(identity.failure_count)
        .bind(identity.last_used_at)
        .bind(identity.account_id.as_deref())
        .bind(identity.id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    // =========================================================================
    // Config queries
    // =========================================================================

    /// Read a config value.
    pub async fn get_config(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM config WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(|(value,)| value))
    }

    /// Write a config value (upsert).
    pub async fn set_config(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            INSERT INTO config (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(key)
        .bind(value)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Stamp an identity as used right now.
    pub async fn touch_identity(&self, identity: &mut Identity) -> Result<(), DatabaseError> {
        identity.last_used_at = Some(unix_timestamp());
        self.update_identity(identity).await
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_and_list_identities() {
        let db = Database::open_in_memory().await.unwrap();

        let a = db.add_identity("work", "tok-a", Some("acc-1")).await.unwrap();
        let b = db.add_identity("home", "tok-b", None).await.unwrap();
        assert_eq!(a.alias, "work");
        assert_eq!(a.account_id.as_deref(), Some("acc-1"));
        assert_eq!(b.failure_count, 0);
        assert!(b.account_id.is_none());

        let all = db.list_identities().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].alias, "work");
        assert_eq!(all[1].alias, "home");
    }

    #[tokio::test]
    async fn remove_is_a_soft_delete() {
        let db = Database::open_in_memory().await.unwrap();
        db.add_identity("work", "tok", None).await.unwrap();

        assert!(db.remove_identity("work").await.unwrap());
        assert!(db.list_identities().await.unwrap().is_empty());
        assert!(db.best_identity().await.unwrap().is_none());

        // Removing again affects nothing.
        assert!(!db.remove_identity("work").await.unwrap());
    }

    #[tokio::test]
    async fn best_identity_orders_by_failures_then_id() {
        let db = Database::open_in_memory().await.unwrap();
        let mut first = db.add_identity("first", "t1", None).await.unwrap();
        db.add_identity("second", "t2", None).await.unwrap();

        // Equal failure counts: insertion order wins.
        let best = db.best_identity().await.unwrap().unwrap();
        assert_eq!(best.alias, "first");

        first.failure_count += 1;
        db.update_identity(&first).await.unwrap();

        let best = db.best_identity().await.unwrap().unwrap();
        assert_eq!(best.alias, "second");
    }

    #[tokio::test]
    async fn alias_lookup_is_case_insensitive() {
        let db = Database::open_in_memory().await.unwrap();
        db.add_identity("Work", "tok", None).await.unwrap();

        let upper = db.find_by_alias("WORK").await.unwrap().unwrap();
        let lower = db.find_by_alias("work").await.unwrap().unwrap();
        assert_eq!(upper.id, lower.id);

        assert!(db.find_by_alias("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_persists_account_id_backfill() {
        let db = Database::open_in_memory().await.unwrap();
        let mut identity = db.add_identity("work", "tok", None).await.unwrap();

        identity.account_id = Some("acc-42".into());
        identity.failure_count = 3;
        db.update_identity(&identity).await.unwrap();

        let reloaded = db.find_by_alias("work").await.unwrap().unwrap();
        assert_eq!(reloaded.account_id.as_deref(), Some("acc-42"));
        assert_eq!(reloaded.failure_count, 3);
    }

    #[tokio::test]
    async fn touch_identity_stamps_last_used() {
        let db = Database::open_in_memory().await.unwrap();
        let mut identity = db.add_identity("work", "tok", None).await.unwrap();
        assert!(identity.last_used_at.is_none());

        db.touch_identity(&mut identity).await.unwrap();
        let reloaded = db.find_by_alias("work").await.unwrap().unwrap();
        assert!(reloaded.last_used_at.is_some());
    }

    #[tokio::test]
    async fn config_roundtrip_and_upsert() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(db.get_config("routing").await.unwrap().is_none());

        db.set_config("routing", "one").await.unwrap();
        db.set_config("routing", "two").await.unwrap();
        assert_eq!(db.get_config("routing").await.unwrap().as_deref(), Some("two"));
    }
}
