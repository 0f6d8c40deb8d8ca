//! Database models for the identity store.

use serde::{Deserialize, Serialize};

/// A stored credential plus rotation metadata.
///
/// `failure_count` only ever grows from inside a session; it is the
/// rotation-pressure signal `best_identity` orders by.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identity {
    pub id: i64,
    pub alias: String,
    pub secret: String,
    pub account_id: Option<String>,
    pub active: bool,
    pub failure_count: i64,
    pub last_used_at: Option<i64>,
}
