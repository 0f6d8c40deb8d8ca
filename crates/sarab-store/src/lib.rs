//! Sarab identity store.
//!
//! Durable records of the API-token identities the orchestrator rotates
//! over, plus a small key/value config table. Single-row writes are the
//! atomicity unit; there is no cross-process coordination beyond `SQLite`'s
//! own locking.

mod db;
mod models;
mod queries;

pub use db::Database;
pub use models::Identity;
pub use sarab_core::db::DatabaseError;
