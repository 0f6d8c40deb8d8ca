//! Shared plumbing for Sarab.
//!
//! Home-relative path resolution, `SQLite` pool helpers used by the identity
//! store, and the tracing subscriber setup shared by every binary.

pub mod config;
pub mod db;
pub mod tracing_init;
