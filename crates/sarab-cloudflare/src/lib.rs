//! Cloudflare v4 API client for Sarab.
//!
//! Stateless request/response wrapper around the control plane: credential
//! verification, tunnel CRUD, zone lookup, and DNS record CRUD. Retries,
//! reconciliation, and sequencing live in `sarab-engine`, not here.

mod client;
mod error;
pub mod types;

pub use client::CloudflareClient;
pub use error::CloudflareError;
