//! Wire types for the Cloudflare v4 API.
//!
//! Public structs are the projections the rest of Sarab consumes; the
//! `wire` module mirrors the raw envelope shapes.

use serde::{Deserialize, Serialize};

/// A freshly created remote tunnel.
///
/// Newer control-plane responses include the run token inline; older ones
/// require a follow-up fetch (the token propagates with a delay).
#[derive(Debug, Clone)]
pub struct ProvisionedTunnel {
    pub id: String,
    pub run_token: Option<String>,
}

/// Read-only projection of a remote tunnel, as used by listing and bulk
/// teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelSummary {
    pub id: String,
    pub name: String,
    /// Remote deletion marker (RFC 3339); `Some` means already torn down.
    pub deleted_at: Option<String>,
}

/// A DNS record as returned by the list endpoint.
#[derive(Debug, Clone)]
pub struct DnsRecord {
    pub id: String,
    pub name: String,
    pub record_type: String,
    pub content: String,
}

/// Raw response envelopes. Kept separate from the public projections so
/// callers never see `success`/`errors` plumbing.
pub(crate) mod wire {
    use super::{Deserialize, Serialize};

    #[derive(Debug, Deserialize)]
    pub struct Envelope<T> {
        pub success: bool,
        #[serde(default)]
        pub errors: Vec<ApiMessage>,
        pub result: Option<T>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ApiMessage {
        pub code: Option<u32>,
        #[serde(default)]
        pub message: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct VerifyResult {
        pub id: String,
        pub status: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Account {
        pub id: String,
        #[serde(default)]
        pub name: String,
    }

    #[derive(Debug, Serialize)]
    pub struct CreateTunnelRequest<'a> {
        pub name: &'a str,
        pub config_src: &'a str,
    }

    #[derive(Debug, Deserialize)]
    pub struct TunnelResult {
        pub id: String,
        pub name: Option<String>,
        pub token: Option<String>,
        pub deleted_at: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ZoneResult {
        pub id: String,
        #[serde(default)]
        pub name: String,
    }

    #[derive(Debug, Serialize)]
    pub struct DnsRecordRequest<'a> {
        #[serde(rename = "type")]
        pub record_type: &'a str,
        pub name: &'a str,
        pub content: &'a str,
        /// 1 means "automatic" on Cloudflare.
        pub ttl: u32,
        pub proxied: bool,
    }

    #[derive(Debug, Deserialize)]
    pub struct DnsRecordResult {
        pub id: String,
        #[serde(default)]
        pub name: String,
        #[serde(rename = "type", default)]
        pub record_type: String,
        #[serde(default)]
        pub content: String,
    }
}
