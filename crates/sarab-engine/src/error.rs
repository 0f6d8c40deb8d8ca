//! Engine error taxonomy.

use thiserror::Error;

use sarab_cloudflare::CloudflareError;
use sarab_store::DatabaseError;

/// Errors raised while orchestrating a tunnel session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An explicitly requested identity alias matched nothing.
    #[error("no active identity matches alias '{0}'")]
    IdentityNotFound(String),

    /// The tunnel executable is missing or failed its liveness check.
    #[error("tunnel executable unavailable: {0}")]
    ExecutableUnavailable(String),

    /// Authenticated mode needs a full hostname; there is no default zone.
    #[error("a hostname (--subdomain) is required when exposing through an identity")]
    HostnameRequired,

    /// Neither the hostname nor its parent domain resolved to a zone.
    #[error("no DNS zone found for '{0}'")]
    ZoneNotFound(String),

    /// A mandatory control-plane call failed.
    #[error("remote provisioning failed: {0}")]
    RemoteProvisioning(#[from] CloudflareError),

    /// The tunnel run token never became available.
    #[error("tunnel secret not available after {attempts} attempts: {source}")]
    SecretPropagationTimeout {
        attempts: u32,
        source: CloudflareError,
    },

    #[error("identity store error: {0}")]
    Store(#[from] DatabaseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to produce the local ingress config.
    #[error("failed to write ingress config: {0}")]
    Config(String),
}
