//! Trait seams between the orchestrator and its collaborators.
//!
//! The orchestrator only sequences side effects; both the control plane and
//! the process supervisor sit behind traits so the sequencing is testable
//! against in-memory fakes.

use std::path::Path;

use async_trait::async_trait;

use sarab_cloudflare::types::{DnsRecord, ProvisionedTunnel, TunnelSummary};
use sarab_cloudflare::{CloudflareClient, CloudflareError};
use sarab_store::Identity;

use crate::error::EngineError;
use crate::session::ExposeRequest;

/// Identity-aware façade over the remote control plane.
///
/// Account-scoped operations require the identity's cached account id and
/// fail with [`CloudflareError::MissingAccountId`] when it is absent; the
/// orchestrator backfills the cache before calling them.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Verify a raw secret and resolve the account id it acts on.
    async fn verify_credential(&self, secret: &str) -> Result<String, CloudflareError>;

    async fn create_tunnel(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<ProvisionedTunnel, CloudflareError>;

    async fn tunnel_run_token(
        &self,
        identity: &Identity,
        tunnel_id: &str,
    ) -> Result<String, CloudflareError>;

    async fn list_tunnels(&self, identity: &Identity) -> Result<Vec<TunnelSummary>, CloudflareError>;

    async fn delete_tunnel(&self, identity: &Identity, tunnel_id: &str)
    -> Result<(), CloudflareError>;

    /// Exact-name zone lookup; `None` when no zone matches.
    async fn find_zone(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<Option<String>, CloudflareError>;

    async fn create_dns_record(
        &self,
        identity: &Identity,
        zone_id: &str,
        name: &str,
        content: &str,
        proxied: bool,
    ) -> Result<String, CloudflareError>;

    async fn update_dns_record(
        &self,
        identity: &Identity,
        zone_id: &str,
        record_id: &str,
        name: &str,
        content: &str,
        proxied: bool,
    ) -> Result<String, CloudflareError>;

    async fn delete_dns_record(
        &self,
        identity: &Identity,
        zone_id: &str,
        record_id: &str,
    ) -> Result<(), CloudflareError>;

    async fn list_dns_records(
        &self,
        identity: &Identity,
        zone_id: &str,
        name: Option<&str>,
    ) -> Result<Vec<DnsRecord>, CloudflareError>;
}

/// The supervised external tunnel process.
#[async_trait]
pub trait TunnelRunner: Send + Sync {
    /// Check the executable exists and answers a liveness probe. Must fail
    /// before any remote side effect is attempted.
    async fn ensure_ready(&self) -> Result<(), EngineError>;

    /// Run a named tunnel from a local ingress config and run token,
    /// blocking until it exits or is interrupted.
    async fn run_named(&self, config_path: &Path, run_token: &str) -> Result<(), EngineError>;

    /// Run an anonymous quick tunnel straight at the local origin, blocking
    /// until it exits or is interrupted.
    async fn run_quick(&self, request: &ExposeRequest) -> Result<(), EngineError>;
}

fn account_id(identity: &Identity) -> Result<&str, CloudflareError> {
    identity
        .account_id
        .as_deref()
        .ok_or(CloudflareError::MissingAccountId)
}

#[async_trait]
impl ControlPlane for CloudflareClient {
    async fn verify_credential(&self, secret: &str) -> Result<String, CloudflareError> {
        self.verify_token(secret).await
    }

    async fn create_tunnel(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<ProvisionedTunnel, CloudflareError> {
        self.create_tunnel(&identity.secret, account_id(identity)?, name)
            .await
    }

    async fn tunnel_run_token(
        &self,
        identity: &Identity,
        tunnel_id: &str,
    ) -> Result<String, CloudflareError> {
        self.tunnel_token(&identity.secret, account_id(identity)?, tunnel_id)
            .await
    }

    async fn list_tunnels(
        &self,
        identity: &Identity,
    ) -> Result<Vec<TunnelSummary>, CloudflareError> {
        self.list_tunnels(&identity.secret, account_id(identity)?)
            .await
    }

    async fn delete_tunnel(
        &self,
        identity: &Identity,
        tunnel_id: &str,
    ) -> Result<(), CloudflareError> {
        self.delete_tunnel(&identity.secret, account_id(identity)?, tunnel_id)
            .await
    }

    async fn find_zone(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<Option<String>, CloudflareError> {
        self.find_zone(&identity.secret, name).await
    }

    async fn create_dns_record(
        &self,
        identity: &Identity,
        zone_id: &str,
        name: &str,
        content: &str,
        proxied: bool,
    ) -> Result<String, CloudflareError> {
        self.create_dns_record(&identity.secret, zone_id, name, content, proxied)
            .await
    }

    async fn update_dns_record(
        &self,
        identity: &Identity,
        zone_id: &str,
        record_id: &str,
        name: &str,
        content: &str,
        proxied: bool,
    ) -> Result<String, CloudflareError> {
        self.update_dns_record(&identity.secret, zone_id, record_id, name, content, proxied)
            .await
    }

    async fn delete_dns_record(
        &self,
        identity: &Identity,
        zone_id: &str,
        record_id: &str,
    ) -> Result<(), CloudflareError> {
        self.delete_dns_record(&identity.secret, zone_id, record_id)
            .await
    }

    async fn list_dns_records(
        &self,
        identity: &Identity,
        zone_id: &str,
        name: Option<&str>,
    ) -> Result<Vec<DnsRecord>, CloudflareError> {
        self.list_dns_records(&identity.secret, zone_id, name).await
    }
}
