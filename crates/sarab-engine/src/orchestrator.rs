//! The tunnel lifecycle orchestrator.
//!
//! Sequences one session end to end: identity acquisition, binary
//! readiness, remote provisioning, DNS reconciliation, local config,
//! process supervision, and the cleanup finalizer. This is the only place
//! that orders side effects across the rotator, the control plane, and the
//! supervised process.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use sarab_cloudflare::CloudflareError;
use sarab_cloudflare::types::{ProvisionedTunnel, TunnelSummary};
use sarab_store::Identity;

use crate::control::{ControlPlane, TunnelRunner};
use crate::error::EngineError;
use crate::naming;
use crate::rotator::IdentityRotator;
use crate::session::ExposeRequest;
use crate::ingress;

/// Polls for a propagating run token before giving up.
const SECRET_POLL_ATTEMPTS: u32 = 3;

/// Outcome of a bulk teardown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NukeReport {
    pub deleted: usize,
    pub failed: usize,
}

/// Orchestrates tunnel sessions and fleet operations.
pub struct Illusionist<C, R> {
    rotator: IdentityRotator,
    control: C,
    runner: R,
    session_config_dir: PathBuf,
}

impl<C: ControlPlane, R: TunnelRunner> Illusionist<C, R> {
    pub fn new(
        rotator: IdentityRotator,
        control: C,
        runner: R,
        session_config_dir: PathBuf,
    ) -> Self {
        Self {
            rotator,
            control,
            runner,
            session_config_dir,
        }
    }

    /// Run one expose session to completion.
    ///
    /// Blocks for the supervised process's entire lifetime. With no usable
    /// identity the session degrades to an anonymous quick tunnel; with one
    /// it provisions remote state and guarantees the DNS record is removed
    /// on every exit path.
    pub async fn expose(&self, request: ExposeRequest) -> Result<(), EngineError> {
        let identity = match &request.identity_alias {
            Some(alias) => Some(
                self.rotator
                    .select_by_alias(alias)
                    .await?
                    .ok_or_else(|| EngineError::IdentityNotFound(alias.clone()))?,
            ),
            None => self.rotator.select_next().await?,
        };

        // A missing executable must fail before any remote side effect.
        self.runner.ensure_ready().await?;

        match identity {
            None => {
                if request.subdomain.is_some() {
                    warn!(
                        "No identity configured; --subdomain has no meaning for an anonymous tunnel and is ignored"
                    );
                }
                info!(origin = %request.local_url(), "Starting anonymous quick tunnel");
                self.runner.run_quick(&request).await
            }
            Some(identity) => self.expose_authenticated(identity, &request).await,
        }
    }

    async fn expose_authenticated(
        &self,
        mut identity: Identity,
        request: &ExposeRequest,
    ) -> Result<(), EngineError> {
        if identity.account_id.is_none() {
            self.backfill_account_id(&mut identity).await?;
        }
        self.rotator.mark_used(&mut identity).await?;

        let hostname = request
            .subdomain
            .clone()
            .ok_or(EngineError::HostnameRequired)?;
        let zone_id = self.resolve_zone(&identity, &hostname).await?;

        let tunnel_name = naming::mirage_name();
        let tunnel = self.control.create_tunnel(&identity, &tunnel_name).await?;
        info!(tunnel = %tunnel_name, id = %tunnel.id, "Tunnel registered");

        let run_token = self.obtain_run_token(&identity, &tunnel).await?;

        let target = format!("{}.{}", tunnel.id, naming::ROUTING_DOMAIN);
        let record_id = self
            .reconcile_dns(&identity, &zone_id, &hostname, &target)
            .await?;

        // The DNS record now exists remotely: everything from here to the
        // end of supervision runs under the cleanup obligation.
        let run_result = self
            .run_supervised(request, &tunnel, &tunnel_name, &hostname, &run_token)
            .await;

        if let Err(e) = self
            .control
            .delete_dns_record(&identity, &zone_id, &record_id)
            .await
        {
            warn!(record = %record_id, error = %e, "Failed to remove DNS record during cleanup");
        } else {
            info!(hostname = %hostname, "DNS record removed");
        }

        run_result
    }

    async fn run_supervised(
        &self,
        request: &ExposeRequest,
        tunnel: &ProvisionedTunnel,
        tunnel_name: &str,
        hostname: &str,
        run_token: &str,
    ) -> Result<(), EngineError> {
        let config_path = ingress::write_session_config(
            &self.session_config_dir,
            tunnel_name,
            &tunnel.id,
            hostname,
            &request.local_url(),
            request.no_tls_verify,
        )?;

        info!(
            url = %format!("https://{hostname}"),
            origin = %request.local_url(),
            "Mirage is live"
        );
        self.runner.run_named(&config_path, run_token).await
    }

    /// Re-verify the secret to learn the account id, persist it, and record
    /// the required re-verification as a rotation signal.
    async fn backfill_account_id(&self, identity: &mut Identity) -> Result<(), EngineError> {
        let account_id = self.control.verify_credential(&identity.secret).await?;
        debug!(alias = %identity.alias, "Account id resolved");
        identity.account_id = Some(account_id);
        self.rotator.report_failure(identity).await?;
        Ok(())
    }

    /// Exact zone match first, then a single parent-domain fallback.
    async fn resolve_zone(
        &self,
        identity: &Identity,
        hostname: &str,
    ) -> Result<String, EngineError> {
        if let Some(zone) = self.control.find_zone(identity, hostname).await? {
            return Ok(zone);
        }

        let labels: Vec<&str> = hostname.split('.').collect();
        if labels.len() > 2 {
            let parent = labels[1..].join(".");
            if let Some(zone) = self.control.find_zone(identity, &parent).await? {
                return Ok(zone);
            }
        }

        Err(EngineError::ZoneNotFound(hostname.to_string()))
    }

    /// Use the run token from the creation response when present; otherwise
    /// poll for it with linear backoff to ride out propagation delay.
    async fn obtain_run_token(
        &self,
        identity: &Identity,
        tunnel: &ProvisionedTunnel,
    ) -> Result<String, EngineError> {
        if let Some(token) = &tunnel.run_token {
            return Ok(token.clone());
        }

        let mut last_error = None;
        for attempt in 1..=SECRET_POLL_ATTEMPTS {
            sleep(Duration::from_secs(u64::from(attempt))).await;
            match self.control.tunnel_run_token(identity, &tunnel.id).await {
                Ok(token) => return Ok(token),
                Err(e) => {
                    debug!(attempt, error = %e, "Run token not available yet");
                    last_error = Some(e);
                }
            }
        }

        Err(EngineError::SecretPropagationTimeout {
            attempts: SECRET_POLL_ATTEMPTS,
            source: last_error
                .unwrap_or_else(|| CloudflareError::Malformed("no attempts made".into())),
        })
    }

    /// Create the hostname record, healing duplicates left by prior runs.
    async fn reconcile_dns(
        &self,
        identity: &Identity,
        zone_id: &str,
        hostname: &str,
        target: &str,
    ) -> Result<String, EngineError> {
        match self
            .control
            .create_dns_record(identity, zone_id, hostname, target, true)
            .await
        {
            Ok(id) => Ok(id),
            Err(e) if e.is_record_conflict() => {
                debug!(hostname, "DNS record already exists, reconciling");
                let existing = self
                    .control
                    .list_dns_records(identity, zone_id, Some(hostname))
                    .await?;
                match existing.split_first() {
                    Some((canonical, duplicates)) => {
                        let id = self
                            .control
                            .update_dns_record(
                                identity,
                                zone_id,
                                &canonical.id,
                                hostname,
                                target,
                                true,
                            )
                            .await?;
                        for duplicate in duplicates {
                            self.control
                                .delete_dns_record(identity, zone_id, &duplicate.id)
                                .await?;
                            debug!(record = %duplicate.id, "Deleted duplicate DNS record");
                        }
                        Ok(id)
                    }
                    // Conflict reported but nothing listed: the record went
                    // away between calls. One more create.
                    None => Ok(self
                        .control
                        .create_dns_record(identity, zone_id, hostname, target, true)
                        .await?),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort scan of every active identity's owned tunnels.
    ///
    /// Identities that fail verification or listing are skipped with a
    /// warning; the scan itself never fails part-way.
    pub async fn list_mirages(
        &self,
    ) -> Result<BTreeMap<String, Vec<TunnelSummary>>, EngineError> {
        let mut mirages = BTreeMap::new();
        for mut identity in self.rotator.list_all().await? {
            if identity.account_id.is_none()
                && let Err(e) = self.backfill_account_id(&mut identity).await
            {
                warn!(alias = %identity.alias, error = %e, "Skipping identity: verification failed");
                continue;
            }
            match self.control.list_tunnels(&identity).await {
                Ok(tunnels) => {
                    let owned = tunnels
                        .into_iter()
                        .filter(|t| naming::is_mirage(&t.name) && t.deleted_at.is_none())
                        .collect();
                    mirages.insert(identity.alias.clone(), owned);
                }
                Err(e) => {
                    warn!(alias = %identity.alias, error = %e, "Skipping identity: listing failed");
                }
            }
        }
        Ok(mirages)
    }

    /// Delete every owned tunnel across every identity. Per-identity and
    /// per-tunnel failures are counted, never propagated.
    pub async fn nuke_all(&self) -> Result<NukeReport, EngineError> {
        let mut report = NukeReport::default();
        for mut identity in self.rotator.list_all().await? {
            if identity.account_id.is_none()
                && let Err(e) = self.backfill_account_id(&mut identity).await
            {
                warn!(alias = %identity.alias, error = %e, "Skipping identity: verification failed");
                continue;
            }
            let tunnels = match self.control.list_tunnels(&identity).await {
                Ok(tunnels) => tunnels,
                Err(e) => {
                    warn!(alias = %identity.alias, error = %e, "Skipping identity: listing failed");
                    continue;
                }
            };
            for tunnel in tunnels
                .into_iter()
                .filter(|t| naming::is_mirage(&t.name) && t.deleted_at.is_none())
            {
                match self.control.delete_tunnel(&identity, &tunnel.id).await {
                    Ok(()) => {
                        info!(tunnel = %tunnel.name, "Tunnel deleted");
                        report.deleted += 1;
                    }
                    Err(e) => {
                        warn!(tunnel = %tunnel.name, error = %e, "Failed to delete tunnel");
                        report.failed += 1;
                    }
                }
            }
        }
        Ok(report)
    }
}
