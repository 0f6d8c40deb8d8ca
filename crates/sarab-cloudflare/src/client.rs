//! Cloudflare v4 REST client.
//!
//! Uses reqwest to call the tunnel, zone, and DNS endpoints. Every call
//! takes the bearer secret explicitly; the client itself holds no
//! credential state.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::CloudflareError;
use crate::types::{DnsRecord, ProvisionedTunnel, TunnelSummary, wire};

/// Default API base URL.
const API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// HTTP timeout for control-plane calls.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare v4 API client.
#[derive(Debug, Clone)]
pub struct CloudflareClient {
    http: reqwest::Client,
    base_url: String,
}

impl CloudflareClient {
    /// Create a client against the production API.
    pub fn new() -> Result<Self, CloudflareError> {
        Self::with_base_url(API_BASE_URL)
    }

    /// Create a client against a custom base URL (tests, staging).
    pub fn with_base_url(base_url: &str) -> Result<Self, CloudflareError> {
        // Ensure a TLS crypto provider is installed (reqwest uses
        // rustls-no-provider). The `Err` case just means it was already
        // installed — safe to ignore.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Validate the `{success, errors, result}` envelope, mapping failures
    /// to `CloudflareError::Api`.
    async fn unwrap_envelope<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<wire::Envelope<T>, CloudflareError> {
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        if !(200..300).contains(&status) {
            // Error bodies usually carry the envelope too, but 5xx pages
            // from intermediaries may not.
            let (code, message) =
                match serde_json::from_str::<wire::Envelope<serde_json::Value>>(&body) {
                    Ok(envelope) => envelope.errors.first().map_or_else(
                        || (None, format!("HTTP {status}")),
                        |e| (e.code, e.message.clone()),
                    ),
                    Err(_) => (None, format!("HTTP {status}")),
                };
            return Err(CloudflareError::Api {
                status,
                code,
                message,
            });
        }

        let envelope: wire::Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| CloudflareError::Malformed(e.to_string()))?;

        if !envelope.success {
            let (code, message) = envelope.errors.first().map_or_else(
                || (None, "success=false with no error detail".to_string()),
                |e| (e.code, e.message.clone()),
            );
            return Err(CloudflareError::Api {
                status,
                code,
                message,
            });
        }

        Ok(envelope)
    }

    /// Like [`Self::unwrap_envelope`], but the result field is mandatory.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, CloudflareError> {
        Self::unwrap_envelope(resp)
            .await?
            .result
            .ok_or_else(|| CloudflareError::Malformed("missing result field".into()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        secret: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CloudflareError> {
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(secret)
            .query(query)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        secret: &str,
        path: &str,
        body: &B,
    ) -> Result<T, CloudflareError> {
        let resp = self
            .http
            .request(method, self.url(path))
            .bearer_auth(secret)
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn delete(&self, secret: &str, path: &str) -> Result<(), CloudflareError> {
        let resp = self
            .http
            .delete(self.url(path))
            .bearer_auth(secret)
            .send()
            .await?;
        // Delete endpoints return the deleted object, sometimes null; only
        // the envelope status matters here.
        let _ = Self::unwrap_envelope::<serde_json::Value>(resp).await?;
        Ok(())
    }

    // =========================================================================
    // Credentials and accounts
    // =========================================================================

    /// Verify an API token and resolve the account id it acts on.
    ///
    /// The token must report `active` status and grant access to at least
    /// one account; the first account's id is returned.
    pub async fn verify_token(&self, secret: &str) -> Result<String, CloudflareError> {
        let verify: wire::VerifyResult = self
            .get(secret, "/user/tokens/verify", &[])
            .await
            .map_err(|e| match e {
                CloudflareError::Api { status, .. } if status == 401 || status == 403 => {
                    CloudflareError::CredentialInvalid
                }
                other => other,
            })?;
        if verify.status != "active" {
            debug!(status = %verify.status, "Token verification returned non-active status");
            return Err(CloudflareError::CredentialInvalid);
        }

        let accounts: Vec<wire::Account> = self.get(secret, "/accounts", &[]).await?;
        accounts
            .into_iter()
            .next()
            .map(|a| a.id)
            .ok_or(CloudflareError::NoAccountAccess)
    }

    // =========================================================================
    // Tunnels
    // =========================================================================

    /// Register a new remotely-configured tunnel.
    pub async fn create_tunnel(
        &self,
        secret: &str,
        account_id: &str,
        name: &str,
    ) -> Result<ProvisionedTunnel, CloudflareError> {
        let request = wire::CreateTunnelRequest {
            name,
            config_src: "cloudflare",
        };
        let created: wire::TunnelResult = self
            .send_json(
                reqwest::Method::POST,
                secret,
                &format!("/accounts/{account_id}/tunnels"),
                &request,
            )
            .await?;
        Ok(ProvisionedTunnel {
            id: created.id,
            run_token: created.token,
        })
    }

    /// Fetch the run token for an existing tunnel.
    pub async fn tunnel_token(
        &self,
        secret: &str,
        account_id: &str,
        tunnel_id: &str,
    ) -> Result<String, CloudflareError> {
        let token: String = self
            .get(
                secret,
                &format!("/accounts/{account_id}/tunnels/{tunnel_id}/token"),
                &[],
            )
            .await?;
        if token.is_empty() {
            return Err(CloudflareError::Malformed("empty tunnel token".into()));
        }
        Ok(token)
    }

    /// List tunnels not yet deleted remotely.
    pub async fn list_tunnels(
        &self,
        secret: &str,
        account_id: &str,
    ) -> Result<Vec<TunnelSummary>, CloudflareError> {
        let tunnels: Vec<wire::TunnelResult> = self
            .get(
                secret,
                &format!("/accounts/{account_id}/tunnels"),
                &[("is_deleted", "false")],
            )
            .await?;
        Ok(tunnels
            .into_iter()
            .map(|t| TunnelSummary {
                id: t.id,
                name: t.name.unwrap_or_default(),
                deleted_at: t.deleted_at,
            })
            .collect())
    }

    /// Delete a tunnel.
    pub async fn delete_tunnel(
        &self,
        secret: &str,
        account_id: &str,
        tunnel_id: &str,
    ) -> Result<(), CloudflareError> {
        self.delete(secret, &format!("/accounts/{account_id}/tunnels/{tunnel_id}"))
            .await
    }

    // =========================================================================
    // Zones and DNS records
    // =========================================================================

    /// Look up a zone id by exact zone name. `None` when no zone matches.
    pub async fn find_zone(
        &self,
        secret: &str,
        name: &str,
    ) -> Result<Option<String>, CloudflareError> {
        let zones: Vec<wire::ZoneResult> =
            self.get(secret, "/zones", &[("name", name)]).await?;
        Ok(zones.into_iter().next().map(|z| z.id))
    }

    /// Create a proxied CNAME record. Conflicts with an existing record are
    /// reported as an API error recognisable via
    /// [`CloudflareError::is_record_conflict`].
    pub async fn create_dns_record(
        &self,
        secret: &str,
        zone_id: &str,
        name: &str,
        content: &str,
        proxied: bool,
    ) -> Result<String, CloudflareError> {
        let request = wire::DnsRecordRequest {
            record_type: "CNAME",
            name,
            content,
            ttl: 1,
            proxied,
        };
        let record: wire::DnsRecordResult = self
            .send_json(
                reqwest::Method::POST,
                secret,
                &format!("/zones/{zone_id}/dns_records"),
                &request,
            )
            .await?;
        Ok(record.id)
    }

    /// Overwrite an existing record in place.
    pub async fn update_dns_record(
        &self,
        secret: &str,
        zone_id: &str,
        record_id: &str,
        name: &str,
        content: &str,
        proxied: bool,
    ) -> Result<String, CloudflareError> {
        let request = wire::DnsRecordRequest {
            record_type: "CNAME",
            name,
            content,
            ttl: 1,
            proxied,
        };
        let record: wire::DnsRecordResult = self
            .send_json(
                reqwest::Method::PUT,
                secret,
                &format!("/zones/{zone_id}/dns_records/{record_id}"),
                &request,
            )
            .await?;
        Ok(record.id)
    }

    /// Delete a DNS record.
    pub async fn delete_dns_record(
        &self,
        secret: &str,
        zone_id: &str,
        record_id: &str,
    ) -> Result<(), CloudflareError> {
        self.delete(secret, &format!("/zones/{zone_id}/dns_records/{record_id}"))
            .await
    }

    /// List records in a zone, optionally filtered by exact name.
    pub async fn list_dns_records(
        &self,
        secret: &str,
        zone_id: &str,
        name: Option<&str>,
    ) -> Result<Vec<DnsRecord>, CloudflareError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(name) = name {
            query.push(("name", name));
        }
        let records: Vec<wire::DnsRecordResult> = self
            .get(secret, &format!("/zones/{zone_id}/dns_records"), &query)
            .await?;
        Ok(records
            .into_iter()
            .map(|r| DnsRecord {
                id: r.id,
                name: r.name,
                record_type: r.record_type,
                content: r.content,
            })
            .collect())
    }
}
