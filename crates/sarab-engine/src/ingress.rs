//! Local ingress configuration for named tunnels.
//!
//! One YAML file per session, keyed by the generated tunnel name. The file
//! is the source of ingress truth for the supervised process; it is
//! overwritten on reuse and deliberately left behind after the session for
//! diagnostics.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// On-disk ingress file, in the layout `cloudflared` expects.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngressFile {
    pub tunnel: String,
    #[serde(rename = "credentials-file")]
    pub credentials_file: PathBuf,
    pub ingress: Vec<IngressRule>,
}

/// One routing rule. Rules are ordered; the final rule must be the
/// catch-all with no hostname.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngressRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub service: String,
    #[serde(rename = "originRequest", skip_serializing_if = "Option::is_none")]
    pub origin_request: Option<OriginRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OriginRequest {
    #[serde(rename = "noTLSVerify")]
    pub no_tls_verify: bool,
}

/// Service for requests matching no rule.
const CATCH_ALL_SERVICE: &str = "http_status:404";

/// Write the per-session ingress file and return its path.
pub fn write_session_config(
    config_dir: &Path,
    tunnel_name: &str,
    tunnel_id: &str,
    hostname: &str,
    service: &str,
    no_tls_verify: bool,
) -> Result<PathBuf, EngineError> {
    let file = IngressFile {
        tunnel: tunnel_id.to_string(),
        // Run tokens carry the credentials; the file only needs to exist as
        // a config key.
        credentials_file: config_dir.join(format!("{tunnel_name}.json")),
        ingress: vec![
            IngressRule {
                hostname: Some(hostname.to_string()),
                service: service.to_string(),
                origin_request: no_tls_verify.then_some(OriginRequest {
                    no_tls_verify: true,
                }),
            },
            IngressRule {
                hostname: None,
                service: CATCH_ALL_SERVICE.to_string(),
                origin_request: None,
            },
        ],
    };

    let yaml = serde_yaml::to_string(&file).map_err(|e| EngineError::Config(e.to_string()))?;
    let path = config_dir.join(format!("{tunnel_name}.yml"));
    std::fs::write(&path, yaml)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn writes_rules_in_order_with_catch_all_last() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_session_config(
            tmp.path(),
            "sarab-abcd1234",
            "tid-1",
            "api.example.com",
            "http://127.0.0.1:3000",
            false,
        )
        .unwrap();

        assert_eq!(path, tmp.path().join("sarab-abcd1234.yml"));
        let parsed: IngressFile =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(parsed.tunnel, "tid-1");
        assert_eq!(parsed.ingress.len(), 2);
        assert_eq!(parsed.ingress[0].hostname.as_deref(), Some("api.example.com"));
        assert_eq!(parsed.ingress[0].service, "http://127.0.0.1:3000");
        assert!(parsed.ingress[0].origin_request.is_none());
        assert!(parsed.ingress[1].hostname.is_none());
        assert_eq!(parsed.ingress[1].service, CATCH_ALL_SERVICE);
    }

    #[test]
    fn tls_verification_flag_appears_only_when_set() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_session_config(
            tmp.path(),
            "sarab-ffff0000",
            "tid-2",
            "api.example.com",
            "https://127.0.0.1:8443",
            true,
        )
        .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("noTLSVerify: true"));

        let parsed: IngressFile = serde_yaml::from_str(&raw).unwrap();
        assert!(parsed.ingress[0].origin_request.as_ref().unwrap().no_tls_verify);
    }

    #[test]
    fn rerun_overwrites_the_same_file() {
        let tmp = tempfile::tempdir().unwrap();
        let first = write_session_config(
            tmp.path(),
            "sarab-same",
            "tid-1",
            "a.example.com",
            "http://127.0.0.1:1",
            false,
        )
        .unwrap();
        let second = write_session_config(
            tmp.path(),
            "sarab-same",
            "tid-2",
            "b.example.com",
            "http://127.0.0.1:2",
            false,
        )
        .unwrap();

        assert_eq!(first, second);
        let parsed: IngressFile =
            serde_yaml::from_str(&std::fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(parsed.tunnel, "tid-2");
    }
}
