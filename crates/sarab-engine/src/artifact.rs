//! Acquisition of the `cloudflared` executable.
//!
//! Resolution order: a previously downloaded binary in the managed bin
//! directory, then whatever `cloudflared` is on PATH, then a fresh download
//! of the latest release (Linux only; other platforms must install
//! manually).

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::info;

use crate::error::EngineError;

/// Release asset URL, completed with `-<arch>`.
const RELEASE_BASE_URL: &str =
    "https://github.com/cloudflare/cloudflared/releases/latest/download/cloudflared-linux";

/// Executable name, also probed on PATH.
const BINARY_NAME: &str = "cloudflared";

/// Locates or installs the tunnel executable.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    http: reqwest::Client,
    bin_dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store managing binaries under `bin_dir`.
    pub fn new(bin_dir: PathBuf) -> Result<Self, EngineError> {
        // Ensure a TLS crypto provider is installed (reqwest uses
        // rustls-no-provider). The `Err` case just means it was already
        // installed — safe to ignore.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| EngineError::ExecutableUnavailable(e.to_string()))?;

        Ok(Self { http, bin_dir })
    }

    /// Path a downloaded binary lives at.
    pub fn managed_path(&self) -> PathBuf {
        self.bin_dir.join(BINARY_NAME)
    }

    /// Resolve a runnable `cloudflared`, downloading one as a last resort.
    pub async fn resolve(&self) -> Result<PathBuf, EngineError> {
        let managed = self.managed_path();
        if managed.exists() {
            return Ok(managed);
        }

        if probe_on_path().await {
            return Ok(PathBuf::from(BINARY_NAME));
        }

        self.download(&managed).await?;
        Ok(managed)
    }

    async fn download(&self, dest: &Path) -> Result<(), EngineError> {
        let url = release_url()?;
        info!(%url, "Downloading cloudflared release");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                EngineError::ExecutableUnavailable(format!("download failed: {e}"))
            })?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| EngineError::ExecutableUnavailable(format!("download failed: {e}")))?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o755);
            tokio::fs::set_permissions(dest, perms).await?;
        }

        info!(path = %dest.display(), "cloudflared installed");
        Ok(())
    }
}

/// Whether a `cloudflared` on PATH answers `--version`.
async fn probe_on_path() -> bool {
    Command::new(BINARY_NAME)
        .arg("--version")
        .output()
        .await
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn release_url() -> Result<String, EngineError> {
    if std::env::consts::OS != "linux" {
        return Err(EngineError::ExecutableUnavailable(format!(
            "automatic download is only supported on Linux; install {BINARY_NAME} manually on {}",
            std::env::consts::OS
        )));
    }
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => {
            return Err(EngineError::ExecutableUnavailable(format!(
                "unsupported architecture: {other}"
            )));
        }
    };
    Ok(format!("{RELEASE_BASE_URL}-{arch}"))
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn managed_path_is_under_bin_dir() {
        let store = ArtifactStore::new(PathBuf::from("/tmp/sarab-test/bin")).unwrap();
        assert_eq!(
            store.managed_path(),
            PathBuf::from("/tmp/sarab-test/bin/cloudflared")
        );
    }

    #[tokio::test]
    async fn resolve_prefers_existing_managed_binary() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().to_path_buf()).unwrap();
        std::fs::write(store.managed_path(), b"#!/bin/sh\n").unwrap();

        let resolved = store.resolve().await.unwrap();
        assert_eq!(resolved, store.managed_path());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn release_url_maps_architecture() {
        let url = release_url().unwrap();
        assert!(url.starts_with(RELEASE_BASE_URL));
        assert!(url.rsplit('-').next().is_some());
    }
}
