//! SSH over an existing tunnel.
//!
//! Builds an `ssh` invocation whose ProxyCommand routes through
//! `cloudflared access`, then hands the terminal to it.

use std::path::Path;

use tokio::process::Command;
use tracing::warn;

use crate::artifact::ArtifactStore;
use crate::error::EngineError;

/// A prepared interactive command.
#[derive(Debug, PartialEq, Eq)]
pub struct SshCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// Build the `ssh` command for a tunnel target.
pub fn build_command(
    cloudflared: &Path,
    target: &str,
    identity_file: Option<&Path>,
) -> SshCommand {
    let proxy = format!(
        "ProxyCommand={} access ssh --hostname %h",
        cloudflared.display()
    );
    let mut args = vec!["-o".to_string(), proxy, target.to_string()];
    if let Some(key) = identity_file {
        args.push("-i".to_string());
        args.push(key.display().to_string());
    }
    SshCommand {
        program: "ssh".to_string(),
        args,
    }
}

/// Resolve the tunnel binary and run an interactive SSH session with
/// inherited stdio, blocking until the shell exits.
pub async fn connect(
    artifacts: &ArtifactStore,
    target: &str,
    identity_file: Option<&Path>,
) -> Result<(), EngineError> {
    let binary = artifacts.resolve().await?;
    let command = build_command(&binary, target, identity_file);

    let status = Command::new(&command.program)
        .args(&command.args)
        .status()
        .await?;
    if !status.success() {
        warn!(?status, "ssh exited with non-zero status");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn proxy_command_routes_through_cloudflared_access() {
        let cmd = build_command(
            &PathBuf::from("/opt/bin/cloudflared"),
            "user@host.example.com",
            None,
        );
        assert_eq!(cmd.program, "ssh");
        assert_eq!(
            cmd.args,
            vec![
                "-o",
                "ProxyCommand=/opt/bin/cloudflared access ssh --hostname %h",
                "user@host.example.com",
            ]
        );
    }

    #[test]
    fn identity_file_is_appended() {
        let cmd = build_command(
            &PathBuf::from("cloudflared"),
            "user@host",
            Some(&PathBuf::from("/home/u/.ssh/id_ed25519")),
        );
        assert_eq!(cmd.args[cmd.args.len() - 2], "-i");
        assert_eq!(cmd.args[cmd.args.len() - 1], "/home/u/.ssh/id_ed25519");
    }
}
