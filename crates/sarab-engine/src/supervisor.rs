//! `cloudflared` process supervision.
//!
//! Launches the executable in named-tunnel or quick-tunnel mode and blocks
//! for its entire lifetime. A user interrupt is forwarded as SIGINT with a
//! bounded graceful wait; both interruption and a non-zero exit count as
//! normal termination so the orchestrator's cleanup always runs afterwards.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::artifact::ArtifactStore;
use crate::control::TunnelRunner;
use crate::error::EngineError;
use crate::logfilter;
use crate::session::ExposeRequest;

/// Supervises one `cloudflared` process per session.
pub struct CloudflaredSupervisor {
    artifacts: ArtifactStore,
    /// Timeout for graceful termination before SIGKILL.
    terminate_timeout: Duration,
}

impl CloudflaredSupervisor {
    pub fn new(artifacts: ArtifactStore) -> Self {
        Self {
            artifacts,
            terminate_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_terminate_timeout(mut self, timeout: Duration) -> Self {
        self.terminate_timeout = timeout;
        self
    }

    /// Spawn the executable and block until it exits or Ctrl-C arrives.
    async fn spawn_and_wait(&self, args: &[&str]) -> Result<(), EngineError> {
        let binary = self.artifacts.resolve().await?;

        let mut child = Command::new(&binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                EngineError::ExecutableUnavailable(format!(
                    "failed to launch {}: {e}",
                    binary.display()
                ))
            })?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, false));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, true));
        }

        let exited = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::signal::ctrl_c() => None,
        };

        match exited {
            Some(Ok(status)) => info!(?status, "Tunnel process exited"),
            Some(Err(e)) => warn!(error = %e, "Error waiting for tunnel process"),
            None => {
                info!("Interrupt received, stopping tunnel process");
                self.interrupt(child).await;
            }
        }

        Ok(())
    }

    /// Forward SIGINT and wait for a graceful exit, killing on timeout.
    async fn interrupt(&self, mut child: Child) {
        #[cfg(unix)]
        {
            if let Some(pid) = child.id() {
                // SAFETY: pid is a valid process ID obtained from our own
                // Child handle. kill(2) with SIGINT is safe to call on any
                // owned subprocess.
                #[allow(unsafe_code)]
                #[allow(clippy::cast_possible_wrap)]
                let ret = unsafe { libc::kill(pid as i32, libc::SIGINT) };
                if ret != 0 {
                    let err = std::io::Error::last_os_error();
                    warn!(pid, error = %err, "Failed to send SIGINT");
                }
            }
        }

        match tokio::time::timeout(self.terminate_timeout, child.wait()).await {
            Ok(Ok(status)) => info!(?status, "Tunnel process exited gracefully"),
            Ok(Err(e)) => {
                warn!(error = %e, "Error waiting for tunnel process");
                child.kill().await.ok();
            }
            Err(_) => {
                warn!("Timeout waiting for graceful shutdown, killing");
                child.kill().await.ok();
            }
        }
    }
}

#[async_trait]
impl TunnelRunner for CloudflaredSupervisor {
    async fn ensure_ready(&self) -> Result<(), EngineError> {
        let binary = self.artifacts.resolve().await?;
        let output = Command::new(&binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| {
                EngineError::ExecutableUnavailable(format!(
                    "cannot run {}: {e}",
                    binary.display()
                ))
            })?;
        if !output.status.success() {
            return Err(EngineError::ExecutableUnavailable(format!(
                "{} failed its version check",
                binary.display()
            )));
        }
        Ok(())
    }

    async fn run_named(&self, config_path: &Path, run_token: &str) -> Result<(), EngineError> {
        let config = config_path.display().to_string();
        self.spawn_and_wait(&["tunnel", "--config", &config, "run", "--token", run_token])
            .await
    }

    async fn run_quick(&self, request: &ExposeRequest) -> Result<(), EngineError> {
        let url = request.local_url();
        let mut args = vec!["tunnel", "--url", &url];
        if request.no_tls_verify {
            args.push("--no-tls-verify");
        }
        self.spawn_and_wait(&args).await
    }
}

/// Stream one diagnostic pipe through the log filter.
#[allow(clippy::print_stdout, clippy::print_stderr)]
async fn forward_lines<R: AsyncRead + Unpin + Send>(reader: R, to_stderr: bool) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(rendered) = logfilter::render_line(&line) {
            if to_stderr {
                eprintln!("{rendered}");
            } else {
                println!("{rendered}");
            }
        }
    }
}
