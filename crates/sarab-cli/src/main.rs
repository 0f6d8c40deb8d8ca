//! Sarab CLI
//!
//! The illusionist for your local ports: expose a port through an
//! ephemeral Cloudflare tunnel, rotate over stored identities, and clean
//! up after yourself.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

mod app;
mod connect_cmd;
mod expose_cmd;
mod init_cmd;
mod list_cmd;
mod nuke_cmd;
mod token_cmd;

use app::App;

#[derive(Parser, Debug)]
#[command(name = "sarab")]
#[command(version, about = "Expose local ports through ephemeral Cloudflare tunnels", long_about = None)]
struct Cli {
    /// Data directory for the identity store, binaries, and session configs
    #[arg(long, env = "SARAB_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Log level filter (e.g. "info", "debug", "warn")
    #[arg(long, default_value = "info", env = "SARAB_LOG_LEVEL", global = true)]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation)
    #[arg(long, env = "SARAB_LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize the environment: database, tunnel binary
    Init,

    /// Manage stored identities (Cloudflare API tokens)
    Token {
        #[command(subcommand)]
        action: token_cmd::TokenAction,
    },

    /// Expose a local port to the internet
    Expose(expose_cmd::ExposeArgs),

    /// List active mirages (tunnels) across all identities
    List,

    /// Emergency: delete ALL Sarab tunnels on every configured account
    Nuke {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Open an SSH session through a tunnel hostname
    Connect {
        /// SSH target (e.g. user@host.example.com)
        target: String,

        /// Path to a private key file
        #[arg(short = 'i', long)]
        identity_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("sarab={}", cli.log_level);
    sarab_core::tracing_init::init_tracing(&log_filter, cli.log_json);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting sarab");

    let app = App::open(cli.data_dir).await?;

    match cli.command {
        Command::Init => init_cmd::run(&app).await,
        Command::Token { action } => token_cmd::run(&app, action).await,
        Command::Expose(args) => expose_cmd::run(&app, args).await,
        Command::List => list_cmd::run(&app).await,
        Command::Nuke { yes } => nuke_cmd::run(&app, yes).await,
        Command::Connect {
            target,
            identity_file,
        } => connect_cmd::run(&app, &target, identity_file.as_deref()).await,
    }
}
