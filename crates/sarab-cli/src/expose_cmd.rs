//! `sarab expose` - run one tunnel session.

use anyhow::Result;

use sarab_engine::{ExposeRequest, Scheme};

use crate::app::App;

#[derive(clap::Args, Debug)]
pub struct ExposeArgs {
    /// The local port to expose
    pub port: u16,

    /// Full public hostname to request (requires a stored identity)
    #[arg(long)]
    pub subdomain: Option<String>,

    /// Forward traffic to this local host
    #[arg(long, default_value = "127.0.0.1")]
    pub local_host: String,

    /// Protocol scheme of the local service (http, https, ssh)
    #[arg(long, default_value = "http")]
    pub scheme: Scheme,

    /// Disable TLS verification for a local HTTPS service
    #[arg(long)]
    pub no_tls_verify: bool,

    /// Use a specific identity (token alias)
    #[arg(long)]
    pub identity: Option<String>,
}

#[allow(clippy::print_stdout)]
pub async fn run(app: &App, args: ExposeArgs) -> Result<()> {
    println!("Exposing port {}...", args.port);
    if args.scheme == Scheme::Ssh {
        println!("Note: ensure your local SSH server is running (e.g. systemctl status sshd)");
    }

    let request = ExposeRequest {
        port: args.port,
        subdomain: args.subdomain,
        local_host: args.local_host,
        scheme: args.scheme,
        no_tls_verify: args.no_tls_verify,
        identity_alias: args.identity,
    };

    // Blocks for the whole session, interrupt included.
    app.illusionist()?.expose(request).await?;

    println!("Tunnel stopped.");
    Ok(())
}
