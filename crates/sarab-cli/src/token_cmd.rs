//! `sarab token` - manage stored identities.

use anyhow::{Context, Result};

use sarab_core::db::unix_timestamp;

use crate::app::App;

#[derive(clap::Subcommand, Debug)]
pub enum TokenAction {
    /// Validate a Cloudflare API token and store it under an alias
    Add {
        /// A friendly name for this identity
        alias: String,
        /// The Cloudflare API token
        secret: String,
    },

    /// List stored identities
    List,

    /// Deactivate a stored identity
    Remove {
        /// Alias of the identity to remove
        alias: String,
    },
}

pub async fn run(app: &App, action: TokenAction) -> Result<()> {
    match action {
        TokenAction::Add { alias, secret } => add(app, &alias, &secret).await,
        TokenAction::List => list(app).await,
        TokenAction::Remove { alias } => remove(app, &alias).await,
    }
}

#[allow(clippy::print_stdout)]
async fn add(app: &App, alias: &str, secret: &str) -> Result<()> {
    println!("Verifying token '{alias}' with Cloudflare...");
    let account_id = app
        .client
        .verify_token(secret)
        .await
        .context("Token verification failed")?;

    app.db
        .add_identity(alias, secret, Some(&account_id))
        .await
        .with_context(|| format!("Failed to store identity '{alias}'"))?;

    println!("Identity '{alias}' added (account {account_id}).");
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn list(app: &App) -> Result<()> {
    let identities = app.db.list_identities().await?;
    if identities.is_empty() {
        println!("No identities stored. Add one with `sarab token add <alias> <secret>`.");
        return Ok(());
    }

    println!("{:<16} {:<10} {:>8}  {}", "ALIAS", "STATUS", "FAILURES", "LAST USED");
    for identity in identities {
        let last_used = identity
            .last_used_at
            .map_or_else(|| "never".to_string(), |ts| ago(unix_timestamp() - ts));
        println!(
            "{:<16} {:<10} {:>8}  {last_used}",
            identity.alias, "active", identity.failure_count
        );
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn remove(app: &App, alias: &str) -> Result<()> {
    if app.db.remove_identity(alias).await? {
        println!("Identity '{alias}' removed.");
    } else {
        println!("No active identity named '{alias}'.");
    }
    Ok(())
}

/// Coarse human-readable elapsed time.
fn ago(seconds: i64) -> String {
    match seconds {
        s if s < 60 => "just now".to_string(),
        s if s < 3600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3600),
        s => format!("{}d ago", s / 86_400),
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_time_buckets() {
        assert_eq!(ago(5), "just now");
        assert_eq!(ago(120), "2m ago");
        assert_eq!(ago(7200), "2h ago");
        assert_eq!(ago(200_000), "2d ago");
    }
}
