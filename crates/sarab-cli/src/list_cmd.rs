//! `sarab list` - show active mirages across all identities.

use anyhow::Result;

use crate::app::App;

#[allow(clippy::print_stdout)]
pub async fn run(app: &App) -> Result<()> {
    println!("Scanning accounts...");
    let mirages = app.illusionist()?.list_mirages().await?;

    if mirages.values().all(Vec::is_empty) {
        println!("No active mirages found.");
        return Ok(());
    }

    println!("{:<16} {:<20} {:<38} STATUS", "IDENTITY", "TUNNEL NAME", "TUNNEL ID");
    for (alias, tunnels) in &mirages {
        for tunnel in tunnels {
            println!("{alias:<16} {:<20} {:<38} active", tunnel.name, tunnel.id);
        }
    }
    Ok(())
}
