//! `sarab init` - prepare the environment.

use anyhow::Result;

use crate::app::App;

/// Make sure the database exists (opening it ran migrations) and a tunnel
/// binary is available, downloading one when necessary.
#[allow(clippy::print_stdout)]
pub async fn run(app: &App) -> Result<()> {
    println!("Data directory: {}", app.paths.root().display());
    println!("Identity store ready: {}", app.paths.db_path().display());

    match app.artifacts()?.resolve().await {
        Ok(path) => println!("cloudflared available: {}", path.display()),
        Err(e) => {
            println!("cloudflared not available: {e}");
            println!("Install it manually or ensure it is on PATH, then re-run `sarab init`.");
        }
    }

    println!("Initialization complete.");
    Ok(())
}
