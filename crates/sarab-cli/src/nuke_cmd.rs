//! `sarab nuke` - bulk teardown of every owned tunnel.

use anyhow::Result;
use dialoguer::Confirm;

use crate::app::App;

#[allow(clippy::print_stdout)]
pub async fn run(app: &App, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(
                "This will delete ALL tunnels starting with 'sarab-' from ALL configured accounts. Continue?",
            )
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Operation cancelled.");
            return Ok(());
        }
    }

    println!("Nuking all mirages...");
    let report = app.illusionist()?.nuke_all().await?;

    if report.failed > 0 {
        println!(
            "Nuke finished: {} deleted, {} failed (see log for details).",
            report.deleted, report.failed
        );
    } else {
        println!("Nuke complete: {} tunnel(s) deleted.", report.deleted);
    }
    Ok(())
}
