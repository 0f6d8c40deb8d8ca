//! `sarab connect` - SSH through a tunnel hostname.

use std::path::Path;

use anyhow::Result;

use sarab_engine::ssh;

use crate::app::App;

pub async fn run(app: &App, target: &str, identity_file: Option<&Path>) -> Result<()> {
    ssh::connect(&app.artifacts()?, target, identity_file).await?;
    Ok(())
}
