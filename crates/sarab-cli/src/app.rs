//! Shared command context: resolved paths, the identity store, and the
//! control-plane client.

use std::path::PathBuf;

use anyhow::{Context, Result};

use sarab_cloudflare::CloudflareClient;
use sarab_core::config::Paths;
use sarab_engine::artifact::ArtifactStore;
use sarab_engine::{CloudflaredSupervisor, IdentityRotator, Illusionist};
use sarab_store::Database;

pub struct App {
    pub paths: Paths,
    pub db: Database,
    pub client: CloudflareClient,
}

impl App {
    /// Resolve paths and open the identity store (running migrations).
    pub async fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let paths = Paths::resolve(data_dir).context("Failed to resolve data directory")?;
        let db = Database::open(&paths.db_path())
            .await
            .context("Failed to open identity store")?;
        let client = CloudflareClient::new().context("Failed to build control-plane client")?;
        Ok(Self { paths, db, client })
    }

    pub fn artifacts(&self) -> Result<ArtifactStore> {
        let bin_dir = self.paths.bin_dir()?;
        Ok(ArtifactStore::new(bin_dir)?)
    }

    /// Assemble the orchestrator over the real collaborators.
    pub fn illusionist(&self) -> Result<Illusionist<CloudflareClient, CloudflaredSupervisor>> {
        let supervisor = CloudflaredSupervisor::new(self.artifacts()?);
        Ok(Illusionist::new(
            IdentityRotator::new(self.db.clone()),
            self.client.clone(),
            supervisor,
            self.paths.session_config_dir()?,
        ))
    }
}
