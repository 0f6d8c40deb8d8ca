//! Filesystem layout for Sarab state.
//!
//! Everything Sarab persists lives under a single data directory
//! (default `~/.sarab`): the identity database, downloaded binaries, and
//! per-session ingress config files.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name of the data directory under the user's home.
const DATA_DIR_NAME: &str = ".sarab";

/// Errors resolving or creating the data directory.
#[derive(Debug, Error)]
pub enum PathsError {
    #[error("cannot determine home directory")]
    NoHome,

    #[error("failed to create {path}: {source}")]
    Create {
        path: String,
        source: std::io::Error,
    },
}

/// Resolved filesystem layout for one Sarab installation.
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Resolve the data directory, creating it if needed.
    ///
    /// `override_dir` wins over the default `~/.sarab`.
    pub fn resolve(override_dir: Option<PathBuf>) -> Result<Self, PathsError> {
        let root = match override_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .ok_or(PathsError::NoHome)?
                .join(DATA_DIR_NAME),
        };
        create_dir(&root)?;
        Ok(Self { root })
    }

    /// The data directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Identity database file.
    pub fn db_path(&self) -> PathBuf {
        self.root.join("sarab.db")
    }

    /// Directory holding downloaded executables.
    pub fn bin_dir(&self) -> Result<PathBuf, PathsError> {
        let dir = self.root.join("bin");
        create_dir(&dir)?;
        Ok(dir)
    }

    /// Directory holding per-session ingress config files.
    pub fn session_config_dir(&self) -> Result<PathBuf, PathsError> {
        let dir = self.root.join("configs");
        create_dir(&dir)?;
        Ok(dir)
    }
}

fn create_dir(path: &Path) -> Result<(), PathsError> {
    std::fs::create_dir_all(path).map_err(|source| PathsError::Create {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn override_dir_is_used_and_created() {
        let tmp = tempfile::tempdir().unwrap();
        let custom = tmp.path().join("custom-data");
        let paths = Paths::resolve(Some(custom.clone())).unwrap();

        assert_eq!(paths.root(), custom.as_path());
        assert!(custom.is_dir());
        assert_eq!(paths.db_path(), custom.join("sarab.db"));
    }

    #[test]
    fn subdirectories_are_created_on_demand() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::resolve(Some(tmp.path().join("d"))).unwrap();

        let bin = paths.bin_dir().unwrap();
        let configs = paths.session_config_dir().unwrap();
        assert!(bin.is_dir());
        assert!(configs.is_dir());
    }
}
