//! Save directory resolution.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Name of the save directory under a development project root.
pub const DEVELOPMENT_DIR_NAME: &str = "GameData";

/// Where the save file lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SaveLocation {
    /// The platform per-user data directory of a deployed build.
    Persistent {
        qualifier: String,
        organization: String,
        application: String,
    },
    /// `<project_root>/GameData`, used while developing the game.
    Development { project_root: PathBuf },
    /// Exactly this directory.
    Explicit { path: PathBuf },
}

impl Default for SaveLocation {
    fn default() -> Self {
        Self::persistent("com", "gamedata", "gamedata")
    }
}

impl SaveLocation {
    pub fn persistent(
        qualifier: impl Into<String>,
        organization: impl Into<String>,
        application: impl Into<String>,
    ) -> Self {
        Self::Persistent {
            qualifier: qualifier.into(),
            organization: organization.into(),
            application: application.into(),
        }
    }

    pub fn development(project_root: impl Into<PathBuf>) -> Self {
        Self::Development {
            project_root: project_root.into(),
        }
    }

    pub fn explicit(path: impl Into<PathBuf>) -> Self {
        Self::Explicit { path: path.into() }
    }

    /// Resolve the directory without touching the filesystem.
    pub fn resolve(&self) -> StoreResult<PathBuf> {
        match self {
            SaveLocation::Persistent {
                qualifier,
                organization,
                application,
            } => directories::ProjectDirs::from(qualifier, organization, application)
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or(StoreError::NoDataDirectory),
            SaveLocation::Development { project_root } => {
                Ok(project_root.join(DEVELOPMENT_DIR_NAME))
            }
            SaveLocation::Explicit { path } => Ok(path.clone()),
        }
    }

    /// Resolve the directory and create it if it does not exist yet.
    pub fn ensure(&self) -> StoreResult<PathBuf> {
        let dir = self.resolve()?;
        ensure_dir(&dir)?;
        Ok(dir)
    }
}

/// Create `dir` and all of its parents if missing.
pub(crate) fn ensure_dir(dir: &Path) -> StoreResult<()> {
    if !dir.is_dir() {
        fs::create_dir_all(dir)?;
        debug!(dir = %dir.display(), "created save directory");
    }
    Ok(())
}
