//! # Backup Home Layout
//!
//! ```text
//! <backupHome>/
//! ├── workspaces.json                 # Registry of tracked workspaces
//! └── <hash(workspacePath)>/          # One directory per workspace
//!     ├── file/<hash(resourcePath)>   # Backups of dirty files on disk
//!     └── untitled/<name>             # Backups of never-saved documents
//! ```
//!
//! The backup home defaults to the platform data directory and can be
//! overridden with `HOTEXIT_HOME` (tests and the CLI `--home` flag use this).

use crate::error::{HotExitError, Result};
use crate::hash::path_hash;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "HOTEXIT_HOME";
const WORKSPACES_FILENAME: &str = "workspaces.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPaths {
    pub backup_home: PathBuf,
    pub workspaces_json: PathBuf,
    /// Where `settings.json` lives.
    pub config_dir: PathBuf,
}

impl BackupPaths {
    /// Layout rooted at an explicit directory. Settings live next to the backups.
    pub fn from_home<P: AsRef<Path>>(home: P) -> Self {
        let backup_home = home.as_ref().to_path_buf();
        Self {
            workspaces_json: backup_home.join(WORKSPACES_FILENAME),
            config_dir: backup_home.clone(),
            backup_home,
        }
    }

    /// Resolve the layout: explicit override, then `HOTEXIT_HOME`, then the
    /// platform data directory.
    pub fn resolve(home_override: Option<PathBuf>) -> Result<Self> {
        if let Some(home) = home_override {
            return Ok(Self::from_home(home));
        }
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::from_home(PathBuf::from(home)));
        }

        let dirs = ProjectDirs::from("com", "hotexit", "hotexit").ok_or_else(|| {
            HotExitError::Api("Could not determine a home directory for backups".to_string())
        })?;
        let backup_home = dirs.data_dir().join("Backups");
        Ok(Self {
            workspaces_json: backup_home.join(WORKSPACES_FILENAME),
            config_dir: dirs.config_dir().to_path_buf(),
            backup_home,
        })
    }

    /// Move the backups elsewhere, keeping settings where they are.
    pub fn with_backup_home<P: AsRef<Path>>(self, home: P) -> Self {
        let backup_home = home.as_ref().to_path_buf();
        Self {
            workspaces_json: backup_home.join(WORKSPACES_FILENAME),
            backup_home,
            config_dir: self.config_dir,
        }
    }

    /// Backup directory of a workspace. Pure; the directory may not exist.
    pub fn workspace_dir(&self, workspace: &str) -> PathBuf {
        workspace_backup_dir(&self.backup_home, workspace)
    }
}

pub fn workspace_backup_dir(backup_home: &Path, workspace: &str) -> PathBuf {
    backup_home.join(path_hash(workspace))
}
