use super::queue::PathQueue;
use super::{backup_location, BackupFuture, BackupStore};
use crate::error::{HotExitError, Result};
use crate::model::{Resource, WorkspacesFormat};
use crate::paths::{workspace_backup_dir, BackupPaths};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Filesystem backup store for one workspace.
pub struct FsBackupStore {
    paths: BackupPaths,
    workspace: Option<String>,
    queue: PathQueue,
}

impl FsBackupStore {
    pub fn new(paths: BackupPaths, workspace: Option<String>) -> Self {
        Self::with_queue(paths, workspace, PathQueue::new())
    }

    /// A store whose operations line up with every other store sharing `queue`.
    pub fn with_queue(paths: BackupPaths, workspace: Option<String>, queue: PathQueue) -> Self {
        Self {
            paths,
            workspace: workspace.filter(|w| !w.is_empty()),
            queue,
        }
    }

    pub fn paths(&self) -> &BackupPaths {
        &self.paths
    }

    /// Backup directory of the current workspace.
    pub fn workspace_dir(&self) -> Option<PathBuf> {
        self.workspace
            .as_deref()
            .map(|w| workspace_backup_dir(&self.paths.backup_home, w))
    }

    /// Tracked workspaces, read straight from the registry file.
    ///
    /// Same leniency as the registry: any problem reads as "none".
    pub async fn workspace_backup_paths(&self) -> Vec<String> {
        match fs::read_to_string(&self.paths.workspaces_json).await {
            Ok(raw) => WorkspacesFormat::parse_lenient(&raw).folder_workspaces,
            Err(_) => Vec::new(),
        }
    }
}

impl BackupStore for FsBackupStore {
    fn current_workspace(&self) -> Option<&str> {
        self.workspace.as_deref()
    }

    fn backup_location(&self, resource: &Resource) -> Option<PathBuf> {
        backup_location(&self.paths.backup_home, self.workspace.as_deref(), resource)
    }

    fn has_backup(&self, resource: &Resource) -> BackupFuture<bool> {
        let Some(path) = self.backup_location(resource) else {
            return Box::pin(async { Ok(false) });
        };
        Box::pin(self.queue.enqueue(path.clone(), async move {
            fs::try_exists(&path).await.map_err(HotExitError::Io)
        }))
    }

    fn read_backup(&self, resource: &Resource) -> BackupFuture<Option<String>> {
        let Some(path) = self.backup_location(resource) else {
            return Box::pin(async { Ok(None) });
        };
        Box::pin(self.queue.enqueue(path.clone(), async move {
            match fs::read_to_string(&path).await {
                Ok(content) => Ok(Some(content)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(HotExitError::Io(e)),
            }
        }))
    }

    fn write_backup(&self, resource: &Resource, content: String) -> BackupFuture<()> {
        let Some(path) = self.backup_location(resource) else {
            return Box::pin(async { Ok(()) });
        };
        debug!(resource = %resource, path = %path.display(), "writing backup");
        Box::pin(
            self.queue
                .enqueue(path.clone(), async move { write_atomic(&path, &content).await }),
        )
    }

    fn discard_backup(&self, resource: &Resource) -> BackupFuture<()> {
        let Some(path) = self.backup_location(resource) else {
            return Box::pin(async { Ok(()) });
        };
        debug!(resource = %resource, path = %path.display(), "discarding backup");
        Box::pin(self.queue.enqueue(path.clone(), async move {
            match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(HotExitError::Io(e)),
            }
        }))
    }

    fn discard_all_backups(&self) -> BackupFuture<()> {
        let Some(dir) = self.workspace_dir() else {
            return Box::pin(async { Ok(()) });
        };
        debug!(dir = %dir.display(), "discarding all workspace backups");
        Box::pin(self.queue.enqueue(dir.clone(), async move {
            match fs::remove_dir_all(&dir).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(HotExitError::Io(e)),
            }
        }))
    }
}

/// Write to a temp file next to `path`, then rename over it, so a crash
/// mid-write never leaves a truncated backup behind.
async fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| HotExitError::Store(format!("no parent for {}", path.display())))?;
    fs::create_dir_all(dir).await.map_err(HotExitError::Io)?;

    let tmp_path = dir.join(format!(".backup-{}.tmp", Uuid::new_v4()));
    fs::write(&tmp_path, content)
        .await
        .map_err(HotExitError::Io)?;
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(HotExitError::Io(e));
    }
    Ok(())
}
