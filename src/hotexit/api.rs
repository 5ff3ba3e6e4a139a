//! # API Facade
//!
//! The single entry point for workspace open/restore logic and for the CLI.
//! It combines the synchronous [`BackupRegistry`] with per-workspace
//! [`FsBackupStore`]s and the live [`SharedSettings`].
//!
//! Like the rest of the library it never prints and never exits; it returns
//! plain Rust types and leaves presentation to the caller.
//!
//! ## Workspace lifecycle
//!
//! - **Open**: the workspace is tracked in the registry and gets a backup
//!   store that the orchestrator writes through.
//! - **Clean close**: every backup of the workspace is discarded, then the
//!   workspace is untracked.
//! - **Hot exit**: the workspace stays tracked and its backups stay on disk;
//!   on next launch it shows up in [`HotExitApi::recoverable_workspaces`].
//!
//! Every store the facade hands out shares one [`PathQueue`], so backup I/O
//! issued through the facade, through [`HotExitApi::open_workspace`]'s store
//! and through a workspace discard all land in submission order.

use crate::config::{HotExitConfig, SharedSettings};
use crate::error::Result;
use crate::model::{BackupEntry, Resource};
use crate::paths::BackupPaths;
use crate::registry::BackupRegistry;
use crate::store::fs::FsBackupStore;
use crate::store::queue::PathQueue;
use crate::store::{BackupFuture, BackupStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Backup status of one tracked workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceStatus {
    pub path: String,
    pub has_backup: bool,
    pub backup_count: usize,
}

/// An untitled document recovered from its backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredDocument {
    pub resource: Resource,
    pub content: String,
}

pub struct HotExitApi {
    registry: BackupRegistry,
    settings: SharedSettings,
    queue: PathQueue,
}

impl HotExitApi {
    pub fn new(paths: BackupPaths, settings: SharedSettings) -> Self {
        Self {
            registry: BackupRegistry::load(paths),
            settings,
            queue: PathQueue::new(),
        }
    }

    /// Load settings from the config directory (defaults if absent) and the
    /// registry from the backup home.
    pub fn open(paths: BackupPaths) -> Result<Self> {
        let config = HotExitConfig::load(&paths.config_dir)?;
        Ok(Self::new(paths, SharedSettings::new(config)))
    }

    pub fn paths(&self) -> &BackupPaths {
        self.registry.paths()
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    // --- Queries ---

    pub fn tracked_workspaces(&self) -> &[String] {
        self.registry.workspace_backup_paths()
    }

    pub fn workspace_statuses(&self) -> Vec<WorkspaceStatus> {
        self.tracked_workspaces()
            .iter()
            .map(|path| WorkspaceStatus {
                path: path.clone(),
                has_backup: self.registry.has_workspace_backup(path),
                backup_count: self.registry.workspace_backups(path).len(),
            })
            .collect()
    }

    /// Tracked workspaces that still have backups on disk.
    pub fn recoverable_workspaces(&self) -> Vec<String> {
        self.tracked_workspaces()
            .iter()
            .filter(|w| self.registry.has_workspace_backup(w))
            .cloned()
            .collect()
    }

    pub fn untitled_backups(&self, workspace: &str) -> Vec<PathBuf> {
        self.registry.workspace_untitled_backups(workspace)
    }

    pub fn has_workspace_backup(&self, workspace: &str) -> bool {
        self.registry.has_workspace_backup(workspace)
    }

    pub fn workspace_backups(&self, workspace: &str) -> Vec<BackupEntry> {
        self.registry.workspace_backups(workspace)
    }

    /// Backup store for `workspace`; without one, every operation is a no-op.
    pub fn backup_store(&self, workspace: Option<&str>) -> FsBackupStore {
        FsBackupStore::with_queue(
            self.paths().clone(),
            workspace.map(str::to_string),
            self.queue.clone(),
        )
    }

    pub fn backup_location(&self, workspace: Option<&str>, resource: &Resource) -> Option<PathBuf> {
        self.backup_store(workspace).backup_location(resource)
    }

    // The backup I/O below takes its place in line when called, not when
    // the returned future is first polled.

    pub fn read_backup(&self, workspace: &str, resource: &Resource) -> BackupFuture<Option<String>> {
        self.backup_store(Some(workspace)).read_backup(resource)
    }

    pub fn write_backup(
        &self,
        workspace: &str,
        resource: &Resource,
        content: String,
    ) -> BackupFuture<()> {
        self.backup_store(Some(workspace))
            .write_backup(resource, content)
    }

    pub fn discard_backup(&self, workspace: &str, resource: &Resource) -> BackupFuture<()> {
        self.backup_store(Some(workspace)).discard_backup(resource)
    }

    /// Untitled documents to reopen for `workspace`, with their content.
    ///
    /// Backups that vanish or can't be read between listing and reading are
    /// skipped; recovery is best effort.
    pub async fn restore_untitled(&self, workspace: &str) -> Vec<RestoredDocument> {
        let store = self.backup_store(Some(workspace));
        let mut restored = Vec::new();
        for path in self.untitled_backups(workspace) {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let resource = Resource::untitled(name);
            match store.read_backup(&resource).await {
                Ok(Some(content)) => restored.push(RestoredDocument { resource, content }),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), err = %e, "skipping unreadable backup"),
            }
        }
        restored
    }

    // --- Lifecycle ---

    /// Track `workspace` and hand back the store its documents back up to.
    pub fn open_workspace(&mut self, workspace: Option<&str>) -> Arc<FsBackupStore> {
        if let Some(workspace) = workspace {
            self.registry.push_workspace_backup_paths([workspace]);
        }
        Arc::new(self.backup_store(workspace))
    }

    pub fn track_workspaces<S: AsRef<str>>(&mut self, workspaces: &[S]) {
        self.registry
            .push_workspace_backup_paths(workspaces.iter().map(|w| w.as_ref()));
    }

    pub fn untrack_workspace(&mut self, workspace: &str) {
        self.registry.remove_workspace_backup_path(workspace);
    }

    /// Close a workspace. A clean close drops its backups and stops tracking
    /// it; otherwise everything is left for the next launch to restore.
    pub async fn close_workspace(&mut self, workspace: &str, clean: bool) -> Result<()> {
        if !clean {
            info!(workspace, "closing workspace, keeping backups for hot exit");
            return Ok(());
        }
        self.discard_workspace(workspace).await
    }

    /// Delete every backup of `workspace` and untrack it.
    ///
    /// The workspace stays tracked if the delete fails, so its leftovers are
    /// still found next time.
    pub async fn discard_workspace(&mut self, workspace: &str) -> Result<()> {
        self.backup_store(Some(workspace))
            .discard_all_backups()
            .await?;
        self.registry.remove_workspace_backup_path(workspace);
        info!(workspace, "discarded workspace backups");
        Ok(())
    }

    /// Change the hot exit setting and persist it.
    pub fn set_hot_exit(&self, enabled: bool) -> Result<()> {
        self.settings.set_hot_exit(enabled);
        self.settings.snapshot().save(&self.paths().config_dir)
    }
}
