//! # Workspace Registry
//!
//! The registry is the process-wide list of workspaces whose backups should be
//! offered for restoration on the next launch. It lives in a single JSON file,
//! `<backupHome>/workspaces.json`:
//!
//! ```json
//! { "folderWorkspaces": ["/home/me/proj", "/home/me/other"] }
//! ```
//!
//! ## Synchronous by design
//!
//! Registry mutations happen on workspace open/close, which is rare, and
//! must be on disk before the process exits. All I/O here is blocking and
//! every mutation rewrites the whole file, so there is nothing to flush or
//! sequence at shutdown.
//!
//! ## Failure policy
//!
//! - A missing, unreadable or malformed file loads as an empty registry.
//! - A failed save is logged and swallowed. The in-memory set stays
//!   authoritative and the next successful save reconciles the file.
//! - Listing a workspace's backups never fails; unreadable means empty.

use crate::atomic;
use crate::error::{HotExitError, Result};
use crate::model::{BackupEntry, ResourceScheme, WorkspacesFormat};
use crate::paths::BackupPaths;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

pub struct BackupRegistry {
    paths: BackupPaths,
    content: WorkspacesFormat,
}

impl BackupRegistry {
    /// Create the registry and load it from disk.
    pub fn load(paths: BackupPaths) -> Self {
        let mut registry = Self {
            paths,
            content: WorkspacesFormat::default(),
        };
        registry.reload();
        registry
    }

    pub fn paths(&self) -> &BackupPaths {
        &self.paths
    }

    /// Re-read the registry file, resetting to empty on any problem.
    pub fn reload(&mut self) {
        let file = &self.paths.workspaces_json;
        self.content = match fs::read_to_string(file) {
            Ok(raw) => WorkspacesFormat::parse(&raw).unwrap_or_else(|| {
                warn!(path = %file.display(), "ignoring unusable workspace registry");
                WorkspacesFormat::default()
            }),
            Err(e) => {
                debug!(path = %file.display(), err = %e, "no workspace registry, starting empty");
                WorkspacesFormat::default()
            }
        };
    }

    /// Workspaces currently tracked for backup restoration.
    pub fn workspace_backup_paths(&self) -> &[String] {
        &self.content.folder_workspaces
    }

    /// Track each workspace not already tracked, then persist.
    ///
    /// Empty paths are skipped: a window without a workspace has nowhere to
    /// restore its backups to.
    pub fn push_workspace_backup_paths<I, S>(&mut self, workspaces: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for workspace in workspaces {
            let workspace = workspace.as_ref();
            if workspace.is_empty() {
                continue;
            }
            if !self.content.folder_workspaces.iter().any(|w| w == workspace) {
                info!(workspace, "tracking workspace for hot exit");
                self.content.folder_workspaces.push(workspace.to_string());
            }
        }
        self.save();
    }

    /// Stop tracking a workspace. Absent entries are a no-op.
    pub fn remove_workspace_backup_path(&mut self, workspace: &str) {
        let Some(index) = self
            .content
            .folder_workspaces
            .iter()
            .position(|w| w == workspace)
        else {
            return;
        };
        self.content.folder_workspaces.remove(index);
        info!(workspace, "untracked workspace");
        self.save();
    }

    /// Absolute paths of the untitled backups of `workspace`, sorted.
    pub fn workspace_untitled_backups(&self, workspace: &str) -> Vec<PathBuf> {
        let untitled_dir = self
            .paths
            .workspace_dir(workspace)
            .join(ResourceScheme::Untitled.as_str());

        let entries = match fs::read_dir(&untitled_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| !is_in_flight(&entry.file_name().to_string_lossy()))
            .map(|entry| entry.path())
            .collect();
        files.sort();
        files
    }

    /// Whether a backup directory exists for `workspace`.
    pub fn has_workspace_backup(&self, workspace: &str) -> bool {
        self.paths.workspace_dir(workspace).is_dir()
    }

    /// Every backup file of `workspace` across both schemes, for recovery display.
    pub fn workspace_backups(&self, workspace: &str) -> Vec<BackupEntry> {
        let dir = self.paths.workspace_dir(workspace);
        let mut backups = Vec::new();
        for scheme in [ResourceScheme::File, ResourceScheme::Untitled] {
            collect_entries(&dir.join(scheme.as_str()), scheme, &mut backups);
        }
        backups
    }

    /// Persist, logging instead of failing.
    fn save(&self) {
        if let Err(e) = self.try_save() {
            error!(
                path = %self.paths.workspaces_json.display(),
                err = %e,
                "could not save workspace registry"
            );
        }
    }

    /// Persist the whole registry, creating the backup home on first use.
    pub fn try_save(&self) -> Result<()> {
        let content = serde_json::to_string(&self.content).map_err(HotExitError::Serialization)?;
        atomic::write_file(&self.paths.workspaces_json, content.as_bytes())
    }
}

/// Temp files of a backup write that hasn't been renamed into place yet.
fn is_in_flight(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".tmp")
}

fn collect_entries(dir: &Path, scheme: ResourceScheme, out: &mut Vec<BackupEntry>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut found: Vec<BackupEntry> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let meta = entry.metadata().ok()?;
            if !meta.is_file() || is_in_flight(&name) {
                return None;
            }
            let modified: DateTime<Utc> = meta.modified().unwrap_or(SystemTime::now()).into();
            Some(BackupEntry {
                scheme,
                name,
                path: entry.path(),
                size: meta.len(),
                modified,
            })
        })
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    out.extend(found);
}
