//! # Backup Store
//!
//! Maps a document to a deterministic backup file inside the current
//! workspace's backup directory and performs the I/O against it.
//!
//! ## Location
//!
//! ```text
//! <backupHome>/<hash(workspace)>/<scheme>/<name>
//! ```
//!
//! - `file` documents are named `hash(path)`, so no user path ends up in a
//!   file name and names have a bounded length.
//! - `untitled` documents have no stable real path to hash; they are named
//!   after their path segment verbatim (`Untitled-1`). A name that isn't a
//!   single segment gets no location rather than sharing a file.
//! - With no current workspace there is no location at all and every
//!   operation quietly does nothing. Hot exit is off for empty windows.
//!
//! Location computation is pure ([`backup_location`]); the I/O goes through
//! the [`BackupStore`] trait.
//!
//! ## Implementations
//!
//! - [`fs::FsBackupStore`]: production store on `tokio::fs`, with per-path
//!   ordering from [`queue::PathQueue`].
//! - [`memory::InMemoryBackupStore`]: for testing the orchestrator without
//!   filesystem I/O.
//!
//! ## Futures
//!
//! Operations return boxed `'static` futures rather than being `async fn`s:
//! the call itself fixes the operation's place in the per-path order, and the
//! future can be awaited or spawned afterwards.

use crate::error::Result;
use crate::hash::path_hash;
use crate::model::{Resource, ResourceScheme};
use crate::paths::workspace_backup_dir;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

pub mod fs;
pub mod memory;
pub mod queue;

pub type BackupFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

/// Backup file name of a resource inside its scheme directory.
pub fn backup_name(resource: &Resource) -> Option<String> {
    match resource.scheme {
        ResourceScheme::File => Some(path_hash(&resource.path)),
        ResourceScheme::Untitled => resource.path_segment().map(str::to_string),
    }
}

/// Where the backup of `resource` lives, or `None` without a workspace.
pub fn backup_location(
    backup_home: &Path,
    workspace: Option<&str>,
    resource: &Resource,
) -> Option<PathBuf> {
    let workspace = workspace.filter(|w| !w.is_empty())?;
    let name = backup_name(resource)?;
    Some(
        workspace_backup_dir(backup_home, workspace)
            .join(resource.scheme.as_str())
            .join(name),
    )
}

/// Backup I/O for the documents of one workspace.
pub trait BackupStore: Send + Sync {
    /// Workspace whose backups this store manages.
    fn current_workspace(&self) -> Option<&str>;

    /// Backup file location for `resource`; `None` disables backup for it.
    fn backup_location(&self, resource: &Resource) -> Option<PathBuf>;

    fn has_backup(&self, resource: &Resource) -> BackupFuture<bool>;

    /// Snapshot content, `Ok(None)` if there's no backup.
    fn read_backup(&self, resource: &Resource) -> BackupFuture<Option<String>>;

    /// Replace the backup of `resource` with `content`.
    fn write_backup(&self, resource: &Resource, content: String) -> BackupFuture<()>;

    /// Delete the backup of `resource`. Missing backups are not an error.
    fn discard_backup(&self, resource: &Resource) -> BackupFuture<()>;

    /// Delete the whole backup directory of the current workspace.
    fn discard_all_backups(&self) -> BackupFuture<()>;
}
