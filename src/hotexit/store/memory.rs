use super::{backup_location, BackupFuture, BackupStore};
use crate::error::{HotExitError, Result};
use crate::model::Resource;
use crate::paths::workspace_backup_dir;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const VIRTUAL_HOME: &str = "/memory/backups";

/// One call made against the store, recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Write(Resource, String),
    Discard(Resource),
    DiscardAll,
}

/// In-memory backup store for testing.
///
/// Operations take effect when they are submitted, so submission order is
/// trivially preserved. Locations are virtual paths under `/memory/backups`
/// computed exactly like the filesystem store's.
#[derive(Clone)]
pub struct InMemoryBackupStore {
    workspace: Option<String>,
    files: Arc<Mutex<BTreeMap<PathBuf, String>>>,
    ops: Arc<Mutex<Vec<StoreOp>>>,
    simulate_write_error: Arc<AtomicBool>,
}

impl InMemoryBackupStore {
    pub fn new(workspace: Option<&str>) -> Self {
        Self {
            workspace: workspace.filter(|w| !w.is_empty()).map(str::to_string),
            files: Arc::new(Mutex::new(BTreeMap::new())),
            ops: Arc::new(Mutex::new(Vec::new())),
            simulate_write_error: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Snapshot content currently held for `resource`.
    pub fn content(&self, resource: &Resource) -> Option<String> {
        let path = self.backup_location(resource)?;
        lock(&self.files).get(&path).cloned()
    }

    pub fn backup_count(&self) -> usize {
        lock(&self.files).len()
    }

    /// Every operation submitted so far, in order.
    pub fn ops(&self) -> Vec<StoreOp> {
        lock(&self.ops).clone()
    }

    fn record(&self, op: StoreOp) {
        lock(&self.ops).push(op);
    }
}

impl BackupStore for InMemoryBackupStore {
    fn current_workspace(&self) -> Option<&str> {
        self.workspace.as_deref()
    }

    fn backup_location(&self, resource: &Resource) -> Option<PathBuf> {
        backup_location(Path::new(VIRTUAL_HOME), self.workspace.as_deref(), resource)
    }

    fn has_backup(&self, resource: &Resource) -> BackupFuture<bool> {
        let exists = self
            .backup_location(resource)
            .is_some_and(|path| lock(&self.files).contains_key(&path));
        Box::pin(async move { Ok(exists) })
    }

    fn read_backup(&self, resource: &Resource) -> BackupFuture<Option<String>> {
        let content = self.content(resource);
        Box::pin(async move { Ok(content) })
    }

    fn write_backup(&self, resource: &Resource, content: String) -> BackupFuture<()> {
        self.record(StoreOp::Write(resource.clone(), content.clone()));
        let result: Result<()> = match self.backup_location(resource) {
            None => Ok(()),
            Some(_) if self.simulate_write_error.load(Ordering::SeqCst) => {
                Err(HotExitError::Store("Simulated write error".to_string()))
            }
            Some(path) => {
                lock(&self.files).insert(path, content);
                Ok(())
            }
        };
        Box::pin(async move { result })
    }

    fn discard_backup(&self, resource: &Resource) -> BackupFuture<()> {
        self.record(StoreOp::Discard(resource.clone()));
        if let Some(path) = self.backup_location(resource) {
            lock(&self.files).remove(&path);
        }
        Box::pin(async { Ok(()) })
    }

    fn discard_all_backups(&self) -> BackupFuture<()> {
        self.record(StoreOp::DiscardAll);
        if let Some(workspace) = self.workspace.as_deref() {
            let dir = workspace_backup_dir(Path::new(VIRTUAL_HOME), workspace);
            lock(&self.files).retain(|path, _| !path.starts_with(&dir));
        }
        Box::pin(async { Ok(()) })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
