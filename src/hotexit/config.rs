use crate::atomic;
use crate::error::{HotExitError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

const SETTINGS_FILENAME: &str = "settings.json";

/// User settings, stored in `settings.json` in the config directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HotExitConfig {
    /// Back up dirty documents so they survive a crash or restart.
    #[serde(default = "default_hot_exit")]
    pub hot_exit: bool,

    /// Overrides the backup home directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_home: Option<PathBuf>,
}

fn default_hot_exit() -> bool {
    true
}

impl Default for HotExitConfig {
    fn default() -> Self {
        Self {
            hot_exit: default_hot_exit(),
            backup_home: None,
        }
    }
}

impl HotExitConfig {
    /// Settings in `config_dir`; defaults when the file doesn't exist yet.
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let path = config_dir.as_ref().join(SETTINGS_FILENAME);
        match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(HotExitError::Serialization),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(HotExitError::Io(e)),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(HotExitError::Serialization)?;
        atomic::write_file(
            &config_dir.as_ref().join(SETTINGS_FILENAME),
            content.as_bytes(),
        )
    }
}

/// Source of the "hot exit enabled" flag.
///
/// Queried on every content change rather than cached, so toggling the
/// setting takes effect on the next keystroke.
pub trait HotExitSetting: Send + Sync {
    fn is_hot_exit_enabled(&self) -> bool;
}

impl HotExitSetting for AtomicBool {
    fn is_hot_exit_enabled(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

impl HotExitSetting for HotExitConfig {
    fn is_hot_exit_enabled(&self) -> bool {
        self.hot_exit
    }
}

/// Live, shareable view of [`HotExitConfig`] that can change at runtime.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<HotExitConfig>>,
}

impl SharedSettings {
    pub fn new(config: HotExitConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn snapshot(&self) -> HotExitConfig {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_hot_exit(&self, enabled: bool) {
        self.update(|config| config.hot_exit = enabled);
    }

    fn update(&self, f: impl FnOnce(&mut HotExitConfig)) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
    }
}

impl HotExitSetting for SharedSettings {
    fn is_hot_exit_enabled(&self) -> bool {
        self.snapshot().hot_exit
    }
}
