use crate::error::{HotExitError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// The two kinds of documents hot exit knows how to back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceScheme {
    /// A document with a real file on disk.
    File,
    /// A document that has never been saved.
    Untitled,
}

impl ResourceScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceScheme::File => "file",
            ResourceScheme::Untitled => "untitled",
        }
    }
}

impl fmt::Display for ResourceScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceScheme {
    type Err = HotExitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "file" => Ok(ResourceScheme::File),
            "untitled" => Ok(ResourceScheme::Untitled),
            other => Err(HotExitError::InvalidResource(format!(
                "unsupported scheme '{}'",
                other
            ))),
        }
    }
}

/// Identity of an open document: scheme plus path.
///
/// For `file` resources the path is the absolute path of the file. For
/// `untitled` resources it is the editor-assigned name (`Untitled-1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    pub scheme: ResourceScheme,
    pub path: String,
}

impl Resource {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            scheme: ResourceScheme::File,
            path: path.into(),
        }
    }

    pub fn untitled(name: impl Into<String>) -> Self {
        Self {
            scheme: ResourceScheme::Untitled,
            path: name.into(),
        }
    }

    pub fn is_untitled(&self) -> bool {
        self.scheme == ResourceScheme::Untitled
    }

    /// The path, if it is exactly one plain segment. Untitled backups are
    /// named after it.
    ///
    /// `a/Untitled-1` and `b/Untitled-1` would share a backup file if named by
    /// their last segment, so anything with a separator (or `.`/`..`) has no
    /// segment, and therefore no backup location.
    pub fn path_segment(&self) -> Option<&str> {
        let mut components = Path::new(&self.path).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => name.to_str(),
            _ => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.path)
    }
}

/// Parses `file:/abs/path`, `file:///abs/path` or `untitled:Untitled-1`.
impl FromStr for Resource {
    type Err = HotExitError;

    fn from_str(s: &str) -> Result<Self> {
        let (scheme, rest) = s.split_once(':').ok_or_else(|| {
            HotExitError::InvalidResource(format!("expected <scheme>:<path>, got '{}'", s))
        })?;
        let scheme: ResourceScheme = scheme.parse()?;
        let path = match scheme {
            ResourceScheme::File => rest.strip_prefix("//").unwrap_or(rest),
            ResourceScheme::Untitled => rest,
        };
        if path.is_empty() {
            return Err(HotExitError::InvalidResource(format!(
                "empty path in '{}'",
                s
            )));
        }
        let resource = Self {
            scheme,
            path: path.to_string(),
        };
        if resource.is_untitled() && resource.path_segment().is_none() {
            return Err(HotExitError::InvalidResource(format!(
                "untitled name must be a single path segment, got '{}'",
                path
            )));
        }
        Ok(resource)
    }
}

/// On-disk shape of the workspace registry file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspacesFormat {
    #[serde(rename = "folderWorkspaces")]
    pub folder_workspaces: Vec<String>,
}

impl WorkspacesFormat {
    /// Parses registry JSON, discarding anything that isn't exactly
    /// `{ "folderWorkspaces": [string, ...] }`.
    ///
    /// Never fails: malformed JSON, a missing field, a non-array value, or an
    /// array holding a single non-string all yield an empty registry.
    pub fn parse_lenient(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_default()
    }

    /// Like [`parse_lenient`](Self::parse_lenient) but reports an unusable
    /// document as `None`. Duplicate entries in a hand-edited file are collapsed.
    pub fn parse(raw: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        let entries = value.get("folderWorkspaces")?.as_array()?;

        let mut folder_workspaces: Vec<String> = Vec::with_capacity(entries.len());
        for entry in entries {
            let path = entry.as_str()?;
            if !folder_workspaces.iter().any(|p| p == path) {
                folder_workspaces.push(path.to_string());
            }
        }

        Some(Self { folder_workspaces })
    }
}

/// A single backup file found on disk.
#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    pub scheme: ResourceScheme,
    /// File name inside the scheme directory (hash or untitled name).
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// What the orchestrator did in response to a document event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupAction {
    Written,
    Discarded,
    Skipped,
}
