//! Whole-file writes that readers never see half done.

use crate::error::{HotExitError, Result};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Replace `path` with `contents` via a temp file in the same directory.
///
/// Missing parent directories are created. Temp files are named
/// `.<file name>-<uuid>.tmp`, which directory listings treat as in flight.
pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
        return Err(HotExitError::Store(format!(
            "cannot write to {}",
            path.display()
        )));
    };
    if !dir.as_os_str().is_empty() && !dir.exists() {
        fs::create_dir_all(dir).map_err(HotExitError::Io)?;
    }

    let tmp_file = dir.join(format!(
        ".{}-{}.tmp",
        name.to_string_lossy(),
        Uuid::new_v4()
    ));
    fs::write(&tmp_file, contents).map_err(HotExitError::Io)?;
    if let Err(e) = fs::rename(&tmp_file, path) {
        let _ = fs::remove_file(&tmp_file);
        return Err(HotExitError::Io(e));
    }
    Ok(())
}
