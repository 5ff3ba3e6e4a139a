//! One-way hashing of paths into backup directory and file names.
//!
//! Names are the lowercase hex SHA-1 of the path's UTF-8 bytes: fixed length
//! (40 chars), filesystem safe, and stable across runs and platforms. Two
//! different paths hashing to the same name is an accepted risk; no collision
//! detection is attempted.

use sha1::{Digest, Sha1};

/// Hex digest of `path`, used as a workspace directory or file backup name.
pub fn path_hash(path: &str) -> String {
    let digest = Sha1::digest(path.as_bytes());
    format!("{:x}", digest)
}
