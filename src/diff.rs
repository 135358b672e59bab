//! Detecting whether a tracked file has changed since it was staged, and
//! invoking an external `diff` against its stored blob. Grounded on
//! `original_source/show-diff.c`'s bitmask constants and its
//! `popen("diff --strip-trailing-cr -u - %s", ...)` invocation.

use std::io::Write;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::DircacheError;
use crate::index::IndexEntry;
use crate::store::ObjectStore;

pub const MTIME_CHANGED: u32 = 0x01;
pub const CTIME_CHANGED: u32 = 0x02;
pub const OWNER_CHANGED: u32 = 0x04;
pub const MODE_CHANGED: u32 = 0x08;
pub const INODE_CHANGED: u32 = 0x10;
pub const DATA_CHANGED: u32 = 0x20;

/// Compare a staged entry against the live filesystem metadata for the same
/// path, returning the OR of whichever `*_CHANGED` bits differ.
///
/// Inode comparison is meaningful on Unix, where a path's inode is stable
/// across renames-in-place; on platforms without a real inode this bit is
/// simply never set (see design note on inode-check portability).
pub fn changed_bits(entry: &IndexEntry, meta: &std::fs::Metadata) -> u32 {
    let mut bits = 0;
    if entry.stats.mtime_sec != meta.mtime() as u32 || entry.stats.mtime_nsec != meta.mtime_nsec() as u32 {
        bits |= MTIME_CHANGED;
    }
    if entry.stats.ctime_sec != meta.ctime() as u32 || entry.stats.ctime_nsec != meta.ctime_nsec() as u32 {
        bits |= CTIME_CHANGED;
    }
    if entry.stats.uid != meta.uid() || entry.stats.gid != meta.gid() {
        bits |= OWNER_CHANGED;
    }
    if entry.stats.mode != meta.mode() {
        bits |= MODE_CHANGED;
    }
    if entry.stats.ino != meta.ino() as u32 {
        bits |= INODE_CHANGED;
    }
    if entry.stats.size != meta.size() as u32 {
        bits |= DATA_CHANGED;
    }
    bits
}

/// Pipe the entry's stored blob into `diff --strip-trailing-cr -u - <path>`
/// and return its combined stdout. `diff` exits 1 on a real difference,
/// which is not treated as an error here.
pub fn run_external_diff(store: &ObjectStore, entry: &IndexEntry, path: &Path) -> Result<String, DircacheError> {
    let (_kind, payload) = store.read(&entry.digest)?;

    let mut child = Command::new("diff")
        .arg("--strip-trailing-cr")
        .arg("-u")
        .arg("-")
        .arg(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| DircacheError::io(path, e))?;

    child
        .stdin
        .take()
        .expect("piped stdin")
        .write_all(&payload)
        .map_err(|e| DircacheError::io(path, e))?;

    let output = child.wait_with_output().map_err(|e| DircacheError::io(path, e))?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
