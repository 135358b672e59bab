//! The binary index (`.dircache/index`): a header, a strictly
//! name-ordered list of fixed-layout entries, and a trailing SHA-1 over
//! everything before it. Grounded on bsubei-grit's `Index`/`IndexEntry`
//! (index.rs) for the to-be-written/read entry layout and the
//! discard-conflicts logic, and on cNameHitch-gitr's index reader/writer
//! (git-index/src/read.rs, write.rs) for the `(fixed + namelen + 8) & !7`
//! padding formula and the lock-file-backed atomic rewrite, which replaces
//! bsubei-grit's direct `File::create` overwrite.

use std::fs::File;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use memmap2::Mmap;
use sha1::{Digest as _, Sha1};
use tracing::debug;

use crate::error::DircacheError;
use crate::lockfile::LockFile;
use crate::{digest::Digest, hex};

const SIGNATURE: u32 = 0x4449_5243; // "DIRC"
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 4 + 4 + 4; // signature + version + entry count
const ENTRY_FIXED_SIZE: usize = 10 * 4 + 20 + 2; // stats + sha1 + namelen
const TRAILER_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntryStats {
    pub ctime_sec: u32,
    pub ctime_nsec: u32,
    pub mtime_sec: u32,
    pub mtime_nsec: u32,
    pub dev: u32,
    pub ino: u32,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
}

impl From<&std::fs::Metadata> for IndexEntryStats {
    fn from(meta: &std::fs::Metadata) -> Self {
        IndexEntryStats {
            ctime_sec: meta.ctime() as u32,
            ctime_nsec: meta.ctime_nsec() as u32,
            mtime_sec: meta.mtime() as u32,
            mtime_nsec: meta.mtime_nsec() as u32,
            dev: meta.dev() as u32,
            ino: meta.ino() as u32,
            mode: meta.mode(),
            uid: meta.uid(),
            gid: meta.gid(),
            size: meta.size() as u32,
        }
    }
}

impl IndexEntryStats {
    fn write(&self, out: &mut Vec<u8>) {
        for field in [
            self.ctime_sec,
            self.ctime_nsec,
            self.mtime_sec,
            self.mtime_nsec,
            self.dev,
            self.ino,
            self.mode,
            self.uid,
            self.gid,
            self.size,
        ] {
            out.extend_from_slice(&field.to_ne_bytes());
        }
    }

    fn read(bytes: &[u8]) -> Self {
        let mut fields = [0u32; 10];
        for (i, chunk) in bytes.chunks_exact(4).enumerate() {
            fields[i] = u32::from_ne_bytes(chunk.try_into().unwrap());
        }
        IndexEntryStats {
            ctime_sec: fields[0],
            ctime_nsec: fields[1],
            mtime_sec: fields[2],
            mtime_nsec: fields[3],
            dev: fields[4],
            ino: fields[5],
            mode: fields[6],
            uid: fields[7],
            gid: fields[8],
            size: fields[9],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub stats: IndexEntryStats,
    pub digest: Digest,
}

/// `(offset of name field + namelen + 8) & !7`: the smallest multiple of
/// 8 bytes that fits the fixed fields, the name, and at least one NUL.
fn entry_size(namelen: usize) -> usize {
    (ENTRY_FIXED_SIZE + namelen + 8) & !7
}

impl IndexEntry {
    fn encode(&self) -> Vec<u8> {
        let namelen = self.name.len();
        let mut out = Vec::with_capacity(entry_size(namelen));
        self.stats.write(&mut out);
        out.extend_from_slice(self.digest.as_bytes());
        out.extend_from_slice(&(namelen as u16).to_ne_bytes());
        out.extend_from_slice(self.name.as_bytes());
        out.resize(entry_size(namelen), 0);
        out
    }

    fn decode(bytes: &[u8]) -> Result<(Self, usize), DircacheError> {
        if bytes.len() < ENTRY_FIXED_SIZE {
            return Err(DircacheError::CorruptIndex("truncated entry header".into()));
        }
        let stats = IndexEntryStats::read(&bytes[..40]);
        let mut digest_bytes = [0u8; 20];
        digest_bytes.copy_from_slice(&bytes[40..60]);
        let namelen = u16::from_ne_bytes(bytes[60..62].try_into().unwrap()) as usize;

        let total = entry_size(namelen);
        if bytes.len() < total {
            return Err(DircacheError::CorruptIndex("truncated entry name".into()));
        }
        let name = std::str::from_utf8(&bytes[62..62 + namelen])
            .map_err(|_| DircacheError::CorruptIndex("entry name not UTF-8".into()))?
            .to_owned();

        Ok((
            IndexEntry {
                name,
                stats,
                digest: Digest::from_bytes(digest_bytes),
            },
            total,
        ))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    pub fn new() -> Self {
        Index { entries: Vec::new() }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|e| e.name.as_str().cmp(name))
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.position(name).ok().map(|i| &self.entries[i])
    }

    /// Insert or replace the entry for `name`, keeping entries in strict
    /// lexicographic order.
    pub fn insert(&mut self, entry: IndexEntry) {
        match self.position(&entry.name) {
            Ok(i) => self.entries[i] = entry,
            Err(i) => self.entries.insert(i, entry),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<IndexEntry> {
        self.position(name).ok().map(|i| self.entries.remove(i))
    }

    /// Load from `path`. Returns an empty index if the file doesn't exist
    /// (an uninitialized index is simply empty, not an error).
    pub fn load(path: &Path) -> Result<Self, DircacheError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Index::new()),
            Err(e) => return Err(DircacheError::io(path, e)),
        };

        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| DircacheError::io(path, e))?;
        drop(file);
        let bytes: &[u8] = &mmap;

        if bytes.len() < HEADER_SIZE + TRAILER_SIZE {
            return Err(DircacheError::CorruptIndex("file too short".into()));
        }

        let data_len = bytes.len() - TRAILER_SIZE;
        let expected: [u8; 20] = Sha1::digest(&bytes[..data_len]).into();
        let actual: [u8; 20] = bytes[data_len..].try_into().expect("trailer is exactly 20 bytes");
        if actual != expected {
            return Err(DircacheError::CorruptIndex(format!(
                "checksum mismatch: file has {}, computed {}",
                hex::to_hex(&actual),
                hex::to_hex(&expected)
            )));
        }

        let signature = u32::from_ne_bytes(bytes[0..4].try_into().unwrap());
        if signature != SIGNATURE {
            return Err(DircacheError::CorruptIndex(format!(
                "bad signature {signature:#x}"
            )));
        }
        let version = u32::from_ne_bytes(bytes[4..8].try_into().unwrap());
        if version != VERSION {
            return Err(DircacheError::CorruptIndex(format!(
                "unsupported version {version}"
            )));
        }
        let count = u32::from_ne_bytes(bytes[8..12].try_into().unwrap()) as usize;

        let mut entries = Vec::with_capacity(count);
        let mut cursor = HEADER_SIZE;
        for _ in 0..count {
            let (entry, consumed) = IndexEntry::decode(&bytes[cursor..data_len])?;
            cursor += consumed;
            entries.push(entry);
        }
        if cursor != data_len {
            return Err(DircacheError::CorruptIndex(
                "trailing bytes after last entry".into(),
            ));
        }

        debug!(count, path = %path.display(), "loaded index");
        Ok(Index { entries })
    }

    /// Rewrite `path` atomically via a `.lock` sibling: build the full
    /// image in memory, append the trailing checksum, write it into the
    /// lock file, then rename over the target.
    pub fn save(&self, path: &Path) -> Result<(), DircacheError> {
        let mut out = Vec::new();
        out.extend_from_slice(&SIGNATURE.to_ne_bytes());
        out.extend_from_slice(&VERSION.to_ne_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_ne_bytes());
        for entry in &self.entries {
            out.extend_from_slice(&entry.encode());
        }
        let checksum: [u8; 20] = Sha1::digest(&out).into();
        out.extend_from_slice(&checksum);

        let mut lock = LockFile::acquire(path)?;
        lock.write_all(&out)?;
        lock.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(size: u32) -> IndexEntryStats {
        IndexEntryStats {
            ctime_sec: 1,
            ctime_nsec: 0,
            mtime_sec: 2,
            mtime_nsec: 0,
            dev: 1,
            ino: 42,
            mode: 0o100644,
            uid: 1000,
            gid: 1000,
            size,
        }
    }

    fn entry(name: &str) -> IndexEntry {
        IndexEntry {
            name: name.to_owned(),
            stats: stats(name.len() as u32),
            digest: Digest::of(name.as_bytes()),
        }
    }

    #[test]
    fn insert_keeps_lexicographic_order() {
        let mut index = Index::new();
        index.insert(entry("b.txt"));
        index.insert(entry("a.txt"));
        index.insert(entry("c.txt"));
        let names: Vec<_> = index.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn insert_replaces_existing_entry() {
        let mut index = Index::new();
        index.insert(entry("a.txt"));
        let mut replacement = entry("a.txt");
        replacement.digest = Digest::of(b"new content");
        index.insert(replacement.clone());
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a.txt").unwrap().digest, replacement.digest);
    }

    #[test]
    fn remove_drops_entry() {
        let mut index = Index::new();
        index.insert(entry("a.txt"));
        assert!(index.remove("a.txt").is_some());
        assert!(index.is_empty());
    }

    #[test]
    fn entry_round_trips_through_encode_decode() {
        let e = entry("path/to/file.rs");
        let encoded = e.encode();
        assert_eq!(encoded.len() % 8, 0);
        let (decoded, consumed) = IndexEntry::decode(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded, e);
    }

    #[test]
    fn save_then_load_round_trips_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index");
        let index = Index::new();
        index.save(&path).unwrap();
        let loaded = Index::load(&path).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn save_then_load_round_trips_populated_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index");
        let mut index = Index::new();
        index.insert(entry("a.txt"));
        index.insert(entry("nested/b.txt"));
        index.save(&path).unwrap();

        let loaded = Index::load(&path).unwrap();
        assert_eq!(loaded.entries(), index.entries());
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist");
        let loaded = Index::load(&path).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn load_rejects_corrupted_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index");
        let mut index = Index::new();
        index.insert(entry("a.txt"));
        index.save(&path).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            Index::load(&path),
            Err(DircacheError::CorruptIndex(_))
        ));
    }
}
