//! The object database: compress, hash, and read/write immutable objects
//! addressed by the SHA-1 of their *compressed* bytes.
//!
//! Grounded on the teacher's `ObjectHashable::hash` (object.rs) for the
//! exclusive-create-then-rename write discipline, but reordered: this early
//! format hashes the deflated bytes, not the raw framed bytes, so the
//! compress step must happen before hashing rather than alongside it (see
//! §4.2 / design note "Digest over compressed bytes").

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use memmap2::Mmap;
use tracing::{debug, trace};

use crate::digest::Digest;
use crate::error::DircacheError;

const OBJECT_ROOT_ENV: &str = "SHA1_FILE_DIRECTORY";
const DEFAULT_OBJECT_ROOT: &str = ".dircache/objects";

/// The first inflate pass reads into a scratch buffer this size, per §4.2,
/// before the framing header is known and an exactly-sized payload buffer
/// can be allocated.
const SCRATCH_BUFFER_SIZE: usize = 8192;

#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    /// Resolve the object root from `SHA1_FILE_DIRECTORY`, falling back to
    /// `.dircache/objects` when the variable is unset *or* names a path
    /// that isn't an existing directory. Deliberately *not* cached in
    /// process-wide state (see design note "Process-wide state"): callers
    /// thread the resolved store through as an explicit value.
    pub fn from_env() -> Self {
        let root = std::env::var(OBJECT_ROOT_ENV)
            .ok()
            .map(PathBuf::from)
            .filter(|p| p.is_dir())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OBJECT_ROOT));
        Self { root }
    }

    /// The raw root named by `SHA1_FILE_DIRECTORY`, whether or not it
    /// exists yet, or the default if unset. Used only by `init-db`, which
    /// treats an *existing* override directory as "already initialized"
    /// rather than silently falling back like every other command.
    pub fn init_target_from_env() -> PathBuf {
        std::env::var(OBJECT_ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_OBJECT_ROOT))
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, digest: &Digest) -> PathBuf {
        let hex = digest.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }

    /// Whether an object with this digest is present in the store, without
    /// reading or validating its contents.
    pub fn contains(&self, digest: &Digest) -> bool {
        self.path_for(digest).is_file()
    }

    /// Create `.dircache/objects` (and its parent `.dircache/`, both mode
    /// 0700) plus the 256 two-hex-digit subdirectories. Idempotent:
    /// `EEXIST` on a subdirectory is not an error.
    pub fn init(&self) -> Result<(), DircacheError> {
        if let Some(parent) = self.root.parent() {
            fs::create_dir_all(parent).map_err(|e| DircacheError::io(parent, e))?;
            chmod700(parent)?;
        }
        fs::create_dir_all(&self.root).map_err(|e| DircacheError::io(&self.root, e))?;
        chmod700(&self.root)?;
        for hi in 0u8..=0xf {
            for lo in 0u8..=0xf {
                let name = format!("{:x}{:x}", hi, lo);
                let dir = self.root.join(name);
                match fs::create_dir(&dir) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                    Err(e) => return Err(DircacheError::io(dir, e)),
                }
            }
        }
        Ok(())
    }

    /// Compress `framed` (already in `"<type> <size>\0<payload>"` form),
    /// hash the compressed bytes, and write the object file if it doesn't
    /// already exist.
    pub fn write(&self, framed: &[u8]) -> Result<Digest, DircacheError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder
            .write_all(framed)
            .map_err(|e| DircacheError::Deflate(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| DircacheError::Deflate(e.to_string()))?;

        let digest = Digest::of(&compressed);
        let path = self.path_for(&digest);
        debug!(digest = %digest, path = %path.display(), "writing object");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DircacheError::io(parent, e))?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o666);
        }

        match options.open(&path) {
            Ok(mut f) => {
                f.write_all(&compressed)
                    .map_err(|e| DircacheError::io(&path, e))?;
                Ok(digest)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                trace!(digest = %digest, "object already present, skipping write");
                Ok(digest)
            }
            Err(e) => Err(DircacheError::io(path, e)),
        }
    }

    /// Read and inflate the object at `digest`, returning its ASCII type
    /// tag and exact-length payload.
    pub fn read(&self, digest: &Digest) -> Result<(String, Vec<u8>), DircacheError> {
        let path = self.path_for(digest);
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DircacheError::NotFound(digest.to_hex())
            } else {
                DircacheError::io(&path, e)
            }
        })?;

        // Memory-map for the duration of the decode; the fd itself is
        // dropped as soon as the mapping is established.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| DircacheError::io(&path, e))?;
        drop(file);

        let mut decoder = ZlibDecoder::new(&mmap[..]);
        let mut scratch = vec![0u8; SCRATCH_BUFFER_SIZE];
        let n = decoder
            .read(&mut scratch)
            .map_err(|e| DircacheError::Inflate(e.to_string()))?;
        scratch.truncate(n);

        let nul_pos = scratch
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| DircacheError::MalformedObject("missing NUL framing byte".into()))?;
        let header =
            std::str::from_utf8(&scratch[..nul_pos]).map_err(|_| {
                DircacheError::MalformedObject("framing header not valid UTF-8".into())
            })?;
        let (type_str, size_str) = header
            .split_once(' ')
            .ok_or_else(|| DircacheError::MalformedObject(format!("bad framing {header:?}")))?;
        if type_str.len() > 10 {
            return Err(DircacheError::MalformedObject(format!(
                "object type too long: {type_str:?}"
            )));
        }
        let size: usize = size_str
            .parse()
            .map_err(|_| DircacheError::MalformedObject(format!("bad size {size_str:?}")))?;

        let mut payload = vec![0u8; size];
        let already = &scratch[nul_pos + 1..];
        let copy_len = already.len().min(size);
        payload[..copy_len].copy_from_slice(&already[..copy_len]);

        if copy_len < size {
            decoder
                .read_exact(&mut payload[copy_len..])
                .map_err(|e| DircacheError::Inflate(e.to_string()))?;
        }

        Ok((type_str.to_owned(), payload))
    }
}

#[cfg(unix)]
fn chmod700(path: &Path) -> Result<(), DircacheError> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o700);
    fs::set_permissions(path, perms).map_err(|e| DircacheError::io(path, e))
}

#[cfg(not(unix))]
fn chmod700(_path: &Path) -> Result<(), DircacheError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::with_root(dir.path().join("objects"));
        (dir, store)
    }

    #[test]
    fn write_then_read_round_trips() {
        let (_dir, store) = store();
        let framed = b"blob 5\0hello";
        let digest = store.write(framed).unwrap();
        let (kind, payload) = store.read(&digest).unwrap();
        assert_eq!(kind, "blob");
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn write_is_idempotent() {
        let (_dir, store) = store();
        let framed = b"blob 5\0hello";
        let d1 = store.write(framed).unwrap();
        let d2 = store.write(framed).unwrap();
        assert_eq!(d1, d2);
    }

    #[test]
    fn identical_content_shares_storage() {
        let (_dir, store) = store();
        let a = store.write(b"blob 3\0abc").unwrap();
        let b = store.write(b"blob 3\0abc").unwrap();
        assert_eq!(store.path_for(&a), store.path_for(&b));
    }

    #[test]
    fn missing_object_is_not_found() {
        let (_dir, store) = store();
        let digest = Digest::of(b"never written");
        assert!(matches!(
            store.read(&digest),
            Err(DircacheError::NotFound(_))
        ));
    }

    #[test]
    fn init_creates_256_subdirectories() {
        let (dir, store) = store();
        store.init().unwrap();
        let root = dir.path().join("objects");
        assert!(root.join("00").is_dir());
        assert!(root.join("ff").is_dir());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 256);
    }

    #[test]
    fn init_is_idempotent() {
        let (_dir, store) = store();
        store.init().unwrap();
        store.init().unwrap();
    }
}
