//! Object framing: `"<type> <size>\0<payload>"`, and the three object kinds
//! this store knows about. Grounded on the teacher's `ObjectType`
//! (object.rs) for the enum/FromStr/Display shape, narrowed to the three
//! kinds this format uses (no tags).

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::digest::Digest;
use crate::error::DircacheError;
use crate::store::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        };
        f.write_str(s)
    }
}

impl FromStr for ObjectKind {
    type Err = DircacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            other => Err(DircacheError::MalformedObject(format!(
                "unknown object type {other:?}"
            ))),
        }
    }
}

/// Wrap `payload` in the `"<type> <size>\0"` frame this store hashes and
/// compresses as a unit.
pub fn frame(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let mut framed = format!("{kind} {}\0", payload.len()).into_bytes();
    framed.extend_from_slice(payload);
    framed
}

/// Frame and write `payload`, returning the digest of the resulting object.
pub fn write(store: &ObjectStore, kind: ObjectKind, payload: &[u8]) -> Result<Digest, DircacheError> {
    let framed = frame(kind, payload);
    store.write(&framed)
}

/// Read an object back, verifying its on-disk type tag parses, and return
/// its kind alongside the raw payload (tree/commit payloads are decoded by
/// their own modules).
pub fn read(store: &ObjectStore, digest: &Digest) -> Result<(ObjectKind, Vec<u8>), DircacheError> {
    let (type_str, payload) = store.read(digest)?;
    let kind: ObjectKind = type_str.parse()?;
    Ok((kind, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_matches_expected_form() {
        let framed = frame(ObjectKind::Blob, b"hi");
        assert_eq!(framed, b"blob 2\0hi");
    }

    #[test]
    fn kind_round_trips_through_display_and_parse() {
        for kind in [ObjectKind::Blob, ObjectKind::Tree, ObjectKind::Commit] {
            let s = kind.to_string();
            assert_eq!(s.parse::<ObjectKind>().unwrap(), kind);
        }
    }

    #[test]
    fn write_then_read_preserves_kind_and_payload() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::with_root(dir.path());
        let digest = write(&store, ObjectKind::Blob, b"contents").unwrap();
        let (kind, payload) = read(&store, &digest).unwrap();
        assert_eq!(kind, ObjectKind::Blob);
        assert_eq!(payload, b"contents");
    }
}
