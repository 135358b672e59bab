//! Flat tree objects: a single tree lists every staged path directly, with
//! no nested subtrees. Grounded on the teacher's `Tree`/`TreeEntry`
//! (tree.rs) for the mode-space-name-null-hash entry encoding, but the
//! recursive subtree walk is dropped entirely — flat trees are built
//! straight from the (already sorted) index.
//!
//! Entry layout, repeated until the payload is exhausted:
//! `<octal mode> <name>\0<20-byte digest>`. The mode is the raw `st_mode`
//! value printed as-is in octal (`original_source/write-tree.c`'s
//! `sprintf(buffer + offset, "%o %s", ce->st_mode, ce->name)`), not
//! normalized into a fixed set of known modes.

use crate::digest::Digest;
use crate::error::DircacheError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: u32,
    pub name: String,
    pub digest: Digest,
}

/// Encode `entries` into a flat tree payload. Callers are responsible for
/// supplying entries already in lexicographic name order, matching the
/// index they were built from.
pub fn encode(entries: &[TreeEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in entries {
        out.extend_from_slice(format!("{:o}", entry.mode).as_bytes());
        out.push(b' ');
        out.extend_from_slice(entry.name.as_bytes());
        out.push(0);
        out.extend_from_slice(entry.digest.as_bytes());
    }
    out
}

/// Decode a flat tree payload back into its entries.
pub fn decode(payload: &[u8]) -> Result<Vec<TreeEntry>, DircacheError> {
    let mut entries = Vec::new();
    let mut cursor = payload;

    while !cursor.is_empty() {
        let space = cursor
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| DircacheError::MalformedObject("tree entry missing mode".into()))?;
        let mode_str = std::str::from_utf8(&cursor[..space])
            .map_err(|_| DircacheError::MalformedObject("tree entry mode not UTF-8".into()))?;
        let mode = u32::from_str_radix(mode_str, 8).map_err(|_| {
            DircacheError::MalformedObject(format!("tree entry mode not octal: {mode_str:?}"))
        })?;
        cursor = &cursor[space + 1..];

        let nul = cursor
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| DircacheError::MalformedObject("tree entry missing name".into()))?;
        let name = std::str::from_utf8(&cursor[..nul])
            .map_err(|_| DircacheError::MalformedObject("tree entry name not UTF-8".into()))?
            .to_owned();
        cursor = &cursor[nul + 1..];

        if cursor.len() < 20 {
            return Err(DircacheError::MalformedObject(
                "tree entry truncated before digest".into(),
            ));
        }
        let mut digest_bytes = [0u8; 20];
        digest_bytes.copy_from_slice(&cursor[..20]);
        cursor = &cursor[20..];

        entries.push(TreeEntry {
            mode,
            name,
            digest: Digest::from_bytes(digest_bytes),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, mode: u32) -> TreeEntry {
        TreeEntry {
            mode,
            name: name.to_owned(),
            digest: Digest::of(name.as_bytes()),
        }
    }

    #[test]
    fn round_trips_single_entry() {
        let entries = vec![entry("a.txt", 0o100644)];
        let payload = encode(&entries);
        assert_eq!(decode(&payload).unwrap(), entries);
    }

    #[test]
    fn round_trips_mixed_modes_flat() {
        let entries = vec![
            entry("bin/tool", 0o100755),
            entry("link", 0o120000),
            entry("readme.md", 0o100644),
        ];
        let payload = encode(&entries);
        assert_eq!(decode(&payload).unwrap(), entries);
    }

    #[test]
    fn round_trips_a_mode_outside_the_common_set() {
        // Group-writable blob: not 644/755/120000, but still a valid octal
        // mode that must survive encode/decode without being remapped.
        let entries = vec![entry("shared.txt", 0o100664)];
        let payload = encode(&entries);
        assert_eq!(decode(&payload).unwrap(), entries);
    }

    #[test]
    fn decode_rejects_non_octal_mode() {
        let mut payload = b"89 dir\0".to_vec();
        payload.extend_from_slice(&[0u8; 20]);
        assert!(decode(&payload).is_err());
    }

    #[test]
    fn decode_empty_payload_is_empty_tree() {
        assert_eq!(decode(&[]).unwrap(), Vec::new());
    }
}
