//! Commit objects: a tree digest, zero or more ordered parents, author and
//! committer lines, and a free-form message. Grounded on the teacher's
//! `Commit` (commit.rs) for the payload shape, generalized to carry an
//! arbitrary ordered list of parents rather than a single optional one —
//! parent order is significant and is never sorted.

use crate::digest::Digest;
use crate::error::DircacheError;
use crate::identity::Identity;

/// Parent lists longer than this are rejected; matches the historical
/// fixed-size parent array this format inherited.
pub const MAX_PARENTS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub tree: Digest,
    pub parents: Vec<Digest>,
    pub author: String,
    pub committer: String,
    pub message: String,
}

impl Commit {
    pub fn new(
        tree: Digest,
        parents: Vec<Digest>,
        author: &Identity,
        committer: &Identity,
        message: String,
    ) -> Result<Self, DircacheError> {
        if parents.len() > MAX_PARENTS {
            return Err(DircacheError::MalformedObject(format!(
                "too many parents: {} (max {MAX_PARENTS})",
                parents.len()
            )));
        }
        Ok(Commit {
            tree,
            parents,
            author: format_line(author),
            committer: format_line(committer),
            message,
        })
    }

    /// Encode to the on-disk payload: `tree`, then each `parent` in the
    /// order given, then `author`, `committer`, a blank line, and the
    /// message.
    pub fn encode(&self) -> Vec<u8> {
        let mut lines = Vec::new();
        lines.push(format!("tree {}", self.tree.to_hex()));
        for parent in &self.parents {
            lines.push(format!("parent {}", parent.to_hex()));
        }
        lines.push(format!("author {}", self.author));
        lines.push(format!("committer {}", self.committer));

        let mut out = lines.join("\n").into_bytes();
        out.push(b'\n');
        out.push(b'\n');
        out.extend_from_slice(self.message.as_bytes());
        out
    }

    pub fn decode(payload: &[u8]) -> Result<Self, DircacheError> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| DircacheError::MalformedObject("commit payload not UTF-8".into()))?;
        let (header, message) = text
            .split_once("\n\n")
            .ok_or_else(|| DircacheError::MalformedObject("commit missing blank line".into()))?;

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in header.lines() {
            if let Some(hex) = line.strip_prefix("tree ") {
                tree = Some(Digest::from_hex(hex)?);
            } else if let Some(hex) = line.strip_prefix("parent ") {
                parents.push(Digest::from_hex(hex)?);
            } else if let Some(rest) = line.strip_prefix("author ") {
                author = Some(rest.to_owned());
            } else if let Some(rest) = line.strip_prefix("committer ") {
                committer = Some(rest.to_owned());
            } else {
                return Err(DircacheError::MalformedObject(format!(
                    "unexpected commit header line {line:?}"
                )));
            }
        }

        let tree = tree.ok_or_else(|| DircacheError::MalformedObject("commit missing tree".into()))?;
        let author =
            author.ok_or_else(|| DircacheError::MalformedObject("commit missing author".into()))?;
        let committer = committer
            .ok_or_else(|| DircacheError::MalformedObject("commit missing committer".into()))?;

        if parents.len() > MAX_PARENTS {
            return Err(DircacheError::MalformedObject(format!(
                "too many parents: {} (max {MAX_PARENTS})",
                parents.len()
            )));
        }

        Ok(Commit {
            tree,
            parents,
            author,
            committer,
            message: message.to_owned(),
        })
    }
}

fn format_line(id: &Identity) -> String {
    format!("{} <{}> {}", id.name, id.email, id.when)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str, email: &str) -> Identity {
        Identity {
            name: name.to_owned(),
            email: email.to_owned(),
            when: "1000000000 +0000".to_owned(),
        }
    }

    #[test]
    fn encode_decode_round_trips_no_parents() {
        let commit = Commit::new(
            Digest::of(b"tree"),
            vec![],
            &id("A", "a@example.com"),
            &id("A", "a@example.com"),
            "initial\n".to_owned(),
        )
        .unwrap();
        let decoded = Commit::decode(&commit.encode()).unwrap();
        assert_eq!(decoded, commit);
    }

    #[test]
    fn parent_order_is_preserved_and_affects_encoding() {
        let p1 = Digest::of(b"p1");
        let p2 = Digest::of(b"p2");
        let author = id("A", "a@example.com");

        let forward = Commit::new(
            Digest::of(b"tree"),
            vec![p1, p2],
            &author,
            &author,
            "merge\n".to_owned(),
        )
        .unwrap();
        let backward = Commit::new(
            Digest::of(b"tree"),
            vec![p2, p1],
            &author,
            &author,
            "merge\n".to_owned(),
        )
        .unwrap();

        assert_ne!(forward.encode(), backward.encode());
        assert_eq!(Commit::decode(&forward.encode()).unwrap().parents, vec![p1, p2]);
    }

    #[test]
    fn rejects_too_many_parents() {
        let author = id("A", "a@example.com");
        let parents = (0..20).map(|i| Digest::of(&[i])).collect();
        let err = Commit::new(Digest::of(b"tree"), parents, &author, &author, String::new());
        assert!(err.is_err());
    }

    #[test]
    fn decode_rejects_missing_blank_line() {
        assert!(Commit::decode(b"tree deadbeef").is_err());
    }
}
