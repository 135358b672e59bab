use std::io::Read;

use eyre::{Context, Result};

use crate::commit::Commit;
use crate::digest::Digest;
use crate::identity::Identity;
use crate::object::{self, ObjectKind};
use crate::store::ObjectStore;

/// Build a commit object pointing at `tree_hex`, with `parent_hexes` in the
/// order given (parent order is significant and is never reordered).
/// Message comes from `message` if given, else is read from stdin. Prints
/// and returns the resulting digest.
pub fn run(tree_hex: &str, parent_hexes: &[String], message: Option<String>) -> Result<Digest> {
    let store = ObjectStore::from_env();

    let tree = Digest::from_hex(tree_hex).wrap_err("parsing tree digest")?;
    let parents = parent_hexes
        .iter()
        .map(|h| Digest::from_hex(h).wrap_err_with(|| format!("parsing parent digest {h}")))
        .collect::<Result<Vec<_>>>()?;

    let message = match message {
        Some(m) => m,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .wrap_err("reading commit message from stdin")?;
            buf
        }
    };

    let identity = Identity::resolve();
    let commit = Commit::new(tree, parents, &identity, &identity, message)?;
    let digest = object::write(&store, ObjectKind::Commit, &commit.encode())?;
    println!("{digest}");
    Ok(digest)
}
