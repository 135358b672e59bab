use eyre::{Context, Result};

use crate::digest::Digest;
use crate::error::DircacheError;
use crate::index::Index;
use crate::object::{self, ObjectKind};
use crate::store::ObjectStore;
use crate::tree::{self, TreeEntry};

use super::index_path;

/// Build a flat tree object from the current index, print its digest, and
/// return it.
pub fn run() -> Result<Digest> {
    let store = ObjectStore::from_env();
    let index = Index::load(&index_path(&store)).wrap_err("loading index")?;

    if index.is_empty() {
        return Err(DircacheError::EmptyIndex).wrap_err("cannot write a tree");
    }

    for entry in index.entries() {
        if !store.contains(&entry.digest) {
            eyre::bail!("blob {} for {} is missing from the object store", entry.digest, entry.name);
        }
    }

    let entries: Vec<TreeEntry> = index
        .entries()
        .iter()
        .map(|e| TreeEntry {
            mode: e.stats.mode,
            name: e.name.clone(),
            digest: e.digest,
        })
        .collect();

    let payload = tree::encode(&entries);
    let digest = object::write(&store, ObjectKind::Tree, &payload)?;
    println!("{digest}");
    Ok(digest)
}
