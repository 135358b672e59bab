use eyre::{Context, Result};

use crate::digest::Digest;
use crate::object::{self, ObjectKind};
use crate::store::ObjectStore;
use crate::tree;

/// Read a tree object and print its entries as `<mode> <name> (<hex>)`.
pub fn run(tree_hex: &str) -> Result<()> {
    let store = ObjectStore::from_env();
    let digest = Digest::from_hex(tree_hex).wrap_err("parsing tree digest")?;

    let (kind, payload) = object::read(&store, &digest)?;
    if kind != ObjectKind::Tree {
        eyre::bail!("{tree_hex} is a {kind}, not a tree");
    }

    for entry in tree::decode(&payload)? {
        println!("{:o} {} ({})", entry.mode, entry.name, entry.digest);
    }
    Ok(())
}
