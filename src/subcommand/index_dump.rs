use eyre::{Context, Result};

use crate::index::Index;
use crate::store::ObjectStore;

use super::index_path;

/// Read-only introspection: print every index entry as
/// `<mode> <digest> <size> <path>`. Not one of the seven core commands —
/// added for debugging a staged index without decoding it by hand.
pub fn run() -> Result<()> {
    let store = ObjectStore::from_env();
    let index = Index::load(&index_path(&store)).wrap_err("loading index")?;

    for entry in index.entries() {
        println!(
            "{:o} {} {:>8} {}",
            entry.stats.mode, entry.digest, entry.stats.size, entry.name
        );
    }
    Ok(())
}
