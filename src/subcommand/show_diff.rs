use std::fs;
use std::path::Path;

use eyre::{Context, Result};

use crate::diff;
use crate::index::Index;
use crate::store::ObjectStore;

use super::index_path;

/// For every staged entry, compare it against the working tree. Unchanged
/// entries print `<name>: ok`; changed entries print `<name>:  <hex>`
/// followed by a unified diff against the stored blob. An empty index
/// produces no output and still exits 0.
pub fn run() -> Result<()> {
    let store = ObjectStore::from_env();
    let index = Index::load(&index_path(&store)).wrap_err("loading index")?;

    for entry in index.entries() {
        let path = Path::new(&entry.name);
        let meta = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                println!("{}: removed", entry.name);
                continue;
            }
            Err(e) => return Err(e).wrap_err_with(|| format!("statting {}", entry.name)),
        };

        let bits = diff::changed_bits(entry, &meta);
        if bits == 0 {
            println!("{}: ok", entry.name);
            continue;
        }

        println!("{}:  {}", entry.name, entry.digest);
        let out = diff::run_external_diff(&store, entry, path)?;
        print!("{out}");
    }
    Ok(())
}
