use eyre::{Context, Result};
use tracing::info;

use crate::store::ObjectStore;

/// Create the object database. If `SHA1_FILE_DIRECTORY` is set and already
/// names an existing directory, refuse rather than silently reusing it —
/// the override is treated as "already initialized elsewhere".
pub fn run() -> Result<()> {
    let target = ObjectStore::init_target_from_env();
    if std::env::var("SHA1_FILE_DIRECTORY").is_ok() && target.is_dir() {
        eyre::bail!(
            "{} already exists; refusing to reinitialize an overridden object root",
            target.display()
        );
    }

    let store = ObjectStore::with_root(target);
    store
        .init()
        .wrap_err_with(|| format!("initializing object store at {}", store.root().display()))?;
    info!(root = %store.root().display(), "initialized object database");
    println!("Initialized object database in {}", store.root().display());
    Ok(())
}
