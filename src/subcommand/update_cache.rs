use std::fs;
use std::path::Path;

use eyre::{Context, Result};
use tracing::{info, warn};

use crate::digest::Digest;
use crate::index::{Index, IndexEntry, IndexEntryStats};
use crate::object::{self, ObjectKind};
use crate::store::ObjectStore;
use crate::verify::verify_path;

use super::index_path;

/// Stage `paths` into the index. A path that fails validation is skipped
/// with a warning rather than aborting the batch; a path whose file has
/// vanished since it was last staged is removed from the index instead of
/// erroring. Any other I/O or store failure aborts the whole command.
pub fn run(paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        eyre::bail!("update-cache requires at least one path");
    }

    let store = ObjectStore::from_env();
    let index_file = index_path(&store);
    let mut index = Index::load(&index_file).wrap_err("loading index")?;

    for path in paths {
        if verify_path(path).is_err() {
            println!("Ignoring path {path}");
            warn!(path, "rejected by path validation");
            continue;
        }

        match fs::symlink_metadata(path) {
            Ok(meta) => {
                stage_one(&store, &mut index, path, &meta)
                    .wrap_err_with(|| format!("staging {path}"))?;
                info!(path, "staged");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                index.remove(path);
                info!(path, "removed from index (file no longer exists)");
            }
            Err(e) => return Err(e).wrap_err_with(|| format!("statting {path}")),
        }
    }

    index.save(&index_file).wrap_err("writing index")?;
    Ok(())
}

fn stage_one(
    store: &ObjectStore,
    index: &mut Index,
    path: &str,
    meta: &std::fs::Metadata,
) -> Result<()> {
    let fs_path = Path::new(path);

    let content = if meta.file_type().is_symlink() {
        fs::read_link(fs_path)
            .wrap_err_with(|| format!("reading symlink {path}"))?
            .into_os_string()
            .into_string()
            .map_err(|_| eyre::eyre!("symlink target is not valid UTF-8: {path}"))?
            .into_bytes()
    } else {
        fs::read(fs_path).wrap_err_with(|| format!("reading {path}"))?
    };

    let digest: Digest = object::write(store, ObjectKind::Blob, &content)?;

    index.insert(IndexEntry {
        name: path.to_owned(),
        stats: IndexEntryStats::from(meta),
        digest,
    });

    Ok(())
}
