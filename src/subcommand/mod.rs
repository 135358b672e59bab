pub mod cat_file;
pub mod commit_tree;
pub mod index_dump;
pub mod init_db;
pub mod read_tree;
pub mod show_diff;
pub mod update_cache;
pub mod write_tree;

use std::path::{Path, PathBuf};

use crate::store::ObjectStore;

/// Where the index lives relative to the object store's parent directory:
/// `.dircache/index` sits next to `.dircache/objects`.
pub fn index_path(store: &ObjectStore) -> PathBuf {
    let objects_root = store.root();
    match objects_root.parent() {
        Some(parent) if objects_root.ends_with("objects") => parent.join("index"),
        _ => Path::new(".dircache").join("index"),
    }
}
