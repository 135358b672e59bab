use std::io::Write;

use eyre::{Context, Result};

use crate::digest::Digest;
use crate::object;
use crate::store::ObjectStore;

/// Read an object and write its raw payload to a freshly created
/// `temp_git_file_XXXXXX`, then print `<path>: <type>`. If the bytes
/// actually written disagree with the object's declared payload length,
/// `<type>` is printed as `bad` instead.
pub fn run(digest_hex: &str) -> Result<()> {
    let store = ObjectStore::from_env();
    let digest = Digest::from_hex(digest_hex).wrap_err("parsing digest")?;
    let (kind, payload) = object::read(&store, &digest)?;

    let mut tmp = tempfile::Builder::new()
        .prefix("temp_git_file_")
        .tempfile()
        .wrap_err("creating temp file")?;
    let written = tmp.write(&payload).wrap_err("writing temp file")?;

    let type_label = if written == payload.len() {
        kind.to_string()
    } else {
        "bad".to_owned()
    };

    let path = tmp.into_temp_path();
    println!("{}: {}", path.display(), type_label);
    path.keep().wrap_err("persisting temp file")?;
    Ok(())
}
