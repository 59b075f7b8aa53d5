//! Persistence of one step's result snapshot.
//!
//! The snapshot is a key-sorted JSON object (the output map is a `BTreeMap`,
//! so ordering comes for free), UTF-8 with LF line endings and a final
//! newline. Writes go through a temporary file in the target directory and
//! a rename, so observers never see a torn file; filesystems that refuse
//! the rename get a plain write instead.

use std::io::{self, Write};
use std::path::Path;

use cads_fmu::OutputMap;

pub fn write(path: &Path, outputs: &OutputMap) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => {
            create_parent_dirs(p)?;
            p
        }
        _ => Path::new("."),
    };

    let mut json = serde_json::to_string_pretty(outputs)?;
    json.push('\n');

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(json.as_bytes())?;
    match tmp.persist(path) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::debug!("atomic rename failed ({}), writing directly", e.error);
            std::fs::write(path, json)
        }
    }
}

/// Created directories get an explicit mode instead of inheriting the
/// process umask, which could leave them world-writable.
#[cfg(unix)]
fn create_parent_dirs(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(path)
}

#[cfg(not(unix))]
fn create_parent_dirs(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}
