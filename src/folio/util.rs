use crate::error::{RegistryError, RegistryResult};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `bytes` through a temp file in the same directory, so
/// readers see either the old or the new content and never a torn file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> RegistryResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(parent)
        .map_err(|err| RegistryError::io("failed to create temp file in", parent, err))?;
    tmp.write_all(bytes)
        .map_err(|err| RegistryError::io("failed to write temp file for", path, err))?;
    tmp.as_file()
        .sync_all()
        .map_err(|err| RegistryError::io("failed to sync temp file for", path, err))?;
    tmp.persist(path)
        .map_err(|err| RegistryError::io("failed to replace", path, err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write_atomic;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_replaces_content_and_leaves_no_temp_files() {
        let tmp = tempdir().expect("tempdir");
        let target = tmp.path().join("projects.json");
        fs::write(&target, "old").expect("seed");

        write_atomic(&target, b"new").expect("write");

        assert_eq!(fs::read_to_string(&target).expect("read"), "new");
        let entries = fs::read_dir(tmp.path()).expect("read dir").count();
        assert_eq!(entries, 1);
    }
}
