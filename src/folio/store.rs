use crate::error::{RegistryError, RegistryResult};
use crate::folio::model::{Registry, parse_id_suffix};
use crate::folio::util::write_atomic;
use fs2::FileExt;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
    lock_path: PathBuf,
}

/// Exclusive advisory lock on the registry, released on drop.
#[derive(Debug)]
pub struct RegistryLock {
    file: File,
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>, lock_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_path: lock_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock(&self) -> RegistryResult<RegistryLock> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)
            .map_err(|err| RegistryError::io("failed to open lock file", &self.lock_path, err))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(RegistryLock { file }),
            Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                Err(RegistryError::Locked {
                    path: self.path.clone(),
                })
            }
            Err(err) => Err(RegistryError::io("failed to lock", &self.lock_path, err)),
        }
    }

    pub fn load(&self) -> RegistryResult<Registry> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "registry missing, starting empty");
                return Ok(Registry::default());
            }
            Err(err) => return Err(RegistryError::io("failed to read", &self.path, err)),
        };
        let registry: Registry =
            serde_json::from_str(&raw).map_err(|err| self.corrupt(err.to_string()))?;
        self.check_keys(&registry)?;
        tracing::debug!(
            path = %self.path.display(),
            projects = registry.projects.len(),
            "registry loaded"
        );
        Ok(registry)
    }

    pub fn save(&self, registry: &Registry) -> RegistryResult<()> {
        let bytes = serialize(registry).map_err(|err| self.corrupt(err.to_string()))?;
        write_atomic(&self.path, &bytes)?;
        tracing::debug!(
            path = %self.path.display(),
            projects = registry.projects.len(),
            "registry saved"
        );
        Ok(())
    }

    fn check_keys(&self, registry: &Registry) -> RegistryResult<()> {
        for (key, record) in &registry.projects {
            if parse_id_suffix(key).is_none() {
                return Err(self.corrupt(format!("`{key}` is not a project id")));
            }
            if record.id != *key {
                return Err(self.corrupt(format!(
                    "record under `{key}` carries id `{}`",
                    record.id
                )));
            }
        }
        if let Some(last) = &registry.last_id
            && parse_id_suffix(last).is_none()
        {
            return Err(self.corrupt(format!("last-id `{last}` is not a project id")));
        }
        let exhausted = registry
            .projects
            .keys()
            .chain(registry.last_id.as_ref())
            .find(|id| parse_id_suffix(id) == Some(u32::MAX));
        if let Some(id) = exhausted {
            return Err(self.corrupt(format!("`{id}` leaves no room for another project id")));
        }
        Ok(())
    }

    fn corrupt(&self, reason: String) -> RegistryError {
        RegistryError::CorruptFormat {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Sorted keys, four-space indent, trailing newline.
fn serialize(registry: &Registry) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = Serializer::with_formatter(&mut out, formatter);
    registry.serialize(&mut ser)?;
    out.push(b'\n');
    Ok(out)
}
