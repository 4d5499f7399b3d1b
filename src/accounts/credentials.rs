use super::Credential;
use crate::error::{Result, UnipkgError};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Secure-storage boundary, keyed by account handler id.
pub trait CredentialStore: Send + Sync {
    fn get(&self, handler_id: &str) -> Result<Option<Credential>>;
    fn save(&self, handler_id: &str, credential: &Credential) -> Result<()>;
    fn remove(&self, handler_id: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<BTreeMap<String, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Credential>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, handler_id: &str) -> Result<Option<Credential>> {
        Ok(self.entries().get(handler_id).cloned())
    }

    fn save(&self, handler_id: &str, credential: &Credential) -> Result<()> {
        self.entries()
            .insert(handler_id.to_string(), credential.clone());
        Ok(())
    }

    fn remove(&self, handler_id: &str) -> Result<()> {
        self.entries().remove(handler_id);
        Ok(())
    }
}

/// JSON file of credentials, rewritten atomically under an exclusive lock.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> Result<&Path> {
        self.path.parent().ok_or_else(|| UnipkgError::Io {
            path: Some(self.path.clone()),
            reason: "credential path has no parent directory".to_string(),
        })
    }

    fn load(&self) -> Result<BTreeMap<String, Credential>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| UnipkgError::io(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Read-modify-write under `credentials.lock`.
    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, Credential>)) -> Result<()> {
        let dir = self.dir()?;
        fs::create_dir_all(dir).map_err(|e| UnipkgError::io(dir, e))?;

        let lock_path = self.path.with_extension("lock");
        let lock = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| UnipkgError::io(&lock_path, e))?;
        lock.lock_exclusive()
            .map_err(|e| UnipkgError::io(&lock_path, e))?;

        let mut entries = self.load()?;
        change(&mut entries);
        let result = self.write_atomically(&entries);

        let _ = FileExt::unlock(&lock);
        result
    }

    fn write_atomically(&self, entries: &BTreeMap<String, Credential>) -> Result<()> {
        let content = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("tmp");

        let mut tmp = fs::File::create(&tmp_path).map_err(|e| UnipkgError::io(&tmp_path, e))?;
        restrict_permissions(&tmp)?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.sync_all())
            .map_err(|e| UnipkgError::io(&tmp_path, e))?;

        fs::rename(&tmp_path, &self.path).map_err(|e| UnipkgError::io(&self.path, e))
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
        .map_err(UnipkgError::from)
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> Result<()> {
    Ok(())
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, handler_id: &str) -> Result<Option<Credential>> {
        Ok(self.load()?.remove(handler_id))
    }

    fn save(&self, handler_id: &str, credential: &Credential) -> Result<()> {
        self.update(|entries| {
            entries.insert(handler_id.to_string(), credential.clone());
        })
    }

    fn remove(&self, handler_id: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| {
            entries.remove(handler_id);
        })
    }
}
