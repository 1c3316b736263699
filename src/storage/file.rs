// File-per-key storage in a directory

use super::{Storage, validate_key};
use eyre::{Context, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a temporary file under an exclusive lock and are renamed into
/// place, so a reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open or create storage rooted at `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create storage directory {:?}", dir))?;
        Ok(Self { dir })
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.path_for(key);

        if !path.exists() {
            return Ok(None);
        }

        let value = fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        Ok(Some(value))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{}.json.tmp", key));

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path(key))
            .context("Failed to open storage lock file")?;

        // Acquire exclusive lock before writing
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        if let Err(e) = write_replace(&tmp_path, &path, value) {
            if tmp_path.exists() {
                let _ = fs::remove_file(&tmp_path);
            }
            return Err(e);
        }
        debug!(file = ?path, bytes = value.len(), "Wrote storage slot");

        // Lock is released when `lock` is dropped
        Ok(())
    }
}

/// Write `value` to `tmp_path`, flush it, then move it over `path`
fn write_replace(tmp_path: &Path, path: &Path, value: &str) -> Result<()> {
    let mut file = fs::File::create(tmp_path).with_context(|| format!("Failed to create {:?}", tmp_path))?;
    file.write_all(value.as_bytes())
        .with_context(|| format!("Failed to write {:?}", tmp_path))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync {:?}", tmp_path))?; // Ensure data is flushed to disk
    drop(file);

    fs::rename(tmp_path, path).with_context(|| format!("Failed to replace {:?}", path))?;
    Ok(())
}
