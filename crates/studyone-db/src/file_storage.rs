//! Filesystem content backend for markdown bodies.
//!
//! Paths are opaque relative strings such as `knowledge/markdown/{uuid}.md`,
//! resolved against the configured data directory. Writes are atomic
//! (temp file + rename) and deleting a missing path succeeds.
//!
//! ## Example
//!
//! ```rust,ignore
//! use studyone_db::FilesystemBackend;
//!
//! let backend = FilesystemBackend::new("/var/lib/studyone");
//! backend.write("knowledge/markdown/note.md", b"# Hello").await?;
//! ```

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use studyone_core::{Error, Result, StorageBackend};

/// Filesystem storage backend rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(Error::InvalidInput(format!(
                "Storage path must be relative and stay inside the data directory: {}",
                path
            )));
        }
        Ok(self.base_path.join(relative))
    }

    /// Check that the data directory accepts a write, read and delete.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the step that failed.
    pub async fn validate(&self) -> Result<()> {
        let check_dir = self.base_path.join(".health-check");
        let check_file = check_dir.join("check.md");
        let data = b"studyone-health-check";
        let failed = |step: &str, e: std::io::Error| {
            Error::Config(format!(
                "Data directory {} is not usable ({}): {}",
                self.base_path.display(),
                step,
                e
            ))
        };

        fs::create_dir_all(&check_dir)
            .await
            .map_err(|e| failed("create directory", e))?;
        fs::write(&check_file, data)
            .await
            .map_err(|e| failed("write", e))?;
        let read_back = fs::read(&check_file).await.map_err(|e| failed("read", e))?;
        fs::remove_file(&check_file)
            .await
            .map_err(|e| failed("delete", e))?;
        let _ = fs::remove_dir(&check_dir).await;

        if read_back != data {
            return Err(Error::Config(format!(
                "Data directory {} returned different bytes than written",
                self.base_path.display()
            )));
        }
        debug!(
            subsystem = "storage",
            component = "filesystem",
            op = "validate",
            base_path = %self.base_path.display(),
            "Data directory validated"
        );
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path)?;
        debug!(
            subsystem = "storage",
            component = "filesystem",
            op = "write",
            storage_path = %path,
            bytes = data.len(),
            "Writing content"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(
                    parent = %parent.display(),
                    error = %e,
                    "file_storage: create_dir_all failed"
                );
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(
                temp_path = %temp_path.display(),
                error = %e,
                "file_storage: File::create failed"
            );
            e
        })?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(
                from = %temp_path.display(),
                to = %full_path.display(),
                error = %e,
                "file_storage: rename failed"
            );
            e
        })?;

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path)?;
        Ok(fs::read(full_path).await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    subsystem = "storage",
                    component = "filesystem",
                    op = "delete",
                    storage_path = %path,
                    "Path already absent"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
