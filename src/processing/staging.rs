//! Scratch storage for uploads while a request is in flight.
//!
//! Each upload is written to its own `root/<uuid>/` directory, so concurrent requests with
//! the same filename never share a path. [`StagedUpload::remove`] deletes that directory;
//! if a request future is dropped before reaching it, `Drop` removes the directory instead.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

const FALLBACK_FILENAME: &str = "upload";

/// Failures while preparing the staging area or writing an upload into it.
#[derive(Debug, Error)]
pub enum StagingError {
    /// A staging directory could not be created.
    #[error("failed to create staging directory {path}: {source}")]
    Directory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The upload content could not be written.
    #[error("failed to write staged upload {path}: {source}")]
    Write {
        /// Destination path of the upload.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Shared root directory under which uploads are staged.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Create the root directory if needed. An existing directory is fine.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StagingError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StagingError::Directory {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Root directory of the staging area.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under a fresh request directory and return the guard owning it.
    pub async fn persist(&self, filename: &str, bytes: &[u8]) -> Result<StagedUpload, StagingError> {
        let dir = self.root.join(Uuid::new_v4().simple().to_string());
        tokio::fs::create_dir(&dir)
            .await
            .map_err(|source| StagingError::Directory {
                path: dir.clone(),
                source,
            })?;

        let mut staged = StagedUpload {
            path: dir.join(safe_basename(filename)),
            dir,
            released: false,
        };
        if let Err(source) = tokio::fs::write(&staged.path, bytes).await {
            let path = staged.path.clone();
            if let Err(error) = staged.remove().await {
                tracing::error!(path = %path.display(), error = %error, "Failed to clean up partial upload");
            }
            return Err(StagingError::Write { path, source });
        }

        tracing::debug!(path = %staged.path.display(), bytes = bytes.len(), "Staged upload");
        Ok(staged)
    }
}

/// One staged upload; owns its request directory until removed.
#[derive(Debug)]
pub struct StagedUpload {
    dir: PathBuf,
    path: PathBuf,
    released: bool,
}

impl StagedUpload {
    /// Location of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged file and its request directory.
    ///
    /// Only the first call touches the filesystem; later calls return `Ok(())`. A directory
    /// that is already gone counts as removed.
    pub async fn remove(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error),
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                tracing::debug!(path = %self.dir.display(), "Removed abandoned staged upload");
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                tracing::error!(path = %self.dir.display(), error = %error, "Failed to remove abandoned staged upload");
            }
        }
    }
}

/// Reduce a client-supplied filename to its final component so it cannot leave its directory.
fn safe_basename(filename: &str) -> &str {
    match filename.rsplit(['/', '\\']).next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => name,
        _ => FALLBACK_FILENAME,
    }
}
