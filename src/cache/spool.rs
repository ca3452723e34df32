//! Spooling of response bodies whose length is not declared.
//!
//! # Responsibilities
//! - Drain a body stream into a uniquely named temporary file
//! - Report the exact byte count so the upload can declare it
//! - Hand out a reader positioned at the start of the captured body
//! - Delete the file when the spool goes out of scope, on every path
//!
//! # Design Decisions
//! - The spool is a guard: deletion happens in `Drop`, so early returns,
//!   upload errors and cancelled requests all clean up
//! - Deletion failures are logged, never surfaced to the client

use std::path::Path;

use futures_util::{Stream, StreamExt};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::cache::types::SpoolError;

/// A temporary file holding one request's origin body.
#[derive(Debug)]
pub struct Spool {
    file: File,
    path: Option<TempPath>,
    len: u64,
}

impl Spool {
    /// Create an empty spool file in `dir`.
    ///
    /// Creating the file is blocking filesystem work and runs on the blocking
    /// pool.
    pub async fn create(dir: &Path, prefix: &str) -> Result<Self, SpoolError> {
        let dir = dir.to_path_buf();
        let prefix = prefix.to_string();
        let named = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix(&prefix).tempfile_in(&dir)
        })
        .await
        .map_err(|e| SpoolError::Create(std::io::Error::other(e)))?
        .map_err(SpoolError::Create)?;
        let (file, path) = named.into_parts();

        Ok(Self {
            file: File::from_std(file),
            path: Some(path),
            len: 0,
        })
    }

    /// Write the whole stream to disk and rewind. Returns the byte count.
    pub async fn fill<S, B, E>(&mut self, body: S) -> Result<u64, SpoolError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        futures_util::pin_mut!(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| SpoolError::Upstream(e.into()))?;
            let bytes = chunk.as_ref();
            self.file.write_all(bytes).await.map_err(SpoolError::Write)?;
            self.len += bytes.len() as u64;
        }

        self.file.flush().await.map_err(SpoolError::Write)?;
        self.file.rewind().await.map_err(SpoolError::Rewind)?;
        Ok(self.len)
    }

    /// Bytes captured so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Location on disk, until the spool is dropped.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A handle reading the captured body from the start.
    ///
    /// The handle shares the cursor of the spool; take it once, after `fill`.
    pub async fn reader(&self) -> Result<File, SpoolError> {
        self.file.try_clone().await.map_err(SpoolError::Rewind)
    }
}

impl Drop for Spool {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let spool_path = path.to_path_buf();
            match path.close() {
                Ok(()) => tracing::debug!(path = ?spool_path, "Spool removed"),
                Err(e) => tracing::warn!(path = ?spool_path, error = %e, "Failed to remove spool"),
            }
        }
    }
}
