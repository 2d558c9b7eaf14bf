//! Upload payloads and on-disk staging.
//!
//! The base-URI payload is a fixed name and content pair taken from config.
//! When staging is enabled the content is written to a file first and the
//! upload reads it back; the file is removed as soon as its guard drops,
//! whether the upload succeeded or not.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::PayloadConfig;
use crate::storage::merkle::MerkleError;
use crate::storage::FileData;

/// Named bytes to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    file_name: String,
    content: Vec<u8>,
}

impl Payload {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// The fixed base-URI payload.
    pub fn from_config(config: &PayloadConfig) -> Self {
        Self::new(config.file_name.clone(), config.content.as_bytes())
    }

    /// Read an arbitrary local file, named after its final path component.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let content = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { file_name, content })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn file_data(&self) -> Result<FileData, MerkleError> {
        FileData::from_bytes(self.content.clone())
    }

    /// Write the payload under `dir` and return a guard owning the file.
    pub fn stage(&self, dir: &Path) -> io::Result<ScopedFile> {
        ScopedFile::create(dir.join(&self.file_name), &self.content)
    }
}

/// A file that is deleted when the guard goes out of scope.
#[derive(Debug)]
pub struct ScopedFile {
    path: PathBuf,
}

impl ScopedFile {
    pub fn create(path: PathBuf, contents: &[u8]) -> io::Result<Self> {
        fs::write(&path, contents)?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "Staged payload file");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

impl Drop for ScopedFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed staged payload file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staged payload file"
            ),
        }
    }
}
