//! Scratch files for staged uploads.
//!
//! Each upload is written to `<root>/<millis>-<uuid>.<ext>`. The
//! [`ScratchFile`] guard deletes the file when dropped, so the file goes
//! away on success, failure, timeout and client disconnect alike.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ClassifierResult;

/// Directory where uploads are staged.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if needed.
    pub async fn ensure(&self) -> ClassifierResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Build a fresh, collision-free file name.
    ///
    /// Only ASCII alphanumerics of the extension survive; the rest of the
    /// client's filename never reaches the filesystem.
    pub fn file_name_for(extension: Option<&str>) -> String {
        let ext: String = extension
            .unwrap_or_default()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_lowercase();

        let stem = format!("{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4().simple());
        if ext.is_empty() {
            stem
        } else {
            format!("{}.{}", stem, ext)
        }
    }

    /// Create an empty scratch file ready for chunked writes.
    pub async fn create(&self, extension: Option<&str>) -> ClassifierResult<ScratchFile> {
        self.ensure().await?;

        let path = self.root.join(Self::file_name_for(extension));
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        debug!(path = %path.display(), "Created scratch file");

        Ok(ScratchFile {
            path,
            file: Some(file),
            size: 0,
        })
    }

    /// Check that files can be created and removed here.
    pub async fn check_writable(&self) -> ClassifierResult<()> {
        let probe = self.create(Some("probe")).await?;
        drop(probe);
        Ok(())
    }
}

/// A staged upload, removed from disk when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    file: Option<fs::File>,
    size: u64,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written so far.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Append a chunk.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> ClassifierResult<()> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(chunk).await?;
            self.size += chunk.len() as u64;
        }
        Ok(())
    }

    /// Flush and close the write handle so another process can read the file.
    pub async fn finish(&mut self) -> ClassifierResult<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        self.file.take();
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed scratch file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                "Failed to remove scratch file: {}", e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_name_keeps_only_extension() {
        let name = ScratchDir::file_name_for(Some("JPG"));
        assert!(name.ends_with(".jpg"));

        let name = ScratchDir::file_name_for(Some("../../etc/passwd"));
        assert!(!name.contains('/'));
        assert!(name.ends_with(".etcpasswd"));

        let name = ScratchDir::file_name_for(None);
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_file_names_do_not_collide() {
        let a = ScratchDir::file_name_for(Some("jpg"));
        let b = ScratchDir::file_name_for(Some("jpg"));
        assert_ne!(a, b);
    }

    async fn write_scratch(scratch_dir: &ScratchDir, ext: &str, bytes: &[u8]) -> ScratchFile {
        let mut scratch = scratch_dir.create(Some(ext)).await.unwrap();
        scratch.write_chunk(bytes).await.unwrap();
        scratch.finish().await.unwrap();
        scratch
    }

    #[tokio::test]
    async fn test_stage_then_drop_removes_file() {
        let dir = TempDir::new().unwrap();
        let scratch_dir = ScratchDir::new(dir.path().join("uploads"));

        let staged = write_scratch(&scratch_dir, "png", b"leaf bytes").await;
        let path = staged.path().to_path_buf();
        assert_eq!(staged.size(), 10);
        assert_eq!(fs::read(&path).await.unwrap(), b"leaf bytes");

        drop(staged);
        assert!(!path.exists(), "Scratch file should be removed on drop");
    }

    #[tokio::test]
    async fn test_chunked_writes() {
        let dir = TempDir::new().unwrap();
        let scratch_dir = ScratchDir::new(dir.path());

        let mut scratch = scratch_dir.create(Some("jpg")).await.unwrap();
        scratch.write_chunk(b"abc").await.unwrap();
        scratch.write_chunk(b"def").await.unwrap();
        scratch.finish().await.unwrap();

        assert_eq!(scratch.size(), 6);
        assert_eq!(fs::read_to_string(scratch.path()).await.unwrap(), "abcdef");
    }

    #[tokio::test]
    async fn test_drop_tolerates_already_removed_file() {
        let dir = TempDir::new().unwrap();
        let scratch = write_scratch(&ScratchDir::new(dir.path()), "jpg", b"x").await;
        std::fs::remove_file(scratch.path()).unwrap();
        drop(scratch);
    }

    #[tokio::test]
    async fn test_check_writable_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let scratch_dir = ScratchDir::new(dir.path());
        scratch_dir.check_writable().await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
