//! Per-session transient image storage
//!
//! Each session writes its image to its own uniquely named file, so
//! concurrent sessions never share a path. The file is removed when the
//! [`SpooledImage`] is dropped, on every exit path of the session.

use crate::protocol::ImageUpload;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Directory the session images are written to
#[derive(Debug, Clone)]
pub struct ImageSpool {
    dir: PathBuf,
}

/// An image on disk for the lifetime of one session
#[derive(Debug)]
pub struct SpooledImage {
    file: NamedTempFile,
}

impl SpooledImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl ImageSpool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `image` to a file named after `session_id`
    pub async fn store(&self, session_id: Uuid, image: ImageUpload) -> std::io::Result<SpooledImage> {
        let dir = self.dir.clone();

        tokio::task::spawn_blocking(move || {
            let mut file = tempfile::Builder::new()
                .prefix(&format!("facegate-{session_id}-"))
                .suffix(".jpg")
                .tempfile_in(&dir)?;
            file.write_all(image.as_bytes())?;
            file.flush()?;
            Ok::<_, std::io::Error>(SpooledImage { file })
        })
        .await
        .map_err(std::io::Error::other)?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_writes_bytes_and_removes_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let spool = ImageSpool::new(dir.path());
        let id = Uuid::new_v4();

        let spooled = spool
            .store(id, ImageUpload::new(b"face-bytes".to_vec()))
            .await
            .unwrap();
        let path = spooled.path().to_path_buf();

        assert!(path.starts_with(dir.path()));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains(&id.to_string()));
        assert_eq!(std::fs::read(&path).unwrap(), b"face-bytes");

        drop(spooled);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_sessions_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let spool = ImageSpool::new(dir.path());

        let a = spool
            .store(Uuid::new_v4(), ImageUpload::new(b"a".to_vec()))
            .await
            .unwrap();
        let b = spool
            .store(Uuid::new_v4(), ImageUpload::new(b"b".to_vec()))
            .await
            .unwrap();

        assert_ne!(a.path(), b.path());
        assert_eq!(std::fs::read(a.path()).unwrap(), b"a");
        assert_eq!(std::fs::read(b.path()).unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let spool = ImageSpool::new(dir.path().join("does-not-exist"));
        assert!(spool
            .store(Uuid::new_v4(), ImageUpload::new(b"x".to_vec()))
            .await
            .is_err());
    }
}
