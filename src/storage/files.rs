//! Filesystem operations under the content root

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use super::paths::{self, PathError};

/// Classification applied once to every filesystem error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsErrorKind {
    NotFound,
    Permission,
    InvalidArgument,
    Other,
}

impl FsErrorKind {
    /// Classify an I/O error
    pub fn classify(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FsErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => FsErrorKind::Permission,
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => {
                FsErrorKind::InvalidArgument
            }
            _ => FsErrorKind::Other,
        }
    }
}

/// Files addressed relative to a single content root
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the content root if it does not exist yet
    pub async fn ensure_root(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// The content root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a request path to a file location under the root
    pub fn resolve(&self, request_path: &str) -> Result<PathBuf, PathError> {
        paths::resolve(&self.root, request_path)
    }

    /// Resolve an upload's destination directory and file
    pub fn resolve_upload(
        &self,
        request_path: &str,
        filename: &str,
    ) -> Result<(PathBuf, PathBuf), PathError> {
        paths::resolve_upload(&self.root, request_path, filename)
    }

    /// Read an entire file
    ///
    /// Directories are reported as not found.
    pub async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        if tokio::fs::metadata(path).await?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is a directory", path.display()),
            ));
        }
        tokio::fs::read(path).await
    }

    /// Whether something exists at `path`
    ///
    /// Stat failures other than not-found count as existing.
    pub async fn exists(&self, path: &Path) -> bool {
        match tokio::fs::metadata(path).await {
            Ok(_) => true,
            Err(e) => e.kind() != io::ErrorKind::NotFound,
        }
    }

    /// Create a directory and all missing parents
    pub async fn create_dirs(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    /// Write `data` to `path`, replacing any existing content
    pub async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    /// Remove a file or an empty directory
    pub async fn remove(&self, path: &Path) -> io::Result<()> {
        if tokio::fs::symlink_metadata(path).await?.is_dir() {
            tokio::fs::remove_dir(path).await
        } else {
            tokio::fs::remove_file(path).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_classify() {
        let kind = |k| FsErrorKind::classify(&io::Error::from(k));
        assert_eq!(kind(io::ErrorKind::NotFound), FsErrorKind::NotFound);
        assert_eq!(kind(io::ErrorKind::PermissionDenied), FsErrorKind::Permission);
        assert_eq!(kind(io::ErrorKind::InvalidInput), FsErrorKind::InvalidArgument);
        assert_eq!(kind(io::ErrorKind::Interrupted), FsErrorKind::Other);
    }

    #[tokio::test]
    async fn test_write_read_remove() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path());

        let (parent, file) = store.resolve_upload("/a/b", "f.txt").unwrap();
        assert!(!store.exists(&file).await);

        store.create_dirs(&parent).await.unwrap();
        store.write(&file, b"first").await.unwrap();
        assert!(store.exists(&file).await);
        assert_eq!(store.read(&file).await.unwrap(), b"first");

        // Shorter content fully replaces longer content
        store.write(&file, b"2nd").await.unwrap();
        assert_eq!(store.read(&file).await.unwrap(), b"2nd");

        store.remove(&file).await.unwrap();
        assert!(!store.exists(&file).await);

        let err = store.read(&file).await.unwrap_err();
        assert_eq!(FsErrorKind::classify(&err), FsErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read_directory_not_found() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        store.create_dirs(&dir.path().join("sub")).await.unwrap();

        for path in ["/", "/sub"] {
            let target = store.resolve(path).unwrap();
            let err = store.read(&target).await.unwrap_err();
            assert_eq!(FsErrorKind::classify(&err), FsErrorKind::NotFound, "{}", path);
        }
    }

    #[tokio::test]
    async fn test_remove_directories() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path());

        let empty = dir.path().join("empty");
        store.create_dirs(&empty).await.unwrap();
        store.remove(&empty).await.unwrap();
        assert!(!empty.exists());

        let full = dir.path().join("full");
        store.create_dirs(&full).await.unwrap();
        store.write(&full.join("f.txt"), b"x").await.unwrap();
        assert!(store.remove(&full).await.is_err());
        assert!(full.join("f.txt").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_new_files_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        let file = store.resolve("/private.bin").unwrap();
        store.write(&file, b"x").await.unwrap();

        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_ensure_root() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().join("nested/content"));
        store.ensure_root().await.unwrap();
        assert!(store.root().is_dir());
    }
}
