use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::storage::ImageStore;

/// Stores images as flat files in one directory, served under `url_prefix`
pub struct LocalImageStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalImageStore {
    /// Create the store, making the upload directory if needed
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Result<Self, AppError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            AppError::Storage(format!("Failed to create upload directory {}: {}", root.display(), e))
        })?;

        Ok(LocalImageStore {
            root,
            url_prefix: url_prefix.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URL produced by `save` back to a file name in `root`.
    /// Anything outside the prefix or containing path separators is rejected.
    fn file_name_for<'a>(&self, url: &'a str) -> Option<&'a str> {
        let name = url.strip_prefix(&self.url_prefix)?.strip_prefix('/')?;
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        Some(name)
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, extension: Option<&str>, data: &[u8]) -> Result<String, AppError> {
        let file_name = match extension {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        tokio::fs::write(self.root.join(&file_name), data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", file_name, e)))?;

        tracing::debug!("Stored upload {} ({} bytes)", file_name, data.len());

        Ok(format!("{}/{}", self.url_prefix, file_name))
    }

    async fn remove(&self, url: &str) -> Result<(), AppError> {
        let Some(file_name) = self.file_name_for(url) else {
            tracing::warn!("Not removing image outside upload store: {}", url);
            return Ok(());
        };

        match tokio::fs::remove_file(self.root.join(file_name)).await {
            Ok(()) => {
                tracing::debug!("Removed upload {}", file_name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to remove {}: {}", file_name, e))),
        }
    }

    fn local_mount(&self) -> Option<(&str, &Path)> {
        Some((&self.url_prefix, &self.root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalImageStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path().join("uploads"), "/uploads").unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let (_dir, store) = store();

        let url = store.save(Some("png"), b"fake png").await.unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));

        let name = store.file_name_for(&url).unwrap().to_string();
        let path = store.root().join(&name);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"fake png");

        store.remove(&url).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_names_never_collide() {
        let (_dir, store) = store();

        let a = store.save(Some("jpg"), b"a").await.unwrap();
        let b = store.save(Some("jpg"), b"b").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_ok() {
        let (_dir, store) = store();
        store.remove("/uploads/does-not-exist.png").await.unwrap();
    }

    #[test]
    fn test_local_mount_matches_saved_urls() {
        let (_dir, store) = store();
        let (prefix, root) = store.local_mount().unwrap();
        assert_eq!(prefix, "/uploads");
        assert_eq!(root, store.root());
    }

    #[test]
    fn test_rejects_paths_outside_store() {
        let (_dir, store) = store();
        assert_eq!(store.file_name_for("/uploads/a.png"), Some("a.png"));
        assert_eq!(store.file_name_for("/uploads/../secret"), None);
        assert_eq!(store.file_name_for("/other/a.png"), None);
        assert_eq!(store.file_name_for("/uploadsx/a.png"), None);
    }
}
