//! Upload storage for listing images.
//!
//! Listing code talks to [`ImageStore`] only and deals in URL paths, so the
//! backing medium can change without touching the services.

pub mod local;

pub use local::LocalImageStore;

use std::path::Path;

use async_trait::async_trait;

use crate::error::AppError;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist an image under a freshly generated unique name and return the
    /// URL path it is served from.
    async fn save(&self, extension: Option<&str>, data: &[u8]) -> Result<String, AppError>;

    /// Remove the image behind a URL previously returned by [`ImageStore::save`].
    /// An image that is already gone is not an error.
    async fn remove(&self, url: &str) -> Result<(), AppError>;

    /// URL prefix and directory to serve statically, for stores whose files
    /// live on local disk. Remote stores serve their own URLs.
    fn local_mount(&self) -> Option<(&str, &Path)> {
        None
    }
}

/// Extension of an uploaded file name, kept only when it is a plain
/// alphanumeric suffix so it can be appended to a generated name safely.
pub fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 10 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_string())
}
