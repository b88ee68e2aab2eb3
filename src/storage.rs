use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

const MAX_EXTENSION_LEN: usize = 10;

/// Stores uploaded report files and hands out opaque references to them.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `bytes` and return the reference to retrieve them by.
    async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> AppResult<String>;

    /// Raw bytes for `reference`. Unknown or malformed references are `NotFound`.
    async fn read(&self, reference: &str) -> AppResult<Vec<u8>>;

    /// Drop a stored file. Only used to undo an upload whose report was never created.
    async fn remove(&self, reference: &str) -> AppResult<()>;

    /// Whether the backing store is usable.
    async fn is_available(&self) -> bool;
}

/// Files kept flat in a single directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, reference: &str) -> AppResult<PathBuf> {
        if !is_valid_reference(reference) {
            return Err(AppError::not_found("file not found"));
        }
        Ok(self.root.join(reference))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| AppError::internal(format!("failed to create upload directory: {err}")))?;

        let reference = new_reference(original_name);
        let path = self.root.join(&reference);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|err| AppError::internal(format!("failed to store {}: {err}", path.display())))?;

        tracing::debug!(reference = %reference, size = bytes.len(), "stored upload");
        Ok(reference)
    }

    async fn read(&self, reference: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(AppError::not_found("file not found")),
            Err(err) => Err(AppError::internal(format!("failed to read {}: {err}", path.display()))),
        }
    }

    async fn remove(&self, reference: &str) -> AppResult<()> {
        let path = self.resolve(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::internal(format!("failed to remove {}: {err}", path.display()))),
        }
    }

    async fn is_available(&self) -> bool {
        if tokio::fs::create_dir_all(&self.root).await.is_err() {
            return false;
        }
        tokio::fs::metadata(&self.root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }
}

/// `<unix millis>-<uuid>[.ext]`, keeping a short alphanumeric extension from the upload.
fn new_reference(original_name: Option<&str>) -> String {
    let stem = format!("{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4().simple());

    let extension = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= MAX_EXTENSION_LEN)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

/// A reference is a single plain file name: no separators, no leading dot.
pub fn is_valid_reference(reference: &str) -> bool {
    !reference.is_empty()
        && !reference.starts_with('.')
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn saved_files_read_back() {
        let dir = tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().join("uploads"));

        let reference = storage.save(Some("Quarterly Report.PDF"), b"%PDF-1.4").await.unwrap();
        assert!(reference.ends_with(".pdf"));
        assert!(is_valid_reference(&reference));
        assert_eq!(storage.read(&reference).await.unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn references_are_unique() {
        let dir = tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let a = storage.save(Some("a.txt"), b"one").await.unwrap();
        let b = storage.save(Some("a.txt"), b"two").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn missing_and_traversal_references_are_not_found() {
        let dir = tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        for reference in ["nope.pdf", "../etc/passwd", "a/b", ".env", ""] {
            assert!(
                matches!(storage.read(reference).await, Err(AppError::NotFound(_))),
                "{reference}"
            );
        }
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let reference = storage.save(None, b"data").await.unwrap();
        storage.remove(&reference).await.unwrap();
        storage.remove(&reference).await.unwrap();
        assert!(matches!(storage.read(&reference).await, Err(AppError::NotFound(_))));
    }

    #[test]
    fn odd_extensions_are_dropped() {
        assert!(!new_reference(Some("evil.p/hp")).contains('/'));
        assert!(!new_reference(Some("archive.averyveryverylongext")).contains('.'));
        assert!(!new_reference(Some("noext")).contains('.'));
    }
}
