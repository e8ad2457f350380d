use std::path::PathBuf;

use uuid::Uuid;

pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// A service image value is either a stored file path or an external URL
/// kept verbatim; only stored files are ever deleted from disk.
pub fn is_external_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Local-disk storage for uploaded service images.
#[derive(Debug, Clone)]
pub struct ImageStorage {
    base_dir: PathBuf,
}

impl ImageStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn from_env() -> Self {
        let base_dir =
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "storage".to_string());
        Self::new(base_dir)
    }

    /// Store an uploaded image and return the relative path recorded on the
    /// service row.
    pub async fn store(&self, extension: &str, data: &[u8]) -> std::io::Result<String> {
        let relative = format!("services/{}.{}", Uuid::new_v4(), extension);
        let full_path = self.base_dir.join(&relative);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, data).await?;

        Ok(relative)
    }

    /// Remove a stored file. Missing files are fine; deletion runs after
    /// the owning row is already gone.
    pub async fn delete(&self, relative_path: &str) -> std::io::Result<()> {
        let full_path = self.base_dir.join(relative_path);
        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_recognized() {
        assert!(is_external_url("https://example.com/image.png"));
        assert!(is_external_url("http://example.com/image.png"));
        assert!(!is_external_url("services/abc.png"));
        assert!(!is_external_url("storage/services/abc.png"));
    }

    #[tokio::test]
    async fn store_and_delete_round_trip() {
        let dir = std::env::temp_dir().join(format!("image-storage-{}", Uuid::new_v4()));
        let storage = ImageStorage::new(&dir);

        let path = storage.store("png", b"not really a png").await.unwrap();
        assert!(path.starts_with("services/"));
        assert!(path.ends_with(".png"));
        assert!(dir.join(&path).exists());

        storage.delete(&path).await.unwrap();
        assert!(!dir.join(&path).exists());

        // Deleting again is a no-op.
        storage.delete(&path).await.unwrap();

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
