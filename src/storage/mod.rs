//! Image file store.
//!
//! Uploaded blobs land on local disk under generated ids and are served back
//! through a public `/uploads/{file_id}` URL.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::errors::AppError;

/// URL prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Disk-backed store for post images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Open the store, creating the directory if needed.
    pub async fn open(root: &Path) -> Result<Self, AppError> {
        fs::create_dir_all(root).await?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Store an uploaded blob and return its generated file id.
    pub async fn save(&self, file_name: Option<&str>, bytes: &[u8]) -> Result<String, AppError> {
        let file_id = match file_name.and_then(extension_of) {
            Some(ext) => format!("{}.{}", uuid::Uuid::new_v4(), ext),
            None => uuid::Uuid::new_v4().to_string(),
        };
        fs::write(self.root.join(&file_id), bytes).await?;
        Ok(file_id)
    }

    /// Public URL for a stored file.
    pub fn public_url(&self, file_id: &str) -> String {
        format!("{}/{}", PUBLIC_PREFIX, file_id)
    }

    /// Delete a stored file.
    pub async fn delete(&self, file_id: &str) -> Result<(), AppError> {
        if !is_safe_id(file_id) {
            return Err(AppError::BadRequest("Invalid file id".to_string()));
        }
        match fs::remove_file(self.root.join(file_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("File {} not found", file_id)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Lowercased alphanumeric extension from an original file name.
fn extension_of(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// File ids are generated server-side; reject anything that could traverse
/// outside the upload directory.
fn is_safe_id(file_id: &str) -> bool {
    !file_id.is_empty()
        && !file_id.contains('/')
        && !file_id.contains('\\')
        && !file_id.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_delete_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::open(dir.path()).await.unwrap();

        let file_id = store
            .save(Some("cover.PNG"), b"image-bytes")
            .await
            .unwrap();
        assert!(file_id.ends_with(".png"));
        assert_eq!(store.public_url(&file_id), format!("/uploads/{}", file_id));

        let on_disk = tokio::fs::read(dir.path().join(&file_id)).await.unwrap();
        assert_eq!(on_disk, b"image-bytes");

        store.delete(&file_id).await.unwrap();
        assert!(matches!(
            store.delete(&file_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::open(dir.path()).await.unwrap();

        assert!(matches!(
            store.delete("../etc/passwd").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_extension_sanitization() {
        assert_eq!(extension_of("photo.jpeg"), Some("jpeg".to_string()));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of("weird.j/pg"), None);
    }
}
