//! File-backed keystore store.
//!
//! A single JSON document on disk. Writes go through a temp file + rename so
//! a crash mid-write never leaves a truncated keystore.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::{CoreError, CoreResult};
use crate::services::keys::KeystoreDocument;

use super::r#trait::KeystoreStore;

/// [`KeystoreStore`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileKeystoreStore {
    path: PathBuf,
}

impl FileKeystoreStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KeystoreStore for FileKeystoreStore {
    async fn load(&self) -> CoreResult<Option<KeystoreDocument>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CoreError::Storage {
                    message: format!("failed to read keystore file: {}", e),
                })
            }
        };
        let document = serde_json::from_slice(&bytes).map_err(|e| CoreError::Storage {
            message: format!("keystore file is not a valid document: {}", e),
        })?;
        Ok(Some(document))
    }

    async fn save(&self, document: &KeystoreDocument) -> CoreResult<()> {
        let bytes = serde_json::to_vec_pretty(document).map_err(|e| CoreError::Storage {
            message: format!("failed to serialize keystore: {}", e),
        })?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| CoreError::Storage {
                message: format!("failed to write keystore file: {}", e),
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CoreError::Storage {
                message: format!("failed to replace keystore file: {}", e),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::keys::{Keystore, SigningAlgorithm};
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("authkit-keystore-{}.json", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let store = FileKeystoreStore::new(temp_path());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let path = temp_path();
        let store = FileKeystoreStore::new(&path);

        let keystore = Keystore::create(SigningAlgorithm::Ed25519).unwrap();
        let document = keystore.to_document();
        store.save(&document).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, document);

        let restored = Keystore::from_document(&loaded).unwrap();
        assert_eq!(restored.active().kid, keystore.active().kid);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_storage_error() {
        let path = temp_path();
        tokio::fs::write(&path, b"not json").await.unwrap();

        let store = FileKeystoreStore::new(&path);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CoreError::Storage { .. }));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
