//! In-memory keystore store, mainly for tests.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::CoreResult;
use crate::services::keys::KeystoreDocument;

use super::r#trait::KeystoreStore;

/// In-memory [`KeystoreStore`].
#[derive(Debug, Default)]
pub struct InMemoryKeystoreStore {
    document: RwLock<Option<KeystoreDocument>>,
}

impl InMemoryKeystoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeystoreStore for InMemoryKeystoreStore {
    async fn load(&self) -> CoreResult<Option<KeystoreDocument>> {
        Ok(self.document.read().await.clone())
    }

    async fn save(&self, document: &KeystoreDocument) -> CoreResult<()> {
        *self.document.write().await = Some(document.clone());
        Ok(())
    }
}
