//! Keystore store trait.

use async_trait::async_trait;

use crate::errors::CoreResult;
use crate::services::keys::KeystoreDocument;

/// Persistence contract for the keystore (file, object store, secrets
/// manager). The document carries private material for the active key only.
#[async_trait]
pub trait KeystoreStore: Send + Sync {
    /// Load the persisted keystore, if any.
    async fn load(&self) -> CoreResult<Option<KeystoreDocument>>;

    /// Persist the full keystore, replacing any previous document.
    async fn save(&self, document: &KeystoreDocument) -> CoreResult<()>;
}
