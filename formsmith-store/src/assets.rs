//! Asset storage boundary for image fields.
//!
//! The engine stores only asset keys; resolving a key to bytes or a URL is
//! the collaborator's job. No validation logic lives here.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Result, StoreError};

/// Collaborator that turns asset keys into URLs.
#[async_trait]
pub trait AssetStorage: Send + Sync {
    /// A URL the client uploads the asset body to.
    async fn upload_url(&self, key: &str, content_type: &str) -> Result<String>;

    /// A URL the renderer fetches the asset from.
    async fn view_url(&self, key: &str) -> Result<String>;

    /// Remove the asset.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory asset storage for tests: upload registers the key, view resolves
/// only registered keys.
pub struct MemoryAssetStorage {
    base_url: String,
    keys: Mutex<HashMap<String, String>>,
}

impl MemoryAssetStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            keys: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl AssetStorage for MemoryAssetStorage {
    async fn upload_url(&self, key: &str, content_type: &str) -> Result<String> {
        let mut keys = self.keys.lock().await;
        keys.insert(key.to_string(), content_type.to_string());
        Ok(format!("{}/upload/{}", self.base_url, key))
    }

    async fn view_url(&self, key: &str) -> Result<String> {
        let keys = self.keys.lock().await;
        if !keys.contains_key(key) {
            return Err(StoreError::AssetNotFound {
                key: key.to_string(),
            });
        }
        Ok(format!("{}/assets/{}", self.base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut keys = self.keys.lock().await;
        keys.remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::AssetNotFound {
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_view_then_delete() {
        let assets = MemoryAssetStorage::new("https://cdn.test");

        let up = assets.upload_url("logo.png", "image/png").await.unwrap();
        assert_eq!(up, "https://cdn.test/upload/logo.png");

        let view = assets.view_url("logo.png").await.unwrap();
        assert_eq!(view, "https://cdn.test/assets/logo.png");

        assets.delete("logo.png").await.unwrap();
        assert!(assets.view_url("logo.png").await.is_err());
    }

    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let assets = MemoryAssetStorage::new("https://cdn.test");
        let err = assets.view_url("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::AssetNotFound { .. }));
    }
}
