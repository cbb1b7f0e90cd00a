use crate::application_port::AuthError;
use crate::domain_port::TokenStore;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Token store backed by a small JSON map on disk, durable across process
/// restarts. Every mutation is a read-modify-write of the whole file; the
/// map only ever holds the two token slots, so that stays cheap.
pub struct FsTokenStore {
    path: PathBuf,
}

impl FsTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FsTokenStore { path: path.into() }
    }

    async fn read_slots(&self) -> Result<HashMap<String, String>, AuthError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => serde_json::from_str(&json)
                .map_err(|e| AuthError::Store(format!("corrupt token file: {}", e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(AuthError::Store(e.to_string())),
        }
    }

    async fn write_slots(&self, slots: &HashMap<String, String>) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthError::Store(e.to_string()))?;
        }
        let json =
            serde_json::to_string(slots).map_err(|e| AuthError::Store(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }
}

#[async_trait::async_trait]
impl TokenStore for FsTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.read_slots().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let mut slots = self.read_slots().await?;
        slots.insert(key.to_string(), value.to_string());
        self.write_slots(&slots).await
    }

    async fn clear(&self, key: &str) -> Result<(), AuthError> {
        let mut slots = self.read_slots().await?;
        if slots.remove(key).is_some() {
            self.write_slots(&slots).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_port::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

    fn temp_store() -> FsTokenStore {
        let path = std::env::temp_dir().join(format!("checkpoint-store-{}.json", uuid::Uuid::new_v4()));
        FsTokenStore::new(path)
    }

    #[tokio::test]
    async fn roundtrip_and_clear() {
        let store = temp_store();

        assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);

        store.set(ACCESS_TOKEN_KEY, "access-1").await.unwrap();
        store.set(REFRESH_TOKEN_KEY, "refresh-1").await.unwrap();
        assert_eq!(
            store.get(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
            Some("access-1")
        );
        assert_eq!(
            store.get(REFRESH_TOKEN_KEY).await.unwrap().as_deref(),
            Some("refresh-1")
        );

        store.clear(ACCESS_TOKEN_KEY).await.unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
        // Clearing an already absent key stays a no-op.
        store.clear(ACCESS_TOKEN_KEY).await.unwrap();

        let _ = tokio::fs::remove_file(&store.path).await;
    }

    #[tokio::test]
    async fn survives_reopen() {
        let store = temp_store();
        store.set(ACCESS_TOKEN_KEY, "persisted").await.unwrap();

        let reopened = FsTokenStore::new(store.path.clone());
        assert_eq!(
            reopened.get(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
            Some("persisted")
        );

        let _ = tokio::fs::remove_file(&store.path).await;
    }
}
