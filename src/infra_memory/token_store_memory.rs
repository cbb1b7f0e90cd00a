use crate::application_port::AuthError;
use crate::domain_port::TokenStore;
use dashmap::DashMap;

/// Process-local token store. Not durable; intended for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slots: DashMap<String, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        MemoryTokenStore {
            slots: DashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.slots.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), AuthError> {
        self.slots.remove(key);
        Ok(())
    }
}
