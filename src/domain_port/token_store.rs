use crate::application_port::AuthError;

/// Slot for the access token. Absence of this key is the sole local signal
/// for the signed-out state.
pub const ACCESS_TOKEN_KEY: &str = "auth_token";
/// Slot for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "auth_refresh_token";

/// Durable key-value persistence for the current token pair. Purely
/// mechanical: no validation, no expiry tracking. The facade alone decides
/// when entries are written or cleared.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Absent keys read as `None`, never as an error.
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AuthError>;
    /// Clearing an absent key is a no-op.
    async fn clear(&self, key: &str) -> Result<(), AuthError>;
}
