use crate::application_port::AuthError;
use crate::domain_model::{BridgeSession, User};

/// Adapter to the secondary, authorization-sensitive backend. Its row-level
/// access checks only pass while it holds a mirrored token pair, so the
/// facade keeps this session in step with the identity API.
#[async_trait::async_trait]
pub trait SessionBridge: Send + Sync {
    /// Mirror an externally-obtained token pair. `InvalidRefreshToken` means
    /// the pair can no longer be made authoritative.
    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<BridgeSession, AuthError>;
    /// The bridge's current in-memory session, not the persisted record.
    async fn get_session(&self) -> Result<Option<BridgeSession>, AuthError>;
    /// Exchange a refresh token for a new pair. `InvalidRefreshToken` is the
    /// distinguishable expired/revoked case.
    async fn refresh_session(&self, refresh_token: &str) -> Result<BridgeSession, AuthError>;
    /// Verification probe after `set_session`: confirms the mirrored session
    /// is usable for authorization.
    async fn get_user(&self) -> Result<Option<User>, AuthError>;
}
