use crate::application_port::AuthError;
use crate::domain_model::{TokenPair, User};

/// A successful authentication response from the identity API, already
/// validated at the boundary: both the user and the session were present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityGrant {
    pub user: User,
    pub tokens: TokenPair,
}

/// Stateless adapter to the remote identity API. Source of truth for *who*
/// the user is.
#[async_trait::async_trait]
pub trait IdentityClient: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<IdentityGrant, AuthError>;
    async fn register(
        &self,
        email: &str,
        password: &str,
        business_type: &str,
        business_name: &str,
    ) -> Result<IdentityGrant, AuthError>;
    /// Best-effort; callers may ignore the result.
    async fn logout(&self) -> Result<(), AuthError>;
    /// Degrades to `Ok(None)` on any remote error. Errors are logged inside
    /// the adapter, never propagated.
    async fn current_user(&self) -> Result<Option<User>, AuthError>;
}
