use crate::domain_model::{AuthState, User};

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("validation rejected: {0}")]
    Validation(String),
    #[error("response missing user or session")]
    InvalidResponseFormat,
    #[error("refresh token invalid or expired")]
    InvalidRefreshToken,
    #[error("bridge sync failed: {0}")]
    BridgeSync(String),
    #[error("store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub business_type: String,
    pub business_name: String,
}

/// Convenience result for callers that only need a presence check plus the
/// raw persisted access token.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub user: User,
    pub access_token: String,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Authenticate with email and password. Errors are surfaced to the
    /// caller; a failed bridge mirror alone does not fail the sign-in.
    async fn sign_in(&self, request: SignInInput) -> Result<User, AuthError>;
    async fn sign_up(&self, request: SignUpInput) -> Result<User, AuthError>;
    /// Remote logout is best-effort; local teardown always runs. Never fails.
    async fn sign_out(&self);
    /// Reconciliation read. Any internal failure degrades to `None`; only an
    /// invalid refresh token also clears the persisted record.
    async fn current_user(&self) -> Option<User>;
    async fn current_session(&self) -> Option<SessionHandle>;
    async fn state(&self) -> AuthState;
}
