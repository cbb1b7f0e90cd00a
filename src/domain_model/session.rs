use crate::domain_model::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        TokenPair {
            access_token: access_token.into(),
            refresh_token,
        }
    }

    /// Value for the refresh slot. Falls back to the access token when the
    /// provider did not issue a distinct refresh token.
    pub fn refresh_or_access(&self) -> &str {
        self.refresh_token.as_deref().unwrap_or(&self.access_token)
    }
}

/// The unit exchanged between components: who the user is, paired with the
/// tokens that authorize requests on their behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub tokens: TokenPair,
}

/// The bridge's own in-memory session, distinct from the persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BridgeSession {
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Utc::now() >= at,
            None => false,
        }
    }

    /// Whether the bridge can still authorize requests with this session.
    pub fn is_usable(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    SignedOut,
    SigningIn,
    SignedIn(Session),
    Refreshing,
}
