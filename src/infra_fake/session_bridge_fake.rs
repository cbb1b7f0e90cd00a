use crate::application_port::AuthError;
use crate::domain_model::{BridgeSession, User};
use crate::domain_port::SessionBridge;
use chrono::Utc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scriptable bridge stand-in. By default a refresh grants a renewed pair
/// derived from the submitted refresh token; tests override the outcome to
/// drive the failure paths.
#[derive(Debug, Default)]
pub struct FakeSessionBridge {
    session: Mutex<Option<BridgeSession>>,
    user: Mutex<Option<User>>,
    set_failure: Mutex<Option<AuthError>>,
    refresh_outcome: Mutex<Option<Result<BridgeSession, AuthError>>>,
    set_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
}

impl FakeSessionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_stored_session(&self, session: Option<BridgeSession>) {
        *self.session.lock().unwrap() = session;
    }

    /// Seed a session whose expiry is already in the past.
    pub fn set_expired_session(&self, access_token: &str, refresh_token: &str) {
        self.set_stored_session(Some(BridgeSession {
            access_token: access_token.to_string(),
            refresh_token: Some(refresh_token.to_string()),
            expires_at: Some(Utc::now() - chrono::Duration::seconds(60)),
        }));
    }

    pub fn set_user(&self, user: Option<User>) {
        *self.user.lock().unwrap() = user;
    }

    pub fn fail_set_session(&self, error: AuthError) {
        *self.set_failure.lock().unwrap() = Some(error);
    }

    pub fn set_refresh_outcome(&self, outcome: Result<BridgeSession, AuthError>) {
        *self.refresh_outcome.lock().unwrap() = Some(outcome);
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionBridge for FakeSessionBridge {
    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<BridgeSession, AuthError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.set_failure.lock().unwrap().clone() {
            return Err(error);
        }
        let session = BridgeSession {
            access_token: access_token.to_string(),
            refresh_token: Some(refresh_token.to_string()),
            expires_at: None,
        };
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(session)
    }

    async fn get_session(&self) -> Result<Option<BridgeSession>, AuthError> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<BridgeSession, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = match self.refresh_outcome.lock().unwrap().clone() {
            Some(outcome) => outcome,
            None => Ok(BridgeSession {
                access_token: format!("renewed:{}", refresh_token),
                refresh_token: Some(format!("renewed-refresh:{}", refresh_token)),
                expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
            }),
        };
        if let Ok(session) = &outcome {
            *self.session.lock().unwrap() = Some(session.clone());
        }
        outcome
    }

    async fn get_user(&self) -> Result<Option<User>, AuthError> {
        Ok(self.user.lock().unwrap().clone())
    }
}
