use crate::application_port::AuthError;
use crate::domain_model::{TokenPair, User};
use crate::domain_port::{IdentityClient, IdentityGrant};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scriptable identity API stand-in for tests and demos. With no grant
/// configured, login and register answer like a server that returned an
/// empty payload.
#[derive(Debug, Default)]
pub struct FakeIdentityClient {
    grant: Mutex<Option<IdentityGrant>>,
    login_failure: Mutex<Option<AuthError>>,
    logout_failure: Mutex<Option<AuthError>>,
    lookup_failure: Mutex<Option<AuthError>>,
    current: Mutex<Option<User>>,
    logout_calls: AtomicUsize,
}

impl FakeIdentityClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client already knowing one user, with a deterministic token pair.
    pub fn seeded(email: &str) -> Self {
        let client = Self::new();
        let user = fake_user(email);
        client.set_grant(IdentityGrant {
            user: user.clone(),
            tokens: fake_tokens(email),
        });
        client.set_current_user(Some(user));
        client
    }

    pub fn set_grant(&self, grant: IdentityGrant) {
        *self.grant.lock().unwrap() = Some(grant);
    }

    pub fn fail_login(&self, error: AuthError) {
        *self.login_failure.lock().unwrap() = Some(error);
    }

    pub fn fail_logout(&self, error: AuthError) {
        *self.logout_failure.lock().unwrap() = Some(error);
    }

    pub fn set_current_user(&self, user: Option<User>) {
        *self.current.lock().unwrap() = user;
    }

    pub fn fail_current_user(&self, error: AuthError) {
        *self.lookup_failure.lock().unwrap() = Some(error);
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    fn grant_or_malformed(&self) -> Result<IdentityGrant, AuthError> {
        if let Some(error) = self.login_failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.grant
            .lock()
            .unwrap()
            .clone()
            .ok_or(AuthError::InvalidResponseFormat)
    }
}

pub fn fake_user(email: &str) -> User {
    User {
        id: uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, email.as_bytes()).to_string(),
        email: email.to_string(),
        display_name: None,
    }
}

pub fn fake_tokens(email: &str) -> TokenPair {
    TokenPair::new(
        format!("fake-access-token:{}", email),
        Some(format!("fake-refresh-token:{}", email)),
    )
}

#[async_trait::async_trait]
impl IdentityClient for FakeIdentityClient {
    async fn login(&self, _email: &str, _password: &str) -> Result<IdentityGrant, AuthError> {
        self.grant_or_malformed()
    }

    async fn register(
        &self,
        _email: &str,
        _password: &str,
        _business_type: &str,
        _business_name: &str,
    ) -> Result<IdentityGrant, AuthError> {
        self.grant_or_malformed()
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        match self.logout_failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        if let Some(error) = self.lookup_failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.current.lock().unwrap().clone())
    }
}
