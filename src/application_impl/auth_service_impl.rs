use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Orchestrates the identity client, the token store, and the session
/// bridge. The identity API decides who the user is; the bridge decides
/// whether row-level authorization will pass. Neither is allowed to drift
/// from the other across a reconcile.
pub struct SessionAuthService {
    identity: Arc<dyn IdentityClient>,
    bridge: Arc<dyn SessionBridge>,
    store: Arc<dyn TokenStore>,
    state: RwLock<AuthState>,
    // Single-flight gate: overlapping reconciles coalesce into one
    // outstanding refresh instead of N independent ones.
    reconcile_gate: Mutex<()>,
}

impl SessionAuthService {
    pub fn new(
        identity: Arc<dyn IdentityClient>,
        bridge: Arc<dyn SessionBridge>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            identity,
            bridge,
            store,
            state: RwLock::new(AuthState::SignedOut),
            reconcile_gate: Mutex::new(()),
        }
    }

    async fn set_state(&self, next: AuthState) {
        *self.state.write().await = next;
    }

    async fn persist_tokens(&self, tokens: &TokenPair) -> Result<(), AuthError> {
        self.store.set(ACCESS_TOKEN_KEY, &tokens.access_token).await?;
        self.store
            .set(REFRESH_TOKEN_KEY, tokens.refresh_or_access())
            .await?;
        Ok(())
    }

    async fn teardown_local(&self) {
        if let Err(e) = self.store.clear(ACCESS_TOKEN_KEY).await {
            warn!(error = %e, "could not clear persisted access token");
        }
        if let Err(e) = self.store.clear(REFRESH_TOKEN_KEY).await {
            warn!(error = %e, "could not clear persisted refresh token");
        }
        self.set_state(AuthState::SignedOut).await;
    }

    /// Shared tail of sign-in and sign-up: persist, mirror, transition.
    async fn establish(&self, grant: IdentityGrant) -> Result<User, AuthError> {
        if let Err(e) = self.persist_tokens(&grant.tokens).await {
            self.set_state(AuthState::SignedOut).await;
            return Err(e);
        }

        // The mirror is best-effort for authorization, not a precondition
        // for authentication; reconciliation catches the bridge up later.
        match self
            .bridge
            .set_session(&grant.tokens.access_token, grant.tokens.refresh_or_access())
            .await
        {
            Ok(_) => match self.bridge.get_user().await {
                Ok(Some(_)) => {}
                Ok(None) => warn!("bridge session mirrored but not yet usable for authorization"),
                Err(e) => warn!(error = %e, "bridge verification probe failed"),
            },
            Err(e) => warn!(error = %e, "bridge mirror failed during sign-in"),
        }

        let session = Session {
            user: grant.user.clone(),
            tokens: grant.tokens,
        };
        self.set_state(AuthState::SignedIn(session)).await;
        Ok(grant.user)
    }

    /// Attempt one bridge refresh from the persisted refresh token. Returns
    /// `false` when the refresh token was reported invalid and the local
    /// session has been torn down.
    async fn try_refresh(&self) -> bool {
        let refresh_token = match self.store.get(REFRESH_TOKEN_KEY).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("no persisted refresh token to recover with");
                return true;
            }
            Err(e) => {
                warn!(error = %e, "token store read failed before refresh");
                return true;
            }
        };

        self.set_state(AuthState::Refreshing).await;
        match self.bridge.refresh_session(&refresh_token).await {
            Ok(renewed) => {
                let tokens = TokenPair {
                    access_token: renewed.access_token,
                    refresh_token: renewed.refresh_token,
                };
                if let Err(e) = self.persist_tokens(&tokens).await {
                    warn!(error = %e, "could not persist refreshed tokens");
                }
                true
            }
            Err(AuthError::InvalidRefreshToken) => {
                info!("refresh token rejected, tearing down local session");
                self.teardown_local().await;
                false
            }
            Err(e) => {
                warn!(error = %e, "session refresh failed");
                true
            }
        }
    }
}

#[async_trait::async_trait]
impl AuthService for SessionAuthService {
    async fn sign_in(&self, request: SignInInput) -> Result<User, AuthError> {
        self.set_state(AuthState::SigningIn).await;
        match self.identity.login(&request.email, &request.password).await {
            Ok(grant) => self.establish(grant).await,
            Err(e) => {
                self.set_state(AuthState::SignedOut).await;
                Err(e)
            }
        }
    }

    async fn sign_up(&self, request: SignUpInput) -> Result<User, AuthError> {
        self.set_state(AuthState::SigningIn).await;
        let result = self
            .identity
            .register(
                &request.email,
                &request.password,
                &request.business_type,
                &request.business_name,
            )
            .await;
        match result {
            Ok(grant) => self.establish(grant).await,
            Err(e) => {
                self.set_state(AuthState::SignedOut).await;
                Err(e)
            }
        }
    }

    async fn sign_out(&self) {
        if let Err(e) = self.identity.logout().await {
            warn!(error = %e, "remote logout failed, clearing local session anyway");
        }
        self.teardown_local().await;
    }

    async fn current_user(&self) -> Option<User> {
        let _gate = self.reconcile_gate.lock().await;

        let bridge_session = match self.bridge.get_session().await {
            Ok(session) => session,
            Err(e) => {
                debug!(error = %e, "bridge session read failed");
                None
            }
        };
        let usable = bridge_session
            .as_ref()
            .map(BridgeSession::is_usable)
            .unwrap_or(false);

        if !usable && !self.try_refresh().await {
            return None;
        }

        // Regardless of the refresh outcome, identity decides who the user
        // is.
        let user = match self.identity.current_user().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.set_state(AuthState::SignedOut).await;
                return None;
            }
            Err(e) => {
                // Degraded, not signed out remotely; but the caller sees
                // "no user", so the transient state must not stick around.
                warn!(error = %e, "identity lookup failed");
                self.set_state(AuthState::SignedOut).await;
                return None;
            }
        };

        // Re-mirror the persisted pair so the bridge never drifts from the
        // identity API.
        let tokens = match self.store.get(ACCESS_TOKEN_KEY).await {
            Ok(Some(access_token)) => {
                let refresh_token = self.store.get(REFRESH_TOKEN_KEY).await.ok().flatten();
                let pair = TokenPair {
                    access_token,
                    refresh_token,
                };
                match self
                    .bridge
                    .set_session(&pair.access_token, pair.refresh_or_access())
                    .await
                {
                    Ok(_) => {}
                    Err(AuthError::InvalidRefreshToken) => {
                        // A user the bridge can no longer authorize for is
                        // not a session worth keeping.
                        info!("bridge rejected the persisted refresh token, tearing down local session");
                        self.teardown_local().await;
                        return None;
                    }
                    Err(e) => warn!(error = %e, "bridge re-mirror failed"),
                }
                Some(pair)
            }
            Ok(None) => {
                // No persisted access token means locally signed out.
                self.set_state(AuthState::SignedOut).await;
                return None;
            }
            Err(e) => {
                warn!(error = %e, "token store read failed during re-mirror");
                None
            }
        };

        match tokens {
            Some(tokens) => {
                let session = Session {
                    user: user.clone(),
                    tokens,
                };
                self.set_state(AuthState::SignedIn(session)).await;
            }
            // Storage is failing underneath us; land on a terminal state
            // instead of leaving `Refreshing` visible.
            None => self.set_state(AuthState::SignedOut).await,
        }
        Some(user)
    }

    async fn current_session(&self) -> Option<SessionHandle> {
        let user = self.current_user().await?;
        let access_token = self.store.get(ACCESS_TOKEN_KEY).await.ok().flatten()?;
        Some(SessionHandle { user, access_token })
    }

    async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }
}
