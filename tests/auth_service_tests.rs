use checkpoint::application_impl::SessionAuthService;
use checkpoint::application_port::*;
use checkpoint::domain_model::*;
use checkpoint::domain_port::*;
use checkpoint::infra_fake::*;
use checkpoint::infra_memory::MemoryTokenStore;
use std::sync::Arc;

const EMAIL: &str = "owner@example.com";

struct Harness {
    auth: SessionAuthService,
    identity: Arc<FakeIdentityClient>,
    bridge: Arc<FakeSessionBridge>,
    store: Arc<MemoryTokenStore>,
}

fn harness() -> Harness {
    let identity = Arc::new(FakeIdentityClient::new());
    let bridge = Arc::new(FakeSessionBridge::new());
    let store = Arc::new(MemoryTokenStore::new());
    let auth = SessionAuthService::new(identity.clone(), bridge.clone(), store.clone());
    Harness {
        auth,
        identity,
        bridge,
        store,
    }
}

fn grant() -> IdentityGrant {
    IdentityGrant {
        user: fake_user(EMAIL),
        tokens: fake_tokens(EMAIL),
    }
}

async fn slot(store: &MemoryTokenStore, key: &str) -> Option<String> {
    store.get(key).await.unwrap()
}

#[tokio::test]
async fn sign_in_persists_granted_token_pair() {
    let h = harness();
    h.identity.set_grant(grant());

    let user = h
        .auth
        .sign_in(SignInInput {
            email: EMAIL.to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.email, EMAIL);
    assert_eq!(
        slot(&h.store, ACCESS_TOKEN_KEY).await,
        Some(grant().tokens.access_token)
    );
    assert_eq!(
        slot(&h.store, REFRESH_TOKEN_KEY).await,
        grant().tokens.refresh_token
    );
    assert!(matches!(h.auth.state().await, AuthState::SignedIn(_)));
}

#[tokio::test]
async fn missing_refresh_token_falls_back_to_access_token() {
    let h = harness();
    h.identity.set_grant(IdentityGrant {
        user: fake_user(EMAIL),
        tokens: TokenPair::new("only-access", None),
    });

    h.auth
        .sign_in(SignInInput {
            email: EMAIL.to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        slot(&h.store, REFRESH_TOKEN_KEY).await.as_deref(),
        Some("only-access")
    );
}

#[tokio::test]
async fn sign_up_persists_and_mirrors_like_sign_in() {
    let h = harness();
    h.identity.set_grant(grant());

    let user = h
        .auth
        .sign_up(SignUpInput {
            email: EMAIL.to_string(),
            password: "secret".to_string(),
            business_type: "cafe".to_string(),
            business_name: "Corner Cafe".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.email, EMAIL);
    assert!(slot(&h.store, ACCESS_TOKEN_KEY).await.is_some());
    assert_eq!(h.bridge.set_calls(), 1);
}

#[tokio::test]
async fn sign_out_is_idempotent_when_already_signed_out() {
    let h = harness();

    h.auth.sign_out().await;
    h.auth.sign_out().await;

    assert_eq!(h.identity.logout_calls(), 2);
    assert!(h.store.is_empty());
    assert_eq!(h.auth.state().await, AuthState::SignedOut);
}

#[tokio::test]
async fn remote_logout_failure_still_clears_locally() {
    let h = harness();
    h.identity.set_grant(grant());
    h.auth
        .sign_in(SignInInput {
            email: EMAIL.to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    h.identity
        .fail_logout(AuthError::Network("connection reset".to_string()));
    h.auth.sign_out().await;

    assert!(h.store.is_empty());
    assert_eq!(h.auth.state().await, AuthState::SignedOut);
}

#[tokio::test]
async fn expired_bridge_session_triggers_exactly_one_refresh() {
    let h = harness();
    h.store.set(ACCESS_TOKEN_KEY, "stale-access").await.unwrap();
    h.store.set(REFRESH_TOKEN_KEY, "old-refresh").await.unwrap();
    h.bridge.set_expired_session("stale-access", "old-refresh");
    h.identity.set_current_user(Some(fake_user(EMAIL)));

    let user = h.auth.current_user().await;

    assert_eq!(user.map(|u| u.email), Some(EMAIL.to_string()));
    assert_eq!(h.bridge.refresh_calls(), 1);
    assert_eq!(
        slot(&h.store, ACCESS_TOKEN_KEY).await.as_deref(),
        Some("renewed:old-refresh")
    );
}

#[tokio::test]
async fn concurrent_reconciles_coalesce_into_one_refresh() {
    let h = harness();
    h.store.set(ACCESS_TOKEN_KEY, "stale-access").await.unwrap();
    h.store.set(REFRESH_TOKEN_KEY, "old-refresh").await.unwrap();
    h.bridge.set_expired_session("stale-access", "old-refresh");
    h.identity.set_current_user(Some(fake_user(EMAIL)));

    let (first, second) = tokio::join!(h.auth.current_user(), h.auth.current_user());

    assert!(first.is_some());
    assert!(second.is_some());
    // The second caller waits on the gate and finds the renewed session.
    assert_eq!(h.bridge.refresh_calls(), 1);
}

#[tokio::test]
async fn invalid_refresh_token_clears_both_storage_slots() {
    let h = harness();
    h.store.set(ACCESS_TOKEN_KEY, "stale-access").await.unwrap();
    h.store.set(REFRESH_TOKEN_KEY, "dead-refresh").await.unwrap();
    h.bridge.set_expired_session("stale-access", "dead-refresh");
    h.bridge
        .set_refresh_outcome(Err(AuthError::InvalidRefreshToken));
    h.identity.set_current_user(Some(fake_user(EMAIL)));

    let user = h.auth.current_user().await;

    assert!(user.is_none());
    assert!(h.store.is_empty());
    assert_eq!(h.auth.state().await, AuthState::SignedOut);
}

#[tokio::test]
async fn invalid_refresh_during_remirror_clears_both_storage_slots() {
    let h = harness();
    h.store.set(ACCESS_TOKEN_KEY, "live-access").await.unwrap();
    h.store.set(REFRESH_TOKEN_KEY, "dead-refresh").await.unwrap();
    // A usable bridge session skips the refresh; only the re-mirror fails.
    h.bridge.set_stored_session(Some(BridgeSession {
        access_token: "live-access".to_string(),
        refresh_token: Some("dead-refresh".to_string()),
        expires_at: None,
    }));
    h.bridge.fail_set_session(AuthError::InvalidRefreshToken);
    h.identity.set_current_user(Some(fake_user(EMAIL)));

    let user = h.auth.current_user().await;

    assert!(user.is_none());
    assert!(h.store.is_empty());
    assert_eq!(h.bridge.refresh_calls(), 0);
}

#[tokio::test]
async fn identity_error_after_refresh_lands_on_a_terminal_state() {
    let h = harness();
    h.store.set(ACCESS_TOKEN_KEY, "stale-access").await.unwrap();
    h.store.set(REFRESH_TOKEN_KEY, "old-refresh").await.unwrap();
    h.bridge.set_expired_session("stale-access", "old-refresh");
    h.identity
        .fail_current_user(AuthError::Network("connection reset".to_string()));

    let user = h.auth.current_user().await;

    assert!(user.is_none());
    // Never stuck in `Refreshing` after the reconcile has returned.
    assert_eq!(h.auth.state().await, AuthState::SignedOut);
    // A transient identity failure is not a revoked session: tokens stay.
    assert!(slot(&h.store, ACCESS_TOKEN_KEY).await.is_some());
    assert!(slot(&h.store, REFRESH_TOKEN_KEY).await.is_some());
}

#[tokio::test]
async fn generic_bridge_failure_during_remirror_still_returns_the_user() {
    let h = harness();
    h.store.set(ACCESS_TOKEN_KEY, "live-access").await.unwrap();
    h.store.set(REFRESH_TOKEN_KEY, "live-refresh").await.unwrap();
    h.bridge.set_stored_session(Some(BridgeSession {
        access_token: "live-access".to_string(),
        refresh_token: Some("live-refresh".to_string()),
        expires_at: None,
    }));
    h.bridge
        .fail_set_session(AuthError::BridgeSync("network timeout".to_string()));
    h.identity.set_current_user(Some(fake_user(EMAIL)));

    let user = h.auth.current_user().await;

    assert_eq!(user.map(|u| u.email), Some(EMAIL.to_string()));
    assert_eq!(
        slot(&h.store, ACCESS_TOKEN_KEY).await.as_deref(),
        Some("live-access")
    );
    assert_eq!(
        slot(&h.store, REFRESH_TOKEN_KEY).await.as_deref(),
        Some("live-refresh")
    );
    assert!(matches!(h.auth.state().await, AuthState::SignedIn(_)));
}

#[tokio::test]
async fn rejected_business_fields_surface_as_validation_error() {
    let h = harness();
    h.identity
        .fail_login(AuthError::Validation("business type required".to_string()));

    let result = h
        .auth
        .sign_up(SignUpInput {
            email: EMAIL.to_string(),
            password: "secret".to_string(),
            business_type: "".to_string(),
            business_name: "Corner Cafe".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AuthError::Validation(_))));
    assert!(h.store.is_empty());
    assert_eq!(h.auth.state().await, AuthState::SignedOut);
}

#[tokio::test]
async fn malformed_login_response_is_rejected_and_storage_untouched() {
    let h = harness();
    // No grant configured: the fake answers like a server returning `{}`.

    let result = h
        .auth
        .sign_in(SignInInput {
            email: EMAIL.to_string(),
            password: "secret".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AuthError::InvalidResponseFormat)));
    assert!(h.store.is_empty());
    assert_eq!(h.auth.state().await, AuthState::SignedOut);
}

#[tokio::test]
async fn generic_bridge_failure_does_not_fail_sign_in() {
    let h = harness();
    h.identity.set_grant(grant());
    h.bridge
        .fail_set_session(AuthError::BridgeSync("network timeout".to_string()));

    let user = h
        .auth
        .sign_in(SignInInput {
            email: EMAIL.to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.email, EMAIL);
    assert!(slot(&h.store, ACCESS_TOKEN_KEY).await.is_some());
    assert!(matches!(h.auth.state().await, AuthState::SignedIn(_)));
}

#[tokio::test]
async fn invalid_credentials_surface_to_the_caller() {
    let h = harness();
    h.identity.set_grant(grant());
    h.identity.fail_login(AuthError::InvalidCredentials);

    let result = h
        .auth
        .sign_in(SignInInput {
            email: EMAIL.to_string(),
            password: "wrong".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn reconcile_without_local_tokens_reports_signed_out() {
    let h = harness();
    h.identity.set_current_user(Some(fake_user(EMAIL)));

    assert!(h.auth.current_user().await.is_none());
    assert_eq!(h.auth.state().await, AuthState::SignedOut);
}

#[tokio::test]
async fn current_session_exposes_the_persisted_access_token() {
    let h = harness();
    h.identity.set_grant(grant());
    h.identity.set_current_user(Some(fake_user(EMAIL)));

    h.auth
        .sign_in(SignInInput {
            email: EMAIL.to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    let handle = h.auth.current_session().await.unwrap();
    assert_eq!(handle.user.email, EMAIL);
    assert_eq!(handle.access_token, grant().tokens.access_token);
}
