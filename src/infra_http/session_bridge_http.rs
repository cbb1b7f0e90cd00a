use super::{UserDto, read_error_message, transport_error};
use crate::application_port::AuthError;
use crate::domain_model::{BridgeSession, User};
use crate::domain_port::SessionBridge;
use crate::settings::Bridge;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct TokenGrantDto {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenGrantDto {
    fn into_session(self) -> BridgeSession {
        BridgeSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        }
    }
}

/// GoTrue-shaped adapter to the authorization backend. Keeps its own
/// in-memory session; row-level checks on the remote side only pass while
/// that session holds a token pair the backend still accepts.
pub struct HttpSessionBridge {
    http: Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<BridgeSession>>,
}

impl HttpSessionBridge {
    pub fn try_new(settings: &Bridge) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            session: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<Option<User>, AuthError> {
        let response = self
            .http
            .get(self.url("/user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => {
                let user = response
                    .json::<UserDto>()
                    .await
                    .map_err(|e| AuthError::BridgeSync(e.to_string()))?;
                Ok(Some(user.into()))
            }
            StatusCode::UNAUTHORIZED => Ok(None),
            status => Err(AuthError::BridgeSync(format!("bridge returned {}", status))),
        }
    }
}

#[async_trait::async_trait]
impl SessionBridge for HttpSessionBridge {
    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<BridgeSession, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::BridgeSync(
                "cannot mirror an empty access token".to_string(),
            ));
        }

        // Probe with the access token first; when it has already expired the
        // refresh grant decides whether the mirror survives.
        match self.fetch_user(access_token).await? {
            Some(_) => {
                let session = BridgeSession {
                    access_token: access_token.to_string(),
                    refresh_token: Some(refresh_token.to_string()),
                    expires_at: None,
                };
                *self.session.write().await = Some(session.clone());
                Ok(session)
            }
            None => {
                debug!("mirrored access token rejected, falling back to refresh grant");
                self.refresh_session(refresh_token).await
            }
        }
    }

    async fn get_session(&self) -> Result<Option<BridgeSession>, AuthError> {
        Ok(self.session.read().await.clone())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<BridgeSession, AuthError> {
        let response = self
            .http
            .post(self.url("/token?grant_type=refresh_token"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => {
                let grant = response
                    .json::<TokenGrantDto>()
                    .await
                    .map_err(|e| AuthError::BridgeSync(e.to_string()))?;
                let session = grant.into_session();
                *self.session.write().await = Some(session.clone());
                Ok(session)
            }
            // The bridge reports expired and revoked refresh tokens through
            // these statuses.
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let message = read_error_message(response).await;
                warn!(%message, "bridge refused the refresh token");
                Err(AuthError::InvalidRefreshToken)
            }
            status => Err(AuthError::BridgeSync(format!("bridge returned {}", status))),
        }
    }

    async fn get_user(&self) -> Result<Option<User>, AuthError> {
        let access_token = match self.session.read().await.clone() {
            Some(session) => session.access_token,
            None => return Ok(None),
        };
        self.fetch_user(&access_token).await
    }
}
