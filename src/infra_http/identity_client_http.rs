use super::{UserDto, read_error_message, transport_error};
use crate::application_port::AuthError;
use crate::domain_model::{TokenPair, User};
use crate::domain_port::{ACCESS_TOKEN_KEY, IdentityClient, IdentityGrant, TokenStore};
use crate::settings::Identity;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SessionDto {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GrantDto {
    user: Option<UserDto>,
    session: Option<SessionDto>,
}

/// Canonical envelope wraps the grant in `data`; the bare top-level shape is
/// tolerated as a legacy compatibility shim.
#[derive(Debug, Deserialize)]
struct GrantEnvelope {
    data: Option<GrantDto>,
    #[serde(flatten)]
    legacy: GrantDto,
}

fn decode_grant(envelope: GrantEnvelope) -> Result<IdentityGrant, AuthError> {
    let grant = match envelope.data {
        Some(data) => data,
        None => {
            if envelope.legacy.user.is_some() || envelope.legacy.session.is_some() {
                warn!("identity API answered with the legacy response envelope");
            }
            envelope.legacy
        }
    };
    let user = grant.user.ok_or(AuthError::InvalidResponseFormat)?;
    let session = grant.session.ok_or(AuthError::InvalidResponseFormat)?;
    if session.access_token.is_empty() {
        return Err(AuthError::InvalidResponseFormat);
    }
    Ok(IdentityGrant {
        user: user.into(),
        tokens: TokenPair::new(session.access_token, session.refresh_token),
    })
}

/// REST adapter to the identity API. Reads the persisted access token for
/// bearer auth on the authenticated endpoints.
pub struct HttpIdentityClient {
    http: Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
}

impl HttpIdentityClient {
    pub fn try_new(settings: &Identity, store: Arc<dyn TokenStore>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn bearer(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY).await.ok().flatten()
    }

    async fn decode_success(&self, response: reqwest::Response) -> Result<IdentityGrant, AuthError> {
        let envelope = response
            .json::<GrantEnvelope>()
            .await
            .map_err(|_| AuthError::InvalidResponseFormat)?;
        decode_grant(envelope)
    }
}

#[async_trait::async_trait]
impl IdentityClient for HttpIdentityClient {
    async fn login(&self, email: &str, password: &str) -> Result<IdentityGrant, AuthError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => self.decode_success(response).await,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidCredentials),
            status => Err(AuthError::Network(format!("identity API returned {}", status))),
        }
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        business_type: &str,
        business_name: &str,
    ) -> Result<IdentityGrant, AuthError> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "business_type": business_type,
                "business_name": business_name,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => self.decode_success(response).await,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidCredentials),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(AuthError::Validation(read_error_message(response).await))
            }
            status => Err(AuthError::Network(format!("identity API returned {}", status))),
        }
    }

    async fn logout(&self) -> Result<(), AuthError> {
        let mut request = self.http.post(self.url("/auth/logout"));
        if let Some(token) = self.bearer().await {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(transport_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(AuthError::Network(format!(
                "identity API returned {}",
                response.status()
            )))
        }
    }

    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        let token = match self.bearer().await {
            Some(token) => token,
            None => return Ok(None),
        };

        let response = match self
            .http
            .get(self.url("/auth/me"))
            .bearer_auth(token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "identity lookup transport failure");
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "identity lookup rejected");
            return Ok(None);
        }

        #[derive(Debug, Deserialize)]
        struct MeEnvelope {
            user: Option<UserDto>,
        }

        match response.json::<MeEnvelope>().await {
            Ok(body) => Ok(body.user.map(User::from)),
            Err(e) => {
                debug!(error = %e, "identity lookup body unreadable");
                Ok(None)
            }
        }
    }
}
