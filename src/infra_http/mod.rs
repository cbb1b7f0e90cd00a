mod identity_client_http;
mod session_bridge_http;

pub use identity_client_http::*;
pub use session_bridge_http::*;

use crate::application_port::AuthError;
use crate::domain_model::User;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct UserDto {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        User {
            id: dto.id,
            email: dto.email,
            display_name: dto.display_name,
        }
    }
}

/// Timeouts are explicit deadlines set on the client; they surface as
/// `Network` instead of hanging the caller.
pub(crate) fn transport_error(e: reqwest::Error) -> AuthError {
    if e.is_timeout() {
        AuthError::Network("request timed out".to_string())
    } else {
        AuthError::Network(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Best-effort extraction of a human-readable message from an error
/// response; falls back to the status line.
pub(crate) async fn read_error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => body
            .message
            .or(body.error_description)
            .or(body.error)
            .unwrap_or_else(|| status.to_string()),
        Err(_) => status.to_string(),
    }
}
