use hyper::client::connect::Connect;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The identity provider refused the credentials. The message is the
    /// provider's own text and is meant to be shown as-is.
    #[error("{0}")]
    Rejected(String),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Invalid request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("Malformed auth response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// Email/password sign-in against a GoTrue-style `/auth/v1` endpoint.
pub struct AuthClient<C = HttpConnector> {
    client: Client<C>,
    base_url: String,
    api_key: String,
}

impl AuthClient<HttpConnector> {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }
}

impl<C> AuthClient<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    pub fn with_client(client: Client<C>, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let body = serde_json::to_string(&PasswordGrant { email, password })?;

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("{}/auth/v1/token?grant_type=password", self.base_url))
            .header("apikey", &self.api_key)
            .header("content-type", "application/json")
            .body(Body::from(body))?;

        let response = self.client.request(request).await?;
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await?;

        if !status.is_success() {
            let message = rejection_message(&bytes)
                .unwrap_or_else(|| format!("Sign-in failed: HTTP {}", status));
            log::warn!("Sign-in rejected for {}: {}", email, message);
            return Err(AuthError::Rejected(message));
        }

        let session: Session = serde_json::from_slice(&bytes)?;
        log::info!("Signed in as {}", session.user.id);
        Ok(session)
    }
}

/// First human-readable field present in an auth error body.
fn rejection_message(bytes: &[u8]) -> Option<String> {
    let body: serde_json::Value = serde_json::from_slice(bytes).ok()?;

    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
