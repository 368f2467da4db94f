//! Session lifecycle for the appliance's token-based authentication.
//!
//! The manager holds at most one session token. It is acquired lazily by
//! [`SessionManager::ensure_authenticated`], reused until the appliance
//! rejects it, and discarded by [`SessionManager::invalidate`]. Expiry is
//! never tracked locally.
//!
//! Two calls racing with no token held may both authenticate; each exchange
//! yields a valid token and the last one stored wins.

use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use pihole_common::Config;

use crate::error::{ClientError, error_message};

/// Header carrying the session token on admin requests.
pub const SID_HEADER: &str = "X-FTL-SID";

/// Authentication endpoint.
pub const AUTH_PATH: &str = "/api/auth";

#[derive(Serialize)]
struct AuthRequest<'a> {
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    session: Option<SessionInfo>,
}

#[derive(Debug, Deserialize)]
struct SessionInfo {
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    validity: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Owns the cached session token for one appliance.
pub struct SessionManager {
    http: ClientWithMiddleware,
    base_url: String,
    password: Option<SecretString>,
    token: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("base_url", &self.base_url)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates an unauthenticated session manager.
    ///
    /// An empty password is treated as no password (anonymous mode).
    #[must_use]
    pub fn new(http: ClientWithMiddleware, config: &Config) -> Self {
        let password = config
            .password
            .clone()
            .filter(|p| !p.expose_secret().is_empty());

        Self {
            http,
            base_url: config.base_url().to_string(),
            password,
            token: RwLock::new(None),
        }
    }

    /// Returns `true` when no shared secret is configured.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.password.is_none()
    }

    /// Returns `true` while a token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Acquires a token unless one is held or no secret is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AuthenticationError`] if the exchange fails at
    /// the transport level, the appliance answers with a non-success status,
    /// or the response carries no session identifier. The manager stays
    /// unauthenticated in every failure case.
    pub async fn ensure_authenticated(&self) -> Result<(), ClientError> {
        let Some(password) = self.password.as_ref() else {
            return Ok(());
        };

        if self.is_authenticated().await {
            return Ok(());
        }

        let sid = self.authenticate(password).await?;
        *self.token.write().await = Some(sid);
        Ok(())
    }

    /// Discards any held token.
    pub async fn invalidate(&self) {
        if self.token.write().await.take().is_some() {
            debug!("Pi-hole session invalidated");
        }
    }

    /// The held token, if any. Never triggers authentication.
    pub async fn current_token(&self) -> Option<SecretString> {
        self.token.read().await.clone()
    }

    /// Ends the held session on the appliance and forgets the token.
    ///
    /// A `401` means the session had already expired and counts as success.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the appliance answers with
    /// another non-success status. The token is discarded either way.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let Some(token) = self.token.write().await.take() else {
            return Ok(());
        };

        let url = format!("{}{AUTH_PATH}", self.base_url);
        let response = self
            .http
            .delete(&url)
            .header(SID_HEADER, token.expose_secret())
            .send()
            .await
            .map_err(|e| ClientError::from_transport(e, AUTH_PATH))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            info!("Pi-hole session closed");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::ApiError {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            body,
            path: AUTH_PATH.to_string(),
        })
    }

    async fn authenticate(&self, password: &SecretString) -> Result<SecretString, ClientError> {
        let url = format!("{}{AUTH_PATH}", self.base_url);
        debug!("Authenticating against {url}");

        let body = serde_json::to_string(&AuthRequest {
            password: password.expose_secret(),
        })?;

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ClientError::AuthenticationError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::AuthenticationError(e.to_string()))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<AuthResponse>(&text)
                .ok()
                .and_then(|r| r.session)
                .and_then(|s| s.message)
                .unwrap_or_else(|| error_message(&text));
            warn!("Pi-hole rejected authentication with status {}", status.as_u16());
            return Err(ClientError::AuthenticationError(format!(
                "{} {} - {reason}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let session = serde_json::from_str::<AuthResponse>(&text)
            .map_err(|e| ClientError::AuthenticationError(format!("Invalid response: {e}")))?
            .session;

        match session {
            Some(SessionInfo {
                sid: Some(sid),
                validity,
                ..
            }) if !sid.is_empty() => {
                info!(
                    "Pi-hole session established (validity: {}s)",
                    validity.map_or_else(|| "unknown".to_string(), |v| v.to_string())
                );
                Ok(SecretString::new(sid.into()))
            }
            Some(SessionInfo {
                message: Some(message),
                ..
            }) => Err(ClientError::AuthenticationError(format!(
                "No session ID received: {message}"
            ))),
            _ => Err(ClientError::AuthenticationError(
                "No session ID received".to_string(),
            )),
        }
    }
}
