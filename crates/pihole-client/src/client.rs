//! The request dispatcher.
//!
//! [`PiHoleClient`] turns an [`Operation`] plus parameters into one HTTP
//! exchange with the appliance, handling session acquisition and a single
//! re-authentication when an attached token is rejected.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use reqwest_retry::{
    RetryTransientMiddleware, Retryable, RetryableStrategy, policies::ExponentialBackoff,
};
use secrecy::ExposeSecret;
use serde_json::Value;

use pihole_common::Config;

use crate::PiHoleApi;
use crate::error::{ClientError, error_message};
use crate::operation::{Operation, Params, request_path};
use crate::session::{SID_HEADER, SessionManager};

/// Upper bound on exchanges per call: the first attempt plus one retry
/// after re-authentication.
pub const MAX_ATTEMPTS: u32 = 2;

/// Retries only failures where the request never reached the appliance.
struct ConnectFailureStrategy;

impl RetryableStrategy for ConnectFailureStrategy {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(_) => None,
            Err(reqwest_middleware::Error::Reqwest(e)) if e.is_connect() => {
                Some(Retryable::Transient)
            }
            Err(_) => Some(Retryable::Fatal),
        }
    }
}

/// Client for one Pi-hole appliance.
///
/// Cloning is cheap; clones share the HTTP pool and the session.
///
/// # Examples
///
/// ```no_run
/// use pihole_client::PiHoleClient;
/// use pihole_common::Config;
///
/// # async fn example() -> Result<(), pihole_client::ClientError> {
/// let client = PiHoleClient::new(Config::new("http://pi.hole").with_password("secret"))?;
///
/// let status = client.get_status().await?;
/// println!("{status}");
///
/// client.disable(Some(300)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PiHoleClient {
    http: ClientWithMiddleware,
    config: Arc<Config>,
    session: Arc<SessionManager>,
}

impl std::fmt::Debug for PiHoleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiHoleClient")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl PiHoleClient {
    /// Creates a client. No network traffic happens until the first call.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConfigurationError`] if the configuration is
    /// invalid, or a network error if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        config
            .validate()
            .map_err(|e| ClientError::ConfigurationError(e.to_string()))?;

        let retry = &config.retry_config;
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(retry.initial_delay, retry.max_delay.max(retry.initial_delay))
            .build_with_max_retries(retry.max_retries);

        // None means no timeout
        let reqwest_client = match config.timeout() {
            Some(timeout) => reqwest::Client::builder().timeout(timeout).build()?,
            None => reqwest::Client::builder().build()?,
        };

        let http = reqwest_middleware::ClientBuilder::new(reqwest_client)
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                ConnectFailureStrategy,
            ))
            .build();

        let session = Arc::new(SessionManager::new(http.clone(), &config));

        Ok(Self {
            http,
            config: Arc::new(config),
            session,
        })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The session shared by this client and its clones.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Ends the current session on the appliance, if one is held.
    ///
    /// # Errors
    ///
    /// Returns an error if the appliance cannot be reached or refuses the logout.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.session.logout().await
    }

    /// Performs `operation` with `params`.
    ///
    /// Admin operations acquire a session first. If the appliance answers
    /// `401` to a request that carried a token, the token is discarded and
    /// the call is retried once with a fresh one.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidParams`] if a path parameter is missing
    /// - [`ClientError::AuthenticationError`] if a session cannot be opened
    /// - [`ClientError::ApiError`] for any other non-success status
    /// - [`ClientError::TimeoutError`] if the request exceeds the timeout
    /// - [`ClientError::InvalidResponse`] if a success body is not JSON
    pub async fn execute(&self, operation: Operation, params: Params) -> Result<Value, ClientError> {
        let descriptor = operation.descriptor();
        let request = descriptor.prepare(params)?;
        let url = request.url(self.config.base_url())?;
        let path = request_path(&url);
        let requires_auth = descriptor.requires_auth();
        let body = request.body.as_ref().map(serde_json::to_string).transpose()?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            let token = if requires_auth {
                self.session.ensure_authenticated().await?;
                self.session.current_token().await
            } else {
                None
            };

            debug!(
                "{operation}: {} {path} (attempt {attempt}/{MAX_ATTEMPTS})",
                request.method
            );

            let mut builder = self
                .http
                .request(request.method.as_reqwest(), url.clone())
                .header(CONTENT_TYPE, "application/json");
            if let Some(token) = &token {
                builder = builder.header(SID_HEADER, token.expose_secret());
            }
            if let Some(body) = &body {
                builder = builder.body(body.clone());
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ClientError::from_transport(e, &path))?;
            let status = response.status();

            if status.is_success() {
                return parse_body(response, &path).await;
            }

            if status == StatusCode::UNAUTHORIZED && token.is_some() && attempt < MAX_ATTEMPTS {
                warn!("Session rejected on {path}, re-authenticating");
                self.session.invalidate().await;
                continue;
            }

            let error_text = response.text().await.map_err(|e| {
                warn!("Failed to read error response body: {e}");
                ClientError::NetworkError(e)
            })?;

            error!(
                "{operation} failed with status {}: {}",
                status.as_u16(),
                error_message(&error_text)
            );

            return Err(ClientError::ApiError {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body: error_text,
                path,
            });
        }
    }

    /// Performs the operation called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownOperation`] without touching the network
    /// if `name` is not in the operation table, otherwise as [`Self::execute`].
    pub async fn execute_named(&self, name: &str, params: Params) -> Result<Value, ClientError> {
        let operation = name.parse::<Operation>()?;
        self.execute(operation, params).await
    }

    /// Whether blocking is enabled.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_status(&self) -> Result<Value, ClientError> {
        self.execute(Operation::GetStatus, Params::new()).await
    }

    /// Summary statistics.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_summary(&self) -> Result<Value, ClientError> {
        self.execute(Operation::GetSummary, Params::new()).await
    }

    /// Query counts by record type.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_query_types(&self) -> Result<Value, ClientError> {
        self.execute(Operation::GetQueryTypes, Params::new()).await
    }

    /// Upstream resolver usage.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_forward_destinations(&self) -> Result<Value, ClientError> {
        self.execute(Operation::GetForwardDestinations, Params::new())
            .await
    }

    /// Most queried domains.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_top_items(&self, count: u64) -> Result<Value, ClientError> {
        self.execute(Operation::GetTopItems, single("count", count))
            .await
    }

    /// Most active clients.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_top_clients(&self, count: u64) -> Result<Value, ClientError> {
        self.execute(Operation::GetTopClients, single("count", count))
            .await
    }

    /// Most blocked domains.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_top_blocked_domains(&self, count: u64) -> Result<Value, ClientError> {
        self.execute(Operation::GetTopBlockedDomains, single("count", count))
            .await
    }

    /// Recently blocked domains.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_recent_blocked(&self, count: u64) -> Result<Value, ClientError> {
        self.execute(Operation::GetRecentBlocked, single("count", count))
            .await
    }

    /// Query activity over time.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_query_types_over_time(&self) -> Result<Value, ClientError> {
        self.execute(Operation::GetQueryTypesOverTime, Params::new())
            .await
    }

    /// Per-client activity over time.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_clients_over_time(&self) -> Result<Value, ClientError> {
        self.execute(Operation::GetClientsOverTime, Params::new())
            .await
    }

    /// Upstream usage over time.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_forward_destinations_over_time(&self) -> Result<Value, ClientError> {
        self.execute(Operation::GetForwardDestinationsOverTime, Params::new())
            .await
    }

    /// Turns blocking on.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn enable(&self) -> Result<Value, ClientError> {
        self.execute(Operation::Enable, Params::new()).await
    }

    /// Turns blocking off, optionally re-enabling after `seconds`.
    ///
    /// `Some(0)` is treated as no timer.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn disable(&self, seconds: Option<u64>) -> Result<Value, ClientError> {
        let params = match seconds {
            Some(seconds) if seconds > 0 => single("timer", seconds),
            _ => Params::new(),
        };
        self.execute(Operation::Disable, params).await
    }

    /// Adds `domain` to the allow list.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn add_to_whitelist(&self, domain: &str) -> Result<Value, ClientError> {
        self.execute(Operation::AddToWhitelist, single("domain", domain))
            .await
    }

    /// Removes `domain` from the allow list.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn remove_from_whitelist(&self, domain: &str) -> Result<Value, ClientError> {
        self.execute(Operation::RemoveFromWhitelist, single("domain", domain))
            .await
    }

    /// Adds `domain` to the deny list.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn add_to_blacklist(&self, domain: &str) -> Result<Value, ClientError> {
        self.execute(Operation::AddToBlacklist, single("domain", domain))
            .await
    }

    /// Removes `domain` from the deny list.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn remove_from_blacklist(&self, domain: &str) -> Result<Value, ClientError> {
        self.execute(Operation::RemoveFromBlacklist, single("domain", domain))
            .await
    }

    /// The allow list.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_whitelist(&self) -> Result<Value, ClientError> {
        self.execute(Operation::GetWhitelist, Params::new()).await
    }

    /// The deny list.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_blacklist(&self) -> Result<Value, ClientError> {
        self.execute(Operation::GetBlacklist, Params::new()).await
    }

    /// Clears the query logs.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn flush_logs(&self) -> Result<Value, ClientError> {
        self.execute(Operation::FlushLogs, Params::new()).await
    }

    /// The last `lines` lines of the resolver log.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_tail_log(&self, lines: u64) -> Result<Value, ClientError> {
        self.execute(Operation::GetTailLog, single("lines", lines))
            .await
    }

    /// Login requirements. Never authenticates.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_login_info(&self) -> Result<Value, ClientError> {
        self.execute(Operation::GetLoginInfo, Params::new()).await
    }

    /// What the appliance sees of this client. Never authenticates.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get_client_info(&self) -> Result<Value, ClientError> {
        self.execute(Operation::GetClientInfo, Params::new()).await
    }
}

#[async_trait]
impl PiHoleApi for PiHoleClient {
    fn config(&self) -> &Config {
        &self.config
    }

    async fn execute(&self, operation: Operation, params: Params) -> Result<Value, ClientError> {
        Self::execute(self, operation, params).await
    }
}

fn single(key: &str, value: impl Into<Value>) -> Params {
    let mut params = Params::new();
    params.insert(key.to_string(), value.into());
    params
}

/// Decodes a success body. `204`/`205` carry no body and yield `null`.
async fn parse_body(response: reqwest::Response, path: &str) -> Result<Value, ClientError> {
    if matches!(
        response.status(),
        StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT
    ) {
        return Ok(Value::Null);
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        debug!("Non-JSON body from {path}: {text}");
        ClientError::InvalidResponse {
            path: path.to_string(),
            message: e.to_string(),
        }
    })
}
