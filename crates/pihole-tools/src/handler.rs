//! Tool invocation: argument shaping and dispatch.

use std::sync::Arc;

use log::{debug, info};
use serde_json::Value;

use pihole_client::{Operation, Params, PiHoleApi};
use pihole_common::ToolDefinition;

use crate::catalog::{self, ArgumentShape};
use crate::error::ToolError;

const DOMAIN_REQUIRED: &str = "Domain parameter is required";

/// Runs catalog tools against an appliance.
#[derive(Clone)]
pub struct ToolHandler {
    api: Arc<dyn PiHoleApi>,
}

impl std::fmt::Debug for ToolHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolHandler")
            .field("base_url", &self.api.config().base_url())
            .finish_non_exhaustive()
    }
}

impl ToolHandler {
    #[must_use]
    pub fn new(api: Arc<dyn PiHoleApi>) -> Self {
        Self { api }
    }

    /// The tool catalog.
    #[must_use]
    pub fn tools(&self) -> Vec<ToolDefinition> {
        catalog::definitions()
    }

    /// Invokes tool `name` and returns the result as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// - [`ToolError::MethodNotFound`] if `name` is not in the catalog
    /// - [`ToolError::InvalidParams`] if an argument fails validation
    /// - [`ToolError::Client`] if the appliance call fails
    ///
    /// The first two never reach the network.
    pub async fn handle(&self, name: &str, args: &Params) -> Result<String, ToolError> {
        let operation =
            catalog::lookup(name).ok_or_else(|| ToolError::MethodNotFound(name.to_string()))?;
        let params = shape_arguments(operation, args)?;

        info!("Executing tool '{name}'");
        debug!("Arguments for '{name}': {}", Value::Object(params.clone()));

        let result = self.api.execute(operation, params).await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

/// Builds the operation parameters from raw tool arguments.
fn shape_arguments(operation: Operation, args: &Params) -> Result<Params, ToolError> {
    let mut params = Params::new();

    match catalog::argument_shape(operation) {
        ArgumentShape::None => {}
        ArgumentShape::Count { key, default } => {
            let value = non_negative_integer(args, key)?.unwrap_or(default);
            params.insert(key.to_string(), value.into());
        }
        ArgumentShape::Seconds => {
            if let Some(seconds) = non_negative_integer(args, "seconds")?
                && seconds > 0
            {
                params.insert("timer".to_string(), seconds.into());
            }
        }
        ArgumentShape::Domain => match args.get("domain") {
            Some(Value::String(domain)) if !domain.is_empty() => {
                params.insert("domain".to_string(), Value::String(domain.clone()));
            }
            _ => return Err(ToolError::InvalidParams(DOMAIN_REQUIRED.to_string())),
        },
    }

    Ok(params)
}

/// Reads an optional non-negative integer argument. `null` counts as absent.
///
/// Whole-valued floats such as `5.0` are accepted.
fn non_negative_integer(args: &Params, key: &str) -> Result<Option<u64>, ToolError> {
    let invalid = || ToolError::InvalidParams(format!("'{key}' must be a non-negative integer"));

    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(n) = n.as_u64() {
                return Ok(Some(n));
            }
            match n.as_f64() {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
                    Ok(Some(f as u64))
                }
                _ => Err(invalid()),
            }
        }
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::sync::Mutex;

    use async_trait::async_trait;
    use pihole_client::{ClientError, PiHoleClient};
    use pihole_common::{Config, RetryConfig};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// Records every call and answers with a fixed payload.
    struct RecordingApi {
        config: Config,
        calls: Mutex<Vec<(Operation, Params)>>,
        response: Value,
    }

    impl RecordingApi {
        fn new(response: Value) -> Arc<Self> {
            Arc::new(Self {
                config: Config::new("http://pi.hole"),
                calls: Mutex::new(Vec::new()),
                response,
            })
        }

        fn calls(&self) -> Vec<(Operation, Params)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PiHoleApi for RecordingApi {
        fn config(&self) -> &Config {
            &self.config
        }

        async fn execute(&self, operation: Operation, params: Params) -> Result<Value, ClientError> {
            self.calls.lock().unwrap().push((operation, params));
            Ok(self.response.clone())
        }
    }

    fn args(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_unknown_tool_never_dispatches() {
        let api = RecordingApi::new(json!({}));
        let handler = ToolHandler::new(api.clone());

        let err = handler.handle("make_coffee", &Params::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::MethodNotFound(ref name) if name == "make_coffee"));

        // Public info operations exist in the client but are not tools.
        let err = handler.handle("get_login_info", &Params::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::MethodNotFound(_)));

        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_domain_is_invalid_params() {
        let api = RecordingApi::new(json!({}));
        let handler = ToolHandler::new(api.clone());

        for tool in [
            "add_to_whitelist",
            "remove_from_whitelist",
            "add_to_blacklist",
            "remove_from_blacklist",
        ] {
            for bad in [json!({}), json!({"domain": ""}), json!({"domain": null}), json!({"domain": false})] {
                let err = handler.handle(tool, &args(bad)).await.unwrap_err();
                assert!(
                    matches!(err, ToolError::InvalidParams(ref msg) if msg == DOMAIN_REQUIRED),
                    "{tool}"
                );
            }
        }

        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_count_defaults_and_overrides() {
        let api = RecordingApi::new(json!({"domains": []}));
        let handler = ToolHandler::new(api.clone());

        handler.handle("get_top_items", &Params::new()).await.unwrap();
        handler
            .handle("get_top_clients", &args(json!({"count": 5})))
            .await
            .unwrap();
        handler
            .handle("get_recent_blocked", &args(json!({"count": null})))
            .await
            .unwrap();
        handler
            .handle("get_tail_log", &Params::new())
            .await
            .unwrap();

        let calls = api.calls();
        assert_eq!(calls[0], (Operation::GetTopItems, args(json!({"count": 10}))));
        assert_eq!(calls[1], (Operation::GetTopClients, args(json!({"count": 5}))));
        assert_eq!(calls[2], (Operation::GetRecentBlocked, args(json!({"count": 10}))));
        assert_eq!(calls[3], (Operation::GetTailLog, args(json!({"lines": 100}))));
    }

    #[tokio::test]
    async fn test_count_must_be_non_negative_integer() {
        let api = RecordingApi::new(json!({}));
        let handler = ToolHandler::new(api.clone());

        for bad in [json!({"count": -1}), json!({"count": 2.5}), json!({"count": "5"})] {
            let err = handler.handle("get_top_items", &args(bad)).await.unwrap_err();
            assert!(matches!(err, ToolError::InvalidParams(_)));
        }

        handler
            .handle("get_top_items", &args(json!({"count": 3.0})))
            .await
            .unwrap();
        assert_eq!(api.calls(), vec![(Operation::GetTopItems, args(json!({"count": 3})))]);
    }

    #[tokio::test]
    async fn test_disable_timer_only_when_positive() {
        let api = RecordingApi::new(json!({"blocking": "disabled"}));
        let handler = ToolHandler::new(api.clone());

        handler.handle("disable_pihole", &Params::new()).await.unwrap();
        handler
            .handle("disable_pihole", &args(json!({"seconds": 0})))
            .await
            .unwrap();
        handler
            .handle("disable_pihole", &args(json!({"seconds": 300})))
            .await
            .unwrap();

        let calls = api.calls();
        assert_eq!(calls[0].1, Params::new());
        assert_eq!(calls[1].1, Params::new());
        assert_eq!(calls[2].1, args(json!({"timer": 300})));
    }

    #[tokio::test]
    async fn test_no_argument_tools_ignore_extras() {
        let api = RecordingApi::new(json!({"blocking": "enabled"}));
        let handler = ToolHandler::new(api.clone());

        handler
            .handle("enable_pihole", &args(json!({"blocking": false})))
            .await
            .unwrap();
        assert_eq!(api.calls(), vec![(Operation::Enable, Params::new())]);
    }

    #[tokio::test]
    async fn test_result_is_pretty_json() {
        let api = RecordingApi::new(json!({"blocking": "enabled", "timer": null}));
        let handler = ToolHandler::new(api);

        let text = handler.handle("get_pihole_status", &Params::new()).await.unwrap();
        assert!(text.contains('\n'));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["blocking"], "enabled");
    }

    #[tokio::test]
    async fn test_end_to_end_against_appliance() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session": {"valid": true, "sid": "sid-e2e", "validity": 300}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/domains/allow/exact"))
            .and(header("X-FTL-SID", "sid-e2e"))
            .and(body_json(json!({"domain": "good.example.com"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "domains": [{"domain": "good.example.com", "type": "allow"}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/stats/top_clients"))
            .and(query_param("count", "10"))
            .and(header("X-FTL-SID", "sid-e2e"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"clients": []})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = Config::new(mock_server.uri())
            .with_password("secret")
            .with_retry_config(RetryConfig::disabled());
        let client = PiHoleClient::new(config).unwrap();
        let handler = ToolHandler::new(Arc::new(client));

        let text = handler
            .handle("add_to_whitelist", &args(json!({"domain": "good.example.com"})))
            .await
            .unwrap();
        assert!(text.contains("good.example.com"));

        handler.handle("get_top_clients", &Params::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_upstream_failure_is_client_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/stats/summary"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&mock_server)
            .await;

        let config = Config::new(mock_server.uri()).with_retry_config(RetryConfig::disabled());
        let handler = ToolHandler::new(Arc::new(PiHoleClient::new(config).unwrap()));

        let err = handler.handle("get_pihole_summary", &Params::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::Client(ref e) if e.status() == Some(502)));
    }
}
