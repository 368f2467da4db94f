//! The operation table: every logical operation the gateway can perform,
//! and how each one maps onto the appliance's REST API.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use url::Url;

use crate::endpoint::{EndpointAccess, is_admin_endpoint};
use crate::error::ClientError;

/// Operation parameters, keyed by name.
pub type Params = serde_json::Map<String, Value>;

/// HTTP methods used by the appliance API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// Read.
    Get,
    /// Create or trigger.
    Post,
    /// Remove.
    Delete,
}

impl HttpMethod {
    /// The equivalent `reqwest` method.
    #[must_use]
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// Where an operation's parameters travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamPlacement {
    /// Serialized into the query string.
    Query,
    /// Serialized as a JSON request body.
    Body,
    /// The named parameter is percent-encoded as a trailing path segment;
    /// any other parameters go into the body.
    PathSegment(&'static str),
}

/// Static routing information for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the base address.
    pub path: &'static str,
    /// Parameter placement rule.
    pub placement: ParamPlacement,
    /// Declared access level.
    pub access: EndpointAccess,
    /// Constant parameters merged into every call. They override caller values.
    pub fixed: &'static [(&'static str, bool)],
}

impl OperationDescriptor {
    const fn read(path: &'static str) -> Self {
        Self {
            method: HttpMethod::Get,
            path,
            placement: ParamPlacement::Query,
            access: EndpointAccess::Admin,
            fixed: &[],
        }
    }

    const fn public_read(path: &'static str) -> Self {
        Self {
            access: EndpointAccess::Public,
            ..Self::read(path)
        }
    }

    const fn write(path: &'static str) -> Self {
        Self {
            method: HttpMethod::Post,
            path,
            placement: ParamPlacement::Body,
            access: EndpointAccess::Admin,
            fixed: &[],
        }
    }

    const fn delete(path: &'static str, key: &'static str) -> Self {
        Self {
            method: HttpMethod::Delete,
            path,
            placement: ParamPlacement::PathSegment(key),
            access: EndpointAccess::Admin,
            fixed: &[],
        }
    }

    const fn with_fixed(self, fixed: &'static [(&'static str, bool)]) -> Self {
        Self { fixed, ..self }
    }

    /// Whether calls need a session token.
    ///
    /// A public tag only holds for paths on the public allow-list.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.access.is_admin() || is_admin_endpoint(self.path)
    }

    /// Places `params` according to this descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidParams`] if a path-segment parameter is
    /// missing, not a string, or empty.
    pub fn prepare(&self, mut params: Params) -> Result<PreparedRequest, ClientError> {
        for (key, value) in self.fixed {
            params.insert((*key).to_string(), Value::Bool(*value));
        }

        let mut request = PreparedRequest {
            method: self.method,
            path: self.path,
            segment: None,
            query: Vec::new(),
            body: None,
        };

        match self.placement {
            ParamPlacement::Query => {
                request.query = params
                    .iter()
                    .filter_map(|(key, value)| query_value(value).map(|v| (key.clone(), v)))
                    .collect();
            }
            ParamPlacement::Body => {
                request.body = (!params.is_empty()).then(|| Value::Object(params));
            }
            ParamPlacement::PathSegment(key) => {
                let segment = match params.remove(key) {
                    Some(Value::String(s)) if !s.is_empty() => s,
                    _ => {
                        return Err(ClientError::InvalidParams(format!(
                            "'{key}' parameter is required"
                        )));
                    }
                };
                request.segment = Some(segment);
                request.body = (!params.is_empty()).then(|| Value::Object(params));
            }
        }

        Ok(request)
    }
}

/// Renders a parameter for the query string. `null` is omitted.
fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// A request with its parameters placed, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path template relative to the base address.
    pub path: &'static str,
    /// Trailing path segment, not yet encoded.
    pub segment: Option<String>,
    /// Query pairs in order.
    pub query: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl PreparedRequest {
    /// Builds the absolute URL against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConfigurationError`] if the base address cannot
    /// be combined with the path.
    pub fn url(&self, base_url: &str) -> Result<Url, ClientError> {
        let raw = format!("{}{}", base_url.trim_end_matches('/'), self.path);
        let mut url = Url::parse(&raw)
            .map_err(|e| ClientError::ConfigurationError(format!("Invalid URL '{raw}': {e}")))?;

        if let Some(segment) = &self.segment {
            url.path_segments_mut()
                .map_err(|()| {
                    ClientError::ConfigurationError(format!("URL '{raw}' cannot take path segments"))
                })?
                .push(segment);
        }

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }

        Ok(url)
    }
}

/// Path and query of `url`, for diagnostics.
pub(crate) fn request_path(url: &Url) -> String {
    url.query().map_or_else(
        || url.path().to_string(),
        |query| format!("{}?{query}", url.path()),
    )
}

/// Every logical operation, named as exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetStatus,
    GetSummary,
    GetQueryTypes,
    GetForwardDestinations,
    GetTopItems,
    GetTopClients,
    GetTopBlockedDomains,
    GetRecentBlocked,
    GetQueryTypesOverTime,
    GetClientsOverTime,
    GetForwardDestinationsOverTime,
    Enable,
    Disable,
    AddToWhitelist,
    RemoveFromWhitelist,
    AddToBlacklist,
    RemoveFromBlacklist,
    GetWhitelist,
    GetBlacklist,
    FlushLogs,
    GetTailLog,
    GetLoginInfo,
    GetClientInfo,
}

impl Operation {
    /// All operations in table order.
    pub const ALL: [Self; 23] = [
        Self::GetStatus,
        Self::GetSummary,
        Self::GetQueryTypes,
        Self::GetForwardDestinations,
        Self::GetTopItems,
        Self::GetTopClients,
        Self::GetTopBlockedDomains,
        Self::GetRecentBlocked,
        Self::GetQueryTypesOverTime,
        Self::GetClientsOverTime,
        Self::GetForwardDestinationsOverTime,
        Self::Enable,
        Self::Disable,
        Self::AddToWhitelist,
        Self::RemoveFromWhitelist,
        Self::AddToBlacklist,
        Self::RemoveFromBlacklist,
        Self::GetWhitelist,
        Self::GetBlacklist,
        Self::FlushLogs,
        Self::GetTailLog,
        Self::GetLoginInfo,
        Self::GetClientInfo,
    ];

    /// The operation's public name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetStatus => "get_pihole_status",
            Self::GetSummary => "get_pihole_summary",
            Self::GetQueryTypes => "get_query_types",
            Self::GetForwardDestinations => "get_forward_destinations",
            Self::GetTopItems => "get_top_items",
            Self::GetTopClients => "get_top_clients",
            Self::GetTopBlockedDomains => "get_top_blocked_domains",
            Self::GetRecentBlocked => "get_recent_blocked",
            Self::GetQueryTypesOverTime => "get_query_types_over_time",
            Self::GetClientsOverTime => "get_clients_over_time",
            Self::GetForwardDestinationsOverTime => "get_forward_destinations_over_time",
            Self::Enable => "enable_pihole",
            Self::Disable => "disable_pihole",
            Self::AddToWhitelist => "add_to_whitelist",
            Self::RemoveFromWhitelist => "remove_from_whitelist",
            Self::AddToBlacklist => "add_to_blacklist",
            Self::RemoveFromBlacklist => "remove_from_blacklist",
            Self::GetWhitelist => "get_whitelist",
            Self::GetBlacklist => "get_blacklist",
            Self::FlushLogs => "flush_logs",
            Self::GetTailLog => "get_tail_log",
            Self::GetLoginInfo => "get_login_info",
            Self::GetClientInfo => "get_client_info",
        }
    }

    /// The operation's routing descriptor.
    #[must_use]
    pub const fn descriptor(self) -> OperationDescriptor {
        match self {
            Self::GetStatus => OperationDescriptor::read("/api/dns/blocking"),
            Self::GetSummary => OperationDescriptor::read("/api/stats/summary"),
            Self::GetQueryTypes => OperationDescriptor::read("/api/stats/query_types"),
            Self::GetForwardDestinations => OperationDescriptor::read("/api/stats/upstreams"),
            Self::GetTopItems => OperationDescriptor::read("/api/stats/top_domains"),
            Self::GetTopClients => OperationDescriptor::read("/api/stats/top_clients"),
            Self::GetTopBlockedDomains => {
                OperationDescriptor::read("/api/stats/top_domains").with_fixed(&[("blocked", true)])
            }
            Self::GetRecentBlocked => OperationDescriptor::read("/api/stats/recent_blocked"),
            Self::GetQueryTypesOverTime => OperationDescriptor::read("/api/history"),
            Self::GetClientsOverTime => OperationDescriptor::read("/api/history/clients"),
            Self::GetForwardDestinationsOverTime => {
                OperationDescriptor::read("/api/stats/database/upstreams")
            }
            Self::Enable => {
                OperationDescriptor::write("/api/dns/blocking").with_fixed(&[("blocking", true)])
            }
            Self::Disable => {
                OperationDescriptor::write("/api/dns/blocking").with_fixed(&[("blocking", false)])
            }
            Self::AddToWhitelist => OperationDescriptor::write("/api/domains/allow/exact"),
            Self::RemoveFromWhitelist => {
                OperationDescriptor::delete("/api/domains/allow/exact", "domain")
            }
            Self::AddToBlacklist => OperationDescriptor::write("/api/domains/deny/exact"),
            Self::RemoveFromBlacklist => {
                OperationDescriptor::delete("/api/domains/deny/exact", "domain")
            }
            Self::GetWhitelist => OperationDescriptor::read("/api/domains/allow"),
            Self::GetBlacklist => OperationDescriptor::read("/api/domains/deny"),
            Self::FlushLogs => OperationDescriptor::write("/api/action/flush_logs"),
            Self::GetTailLog => OperationDescriptor::read("/api/logs/ftl"),
            Self::GetLoginInfo => OperationDescriptor::public_read("/api/info/login"),
            Self::GetClientInfo => OperationDescriptor::public_read("/api/info/client"),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| ClientError::UnknownOperation(s.to_string()))
    }
}
