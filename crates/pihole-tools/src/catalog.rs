//! The static tool catalog.

use serde::Serialize;

use pihole_client::Operation;
use pihole_common::{Parameters, Property, ToolDefinition};

/// Default `count` for listing tools.
pub const DEFAULT_COUNT: u64 = 10;

/// Default `lines` for `get_tail_log`.
pub const DEFAULT_TAIL_LINES: u64 = 100;

/// Grouping used when presenting the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Status,
    Statistics,
    History,
    Control,
    DomainManagement,
    Logs,
}

/// How a tool's arguments are shaped before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentShape {
    /// Arguments are ignored.
    None,
    /// Optional non-negative integer with a default.
    Count {
        /// Argument and upstream parameter name.
        key: &'static str,
        /// Value used when the argument is absent.
        default: u64,
    },
    /// Optional disable duration in seconds, sent as `timer` when positive.
    Seconds,
    /// Required non-empty `domain`.
    Domain,
}

/// Every exposed tool, in catalog order.
pub const TOOLS: [(Operation, ToolCategory); 21] = [
    (Operation::GetStatus, ToolCategory::Status),
    (Operation::GetSummary, ToolCategory::Status),
    (Operation::GetQueryTypes, ToolCategory::Statistics),
    (Operation::GetForwardDestinations, ToolCategory::Statistics),
    (Operation::GetTopItems, ToolCategory::Statistics),
    (Operation::GetTopClients, ToolCategory::Statistics),
    (Operation::GetTopBlockedDomains, ToolCategory::Statistics),
    (Operation::GetRecentBlocked, ToolCategory::Statistics),
    (Operation::GetQueryTypesOverTime, ToolCategory::History),
    (Operation::GetClientsOverTime, ToolCategory::History),
    (Operation::GetForwardDestinationsOverTime, ToolCategory::History),
    (Operation::Enable, ToolCategory::Control),
    (Operation::Disable, ToolCategory::Control),
    (Operation::AddToWhitelist, ToolCategory::DomainManagement),
    (Operation::RemoveFromWhitelist, ToolCategory::DomainManagement),
    (Operation::AddToBlacklist, ToolCategory::DomainManagement),
    (Operation::RemoveFromBlacklist, ToolCategory::DomainManagement),
    (Operation::GetWhitelist, ToolCategory::DomainManagement),
    (Operation::GetBlacklist, ToolCategory::DomainManagement),
    (Operation::FlushLogs, ToolCategory::Logs),
    (Operation::GetTailLog, ToolCategory::Logs),
];

/// Resolves a tool name. Operations that are not tools resolve to `None`.
#[must_use]
pub fn lookup(name: &str) -> Option<Operation> {
    TOOLS
        .iter()
        .map(|(op, _)| *op)
        .find(|op| op.name() == name)
}

/// All tool definitions in catalog order.
#[must_use]
pub fn definitions() -> Vec<ToolDefinition> {
    TOOLS.iter().filter_map(|(op, _)| definition(*op)).collect()
}

/// Tool definitions grouped by category, categories in catalog order.
#[must_use]
pub fn grouped() -> Vec<(ToolCategory, Vec<ToolDefinition>)> {
    let mut groups: Vec<(ToolCategory, Vec<ToolDefinition>)> = Vec::new();
    for (op, category) in TOOLS {
        let Some(def) = definition(op) else {
            continue;
        };
        match groups.last_mut() {
            Some((current, defs)) if *current == category => defs.push(def),
            _ => groups.push((category, vec![def])),
        }
    }
    groups
}

/// Argument shaping for `operation`.
#[must_use]
pub const fn argument_shape(operation: Operation) -> ArgumentShape {
    match operation {
        Operation::GetTopItems
        | Operation::GetTopClients
        | Operation::GetTopBlockedDomains
        | Operation::GetRecentBlocked => ArgumentShape::Count {
            key: "count",
            default: DEFAULT_COUNT,
        },
        Operation::GetTailLog => ArgumentShape::Count {
            key: "lines",
            default: DEFAULT_TAIL_LINES,
        },
        Operation::Disable => ArgumentShape::Seconds,
        Operation::AddToWhitelist
        | Operation::RemoveFromWhitelist
        | Operation::AddToBlacklist
        | Operation::RemoveFromBlacklist => ArgumentShape::Domain,
        _ => ArgumentShape::None,
    }
}

fn count(description: &str, default: u64) -> Parameters {
    Parameters::single(
        "count",
        Property::number(format!("{description} (default: {default})")).with_default(default),
        false,
    )
}

fn domain(description: &str) -> Parameters {
    Parameters::single("domain", Property::string(description), true)
}

/// The tool definition for `operation`, or `None` if it is not exposed as a tool.
#[must_use]
pub fn definition(operation: Operation) -> Option<ToolDefinition> {
    let (description, parameters) = match operation {
        Operation::GetStatus => (
            "Get the current status of Pi-hole (enabled/disabled)",
            Parameters::empty(),
        ),
        Operation::GetSummary => (
            "Get Pi-hole statistics summary including queries blocked today, total queries, etc.",
            Parameters::empty(),
        ),
        Operation::GetQueryTypes => (
            "Get breakdown of DNS query types (A, AAAA, PTR, etc.)",
            Parameters::empty(),
        ),
        Operation::GetForwardDestinations => (
            "Get information about upstream DNS servers",
            Parameters::empty(),
        ),
        Operation::GetTopItems => (
            "Get top queried domains",
            count("Number of top items to return", DEFAULT_COUNT),
        ),
        Operation::GetTopClients => (
            "Get top clients by query count",
            count("Number of top clients to return", DEFAULT_COUNT),
        ),
        Operation::GetTopBlockedDomains => (
            "Get top blocked domains",
            count("Number of top blocked domains to return", DEFAULT_COUNT),
        ),
        Operation::GetRecentBlocked => (
            "Get recently blocked domains",
            count("Number of recent blocked domains to return", DEFAULT_COUNT),
        ),
        Operation::GetQueryTypesOverTime => (
            "Get total and blocked query counts over time",
            Parameters::empty(),
        ),
        Operation::GetClientsOverTime => (
            "Get per-client query activity over time",
            Parameters::empty(),
        ),
        Operation::GetForwardDestinationsOverTime => (
            "Get upstream DNS server usage over time",
            Parameters::empty(),
        ),
        Operation::Enable => ("Enable Pi-hole blocking (requires API key)", Parameters::empty()),
        Operation::Disable => (
            "Disable Pi-hole blocking temporarily (requires API key)",
            Parameters::single(
                "seconds",
                Property::number(
                    "Number of seconds to disable Pi-hole (optional, defaults to indefinite)",
                ),
                false,
            ),
        ),
        Operation::AddToWhitelist => (
            "Add a domain to the whitelist (requires API key)",
            domain("Domain to add to whitelist"),
        ),
        Operation::RemoveFromWhitelist => (
            "Remove a domain from the whitelist (requires API key)",
            domain("Domain to remove from whitelist"),
        ),
        Operation::AddToBlacklist => (
            "Add a domain to the blacklist (requires API key)",
            domain("Domain to add to blacklist"),
        ),
        Operation::RemoveFromBlacklist => (
            "Remove a domain from the blacklist (requires API key)",
            domain("Domain to remove from blacklist"),
        ),
        Operation::GetWhitelist => (
            "Get all domains in the whitelist (requires API key)",
            Parameters::empty(),
        ),
        Operation::GetBlacklist => (
            "Get all domains in the blacklist (requires API key)",
            Parameters::empty(),
        ),
        Operation::FlushLogs => ("Flush Pi-hole logs (requires API key)", Parameters::empty()),
        Operation::GetTailLog => (
            "Get recent log entries (requires API key)",
            Parameters::single(
                "lines",
                Property::number(format!(
                    "Number of log lines to return (default: {DEFAULT_TAIL_LINES})"
                ))
                .with_default(DEFAULT_TAIL_LINES),
                false,
            ),
        ),
        Operation::GetLoginInfo | Operation::GetClientInfo => return None,
    };

    Some(
        ToolDefinition::builder()
            .name(operation.name())
            .description(description)
            .parameters(parameters)
            .build(),
    )
}
