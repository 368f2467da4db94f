//! Tool schema types shared by the tool catalog and the RPC layer.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Describes a single property in a tool's input schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    /// The JSON type (e.g., "string", "number").
    #[serde(rename = "type")]
    pub prop_type: String,
    /// Human-readable description of this property.
    pub description: String,
    /// Value assumed when the caller omits this property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl Property {
    /// Creates a string property.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            prop_type: "string".to_string(),
            description: description.into(),
            default: None,
        }
    }

    /// Creates a number property.
    #[must_use]
    pub fn number(description: impl Into<String>) -> Self {
        Self {
            prop_type: "number".to_string(),
            description: description.into(),
            default: None,
        }
    }

    /// Attaches a default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<serde_json::Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Object schema describing a tool's arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameters {
    /// The JSON type, always "object".
    #[serde(rename = "type")]
    pub param_type: String,
    /// Map of parameter names to their property definitions.
    pub properties: BTreeMap<String, Property>,
    /// List of required parameter names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self::empty()
    }
}

impl Parameters {
    /// Creates a new `Parameters` with type "object".
    #[must_use]
    pub fn new(properties: BTreeMap<String, Property>, required: Vec<String>) -> Self {
        Self {
            param_type: "object".to_string(),
            properties,
            required,
        }
    }

    /// A schema that takes no arguments.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(BTreeMap::new(), Vec::new())
    }

    /// A schema with one property.
    #[must_use]
    pub fn single(name: impl Into<String>, property: Property, required: bool) -> Self {
        let name = name.into();
        let required = if required {
            vec![name.clone()]
        } else {
            Vec::new()
        };
        Self::new(BTreeMap::from([(name, property)]), required)
    }

    /// Returns `true` if `name` is a required parameter.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Fallible conversion to a JSON object for contexts that can propagate errors.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json_object(&self) -> Result<serde_json::Map<String, serde_json::Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(serde::de::Error::custom(format!(
                "expected schema object, got {other}"
            ))),
        }
    }
}

impl From<Parameters> for serde_json::Value {
    fn from(params: Parameters) -> Self {
        match serde_json::to_value(params) {
            Ok(value) => value,
            Err(e) => {
                warn!("Parameters serialization unexpectedly failed: {e}");
                Self::Null
            }
        }
    }
}

/// A named, schema-described operation invocable through the RPC protocol.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder, PartialEq)]
pub struct ToolDefinition {
    /// Unique tool name.
    #[builder(setter(into))]
    pub name: String,
    /// Human-readable description of what the tool does.
    #[builder(setter(into))]
    pub description: String,
    /// JSON schema of the tool's arguments.
    #[serde(rename = "inputSchema")]
    #[builder(default)]
    pub parameters: Parameters,
}
