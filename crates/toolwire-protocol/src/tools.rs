//! Tool registration and invocation payloads.
//!
//! Both are thin wrappers: a registration travels as a `tools/register`
//! notification, an invocation as a `tools/call` request.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Notification method announcing a tool to the peer
pub const REGISTER_TOOL_METHOD: &str = "tools/register";

/// Request method invoking a tool on the peer
pub const CALL_TOOL_METHOD: &str = "tools/call";

/// Descriptive metadata for a tool announced to the peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRegistration {
    /// Tool name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema describing the tool input
    pub input_schema: Value,
}

impl ToolRegistration {
    /// Create a registration
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Notification params: the descriptor wrapped under `tool`
    pub fn to_params(&self) -> Value {
        json!({ "tool": self })
    }
}

/// A request to run a named tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Tool name
    pub name: String,
    /// Tool arguments, omitted from the wire when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl ToolInvocation {
    /// Invoke `name` without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
        }
    }

    /// Attach arguments
    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = Some(arguments);
        self
    }

    /// Request params
    pub fn to_params(&self) -> Value {
        match &self.arguments {
            Some(arguments) => json!({ "name": self.name, "arguments": arguments }),
            None => json!({ "name": self.name }),
        }
    }
}
