//! Tool registry: named tools with declared input schemas

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use bounty402_types::{validate, Bounty402Error};

use crate::{ToolError, ToolResult};

/// Describes one tool to callers (and to the LLM tool loop)
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON-schema object for the tool's arguments
    pub parameters: Value,
}

/// One read-only chain query
#[async_trait]
pub trait ChainTool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    /// Execute with already-validated args; implementations re-validate
    /// since args arrive as free-form JSON.
    async fn run(&self, args: Value) -> ToolResult<Value>;
}

/// The fixed, named tool set exposed by an agent worker
pub struct ToolRegistry {
    tools: Vec<Box<dyn ChainTool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Box<dyn ChainTool>>) -> Self {
        Self { tools }
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.spec().name).collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    /// Execute a named tool against JSON args.
    ///
    /// Unknown names and schema violations surface as 400-class errors;
    /// upstream RPC failures carry the original message.
    pub async fn execute(&self, name: &str, args: Value) -> ToolResult<Value> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.spec().name == name)
            .ok_or_else(|| ToolError::UnknownTool {
                name: name.to_string(),
            })?;
        tool.run(args).await
    }
}

// Argument extraction helpers shared by the tool implementations. Each
// returns an issue string shaped like zod's field-labeled errors.

pub(crate) fn issue(err: Bounty402Error) -> String {
    match err {
        Bounty402Error::InvalidInput { field, reason } => format!("{field}: {reason}"),
        other => other.to_string(),
    }
}

pub(crate) fn require_str<'a>(args: &'a Value, field: &str) -> Result<&'a str, String> {
    args.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("{field}: required string"))
}

pub(crate) fn parse_tx_hash(
    tool: &str,
    args: &Value,
    field: &str,
) -> ToolResult<alloy_primitives::B256> {
    let raw = require_str(args, field).map_err(|iss| ToolError::InvalidArgs {
        tool: tool.to_string(),
        issues: vec![iss],
    })?;
    validate::require_tx_hash(field, raw).map_err(|e| ToolError::InvalidArgs {
        tool: tool.to_string(),
        issues: vec![issue(e)],
    })
}

pub(crate) fn parse_address(
    tool: &str,
    args: &Value,
    field: &str,
) -> ToolResult<alloy_primitives::Address> {
    let raw = require_str(args, field).map_err(|iss| ToolError::InvalidArgs {
        tool: tool.to_string(),
        issues: vec![iss],
    })?;
    validate::require_address(field, raw).map_err(|e| ToolError::InvalidArgs {
        tool: tool.to_string(),
        issues: vec![issue(e)],
    })
}

pub(crate) fn execution(tool: &str, err: impl std::fmt::Display) -> ToolError {
    ToolError::Execution {
        tool: tool.to_string(),
        message: err.to_string(),
    }
}

/// Schema fragment for a 0x + 64-hex hash argument
pub(crate) fn hash_schema(field: &str) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            field: { "type": "string", "pattern": "^0x[a-fA-F0-9]{64}$" }
        },
        "required": [field]
    })
}

/// Schema fragment for a 0x + 40-hex address argument
pub(crate) fn address_schema(field: &str) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            field: { "type": "string", "pattern": "^0x[a-fA-F0-9]{40}$" }
        },
        "required": [field]
    })
}
