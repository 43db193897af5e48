//! Bounty402 Tools - Read-only chain queries callable by the agents
//!
//! Every tool declares a name, a description and a JSON input schema, and
//! can be invoked either by the LLM tool loop or directly through the
//! structured tool endpoint.
//!
//! # Serialization Invariant
//!
//! Every big integer in a tool result is a decimal string, never a native
//! JSON number. Monetary and counter fields throughout the system rely on
//! this.

pub mod registry;
pub mod tx;
pub mod wallet;

pub use registry::*;
pub use tx::*;
pub use wallet::*;

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use bounty402_chain::RpcClient;
use serde_json::Value;
use thiserror::Error;

/// Tool invocation errors; all map to caller-visible 400-class responses
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool args for {tool}: {}", issues.join("; "))]
    InvalidArgs { tool: String, issues: Vec<String> },

    #[error("Tool {tool} failed: {message}")]
    Execution { tool: String, message: String },
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Shared read-only context handed to every tool
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub rpc: Arc<RpcClient>,
    pub chain_id: u64,
    /// The marketplace payment token (USDC on the demo network)
    pub payment_token: Address,
}

/// Render a big integer as a decimal string JSON value
pub(crate) fn dec(value: U256) -> Value {
    Value::String(value.to_string())
}

/// Format a raw amount with the given number of decimals ("1500000", 6 -> "1.5")
pub(crate) fn format_units(value: U256, decimals: u8) -> String {
    let raw = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return raw;
    }
    let padded = if raw.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - raw.len()), raw)
    } else {
        raw
    };
    let split = padded.len() - decimals;
    let (int_part, frac_part) = padded.split_at(split);
    let frac_trimmed = frac_part.trim_end_matches('0');
    if frac_trimmed.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_trimmed}")
    }
}
