//! Bounty402 Agent - conversational sessions over the chain tools
//!
//! Sessions are stateless on the server: the caller supplies an opaque
//! session id and the full message history on every request. A message
//! set either short-circuits to direct tool execution (when the caller
//! asks for raw JSON) or runs a bounded tool-calling completion loop
//! against a hosted model.

pub mod llm;
pub mod session;

pub use llm::*;
pub use session::*;

use thiserror::Error;

/// Agent-layer errors; provider failures keep the upstream message
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Provider request failed: {0}")]
    Provider(String),

    #[error("Provider returned an unusable response: {0}")]
    BadResponse(String),

    #[error("Could not parse tool instruction: {0}")]
    BadDirective(String),

    #[error(transparent)]
    Tool(#[from] bounty402_tools::ToolError),
}

pub type AgentResult<T> = Result<T, AgentError>;
