//! Error types for Bounty402
//!
//! All failures are explicit. Configuration and validation errors are
//! terminal; upstream errors preserve the original message so callers can
//! retry manually.

use thiserror::Error;

/// Result type for Bounty402 operations
pub type Result<T> = std::result::Result<T, Bounty402Error>;

/// Bounty402 error types
#[derive(Debug, Clone, Error)]
pub enum Bounty402Error {
    /// A required configuration setting is absent
    #[error("Missing configuration: {name}")]
    MissingConfig { name: String },

    /// A configuration setting has an unusable value
    #[error("Invalid configuration: {name} - {reason}")]
    InvalidConfig { name: String, reason: String },

    /// Caller-supplied field failed shape validation
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    /// Bounty does not exist on the escrow contract
    #[error("Bounty {bounty_id} not found")]
    BountyNotFound { bounty_id: u64 },

    /// Bounty exists but is not accepting submissions
    #[error("Bounty {bounty_id} is not open (status {status})")]
    BountyNotOpen { bounty_id: u64, status: u8 },

    /// Bounty deadline has passed
    #[error("Bounty {bounty_id} deadline {deadline} has passed")]
    BountyExpired { bounty_id: u64, deadline: u64 },

    /// Chain RPC request failed
    #[error("RPC error: {message}")]
    Rpc { message: String },

    /// Contract call reverted or returned undecodable data
    #[error("Contract error: {message}")]
    Contract { message: String },

    /// Upstream agent endpoint failed
    #[error("Agent error: {message}")]
    Agent { message: String },

    /// Payment gate rejected or payment construction failed
    #[error("Payment error: {message}")]
    Payment { message: String },

    /// Signing or signature recovery failed
    #[error("Signing error: {message}")]
    Signing { message: String },

    /// Named resource does not exist
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Wall-clock deadline elapsed
    #[error("Timed out: {what}")]
    Timeout { what: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Bounty402Error {
    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get a machine-readable code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingConfig { .. } => "MISSING_ENV",
            Self::InvalidConfig { .. } => "INVALID_ENV",
            Self::InvalidInput { .. } => "INVALID_BODY",
            Self::BountyNotFound { .. } => "BOUNTY_NOT_FOUND",
            Self::BountyNotOpen { .. } => "BOUNTY_NOT_OPEN",
            Self::BountyExpired { .. } => "BOUNTY_EXPIRED",
            Self::Rpc { .. } => "RPC_ERROR",
            Self::Contract { .. } => "CONTRACT_ERROR",
            Self::Agent { .. } => "AGENT_FAILED",
            Self::Payment { .. } => "PAYMENT_FAILED",
            Self::Signing { .. } => "SIGNING_FAILED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = Bounty402Error::BountyNotOpen {
            bounty_id: 3,
            status: 2,
        };
        assert_eq!(err.error_code(), "BOUNTY_NOT_OPEN");

        let err = Bounty402Error::invalid_input("artifactHash", "expected 0x + 64 hex chars");
        assert_eq!(err.error_code(), "INVALID_BODY");
    }
}
