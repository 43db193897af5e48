//! Bounty402 Chain - JSON-RPC access to the escrow, registry and token contracts
//!
//! This crate provides:
//! - A thin JSON-RPC 2.0 client over reqwest
//! - `sol!` bindings for the escrow, registry and ERC-20 contracts
//! - Locally-signed legacy transaction construction and submission
//! - Typed wrappers that simulate state-changing calls before sending them
//!
//! The chain is the sole owner of bounty and submission state; everything
//! here is either a read or a signed transaction.

pub mod contracts;
pub mod escrow;
pub mod registry;
pub mod rpc;
pub mod sender;
pub mod token;

pub use escrow::*;
pub use registry::*;
pub use rpc::*;
pub use sender::*;
pub use token::*;

use thiserror::Error;

/// Chain access errors
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Contract call reverted: {0}")]
    Revert(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Transaction {0} not mined within the wait window")]
    ReceiptTimeout(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl ChainError {
    /// Whether this error carries an execution revert
    pub fn is_revert(&self) -> bool {
        match self {
            Self::Revert(_) => true,
            Self::Rpc { code, message } => {
                *code == 3 || message.to_ascii_lowercase().contains("revert")
            }
            _ => false,
        }
    }
}

pub type ChainResult<T> = Result<T, ChainError>;
