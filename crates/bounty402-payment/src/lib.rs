//! Bounty402 Payment - x402 micropayments over HTTP
//!
//! A resource server prices routes and answers unpaid requests with a 402
//! quote; a paying client answers the quote by signing an EIP-3009
//! `TransferWithAuthorization` and retrying once with the `x-payment`
//! header. Verification and settlement are delegated to a facilitator
//! service behind the [`Facilitator`] trait.

pub mod client;
pub mod facilitator;
pub mod gate;
pub mod types;

pub use client::*;
pub use facilitator::*;
pub use gate::*;
pub use types::*;

use thiserror::Error;

/// Payment-layer errors
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Facilitator request failed: {0}")]
    Facilitator(String),

    #[error("Payment rejected: {0}")]
    Rejected(String),

    #[error("Malformed payment header: {0}")]
    MalformedHeader(String),

    #[error("No usable payment requirement in the quote: {0}")]
    NoMatchingRequirement(String),

    #[error("Payment signing failed: {0}")]
    Signing(String),

    #[error("HTTP request failed: {0}")]
    Http(String),
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

pub type PaymentResult<T> = Result<T, PaymentError>;

/// Map an x402 network name to its EVM chain id
pub fn network_chain_id(network: &str) -> Option<u64> {
    match network {
        "base-sepolia" => Some(84_532),
        "base" => Some(8_453),
        _ => None,
    }
}

/// Inverse of [`network_chain_id`]
pub fn chain_id_network(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        84_532 => Some("base-sepolia"),
        8_453 => Some("base"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_mapping_round_trips() {
        assert_eq!(network_chain_id("base-sepolia"), Some(84_532));
        assert_eq!(chain_id_network(8_453), Some("base"));
        assert_eq!(network_chain_id("mainnet"), None);
    }
}
