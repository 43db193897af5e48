//! Bounty402 Crypto - Attestation digest and validator signing
//!
//! This crate provides:
//! - The protocol-frozen attestation digest over the claim tuple
//! - EIP-191 recoverable signing with the validator key
//! - Content hashing for canonical JSON artifacts
//!
//! # Protocol Invariant
//!
//! **The digest field order and widths never change without a version
//! bump.** The escrow contract recomputes the identical digest on-chain to
//! verify the validator's signature by recovery.

pub mod digest;
pub mod signer;

pub use digest::*;
pub use signer::*;

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
