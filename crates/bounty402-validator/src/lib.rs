//! Bounty402 Validator - the attestation core
//!
//! Verification is deterministic: the digest is a pure function of
//! {chain, escrow, bounty, submission, claimant, artifact hash}, signed
//! once with the validator key. Nothing here retries and nothing here
//! depends on request ordering; the escrow contract recomputes the digest
//! and recovers the signer on claim.

pub mod attest;
pub mod jobs;
pub mod service;

pub use attest::*;
pub use jobs::*;
pub use service::*;

use thiserror::Error;

/// Validator-layer errors
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("Invalid verify request: {field}: {reason}")]
    InvalidRequest { field: &'static str, reason: String },

    #[error("Signing failed: {0}")]
    Signing(String),
}

pub type ValidatorResult<T> = Result<T, ValidatorError>;
