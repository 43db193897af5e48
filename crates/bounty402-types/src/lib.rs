//! Bounty402 Types - Shared domain model for the bounty marketplace
//!
//! This crate provides:
//! - Bounty and submission records mirrored from the escrow contract
//! - Canonical JSON artifacts and their content addressing rules
//! - Attestations issued by the validator
//! - The shared error type used across all bounty402 crates
//!
//! # Serialization Invariant
//!
//! **Every big integer crossing the JSON boundary is a decimal string.**
//! Monetary amounts and counters are never serialized as native JSON
//! numbers, so no precision is lost for values above 2^53.

pub mod artifact;
pub mod attestation;
pub mod bounty;
pub mod canonical;
pub mod error;
pub mod validate;

pub use artifact::*;
pub use attestation::*;
pub use bounty::*;
pub use canonical::*;
pub use error::*;
pub use validate::*;

pub use alloy_primitives::{Address, B256, U256};
