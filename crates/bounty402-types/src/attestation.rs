//! Validator attestations and registry job records

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// A validator-signed digest authorizing one claim
///
/// Not persisted server-side: the digest is a pure function of its inputs
/// and the escrow contract verifies the signature by recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attestation {
    pub validator: Address,
    /// 65-byte r || s || v signature, hex with 0x prefix
    pub signature: String,
    pub digest: B256,
}

/// Job metadata recorded best-effort on the registry contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// keccak256 of the payment proof token
    pub job_id: B256,
    pub agent: Address,
    pub client: Address,
    pub token: Address,
    #[serde(with = "crate::canonical::u256_decimal")]
    pub amount: U256,
}

/// Aggregate per-agent stats read from the registry contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStats {
    pub agent: Address,
    pub active: bool,
    pub job_count: u64,
    pub feedback_count: u64,
    /// Average rating scaled by 1e6
    #[serde(with = "crate::canonical::u256_decimal")]
    pub rating_scaled: U256,
}
