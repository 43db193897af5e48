//! Bounty and submission records
//!
//! The escrow contract owns these; the off-chain services only read them
//! via RPC and mutate them through transactions.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{Bounty402Error, Result};

/// Lifecycle of a bounty on the escrow contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BountyStatus {
    Open,
    Awarded,
    Cancelled,
    Paid,
}

impl BountyStatus {
    /// Decode the on-chain status byte
    pub fn from_u8(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(Self::Open),
            1 => Ok(Self::Awarded),
            2 => Ok(Self::Cancelled),
            3 => Ok(Self::Paid),
            other => Err(Bounty402Error::Contract {
                message: format!("unknown bounty status byte {other}"),
            }),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Awarded => 1,
            Self::Cancelled => 2,
            Self::Paid => 3,
        }
    }
}

/// An escrowed bounty, immutable once Paid or Cancelled
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounty {
    pub id: u64,
    pub creator: Address,
    /// Reward token contract
    pub token: Address,
    /// Reward amount in the token's smallest unit, decimal string on the wire
    #[serde(with = "crate::canonical::u256_decimal")]
    pub reward: U256,
    /// Unix seconds
    pub deadline: u64,
    pub status: BountyStatus,
    /// Content hash of the task description
    pub spec_hash: B256,
    /// Validator assigned at creation; only its attestations release funds
    pub validator: Address,
}

impl Bounty {
    /// A zero creator address means the bounty slot was never written
    pub fn exists(&self) -> bool {
        self.creator != Address::ZERO
    }

    pub fn is_open_at(&self, now_unix: u64) -> bool {
        self.status == BountyStatus::Open && (self.deadline == 0 || now_unix <= self.deadline)
    }
}

/// A claimant's proposed artifact against a bounty
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub bounty_id: u64,
    /// Scoped to the bounty, assigned by the contract starting at 1
    pub id: u64,
    pub submitter: Address,
    pub artifact_hash: B256,
    /// Dereferenceable location of the artifact payload
    pub uri: String,
}

/// Which agent produces the artifact for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentKind {
    #[serde(rename = "tx-explainer")]
    TxExplainer,
    #[serde(rename = "wallet-explainer")]
    WalletExplainer,
}

impl AgentKind {
    /// Artifact `kind` field for this agent
    pub fn artifact_kind(&self) -> &'static str {
        match self {
            Self::TxExplainer => "txSummary",
            Self::WalletExplainer => "walletSummary",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TxExplainer => "tx-explainer",
            Self::WalletExplainer => "wallet-explainer",
        }
    }

    /// Validate the run input for this agent kind
    pub fn validate_input(&self, input: &str) -> Result<()> {
        match self {
            Self::TxExplainer => crate::validate::require_tx_hash("input", input).map(|_| ()),
            Self::WalletExplainer => crate::validate::require_address("input", input).map(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for raw in 0u8..=3 {
            let status = BountyStatus::from_u8(raw).unwrap();
            assert_eq!(status.as_u8(), raw);
        }
        assert!(BountyStatus::from_u8(4).is_err());
    }

    #[test]
    fn test_agent_input_validation() {
        let tx = AgentKind::TxExplainer;
        assert!(tx
            .validate_input(&format!("0x{}", "ab".repeat(32)))
            .is_ok());
        assert!(tx.validate_input("0x1234").is_err());

        let wallet = AgentKind::WalletExplainer;
        assert!(wallet
            .validate_input(&format!("0x{}", "cd".repeat(20)))
            .is_ok());
        assert!(wallet
            .validate_input(&format!("0x{}", "ab".repeat(32)))
            .is_err());
    }

    #[test]
    fn test_bounty_openness() {
        let bounty = Bounty {
            id: 1,
            creator: Address::repeat_byte(0x11),
            token: Address::repeat_byte(0x22),
            reward: U256::from(10_000u64),
            deadline: 1_700_000_000,
            status: BountyStatus::Open,
            spec_hash: B256::ZERO,
            validator: Address::repeat_byte(0x33),
        };
        assert!(bounty.exists());
        assert!(bounty.is_open_at(1_699_999_999));
        assert!(!bounty.is_open_at(1_700_000_001));

        let paid = Bounty {
            status: BountyStatus::Paid,
            ..bounty
        };
        assert!(!paid.is_open_at(0));
    }
}
