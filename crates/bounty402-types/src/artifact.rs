//! Canonical JSON artifacts produced by agent runs
//!
//! An artifact is created once per run, content-addressed by the hash of
//! its canonical serialization, and never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{canonical_json, AgentKind};

/// The canonical result object an agent run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// "txSummary" or "walletSummary"
    pub kind: String,
    pub agent_type: AgentKind,
    pub bounty_id: u64,
    /// The raw run input (tx hash or wallet address)
    pub input: String,
    /// The agent's JSON result, verbatim
    pub result: Value,
    /// RFC-3339 creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(agent_type: AgentKind, bounty_id: u64, input: String, result: Value) -> Self {
        Self {
            kind: agent_type.artifact_kind().to_string(),
            agent_type,
            bounty_id,
            input,
            result,
            created_at: Utc::now(),
        }
    }

    /// Stable serialization the content hash is computed over
    pub fn canonical_payload(&self) -> String {
        let value = serde_json::json!({
            "kind": self.kind,
            "agentType": self.agent_type,
            "bountyId": self.bounty_id,
            "input": self.input,
            "result": self.result,
            "createdAt": self.created_at,
        });
        canonical_json(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_payload_stable() {
        let artifact = Artifact::new(
            AgentKind::TxExplainer,
            7,
            format!("0x{}", "ab".repeat(32)),
            json!({"zeta": "1", "alpha": {"b": 2, "a": 1}}),
        );
        let first = artifact.canonical_payload();
        let second = artifact.canonical_payload();
        assert_eq!(first, second);
        // Keys come out sorted regardless of construction order.
        assert!(first.find(r#""agentType""#).unwrap() < first.find(r#""bountyId""#).unwrap());
        assert!(first.find(r#""alpha""#).unwrap() < first.find(r#""zeta""#).unwrap());
    }

    #[test]
    fn test_canonical_payload_matches_wire_serialization() {
        let artifact = Artifact::new(
            AgentKind::WalletExplainer,
            3,
            format!("0x{}", "cd".repeat(20)),
            json!({"transfers": []}),
        );
        let derived = serde_json::to_value(&artifact).unwrap();
        assert_eq!(artifact.canonical_payload(), canonical_json(&derived));
    }
}
