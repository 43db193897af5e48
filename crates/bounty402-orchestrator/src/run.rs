//! The run-agent sequence: agent output to on-chain submission

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use bounty402_artifacts::ArtifactStore;
use bounty402_chain::{ChainError, EscrowClient, TxSender};
use bounty402_crypto::artifact_hash;
use bounty402_types::{AgentKind, Artifact};

use crate::agent_client::{parse_agent_json, tool_for, AgentCaller};
use crate::{OrchestratorError, OrchestratorResult};

/// Body of `POST /api/agent/run`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAgentRequest {
    pub bounty_id: u64,
    /// Tx hash or wallet address, depending on the agent
    pub input: String,
    pub agent_type: AgentKind,
}

/// Successful run: the artifact is stored and the submission is on-chain
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAgentResponse {
    pub request_id: String,
    pub session_id: String,
    pub submission_id: u64,
    pub artifact_hash: B256,
    pub submit_tx_hash: B256,
    /// The agent's result, echoed for immediate display
    pub tx_summary: Value,
}

/// Wires the agent workers, artifact store and escrow into one sequence
pub struct RunAgentFlow {
    escrow: EscrowClient,
    sender: TxSender,
    agents: Arc<dyn AgentCaller>,
    store: Arc<dyn ArtifactStore>,
    /// Public origin artifact URIs are derived from
    public_origin: String,
}

impl RunAgentFlow {
    pub fn new(
        escrow: EscrowClient,
        sender: TxSender,
        agents: Arc<dyn AgentCaller>,
        store: Arc<dyn ArtifactStore>,
        public_origin: impl Into<String>,
    ) -> Self {
        Self {
            escrow,
            sender,
            agents,
            store,
            public_origin: public_origin.into(),
        }
    }

    pub fn artifact_uri(&self, hash: &B256) -> String {
        format!(
            "{}/api/artifacts/{hash}",
            self.public_origin.trim_end_matches('/')
        )
    }

    /// Run the agent, persist the artifact and submit it to the escrow
    pub async fn run(&self, request: RunAgentRequest) -> OrchestratorResult<RunAgentResponse> {
        request
            .agent_type
            .validate_input(&request.input)
            .map_err(|e| OrchestratorError::InvalidBody(e.to_string()))?;

        self.check_bounty_open(request.bounty_id).await?;

        let request_id = Uuid::new_v4().to_string();
        let session_id = Uuid::new_v4().to_string();
        let (tool, arg_field) = tool_for(request.agent_type);
        let args = serde_json::json!({ arg_field: request.input });

        let raw = self
            .agents
            .run(request.agent_type, &session_id, tool, &args)
            .await?;
        let result = parse_agent_json(&raw)?;

        let artifact = Artifact::new(
            request.agent_type,
            request.bounty_id,
            request.input.clone(),
            result.clone(),
        );
        let hash = artifact_hash(&artifact);
        let hash_hex = format!("{hash}");
        self.store.put(&hash_hex, artifact.canonical_payload());
        let uri = self.artifact_uri(&hash);

        let tx_hash = self
            .escrow
            .submit_work(&self.sender, request.bounty_id, hash, &uri)
            .await
            .map_err(|e| OrchestratorError::SubmitWorkFailed(e.to_string()))?;
        let receipt = self
            .sender
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|e| OrchestratorError::SubmitWorkFailed(e.to_string()))?;
        if !receipt.succeeded() {
            return Err(OrchestratorError::SubmitWorkFailed(format!(
                "submitWork transaction {tx_hash} reverted"
            )));
        }

        let submission_id = self
            .escrow
            .recover_submission_id(&receipt, request.bounty_id)
            .await
            .map_err(|e| OrchestratorError::SubmitWorkFailed(e.to_string()))?;

        info!(
            request_id = %request_id,
            bounty_id = request.bounty_id,
            submission_id,
            artifact_hash = %hash,
            tx_hash = %tx_hash,
            "agent run submitted"
        );

        Ok(RunAgentResponse {
            request_id,
            session_id,
            submission_id,
            artifact_hash: hash,
            submit_tx_hash: tx_hash,
            tx_summary: result,
        })
    }

    async fn check_bounty_open(&self, bounty_id: u64) -> OrchestratorResult<()> {
        let bounty = self
            .escrow
            .read_bounty(bounty_id)
            .await
            .map_err(|e: ChainError| OrchestratorError::SubmitWorkFailed(e.to_string()))?;

        if !bounty.exists() {
            return Err(OrchestratorError::BountyNotFound(bounty_id));
        }
        if bounty.status != bounty402_types::BountyStatus::Open {
            return Err(OrchestratorError::BountyNotOpen {
                bounty_id,
                status: bounty.status.as_u8(),
            });
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        if !bounty.is_open_at(now) {
            return Err(OrchestratorError::BountyExpired {
                bounty_id,
                deadline: bounty.deadline,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_request_decodes_agent_kind() {
        let raw = serde_json::json!({
            "bountyId": 7,
            "input": format!("0x{}", "ab".repeat(32)),
            "agentType": "tx-explainer",
        });
        let request: RunAgentRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.agent_type, AgentKind::TxExplainer);
        assert_eq!(request.bounty_id, 7);
    }

    #[test]
    fn test_wrong_shaped_input_is_invalid_body() {
        // An address where a tx hash is required.
        let request = RunAgentRequest {
            bounty_id: 1,
            input: format!("0x{}", "cd".repeat(20)),
            agent_type: AgentKind::TxExplainer,
        };
        let err = request
            .agent_type
            .validate_input(&request.input)
            .map_err(|e| OrchestratorError::InvalidBody(e.to_string()))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_BODY");
    }
}
