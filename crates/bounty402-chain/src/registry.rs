//! Typed client for the agent registry contract

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use alloy_sol_types::SolCall;
use bounty402_types::{AgentStats, JobRecord};

use crate::contracts::AgentRegistry;
use crate::{ChainError, ChainResult, RpcClient, TxSender};

/// Read and transaction helpers for the registry contract
#[derive(Debug, Clone)]
pub struct RegistryClient {
    rpc: Arc<RpcClient>,
    address: Address,
}

impl RegistryClient {
    pub fn new(rpc: Arc<RpcClient>, address: Address) -> Self {
        Self { rpc, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Record a paid job, waiting for the transaction to mine.
    ///
    /// Callers treat this as best-effort: the attestation it accompanies
    /// stands regardless of the outcome here.
    pub async fn register_job(&self, sender: &TxSender, job: &JobRecord) -> ChainResult<B256> {
        let calldata = AgentRegistry::registerJobCall {
            jobId: job.job_id,
            agent: job.agent,
            client: job.client,
            token: job.token,
            amount: job.amount,
        }
        .abi_encode();

        let tx_hash = sender.send(self.address, calldata).await?;
        sender.wait_for_receipt(tx_hash).await?;
        Ok(tx_hash)
    }

    /// Aggregate reputation stats for one agent address
    pub async fn get_agent(&self, agent: Address) -> ChainResult<AgentStats> {
        let call = AgentRegistry::getAgentCall { agent };
        let raw = self.rpc.call(None, self.address, &call.abi_encode()).await?;
        let decoded = AgentRegistry::getAgentCall::abi_decode_returns(&raw)
            .map_err(|e| ChainError::Decode(e.to_string()))?;

        Ok(AgentStats {
            agent,
            active: decoded.active,
            job_count: decoded.jobCount.to::<u64>(),
            feedback_count: decoded.feedbackCount.to::<u64>(),
            rating_scaled: decoded.avgRatingScaled,
        })
    }
}
