//! Typed client for the escrow contract

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};
use bounty402_types::{Bounty, BountyStatus};

use crate::contracts::Bounty402Escrow;
use crate::{ChainError, ChainResult, RpcClient, RpcReceipt, TxSender};

/// Read and transaction helpers for one deployed escrow contract
#[derive(Debug, Clone)]
pub struct EscrowClient {
    rpc: Arc<RpcClient>,
    address: Address,
}

impl EscrowClient {
    pub fn new(rpc: Arc<RpcClient>, address: Address) -> Self {
        Self { rpc, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Read one bounty's state; `creator == 0` means the slot was never written
    pub async fn read_bounty(&self, bounty_id: u64) -> ChainResult<Bounty> {
        let call = Bounty402Escrow::bountiesCall {
            bountyId: U256::from(bounty_id),
        };
        let raw = self.rpc.call(None, self.address, &call.abi_encode()).await?;
        let decoded = Bounty402Escrow::bountiesCall::abi_decode_returns(&raw)
            .map_err(|e| ChainError::Decode(e.to_string()))?;

        Ok(Bounty {
            id: bounty_id,
            creator: decoded.creator,
            token: decoded.token,
            reward: decoded.reward,
            deadline: decoded.deadline,
            status: BountyStatus::from_u8(decoded.status)
                .map_err(|e| ChainError::Decode(e.to_string()))?,
            spec_hash: decoded.specHash,
            validator: decoded.validator,
        })
    }

    pub async fn submission_count(&self, bounty_id: u64) -> ChainResult<u64> {
        let call = Bounty402Escrow::submissionCountCall {
            bountyId: U256::from(bounty_id),
        };
        let raw = self.rpc.call(None, self.address, &call.abi_encode()).await?;
        let count = Bounty402Escrow::submissionCountCall::abi_decode_returns(&raw)
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        Ok(count.to::<u64>())
    }

    pub fn submit_work_calldata(bounty_id: u64, artifact_hash: B256, uri: &str) -> Vec<u8> {
        Bounty402Escrow::submitWorkCall {
            bountyId: U256::from(bounty_id),
            artifactHash: artifact_hash,
            uri: uri.to_string(),
        }
        .abi_encode()
    }

    pub fn claim_calldata(bounty_id: u64, submission_id: u64, signature: Vec<u8>) -> Vec<u8> {
        Bounty402Escrow::claimWithAttestationCall {
            bountyId: U256::from(bounty_id),
            submissionId: U256::from(submission_id),
            signature: signature.into(),
        }
        .abi_encode()
    }

    /// Simulate then send `submitWork`, returning the tx hash
    pub async fn submit_work(
        &self,
        sender: &TxSender,
        bounty_id: u64,
        artifact_hash: B256,
        uri: &str,
    ) -> ChainResult<B256> {
        let calldata = Self::submit_work_calldata(bounty_id, artifact_hash, uri);
        sender.simulate(self.address, &calldata).await?;
        sender.send(self.address, calldata).await
    }

    /// Simulate `claimWithAttestation` without spending gas
    pub async fn simulate_claim(
        &self,
        sender: &TxSender,
        bounty_id: u64,
        submission_id: u64,
        signature: Vec<u8>,
    ) -> ChainResult<()> {
        let calldata = Self::claim_calldata(bounty_id, submission_id, signature);
        sender.simulate(self.address, &calldata).await.map(|_| ())
    }

    /// Send the real claim transaction
    pub async fn claim_with_attestation(
        &self,
        sender: &TxSender,
        bounty_id: u64,
        submission_id: u64,
        signature: Vec<u8>,
    ) -> ChainResult<B256> {
        let calldata = Self::claim_calldata(bounty_id, submission_id, signature);
        sender.send(self.address, calldata).await
    }

    /// Pull the submission id out of a `SubmissionCreated` log, if any.
    ///
    /// Only logs emitted by the escrow contract itself are considered;
    /// non-matching logs are skipped rather than treated as errors.
    pub fn decode_submission_id(&self, receipt: &RpcReceipt) -> Option<u64> {
        for log in &receipt.logs {
            if log.address != self.address || log.topics.is_empty() {
                continue;
            }
            match Bounty402Escrow::SubmissionCreated::decode_raw_log(
                log.topics.iter().copied(),
                &log.data,
            ) {
                Ok(event) => return Some(event.submissionId.to::<u64>()),
                Err(_) => continue, // not SubmissionCreated
            }
        }
        None
    }

    /// Recover the submission id for a mined `submitWork`.
    ///
    /// Decode-then-fallback: the event log is authoritative, but if no log
    /// decodes (proxy indirection, ABI drift) the per-bounty submission
    /// counter is re-read. Never trust only one path.
    pub async fn recover_submission_id(
        &self,
        receipt: &RpcReceipt,
        bounty_id: u64,
    ) -> ChainResult<u64> {
        match self.decode_submission_id(receipt) {
            Some(id) if id > 0 => Ok(id),
            _ => {
                tracing::warn!(
                    bounty_id,
                    tx = %receipt.transaction_hash,
                    "SubmissionCreated log missing or undecodable, falling back to submissionCount"
                );
                self.submission_count(bounty_id).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RpcLog;
    use alloy_primitives::Bytes;

    fn escrow() -> EscrowClient {
        EscrowClient::new(
            Arc::new(RpcClient::new("http://localhost:0")),
            Address::repeat_byte(0xaa),
        )
    }

    fn receipt_with_logs(logs: Vec<RpcLog>) -> RpcReceipt {
        RpcReceipt {
            transaction_hash: B256::repeat_byte(0x01),
            status: Some(U256::from(1u8)),
            block_number: Some(U256::from(100u64)),
            gas_used: U256::from(50_000u64),
            from: Address::repeat_byte(0x02),
            to: Some(Address::repeat_byte(0xaa)),
            contract_address: None,
            logs,
        }
    }

    fn submission_created_log(address: Address, submission_id: u64) -> RpcLog {
        let event = Bounty402Escrow::SubmissionCreated {
            bountyId: U256::from(7u64),
            submissionId: U256::from(submission_id),
            submitter: Address::repeat_byte(0x03),
            artifactHash: B256::repeat_byte(0x04),
            uri: "https://example.test/api/artifacts/0x04".to_string(),
        };
        let log_data = event.encode_log_data();
        RpcLog {
            address,
            topics: log_data.topics().to_vec(),
            data: Bytes::from(log_data.data.to_vec()),
            log_index: Some(U256::ZERO),
            block_number: Some(U256::from(100u64)),
            transaction_hash: Some(B256::repeat_byte(0x01)),
        }
    }

    #[test]
    fn test_decode_submission_id_from_matching_log() {
        let escrow = escrow();
        let receipt = receipt_with_logs(vec![submission_created_log(escrow.address(), 5)]);
        assert_eq!(escrow.decode_submission_id(&receipt), Some(5));
    }

    #[test]
    fn test_foreign_address_log_skipped() {
        let escrow = escrow();
        let receipt =
            receipt_with_logs(vec![submission_created_log(Address::repeat_byte(0xbb), 5)]);
        assert_eq!(escrow.decode_submission_id(&receipt), None);
    }

    #[test]
    fn test_non_matching_abi_log_skipped() {
        let escrow = escrow();
        // Right address, wrong event shape: a bare Transfer-style log.
        let log = RpcLog {
            address: escrow.address(),
            topics: vec![B256::repeat_byte(0xdd)],
            data: Bytes::new(),
            log_index: Some(U256::ZERO),
            block_number: None,
            transaction_hash: None,
        };
        assert_eq!(escrow.decode_submission_id(&receipt_with_logs(vec![log])), None);
    }

    #[test]
    fn test_calldata_selectors_differ() {
        let submit = EscrowClient::submit_work_calldata(1, B256::ZERO, "uri");
        let claim = EscrowClient::claim_calldata(1, 1, vec![0u8; 65]);
        assert_ne!(&submit[..4], &claim[..4]);
    }
}
