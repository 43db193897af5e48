//! Best-effort job recording on the registry contract

use alloy_primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use bounty402_chain::{RegistryClient, TxSender};
use bounty402_types::JobRecord;

/// Price of one verification in payment-token base units (0.01 USDC)
pub const JOB_PAYMENT_AMOUNT: u64 = 10_000;

/// Derive the job id from the payment proof: the keccak of the raw
/// `x-payment` header. Same payment, same job id.
pub fn job_id_from_payment(payment_header: &str) -> B256 {
    keccak256(payment_header.as_bytes())
}

/// What one recording attempt produced. Failure is data, not an error:
/// the attestation the job accompanies is valid either way.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub job_registered: bool,
    pub job_id: B256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_tx_hash: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_error: Option<String>,
}

/// Records jobs on the registry. A trait so the verify service can be
/// tested without a chain.
#[async_trait]
pub trait JobRecorder: Send + Sync {
    async fn record(&self, job: &JobRecord) -> JobOutcome;
}

/// Production recorder: one `registerJob` transaction, mined and confirmed
pub struct RegistryJobRecorder {
    registry: RegistryClient,
    sender: TxSender,
}

impl RegistryJobRecorder {
    pub fn new(registry: RegistryClient, sender: TxSender) -> Self {
        Self { registry, sender }
    }
}

#[async_trait]
impl JobRecorder for RegistryJobRecorder {
    async fn record(&self, job: &JobRecord) -> JobOutcome {
        match self.registry.register_job(&self.sender, job).await {
            Ok(tx_hash) => {
                info!(job_id = %job.job_id, tx_hash = %tx_hash, "job recorded");
                JobOutcome {
                    job_registered: true,
                    job_id: job.job_id,
                    job_tx_hash: Some(tx_hash),
                    job_error: None,
                }
            }
            Err(err) => {
                warn!(job_id = %job.job_id, %err, "job recording failed");
                JobOutcome {
                    job_registered: false,
                    job_id: job.job_id,
                    job_tx_hash: None,
                    job_error: Some(err.to_string()),
                }
            }
        }
    }
}

/// Assemble the record for one paid verification
pub fn build_job_record(
    payment_header: &str,
    agent: Address,
    client: Address,
    token: Address,
) -> JobRecord {
    JobRecord {
        job_id: job_id_from_payment(payment_header),
        agent,
        client,
        token,
        amount: U256::from(JOB_PAYMENT_AMOUNT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_job_id_is_keccak_of_header() {
        let header = "eyJ4NDAyVmVyc2lvbiI6MX0=";
        assert_eq!(job_id_from_payment(header), keccak256(header.as_bytes()));
        assert_ne!(
            job_id_from_payment(header),
            job_id_from_payment("different")
        );
    }

    #[test]
    fn test_build_job_record_amount() {
        let record = build_job_record(
            "header",
            address!("1111111111111111111111111111111111111111"),
            address!("2222222222222222222222222222222222222222"),
            address!("3333333333333333333333333333333333333333"),
        );
        assert_eq!(record.amount, U256::from(10_000u64));
        assert_eq!(record.job_id, keccak256(b"header"));
    }
}
