//! The paid verify operation: attest, then record the job

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use bounty402_types::Attestation;

use crate::attest::{AttestationService, VerifyRequest};
use crate::jobs::{build_job_record, JobRecorder};
use crate::ValidatorResult;

/// Full response body for a paid verification
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub ok: bool,
    pub job_registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_tx_hash: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_error: Option<String>,
    pub digest: B256,
    pub attestation: Attestation,
    /// Echo of the request body, for the caller's audit trail
    pub received: Value,
    /// RFC 3339 server time
    pub timestamp: String,
}

/// Attestation plus best-effort job recording behind one entry point
pub struct VerifyService {
    attestation: AttestationService,
    recorder: Option<Arc<dyn JobRecorder>>,
    payment_token: Address,
}

impl VerifyService {
    pub fn new(
        attestation: AttestationService,
        recorder: Option<Arc<dyn JobRecorder>>,
        payment_token: Address,
    ) -> Self {
        Self {
            attestation,
            recorder,
            payment_token,
        }
    }

    pub fn validator_address(&self) -> Address {
        self.attestation.validator_address()
    }

    /// Handle one verified, paid request.
    ///
    /// The attestation is computed first and stands regardless of what the
    /// job recording does; recording failures surface in `jobError` only.
    pub async fn verify(
        &self,
        request: VerifyRequest,
        payment_header: Option<&str>,
    ) -> ValidatorResult<VerifyResponse> {
        let (digest, attestation) = self.attestation.attest(&request)?;
        info!(
            bounty_id = request.bounty_id,
            submission_id = request.submission_id,
            claimant = %request.claimant,
            digest = %digest,
            "attestation signed"
        );

        let mut job_registered = false;
        let mut job_id = None;
        let mut job_tx_hash = None;
        let mut job_error = None;

        match (&self.recorder, payment_header) {
            (Some(recorder), Some(header)) => {
                let record = build_job_record(
                    header,
                    request.claimant,
                    request.effective_client(),
                    self.payment_token,
                );
                let outcome = recorder.record(&record).await;
                job_registered = outcome.job_registered;
                job_id = Some(outcome.job_id);
                job_tx_hash = outcome.job_tx_hash;
                job_error = outcome.job_error;
            }
            (Some(_), None) => {
                job_error = Some("no payment header available for job id".to_string());
            }
            (None, _) => {
                job_error = Some("registry recording not configured".to_string());
            }
        }

        let received = serde_json::to_value(&request).unwrap_or(Value::Null);
        Ok(VerifyResponse {
            ok: true,
            job_registered,
            job_id,
            job_tx_hash,
            job_error,
            digest,
            attestation,
            received,
            timestamp: Utc::now().to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{job_id_from_payment, JobOutcome};
    use alloy_primitives::address;
    use async_trait::async_trait;
    use bounty402_crypto::LocalSigner;
    use bounty402_types::JobRecord;
    use std::sync::Mutex;

    struct RecordingSink {
        fail: bool,
        seen: Mutex<Vec<JobRecord>>,
    }

    #[async_trait]
    impl JobRecorder for RecordingSink {
        async fn record(&self, job: &JobRecord) -> JobOutcome {
            self.seen.lock().unwrap().push(job.clone());
            if self.fail {
                JobOutcome {
                    job_registered: false,
                    job_id: job.job_id,
                    job_tx_hash: None,
                    job_error: Some("nonce too low".to_string()),
                }
            } else {
                JobOutcome {
                    job_registered: true,
                    job_id: job.job_id,
                    job_tx_hash: Some(B256::repeat_byte(0x77)),
                    job_error: None,
                }
            }
        }
    }

    fn request() -> VerifyRequest {
        VerifyRequest {
            bounty_id: 1,
            submission_id: 1,
            claimant: address!("1111111111111111111111111111111111111111"),
            artifact_hash: B256::repeat_byte(0xaa),
            client: address!("2222222222222222222222222222222222222222"),
            declared_client: Some(address!("9999999999999999999999999999999999999999")),
        }
    }

    fn service(sink: Arc<RecordingSink>) -> VerifyService {
        let attestation = AttestationService::new(
            LocalSigner::random(),
            84_532,
            address!("4444444444444444444444444444444444444444"),
        );
        VerifyService::new(
            attestation,
            Some(sink),
            address!("3333333333333333333333333333333333333333"),
        )
    }

    #[tokio::test]
    async fn test_verify_attests_and_records() {
        let sink = Arc::new(RecordingSink {
            fail: false,
            seen: Mutex::new(Vec::new()),
        });
        let response = service(sink.clone())
            .verify(request(), Some("payment-header"))
            .await
            .unwrap();

        assert!(response.ok);
        assert!(response.job_registered);
        assert_eq!(response.job_id, Some(job_id_from_payment("payment-header")));
        assert_eq!(response.attestation.digest, response.digest);

        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        // declaredClient wins over client for attribution.
        assert_eq!(
            seen[0].client,
            address!("9999999999999999999999999999999999999999")
        );
        assert_eq!(seen[0].agent, request().claimant);
    }

    #[tokio::test]
    async fn test_recording_failure_keeps_attestation() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            seen: Mutex::new(Vec::new()),
        });
        let response = service(sink)
            .verify(request(), Some("payment-header"))
            .await
            .unwrap();

        assert!(response.ok);
        assert!(!response.job_registered);
        assert_eq!(response.job_error.as_deref(), Some("nonce too low"));
        // The signature is still present and bound to the digest.
        assert_eq!(response.attestation.digest, response.digest);
    }

    #[tokio::test]
    async fn test_missing_payment_header_reported_not_fatal() {
        let sink = Arc::new(RecordingSink {
            fail: false,
            seen: Mutex::new(Vec::new()),
        });
        let response = service(sink.clone()).verify(request(), None).await.unwrap();
        assert!(response.ok);
        assert!(!response.job_registered);
        assert!(response.job_error.is_some());
        assert!(sink.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_side_effects() {
        let sink = Arc::new(RecordingSink {
            fail: false,
            seen: Mutex::new(Vec::new()),
        });
        let mut bad = request();
        bad.submission_id = 0;
        assert!(service(sink.clone()).verify(bad, Some("h")).await.is_err());
        assert!(sink.seen.lock().unwrap().is_empty());
    }
}
