//! The verify-claim sequence: buy an attestation, then claim the bounty

use std::time::Duration;

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use bounty402_chain::{EscrowClient, TxSender};
use bounty402_payment::PayingClient;
use bounty402_types::Attestation;

use crate::{OrchestratorError, OrchestratorResult};

/// Wall-clock budget for the verification round trip. The claim
/// transaction itself runs outside this window: once broadcast it is
/// awaited, never cancelled.
pub const VERIFY_DEADLINE: Duration = Duration::from_secs(20);

/// Body of `POST /api/agent/verify-claim`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyClaimRequest {
    pub bounty_id: u64,
    pub submission_id: u64,
    pub artifact_hash: B256,
    #[serde(default)]
    pub declared_client: Option<Address>,
}

/// Successful verify-claim: attestation bought, claim mined
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyClaimResponse {
    pub request_id: String,
    /// The 402 quote captured during discovery, when one was offered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x402: Option<Value>,
    pub verify_digest: B256,
    pub signature: String,
    pub claim_tx_hash: B256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_tx_hash: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_error: Option<String>,
    pub attestation: Attestation,
}

/// Validator worker response, as much of it as the claim path needs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerVerifyBody {
    pub ok: bool,
    #[serde(default)]
    pub job_registered: bool,
    #[serde(default)]
    pub job_id: Option<B256>,
    #[serde(default)]
    pub job_tx_hash: Option<B256>,
    #[serde(default)]
    pub job_error: Option<String>,
    pub digest: B256,
    pub attestation: Attestation,
}

/// Decode the attestation signature, rejecting empty or malformed values
pub fn require_signature(body: &WorkerVerifyBody) -> OrchestratorResult<Vec<u8>> {
    let raw = body.attestation.signature.trim();
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    if stripped.is_empty() {
        return Err(OrchestratorError::WorkerNoSignature);
    }
    let bytes = hex::decode(stripped).map_err(|_| OrchestratorError::WorkerNoSignature)?;
    if bytes.len() != 65 {
        return Err(OrchestratorError::WorkerNoSignature);
    }
    Ok(bytes)
}

/// Buys an attestation from the payment-gated validator and claims with it
pub struct VerifyClaimFlow {
    escrow: EscrowClient,
    sender: TxSender,
    payer: PayingClient,
    validator_verify_url: String,
}

impl VerifyClaimFlow {
    pub fn new(
        escrow: EscrowClient,
        sender: TxSender,
        payer: PayingClient,
        validator_verify_url: impl Into<String>,
    ) -> Self {
        Self {
            escrow,
            sender,
            payer,
            validator_verify_url: validator_verify_url.into(),
        }
    }

    /// The address that submits and therefore claims
    pub fn claimant(&self) -> Address {
        self.sender.address()
    }

    pub async fn verify_and_claim(
        &self,
        request: VerifyClaimRequest,
    ) -> OrchestratorResult<VerifyClaimResponse> {
        if request.submission_id == 0 {
            return Err(OrchestratorError::InvalidBody(
                "submissionId: must be at least 1".to_string(),
            ));
        }
        let request_id = Uuid::new_v4().to_string();

        // Everything up to broadcast runs under the deadline.
        let (quote, worker, signature) =
            tokio::time::timeout(VERIFY_DEADLINE, self.verify_phase(&request))
                .await
                .map_err(|_| {
                    OrchestratorError::VerifyClaimFailed(format!(
                        "verification exceeded {}s deadline",
                        VERIFY_DEADLINE.as_secs()
                    ))
                })??;

        let claim_tx_hash = self
            .escrow
            .claim_with_attestation(
                &self.sender,
                request.bounty_id,
                request.submission_id,
                signature.clone(),
            )
            .await
            .map_err(|e| OrchestratorError::VerifyClaimFailed(e.to_string()))?;
        let receipt = self
            .sender
            .wait_for_receipt(claim_tx_hash)
            .await
            .map_err(|e| OrchestratorError::VerifyClaimFailed(e.to_string()))?;
        if !receipt.succeeded() {
            return Err(OrchestratorError::VerifyClaimFailed(format!(
                "claim transaction {claim_tx_hash} reverted"
            )));
        }

        info!(
            request_id = %request_id,
            bounty_id = request.bounty_id,
            submission_id = request.submission_id,
            claim_tx_hash = %claim_tx_hash,
            "bounty claimed"
        );

        Ok(VerifyClaimResponse {
            request_id,
            x402: quote,
            verify_digest: worker.digest,
            signature: worker.attestation.signature.clone(),
            claim_tx_hash,
            job_id: worker.job_id,
            job_tx_hash: worker.job_tx_hash,
            job_error: worker.job_error,
            attestation: worker.attestation,
        })
    }

    /// Discovery, paid verification and claim simulation
    async fn verify_phase(
        &self,
        request: &VerifyClaimRequest,
    ) -> OrchestratorResult<(Option<Value>, WorkerVerifyBody, Vec<u8>)> {
        let body = serde_json::json!({
            "bountyId": request.bounty_id,
            "submissionId": request.submission_id,
            "claimant": self.claimant(),
            "artifactHash": request.artifact_hash,
            "client": self.payer.payer(),
            "declaredClient": request.declared_client,
        });

        // Unpaid discovery call, purely to surface the quote to the caller.
        // Any failure here is ignored; the paid call is authoritative.
        let quote = match self
            .payer
            .discover_quote(&self.validator_verify_url, &body)
            .await
        {
            Ok(Some(quote)) => serde_json::to_value(&quote).ok(),
            Ok(None) => None,
            Err(err) => {
                debug!(%err, "quote discovery failed, continuing");
                None
            }
        };

        let paid = self
            .payer
            .pay_and_post(&self.validator_verify_url, &body)
            .await
            .map_err(|e| OrchestratorError::WorkerVerifyFailed(e.to_string()))?;

        let status = paid.response.status();
        let text = paid
            .response
            .text()
            .await
            .map_err(|e| OrchestratorError::WorkerVerifyFailed(e.to_string()))?;
        if !status.is_success() {
            return Err(OrchestratorError::WorkerVerifyFailed(format!(
                "HTTP {status}: {text}"
            )));
        }
        let worker: WorkerVerifyBody = serde_json::from_str(&text)
            .map_err(|e| OrchestratorError::WorkerVerifyFailed(format!("bad body: {e}")))?;
        if !worker.ok {
            return Err(OrchestratorError::WorkerVerifyFailed(
                "validator reported not ok".to_string(),
            ));
        }
        let signature = require_signature(&worker)?;

        // Simulate before spending gas so revert reasons reach the caller.
        if let Err(err) = self
            .escrow
            .simulate_claim(
                &self.sender,
                request.bounty_id,
                request.submission_id,
                signature.clone(),
            )
            .await
        {
            warn!(%err, "claim simulation reverted");
            return Err(OrchestratorError::ClaimSimulationFailed(err.to_string()));
        }

        Ok((quote, worker, signature))
    }
}
