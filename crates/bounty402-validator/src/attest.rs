//! Digest construction and signing for one verify request

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use bounty402_crypto::{attestation_digest, DigestInputs, LocalSigner};
use bounty402_types::Attestation;

use crate::{ValidatorError, ValidatorResult};

/// Body of a verify request, already JSON-decoded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub bounty_id: u64,
    pub submission_id: u64,
    pub claimant: Address,
    pub artifact_hash: B256,
    /// Caller address as seen by the gateway
    pub client: Address,
    /// Client the caller wants the job attributed to, if different
    #[serde(default)]
    pub declared_client: Option<Address>,
}

impl VerifyRequest {
    /// Field checks beyond what deserialization enforces
    pub fn validate(&self) -> ValidatorResult<()> {
        if self.submission_id == 0 {
            return Err(ValidatorError::InvalidRequest {
                field: "submissionId",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.claimant == Address::ZERO {
            return Err(ValidatorError::InvalidRequest {
                field: "claimant",
                reason: "must not be the zero address".to_string(),
            });
        }
        if self.artifact_hash == B256::ZERO {
            return Err(ValidatorError::InvalidRequest {
                field: "artifactHash",
                reason: "must not be zero".to_string(),
            });
        }
        Ok(())
    }

    /// Client the job record should name
    pub fn effective_client(&self) -> Address {
        self.declared_client.unwrap_or(self.client)
    }
}

/// Binds the validator key to one escrow deployment
#[derive(Debug, Clone)]
pub struct AttestationService {
    signer: LocalSigner,
    chain_id: u64,
    escrow: Address,
}

impl AttestationService {
    pub fn new(signer: LocalSigner, chain_id: u64, escrow: Address) -> Self {
        Self {
            signer,
            chain_id,
            escrow,
        }
    }

    pub fn validator_address(&self) -> Address {
        self.signer.address()
    }

    /// The digest this service would sign for a request
    pub fn digest(&self, request: &VerifyRequest) -> B256 {
        attestation_digest(&DigestInputs {
            chain_id: self.chain_id,
            escrow: self.escrow,
            bounty_id: request.bounty_id,
            submission_id: request.submission_id,
            claimant: request.claimant,
            artifact_hash: request.artifact_hash,
        })
    }

    /// Validate, compute the digest and sign it
    pub fn attest(&self, request: &VerifyRequest) -> ValidatorResult<(B256, Attestation)> {
        request.validate()?;
        let digest = self.digest(request);
        let signature = self
            .signer
            .sign_digest_hex(&digest)
            .map_err(|e| ValidatorError::Signing(e.to_string()))?;
        Ok((
            digest,
            Attestation {
                validator: self.signer.address(),
                signature,
                digest,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use bounty402_crypto::recover_digest_signer;

    fn request() -> VerifyRequest {
        VerifyRequest {
            bounty_id: 3,
            submission_id: 1,
            claimant: address!("1111111111111111111111111111111111111111"),
            artifact_hash: B256::repeat_byte(0xaa),
            client: address!("2222222222222222222222222222222222222222"),
            declared_client: None,
        }
    }

    fn service() -> AttestationService {
        let signer = LocalSigner::from_hex(
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        AttestationService::new(
            signer,
            84_532,
            address!("4444444444444444444444444444444444444444"),
        )
    }

    #[test]
    fn test_digest_is_deterministic_and_input_sensitive() {
        let svc = service();
        let base = svc.digest(&request());
        assert_eq!(base, svc.digest(&request()));

        let mut changed = request();
        changed.submission_id = 2;
        assert_ne!(base, svc.digest(&changed));

        let mut changed = request();
        changed.artifact_hash = B256::repeat_byte(0xab);
        assert_ne!(base, svc.digest(&changed));

        let other_escrow = AttestationService::new(
            service().signer,
            84_532,
            address!("5555555555555555555555555555555555555555"),
        );
        assert_ne!(base, other_escrow.digest(&request()));
    }

    #[test]
    fn test_attestation_recovers_to_validator() {
        let svc = service();
        let (digest, attestation) = svc.attest(&request()).unwrap();
        assert_eq!(attestation.digest, digest);

        let raw = hex::decode(attestation.signature.trim_start_matches("0x")).unwrap();
        let recovered = recover_digest_signer(&digest, &raw).unwrap();
        assert_eq!(recovered, svc.validator_address());
    }

    #[test]
    fn test_zero_submission_rejected() {
        let mut bad = request();
        bad.submission_id = 0;
        assert!(service().attest(&bad).is_err());
    }

    #[test]
    fn test_effective_client_prefers_declared() {
        let mut req = request();
        assert_eq!(req.effective_client(), req.client);
        let declared = address!("9999999999999999999999999999999999999999");
        req.declared_client = Some(declared);
        assert_eq!(req.effective_client(), declared);
    }
}
