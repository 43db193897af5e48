//! Attestation digest construction
//!
//! digest = keccak256(abi.encode(
//!     bytes32 tag, uint256 chainId, address escrow,
//!     uint256 bountyId, uint256 submissionId,
//!     address claimant, bytes32 artifactHash))
//!
//! A pure function of its inputs. Determinism is the security property the
//! on-chain claim verification relies on.

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;
use bounty402_types::Artifact;

/// Domain-separation tag mixed into every attestation digest
pub fn verification_tag() -> B256 {
    keccak256(b"Bounty402Verification")
}

/// Inputs bound together by one attestation digest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestInputs {
    pub chain_id: u64,
    pub escrow: Address,
    pub bounty_id: u64,
    pub submission_id: u64,
    pub claimant: Address,
    pub artifact_hash: B256,
}

/// Compute the attestation digest over the fixed ordered tuple
pub fn attestation_digest(inputs: &DigestInputs) -> B256 {
    let encoded = (
        verification_tag(),
        U256::from(inputs.chain_id),
        inputs.escrow,
        U256::from(inputs.bounty_id),
        U256::from(inputs.submission_id),
        inputs.claimant,
        inputs.artifact_hash,
    )
        .abi_encode();
    keccak256(encoded)
}

/// Content hash of a canonical artifact serialization
pub fn artifact_hash(artifact: &Artifact) -> B256 {
    keccak256(artifact.canonical_payload().as_bytes())
}

/// Content hash of an already-serialized canonical payload
pub fn payload_hash(payload: &str) -> B256 {
    keccak256(payload.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_inputs() -> DigestInputs {
        DigestInputs {
            chain_id: 84532,
            escrow: Address::repeat_byte(0xaa),
            bounty_id: 1,
            submission_id: 2,
            claimant: Address::repeat_byte(0xbb),
            artifact_hash: B256::repeat_byte(0xcc),
        }
    }

    #[test]
    fn test_digest_deterministic() {
        let inputs = base_inputs();
        assert_eq!(attestation_digest(&inputs), attestation_digest(&inputs));
    }

    #[test]
    fn test_every_field_changes_digest() {
        let base = attestation_digest(&base_inputs());

        let variants = [
            DigestInputs {
                chain_id: 8453,
                ..base_inputs()
            },
            DigestInputs {
                escrow: Address::repeat_byte(0xab),
                ..base_inputs()
            },
            DigestInputs {
                bounty_id: 2,
                ..base_inputs()
            },
            DigestInputs {
                submission_id: 3,
                ..base_inputs()
            },
            DigestInputs {
                claimant: Address::repeat_byte(0xbc),
                ..base_inputs()
            },
            DigestInputs {
                artifact_hash: B256::repeat_byte(0xcd),
                ..base_inputs()
            },
        ];

        for variant in variants {
            assert_ne!(base, attestation_digest(&variant), "{variant:?}");
        }
    }

    #[test]
    fn test_swapped_ids_differ() {
        // bountyId and submissionId occupy distinct slots; swapping them
        // must not collide.
        let a = attestation_digest(&DigestInputs {
            bounty_id: 1,
            submission_id: 2,
            ..base_inputs()
        });
        let b = attestation_digest(&DigestInputs {
            bounty_id: 2,
            submission_id: 1,
            ..base_inputs()
        });
        assert_ne!(a, b);
    }

    #[test]
    fn test_encoding_width() {
        // 7 head slots of 32 bytes each; addresses left-padded.
        let encoded = (
            verification_tag(),
            U256::from(84532u64),
            Address::repeat_byte(0xaa),
            U256::from(1u64),
            U256::from(2u64),
            Address::repeat_byte(0xbb),
            B256::repeat_byte(0xcc),
        )
            .abi_encode();
        assert_eq!(encoded.len(), 7 * 32);
    }
}
