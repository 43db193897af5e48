//! Bounty402 Orchestrator - the run-agent and verify-claim sequences
//!
//! Drives the full marketplace loop on behalf of a browser: run an agent
//! against a bounty, submit the resulting artifact on-chain, then buy a
//! validator attestation and claim the reward. Each failure carries a
//! stable machine code that the gateway maps to an HTTP envelope.

pub mod agent_client;
pub mod claim;
pub mod run;

pub use agent_client::*;
pub use claim::*;
pub use run::*;

use thiserror::Error;

/// Orchestration failures, one variant per caller-visible code
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Bounty {0} not found")]
    BountyNotFound(u64),

    #[error("Bounty {bounty_id} is not open (status {status})")]
    BountyNotOpen { bounty_id: u64, status: u8 },

    #[error("Bounty {bounty_id} deadline {deadline} has passed")]
    BountyExpired { bounty_id: u64, deadline: u64 },

    #[error("Agent call failed: {0}")]
    AgentFailed(String),

    #[error("Agent returned unparseable JSON: {0}")]
    AgentBadJson(String),

    #[error("submitWork failed: {0}")]
    SubmitWorkFailed(String),

    #[error("Validator verify call failed: {0}")]
    WorkerVerifyFailed(String),

    #[error("Validator response carried no signature")]
    WorkerNoSignature,

    #[error("Claim simulation reverted: {0}")]
    ClaimSimulationFailed(String),

    #[error("Verify-claim failed: {0}")]
    VerifyClaimFailed(String),
}

impl OrchestratorError {
    /// Machine code for the gateway's error envelope
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::BountyNotFound(_) => "BOUNTY_NOT_FOUND",
            Self::BountyNotOpen { .. } => "BOUNTY_NOT_OPEN",
            Self::BountyExpired { .. } => "BOUNTY_EXPIRED",
            Self::AgentFailed(_) => "AGENT_FAILED",
            Self::AgentBadJson(_) => "AGENT_BAD_JSON",
            Self::SubmitWorkFailed(_) => "SUBMIT_WORK_FAILED",
            Self::WorkerVerifyFailed(_) => "WORKER_VERIFY_FAILED",
            Self::WorkerNoSignature => "WORKER_NO_SIGNATURE",
            Self::ClaimSimulationFailed(_) => "CLAIM_SIMULATION_FAILED",
            Self::VerifyClaimFailed(_) => "VERIFY_CLAIM_FAILED",
        }
    }

    /// HTTP status the code maps to
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidBody(_)
            | Self::BountyNotFound(_)
            | Self::BountyNotOpen { .. }
            | Self::BountyExpired { .. }
            | Self::ClaimSimulationFailed(_) => 400,
            Self::AgentFailed(_) | Self::AgentBadJson(_) => 502,
            Self::SubmitWorkFailed(_)
            | Self::WorkerVerifyFailed(_)
            | Self::WorkerNoSignature
            | Self::VerifyClaimFailed(_) => 500,
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_and_status_mapping() {
        assert_eq!(OrchestratorError::InvalidBody(String::new()).status(), 400);
        assert_eq!(
            OrchestratorError::AgentFailed(String::new()).code(),
            "AGENT_FAILED"
        );
        assert_eq!(OrchestratorError::AgentFailed(String::new()).status(), 502);
        assert_eq!(
            OrchestratorError::ClaimSimulationFailed(String::new()).status(),
            400
        );
        assert_eq!(OrchestratorError::WorkerNoSignature.status(), 500);
    }
}
