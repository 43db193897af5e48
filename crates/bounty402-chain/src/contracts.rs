//! Contract bindings
//!
//! The subset of the deployed escrow and registry ABIs these services
//! call. Field order in `bounties` matches the contract's storage struct;
//! index 0 (creator) doubles as the existence check.

use alloy_sol_types::sol;

sol! {
    /// Escrow contract holding bounty funds and verifying attestations
    #[derive(Debug)]
    contract Bounty402Escrow {
        event SubmissionCreated(
            uint256 indexed bountyId,
            uint256 indexed submissionId,
            address indexed submitter,
            bytes32 artifactHash,
            string uri
        );

        function submitWork(
            uint256 bountyId,
            bytes32 artifactHash,
            string uri
        ) returns (uint256 submissionId);

        function claimWithAttestation(
            uint256 bountyId,
            uint256 submissionId,
            bytes signature
        );

        function bounties(uint256 bountyId) view returns (
            address creator,
            uint64 deadline,
            uint8 status,
            address token,
            uint256 reward,
            bytes32 specHash,
            address validator
        );

        function submissionCount(uint256 bountyId) view returns (uint256);
    }

    /// Registry contract tracking agent jobs and reputation
    #[derive(Debug)]
    contract AgentRegistry {
        function registerJob(
            bytes32 jobId,
            address agent,
            address client,
            address token,
            uint256 amount
        );

        function getAgent(address agent) view returns (
            bool active,
            uint256 jobCount,
            uint256 feedbackCount,
            uint256 avgRatingScaled
        );
    }

    /// Minimal ERC-20 surface used by the tools and payment flows
    #[derive(Debug)]
    contract Erc20 {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function transfer(address to, uint256 value) returns (bool);
        function approve(address spender, uint256 value) returns (bool);
        function transferFrom(address from, address to, uint256 value) returns (bool);
        function balanceOf(address owner) view returns (uint256);
        function allowance(address owner, address spender) view returns (uint256);
        function name() view returns (string);
        function symbol() view returns (string);
        function decimals() view returns (uint8);
    }
}
