//! Gateway configuration

use alloy_primitives::Address;
use anyhow::{bail, Context};

use bounty402_payment::network_chain_id;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port to listen on (`PORT`, default 8789)
    pub port: u16,
    /// JSON-RPC endpoint (`RPC_URL`)
    pub rpc_url: String,
    /// x402 network name (`NETWORK`, default "base-sepolia")
    pub network: String,
    pub chain_id: u64,
    /// Escrow contract (`BOUNTY402_ADDRESS`)
    pub escrow: Address,
    /// Registry contract (`AGENT_REGISTRY_ADDRESS`)
    pub registry: Address,
    /// Key that submits work and claims bounties (`SUBMITTER_PRIVATE_KEY`)
    pub submitter_key: String,
    /// Key that pays for attestations (`BUYER_PRIVATE_KEY`); falls back
    /// to the submitter key
    pub buyer_key: String,
    /// Agent worker base URLs
    pub tx_explainer_url: String,
    pub wallet_agent_url: String,
    /// Validator worker base URL (`WORKER_URL`)
    pub worker_url: String,
    /// Origin artifact URIs are minted under (`PUBLIC_ORIGIN`)
    pub public_origin: String,
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = optional("PORT")?
            .map(|raw| raw.parse::<u16>().context("PORT must be a port number"))
            .transpose()?
            .unwrap_or(8789);

        let network = optional("NETWORK")?.unwrap_or_else(|| "base-sepolia".to_string());
        let chain_id = match optional("BOUNTY402_CHAIN_ID")? {
            Some(raw) => raw
                .parse::<u64>()
                .context("BOUNTY402_CHAIN_ID must be an integer")?,
            None => match network_chain_id(&network) {
                Some(id) => id,
                None => bail!("unknown NETWORK {network:?} and no BOUNTY402_CHAIN_ID set"),
            },
        };

        let submitter_key = require("SUBMITTER_PRIVATE_KEY")?;
        let buyer_key = optional("BUYER_PRIVATE_KEY")?.unwrap_or_else(|| submitter_key.clone());

        Ok(Self {
            port,
            rpc_url: require("RPC_URL")?,
            network,
            chain_id,
            escrow: require_address("BOUNTY402_ADDRESS")?,
            registry: require_address("AGENT_REGISTRY_ADDRESS")?,
            submitter_key,
            buyer_key,
            tx_explainer_url: require("TX_EXPLAINER_URL")?,
            wallet_agent_url: require("WALLET_AGENT_URL")?,
            worker_url: require("WORKER_URL")?,
            public_origin: optional("PUBLIC_ORIGIN")?
                .unwrap_or_else(|| format!("http://localhost:{port}")),
        })
    }

    /// Full URL of the validator's priced verify route
    pub fn validator_verify_url(&self) -> String {
        format!(
            "{}/api/validator/verify",
            self.worker_url.trim_end_matches('/')
        )
    }
}

fn require(name: &'static str) -> anyhow::Result<String> {
    match optional(name)? {
        Some(value) => Ok(value),
        None => bail!("missing required environment variable {name}"),
    }
}

fn optional(name: &'static str) -> anyhow::Result<Option<String>> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).context(name),
    }
}

fn require_address(name: &'static str) -> anyhow::Result<Address> {
    require(name)?
        .trim()
        .parse::<Address>()
        .with_context(|| format!("{name} is not a valid address"))
}
