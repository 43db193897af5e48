//! Agent worker configuration

use alloy_primitives::Address;
use anyhow::{bail, Context};

use bounty402_payment::network_chain_id;

/// Which tool set this worker exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    TxExplainer,
    WalletExplainer,
    /// Every tool; used for local development
    All,
}

impl WorkerKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::TxExplainer => "tx-explainer",
            Self::WalletExplainer => "wallet-explainer",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Port to listen on (`PORT`, default 8788)
    pub port: u16,
    /// JSON-RPC endpoint (`RPC_URL`)
    pub rpc_url: String,
    /// x402 network name (`NETWORK`, default "base-sepolia")
    pub network: String,
    pub chain_id: u64,
    /// Payment token the wallet tools report balances in (`USDC_ADDRESS`)
    pub payment_token: Address,
    /// Tool set selector (`AGENT_KIND`); unset exposes everything
    pub kind: WorkerKind,
}

impl AgentConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = optional("PORT")?
            .map(|raw| raw.parse::<u16>().context("PORT must be a port number"))
            .transpose()?
            .unwrap_or(8788);

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

        let kind = match optional("AGENT_KIND")?.as_deref() {
            Some("tx-explainer") => WorkerKind::TxExplainer,
            Some("wallet-explainer") => WorkerKind::WalletExplainer,
            Some(other) => bail!("AGENT_KIND must be tx-explainer or wallet-explainer, got {other:?}"),
            None => WorkerKind::All,
        };

        Ok(Self {
            port,
            rpc_url: require("RPC_URL")?,
            network,
            chain_id,
            payment_token: require("USDC_ADDRESS")?
                .trim()
                .parse()
                .context("USDC_ADDRESS is not a valid address")?,
            kind,
        })
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
