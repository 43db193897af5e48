//! Validator server configuration
//!
//! Everything comes from the environment, loaded once at startup.
//! Required settings fail fast with the missing variable's name.

use alloy_primitives::Address;
use anyhow::{bail, Context};

use bounty402_payment::network_chain_id;

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Port to listen on (`PORT`, default 8787)
    pub port: u16,
    /// JSON-RPC endpoint (`RPC_URL`)
    pub rpc_url: String,
    /// x402 network name (`NETWORK`, default "base-sepolia")
    pub network: String,
    /// EVM chain id; derived from `NETWORK` unless `BOUNTY402_CHAIN_ID` overrides it
    pub chain_id: u64,
    /// Validator signing key, 0x-prefixed hex (`VALIDATOR_PRIVATE_KEY`)
    pub validator_key: String,
    /// Escrow contract (`BOUNTY402_ADDRESS`)
    pub escrow: Address,
    /// Registry contract (`AGENT_REGISTRY_ADDRESS`); job recording is
    /// skipped when unset
    pub registry: Option<Address>,
    /// Payment token (`USDC_ADDRESS`)
    pub payment_token: Address,
    /// Address payments are made out to (`RESOURCE_WALLET_ADDRESS`)
    pub pay_to: Address,
    /// x402 facilitator base URL (`FACILITATOR_URL`)
    pub facilitator_url: String,
    /// Origin the priced resource is advertised under (`PUBLIC_ORIGIN`)
    pub public_origin: String,
}

impl ValidatorConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = optional("PORT")?
            .map(|raw| raw.parse::<u16>().context("PORT must be a port number"))
            .transpose()?
            .unwrap_or(8787);

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

        Ok(Self {
            port,
            rpc_url: require("RPC_URL")?,
            network,
            chain_id,
            validator_key: require("VALIDATOR_PRIVATE_KEY")?,
            escrow: require_address("BOUNTY402_ADDRESS")?,
            registry: optional("AGENT_REGISTRY_ADDRESS")?
                .map(|raw| parse_address("AGENT_REGISTRY_ADDRESS", &raw))
                .transpose()?,
            payment_token: require_address("USDC_ADDRESS")?,
            pay_to: require_address("RESOURCE_WALLET_ADDRESS")?,
            facilitator_url: optional("FACILITATOR_URL")?
                .unwrap_or_else(|| "https://x402.org/facilitator".to_string()),
            public_origin: optional("PUBLIC_ORIGIN")?
                .unwrap_or_else(|| format!("http://localhost:{port}")),
        })
    }
}

pub fn require(name: &'static str) -> anyhow::Result<String> {
    match optional(name)? {
        Some(value) => Ok(value),
        None => bail!("missing required environment variable {name}"),
    }
}

pub fn optional(name: &'static str) -> anyhow::Result<Option<String>> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).context(name),
    }
}

pub fn require_address(name: &'static str) -> anyhow::Result<Address> {
    parse_address(name, &require(name)?)
}

pub fn parse_address(name: &'static str, raw: &str) -> anyhow::Result<Address> {
    raw.trim()
        .parse::<Address>()
        .with_context(|| format!("{name} is not a valid address: {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_rejects_garbage() {
        assert!(parse_address("X", "0x1234").is_err());
        assert!(parse_address("X", &format!("0x{}", "ab".repeat(20))).is_ok());
    }
}
