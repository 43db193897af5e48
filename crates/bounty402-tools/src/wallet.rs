//! Wallet-centric tools: balances and recent token activity

use async_trait::async_trait;
use alloy_sol_types::SolEvent;
use serde_json::{json, Value};

use bounty402_chain::contracts::Erc20;
use bounty402_chain::{transfer_topic, TokenClient};

use crate::registry::{address_schema, execution, parse_address, ChainTool, ToolSpec};
use crate::{dec, format_units, ToolContext, ToolError, ToolResult};

/// Default lookback for transfer history queries
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 20_000;
/// Hard ceiling; larger requests are rejected rather than clamped
pub const MAX_LOOKBACK_BLOCKS: u64 = 50_000;
/// Most recent entries returned to the caller
const MAX_TRANSFER_RESULTS: usize = 50;

/// `get_native_balance` — native coin balance of an address
pub struct GetNativeBalance {
    pub ctx: ToolContext,
}

#[async_trait]
impl ChainTool for GetNativeBalance {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_native_balance".to_string(),
            description: "Fetch the native coin balance of an address".to_string(),
            parameters: address_schema("address"),
        }
    }

    async fn run(&self, args: Value) -> ToolResult<Value> {
        let address = parse_address("get_native_balance", &args, "address")?;
        let wei = self
            .ctx
            .rpc
            .get_balance(address)
            .await
            .map_err(|e| execution("get_native_balance", e))?;
        Ok(json!({
            "address": address,
            "wei": dec(wei),
            "eth": format_units(wei, 18),
        }))
    }
}

/// `get_token_balance` — payment-token balance of an address
pub struct GetTokenBalance {
    pub ctx: ToolContext,
}

#[async_trait]
impl ChainTool for GetTokenBalance {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_token_balance".to_string(),
            description: "Fetch the marketplace payment token (USDC) balance of an address"
                .to_string(),
            parameters: address_schema("address"),
        }
    }

    async fn run(&self, args: Value) -> ToolResult<Value> {
        let address = parse_address("get_token_balance", &args, "address")?;
        let token = TokenClient::new(self.ctx.rpc.clone(), self.ctx.payment_token);
        let raw = token
            .balance_of(address)
            .await
            .map_err(|e| execution("get_token_balance", e))?;
        Ok(json!({
            "address": address,
            "token": self.ctx.payment_token,
            "raw": dec(raw),
            "usdc": format_units(raw, 6),
        }))
    }
}

/// `get_recent_token_transfers` — payment-token Transfer logs touching an
/// address within a bounded lookback window
pub struct GetRecentTokenTransfers {
    pub ctx: ToolContext,
}

#[async_trait]
impl ChainTool for GetRecentTokenTransfers {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_recent_token_transfers".to_string(),
            description: format!(
                "List recent payment-token transfers sent or received by an address; \
                 maxBlocks defaults to {DEFAULT_LOOKBACK_BLOCKS} and is capped at \
                 {MAX_LOOKBACK_BLOCKS}"
            ),
            parameters: json!({
                "type": "object",
                "properties": {
                    "address": { "type": "string", "pattern": "^0x[a-fA-F0-9]{40}$" },
                    "maxBlocks": { "type": "integer", "minimum": 1, "maximum": MAX_LOOKBACK_BLOCKS },
                },
                "required": ["address"]
            }),
        }
    }

    async fn run(&self, args: Value) -> ToolResult<Value> {
        let address = parse_address("get_recent_token_transfers", &args, "address")?;
        let max_blocks = lookback_window(&args)?;

        let head = self
            .ctx
            .rpc
            .block_number()
            .await
            .map_err(|e| execution("get_recent_token_transfers", e))?;
        let from_block = head.saturating_sub(max_blocks);

        let logs = self
            .ctx
            .rpc
            .get_logs(self.ctx.payment_token, from_block, head, Some(transfer_topic()))
            .await
            .map_err(|e| execution("get_recent_token_transfers", e))?;

        let mut transfers: Vec<Value> = logs
            .iter()
            .filter_map(|log| {
                let decoded =
                    Erc20::Transfer::decode_raw_log(log.topics.iter().copied(), &log.data).ok()?;
                if decoded.from != address && decoded.to != address {
                    return None;
                }
                Some(json!({
                    "from": decoded.from,
                    "to": decoded.to,
                    "value": dec(decoded.value),
                    "usdc": format_units(decoded.value, 6),
                    "blockNumber": log.block_number.map(dec),
                    "transactionHash": log.transaction_hash,
                    "direction": if decoded.from == address { "out" } else { "in" },
                }))
            })
            .collect();

        // Newest last in log order; keep the tail.
        if transfers.len() > MAX_TRANSFER_RESULTS {
            transfers = transfers.split_off(transfers.len() - MAX_TRANSFER_RESULTS);
        }

        Ok(json!({
            "address": address,
            "token": self.ctx.payment_token,
            "fromBlock": from_block.to_string(),
            "toBlock": head.to_string(),
            "count": transfers.len(),
            "transfers": transfers,
        }))
    }
}

fn lookback_window(args: &Value) -> ToolResult<u64> {
    let requested = match args.get("maxBlocks") {
        None | Some(Value::Null) => return Ok(DEFAULT_LOOKBACK_BLOCKS),
        Some(value) => value.as_u64().ok_or_else(|| ToolError::InvalidArgs {
            tool: "get_recent_token_transfers".to_string(),
            issues: vec!["maxBlocks: must be a positive integer".to_string()],
        })?,
    };
    if requested == 0 || requested > MAX_LOOKBACK_BLOCKS {
        return Err(ToolError::InvalidArgs {
            tool: "get_recent_token_transfers".to_string(),
            issues: vec![format!(
                "maxBlocks: must be between 1 and {MAX_LOOKBACK_BLOCKS}"
            )],
        });
    }
    Ok(requested)
}

/// The wallet-side tool set for one context
pub fn wallet_tools(ctx: &ToolContext) -> Vec<Box<dyn ChainTool>> {
    vec![
        Box::new(GetNativeBalance { ctx: ctx.clone() }),
        Box::new(GetTokenBalance { ctx: ctx.clone() }),
        Box::new(GetRecentTokenTransfers { ctx: ctx.clone() }),
    ]
}

/// Everything: the tool set served by a full agent worker
pub fn all_tools(ctx: &ToolContext) -> Vec<Box<dyn ChainTool>> {
    let mut tools = crate::tx::tx_tools(ctx);
    tools.extend(wallet_tools(ctx));
    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookback_window_default_and_cap() {
        assert_eq!(lookback_window(&json!({})).unwrap(), DEFAULT_LOOKBACK_BLOCKS);
        assert_eq!(lookback_window(&json!({"maxBlocks": 100})).unwrap(), 100);

        let err = lookback_window(&json!({"maxBlocks": 50_001})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs { .. }));

        let err = lookback_window(&json!({"maxBlocks": 0})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs { .. }));

        let err = lookback_window(&json!({"maxBlocks": "lots"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs { .. }));
    }
}
