//! Transaction-centric tools: lookups, calldata decode and the summary

use async_trait::async_trait;
use alloy_primitives::U256;
use alloy_sol_types::{SolCall, SolEvent};
use serde_json::{json, Value};

use bounty402_chain::contracts::Erc20;
use bounty402_chain::{transfer_topic, RpcLog, RpcReceipt, RpcTransaction, TokenClient};

use crate::registry::{address_schema, execution, hash_schema, ChainTool, ToolSpec};
use crate::registry::{parse_address, parse_tx_hash};
use crate::{dec, ToolContext, ToolResult};

fn tx_json(tx: &RpcTransaction) -> Value {
    json!({
        "hash": tx.hash,
        "from": tx.from,
        "to": tx.to,
        "value": dec(tx.value),
        "input": tx.input,
        "nonce": dec(tx.nonce),
        "blockNumber": tx.block_number.map(dec),
        "gas": dec(tx.gas),
        "gasPrice": tx.gas_price.map(dec),
    })
}

fn receipt_json(receipt: &RpcReceipt) -> Value {
    json!({
        "transactionHash": receipt.transaction_hash,
        "status": if receipt.succeeded() { "success" } else { "reverted" },
        "blockNumber": receipt.block_number.map(dec),
        "gasUsed": dec(receipt.gas_used),
        "from": receipt.from,
        "to": receipt.to,
        "contractAddress": receipt.contract_address,
        "logCount": receipt.logs.len(),
    })
}

/// Decode calldata against the known ERC-20 function signatures.
/// Returns None when the selector matches nothing we know.
fn decode_erc20(input: &[u8]) -> Option<Value> {
    if input.len() < 4 {
        return None;
    }
    let selector: [u8; 4] = input[..4].try_into().ok()?;
    match selector {
        Erc20::transferCall::SELECTOR => {
            let call = Erc20::transferCall::abi_decode(input).ok()?;
            Some(json!({
                "function": "transfer",
                "to": call.to,
                "value": dec(call.value),
            }))
        }
        Erc20::approveCall::SELECTOR => {
            let call = Erc20::approveCall::abi_decode(input).ok()?;
            Some(json!({
                "function": "approve",
                "spender": call.spender,
                "value": dec(call.value),
            }))
        }
        Erc20::transferFromCall::SELECTOR => {
            let call = Erc20::transferFromCall::abi_decode(input).ok()?;
            Some(json!({
                "function": "transferFrom",
                "from": call.from,
                "to": call.to,
                "value": dec(call.value),
            }))
        }
        _ => None,
    }
}

/// Decode the standard Transfer logs out of a receipt's log set.
/// Non-Transfer and malformed logs are skipped, never fatal.
fn extract_transfers(logs: &[RpcLog]) -> Vec<Value> {
    let topic = transfer_topic();
    logs.iter()
        .filter(|log| log.topics.first() == Some(&topic))
        .filter_map(|log| {
            let decoded =
                Erc20::Transfer::decode_raw_log(log.topics.iter().copied(), &log.data).ok()?;
            Some(json!({
                "token": log.address,
                "from": decoded.from,
                "to": decoded.to,
                "value": dec(decoded.value),
            }))
        })
        .collect()
}

/// `get_transaction` — transaction fields by hash
pub struct GetTransaction {
    pub ctx: ToolContext,
}

#[async_trait]
impl ChainTool for GetTransaction {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_transaction".to_string(),
            description: "Fetch a transaction by hash".to_string(),
            parameters: hash_schema("hash"),
        }
    }

    async fn run(&self, args: Value) -> ToolResult<Value> {
        let hash = parse_tx_hash("get_transaction", &args, "hash")?;
        let tx = self
            .ctx
            .rpc
            .get_transaction(hash)
            .await
            .map_err(|e| execution("get_transaction", e))?;
        Ok(tx_json(&tx))
    }
}

/// `get_receipt` — receipt fields by hash
pub struct GetReceipt {
    pub ctx: ToolContext,
}

#[async_trait]
impl ChainTool for GetReceipt {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_receipt".to_string(),
            description: "Fetch a transaction receipt by hash".to_string(),
            parameters: hash_schema("hash"),
        }
    }

    async fn run(&self, args: Value) -> ToolResult<Value> {
        let hash = parse_tx_hash("get_receipt", &args, "hash")?;
        let receipt = self
            .ctx
            .rpc
            .require_receipt(hash)
            .await
            .map_err(|e| execution("get_receipt", e))?;
        Ok(receipt_json(&receipt))
    }
}

/// `decode_erc20_input` — classify a transaction's calldata
pub struct DecodeErc20Input {
    pub ctx: ToolContext,
}

#[async_trait]
impl ChainTool for DecodeErc20Input {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "decode_erc20_input".to_string(),
            description: "Decode a transaction's input data against the ERC-20 transfer, \
                          approve and transferFrom signatures"
                .to_string(),
            parameters: hash_schema("hash"),
        }
    }

    async fn run(&self, args: Value) -> ToolResult<Value> {
        let hash = parse_tx_hash("decode_erc20_input", &args, "hash")?;
        let tx = self
            .ctx
            .rpc
            .get_transaction(hash)
            .await
            .map_err(|e| execution("decode_erc20_input", e))?;
        match decode_erc20(&tx.input) {
            Some(decoded) => Ok(json!({ "ok": true, "decoded": decoded })),
            None => Ok(json!({
                "ok": false,
                "error": "input does not match a known ERC-20 function",
            })),
        }
    }
}

/// `get_contract_info` — bytecode presence plus best-effort token metadata
pub struct GetContractInfo {
    pub ctx: ToolContext,
}

#[async_trait]
impl ChainTool for GetContractInfo {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_contract_info".to_string(),
            description: "Check whether an address holds code and read its ERC-20 \
                          name/symbol/decimals where available"
                .to_string(),
            parameters: address_schema("address"),
        }
    }

    async fn run(&self, args: Value) -> ToolResult<Value> {
        let address = parse_address("get_contract_info", &args, "address")?;
        let code = self
            .ctx
            .rpc
            .get_code(address)
            .await
            .map_err(|e| execution("get_contract_info", e))?;
        if code.is_empty() {
            return Ok(json!({
                "address": address,
                "isContract": false,
                "name": null,
                "symbol": null,
                "decimals": null,
            }));
        }
        // Metadata reads fail independently; a non-token contract still
        // reports isContract: true with null fields.
        let meta = TokenClient::new(self.ctx.rpc.clone(), address).metadata().await;
        Ok(json!({
            "address": address,
            "isContract": true,
            "name": meta.name,
            "symbol": meta.symbol,
            "decimals": meta.decimals,
        }))
    }
}

/// `get_erc20_transfers` — Transfer logs of one mined transaction
pub struct GetErc20Transfers {
    pub ctx: ToolContext,
}

#[async_trait]
impl ChainTool for GetErc20Transfers {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_erc20_transfers".to_string(),
            description: "List the ERC-20 Transfer events emitted by a transaction".to_string(),
            parameters: hash_schema("hash"),
        }
    }

    async fn run(&self, args: Value) -> ToolResult<Value> {
        let hash = parse_tx_hash("get_erc20_transfers", &args, "hash")?;
        let receipt = self
            .ctx
            .rpc
            .require_receipt(hash)
            .await
            .map_err(|e| execution("get_erc20_transfers", e))?;
        let transfers = extract_transfers(&receipt.logs);
        Ok(json!({
            "transactionHash": hash,
            "count": transfers.len(),
            "transfers": transfers,
        }))
    }
}

/// `get_tx_summary` — one structured object per transaction: kind
/// classification, decoded call, value transfers, gas and status
pub struct GetTxSummary {
    pub ctx: ToolContext,
}

#[async_trait]
impl ChainTool for GetTxSummary {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_tx_summary".to_string(),
            description: "Summarize a transaction: status, classification, decoded \
                          call if recognized, and emitted token transfers"
                .to_string(),
            parameters: hash_schema("hash"),
        }
    }

    async fn run(&self, args: Value) -> ToolResult<Value> {
        let hash = parse_tx_hash("get_tx_summary", &args, "hash")?;
        let (tx, receipt) = tokio::try_join!(
            self.ctx.rpc.get_transaction(hash),
            self.ctx.rpc.require_receipt(hash),
        )
        .map_err(|e| execution("get_tx_summary", e))?;

        let decoded = decode_erc20(&tx.input);
        let kind = classify(&tx, decoded.as_ref());
        let transfers = extract_transfers(&receipt.logs);

        Ok(json!({
            "hash": hash,
            "kind": kind,
            "status": if receipt.succeeded() { "success" } else { "reverted" },
            "from": tx.from,
            "to": tx.to,
            "value": dec(tx.value),
            "gasUsed": dec(receipt.gas_used),
            "blockNumber": receipt.block_number.map(dec),
            "decoded": decoded,
            "transfers": transfers,
        }))
    }
}

fn classify(tx: &RpcTransaction, decoded: Option<&Value>) -> &'static str {
    if let Some(decoded) = decoded {
        return match decoded.get("function").and_then(Value::as_str) {
            Some("transfer") | Some("transferFrom") => "erc20-transfer",
            Some("approve") => "erc20-approve",
            _ => "unknown",
        };
    }
    if tx.to.is_none() {
        "contract-deploy"
    } else if tx.input.is_empty() && tx.value > U256::ZERO {
        "native-transfer"
    } else if tx.input.is_empty() {
        "empty"
    } else {
        "unknown"
    }
}

/// The full transaction-side tool set for one context
pub fn tx_tools(ctx: &ToolContext) -> Vec<Box<dyn ChainTool>> {
    vec![
        Box::new(GetTransaction { ctx: ctx.clone() }),
        Box::new(GetReceipt { ctx: ctx.clone() }),
        Box::new(DecodeErc20Input { ctx: ctx.clone() }),
        Box::new(GetContractInfo { ctx: ctx.clone() }),
        Box::new(GetErc20Transfers { ctx: ctx.clone() }),
        Box::new(GetTxSummary { ctx: ctx.clone() }),
    ]
}
