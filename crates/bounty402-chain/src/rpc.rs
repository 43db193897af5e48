//! JSON-RPC 2.0 client and wire types

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{ChainError, ChainResult};

/// A transaction as returned by `eth_getTransactionByHash`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub nonce: U256,
    #[serde(default)]
    pub block_number: Option<U256>,
    pub gas: U256,
    #[serde(default)]
    pub gas_price: Option<U256>,
}

/// A receipt as returned by `eth_getTransactionReceipt`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub status: Option<U256>,
    #[serde(default)]
    pub block_number: Option<U256>,
    pub gas_used: U256,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub logs: Vec<RpcLog>,
}

impl RpcReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.map(|s| s == U256::from(1u8)).unwrap_or(false)
    }
}

/// A log entry in a receipt or `eth_getLogs` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default)]
    pub log_index: Option<U256>,
    #[serde(default)]
    pub block_number: Option<U256>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Thin JSON-RPC 2.0 client over reqwest
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one JSON-RPC request and decode the result
    pub async fn request<R: DeserializeOwned>(&self, method: &str, params: Value) -> ChainResult<R> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response: RpcResponse<R> = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.error {
            // Revert data, when present, carries the reason string.
            let message = match err.data {
                Some(Value::String(data)) if !data.is_empty() => {
                    format!("{} ({})", err.message, data)
                }
                _ => err.message,
            };
            let error = ChainError::Rpc {
                code: err.code,
                message,
            };
            return Err(if error.is_revert() {
                ChainError::Revert(error.to_string())
            } else {
                error
            });
        }

        response
            .result
            .ok_or_else(|| ChainError::Decode(format!("{method}: empty result")))
    }

    pub async fn chain_id(&self) -> ChainResult<u64> {
        let id: U256 = self.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    pub async fn block_number(&self) -> ChainResult<u64> {
        let number: U256 = self.request("eth_blockNumber", json!([])).await?;
        Ok(number.to::<u64>())
    }

    pub async fn get_transaction(&self, hash: B256) -> ChainResult<RpcTransaction> {
        let tx: Option<RpcTransaction> = self
            .request("eth_getTransactionByHash", json!([hash]))
            .await?;
        tx.ok_or_else(|| ChainError::NotFound(format!("transaction {hash}")))
    }

    pub async fn get_receipt(&self, hash: B256) -> ChainResult<Option<RpcReceipt>> {
        self.request("eth_getTransactionReceipt", json!([hash]))
            .await
    }

    /// Receipt that must exist (tool queries over mined transactions)
    pub async fn require_receipt(&self, hash: B256) -> ChainResult<RpcReceipt> {
        self.get_receipt(hash)
            .await?
            .ok_or_else(|| ChainError::NotFound(format!("receipt {hash}")))
    }

    pub async fn get_balance(&self, address: Address) -> ChainResult<U256> {
        self.request("eth_getBalance", json!([address, "latest"]))
            .await
    }

    pub async fn get_code(&self, address: Address) -> ChainResult<Bytes> {
        self.request("eth_getCode", json!([address, "latest"])).await
    }

    pub async fn get_transaction_count(&self, address: Address) -> ChainResult<u64> {
        let nonce: U256 = self
            .request("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        Ok(nonce.to::<u64>())
    }

    pub async fn gas_price(&self) -> ChainResult<U256> {
        self.request("eth_gasPrice", json!([])).await
    }

    pub async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: &[u8],
    ) -> ChainResult<U256> {
        self.request(
            "eth_estimateGas",
            json!([{
                "from": from,
                "to": to,
                "data": format!("0x{}", hex::encode(data)),
            }]),
        )
        .await
    }

    /// `eth_call` against latest, optionally impersonating a sender
    pub async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        data: &[u8],
    ) -> ChainResult<Bytes> {
        let mut call = json!({
            "to": to,
            "data": format!("0x{}", hex::encode(data)),
        });
        if let Some(from) = from {
            call["from"] = json!(from);
        }
        self.request("eth_call", json!([call, "latest"])).await
    }

    pub async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<B256> {
        self.request(
            "eth_sendRawTransaction",
            json!([format!("0x{}", hex::encode(raw))]),
        )
        .await
    }

    /// `eth_getLogs` over an inclusive block range for one address, with an
    /// optional topic0 filter
    pub async fn get_logs(
        &self,
        address: Address,
        from_block: u64,
        to_block: u64,
        topic0: Option<B256>,
    ) -> ChainResult<Vec<RpcLog>> {
        let mut filter = json!({
            "address": address,
            "fromBlock": format!("0x{from_block:x}"),
            "toBlock": format!("0x{to_block:x}"),
        });
        if let Some(topic) = topic0 {
            filter["topics"] = json!([topic]);
        }
        self.request("eth_getLogs", json!([filter])).await
    }
}
