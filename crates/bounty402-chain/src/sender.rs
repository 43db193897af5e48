//! Locally-signed legacy transaction construction and submission
//!
//! Transactions are EIP-155 legacy form: RLP of
//! [nonce, gasPrice, gas, to, value, data, chainId, 0, 0] is hashed for
//! signing, then re-encoded with [.., v, r, s] where
//! v = 35 + recoveryId + 2 * chainId. A broadcast transaction is never
//! cancelled; it can only be waited on or abandoned.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, Header};
use bounty402_crypto::LocalSigner;

use crate::{ChainError, ChainResult, RpcClient, RpcReceipt};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_RECEIPT_WAIT: Duration = Duration::from_secs(60);

struct LegacyTx {
    nonce: u64,
    gas_price: U256,
    gas_limit: U256,
    to: Address,
    value: U256,
    data: Bytes,
}

impl LegacyTx {
    fn encode_body(&self, out: &mut Vec<u8>) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.data.encode(out);
    }

    /// RLP payload hashed for EIP-155 signing
    fn signing_hash(&self, chain_id: u64) -> B256 {
        let mut body = Vec::new();
        self.encode_body(&mut body);
        chain_id.encode(&mut body);
        0u8.encode(&mut body);
        0u8.encode(&mut body);

        let mut encoded = Vec::new();
        Header {
            list: true,
            payload_length: body.len(),
        }
        .encode(&mut encoded);
        encoded.extend_from_slice(&body);
        keccak256(encoded)
    }

    /// Final raw transaction bytes with the signature appended
    fn encode_signed(&self, v: u64, r: U256, s: U256) -> Vec<u8> {
        let mut body = Vec::new();
        self.encode_body(&mut body);
        v.encode(&mut body);
        r.encode(&mut body);
        s.encode(&mut body);

        let mut encoded = Vec::new();
        Header {
            list: true,
            payload_length: body.len(),
        }
        .encode(&mut encoded);
        encoded.extend_from_slice(&body);
        encoded
    }
}

/// Signs and broadcasts contract calls from one local key
#[derive(Debug, Clone)]
pub struct TxSender {
    rpc: Arc<RpcClient>,
    signer: LocalSigner,
    chain_id: u64,
}

impl TxSender {
    pub fn new(rpc: Arc<RpcClient>, signer: LocalSigner, chain_id: u64) -> Self {
        Self {
            rpc,
            signer,
            chain_id,
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn rpc(&self) -> &Arc<RpcClient> {
        &self.rpc
    }

    /// `eth_call` the contract as this sender (simulation before sending)
    pub async fn simulate(&self, to: Address, data: &[u8]) -> ChainResult<Bytes> {
        self.rpc.call(Some(self.address()), to, data).await
    }

    /// Sign and broadcast a contract call, returning the transaction hash
    pub async fn send(&self, to: Address, data: Vec<u8>) -> ChainResult<B256> {
        let from = self.address();
        let nonce = self.rpc.get_transaction_count(from).await?;
        let gas_price = self.rpc.gas_price().await?;
        let estimated = self.rpc.estimate_gas(from, to, &data).await?;
        // 20% headroom over the estimate.
        let gas_limit = estimated + estimated / U256::from(5u8);

        let tx = LegacyTx {
            nonce,
            gas_price,
            gas_limit,
            to,
            value: U256::ZERO,
            data: Bytes::from(data),
        };

        let hash = tx.signing_hash(self.chain_id);
        let (signature, recovery_id) = self
            .signer
            .sign_prehash_raw(&hash)
            .map_err(|e| ChainError::Signing(e.to_string()))?;

        let sig_bytes = signature.to_bytes();
        let r = U256::from_be_slice(&sig_bytes[..32]);
        let s = U256::from_be_slice(&sig_bytes[32..]);
        let v = 35 + u64::from(recovery_id.to_byte()) + 2 * self.chain_id;

        let raw = tx.encode_signed(v, r, s);
        let tx_hash = self.rpc.send_raw_transaction(&raw).await?;
        tracing::debug!(%tx_hash, %to, nonce, "transaction broadcast");
        Ok(tx_hash)
    }

    /// Poll until the transaction is mined or the wait window elapses
    pub async fn wait_for_receipt(&self, tx_hash: B256) -> ChainResult<RpcReceipt> {
        self.wait_for_receipt_within(tx_hash, DEFAULT_RECEIPT_WAIT)
            .await
    }

    pub async fn wait_for_receipt_within(
        &self,
        tx_hash: B256,
        wait: Duration,
    ) -> ChainResult<RpcReceipt> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            if let Some(receipt) = self.rpc.get_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ChainError::ReceiptTimeout(tx_hash.to_string()));
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_hash_changes_with_chain_id() {
        let tx = LegacyTx {
            nonce: 1,
            gas_price: U256::from(1_000_000_000u64),
            gas_limit: U256::from(100_000u64),
            to: Address::repeat_byte(0x11),
            value: U256::ZERO,
            data: Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb]),
        };
        assert_ne!(tx.signing_hash(84532), tx.signing_hash(8453));
    }

    #[test]
    fn test_signed_encoding_is_list(){
        let tx = LegacyTx {
            nonce: 0,
            gas_price: U256::from(1u8),
            gas_limit: U256::from(21_000u64),
            to: Address::repeat_byte(0x22),
            value: U256::ZERO,
            data: Bytes::new(),
        };
        let raw = tx.encode_signed(169103, U256::from(1u8), U256::from(2u8));
        // Long-form list header: 0xf8 prefix for payloads of 56..=255 bytes.
        assert!(raw[0] >= 0xc0);
    }
}
