//! Typed client for ERC-20 token reads

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};

use crate::contracts::Erc20;
use crate::{ChainError, ChainResult, RpcClient};

/// Topic0 of the standard ERC-20 Transfer event
pub fn transfer_topic() -> B256 {
    Erc20::Transfer::SIGNATURE_HASH
}

/// Best-effort ERC-20 metadata: each field independently nullable
#[derive(Debug, Clone)]
pub struct TokenMetadata {
    pub address: Address,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
}

/// Read helpers for one ERC-20 contract
#[derive(Debug, Clone)]
pub struct TokenClient {
    rpc: Arc<RpcClient>,
    address: Address,
}

impl TokenClient {
    pub fn new(rpc: Arc<RpcClient>, address: Address) -> Self {
        Self { rpc, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn balance_of(&self, owner: Address) -> ChainResult<U256> {
        let call = Erc20::balanceOfCall { owner };
        let raw = self.rpc.call(None, self.address, &call.abi_encode()).await?;
        Erc20::balanceOfCall::abi_decode_returns(&raw)
            .map_err(|e| ChainError::Decode(e.to_string()))
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> ChainResult<U256> {
        let call = Erc20::allowanceCall { owner, spender };
        let raw = self.rpc.call(None, self.address, &call.abi_encode()).await?;
        Erc20::allowanceCall::abi_decode_returns(&raw)
            .map_err(|e| ChainError::Decode(e.to_string()))
    }

    pub async fn name(&self) -> ChainResult<String> {
        let call = Erc20::nameCall {};
        let raw = self.rpc.call(None, self.address, &call.abi_encode()).await?;
        Erc20::nameCall::abi_decode_returns(&raw).map_err(|e| ChainError::Decode(e.to_string()))
    }

    pub async fn symbol(&self) -> ChainResult<String> {
        let call = Erc20::symbolCall {};
        let raw = self.rpc.call(None, self.address, &call.abi_encode()).await?;
        Erc20::symbolCall::abi_decode_returns(&raw).map_err(|e| ChainError::Decode(e.to_string()))
    }

    pub async fn decimals(&self) -> ChainResult<u8> {
        let call = Erc20::decimalsCall {};
        let raw = self.rpc.call(None, self.address, &call.abi_encode()).await?;
        Erc20::decimalsCall::abi_decode_returns(&raw)
            .map_err(|e| ChainError::Decode(e.to_string()))
    }

    /// Fetch name/symbol/decimals concurrently; partial success, not total
    /// failure — a contract without `name()` still reports its decimals.
    pub async fn metadata(&self) -> TokenMetadata {
        let (name, symbol, decimals) =
            tokio::join!(self.name(), self.symbol(), self.decimals());
        TokenMetadata {
            address: self.address,
            name: name.ok(),
            symbol: symbol.ok(),
            decimals: decimals.ok(),
        }
    }
}
