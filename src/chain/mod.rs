//! Chain client
//!
//! The only component that talks to the node and the only owner of signing
//! key material. Everything above it (venues, lifecycle manager, decision
//! loop) sees the chain through the [`ChainClient`] trait.

mod rpc_client;

#[cfg(test)]
pub(crate) mod mock;

pub use rpc_client::RpcChainClient;

use crate::types::{TransactionIntent, TransactionResult};
use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by chain reads. Submissions never return these directly;
/// they are folded into [`TransactionResult::Failed`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("rpc transport error: {0}")]
    Transport(String),

    #[error("node reported a zero gas price")]
    ZeroGasPrice,

    #[error("gas price overflow applying multiplier")]
    GasPriceOverflow,

    #[error("node unreachable: {0}")]
    Unreachable(String),
}

/// Node connection + signer
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address every outbound transaction is sent from
    fn sender(&self) -> Address;

    /// One-shot reachability check. Returns the current block number.
    async fn check_connectivity(&self) -> Result<u64, ChainError>;

    /// Network gas price scaled by the client's base multiplier. Never zero.
    async fn gas_price(&self) -> Result<u128, ChainError>;

    /// Next nonce for `account`, counting pending transactions.
    /// Must be queried fresh for every transaction.
    async fn nonce(&self, account: Address) -> Result<u64, ChainError>;

    /// Read-only contract call at the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Sign and submit. All failures come back as `Failed`.
    async fn submit(&self, intent: &TransactionIntent) -> TransactionResult;
}
