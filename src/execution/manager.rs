//! Transaction Lifecycle Manager
//!
//! Sequences gas pricing, nonce allocation and submission for approvals and
//! swaps. Nonces are never cached or batched: each transaction reads the
//! pending count immediately before it is built, so two sequential legs
//! always land on consecutive nonces.
//!
//! No retry at this layer. A failed build or submission is returned as
//! `TransactionResult::Failed` and the caller moves on.

use super::TxError;
use crate::chain::ChainClient;
use crate::types::{scale_by, ContractCall, TransactionIntent, TransactionResult};
use alloy::primitives::Address;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds and submits transactions for the wallet held by the chain client
pub struct TransactionManager {
    chain: Arc<dyn ChainClient>,
}

impl TransactionManager {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    /// Wallet address all transactions are sent from
    pub fn sender(&self) -> Address {
        self.chain.sender()
    }

    /// Price, sequence and submit one contract call
    pub async fn execute(&self, call: ContractCall) -> TransactionResult {
        let intent = match self.build_intent(&call).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(
                    "{} {} not submitted: could not assemble transaction: {}",
                    call.venue, call.operation, e
                );
                return TransactionResult::Failed(e);
            }
        };

        debug!(
            "{} {}: to={:?} nonce={} gas_limit={} gas_price={} calldata={} bytes",
            call.venue,
            call.operation,
            intent.to,
            intent.nonce,
            intent.gas_limit,
            intent.gas_price,
            intent.data.len()
        );

        let result = self.chain.submit(&intent).await;
        if let TransactionResult::Failed(e) = &result {
            warn!(
                "{} {} rejected (nonce {}): {}",
                call.venue, call.operation, intent.nonce, e
            );
        }
        result
    }

    /// Gas price first, then a fresh pending nonce, then the intent
    async fn build_intent(&self, call: &ContractCall) -> Result<TransactionIntent, TxError> {
        let base_price = self
            .chain
            .gas_price()
            .await
            .map_err(|e| TxError::GasPrice(e.to_string()))?;

        let gas_price = scale_by(base_price, call.profile.gas_price_multiplier)
            .filter(|price| *price > 0)
            .ok_or_else(|| {
                TxError::GasPrice(format!(
                    "multiplier {} on base {} wei gives no usable price",
                    call.profile.gas_price_multiplier, base_price
                ))
            })?;

        let sender = self.chain.sender();
        let nonce = self
            .chain
            .nonce(sender)
            .await
            .map_err(|e| TxError::Nonce(e.to_string()))?;

        Ok(TransactionIntent {
            from: sender,
            to: call.target,
            data: call.data.clone(),
            gas_limit: call.profile.gas_limit,
            gas_price,
            nonce,
        })
    }
}
