//! alloy-backed chain client
//!
//! Reads go straight to the node over the configured transport. Writes are
//! legacy (gasPrice) transactions with every field pinned by the caller,
//! signed locally with the wallet key and pushed with
//! `eth_sendRawTransaction`.

use super::{ChainClient, ChainError};
use crate::execution::TxError;
use crate::types::{scale_by, TransactionIntent, TransactionResult};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::providers::Provider;
use alloy::rpc::types::eth::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Chain client over any alloy provider
pub struct RpcChainClient<P> {
    provider: Arc<P>,
    wallet: EthereumWallet,
    sender: Address,
    chain_id: u64,
    /// Applied to the network gas price before any per-operation multiplier
    gas_price_multiplier: Decimal,
}

impl<P: Provider + 'static> RpcChainClient<P> {
    /// Create a new RpcChainClient. The signer is moved in and never exposed again.
    pub fn new(
        provider: Arc<P>,
        signer: PrivateKeySigner,
        chain_id: u64,
        gas_price_multiplier: Decimal,
    ) -> Self {
        let sender = signer.address();
        Self {
            provider,
            wallet: EthereumWallet::from(signer),
            sender,
            chain_id,
            gas_price_multiplier,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl<P: Provider + 'static> ChainClient for RpcChainClient<P> {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn check_connectivity(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::Unreachable(e.to_string()))
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        let base = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        if base == 0 {
            return Err(ChainError::ZeroGasPrice);
        }

        let scaled = scale_by(base, self.gas_price_multiplier).ok_or(ChainError::GasPriceOverflow)?;
        debug!(
            "Gas price: base {} wei x {} = {} wei",
            base, self.gas_price_multiplier, scaled
        );
        Ok(scaled.max(1))
    }

    async fn nonce(&self, account: Address) -> Result<u64, ChainError> {
        self.provider
            .get_transaction_count(account)
            .pending()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let tx = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(to)
            .with_input(data);

        self.provider
            .call(tx)
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))
    }

    async fn submit(&self, intent: &TransactionIntent) -> TransactionResult {
        let tx = TransactionRequest::default()
            .with_from(intent.from)
            .with_to(intent.to)
            .with_input(intent.data.clone())
            .with_nonce(intent.nonce)
            .with_gas_limit(intent.gas_limit)
            .with_gas_price(intent.gas_price)
            .with_chain_id(self.chain_id);

        let envelope = match tx.build(&self.wallet).await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Signing failed for nonce {}: {}", intent.nonce, e);
                return TransactionResult::Failed(TxError::Signing(e.to_string()));
            }
        };

        let raw = envelope.encoded_2718();
        match self.provider.send_raw_transaction(&raw).await {
            Ok(pending) => {
                let tx_hash = *pending.tx_hash();
                info!("Transaction sent with hash: {:?} (nonce {})", tx_hash, intent.nonce);
                TransactionResult::Submitted(tx_hash)
            }
            Err(e) => {
                warn!("Error sending transaction (nonce {}): {}", intent.nonce, e);
                TransactionResult::Failed(TxError::from_rejection(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256, U256};
    use alloy::providers::mock::Asserter;
    use alloy::providers::ProviderBuilder;
    use rust_decimal_macros::dec;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const KEY_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    fn client(asserter: Asserter, multiplier: Decimal) -> RpcChainClient<impl Provider + 'static> {
        let provider = ProviderBuilder::new().connect_mocked_client(asserter);
        let signer: PrivateKeySigner = KEY.parse().unwrap();
        RpcChainClient::new(Arc::new(provider), signer, 31337, multiplier)
    }

    fn intent() -> TransactionIntent {
        TransactionIntent {
            from: KEY_ADDRESS,
            to: address!("000000000000000000000000000000000000000a"),
            data: Bytes::from_static(&[0x09, 0x5e, 0xa7, 0xb3]),
            gas_limit: 100_000,
            gas_price: 35,
            nonce: 7,
        }
    }

    #[test]
    fn test_sender_is_signer_address() {
        let asserter = Asserter::new();
        assert_eq!(client(asserter.clone(), dec!(1)).sender(), KEY_ADDRESS);
    }

    #[tokio::test]
    async fn test_gas_price_applies_multiplier() {
        let asserter = Asserter::new();
        asserter.push_success(&U256::from(10));

        assert_eq!(client(asserter.clone(), dec!(3.5)).gas_price().await.unwrap(), 35);
    }

    #[tokio::test]
    async fn test_gas_price_scaled_below_one_wei_is_clamped() {
        let asserter = Asserter::new();
        asserter.push_success(&U256::from(1));

        assert_eq!(client(asserter.clone(), dec!(0.1)).gas_price().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zero_gas_price_is_rejected() {
        let asserter = Asserter::new();
        asserter.push_success(&U256::ZERO);

        assert!(matches!(
            client(asserter.clone(), dec!(1)).gas_price().await,
            Err(ChainError::ZeroGasPrice)
        ));
    }

    #[tokio::test]
    async fn test_gas_price_transport_error() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("upstream timeout");

        assert!(matches!(
            client(asserter.clone(), dec!(1)).gas_price().await,
            Err(ChainError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_nonce_reads_pending_count() {
        let asserter = Asserter::new();
        asserter.push_success(&U256::from(7));

        assert_eq!(client(asserter.clone(), dec!(1)).nonce(KEY_ADDRESS).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_submit_returns_node_hash() {
        let asserter = Asserter::new();
        let hash = b256!("5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060");
        asserter.push_success(&hash);

        let result = client(asserter.clone(), dec!(1)).submit(&intent()).await;
        assert_eq!(result, TransactionResult::Submitted(hash));
    }

    #[tokio::test]
    async fn test_submit_rejection_is_classified() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("nonce too low: next nonce 8, tx nonce 7");

        match client(asserter.clone(), dec!(1)).submit(&intent()).await {
            TransactionResult::Failed(TxError::StaleNonce(message)) => {
                assert!(message.contains("nonce too low"))
            }
            other => panic!("expected stale nonce, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_for_foreign_sender_fails_signing() {
        let asserter = Asserter::new();
        let mut foreign = intent();
        foreign.from = address!("00000000000000000000000000000000000000aa");

        let result = client(asserter.clone(), dec!(1)).submit(&foreign).await;
        assert!(matches!(result, TransactionResult::Failed(TxError::Signing(_))));
    }
}
