//! Balancer V2 venue (venue B)
//!
//! Quotes by simulating `queryBatchSwap` (GIVEN_IN) against the Vault. The
//! Vault happily returns numbers for trade sizes the pool can't absorb, so
//! every quote first reads `getPoolTokens` and rejects an `amount_in` larger
//! than the smaller of the two pooled balances.
//!
//! Swaps use the Vault's single-pool `swap`; approvals grant the Vault.

use super::{PriceVenue, VenueContext, VenueError};
use crate::contracts::IBalancerVault::{
    self, BatchSwapStep, FundManagement, SingleSwap, SwapKind,
};
use crate::types::{
    ContractCall, Operation, PairToken, Quote, SwapDirection, SwapLeg, SwapRequest,
    TransactionResult, TxProfile, VenueId,
};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

const APPROVE_PROFILE: TxProfile = TxProfile {
    gas_limit: 100_000,
    gas_price_multiplier: dec!(1.2),
};

const SWAP_PROFILE: TxProfile = TxProfile {
    gas_limit: 500_000,
    gas_price_multiplier: dec!(1.0),
};

pub struct BalancerVenue {
    ctx: VenueContext,
    vault: Address,
    pool_id: B256,
}

impl BalancerVenue {
    pub fn new(ctx: VenueContext, vault: Address, pool_id: B256) -> Self {
        Self { ctx, vault, pool_id }
    }

    fn funds(&self) -> FundManagement {
        let wallet = self.ctx.wallet();
        FundManagement {
            sender: wallet,
            fromInternalBalance: false,
            recipient: wallet,
            toInternalBalance: false,
        }
    }

    fn malformed(message: String) -> VenueError {
        VenueError::MalformedResponse {
            venue: VenueId::Balancer,
            message,
        }
    }

    /// Smaller of the two pooled balances
    async fn max_liquidity(&self) -> Result<U256, VenueError> {
        let data = IBalancerVault::getPoolTokensCall {
            poolId: self.pool_id,
        }
        .abi_encode();
        let raw = self.ctx.read(VenueId::Balancer, self.vault, data).await?;
        let pool = IBalancerVault::getPoolTokensCall::abi_decode_returns(&raw)
            .map_err(|e| Self::malformed(format!("getPoolTokens: {}", e)))?;

        if pool.balances.len() < 2 {
            return Err(Self::malformed(format!(
                "getPoolTokens returned {} balances",
                pool.balances.len()
            )));
        }
        Ok(pool.balances[0].min(pool.balances[1]))
    }

    fn encode_swap(&self, request: &SwapRequest) -> Result<ContractCall, VenueError> {
        let (asset_in, asset_out) = match request.direction {
            SwapDirection::AToB => (self.ctx.token(PairToken::A), self.ctx.token(PairToken::B)),
            SwapDirection::BToA => (self.ctx.token(PairToken::B), self.ctx.token(PairToken::A)),
        };

        let single_swap = SingleSwap {
            poolId: self.pool_id,
            kind: SwapKind::GIVEN_IN,
            assetIn: asset_in,
            assetOut: asset_out,
            amount: request.amount_in,
            userData: Bytes::new(),
        };
        let funds = FundManagement {
            sender: request.recipient,
            fromInternalBalance: false,
            recipient: request.recipient,
            toInternalBalance: false,
        };

        // GIVEN_IN: limit is the minimum amount out
        let data = IBalancerVault::swapCall {
            singleSwap: single_swap,
            funds,
            limit: request.min_amount_out,
            deadline: U256::from(request.deadline),
        }
        .abi_encode();

        Ok(ContractCall {
            venue: VenueId::Balancer,
            operation: Operation::Swap,
            target: self.vault,
            data: Bytes::from(data),
            profile: SWAP_PROFILE,
        })
    }
}

#[async_trait]
impl PriceVenue for BalancerVenue {
    fn id(&self) -> VenueId {
        VenueId::Balancer
    }

    async fn quote(&self, amount_in: U256) -> Result<Quote, VenueError> {
        let max_liquidity = self.max_liquidity().await?;
        if amount_in > max_liquidity {
            warn!(
                "Amount in ({}) exceeds max liquidity ({})",
                amount_in, max_liquidity
            );
            return Err(VenueError::LiquidityExceeded {
                amount_in,
                max_liquidity,
            });
        }

        let data = IBalancerVault::queryBatchSwapCall {
            kind: SwapKind::GIVEN_IN,
            swaps: vec![BatchSwapStep {
                poolId: self.pool_id,
                assetInIndex: U256::ZERO,
                assetOutIndex: U256::from(1u64),
                amount: amount_in,
                userData: Bytes::new(),
            }],
            assets: vec![self.ctx.token(PairToken::A), self.ctx.token(PairToken::B)],
            funds: self.funds(),
        }
        .abi_encode();

        let raw = self.ctx.read(VenueId::Balancer, self.vault, data).await?;
        let deltas = IBalancerVault::queryBatchSwapCall::abi_decode_returns(&raw)
            .map_err(|e| Self::malformed(format!("queryBatchSwap: {}", e)))?;

        // Vault deltas are from the Vault's view: the asset paid out is negative
        let out_delta = deltas
            .get(1)
            .ok_or_else(|| Self::malformed(format!("{} asset deltas", deltas.len())))?;
        if !out_delta.is_negative() {
            return Err(Self::malformed(format!(
                "non-negative output delta {}",
                out_delta
            )));
        }
        let amount_out = out_delta.unsigned_abs();

        debug!("Balancer quote: {} in -> {} out", amount_in, amount_out);

        Ok(Quote {
            venue: VenueId::Balancer,
            amount_in,
            amount_out,
            gas_estimate: None,
        })
    }

    async fn swap(&self, leg: &SwapLeg) -> TransactionResult {
        self.ctx
            .submit_swap(leg, |request| self.encode_swap(request))
            .await
    }

    async fn approve(&self, token: PairToken, amount: U256) -> TransactionResult {
        self.ctx
            .approve(VenueId::Balancer, self.vault, token, amount, APPROVE_PROFILE)
            .await
    }

    async fn allowance(&self, token: PairToken) -> Result<U256, VenueError> {
        self.ctx.allowance(VenueId::Balancer, self.vault, token).await
    }
}
