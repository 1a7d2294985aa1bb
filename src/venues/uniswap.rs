//! Uniswap v4 venue (venue A)
//!
//! Quotes through the v4 Quoter's `quoteExactInputSingle`, which simulates
//! the swap and also reports a gas estimate. Swaps go through the router's
//! `exactInputSingle`. Approvals grant the router.
//!
//! No liquidity guard here: the quoter simulates against the live pool and
//! its result is used as-is.

use super::{to_u128, PriceVenue, VenueContext, VenueError};
use crate::contracts::{
    fee_to_u24, tick_spacing_to_i24, ExactInputSingleParams, IV4Quoter, IV4Router, PoolKey,
    QuoteExactSingleParams,
};
use crate::types::{
    ContractCall, Operation, PairToken, Quote, SwapDirection, SwapLeg, SwapRequest,
    TransactionResult, TxProfile, VenueId,
};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal_macros::dec;
use tracing::debug;

const APPROVE_PROFILE: TxProfile = TxProfile {
    gas_limit: 100_000,
    gas_price_multiplier: dec!(1.5),
};

const SWAP_PROFILE: TxProfile = TxProfile {
    gas_limit: 300_000,
    gas_price_multiplier: dec!(1.5),
};

/// Pool identity for the configured pair
#[derive(Debug, Clone)]
pub struct UniswapPool {
    pub fee: u32,
    pub tick_spacing: i32,
    pub hooks: Address,
}

pub struct UniswapVenue {
    ctx: VenueContext,
    quoter: Address,
    router: Address,
    pool_key: PoolKey,
}

impl UniswapVenue {
    /// Create a new UniswapVenue. Fails if the pool parameters don't fit
    /// the on-chain key types.
    pub fn new(ctx: VenueContext, quoter: Address, router: Address, pool: UniswapPool) -> Result<Self> {
        if pool.fee > 0xFFFFFF {
            return Err(anyhow!("Uniswap fee {} exceeds uint24", pool.fee));
        }
        let tick_spacing = tick_spacing_to_i24(pool.tick_spacing)
            .ok_or_else(|| anyhow!("Uniswap tick spacing {} exceeds int24", pool.tick_spacing))?;

        // v4 pool keys order currencies by address
        let (token_a, token_b) = (ctx.token(PairToken::A), ctx.token(PairToken::B));
        let (currency0, currency1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };

        let pool_key = PoolKey {
            currency0,
            currency1,
            fee: fee_to_u24(pool.fee),
            tickSpacing: tick_spacing,
            hooks: pool.hooks,
        };

        Ok(Self {
            ctx,
            quoter,
            router,
            pool_key,
        })
    }

    /// zeroForOne for a swap spending `token_in`
    fn zero_for_one(&self, direction: SwapDirection) -> bool {
        self.ctx.token(direction.input_token()) == self.pool_key.currency0
    }

    fn encode_swap(&self, request: &SwapRequest) -> Result<ContractCall, VenueError> {
        let params = ExactInputSingleParams {
            poolKey: self.pool_key.clone(),
            zeroForOne: self.zero_for_one(request.direction),
            recipient: request.recipient,
            deadline: U256::from(request.deadline),
            amountIn: to_u128(VenueId::Uniswap, request.amount_in)?,
            amountOutMinimum: to_u128(VenueId::Uniswap, request.min_amount_out)?,
            hookData: Bytes::new(),
        };

        Ok(ContractCall {
            venue: VenueId::Uniswap,
            operation: Operation::Swap,
            target: self.router,
            data: Bytes::from(IV4Router::exactInputSingleCall { params }.abi_encode()),
            profile: SWAP_PROFILE,
        })
    }
}

#[async_trait]
impl PriceVenue for UniswapVenue {
    fn id(&self) -> VenueId {
        VenueId::Uniswap
    }

    async fn quote(&self, amount_in: U256) -> Result<Quote, VenueError> {
        let params = QuoteExactSingleParams {
            poolKey: self.pool_key.clone(),
            zeroForOne: self.zero_for_one(SwapDirection::AToB),
            exactAmount: to_u128(VenueId::Uniswap, amount_in)?,
            hookData: Bytes::new(),
        };
        let data = IV4Quoter::quoteExactInputSingleCall { params }.abi_encode();

        let raw = self.ctx.read(VenueId::Uniswap, self.quoter, data).await?;
        let quoted = IV4Quoter::quoteExactInputSingleCall::abi_decode_returns(&raw).map_err(|e| {
            VenueError::MalformedResponse {
                venue: VenueId::Uniswap,
                message: e.to_string(),
            }
        })?;

        debug!(
            "Uniswap quote: {} in -> {} out (gas estimate {})",
            amount_in, quoted.amountOut, quoted.gasEstimate
        );

        Ok(Quote {
            venue: VenueId::Uniswap,
            amount_in,
            amount_out: quoted.amountOut,
            gas_estimate: Some(quoted.gasEstimate),
        })
    }

    async fn swap(&self, leg: &SwapLeg) -> TransactionResult {
        self.ctx
            .submit_swap(leg, |request| self.encode_swap(request))
            .await
    }

    async fn approve(&self, token: PairToken, amount: U256) -> TransactionResult {
        self.ctx
            .approve(VenueId::Uniswap, self.router, token, amount, APPROVE_PROFILE)
            .await
    }

    async fn allowance(&self, token: PairToken) -> Result<U256, VenueError> {
        self.ctx.allowance(VenueId::Uniswap, self.router, token).await
    }
}
