//! Price venues
//!
//! Uniform quote / swap / approve surface over the two exchanges. Venue
//! adapters hold no mutable state: just contract addresses plus a shared
//! [`VenueContext`] for the pair tokens, the wallet and the lifecycle
//! manager.
//!
//! Quote failures are per-cycle and recoverable: the decision loop treats
//! any `Err` from [`PriceVenue::quote`] as "venue unavailable this cycle".

mod balancer;
mod uniswap;

pub use balancer::BalancerVenue;
pub use uniswap::{UniswapPool, UniswapVenue};

use crate::chain::ChainClient;
use crate::contracts::IERC20;
use crate::execution::{TransactionManager, TxError};
use crate::types::{
    ContractCall, Operation, PairToken, Quote, SwapLeg, SwapRequest, TransactionResult, TxProfile,
    VenueId,
};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Per-venue read / encode failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VenueError {
    #[error("{venue} contract call failed: {message}")]
    CallFailed { venue: VenueId, message: String },

    #[error("unexpected {venue} response: {message}")]
    MalformedResponse { venue: VenueId, message: String },

    #[error("amount in ({amount_in}) exceeds max liquidity ({max_liquidity})")]
    LiquidityExceeded { amount_in: U256, max_liquidity: U256 },

    #[error("{venue} cannot encode amount {amount}: {reason}")]
    InvalidAmount {
        venue: VenueId,
        amount: U256,
        reason: String,
    },
}

/// One exchange acting as price source and swap counterparty
#[async_trait]
pub trait PriceVenue: Send + Sync {
    fn id(&self) -> VenueId;

    /// Output of token B for `amount_in` of token A
    async fn quote(&self, amount_in: U256) -> Result<Quote, VenueError>;

    /// Submit one leg with a fresh deadline
    async fn swap(&self, leg: &SwapLeg) -> TransactionResult;

    /// Let this venue spend up to `amount` of `token`
    async fn approve(&self, token: PairToken, amount: U256) -> TransactionResult;

    /// Current allowance the wallet has granted this venue for `token`
    async fn allowance(&self, token: PairToken) -> Result<U256, VenueError>;
}

/// State shared by every venue adapter
#[derive(Clone)]
pub struct VenueContext {
    chain: Arc<dyn ChainClient>,
    manager: Arc<TransactionManager>,
    token_a: Address,
    token_b: Address,
    /// Swap deadline window in seconds
    deadline_secs: u64,
}

impl VenueContext {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        manager: Arc<TransactionManager>,
        token_a: Address,
        token_b: Address,
        deadline_secs: u64,
    ) -> Self {
        Self {
            chain,
            manager,
            token_a,
            token_b,
            deadline_secs,
        }
    }

    pub fn token(&self, token: PairToken) -> Address {
        match token {
            PairToken::A => self.token_a,
            PairToken::B => self.token_b,
        }
    }

    pub fn wallet(&self) -> Address {
        self.manager.sender()
    }

    /// eth_call wrapper tagging failures with the venue
    async fn read(&self, venue: VenueId, to: Address, data: Vec<u8>) -> Result<Bytes, VenueError> {
        self.chain
            .call(to, Bytes::from(data))
            .await
            .map_err(|e| VenueError::CallFailed {
                venue,
                message: e.to_string(),
            })
    }

    /// Attach recipient + deadline, refuse expired requests, encode, submit
    async fn submit_swap<F>(&self, leg: &SwapLeg, encode: F) -> TransactionResult
    where
        F: FnOnce(&SwapRequest) -> Result<ContractCall, VenueError> + Send,
    {
        let now = unix_now();
        let request = SwapRequest::from_leg(leg, self.wallet(), now, self.deadline_secs);
        if !request.is_live(now) {
            return TransactionResult::Failed(TxError::DeadlineExpired {
                deadline: request.deadline,
                now,
            });
        }

        let call = match encode(&request) {
            Ok(call) => call,
            Err(e) => return TransactionResult::Failed(TxError::Encoding(e.to_string())),
        };

        self.manager.execute(call).await
    }

    /// ERC20 approve(spender, amount) on the chosen pair token
    async fn approve(
        &self,
        venue: VenueId,
        spender: Address,
        token: PairToken,
        amount: U256,
        profile: TxProfile,
    ) -> TransactionResult {
        info!("Approving {} for {} ({:?}): {}", token, venue, spender, amount);
        let data = IERC20::approveCall { spender, amount }.abi_encode();
        self.manager
            .execute(ContractCall {
                venue,
                operation: Operation::Approve,
                target: self.token(token),
                data: Bytes::from(data),
                profile,
            })
            .await
    }

    async fn allowance(
        &self,
        venue: VenueId,
        spender: Address,
        token: PairToken,
    ) -> Result<U256, VenueError> {
        let data = IERC20::allowanceCall {
            owner: self.wallet(),
            spender,
        }
        .abi_encode();
        let raw = self.read(venue, self.token(token), data).await?;
        IERC20::allowanceCall::abi_decode_returns(&raw).map_err(|e| VenueError::MalformedResponse {
            venue,
            message: format!("allowance: {}", e),
        })
    }
}

/// Current unix time in seconds
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Narrow a U256 amount to uint128 for venues that take one
fn to_u128(venue: VenueId, amount: U256) -> Result<u128, VenueError> {
    u128::try_from(amount).map_err(|_| VenueError::InvalidAmount {
        venue,
        amount,
        reason: "exceeds uint128".to_string(),
    })
}
