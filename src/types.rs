//! Core data structures
//!
//! Quotes, swap legs, transaction intents and results shared by the venue
//! adapters, the transaction lifecycle manager and the decision loop.
//! Amounts are always integer base units (`U256`); fractional knobs
//! (thresholds, gas multipliers) are `Decimal`.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::fmt;

use crate::execution::TxError;

/// The two venues this bot arbitrages between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VenueId {
    /// Venue A: Uniswap v4 quoter + router
    Uniswap,
    /// Venue B: Balancer V2 vault
    Balancer,
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VenueId::Uniswap => write!(f, "Uniswap"),
            VenueId::Balancer => write!(f, "Balancer"),
        }
    }
}

/// One side of the configured token pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairToken {
    /// Input token (the one quoted and sold first)
    A,
    B,
}

impl fmt::Display for PairToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PairToken::A => write!(f, "tokenA"),
            PairToken::B => write!(f, "tokenB"),
        }
    }
}

/// Swap direction within the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    /// Sell token A for token B
    AToB,
    /// Sell token B for token A
    BToA,
}

impl SwapDirection {
    /// Token spent by a swap in this direction
    pub fn input_token(&self) -> PairToken {
        match self {
            SwapDirection::AToB => PairToken::A,
            SwapDirection::BToA => PairToken::B,
        }
    }
}

/// Price quote for swapping a fixed amount of token A into token B.
/// Produced fresh every poll cycle, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub venue: VenueId,
    pub amount_in: U256,
    pub amount_out: U256,
    /// Venue-reported gas units for the swap, when the venue supplies one
    pub gas_estimate: Option<U256>,
}

/// Venue-agnostic description of one arbitrage leg.
/// Recipient and deadline are attached by the venue at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapLeg {
    pub venue: VenueId,
    pub direction: SwapDirection,
    pub amount_in: U256,
    pub min_amount_out: U256,
}

/// Fully-specified swap handed to a venue's call encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub venue: VenueId,
    pub direction: SwapDirection,
    pub amount_in: U256,
    pub min_amount_out: U256,
    pub recipient: Address,
    /// Absolute unix timestamp (seconds)
    pub deadline: u64,
}

impl SwapRequest {
    /// Build a request for `leg` expiring `window_secs` after `now`
    pub fn from_leg(leg: &SwapLeg, recipient: Address, now: u64, window_secs: u64) -> Self {
        Self {
            venue: leg.venue,
            direction: leg.direction,
            amount_in: leg.amount_in,
            min_amount_out: leg.min_amount_out,
            recipient,
            deadline: now.saturating_add(window_secs),
        }
    }

    pub fn is_live(&self, now: u64) -> bool {
        self.deadline > now
    }
}

/// Operation being turned into a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Approve,
    Swap,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operation::Approve => write!(f, "approve"),
            Operation::Swap => write!(f, "swap"),
        }
    }
}

/// Static per-operation gas settings.
/// Limits are conservative ceilings, not estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxProfile {
    pub gas_limit: u64,
    /// Applied on top of the chain client's base multiplier
    pub gas_price_multiplier: Decimal,
}

/// Contract call produced by a venue adapter, before gas and nonce are known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub venue: VenueId,
    pub operation: Operation,
    pub target: Address,
    pub data: Bytes,
    pub profile: TxProfile,
}

/// Transaction ready for signing. Built immediately before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub nonce: u64,
}

/// Outcome of a submission. `Submitted` means the node accepted the
/// transaction, not that it was mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionResult {
    Submitted(TxHash),
    Failed(TxError),
}

impl TransactionResult {
    pub fn is_submitted(&self) -> bool {
        matches!(self, TransactionResult::Submitted(_))
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            TransactionResult::Submitted(hash) => Some(*hash),
            TransactionResult::Failed(_) => None,
        }
    }
}

/// Which venue is rich (sold into) and which is cheap (bought from)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbDirection {
    /// Venue A quotes higher: sell on A, buy on B
    SellAOnBuyB,
    /// Venue B quotes higher: sell on B, buy on A
    SellBOnBuyA,
}

impl fmt::Display for ArbDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArbDirection::SellAOnBuyB => write!(f, "Sell on A, Buy on B"),
            ArbDirection::SellBOnBuyA => write!(f, "Sell on B, Buy on A"),
        }
    }
}

/// Arbitrage opportunity derived from one cycle's pair of quotes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitrageOpportunity {
    pub direction: ArbDirection,
    pub sell_leg: SwapLeg,
    pub buy_leg: SwapLeg,
}

/// Multiply an integer amount by a decimal factor, rounding down.
/// Returns None on negative factors or overflow.
pub fn scale_by(value: u128, factor: Decimal) -> Option<u128> {
    if factor.is_sign_negative() {
        return None;
    }
    let value = Decimal::from_u128(value)?;
    value.checked_mul(factor)?.floor().to_u128()
}

/// Render base units as whole tokens (18 decimals) for log lines
pub fn format_units(amount: U256) -> String {
    let unit = U256::from(10u64).pow(U256::from(18u64));
    let whole = amount / unit;
    let frac = amount % unit;
    let frac = format!("{:0>18}", frac.to_string());
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}
