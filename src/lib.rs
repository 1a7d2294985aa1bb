//! Two-venue DEX Arbitrage Bot Library
//!
//! Polls a Uniswap v4 pool and a Balancer V2 pool for the same token pair,
//! and when one venue's quote beats the other's by more than the configured
//! threshold, sells on the rich venue and buys back on the cheap one.

pub mod abi;
pub mod arbitrage;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod execution;
pub mod logging;
pub mod types;
pub mod venues;

// Re-export commonly used types
pub use arbitrage::{ArbitrageBot, BotSettings, CycleOutcome, LegPolicy, Threshold};
pub use config::{load_config, load_config_from_file, BotConfig};
pub use types::{ArbitrageOpportunity, Quote, SwapLeg, TransactionResult, VenueId};
