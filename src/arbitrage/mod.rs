//! Arbitrage Module
//!
//! Threshold detection between the two venue quotes and the polling loop
//! that acts on it.

pub mod bot;
pub mod detector;

pub use bot::{ArbitrageBot, BotSettings, BotState, CycleOutcome, LegPolicy};
pub use detector::{detect_opportunity, Threshold};
