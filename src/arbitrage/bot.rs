//! Arbitrage Bot - decision loop
//!
//! Initializing: approve both pair tokens on both venues, once. Either
//! token can be a leg's input depending on the direction.
//! Polling: quote both venues for the same input, compare against the
//! threshold, submit sell then buy when it clears, sleep, repeat.
//!
//! One cycle runs to completion before the next starts. The two legs are
//! submitted strictly in order so each picks up its own fresh nonce.

use super::detector::{detect_opportunity, Threshold};
use crate::execution::{AllowancePolicy, TxError};
use crate::types::{
    format_units, ArbitrageOpportunity, PairToken, Quote, SwapLeg, TransactionResult, VenueId,
};
use crate::venues::{PriceVenue, VenueError};
use alloy::primitives::U256;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What to do with the buy leg when the sell leg was not submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegPolicy {
    /// Submit both legs regardless
    #[default]
    FireAndForget,
    /// Drop the buy leg when the sell leg failed
    SkipBuyOnSellFailure,
}

impl FromStr for LegPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fire-and-forget" | "fire_and_forget" => Ok(LegPolicy::FireAndForget),
            "skip-buy-on-sell-failure" | "skip_buy_on_sell_failure" => {
                Ok(LegPolicy::SkipBuyOnSellFailure)
            }
            other => Err(format!(
                "unknown leg policy '{}' (expected fire-and-forget or skip-buy-on-sell-failure)",
                other
            )),
        }
    }
}

impl fmt::Display for LegPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LegPolicy::FireAndForget => write!(f, "fire-and-forget"),
            LegPolicy::SkipBuyOnSellFailure => write!(f, "skip-buy-on-sell-failure"),
        }
    }
}

/// Trading knobs for the loop
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Fixed token A input quoted and sold each cycle
    pub trade_amount: U256,
    /// Startup approval (and top-up) amount
    pub approval_amount: U256,
    pub threshold: Threshold,
    pub poll_interval: Duration,
    pub allowance_policy: AllowancePolicy,
    pub leg_policy: LegPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    Initializing,
    Polling,
}

/// Result of one poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// At least one quote failed; nothing was compared
    VenueUnavailable {
        venue_a: Option<VenueError>,
        venue_b: Option<VenueError>,
    },
    NoOpportunity {
        quote_a: Quote,
        quote_b: Quote,
    },
    /// `buy` is None when the leg policy skipped it
    Executed {
        opportunity: ArbitrageOpportunity,
        sell: TransactionResult,
        buy: Option<TransactionResult>,
    },
}

pub struct ArbitrageBot {
    venue_a: Arc<dyn PriceVenue>,
    venue_b: Arc<dyn PriceVenue>,
    settings: BotSettings,
    state: BotState,
}

impl ArbitrageBot {
    pub fn new(
        venue_a: Arc<dyn PriceVenue>,
        venue_b: Arc<dyn PriceVenue>,
        settings: BotSettings,
    ) -> Self {
        Self {
            venue_a,
            venue_b,
            settings,
            state: BotState::Initializing,
        }
    }

    pub fn state(&self) -> BotState {
        self.state
    }

    /// Approve both pair tokens on both venues, one transaction each.
    /// Failures are logged and do not prevent polling from starting.
    pub async fn initialize(&mut self) -> Vec<(VenueId, PairToken, TransactionResult)> {
        info!(
            "Approving {} of tokenA and tokenB for {} and {}",
            format_units(self.settings.approval_amount),
            self.venue_a.id(),
            self.venue_b.id()
        );

        let mut results = Vec::with_capacity(4);
        for venue in [&self.venue_a, &self.venue_b] {
            for token in [PairToken::A, PairToken::B] {
                let result = venue.approve(token, self.settings.approval_amount).await;
                match &result {
                    TransactionResult::Submitted(hash) => {
                        info!("{} {} approval TX: {:?}", venue.id(), token, hash)
                    }
                    TransactionResult::Failed(e) => {
                        error!("{} {} approval transaction failed: {}", venue.id(), token, e)
                    }
                }
                results.push((venue.id(), token, result));
            }
        }

        self.state = BotState::Polling;
        results
    }

    /// One full poll: quotes, comparison, up to two legs
    pub async fn run_cycle(&self) -> CycleOutcome {
        let amount_in = self.settings.trade_amount;
        info!(
            "Fetching {} and {} prices...",
            self.venue_a.id(),
            self.venue_b.id()
        );

        let (quote_a, quote_b) = tokio::join!(
            self.venue_a.quote(amount_in),
            self.venue_b.quote(amount_in)
        );

        let (quote_a, quote_b) = match (quote_a, quote_b) {
            (Ok(a), Ok(b)) => (a, b),
            (a, b) => {
                let venue_a = a.err();
                let venue_b = b.err();
                error!(
                    "Failed to fetch price data. {}: {}, {}: {}",
                    self.venue_a.id(),
                    venue_a.as_ref().map_or("ok".to_string(), |e| e.to_string()),
                    self.venue_b.id(),
                    venue_b.as_ref().map_or("ok".to_string(), |e| e.to_string()),
                );
                return CycleOutcome::VenueUnavailable { venue_a, venue_b };
            }
        };

        info!(
            "{} Price: {} ({}), {} Price: {} ({})",
            quote_a.venue,
            format_units(quote_a.amount_out),
            quote_a.amount_out,
            quote_b.venue,
            format_units(quote_b.amount_out),
            quote_b.amount_out
        );

        let Some(opportunity) =
            detect_opportunity(&quote_a, &quote_b, &self.settings.threshold, amount_in)
        else {
            info!("No arbitrage opportunity detected.");
            return CycleOutcome::NoOpportunity { quote_a, quote_b };
        };

        info!(
            "Arbitrage opportunity detected: Sell on {}, Buy on {}",
            opportunity.sell_leg.venue, opportunity.buy_leg.venue
        );

        let sell = self.execute_leg(&opportunity.sell_leg).await;
        self.log_leg(&opportunity.sell_leg, &sell);

        let buy = if !sell.is_submitted()
            && self.settings.leg_policy == LegPolicy::SkipBuyOnSellFailure
        {
            warn!(
                "Sell leg on {} failed, skipping buy leg on {}",
                opportunity.sell_leg.venue, opportunity.buy_leg.venue
            );
            None
        } else {
            let buy = self.execute_leg(&opportunity.buy_leg).await;
            self.log_leg(&opportunity.buy_leg, &buy);
            Some(buy)
        };

        CycleOutcome::Executed {
            opportunity,
            sell,
            buy,
        }
    }

    /// Initialize if needed, then poll until `shutdown` resolves.
    /// A cycle in flight is allowed to finish.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        if self.state == BotState::Initializing {
            self.initialize().await;
        }

        info!(
            "Polling every {:?} (threshold {}, trade {} tokenA)",
            self.settings.poll_interval,
            self.settings.threshold,
            format_units(self.settings.trade_amount)
        );

        tokio::pin!(shutdown);
        loop {
            if let Err(panic) = AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
                error!("An error occurred: {}", panic_message(panic.as_ref()));
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping");
                    return;
                }
            }
        }
    }

    fn venue(&self, id: VenueId) -> &Arc<dyn PriceVenue> {
        if self.venue_a.id() == id {
            &self.venue_a
        } else {
            &self.venue_b
        }
    }

    /// Allowance check (top-up policy only), then the swap itself
    async fn execute_leg(&self, leg: &SwapLeg) -> TransactionResult {
        let venue = self.venue(leg.venue);
        let policy = self.settings.allowance_policy;

        if policy.checks_allowance() {
            let token = leg.direction.input_token();
            let current = match venue.allowance(token).await {
                Ok(current) => current,
                Err(e) => return TransactionResult::Failed(TxError::Allowance(e.to_string())),
            };

            if policy.needs_top_up(current, leg.amount_in) {
                let amount = self.settings.approval_amount.max(leg.amount_in);
                info!(
                    "{} allowance for {} is {}, topping up to {}",
                    leg.venue, token, current, amount
                );
                let approval = venue.approve(token, amount).await;
                if let TransactionResult::Failed(e) = approval {
                    return TransactionResult::Failed(TxError::Allowance(format!(
                        "top-up approval failed: {}",
                        e
                    )));
                }
            } else {
                debug!("{} allowance for {} is {}", leg.venue, token, current);
            }
        }

        venue.swap(leg).await
    }

    fn log_leg(&self, leg: &SwapLeg, result: &TransactionResult) {
        match result {
            TransactionResult::Submitted(hash) => {
                info!("{} swap TX: {:?}", leg.venue, hash)
            }
            TransactionResult::Failed(e) => {
                error!("{} swap transaction failed: {}", leg.venue, e)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "cycle panicked".to_string()
    }
}
