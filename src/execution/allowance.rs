//! Allowance policy
//!
//! `Blanket` approves once at startup and never looks again; trades past
//! the approved amount fail on chain. `TopUp` reads the leg's input-token
//! allowance before each swap and re-approves when it is short.

use alloy::primitives::U256;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllowancePolicy {
    #[default]
    Blanket,
    TopUp,
}

impl AllowancePolicy {
    /// Whether a swap spending `required` must be preceded by a fresh approval
    pub fn needs_top_up(&self, current: U256, required: U256) -> bool {
        match self {
            AllowancePolicy::Blanket => false,
            AllowancePolicy::TopUp => current < required,
        }
    }

    /// Whether allowances are read before swaps at all
    pub fn checks_allowance(&self) -> bool {
        matches!(self, AllowancePolicy::TopUp)
    }
}

impl FromStr for AllowancePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blanket" => Ok(AllowancePolicy::Blanket),
            "top-up" | "topup" | "top_up" => Ok(AllowancePolicy::TopUp),
            other => Err(format!(
                "unknown allowance policy '{}' (expected blanket or top-up)",
                other
            )),
        }
    }
}

impl fmt::Display for AllowancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AllowancePolicy::Blanket => write!(f, "blanket"),
            AllowancePolicy::TopUp => write!(f, "top-up"),
        }
    }
}
