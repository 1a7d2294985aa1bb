//! Configuration management
//! Load settings from .env file and process environment

use crate::arbitrage::{BotSettings, LegPolicy, Threshold};
use crate::execution::AllowancePolicy;
use crate::logging::LogFormat;
use alloy::primitives::{Address, B256, U256};
use anyhow::{anyhow, bail, Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// 10 tokens at 18 decimals
const DEFAULT_TRADE_AMOUNT: u128 = 10_000_000_000_000_000_000;
/// 1000 tokens at 18 decimals
const DEFAULT_APPROVAL_AMOUNT: u128 = 1_000_000_000_000_000_000_000;

#[derive(Clone)]
pub struct BotConfig {
    pub rpc_url: String,
    pub private_key: String,
    pub wallet_address: Address,
    /// Fetched from the node when not set
    pub chain_id: Option<u64>,

    pub token_a: Address,
    pub token_b: Address,

    pub uniswap_quoter: Address,
    pub uniswap_router: Address,
    pub uniswap_fee: u32,
    pub uniswap_tick_spacing: i32,
    pub uniswap_hooks: Address,

    pub balancer_vault: Address,
    pub balancer_pool_id: B256,

    pub trade_amount: U256,
    pub approval_amount: U256,
    pub arbitrage_threshold: Threshold,
    pub poll_interval_secs: u64,
    pub tx_deadline_secs: u64,
    pub gas_price_multiplier: Decimal,

    pub abi_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_format: LogFormat,

    pub allowance_policy: AllowancePolicy,
    pub leg_policy: LegPolicy,
}

// Keep the key out of logs
impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &"<redacted>")
            .field("wallet_address", &self.wallet_address)
            .field("chain_id", &self.chain_id)
            .field("token_a", &self.token_a)
            .field("token_b", &self.token_b)
            .field("uniswap_quoter", &self.uniswap_quoter)
            .field("uniswap_router", &self.uniswap_router)
            .field("uniswap_fee", &self.uniswap_fee)
            .field("uniswap_tick_spacing", &self.uniswap_tick_spacing)
            .field("uniswap_hooks", &self.uniswap_hooks)
            .field("balancer_vault", &self.balancer_vault)
            .field("balancer_pool_id", &self.balancer_pool_id)
            .field("trade_amount", &self.trade_amount)
            .field("approval_amount", &self.approval_amount)
            .field("arbitrage_threshold", &self.arbitrage_threshold)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("tx_deadline_secs", &self.tx_deadline_secs)
            .field("gas_price_multiplier", &self.gas_price_multiplier)
            .field("abi_dir", &self.abi_dir)
            .field("log_file", &self.log_file)
            .field("log_format", &self.log_format)
            .field("allowance_policy", &self.allowance_policy)
            .field("leg_policy", &self.leg_policy)
            .finish()
    }
}

impl BotConfig {
    /// Build from any key lookup (process env in production, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let threshold: Decimal = env.parse_or("ARBITRAGE_THRESHOLD", dec!(0.01))?;
        let arbitrage_threshold =
            Threshold::new(threshold).map_err(|e| anyhow!("invalid ARBITRAGE_THRESHOLD: {}", e))?;

        let config = BotConfig {
            rpc_url: env.required("RPC_URL")?,
            private_key: env.required("PRIVATE_KEY")?,
            wallet_address: env.parse_required("WALLET_ADDRESS")?,
            chain_id: env.parse_optional("CHAIN_ID")?,

            token_a: env.parse_required("TOKEN_A_ADDRESS")?,
            token_b: env.parse_required("TOKEN_B_ADDRESS")?,

            uniswap_quoter: env.parse_required("UNISWAP_QUOTER_ADDRESS")?,
            uniswap_router: env.parse_required("UNISWAP_ROUTER_ADDRESS")?,
            uniswap_fee: env.parse_or("UNISWAP_FEE", 3000)?,
            uniswap_tick_spacing: env.parse_or("UNISWAP_TICK_SPACING", 60)?,
            uniswap_hooks: env.parse_or("UNISWAP_HOOKS", Address::ZERO)?,

            balancer_vault: env.parse_required("BALANCER_VAULT_ADDRESS")?,
            balancer_pool_id: env.parse_required("BALANCER_POOL_ID")?,

            trade_amount: env.parse_or("TRADE_AMOUNT", U256::from(DEFAULT_TRADE_AMOUNT))?,
            approval_amount: env.parse_or("APPROVAL_AMOUNT", U256::from(DEFAULT_APPROVAL_AMOUNT))?,
            arbitrage_threshold,
            poll_interval_secs: env.parse_or("POLL_INTERVAL_SECS", 10)?,
            tx_deadline_secs: env.parse_or("TX_DEADLINE_SECS", 60)?,
            gas_price_multiplier: env.parse_or("GAS_PRICE_MULTIPLIER", dec!(3.5))?,

            abi_dir: env.parse_or("ABI_DIR", PathBuf::from("abis"))?,
            log_file: env.parse_or("LOG_FILE", PathBuf::from("bot_log.log"))?,
            log_format: env.parse_or("LOG_FORMAT", LogFormat::Text)?,

            allowance_policy: env.parse_or("ALLOWANCE_POLICY", AllowancePolicy::Blanket)?,
            leg_policy: env.parse_or("LEG_POLICY", LegPolicy::FireAndForget)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn validate(&self) -> Result<()> {
        if self.token_a == self.token_b {
            bail!("TOKEN_A_ADDRESS and TOKEN_B_ADDRESS must differ");
        }
        if self.trade_amount.is_zero() {
            bail!("TRADE_AMOUNT must be positive");
        }
        if self.poll_interval_secs == 0 {
            bail!("POLL_INTERVAL_SECS must be positive");
        }
        if self.tx_deadline_secs == 0 {
            bail!("TX_DEADLINE_SECS must be positive");
        }
        if self.gas_price_multiplier <= Decimal::ZERO {
            bail!("GAS_PRICE_MULTIPLIER must be positive");
        }
        Ok(())
    }

    pub fn bot_settings(&self) -> BotSettings {
        BotSettings {
            trade_amount: self.trade_amount,
            approval_amount: self.approval_amount,
            threshold: self.arbitrage_threshold,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            allowance_policy: self.allowance_policy,
            leg_policy: self.leg_policy,
        }
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Set and non-blank
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get(key).with_context(|| format!("{} not set", key))
    }

    fn parse_optional<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| anyhow!("invalid {} '{}': {}", key, raw, e))
            })
            .transpose()
    }

    fn parse_required<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.parse_optional(key)?
            .with_context(|| format!("{} not set", key))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Ok(self.parse_optional(key)?.unwrap_or(default))
    }
}

/// Load `.env` from the working directory if present, then read the environment
pub fn load_config() -> Result<BotConfig> {
    dotenv::dotenv().ok();
    BotConfig::from_env()
}

/// Load an explicit env file (must exist), then read the environment
pub fn load_config_from_file(path: &Path) -> Result<BotConfig> {
    dotenv::from_path(path).with_context(|| format!("failed to load {}", path.display()))?;
    BotConfig::from_env()
}
