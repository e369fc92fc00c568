//! Configuration for the dashboard CLI.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): endpoints, contracts, keys
//! - CLI arguments: the view to show and its parameters

use alloy::primitives::Address;
use clap::{Parser, Subcommand, ValueEnum};
use dashboard_sdk::{indexer::PoolTxType, views::Prize};

/// Environment configuration (endpoints, contracts, credentials).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// Chain ID (e.g., 1 for Ethereum mainnet)
    pub chain_id: u64,

    /// RPC URL for the node
    pub node_rpc_url: String,

    /// GraphQL subgraph URL
    pub indexer_url: String,

    /// REST API base URL
    pub api_url: String,

    /// Yield farm contract addresses, comma-separated
    #[serde(default)]
    pub yield_farms: Vec<String>,

    /// Governance token rewards are paid in
    pub governance_token: Option<String>,

    /// Private key for signing transactions, read-only session without it
    pub private_key: Option<String>,

    /// Optional timeout for operations (default: 30s)
    pub timeout_seconds: Option<u64>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Parse the yield farm addresses, skipping blank entries.
    pub fn yield_farms(&self) -> Result<Vec<Address>, ConfigError> {
        self.yield_farms
            .iter()
            .map(|farm| farm.trim())
            .filter(|farm| !farm.is_empty())
            .map(|farm| {
                farm.parse()
                    .map_err(|_| ConfigError::InvalidAddress("YIELD_FARMS", farm.to_string()))
            })
            .collect()
    }

    pub fn governance_token(&self) -> Result<Option<Address>, ConfigError> {
        self.governance_token
            .as_deref()
            .map(|token| {
                token.parse().map_err(|_| {
                    ConfigError::InvalidAddress("GOVERNANCE_TOKEN", token.to_string())
                })
            })
            .transpose()
    }
}

/// CLI arguments selecting the dashboard view.
#[derive(Debug, Parser)]
#[command(name = "dashboard")]
#[command(about = "Account dashboard for junior tranches, yield farming and governance")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Voting power rank of an account relative to a prize
    Rank {
        /// Account to rank, defaults to the wallet account
        #[arg(long)]
        account: Option<Address>,

        #[arg(long, default_value = "Next prize")]
        prize_title: String,

        /// Top percentage of voters eligible; everyone if not specified
        #[arg(long)]
        prize_rate: Option<u32>,
    },

    /// Active, locked and redeemed junior positions
    Portfolio {
        #[arg(long)]
        account: Option<Address>,

        /// Page of past positions to show (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = 10)]
        page_size: usize,
    },

    /// Yield farming rewards
    Rewards {
        #[arg(long)]
        account: Option<Address>,
    },

    /// Harvest rewards of one farm, or of every farm with something to claim
    Claim {
        #[arg(long)]
        farm: Option<Address>,
    },

    /// Staking pool transactions
    Transactions {
        /// Only transactions of this user
        #[arg(long)]
        user: Option<Address>,

        #[arg(long)]
        token: Option<Address>,

        #[arg(long, value_enum)]
        tx_type: Option<TxTypeArg>,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TxTypeArg {
    Deposit,
    Withdraw,
}

impl From<TxTypeArg> for PoolTxType {
    fn from(arg: TxTypeArg) -> Self {
        match arg {
            TxTypeArg::Deposit => PoolTxType::Deposit,
            TxTypeArg::Withdraw => PoolTxType::Withdraw,
        }
    }
}

impl CliConfig {
    /// Check argument values clap cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.command {
            Command::Rank {
                prize_rate: Some(rate),
                ..
            } if *rate == 0 || *rate > 100 => Err(ConfigError::InvalidPrizeRate(*rate)),
            Command::Portfolio {
                page, page_size, ..
            } if *page == 0 || *page_size == 0 => Err(ConfigError::ZeroPage),
            Command::Transactions { pages: 0, .. } => Err(ConfigError::ZeroPage),
            _ => Ok(()),
        }
    }
}

/// Prize the rank is computed against.
pub fn cli_prize(title: &str, rate: Option<u32>) -> Prize {
    Prize {
        key: "cli".to_string(),
        title: title.to_string(),
        rate,
        date: 0,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid address in {0}: {1}")]
    InvalidAddress(&'static str, String),

    #[error("prize_rate must be within 1..=100, got {0}")]
    InvalidPrizeRate(u32),

    #[error("page numbers and sizes must be positive")]
    ZeroPage,
}
