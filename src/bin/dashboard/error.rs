//! Error types for the dashboard CLI.

use dashboard_sdk::error::DashboardError;

use crate::config::ConfigError;

/// Main error type for the dashboard CLI.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Alloy signer error: {0}")]
    AlloySigner(#[from] alloy::signers::local::LocalSignerError),

    #[error("Dashboard SDK error: {0}")]
    Dashboard(#[from] DashboardError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("No account given and no PRIVATE_KEY configured")]
    NoAccount,

    #[error("Signing requires PRIVATE_KEY")]
    NoWallet,

    #[error("Nothing to claim")]
    NothingToClaim,

    #[error("Operation timeout after {0} seconds")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
