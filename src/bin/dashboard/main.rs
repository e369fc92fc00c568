//! Account dashboard CLI.
//!
//! This binary loads one dashboard view for an account (junior portfolio,
//! farming rewards, voting rank or staking transactions) and prints it, or
//! claims farming rewards with the configured key.

mod app;
mod config;
mod error;
mod report;

use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use dashboard_sdk::{Chain, indexer::IndexerClient, wallet::LocalWallet};
use std::{process::exit, time::Duration};
use tracing::error;
use url::Url;

use app::Dashboard;
use config::{CliConfig, EnvConfig};
use error::Result;

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    let cli_config = CliConfig::parse();
    if let Err(e) = cli_config.validate() {
        eprintln!("Invalid arguments: {}", e);
        exit(1);
    }

    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let dashboard = match build_dashboard(&env_config) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            eprintln!("Failed to create dashboard: {}", e);
            exit(1);
        }
    };

    if let Err(e) = dashboard.run(cli_config.command).await {
        error!(%e, "Dashboard command failed");
        exit(1);
    }
}

fn build_dashboard(env_config: &EnvConfig) -> Result<Dashboard> {
    let chain = Chain::custom(
        env_config.chain_id,
        env_config.yield_farms()?,
        env_config.governance_token()?,
    );

    let wallet = env_config
        .private_key
        .as_deref()
        .map(str::parse::<PrivateKeySigner>)
        .transpose()?
        .map(LocalWallet::new);

    // Default timeout is 30 seconds
    let timeout = Duration::from_secs(env_config.timeout_seconds.unwrap_or(30));

    let http = reqwest::Client::builder().timeout(timeout).build()?;
    let indexer = IndexerClient::new(
        http,
        Url::parse(&env_config.indexer_url)?,
        Url::parse(&env_config.api_url)?,
    );

    Dashboard::try_new(
        Url::parse(&env_config.node_rpc_url)?,
        indexer,
        chain,
        wallet,
        timeout,
    )
}
