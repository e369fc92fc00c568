//! DeFi dashboard SDK.
//!
//! # Overview
//!
//! Aggregates per-account state spread over many contracts and indexer
//! endpoints into dashboard view models: junior tranche portfolio, yield
//! farming rewards, governance voting rank and staking pool transactions.
//!
//! Remote sources are queried through [`client::ContractClient`] (contract
//! reads and transactions) and [`indexer::IndexerClient`] (GraphQL subgraph
//! and REST API). [`pipeline`] turns the per-source results into ordered
//! views, tolerating failures of individual sources, and [`views`] builds
//! the concrete screens on top of it.
//!
//! Use [`stream::blocks`] to refresh views when new blocks are mined.
//!
//! # Limitations/follow-ups
//!
//! * Views are driven by the caller and hold no background tasks. A
//!   superseded load is ignored rather than aborted.
//!
//! * USD prices come from the governance token / USDC Uniswap V2 pair
//!   only. Other tokens besides stablecoins have no USD amount.
//!
//! # Testing
//!
//! [`testing`] module provides in-memory contract client, page source and
//! wallet implementations, together with fixtures.
//!

pub mod abi;
pub mod client;
pub mod error;
pub mod indexer;
pub mod num;
pub mod pipeline;
pub mod stream;
pub mod testing;
pub mod views;
pub mod wallet;

use alloy::primitives::Address;

#[derive(Clone, Debug)]
/// Chain the dashboard contracts are deployed on.
pub struct Chain {
    chain_id: u64,
    yield_farms: Vec<Address>,
    governance_token: Option<Address>,
}

impl Chain {
    pub fn custom(
        chain_id: u64,
        yield_farms: Vec<Address>,
        governance_token: Option<Address>,
    ) -> Self {
        Self {
            chain_id,
            yield_farms,
            governance_token,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Staking farms paying governance token rewards.
    pub fn yield_farms(&self) -> &[Address] {
        &self.yield_farms
    }

    pub fn governance_token(&self) -> Option<Address> {
        self.governance_token
    }
}
