//! View models of the dashboard screens, built on [`crate::pipeline`].
//!
//! Views hold loaded state between interactions. Loading is driven by the
//! caller (`load` methods), views never spawn tasks on their own.

pub mod portfolio;
pub mod prices;
pub mod ranking;
pub mod rewards;
pub mod transactions;

pub use portfolio::{ActivePosition, JuniorPortfolio, LockedPosition, PastPositions};
pub use prices::{PairReserves, TokenPrices, fetch_pair_reserves, load_token_prices};
pub use ranking::{Prize, RankStanding, RankView, load_all_voters, next_prize, rank_view};
pub use rewards::{FarmRewards, Rewards};
pub use transactions::{PoolKind, PoolTxRow, PoolTxTable, TokenMeta, TokenOption, token_filter_options};
