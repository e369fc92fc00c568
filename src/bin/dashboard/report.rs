//! Plain text rendering of loaded views.

use alloy::primitives::{Address, TxHash};
use dashboard_sdk::{
    indexer::PoolMeta,
    pipeline::{Loadable, MetadataTable, Standing},
    views::{JuniorPortfolio, PastPositions, PoolTxTable, RankView, Rewards},
};
use fastnum::UD128;

fn amount(value: Option<UD128>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

pub fn rank(view: &RankView) {
    match view {
        RankView::NotConnected => println!("No account to rank"),
        RankView::Loading => println!("Voters not loaded"),
        RankView::Unranked => println!("Account is not ranked"),
        RankView::Ranked(standing) => {
            println!("Rank:         #{}", standing.rank);
            println!("Voting power: {}", standing.voting_power);
            match standing.prize.rate {
                Some(rate) => println!("Prize:        {} (top {rate}%)", standing.prize.title),
                None => println!("Prize:        {} (everyone)", standing.prize.title),
            }
            match standing.standing {
                Standing::Until(delta) => println!("Until prize:  {delta}"),
                Standing::Ahead(delta) => println!("Ahead by:     {delta}"),
            }
            println!("Progress:     {}%", standing.progress);
        }
    }
}

pub fn portfolio(
    portfolio: &JuniorPortfolio,
    past: &PastPositions,
    pools: &MetadataTable<Address, PoolMeta>,
) {
    println!("Total balance:  {}", amount(portfolio.total_balance()));
    println!("Active balance: {}", amount(portfolio.active_balance()));
    println!("Locked balance: {}", amount(portfolio.locked_balance()));
    if let Some(apy) = portfolio.apy() {
        println!("Junior APY:     {apy:.2}");
    }

    if let Loadable::Loaded(active) = portfolio.active() {
        println!("\nActive positions:");
        for position in active {
            println!(
                "  {:<8} {}",
                position.pool.underlying_symbol,
                amount(position.balance())
            );
        }
    }
    if let Loadable::Loaded(locked) = portfolio.locked() {
        println!("\nLocked positions:");
        for position in locked {
            println!(
                "  {:<8} bond #{} {} matures at {}",
                position.pool.underlying_symbol,
                position.bond_id,
                amount(position.balance()),
                position.matures_at
            );
        }
    }

    if let Some(entities) = past.entities(pools) {
        println!(
            "\nPast positions (page {}, {} total):",
            past.page(),
            past.total().unwrap_or_default()
        );
        for entity in entities {
            let redeem = entity.target();
            let (symbol, out) = match entity.meta() {
                Some(pool) => (
                    pool.underlying_symbol.as_str(),
                    pool.underlying().from_unsigned(redeem.underlying_out).ok(),
                ),
                None => ("?", None),
            };
            println!(
                "  {symbol:<8} bond #{} {} at {} ({})",
                redeem.junior_bond_id,
                amount(out),
                redeem.block_timestamp,
                redeem.tx_hash
            );
        }
    }
}

pub fn rewards(rewards: &Rewards) {
    println!("To claim:         {}", amount(rewards.total_to_claim()));
    println!("Potential reward: {}", amount(rewards.total_potential_reward()));
    println!("Wallet balance:   {}", amount(rewards.token_balance()));

    if let Loadable::Loaded(farms) = rewards.farms() {
        for farm in farms {
            let epoch = if farm.is_ended() {
                "ended".to_string()
            } else {
                format!("epoch {}/{}", farm.current_epoch, farm.epochs)
            };
            println!(
                "  {} {epoch:<12} to claim {} potential {}",
                farm.farm, farm.to_claim, farm.potential_reward
            );
        }
    }
}

pub fn claimed(farm: Address, tx_hash: TxHash) {
    println!("Claimed {farm} in {tx_hash}");
}

pub fn transactions(table: &PoolTxTable) {
    println!(
        "{} of {} transactions",
        table.transactions().len(),
        table.total().unwrap_or_default()
    );
    for tx in table.transactions() {
        println!(
            "  {:?} {} {} by {} at {} ({})",
            tx.tx_type, tx.amount, tx.token, tx.user, tx.block_timestamp, tx.tx_hash
        );
    }
}
