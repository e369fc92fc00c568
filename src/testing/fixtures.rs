use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256, aliases::U112};
use fastnum::UD128;

use super::MockContractClient;
use crate::{
    abi::{
        junior_bond::JuniorBond,
        smart_yield::SmartYield::{self, Abond},
        uniswap_v2::UniswapV2,
        yield_farm::YieldFarm,
    },
    indexer::{JuniorRedeem, MARKETS, PoolMeta, PoolTx, PoolTxType, Voter},
    views::{PoolKind, Prize, TokenMeta},
};

const JUNIOR_BOND_PREFIX: u8 = 0xb0;
const UNDERLYING_PREFIX: u8 = 0xc0;

fn prefixed(prefix: u8, id: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = prefix;
    bytes[19] = id;
    Address::from(bytes)
}

/// Compound pool with smart yield contract at `0x00..{id}`.
pub fn pool(id: u8, symbol: &str, decimals: u8) -> Arc<PoolMeta> {
    Arc::new(PoolMeta {
        protocol_id: MARKETS[0].id.to_string(),
        market: Some(&MARKETS[0]),
        smart_yield_address: Address::with_last_byte(id),
        junior_bond_address: prefixed(JUNIOR_BOND_PREFIX, id),
        underlying_address: prefixed(UNDERLYING_PREFIX, id),
        underlying_symbol: symbol.to_string(),
        underlying_decimals: decimals,
        junior_apy: 0.1 * id as f64,
    })
}

/// Registers junior token balance and abond of `account` in `pool`.
pub fn respond_active(client: &MockContractClient, pool: &PoolMeta, account: Address, tokens: U256) {
    client.respond(
        pool.smart_yield_address,
        &SmartYield::balanceOfCall { owner: account },
        &tokens,
    );
    client.respond(
        pool.smart_yield_address,
        &SmartYield::abondCall {},
        &Abond {
            principal: U256::from(1_000),
            gain: U256::from(10),
            issuedAt: U256::from(1_617_000_000),
            maturesAt: U256::from(1_620_000_000),
            liquidated: false,
        },
    );
}

/// Registers junior bonds `(id, tokens)` of `account` in `pool`.
pub fn respond_bonds(
    client: &MockContractClient,
    pool: &PoolMeta,
    account: Address,
    bonds: &[(u64, u64)],
) {
    client.respond(
        pool.junior_bond_address,
        &JuniorBond::balanceOfCall { owner: account },
        &U256::from(bonds.len()),
    );
    for (index, (id, tokens)) in bonds.iter().enumerate() {
        client.respond(
            pool.junior_bond_address,
            &JuniorBond::tokenOfOwnerByIndexCall {
                owner: account,
                index: U256::from(index),
            },
            &U256::from(*id),
        );
        client.respond(
            pool.smart_yield_address,
            &SmartYield::juniorBondsCall {
                jBondId: U256::from(*id),
            },
            &SmartYield::juniorBondsReturn {
                tokens: U256::from(*tokens),
                maturesAt: U256::from(1_620_000_000),
            },
        );
    }
}

/// Registers the reward state of `account` in `farm`.
#[allow(clippy::too_many_arguments)]
pub fn respond_farm(
    client: &MockContractClient,
    farm: Address,
    account: Address,
    to_claim: u128,
    current_epoch: u128,
    epochs: u128,
    total_distributed: u128,
    pool_size: u128,
    stake: u128,
) {
    client.respond(farm, &YieldFarm::massHarvestCall {}, &U256::from(to_claim));
    client.respond(farm, &YieldFarm::getCurrentEpochCall {}, &current_epoch);
    client.respond(farm, &YieldFarm::NR_OF_EPOCHSCall {}, &epochs);
    client.respond(
        farm,
        &YieldFarm::TOTAL_DISTRIBUTED_AMOUNTCall {},
        &U256::from(total_distributed),
    );
    client.respond(
        farm,
        &YieldFarm::getPoolSizeCall {
            epochId: current_epoch,
        },
        &U256::from(pool_size),
    );
    client.respond(
        farm,
        &YieldFarm::getEpochStakeCall {
            userAddress: account,
            epochId: current_epoch,
        },
        &U256::from(stake),
    );
}

pub fn redeem(smart_yield_address: Address, bond_id: u64) -> JuniorRedeem {
    JuniorRedeem {
        smart_yield_address,
        junior_bond_id: U256::from(bond_id),
        underlying_out: U256::from(1_000_000),
        tx_hash: TxHash::with_last_byte(bond_id as u8),
        block_timestamp: 1_617_000_000 + bond_id,
    }
}

/// Voter at `0x00..{id}` with the given whole voting power.
pub fn voter(id: u8, rank: u64, voting_power: u64) -> Voter {
    Voter {
        address: Address::with_last_byte(id),
        rank,
        voting_power: UD128::from(voting_power),
    }
}

pub fn prize(key: &str, rate: Option<u32>) -> Prize {
    Prize {
        key: key.to_string(),
        title: format!("{key} prize"),
        rate,
        date: 1_620_000_000,
    }
}

/// Token at `0x00..{id}`.
pub fn token(id: u8, symbol: &str, decimals: u8, pool: PoolKind) -> TokenMeta {
    TokenMeta {
        address: Address::with_last_byte(id),
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        decimals,
        pool,
    }
}

/// Staking transaction of `user` in the token at `0x00..{token_id}`.
pub fn pool_tx(user: Address, token_id: u8, amount: u64, tx_type: PoolTxType) -> PoolTx {
    PoolTx {
        user,
        token: Address::with_last_byte(token_id),
        amount: U256::from(amount),
        tx_type,
        tx_hash: TxHash::with_last_byte(amount as u8),
        block_timestamp: 1_617_000_000 + amount,
    }
}

/// Uniswap V2 pair at `pair` holding `reserve0` of `token0` and `reserve1`
/// of `token1` (base units).
pub fn respond_pair(
    client: &MockContractClient,
    pair: Address,
    (token0, reserve0): (Address, u128),
    (token1, reserve1): (Address, u128),
    total_supply: u128,
) {
    client.respond(
        pair,
        &UniswapV2::getReservesCall {},
        &UniswapV2::getReservesReturn {
            reserve0: U112::from(reserve0),
            reserve1: U112::from(reserve1),
            blockTimestampLast: 1_617_000_000,
        },
    );
    client.respond(pair, &UniswapV2::token0Call {}, &token0);
    client.respond(pair, &UniswapV2::token1Call {}, &token1);
    client.respond(pair, &UniswapV2::totalSupplyCall {}, &U256::from(total_supply));
}
