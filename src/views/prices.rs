//! USD prices of the dashboard tokens.
//!
//! Stablecoins are priced at one dollar. The governance token and the
//! liquidity token of its USDC Uniswap V2 pair are priced from the pair
//! reserves.

use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use fastnum::UD128;
use tracing::{debug, warn};

use crate::{
    abi::uniswap_v2::UniswapV2,
    client::ContractClient,
    error::DashboardError,
    num::Converter,
    views::{PoolKind, TokenMeta},
};

/// Reserves of a USDC Uniswap V2 pair, in base units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairReserves {
    pub usdc_reserve: U256,
    pub bond_reserve: U256,
    /// Supply of the pair liquidity token.
    pub total_supply: U256,
    /// Unix time of the last reserves update, in seconds.
    pub last_block_time: u32,
}

/// `(reserve0, reserve1)` as `(usdc, other)`, by which side of the pair
/// `usdc` is. `None` when the pair does not hold `usdc`.
pub fn order_reserves(
    usdc: Address,
    (token0, reserve0): (Address, U256),
    (token1, reserve1): (Address, U256),
) -> Option<(U256, U256)> {
    if token0 == usdc {
        Some((reserve0, reserve1))
    } else if token1 == usdc {
        Some((reserve1, reserve0))
    } else {
        None
    }
}

/// Reads reserves of `pair`, `None` if `usdc` is not one of its tokens.
pub async fn fetch_pair_reserves<C: ContractClient>(
    client: &C,
    pair: Address,
    usdc: Address,
) -> Result<Option<PairReserves>, DashboardError> {
    let (reserves, token0, token1, total_supply) = futures::try_join!(
        client.read(pair, &UniswapV2::getReservesCall {}),
        client.read(pair, &UniswapV2::token0Call {}),
        client.read(pair, &UniswapV2::token1Call {}),
        client.read(pair, &UniswapV2::totalSupplyCall {}),
    )?;
    let Some((usdc_reserve, bond_reserve)) = order_reserves(
        usdc,
        (token0, U256::from(reserves.reserve0)),
        (token1, U256::from(reserves.reserve1)),
    ) else {
        debug!(%pair, %token0, %token1, "Pair does not hold USDC");
        return Ok(None);
    };
    Ok(Some(PairReserves {
        usdc_reserve,
        bond_reserve,
        total_supply,
        last_block_time: reserves.blockTimestampLast,
    }))
}

/// `numerator / denominator` of two token amounts, `None` for a zero
/// denominator.
fn ratio(numerator: (U256, u8), denominator: (U256, u8)) -> Option<UD128> {
    let numerator: UD128 = Converter::new(numerator.1).from_unsigned(numerator.0).ok()?;
    let denominator: UD128 = Converter::new(denominator.1)
        .from_unsigned(denominator.0)
        .ok()?;
    (denominator != UD128::ZERO).then(|| numerator / denominator)
}

/// USD price per whole token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenPrices {
    prices: HashMap<Address, UD128>,
}

impl TokenPrices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prices of `tokens`. Without `reserves` only stablecoins are priced.
    ///
    /// The governance token is worth `usdc_reserve / bond_reserve`, the
    /// liquidity token `2 × usdc_reserve / total_supply`.
    pub fn from_reserves(
        tokens: &[TokenMeta],
        usdc_decimals: u8,
        reserves: Option<&PairReserves>,
    ) -> Self {
        let mut prices = Self::new();
        for token in tokens {
            let price = match (token.pool, reserves) {
                (PoolKind::Stable, _) => Some(UD128::ONE),
                (PoolKind::Governance, Some(reserves)) => ratio(
                    (reserves.usdc_reserve, usdc_decimals),
                    (reserves.bond_reserve, token.decimals),
                ),
                (PoolKind::UniLp, Some(reserves)) => ratio(
                    (reserves.usdc_reserve.saturating_mul(U256::from(2)), usdc_decimals),
                    (reserves.total_supply, token.decimals),
                ),
                (_, None) => None,
            };
            if let Some(price) = price {
                prices.insert(token.address, price);
            }
        }
        prices
    }

    pub fn insert(&mut self, token: Address, price: UD128) {
        self.prices.insert(token, price);
    }

    pub fn get(&self, token: &Address) -> Option<UD128> {
        self.prices.get(token).copied()
    }

    /// USD value of `amount` whole tokens, `None` without a price.
    pub fn usd_amount(&self, token: &Address, amount: UD128) -> Option<UD128> {
        self.get(token).map(|price| amount * price)
    }
}

/// Loads prices of `tokens` from the governance token / USDC `pair`.
///
/// A pair failing to respond leaves only stablecoins priced.
pub async fn load_token_prices<C: ContractClient>(
    client: &C,
    pair: Address,
    usdc: &TokenMeta,
    tokens: &[TokenMeta],
) -> TokenPrices {
    let reserves = match fetch_pair_reserves(client, pair, usdc.address).await {
        Ok(reserves) => reserves,
        Err(err) => {
            warn!(%pair, %err, "Failed to load pair reserves");
            None
        }
    };
    TokenPrices::from_reserves(tokens, usdc.decimals, reserves.as_ref())
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;
    use crate::testing::{MockContractClient, fixtures};

    const USDC_UNIT: u128 = 1_000_000;
    const ETHER: u128 = 1_000_000_000_000_000_000;

    fn usdc() -> TokenMeta {
        fixtures::token(0x01, "USDC", 6, PoolKind::Stable)
    }

    fn bond() -> TokenMeta {
        fixtures::token(0x04, "BOND", 18, PoolKind::Governance)
    }

    fn pair() -> TokenMeta {
        fixtures::token(0x03, "UNI-V2", 18, PoolKind::UniLp)
    }

    fn tokens() -> Vec<TokenMeta> {
        vec![
            usdc(),
            fixtures::token(0x02, "DAI", 18, PoolKind::Stable),
            pair(),
            bond(),
        ]
    }

    #[test]
    fn test_order_reserves() {
        let usdc = usdc().address;
        let bond = bond().address;
        let (small, large) = (U256::from(1), U256::from(2));

        assert_eq!(
            order_reserves(usdc, (usdc, small), (bond, large)),
            Some((small, large))
        );
        assert_eq!(
            order_reserves(usdc, (bond, large), (usdc, small)),
            Some((small, large))
        );
        assert_eq!(
            order_reserves(usdc, (bond, small), (Address::ZERO, large)),
            None
        );
    }

    #[tokio::test]
    async fn test_fetch_reserves_with_usdc_as_token0() {
        let client = MockContractClient::new();
        fixtures::respond_pair(
            &client,
            pair().address,
            (usdc().address, 500_000 * USDC_UNIT),
            (bond().address, 100_000 * ETHER),
            1_000 * ETHER,
        );

        let reserves = fetch_pair_reserves(&client, pair().address, usdc().address)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reserves.usdc_reserve, U256::from(500_000 * USDC_UNIT));
        assert_eq!(reserves.bond_reserve, U256::from(100_000 * ETHER));
        assert_eq!(reserves.total_supply, U256::from(1_000 * ETHER));
        assert_eq!(reserves.last_block_time, 1_617_000_000);
    }

    #[tokio::test]
    async fn test_fetch_reserves_with_usdc_as_token1() {
        let client = MockContractClient::new();
        fixtures::respond_pair(
            &client,
            pair().address,
            (bond().address, 100_000 * ETHER),
            (usdc().address, 500_000 * USDC_UNIT),
            1_000 * ETHER,
        );

        let reserves = fetch_pair_reserves(&client, pair().address, usdc().address)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reserves.usdc_reserve, U256::from(500_000 * USDC_UNIT));
        assert_eq!(reserves.bond_reserve, U256::from(100_000 * ETHER));

        let prices = TokenPrices::from_reserves(&tokens(), 6, Some(&reserves));
        assert_eq!(prices.get(&bond().address), Some(udec128!(5)));
        assert_eq!(prices.get(&pair().address), Some(udec128!(1000)));
        assert_eq!(prices.get(&usdc().address), Some(UD128::ONE));
        assert_eq!(prices.get(&Address::with_last_byte(0x02)), Some(UD128::ONE));
    }

    #[tokio::test]
    async fn test_pair_without_usdc() {
        let client = MockContractClient::new();
        fixtures::respond_pair(
            &client,
            pair().address,
            (bond().address, ETHER),
            (Address::with_last_byte(0x02), ETHER),
            ETHER,
        );

        let reserves = fetch_pair_reserves(&client, pair().address, usdc().address)
            .await
            .unwrap();
        assert_eq!(reserves, None);
    }

    #[tokio::test]
    async fn test_failed_pair_prices_stablecoins_only() {
        let client = MockContractClient::new();
        let prices = load_token_prices(&client, pair().address, &usdc(), &tokens()).await;

        assert_eq!(prices.get(&usdc().address), Some(UD128::ONE));
        assert_eq!(prices.get(&bond().address), None);
        assert_eq!(prices.usd_amount(&bond().address, udec128!(2)), None);
        assert_eq!(prices.get(&pair().address), None);
    }

    #[test]
    fn test_empty_pool_has_no_price() {
        let reserves = PairReserves {
            usdc_reserve: U256::from(USDC_UNIT),
            bond_reserve: U256::ZERO,
            total_supply: U256::ZERO,
            last_block_time: 0,
        };
        let prices = TokenPrices::from_reserves(&tokens(), 6, Some(&reserves));
        assert_eq!(prices.get(&bond().address), None);
        assert_eq!(prices.get(&pair().address), None);
    }
}
