use std::sync::Arc;

use alloy::primitives::Address;
use serde::Deserialize;

use super::{IndexerClient, de_decimal};
use crate::{error::DashboardError, num::Converter, pipeline::MetadataTable};

const POOLS_PATH: &str = "/api/smartyield/pools";

/// Lending protocol a smart yield pool deposits into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarketMeta {
    pub id: &'static str,
    pub name: &'static str,
}

pub const MARKETS: &[MarketMeta] = &[
    MarketMeta {
        id: "compound/v2",
        name: "Compound",
    },
    MarketMeta {
        id: "aave/v2",
        name: "Aave",
    },
    MarketMeta {
        id: "cream/v2",
        name: "C.R.E.A.M.",
    },
];

impl MarketMeta {
    pub fn find(protocol_id: &str) -> Option<&'static MarketMeta> {
        MARKETS.iter().find(|market| market.id == protocol_id)
    }
}

/// Smart yield pool metadata, joined into portfolio positions.
#[derive(Clone, Debug, PartialEq)]
pub struct PoolMeta {
    pub protocol_id: String,
    pub market: Option<&'static MarketMeta>,
    pub smart_yield_address: Address,
    pub junior_bond_address: Address,
    pub underlying_address: Address,
    pub underlying_symbol: String,
    pub underlying_decimals: u8,
    /// Current junior APY as fraction, e.g. `0.05` for 5%.
    pub junior_apy: f64,
}

impl PoolMeta {
    pub fn underlying(&self) -> Converter {
        Converter::new(self.underlying_decimals)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPool {
    protocol_id: String,
    smart_yield_address: Address,
    junior_bond_address: Address,
    underlying_address: Address,
    underlying_symbol: String,
    #[serde(deserialize_with = "de_decimal")]
    underlying_decimals: u8,
    #[serde(default)]
    state: RawPoolState,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPoolState {
    #[serde(default)]
    junior_apy: f64,
}

impl From<RawPool> for PoolMeta {
    fn from(raw: RawPool) -> Self {
        let market = MarketMeta::find(&raw.protocol_id);
        if market.is_none() {
            tracing::debug!(protocol_id = %raw.protocol_id, "Unknown pool market");
        }
        Self {
            market,
            protocol_id: raw.protocol_id,
            smart_yield_address: raw.smart_yield_address,
            junior_bond_address: raw.junior_bond_address,
            underlying_address: raw.underlying_address,
            underlying_symbol: raw.underlying_symbol,
            underlying_decimals: raw.underlying_decimals,
            junior_apy: raw.state.junior_apy,
        }
    }
}

/// Pool metadata keyed by smart yield address.
pub fn pools_table(pools: &[Arc<PoolMeta>]) -> MetadataTable<Address, PoolMeta> {
    MetadataTable::from_shared(
        pools
            .iter()
            .map(|pool| (pool.smart_yield_address, pool.clone())),
    )
}

/// Loads metadata of all smart yield pools, in the order the API lists them.
pub async fn fetch_pools(indexer: &IndexerClient) -> Result<Vec<Arc<PoolMeta>>, DashboardError> {
    let raw: Vec<RawPool> = indexer.data(POOLS_PATH, &[]).await?;
    let pools: Vec<Arc<PoolMeta>> = raw.into_iter().map(|raw| Arc::new(raw.into())).collect();
    tracing::debug!(pools = pools.len(), "Loaded pool metadata");
    Ok(pools)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_pools_from_api() {
        let raw: Vec<RawPool> = serde_json::from_value(json!([
            {
                "protocolId": "compound/v2",
                "smartYieldAddress": "0x4b8d90d68f26def303dcb6cfc9b63a1aaec15840",
                "juniorBondAddress": "0x00000000000000000000000000000000000000b1",
                "underlyingAddress": "0x00000000000000000000000000000000000000c1",
                "underlyingSymbol": "USDC",
                "underlyingDecimals": 6,
                "state": { "juniorApy": 0.12 }
            },
            {
                "protocolId": "unknown/v1",
                "smartYieldAddress": "0x00000000000000000000000000000000000000a2",
                "juniorBondAddress": "0x00000000000000000000000000000000000000b2",
                "underlyingAddress": "0x00000000000000000000000000000000000000c2",
                "underlyingSymbol": "DAI",
                "underlyingDecimals": "18"
            }
        ]))
        .unwrap();

        let pools: Vec<Arc<PoolMeta>> = raw.into_iter().map(|raw| Arc::new(raw.into())).collect();
        assert_eq!(pools[0].underlying_symbol, "USDC");

        let table = pools_table(&pools);
        assert_eq!(table.len(), 2);

        let usdc = table
            .get(&"0x4b8d90d68f26def303dcb6cfc9b63a1aaec15840".parse().unwrap())
            .unwrap();
        assert_eq!(usdc.market.map(|market| market.name), Some("Compound"));
        assert_eq!(usdc.underlying().decimals(), 6);

        let dai = table.get(&Address::with_last_byte(0xa2)).unwrap();
        assert_eq!(dai.market, None);
        assert_eq!(dai.junior_apy, 0.0);
    }
}
