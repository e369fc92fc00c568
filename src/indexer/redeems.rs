use alloy::primitives::{Address, TxHash, U256};
use serde::Deserialize;

use super::{IndexerClient, de_decimal, parse_units};
use crate::{
    error::DashboardError,
    pipeline::{Keyed, Page, PageSource},
};

/// Redeemed junior bond of an account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JuniorRedeem {
    pub smart_yield_address: Address,
    pub junior_bond_id: U256,
    /// Underlying paid out, in underlying base units.
    pub underlying_out: U256,
    pub tx_hash: TxHash,
    pub block_timestamp: u64,
}

impl Keyed for JuniorRedeem {
    type Key = Address;

    fn key(&self) -> &Address {
        &self.smart_yield_address
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawJuniorRedeem {
    smart_yield_address: Address,
    #[serde(deserialize_with = "de_decimal")]
    junior_bond_id: U256,
    underlying_out: String,
    transaction_hash: TxHash,
    #[serde(deserialize_with = "de_decimal")]
    block_timestamp: u64,
}

impl TryFrom<RawJuniorRedeem> for JuniorRedeem {
    type Error = DashboardError;

    fn try_from(raw: RawJuniorRedeem) -> Result<Self, Self::Error> {
        Ok(Self {
            smart_yield_address: raw.smart_yield_address,
            junior_bond_id: raw.junior_bond_id,
            underlying_out: parse_units("underlyingOut", &raw.underlying_out)?,
            tx_hash: raw.transaction_hash,
            block_timestamp: raw.block_timestamp,
        })
    }
}

/// Junior bond redeems of the account given as filter.
#[derive(Clone, Debug)]
pub struct JuniorRedeemSource {
    indexer: IndexerClient,
}

impl JuniorRedeemSource {
    pub fn new(indexer: IndexerClient) -> Self {
        Self { indexer }
    }
}

fn redeems_path(account: &Address) -> String {
    format!("/api/smartyield/users/{account:#x}/redeems/junior")
}

impl PageSource for JuniorRedeemSource {
    type Item = JuniorRedeem;
    type Filter = Address;

    async fn fetch_page(
        &self,
        account: &Address,
        offset: usize,
        limit: usize,
    ) -> Result<Page<JuniorRedeem>, DashboardError> {
        let page = offset / limit.max(1) + 1;
        let params = [("page", page.to_string()), ("limit", limit.to_string())];
        let raw = self
            .indexer
            .paginated::<RawJuniorRedeem>(&redeems_path(account), &params)
            .await?;
        let items = raw
            .items
            .into_iter()
            .map(JuniorRedeem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, raw.total))
    }
}
