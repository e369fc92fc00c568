use alloy::primitives::{Address, TxHash, U256};
use serde::Deserialize;

use super::{IndexerClient, de_decimal, parse_units};
use crate::{
    error::DashboardError,
    pipeline::{Keyed, Page, PageSource},
};

const STAKING_ACTIONS_PATH: &str = "/api/yieldfarming/staking-actions/list";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PoolTxType {
    Deposit,
    Withdraw,
}

impl PoolTxType {
    fn as_param(&self) -> &'static str {
        match self {
            PoolTxType::Deposit => "DEPOSIT",
            PoolTxType::Withdraw => "WITHDRAW",
        }
    }
}

/// Staking pool transaction filters, `None` meaning "all".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolTxFilter {
    pub user: Option<Address>,
    pub token: Option<Address>,
    pub tx_type: Option<PoolTxType>,
}

impl PoolTxFilter {
    fn params(&self, page: usize, limit: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(user) = self.user {
            params.push(("userAddress", format!("{user:#x}")));
        }
        if let Some(token) = self.token {
            params.push(("tokenAddress", format!("{token:#x}")));
        }
        if let Some(tx_type) = self.tx_type {
            params.push(("actionType", tx_type.as_param().to_string()));
        }
        params
    }
}

/// Deposit to or withdrawal from a yield farming staking pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolTx {
    pub user: Address,
    pub token: Address,
    /// Amount in token base units.
    pub amount: U256,
    pub tx_type: PoolTxType,
    pub tx_hash: TxHash,
    pub block_timestamp: u64,
}

impl Keyed for PoolTx {
    type Key = Address;

    fn key(&self) -> &Address {
        &self.token
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPoolTx {
    user_address: Address,
    token_address: Address,
    amount: String,
    action_type: PoolTxType,
    transaction_hash: TxHash,
    #[serde(deserialize_with = "de_decimal")]
    block_timestamp: u64,
}

impl TryFrom<RawPoolTx> for PoolTx {
    type Error = DashboardError;

    fn try_from(raw: RawPoolTx) -> Result<Self, Self::Error> {
        Ok(Self {
            user: raw.user_address,
            token: raw.token_address,
            amount: parse_units("amount", &raw.amount)?,
            tx_type: raw.action_type,
            tx_hash: raw.transaction_hash,
            block_timestamp: raw.block_timestamp,
        })
    }
}

fn into_page(page: Page<RawPoolTx>) -> Result<Page<PoolTx>, DashboardError> {
    let items = page
        .items
        .into_iter()
        .map(PoolTx::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page.total))
}

/// Staking pool transactions, most recent first.
#[derive(Clone, Debug)]
pub struct PoolTxSource {
    indexer: IndexerClient,
}

impl PoolTxSource {
    pub fn new(indexer: IndexerClient) -> Self {
        Self { indexer }
    }
}

impl PageSource for PoolTxSource {
    type Item = PoolTx;
    type Filter = PoolTxFilter;

    async fn fetch_page(
        &self,
        filter: &PoolTxFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Page<PoolTx>, DashboardError> {
        let page = offset / limit.max(1) + 1;
        let raw = self
            .indexer
            .paginated::<RawPoolTx>(STAKING_ACTIONS_PATH, &filter.params(page, limit))
            .await?;
        into_page(raw)
    }
}
