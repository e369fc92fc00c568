//! Yield farming staking pool transaction table.

use alloy::primitives::{Address, TxHash};
use fastnum::UD128;
use itertools::Itertools;

use crate::{
    indexer::{PoolTx, PoolTxFilter, PoolTxType},
    num::Converter,
    pipeline::{ListStatus, MetadataTable, PageSource, PagedList},
    views::TokenPrices,
};

/// Staking pool kinds, each accepting its own set of tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Stable,
    UniLp,
    Governance,
}

/// Token known to the dashboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenMeta {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub pool: PoolKind,
}

/// Entry of the token filter selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenOption {
    All,
    Token { address: Address, name: String },
}

/// Token filter options for `pool`, or for every pool when `None`.
///
/// "All tokens" is offered unless exactly one token qualifies. A token
/// listed twice is offered once.
pub fn token_filter_options(pool: Option<PoolKind>, tokens: &[TokenMeta]) -> Vec<TokenOption> {
    let mut options: Vec<_> = tokens
        .iter()
        .filter(|token| pool.is_none_or(|pool| token.pool == pool))
        .unique_by(|token| token.address)
        .map(|token| TokenOption::Token {
            address: token.address,
            name: token.name.clone(),
        })
        .collect();
    if options.len() != 1 {
        options.insert(0, TokenOption::All);
    }
    options
}

/// Transaction joined with its token metadata.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct PoolTxRow {
    pub user: Address,
    pub token: Address,
    pub tx_type: PoolTxType,
    pub tx_hash: TxHash,
    pub block_timestamp: u64,
    /// Token symbol, `None` for an unknown token.
    pub symbol: Option<String>,
    /// Human amount, `None` for an unknown token.
    #[debug("{amount:?}")]
    pub amount: Option<UD128>,
    /// Amount in USD, `None` without a token price.
    pub usd_amount: Option<UD128>,
}

/// Staking transactions list with "load more" and user/token/type filters.
#[derive(Debug)]
pub struct PoolTxTable {
    list: PagedList<PoolTx, PoolTxFilter>,
}

impl Default for PoolTxTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolTxTable {
    pub fn new() -> Self {
        Self {
            list: PagedList::new(PoolTxFilter::default()),
        }
    }

    pub fn filter(&self) -> &PoolTxFilter {
        self.list.filter()
    }

    /// Shows only transactions of `user`, or everyone's with `None`.
    pub fn set_user(&mut self, user: Option<Address>) {
        let filter = PoolTxFilter {
            user,
            ..self.list.filter().clone()
        };
        self.list.set_filter(filter);
    }

    pub fn set_token(&mut self, token: Option<Address>) {
        let filter = PoolTxFilter {
            token,
            ..self.list.filter().clone()
        };
        self.list.set_filter(filter);
    }

    pub fn set_tx_type(&mut self, tx_type: Option<PoolTxType>) {
        let filter = PoolTxFilter {
            tx_type,
            ..self.list.filter().clone()
        };
        self.list.set_filter(filter);
    }

    pub async fn load_next<S>(&mut self, source: &S) -> bool
    where
        S: PageSource<Item = PoolTx, Filter = PoolTxFilter>,
    {
        self.list.load_next(source).await
    }

    pub fn status(&self) -> ListStatus {
        self.list.status()
    }

    pub fn is_end(&self) -> bool {
        self.list.is_end()
    }

    pub fn total(&self) -> Option<usize> {
        self.list.total()
    }

    pub fn transactions(&self) -> &[PoolTx] {
        self.list.items()
    }

    /// Loaded transactions joined with the token metadata snapshot and
    /// priced in USD.
    pub fn rows(
        &self,
        tokens: &MetadataTable<Address, TokenMeta>,
        prices: &TokenPrices,
    ) -> Vec<PoolTxRow> {
        self.list
            .entities(tokens)
            .into_iter()
            .map(|entity| {
                let tx = entity.target();
                let meta = entity.meta();
                let amount = meta.and_then(|meta| {
                    Converter::new(meta.decimals).from_unsigned(tx.amount).ok()
                });
                PoolTxRow {
                    user: tx.user,
                    token: tx.token,
                    tx_type: tx.tx_type,
                    tx_hash: tx.tx_hash,
                    block_timestamp: tx.block_timestamp,
                    symbol: meta.map(|meta| meta.symbol.clone()),
                    amount,
                    usd_amount: amount.and_then(|amount| prices.usd_amount(&tx.token, amount)),
                }
            })
            .collect()
    }
}
