//! Junior tranche portfolio of an account across all smart yield pools.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::SolCall;
use fastnum::UD128;

use crate::{
    abi::{
        junior_bond::JuniorBond,
        smart_yield::SmartYield::{self, Abond},
    },
    client::{ContractClient, decode_all},
    error::DashboardError,
    indexer::{JuniorRedeem, PoolMeta},
    pipeline::{
        FetchResult, Loadable, MetadataTable, Page, PageSource, Ticket, ViewEntity, ViewSlot,
        aggregate::sum_by, fetch_sequential, flatten_populated, join, retain_populated,
    },
};

/// Junior tokens held in a pool.
#[derive(Clone, Debug)]
pub struct ActivePosition {
    pub pool: Arc<PoolMeta>,
    /// Junior token balance, in underlying base units.
    pub tokens: U256,
    pub abond: Abond,
}

impl ActivePosition {
    pub fn balance(&self) -> Option<UD128> {
        self.pool.underlying().from_unsigned(self.tokens).ok()
    }
}

/// Junior bond locked until maturity.
#[derive(Clone, Debug, PartialEq)]
pub struct LockedPosition {
    pub pool: Arc<PoolMeta>,
    pub bond_id: U256,
    pub tokens: U256,
    pub matures_at: U256,
}

impl LockedPosition {
    pub fn balance(&self) -> Option<UD128> {
        self.pool.underlying().from_unsigned(self.tokens).ok()
    }
}

/// Active junior positions of `account`, one per pool with non-zero balance,
/// in pool order. `None` if the run got superseded.
pub async fn fetch_active_positions<C: ContractClient>(
    client: &C,
    account: Address,
    pools: &[Arc<PoolMeta>],
    ticket: &Ticket,
) -> Option<Vec<ActivePosition>> {
    let results = fetch_sequential(pools.iter().cloned(), ticket, move |pool| async move {
        let sy = pool.smart_yield_address;
        let tokens = client
            .read(sy, &SmartYield::balanceOfCall { owner: account })
            .await?;
        let abond = client.read(sy, &SmartYield::abondCall {}).await?;

        Ok::<_, DashboardError>(if tokens.is_zero() {
            FetchResult::NotApplicable
        } else {
            FetchResult::Populated(ActivePosition {
                pool,
                tokens,
                abond,
            })
        })
    })
    .await?;
    Some(retain_populated(results))
}

/// Junior bonds of `account` across all pools, in pool order and bond index
/// order within a pool. `None` if the run got superseded.
pub async fn fetch_locked_positions<C: ContractClient>(
    client: &C,
    account: Address,
    pools: &[Arc<PoolMeta>],
    ticket: &Ticket,
) -> Option<Vec<LockedPosition>> {
    let results = fetch_sequential(pools.iter().cloned(), ticket, move |pool| async move {
        let bonds = pool_bonds(client, account, pool).await?;
        Ok::<_, DashboardError>(if bonds.is_empty() {
            FetchResult::NotApplicable
        } else {
            FetchResult::Populated(bonds)
        })
    })
    .await?;
    Some(flatten_populated(results))
}

async fn pool_bonds<C: ContractClient>(
    client: &C,
    account: Address,
    pool: Arc<PoolMeta>,
) -> Result<Vec<LockedPosition>, DashboardError> {
    let count = client
        .read(
            pool.junior_bond_address,
            &JuniorBond::balanceOfCall { owner: account },
        )
        .await?;
    let count = u64::try_from(count).map_err(|_| DashboardError::Overflow(count))?;
    if count == 0 {
        return Ok(vec![]);
    }

    let id_calls = (0..count)
        .map(|index| {
            let call = JuniorBond::tokenOfOwnerByIndexCall {
                owner: account,
                index: U256::from(index),
            };
            (pool.junior_bond_address, Bytes::from(call.abi_encode()))
        })
        .collect();
    let ids = decode_all::<JuniorBond::tokenOfOwnerByIndexCall>(&client.batch_read(id_calls).await?)?;

    let bond_calls = ids
        .iter()
        .map(|id| {
            let call = SmartYield::juniorBondsCall { jBondId: *id };
            (pool.smart_yield_address, Bytes::from(call.abi_encode()))
        })
        .collect();
    let bonds = decode_all::<SmartYield::juniorBondsCall>(&client.batch_read(bond_calls).await?)?;

    Ok(ids
        .into_iter()
        .zip(bonds)
        .map(|(bond_id, bond)| LockedPosition {
            pool: pool.clone(),
            bond_id,
            tokens: bond.tokens,
            matures_at: bond.maturesAt,
        })
        .collect())
}

/// Active and locked junior positions of one account.
#[derive(Debug, Default)]
pub struct JuniorPortfolio {
    account: Option<Address>,
    active: ViewSlot<Vec<ActivePosition>>,
    locked: ViewSlot<Vec<LockedPosition>>,
}

impl JuniorPortfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    /// Switches the account, dropping everything loaded for the previous one
    /// including runs still in flight.
    pub fn set_account(&mut self, account: Option<Address>) {
        if self.account == account {
            return;
        }
        self.account = account;
        self.active.reset();
        self.locked.reset();
    }

    /// Loads both position sets for the current account. The two flows
    /// interleave, each pool's queries are issued one pool at a time.
    ///
    /// No-op without an account.
    pub async fn load<C: ContractClient>(&mut self, client: &C, pools: &[Arc<PoolMeta>]) {
        let Some(account) = self.account else {
            return;
        };
        let active_ticket = self.active.begin();
        let locked_ticket = self.locked.begin();

        let (active, locked) = futures::join!(
            fetch_active_positions(client, account, pools, &active_ticket),
            fetch_locked_positions(client, account, pools, &locked_ticket),
        );

        if let Some(active) = active {
            tracing::debug!(%account, positions = active.len(), "Active junior positions loaded");
            self.active.commit(&active_ticket, active);
        }
        if let Some(locked) = locked {
            tracing::debug!(%account, positions = locked.len(), "Locked junior positions loaded");
            self.locked.commit(&locked_ticket, locked);
        }
    }

    pub fn active(&self) -> &Loadable<Vec<ActivePosition>> {
        self.active.get()
    }

    pub fn locked(&self) -> &Loadable<Vec<LockedPosition>> {
        self.locked.get()
    }

    /// `true` once a redeem changed on-chain state and positions should be
    /// reloaded.
    pub fn is_stale(&self) -> bool {
        self.active.is_stale() || self.locked.is_stale()
    }

    pub fn active_balance(&self) -> Option<UD128> {
        sum_by(self.active.get().as_slice(), ActivePosition::balance)
    }

    pub fn locked_balance(&self) -> Option<UD128> {
        sum_by(self.locked.get().as_slice(), LockedPosition::balance)
    }

    /// Active plus locked balance, `None` until active positions are loaded.
    pub fn total_balance(&self) -> Option<UD128> {
        if !self.active.get().is_loaded() {
            return None;
        }
        Some(
            self.active_balance().unwrap_or(UD128::ZERO)
                + self.locked_balance().unwrap_or(UD128::ZERO),
        )
    }

    /// Junior APY of the first active position's pool.
    pub fn apy(&self) -> Option<f64> {
        self.active
            .get()
            .as_slice()?
            .first()
            .map(|position| position.pool.junior_apy)
    }

    /// Redeems a matured junior bond. Loaded positions stay as they are
    /// until the transaction is mined, then both sets are marked stale.
    pub async fn redeem<C: ContractClient>(
        &mut self,
        client: &C,
        position: &LockedPosition,
    ) -> Result<TxHash, DashboardError> {
        let account = self.account.ok_or(DashboardError::NotConnected)?;
        let tx_hash = client
            .send_call(
                account,
                position.pool.smart_yield_address,
                &SmartYield::redeemJuniorBondCall {
                    jBondId: position.bond_id,
                },
            )
            .await?;
        tracing::info!(%account, bond_id = %position.bond_id, %tx_hash, "Junior bond redeemed");

        self.active.mark_stale();
        self.locked.mark_stale();
        Ok(tx_hash)
    }
}

/// One page of redeemed junior bonds, joined with pool metadata.
#[derive(Debug)]
pub struct PastPositions {
    account: Option<Address>,
    page: usize,
    page_size: usize,
    slot: ViewSlot<Page<JuniorRedeem>>,
}

impl PastPositions {
    pub fn new(page_size: usize) -> Self {
        Self {
            account: None,
            page: 1,
            page_size: page_size.max(1),
            slot: ViewSlot::new(),
        }
    }

    pub fn set_account(&mut self, account: Option<Address>) {
        if self.account != account {
            self.account = account;
            self.page = 1;
            self.slot.reset();
        }
    }

    /// Selects the 1-based page to show, takes effect on the next load.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Loads the selected page. A failed query shows an empty page.
    pub async fn load<S>(&mut self, source: &S)
    where
        S: PageSource<Item = JuniorRedeem, Filter = Address>,
    {
        let Some(account) = self.account else {
            return;
        };
        let ticket = self.slot.begin();
        let offset = (self.page - 1) * self.page_size;
        let page = match source.fetch_page(&account, offset, self.page_size).await {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(%account, %err, page = self.page, "Failed to load junior redeems");
                Page::empty()
            }
        };
        self.slot.commit(&ticket, page);
    }

    /// Total number of redeems, `None` until loaded.
    pub fn total(&self) -> Option<usize> {
        self.slot.get().loaded().map(|page| page.total)
    }

    pub fn entities<'a>(
        &'a self,
        pools: &MetadataTable<Address, PoolMeta>,
    ) -> Option<Vec<ViewEntity<&'a JuniorRedeem, PoolMeta>>> {
        let page = self.slot.get().loaded()?;
        Some(join(&page.items, pools))
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;
    use crate::{
        pipeline::Epoch,
        testing::{MockContractClient, MockPageSource, fixtures},
    };

    fn account() -> Address {
        Address::with_last_byte(0xa1)
    }

    #[tokio::test]
    async fn test_active_positions_skip_empty_and_failed_pools() {
        let client = MockContractClient::new();
        let pools = vec![
            fixtures::pool(1, "USDC", 6),
            fixtures::pool(2, "DAI", 18),
            fixtures::pool(3, "USDT", 6),
        ];
        fixtures::respond_active(&client, &pools[0], account(), U256::from(2_500_000));
        fixtures::respond_active(&client, &pools[1], account(), U256::ZERO);
        // pool 3 has no responses, its calls fail

        let positions = fetch_active_positions(&client, account(), &pools, &Epoch::new().advance())
            .await
            .unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].pool.underlying_symbol, "USDC");
        assert_eq!(positions[0].balance(), Some(udec128!(2.5)));
    }

    #[tokio::test]
    async fn test_locked_positions_flattened_in_pool_order() {
        let client = MockContractClient::new();
        let pools = vec![
            fixtures::pool(1, "USDC", 6),
            fixtures::pool(2, "DAI", 18),
            fixtures::pool(3, "USDT", 6),
        ];
        fixtures::respond_bonds(&client, &pools[0], account(), &[(11, 1_000_000), (12, 500_000)]);
        fixtures::respond_bonds(&client, &pools[1], account(), &[]);
        fixtures::respond_bonds(&client, &pools[2], account(), &[(31, 3_000_000)]);

        let positions = fetch_locked_positions(&client, account(), &pools, &Epoch::new().advance())
            .await
            .unwrap();
        let ids: Vec<_> = positions.iter().map(|p| p.bond_id.to::<u64>()).collect();
        assert_eq!(ids, vec![11, 12, 31]);
        assert_eq!(positions[2].pool.underlying_symbol, "USDT");
    }

    #[tokio::test]
    async fn test_portfolio_balances() {
        let client = MockContractClient::new();
        let pools = vec![fixtures::pool(1, "USDC", 6), fixtures::pool(2, "DAI", 18)];
        fixtures::respond_active(&client, &pools[0], account(), U256::from(2_500_000));
        fixtures::respond_active(&client, &pools[1], account(), U256::ZERO);
        fixtures::respond_bonds(&client, &pools[0], account(), &[(11, 1_000_000)]);
        fixtures::respond_bonds(&client, &pools[1], account(), &[]);

        let mut portfolio = JuniorPortfolio::new();
        portfolio.load(&client, &pools).await;
        assert!(portfolio.active().loaded().is_none());
        assert_eq!(portfolio.total_balance(), None);

        portfolio.set_account(Some(account()));
        portfolio.load(&client, &pools).await;
        assert_eq!(portfolio.active_balance(), Some(udec128!(2.5)));
        assert_eq!(portfolio.locked_balance(), Some(udec128!(1)));
        assert_eq!(portfolio.total_balance(), Some(udec128!(3.5)));
        assert_eq!(portfolio.apy(), Some(pools[0].junior_apy));
    }

    #[tokio::test]
    async fn test_total_without_locked_positions() {
        let client = MockContractClient::new();
        let pools = vec![fixtures::pool(1, "USDC", 6)];
        fixtures::respond_active(&client, &pools[0], account(), U256::from(1_000_000));
        fixtures::respond_bonds(&client, &pools[0], account(), &[]);

        let mut portfolio = JuniorPortfolio::new();
        portfolio.set_account(Some(account()));
        portfolio.load(&client, &pools).await;
        assert_eq!(portfolio.locked().as_slice(), Some(&[][..]));
        assert_eq!(portfolio.locked_balance(), None);
        assert_eq!(portfolio.total_balance(), Some(udec128!(1)));
    }

    #[tokio::test]
    async fn test_redeem_marks_positions_stale() {
        let client = MockContractClient::new();
        let pools = vec![fixtures::pool(1, "USDC", 6)];
        fixtures::respond_active(&client, &pools[0], account(), U256::ZERO);
        fixtures::respond_bonds(&client, &pools[0], account(), &[(11, 1_000_000)]);

        let mut portfolio = JuniorPortfolio::new();
        portfolio.set_account(Some(account()));
        portfolio.load(&client, &pools).await;
        assert!(!portfolio.is_stale());

        let position = portfolio.locked().as_slice().unwrap()[0].clone();
        portfolio.redeem(&client, &position).await.unwrap();
        assert!(portfolio.is_stale());
        // positions are kept until reloaded
        assert_eq!(portfolio.locked().as_slice().map(<[_]>::len), Some(1));

        let sends = client.sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].from, account());
        assert_eq!(sends[0].to, pools[0].smart_yield_address);
    }

    #[tokio::test]
    async fn test_failed_redeem_keeps_positions_fresh() {
        let client = MockContractClient::new();
        let pools = vec![fixtures::pool(1, "USDC", 6)];
        fixtures::respond_active(&client, &pools[0], account(), U256::ZERO);
        fixtures::respond_bonds(&client, &pools[0], account(), &[(11, 1_000_000)]);

        let mut portfolio = JuniorPortfolio::new();
        portfolio.set_account(Some(account()));
        portfolio.load(&client, &pools).await;

        let position = portfolio.locked().as_slice().unwrap()[0].clone();
        client.revert_sends(true);
        assert!(matches!(
            portfolio.redeem(&client, &position).await,
            Err(DashboardError::Reverted(_))
        ));
        assert!(!portfolio.is_stale());
    }

    #[tokio::test]
    async fn test_account_change_resets() {
        let client = MockContractClient::new();
        let pools = vec![fixtures::pool(1, "USDC", 6)];
        fixtures::respond_active(&client, &pools[0], account(), U256::from(1_000_000));
        fixtures::respond_bonds(&client, &pools[0], account(), &[]);

        let mut portfolio = JuniorPortfolio::new();
        portfolio.set_account(Some(account()));
        portfolio.load(&client, &pools).await;
        assert!(portfolio.active().is_loaded());

        portfolio.set_account(Some(Address::with_last_byte(0xa2)));
        assert!(matches!(portfolio.active(), Loadable::NotLoaded));
        assert_eq!(portfolio.total_balance(), None);
    }

    #[tokio::test]
    async fn test_past_positions_page_joined_with_pools() {
        let pools = vec![fixtures::pool(1, "USDC", 6)];
        let table = crate::indexer::pools_table(&pools);
        let redeems = vec![
            fixtures::redeem(pools[0].smart_yield_address, 1),
            fixtures::redeem(Address::with_last_byte(0xee), 2),
            fixtures::redeem(pools[0].smart_yield_address, 3),
        ];
        let source = MockPageSource::new(redeems, |_: &Address, _: &JuniorRedeem| true);

        let mut past = PastPositions::new(2);
        past.load(&source).await;
        assert_eq!(past.total(), None);

        past.set_account(Some(account()));
        past.load(&source).await;
        assert_eq!(past.total(), Some(3));
        let entities = past.entities(&table).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].meta().map(|pool| pool.underlying_symbol.as_str()), Some("USDC"));
        assert!(entities[1].meta().is_none());

        past.set_page(2);
        past.load(&source).await;
        let entities = past.entities(&table).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].target().junior_bond_id, U256::from(3));
        assert_eq!(source.requests(), vec![(account(), 0, 2), (account(), 2, 2)]);
    }

    #[tokio::test]
    async fn test_past_positions_failure_shows_empty_page() {
        let source = MockPageSource::new(vec![], |_: &Address, _: &JuniorRedeem| true);
        source.fail_at(0);

        let mut past = PastPositions::new(10);
        past.set_account(Some(account()));
        past.load(&source).await;
        assert_eq!(past.total(), Some(0));
        assert_eq!(past.entities(&MetadataTable::default()).map(|e| e.len()), Some(0));
    }
}
