//! In-memory collaborators and test utilities.
//!
//! [`MockContractClient`] answers typed contract calls from responses
//! registered upfront and records submitted transactions.
//!
//! [`MockPageSource`] serves a paginated list from a vector, filtered by a
//! predicate, and records requested pages.
//!
//! [`MockWallet`] is a wallet that starts disconnected.
//!
//! [`fixtures`] builds pools, voters, transactions and registers the
//! contract responses views expect.
//!

pub mod fixtures;

use std::{
    fmt::Debug,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
};

use alloy::{
    primitives::{Address, Bytes, TxHash},
    sol_types::SolCall,
};
use dashmap::{DashMap, DashSet};

use crate::{
    client::ContractClient,
    error::{DashboardError, RevertReason},
    pipeline::{Page, PageSource},
    wallet::Wallet,
};

/// Transaction submitted through [`MockContractClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentTx {
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
}

#[derive(Debug, Default)]
pub struct MockContractClient {
    responses: DashMap<(Address, Bytes), Bytes>,
    failing: DashSet<(Address, Bytes)>,
    sends: Mutex<Vec<SentTx>>,
    revert_sends: AtomicBool,
    block_number: AtomicU64,
    call_count: AtomicUsize,
}

impl MockContractClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the value returned by `call` on contract `to`.
    pub fn respond<C: SolCall>(&self, to: Address, call: &C, ret: &C::Return) {
        self.responses.insert(
            (to, call.abi_encode().into()),
            C::abi_encode_returns(ret).into(),
        );
    }

    /// Makes `call` on contract `to` fail with a transport error.
    pub fn fail<C: SolCall>(&self, to: Address, call: &C) {
        self.failing.insert((to, call.abi_encode().into()));
    }

    /// Makes every following transaction revert (or succeed again).
    pub fn revert_sends(&self, revert: bool) {
        self.revert_sends.store(revert, Ordering::Release);
    }

    pub fn set_block_number(&self, number: u64) {
        self.block_number.store(number, Ordering::Release);
    }

    pub fn block(&self) -> u64 {
        self.block_number.load(Ordering::Acquire)
    }

    /// Transactions submitted so far, in order.
    pub fn sends(&self) -> Vec<SentTx> {
        self.sends.lock().unwrap().clone()
    }

    /// Number of read calls served or failed so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Acquire)
    }
}

impl ContractClient for MockContractClient {
    async fn call(
        &self,
        _from: Option<Address>,
        to: Address,
        input: Bytes,
    ) -> Result<Bytes, DashboardError> {
        self.call_count.fetch_add(1, Ordering::AcqRel);
        let key = (to, input);
        if self.failing.contains(&key) {
            return Err(DashboardError::Transport(format!("call to {to} failed")));
        }
        self.responses
            .get(&key)
            .map(|output| output.clone())
            .ok_or_else(|| DashboardError::Transport(format!("no response registered for {to}")))
    }

    async fn send(
        &self,
        from: Address,
        to: Address,
        input: Bytes,
    ) -> Result<TxHash, DashboardError> {
        if self.revert_sends.load(Ordering::Acquire) {
            return Err(DashboardError::Reverted(RevertReason::Unknown));
        }
        let mut sends = self.sends.lock().unwrap();
        sends.push(SentTx { from, to, input });
        Ok(TxHash::with_last_byte(sends.len() as u8))
    }

    async fn block_number(&self) -> Result<u64, DashboardError> {
        Ok(self.block())
    }
}

/// Paginated list over an in-memory vector.
pub struct MockPageSource<T, F> {
    items: Vec<T>,
    predicate: fn(&F, &T) -> bool,
    requests: Mutex<Vec<(F, usize, usize)>>,
    failing_offsets: DashSet<usize>,
}

impl<T, F> MockPageSource<T, F> {
    pub fn new(items: Vec<T>, predicate: fn(&F, &T) -> bool) -> Self {
        Self {
            items,
            predicate,
            requests: Mutex::new(vec![]),
            failing_offsets: DashSet::new(),
        }
    }

    /// Makes requests starting at `offset` fail.
    pub fn fail_at(&self, offset: usize) {
        self.failing_offsets.insert(offset);
    }

    pub fn recover(&self) {
        self.failing_offsets.clear();
    }
}

impl<T, F: Clone> MockPageSource<T, F> {
    /// Requested `(filter, offset, limit)` triples, in order.
    pub fn requests(&self) -> Vec<(F, usize, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

impl<T: Debug, F: Debug> Debug for MockPageSource<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPageSource")
            .field("items", &self.items)
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

impl<T: Clone, F: Clone> PageSource for MockPageSource<T, F> {
    type Item = T;
    type Filter = F;

    async fn fetch_page(
        &self,
        filter: &F,
        offset: usize,
        limit: usize,
    ) -> Result<Page<T>, DashboardError> {
        self.requests
            .lock()
            .unwrap()
            .push((filter.clone(), offset, limit));
        if self.failing_offsets.contains(&offset) {
            return Err(DashboardError::Indexer(format!(
                "page at offset {offset} failed"
            )));
        }

        let matching: Vec<&T> = self
            .items
            .iter()
            .filter(|item| (self.predicate)(filter, *item))
            .collect();
        Ok(Page::new(
            matching
                .iter()
                .skip(offset)
                .take(limit)
                .map(|item| (*item).clone())
                .collect(),
            matching.len(),
        ))
    }
}

/// Wallet that is disconnected until [`Wallet::connect`] is called.
#[derive(Debug)]
pub struct MockWallet {
    address: Address,
    connected: AtomicBool,
}

impl MockWallet {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            connected: AtomicBool::new(false),
        }
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }
}

impl Wallet for MockWallet {
    fn account(&self) -> Option<Address> {
        self.connected
            .load(Ordering::Acquire)
            .then_some(self.address)
    }

    async fn connect(&self) -> Result<Address, DashboardError> {
        self.connected.store(true, Ordering::Release);
        Ok(self.address)
    }
}
