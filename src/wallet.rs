//! Wallet/account context.
//!
//! Views never talk to a wallet directly, they receive the account to load
//! data for. [`Wallet`] is the capability the binary (or a UI host) uses to
//! obtain that account and to sign transactions sent through
//! [`crate::client::ContractClient::send`].

use alloy::{network::EthereumWallet, primitives::Address, signers::local::PrivateKeySigner};

use crate::error::DashboardError;

pub trait Wallet {
    /// Connected account, `None` while disconnected.
    fn account(&self) -> Option<Address>;

    /// `true` if the wallet can sign right now.
    fn is_active(&self) -> bool {
        self.account().is_some()
    }

    /// Connects the wallet, resolving with the connected account.
    fn connect(&self) -> impl Future<Output = Result<Address, DashboardError>>;

    /// Connected account or [`DashboardError::NotConnected`].
    fn require_account(&self) -> Result<Address, DashboardError> {
        self.account().ok_or(DashboardError::NotConnected)
    }
}

/// Wallet backed by a local private key, always connected.
#[derive(Clone, Debug)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    /// Random key, useful for read-only sessions and tests.
    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random())
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Network wallet to attach to a provider so that transactions from
    /// [`Self::address`] get signed.
    pub fn network_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl Wallet for LocalWallet {
    fn account(&self) -> Option<Address> {
        Some(self.signer.address())
    }

    async fn connect(&self) -> Result<Address, DashboardError> {
        Ok(self.signer.address())
    }
}
