//! Dashboard session: connects the node and the indexer, loads the
//! requested view and hands it to [`crate::report`].

use std::time::Duration;

use alloy::{
    primitives::Address,
    providers::{DynProvider, ProviderBuilder},
    rpc::client::RpcClient,
};
use dashboard_sdk::{
    Chain,
    client::AlloyContractClient,
    indexer::{
        IndexerClient, JuniorRedeemSource, PoolTxSource, VoterSource, fetch_pools, pools_table,
    },
    views::{
        JuniorPortfolio, PastPositions, PoolTxTable, Rewards, load_all_voters, rank_view,
    },
    wallet::{LocalWallet, Wallet},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::{Command, cli_prize},
    error::{Error, Result},
    report,
};

#[derive(Debug)]
pub struct Dashboard {
    client: AlloyContractClient<DynProvider>,
    indexer: IndexerClient,
    chain: Chain,
    wallet: Option<LocalWallet>,
    timeout: Duration,
}

impl Dashboard {
    pub fn try_new(
        node_url: Url,
        indexer: IndexerClient,
        chain: Chain,
        wallet: Option<LocalWallet>,
        timeout: Duration,
    ) -> Result<Self> {
        info!(
            chain_id = chain.chain_id(),
            yield_farms = chain.yield_farms().len(),
            account = ?wallet.as_ref().map(LocalWallet::address),
            "Initializing dashboard"
        );

        let rpc_client = RpcClient::new_http(node_url);
        let provider = match &wallet {
            Some(wallet) => DynProvider::new(
                ProviderBuilder::new()
                    .wallet(wallet.network_wallet())
                    .connect_client(rpc_client),
            ),
            None => DynProvider::new(ProviderBuilder::new().connect_client(rpc_client)),
        };

        Ok(Self {
            client: AlloyContractClient::new(provider),
            indexer,
            chain,
            wallet,
            timeout,
        })
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Rank {
                account,
                prize_title,
                prize_rate,
            } => {
                let account = self.account(account);
                let voters = self
                    .timed(load_all_voters(&VoterSource::new(self.indexer.clone())))
                    .await?;
                let prize = cli_prize(&prize_title, prize_rate);
                report::rank(&rank_view(account, &voters, &prize));
            }
            Command::Portfolio {
                account,
                page,
                page_size,
            } => {
                let account = self.account(account).ok_or(Error::NoAccount)?;
                let pools = self.timed(fetch_pools(&self.indexer)).await??;
                debug!(pools = pools.len(), "Pools loaded");

                let mut portfolio = JuniorPortfolio::new();
                portfolio.set_account(Some(account));
                let mut past = PastPositions::new(page_size);
                past.set_account(Some(account));
                past.set_page(page);

                let redeems = JuniorRedeemSource::new(self.indexer.clone());
                self.timed(async {
                    futures::join!(portfolio.load(&self.client, &pools), past.load(&redeems))
                })
                .await?;
                report::portfolio(&portfolio, &past, &pools_table(&pools));
            }
            Command::Rewards { account } => {
                let account = self.account(account).ok_or(Error::NoAccount)?;
                let rewards = self.load_rewards(account).await?;
                report::rewards(&rewards);
            }
            Command::Claim { farm } => {
                let wallet = self.wallet.as_ref().ok_or(Error::NoWallet)?;
                let account = wallet.require_account()?;
                let mut rewards = self.load_rewards(account).await?;

                let farms = match farm {
                    Some(farm) => vec![farm],
                    None => rewards.claimable_farms(),
                };
                if farms.is_empty() {
                    return Err(Error::NothingToClaim);
                }
                for farm in farms {
                    match self.timed(rewards.claim(&self.client, farm)).await? {
                        Ok(tx_hash) => report::claimed(farm, tx_hash),
                        Err(err) => warn!(%farm, %err, "Failed to claim rewards"),
                    }
                }
            }
            Command::Transactions {
                user,
                token,
                tx_type,
                pages,
            } => {
                let source = PoolTxSource::new(self.indexer.clone());
                let mut table = PoolTxTable::new();
                table.set_user(user);
                table.set_token(token);
                table.set_tx_type(tx_type.map(Into::into));
                for _ in 0..pages {
                    if table.is_end() || !self.timed(table.load_next(&source)).await? {
                        break;
                    }
                }
                report::transactions(&table);
            }
        }
        Ok(())
    }

    async fn load_rewards(&self, account: Address) -> Result<Rewards> {
        let mut rewards = Rewards::new(
            self.chain.yield_farms().to_vec(),
            self.chain.governance_token(),
        );
        rewards.set_account(Some(account));
        self.timed(rewards.load(&self.client)).await?;
        Ok(rewards)
    }

    /// Explicit account, falling back to the wallet account.
    fn account(&self, account: Option<Address>) -> Option<Address> {
        account.or_else(|| self.wallet.as_ref().and_then(Wallet::account))
    }

    async fn timed<T>(&self, future: impl Future<Output = T>) -> Result<T> {
        tokio::time::timeout(self.timeout, future)
            .await
            .map_err(|_| Error::Timeout(self.timeout.as_secs()))
    }
}
