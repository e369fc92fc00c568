//! Yield farming rewards of an account across all staking farms.

use alloy::primitives::{Address, TxHash, U256};
use fastnum::UD128;

use crate::{
    abi::{erc20::Erc20, yield_farm::YieldFarm},
    client::ContractClient,
    error::DashboardError,
    num::Converter,
    pipeline::{
        FetchResult, Loadable, ViewSlot, aggregate::sum_by, fetch_sequential, retain_populated,
    },
};

/// Decimals of the governance token rewards are paid in.
pub const REWARD_DECIMALS: u8 = 18;

/// Reward state of one farm for one account.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct FarmRewards {
    pub farm: Address,
    /// Rewards harvestable right now.
    #[debug("{to_claim}")]
    pub to_claim: UD128,
    /// Expected reward for the current epoch at the current stake.
    #[debug("{potential_reward}")]
    pub potential_reward: UD128,
    pub current_epoch: u128,
    pub epochs: u128,
}

impl FarmRewards {
    /// `true` once the last reward epoch is over.
    pub fn is_ended(&self) -> bool {
        self.current_epoch > self.epochs
    }
}

/// `total / epochs × stake / pool_size` in base units, zero for an empty
/// pool.
pub fn potential_reward(total: U256, epochs: u128, stake: U256, pool_size: U256) -> U256 {
    let divisor = U256::from(epochs).saturating_mul(pool_size);
    if divisor.is_zero() {
        return U256::ZERO;
    }
    total.saturating_mul(stake) / divisor
}

async fn farm_rewards<C: ContractClient>(
    client: &C,
    account: Address,
    farm: Address,
    converter: Converter,
) -> Result<FarmRewards, DashboardError> {
    let (to_claim, current_epoch, epochs, total) = futures::try_join!(
        client.read_as(Some(account), farm, &YieldFarm::massHarvestCall {}),
        client.read(farm, &YieldFarm::getCurrentEpochCall {}),
        client.read(farm, &YieldFarm::NR_OF_EPOCHSCall {}),
        client.read(farm, &YieldFarm::TOTAL_DISTRIBUTED_AMOUNTCall {}),
    )?;
    let pool_size_call = YieldFarm::getPoolSizeCall {
        epochId: current_epoch,
    };
    let stake_call = YieldFarm::getEpochStakeCall {
        userAddress: account,
        epochId: current_epoch,
    };
    let (pool_size, stake) = futures::try_join!(
        client.read(farm, &pool_size_call),
        client.read(farm, &stake_call),
    )?;

    Ok(FarmRewards {
        farm,
        to_claim: converter.from_unsigned(to_claim)?,
        potential_reward: converter.from_unsigned(potential_reward(
            total, epochs, stake, pool_size,
        ))?,
        current_epoch,
        epochs,
    })
}

/// Rewards of one account over a fixed set of farms.
#[derive(Debug)]
pub struct Rewards {
    farms: Vec<Address>,
    governance_token: Option<Address>,
    account: Option<Address>,
    converter: Converter,
    farm_rewards: ViewSlot<Vec<FarmRewards>>,
    token_balance: ViewSlot<UD128>,
}

impl Rewards {
    pub fn new(farms: Vec<Address>, governance_token: Option<Address>) -> Self {
        Self {
            farms,
            governance_token,
            account: None,
            converter: Converter::new(REWARD_DECIMALS),
            farm_rewards: ViewSlot::new(),
            token_balance: ViewSlot::new(),
        }
    }

    pub fn set_account(&mut self, account: Option<Address>) {
        if self.account != account {
            self.account = account;
            self.farm_rewards.reset();
            self.token_balance.reset();
        }
    }

    /// Loads rewards farm by farm. A farm failing to respond is left out.
    pub async fn load<C: ContractClient>(&mut self, client: &C) {
        let Some(account) = self.account else {
            return;
        };
        let converter = self.converter;
        let farms = self.farms.clone();
        let governance_token = self.governance_token;
        let ticket = self.farm_rewards.begin();
        let balance_ticket = governance_token.map(|_| self.token_balance.begin());

        let rewards = fetch_sequential(farms, &ticket, move |farm| async move {
            farm_rewards(client, account, farm, converter)
                .await
                .map(FetchResult::Populated)
        });
        let balance = async {
            let token = governance_token?;
            match client.read(token, &Erc20::balanceOfCall { owner: account }).await {
                Ok(balance) => converter.from_unsigned(balance).ok(),
                Err(err) => {
                    tracing::warn!(%token, %err, "Failed to load governance token balance");
                    None
                }
            }
        };
        let (rewards, balance) = futures::join!(rewards, balance);

        if let Some(rewards) = rewards {
            self.farm_rewards.commit(&ticket, retain_populated(rewards));
        }
        if let (Some(ticket), Some(balance)) = (balance_ticket, balance) {
            self.token_balance.commit(&ticket, balance);
        }
    }

    pub fn farms(&self) -> &Loadable<Vec<FarmRewards>> {
        self.farm_rewards.get()
    }

    pub fn token_balance(&self) -> Option<UD128> {
        self.token_balance.get().loaded().copied()
    }

    pub fn is_stale(&self) -> bool {
        self.farm_rewards.is_stale()
    }

    /// Rewards claimable over all farms, `None` while not loaded.
    pub fn total_to_claim(&self) -> Option<UD128> {
        sum_by(self.farm_rewards.get().as_slice(), |farm| Some(farm.to_claim))
    }

    /// Expected current epoch rewards over farms still running.
    pub fn total_potential_reward(&self) -> Option<UD128> {
        sum_by(self.farm_rewards.get().as_slice(), |farm| {
            (!farm.is_ended()).then_some(farm.potential_reward)
        })
    }

    /// Harvests all rewards of `farm`. Loaded rewards are marked stale once
    /// the transaction is mined.
    pub async fn claim<C: ContractClient>(
        &mut self,
        client: &C,
        farm: Address,
    ) -> Result<TxHash, DashboardError> {
        let account = self.account.ok_or(DashboardError::NotConnected)?;
        let tx_hash = client
            .send_call(account, farm, &YieldFarm::massHarvestCall {})
            .await?;
        tracing::info!(%account, %farm, %tx_hash, "Rewards claimed");

        self.farm_rewards.mark_stale();
        self.token_balance.mark_stale();
        Ok(tx_hash)
    }

    /// Farms with something to claim.
    pub fn claimable_farms(&self) -> Vec<Address> {
        self.farm_rewards
            .get()
            .as_slice()
            .unwrap_or_default()
            .iter()
            .filter(|farm| farm.to_claim > UD128::ZERO)
            .map(|farm| farm.farm)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;
    use crate::testing::{MockContractClient, fixtures};

    const ETHER: u128 = 1_000_000_000_000_000_000;

    fn account() -> Address {
        Address::with_last_byte(0xa1)
    }

    #[test]
    fn test_potential_reward() {
        // 1000 per epoch, 25% of the pool
        assert_eq!(
            potential_reward(U256::from(10_000), 10, U256::from(25), U256::from(100)),
            U256::from(250)
        );
        assert_eq!(
            potential_reward(U256::from(10_000), 10, U256::from(25), U256::ZERO),
            U256::ZERO
        );
        assert_eq!(
            potential_reward(U256::from(10_000), 0, U256::from(25), U256::from(100)),
            U256::ZERO
        );
    }

    #[tokio::test]
    async fn test_totals() {
        let client = MockContractClient::new();
        let farms = vec![
            Address::with_last_byte(0xf1),
            Address::with_last_byte(0xf2),
            Address::with_last_byte(0xf3),
        ];
        // running farm: epoch 5 of 10
        fixtures::respond_farm(&client, farms[0], account(), 2 * ETHER, 5, 10, 100 * ETHER, 40, 10);
        // ended farm still has rewards to claim
        fixtures::respond_farm(&client, farms[1], account(), ETHER, 11, 10, 100 * ETHER, 40, 10);
        // farms[2] does not respond

        let mut rewards = Rewards::new(farms, None);
        rewards.set_account(Some(account()));
        rewards.load(&client).await;

        let loaded = rewards.farms().as_slice().unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded[1].is_ended());
        assert_eq!(loaded[0].potential_reward, udec128!(2.5));

        assert_eq!(rewards.total_to_claim(), Some(udec128!(3)));
        assert_eq!(rewards.total_potential_reward(), Some(udec128!(2.5)));
        assert_eq!(rewards.token_balance(), None);
    }

    #[tokio::test]
    async fn test_no_data_before_load() {
        let rewards = Rewards::new(vec![Address::with_last_byte(0xf1)], None);
        assert_eq!(rewards.total_to_claim(), None);
        assert_eq!(rewards.total_potential_reward(), None);
        assert!(rewards.claimable_farms().is_empty());
    }

    #[tokio::test]
    async fn test_governance_token_balance() {
        let client = MockContractClient::new();
        let token = Address::with_last_byte(0x70);
        client.respond(
            token,
            &Erc20::balanceOfCall { owner: account() },
            &U256::from(3 * ETHER / 2),
        );

        let mut rewards = Rewards::new(vec![], Some(token));
        rewards.set_account(Some(account()));
        rewards.load(&client).await;
        assert_eq!(rewards.token_balance(), Some(udec128!(1.5)));
        assert_eq!(rewards.farms().as_slice(), Some(&[][..]));
        assert_eq!(rewards.total_to_claim(), None);
    }

    #[tokio::test]
    async fn test_claim() {
        let client = MockContractClient::new();
        let farm = Address::with_last_byte(0xf1);
        fixtures::respond_farm(&client, farm, account(), ETHER, 5, 10, 100 * ETHER, 40, 10);

        let mut rewards = Rewards::new(vec![farm], None);
        assert!(matches!(
            rewards.claim(&client, farm).await,
            Err(DashboardError::NotConnected)
        ));

        rewards.set_account(Some(account()));
        rewards.load(&client).await;
        assert_eq!(rewards.claimable_farms(), vec![farm]);

        rewards.claim(&client, farm).await.unwrap();
        assert!(rewards.is_stale());
        assert_eq!(client.sends()[0].to, farm);
    }
}
