use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::{Address, U256};
use fastnum::UD128;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{IndexerClient, de_decimal};
use crate::{
    error::DashboardError,
    num::Converter,
    pipeline::{Page, PageSource},
};

const YEAR_SECONDS: u64 = 365 * 24 * 60 * 60;
const VOTING_POWER_DECIMALS: u8 = 18;

const VOTERS_QUERY: &str = r#"
query GetVoters($limit: Int, $offset: Int) {
  voters(first: $limit, skip: $offset, orderBy: votingPower, orderDirection: desc, where: {isComitiumUser: true}) {
    id
    tokensStaked
    lockedUntil
    delegatedPower
    hasActiveDelegation
  }
  overview(id: "OVERVIEW") {
    comitiumUsers
  }
}
"#;

const VOTER_COUNT_QUERY: &str = r#"
query GetCountAllUsers {
  overview(id: "OVERVIEW") {
    comitiumUsers
  }
}
"#;

/// Ranked governance participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voter {
    pub address: Address,
    /// 1-based position in the voting power ranking.
    pub rank: u64,
    pub voting_power: UD128,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVoter {
    id: Address,
    #[serde(deserialize_with = "de_decimal")]
    tokens_staked: U256,
    #[serde(deserialize_with = "de_decimal")]
    locked_until: u64,
    #[serde(deserialize_with = "de_decimal")]
    delegated_power: U256,
    #[serde(default)]
    has_active_delegation: bool,
}

#[derive(Debug, Deserialize)]
struct VotersData {
    #[serde(default)]
    voters: Option<Vec<RawVoter>>,
    overview: Overview,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Overview {
    #[serde(deserialize_with = "de_decimal")]
    comitium_users: usize,
}

/// Voting power in base units at `now` (unix seconds).
///
/// Own stake counts only while not delegated away, boosted by
/// `stake × remaining_lock / (2 × year)`. Power delegated to the voter is
/// always added.
pub fn voting_power(
    tokens_staked: U256,
    locked_until: u64,
    delegated_power: U256,
    has_active_delegation: bool,
    now: u64,
) -> U256 {
    let own = if has_active_delegation {
        U256::ZERO
    } else {
        let remaining = locked_until.saturating_sub(now);
        let bonus = tokens_staked.saturating_mul(U256::from(remaining))
            / U256::from(2 * YEAR_SECONDS);
        tokens_staked.saturating_add(bonus)
    };
    own.saturating_add(delegated_power)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

fn voters_page(data: VotersData, offset: usize, now: u64) -> Result<Page<Voter>, DashboardError> {
    let converter = Converter::new(VOTING_POWER_DECIMALS);
    let voters = data
        .voters
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let power = voting_power(
                raw.tokens_staked,
                raw.locked_until,
                raw.delegated_power,
                raw.has_active_delegation,
                now,
            );
            Ok(Voter {
                address: raw.id,
                rank: (offset + index + 1) as u64,
                voting_power: converter.from_unsigned(power)?,
            })
        })
        .collect::<Result<Vec<_>, DashboardError>>()?;
    Ok(Page::new(voters, data.overview.comitium_users))
}

/// Governance voters ranked by voting power, descending.
#[derive(Clone, Debug)]
pub struct VoterSource {
    indexer: IndexerClient,
    at: Option<u64>,
}

impl VoterSource {
    pub fn new(indexer: IndexerClient) -> Self {
        Self { indexer, at: None }
    }

    /// Evaluates lock bonuses at a fixed unix timestamp instead of now.
    pub fn at_timestamp(mut self, timestamp: u64) -> Self {
        self.at = Some(timestamp);
        self
    }
}

impl PageSource for VoterSource {
    type Item = Voter;
    type Filter = ();

    async fn fetch_page(
        &self,
        _filter: &(),
        offset: usize,
        limit: usize,
    ) -> Result<Page<Voter>, DashboardError> {
        let mut variables = Map::new();
        variables.insert("limit".to_string(), Value::from(limit));
        variables.insert("offset".to_string(), Value::from(offset));

        let data: VotersData = self.indexer.graphql(VOTERS_QUERY, Some(variables)).await?;
        voters_page(data, offset, self.at.unwrap_or_else(unix_now))
    }
}

/// Total number of governance participants.
pub async fn fetch_voter_count(indexer: &IndexerClient) -> Result<usize, DashboardError> {
    #[derive(Deserialize)]
    struct CountData {
        overview: Overview,
    }

    let data: CountData = indexer.graphql(VOTER_COUNT_QUERY, None).await?;
    Ok(data.overview.comitium_users)
}
