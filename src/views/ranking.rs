//! Voting power ranking of governance participants and prize thresholds.

use alloy::primitives::Address;
use fastnum::UD128;

use crate::{
    indexer::Voter,
    pipeline::{
        PageSource, PagedList, Standing,
        aggregate::{percent_of, threshold_entity},
    },
};

/// Upper bound of pages fetched by [`load_all_voters`].
pub const MAX_VOTER_PAGES: usize = 1_000;

/// Reward given to the top `rate` percent of voters at `date`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prize {
    pub key: String,
    pub title: String,
    /// Top percentage of voters eligible, `None` for everyone.
    pub rate: Option<u32>,
    /// Unix timestamp of the distribution.
    pub date: u64,
}

/// Prize following the currently active one: the entry before `active_key`,
/// or the active one itself when it is the first entry.
pub fn next_prize<'a>(prizes: &'a [Prize], active_key: &str) -> Option<&'a Prize> {
    let index = prizes.iter().position(|prize| prize.key == active_key)?;
    prizes.get(index.saturating_sub(1))
}

/// Position of the connected account relative to a prize.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct RankStanding {
    pub rank: u64,
    #[debug("{voting_power}")]
    pub voting_power: UD128,
    pub prize: Prize,
    /// Voting power of the last voter still eligible for the prize.
    pub threshold: Option<UD128>,
    pub standing: Standing,
    /// Progress towards the threshold in percent, 100 once reached.
    #[debug("{progress}")]
    pub progress: UD128,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RankView {
    NotConnected,
    Loading,
    /// Account is not among the loaded voters.
    Unranked,
    Ranked(RankStanding),
}

/// Rank of `account` among loaded `voters` for `prize`.
///
/// The eligibility threshold uses the total voter count, falling back to
/// the last loaded voter when not all pages are loaded yet.
pub fn rank_view(account: Option<Address>, voters: &PagedList<Voter, ()>, prize: &Prize) -> RankView {
    let Some(account) = account else {
        return RankView::NotConnected;
    };
    if !voters.is_loaded() {
        return RankView::Loading;
    }
    let Some(voter) = voters.items().iter().find(|voter| voter.address == account) else {
        return RankView::Unranked;
    };

    let total = voters.total().unwrap_or_default() as u64;
    let threshold = prize
        .rate
        .and_then(|rate| threshold_entity(voters.items(), total, rate))
        .map(|last| last.voting_power);

    let standing = Standing::of(voter.voting_power, threshold.unwrap_or(UD128::ZERO));
    let progress = match (standing, threshold) {
        (Standing::Until(_), Some(threshold)) => {
            percent_of(voter.voting_power, threshold).unwrap_or(UD128::ZERO)
        }
        _ => UD128::from(100u64),
    };

    RankView::Ranked(RankStanding {
        rank: voter.rank,
        voting_power: voter.voting_power,
        prize: prize.clone(),
        threshold,
        standing,
        progress,
    })
}

/// Loads the whole voter ranking.
pub async fn load_all_voters<S>(source: &S) -> PagedList<Voter, ()>
where
    S: PageSource<Item = Voter, Filter = ()>,
{
    let mut voters = PagedList::new(());
    voters.load_all(source, MAX_VOTER_PAGES).await;
    tracing::debug!(
        loaded = voters.items().len(),
        total = ?voters.total(),
        "Voters loaded"
    );
    voters
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;
    use crate::testing::{MockPageSource, fixtures};

    fn prizes() -> Vec<Prize> {
        vec![
            fixtures::prize("gold", Some(10)),
            fixtures::prize("silver", Some(30)),
            fixtures::prize("everyone", None),
        ]
    }

    fn voters(powers: &[u64]) -> MockPageSource<Voter, ()> {
        let voters = powers
            .iter()
            .enumerate()
            .map(|(index, power)| fixtures::voter(index as u8 + 1, index as u64 + 1, *power))
            .collect();
        MockPageSource::new(voters, |_: &(), _: &Voter| true)
    }

    #[test]
    fn test_next_prize() {
        let prizes = prizes();
        assert_eq!(next_prize(&prizes, "silver").map(|p| p.key.as_str()), Some("gold"));
        assert_eq!(next_prize(&prizes, "everyone").map(|p| p.key.as_str()), Some("silver"));
        assert_eq!(next_prize(&prizes, "gold").map(|p| p.key.as_str()), Some("gold"));
        assert_eq!(next_prize(&prizes, "unknown"), None);
    }

    #[tokio::test]
    async fn test_until_threshold() {
        // 10 voters with power 100, 90, ..., 10
        let source = voters(&[100, 90, 80, 70, 60, 50, 40, 30, 20, 10]);
        let voters = load_all_voters(&source).await;
        let prize = fixtures::prize("silver", Some(30));

        let RankView::Ranked(rank) = rank_view(Some(Address::with_last_byte(5)), &voters, &prize)
        else {
            panic!("expected ranked view");
        };
        assert_eq!(rank.rank, 5);
        assert_eq!(rank.threshold, Some(udec128!(80)));
        assert_eq!(rank.standing, Standing::Until(udec128!(20)));
        assert_eq!(rank.progress, udec128!(75));
    }

    #[tokio::test]
    async fn test_ahead_of_threshold() {
        let source = voters(&[100, 90, 80, 70, 60, 50, 40, 30, 20, 10]);
        let voters = load_all_voters(&source).await;
        let prize = fixtures::prize("silver", Some(30));

        let RankView::Ranked(rank) = rank_view(Some(Address::with_last_byte(1)), &voters, &prize)
        else {
            panic!("expected ranked view");
        };
        assert_eq!(rank.standing, Standing::Ahead(udec128!(20)));
        assert!(!rank.standing.is_until());
        assert_eq!(rank.progress, udec128!(100));
    }

    #[tokio::test]
    async fn test_everyone_prize() {
        let source = voters(&[100, 90]);
        let voters = load_all_voters(&source).await;
        let prize = fixtures::prize("everyone", None);

        let RankView::Ranked(rank) = rank_view(Some(Address::with_last_byte(2)), &voters, &prize)
        else {
            panic!("expected ranked view");
        };
        assert_eq!(rank.threshold, None);
        assert_eq!(rank.standing, Standing::Ahead(udec128!(90)));
        assert_eq!(rank.progress, udec128!(100));
    }

    #[tokio::test]
    async fn test_not_connected_loading_unranked() {
        let prize = fixtures::prize("gold", Some(10));
        let mut list = PagedList::new(());
        assert_eq!(rank_view(None, &list, &prize), RankView::NotConnected);
        assert_eq!(
            rank_view(Some(Address::with_last_byte(1)), &list, &prize),
            RankView::Loading
        );

        let source = voters(&[100]);
        list.load_next(&source).await;
        assert_eq!(
            rank_view(Some(Address::with_last_byte(0x42)), &list, &prize),
            RankView::Unranked
        );
    }

    #[tokio::test]
    async fn test_threshold_falls_back_to_last_loaded() {
        // 25 voters in total but only the first page is loaded
        let powers: Vec<u64> = (1..=25).rev().map(|n| n * 10).collect();
        let source = voters(&powers);
        let mut list = PagedList::new(());
        list.load_next(&source).await;
        assert_eq!(list.items().len(), 10);

        // top 60% of 25 is position 15, beyond the loaded page
        let prize = fixtures::prize("wide", Some(60));
        let RankView::Ranked(rank) = rank_view(Some(Address::with_last_byte(1)), &list, &prize)
        else {
            panic!("expected ranked view");
        };
        assert_eq!(rank.threshold, Some(udec128!(160)));
    }
}
