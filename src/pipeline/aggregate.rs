use fastnum::UD128;

/// Position of a user relative to a threshold value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Standing {
    /// At or above the threshold, by the given amount.
    Ahead(UD128),
    /// Below the threshold, missing the given amount.
    Until(UD128),
}

impl Standing {
    /// Standing of `value` against `threshold`.
    pub fn of(value: UD128, threshold: UD128) -> Self {
        if threshold > value {
            Standing::Until(threshold - value)
        } else {
            Standing::Ahead(value - threshold)
        }
    }

    pub fn is_until(&self) -> bool {
        matches!(self, Standing::Until(_))
    }

    pub fn delta(&self) -> UD128 {
        match self {
            Standing::Ahead(delta) | Standing::Until(delta) => *delta,
        }
    }
}

/// 1-based position of the last entity within the top `percentile`% of
/// `total_count` entities: `ceil(total_count × percentile / 100)`.
pub fn threshold_position(total_count: u64, percentile: u32) -> u64 {
    let position = (u128::from(total_count) * u128::from(percentile)).div_ceil(100);
    u64::try_from(position).unwrap_or(u64::MAX)
}

/// Entity at [`threshold_position`] of `ranked`.
///
/// `ranked` is expected to be sorted descending by the ranking scalar
/// already. When fewer entities are available than the position, the last
/// available one is used.
pub fn threshold_entity<T>(ranked: &[T], total_count: u64, percentile: u32) -> Option<&T> {
    let position = threshold_position(total_count, percentile);
    if position == 0 {
        return None;
    }
    let index = usize::try_from(position - 1).unwrap_or(usize::MAX);
    ranked.get(index).or_else(|| ranked.last())
}

/// Sums `field` over the set, entities without the field contributing zero.
///
/// Returns `None` when the set is not available (not loaded yet) or empty,
/// so "no data" stays distinguishable from a confirmed zero.
pub fn sum_by<T>(entities: Option<&[T]>, field: impl Fn(&T) -> Option<UD128>) -> Option<UD128> {
    let entities = entities.filter(|e| !e.is_empty())?;
    Some(
        entities
            .iter()
            .filter_map(field)
            .fold(UD128::ZERO, |acc, value| acc + value),
    )
}

/// `value × 100 / total`, capped at 100; `None` for a zero total.
pub fn percent_of(value: UD128, total: UD128) -> Option<UD128> {
    if total == UD128::ZERO {
        return None;
    }
    let hundred = UD128::from(100u64);
    let percent = value * hundred / total;
    Some(if percent > hundred { hundred } else { percent })
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;

    #[test]
    fn test_threshold_position_rounds_up() {
        assert_eq!(threshold_position(100, 10), 10);
        assert_eq!(threshold_position(7, 30), 3);
        assert_eq!(threshold_position(7, 100), 7);
        assert_eq!(threshold_position(1, 1), 1);
        assert_eq!(threshold_position(0, 50), 0);
        assert_eq!(threshold_position(10, 0), 0);
    }

    #[test]
    fn test_threshold_position_large_counts() {
        let count = u64::MAX / 50;
        assert_eq!(threshold_position(count, 100), count);
        assert_eq!(threshold_position(u64::MAX, 100), u64::MAX);
        assert_eq!(threshold_position(u64::MAX, 200), u64::MAX);
    }

    #[test]
    fn test_threshold_entity() {
        let ranked: Vec<u32> = (1..=10).rev().collect();
        assert_eq!(threshold_entity(&ranked, 10, 30), Some(&8));
        assert_eq!(threshold_entity(&ranked, 10, 100), Some(&1));
        assert_eq!(threshold_entity(&ranked, 10, 0), None);

        // only the first page is loaded, fall back to the last loaded entity
        assert_eq!(threshold_entity(&ranked[..3], 10, 50), Some(&8));
        assert_eq!(threshold_entity::<u32>(&[], 10, 50), None);
    }

    #[test]
    fn test_standing() {
        assert_eq!(
            Standing::of(udec128!(40), udec128!(100)),
            Standing::Until(udec128!(60))
        );
        assert_eq!(
            Standing::of(udec128!(100), udec128!(100)),
            Standing::Ahead(udec128!(0))
        );
        let ahead = Standing::of(udec128!(150.5), udec128!(100));
        assert!(!ahead.is_until());
        assert_eq!(ahead.delta(), udec128!(50.5));
    }

    #[test]
    fn test_sum_distinguishes_no_data_from_zero() {
        let field = |v: &Option<UD128>| *v;

        assert_eq!(sum_by::<Option<UD128>>(None, field), None);
        assert_eq!(sum_by::<Option<UD128>>(Some(&[][..]), field), None);
        assert_eq!(
            sum_by(
                Some(&[Some(udec128!(5)), Some(udec128!(0)), None][..]),
                field
            ),
            Some(udec128!(5))
        );
        assert_eq!(sum_by(Some(&[None][..]), field), Some(UD128::ZERO));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(udec128!(25), udec128!(200)), Some(udec128!(12.5)));
        assert_eq!(percent_of(udec128!(300), udec128!(200)), Some(udec128!(100)));
        assert_eq!(percent_of(udec128!(1), UD128::ZERO), None);
    }
}
