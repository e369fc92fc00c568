/// Outcome of querying one source item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchResult<T> {
    /// The item yielded a record.
    Populated(T),
    /// Nothing to show for the item (zero balance, no bonds, failed fetch).
    NotApplicable,
}

impl<T> FetchResult<T> {
    pub fn is_populated(&self) -> bool {
        matches!(self, FetchResult::Populated(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            FetchResult::Populated(value) => Some(value),
            FetchResult::NotApplicable => None,
        }
    }
}

impl<T> From<Option<T>> for FetchResult<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => FetchResult::Populated(value),
            None => FetchResult::NotApplicable,
        }
    }
}

/// Keeps populated records only, preserving their relative order.
pub fn retain_populated<T>(results: impl IntoIterator<Item = FetchResult<T>>) -> Vec<T> {
    results
        .into_iter()
        .filter_map(FetchResult::into_option)
        .collect()
}

/// Like [`retain_populated`] for items that yield zero or more records,
/// flattening one level of nesting.
pub fn flatten_populated<T, C>(results: impl IntoIterator<Item = FetchResult<C>>) -> Vec<T>
where
    C: IntoIterator<Item = T>,
{
    results
        .into_iter()
        .filter_map(FetchResult::into_option)
        .flatten()
        .collect()
}
