use std::{collections::HashMap, hash::Hash, ops::Deref, sync::Arc};

use tokio::sync::watch;

/// Record that can be joined with metadata by a stable key.
pub trait Keyed {
    type Key: Eq + Hash;

    fn key(&self) -> &Self::Key;
}

impl<R: Keyed> Keyed for &R {
    type Key = R::Key;

    fn key(&self) -> &Self::Key {
        (**self).key()
    }
}

/// Immutable snapshot of slow-changing metadata keyed by identifier.
#[derive(Debug)]
pub struct MetadataTable<K, M> {
    entries: HashMap<K, Arc<M>>,
}

impl<K, M> Default for MetadataTable<K, M> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, M> MetadataTable<K, M> {
    pub fn get(&self, key: &K) -> Option<&Arc<M>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &Arc<M>> {
        self.entries.values()
    }

    /// Table over entries already shared elsewhere.
    pub fn from_shared(entries: impl IntoIterator<Item = (K, Arc<M>)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

impl<K: Eq + Hash, M> FromIterator<(K, M)> for MetadataTable<K, M> {
    fn from_iter<I: IntoIterator<Item = (K, M)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, m)| (k, Arc::new(m))).collect(),
        }
    }
}

/// Process-wide holder of the current [`MetadataTable`].
///
/// The table is only ever replaced as a whole, readers take snapshots and
/// never observe a partially updated table.
#[derive(Debug)]
pub struct MetadataStore<K, M> {
    tx: watch::Sender<Arc<MetadataTable<K, M>>>,
}

impl<K, M> Default for MetadataStore<K, M> {
    fn default() -> Self {
        Self::new(MetadataTable::default())
    }
}

impl<K, M> MetadataStore<K, M> {
    pub fn new(table: MetadataTable<K, M>) -> Self {
        let (tx, _) = watch::channel(Arc::new(table));
        Self { tx }
    }

    /// Current table snapshot.
    pub fn snapshot(&self) -> Arc<MetadataTable<K, M>> {
        self.tx.borrow().clone()
    }

    /// Replaces the whole table, notifying subscribers.
    pub fn replace(&self, table: MetadataTable<K, M>) {
        self.tx.send_replace(Arc::new(table));
    }

    /// Receiver notified on every replacement, to re-run joins.
    pub fn subscribe(&self) -> watch::Receiver<Arc<MetadataTable<K, M>>> {
        self.tx.subscribe()
    }
}

/// Fetched record joined with its (possibly missing) metadata.
#[derive(Clone, Debug)]
pub struct ViewEntity<R, M> {
    record: R,
    meta: Option<Arc<M>>,
}

impl<R, M> ViewEntity<R, M> {
    pub fn new(record: R, meta: Option<Arc<M>>) -> Self {
        Self { record, meta }
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    /// Metadata looked up for the record, `None` when unknown.
    pub fn meta(&self) -> Option<&M> {
        self.meta.as_deref()
    }

    pub fn into_record(self) -> R {
        self.record
    }
}

impl<R: Deref, M> ViewEntity<R, M> {
    /// Entity with the record behind a reference resolved.
    pub fn target(&self) -> &R::Target {
        self.record.deref()
    }
}

/// Looks up metadata for every record, keeping record order.
///
/// Missing metadata is not an error: such records produce entities
/// without metadata.
pub fn join<R, M>(
    records: impl IntoIterator<Item = R>,
    table: &MetadataTable<R::Key, M>,
) -> Vec<ViewEntity<R, M>>
where
    R: Keyed,
{
    records
        .into_iter()
        .map(|record| {
            let meta = table.get(record.key()).cloned();
            ViewEntity::new(record, meta)
        })
        .collect()
}
