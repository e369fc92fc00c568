use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Monotonically increasing run counter of a single triggering key
/// (account, filter set, ...).
///
/// Every [`Epoch::advance`] issues a fresh [`Ticket`] and invalidates
/// all tickets issued before, so results of superseded runs can be
/// detected and dropped at commit time.
#[derive(Clone, Debug, Default)]
pub struct Epoch {
    current: Arc<AtomicU64>,
}

/// Token identifying one run of an [`Epoch`].
#[derive(Clone, Debug)]
pub struct Ticket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl Epoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new run, superseding all previously issued tickets.
    pub fn advance(&self) -> Ticket {
        let generation = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        Ticket {
            generation,
            current: self.current.clone(),
        }
    }

    /// Invalidates all issued tickets without starting a new run.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }

    pub fn generation(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `true` while no newer run was started for the same epoch.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }

    /// `true` if the ticket was issued by the given epoch.
    pub fn belongs_to(&self, epoch: &Epoch) -> bool {
        Arc::ptr_eq(&self.current, &epoch.current)
    }
}

/// Remote data as seen by a view: not requested yet, being loaded,
/// or loaded (possibly empty).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Loadable<T> {
    #[default]
    NotLoaded,
    Loading,
    Loaded(T),
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Loadable::Loaded(_))
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loadable<U> {
        match self {
            Loadable::NotLoaded => Loadable::NotLoaded,
            Loadable::Loading => Loadable::Loading,
            Loadable::Loaded(value) => Loadable::Loaded(f(value)),
        }
    }
}

impl<T> Loadable<Vec<T>> {
    /// Loaded items as a slice, `None` while not loaded.
    pub fn as_slice(&self) -> Option<&[T]> {
        self.loaded().map(Vec::as_slice)
    }
}

/// View state slot committed only by the most recently started run.
///
/// Holds the last committed value while a newer run is loading, so a
/// reload does not blank the view.
#[derive(Debug, Default)]
pub struct ViewSlot<T> {
    epoch: Epoch,
    value: Loadable<T>,
    stale: bool,
}

impl<T> ViewSlot<T> {
    pub fn new() -> Self {
        Self {
            epoch: Epoch::new(),
            value: Loadable::NotLoaded,
            stale: false,
        }
    }

    /// Starts a new run and marks the slot as loading if nothing was
    /// committed yet.
    pub fn begin(&mut self) -> Ticket {
        if !self.value.is_loaded() {
            self.value = Loadable::Loading;
        }
        self.stale = false;
        self.epoch.advance()
    }

    /// Stores the value if the ticket still identifies the latest run.
    /// Returns whether the value was committed.
    pub fn commit(&mut self, ticket: &Ticket, value: T) -> bool {
        if !ticket.belongs_to(&self.epoch) || !ticket.is_current() {
            tracing::debug!(
                generation = ticket.generation(),
                current = self.epoch.generation(),
                "Discarding result of superseded run"
            );
            return false;
        }
        self.value = Loadable::Loaded(value);
        true
    }

    /// Drops the value and any pending run, e.g. when the account changes.
    pub fn reset(&mut self) {
        self.epoch.invalidate();
        self.value = Loadable::NotLoaded;
        self.stale = false;
    }

    /// Marks the committed value as outdated, without dropping it.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// `true` after [`Self::mark_stale`] until the next [`Self::begin`].
    pub fn is_stale(&self) -> bool {
        self.stale || matches!(self.value, Loadable::NotLoaded)
    }

    pub fn get(&self) -> &Loadable<T> {
        &self.value
    }
}
