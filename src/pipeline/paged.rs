use std::fmt::Debug;

use super::{Epoch, Keyed, MetadataTable, Ticket, ViewEntity, join};
use crate::error::DashboardError;

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of a remote list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items matching the query, as reported by the source.
    pub total: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize) -> Self {
        Self { items, total }
    }

    pub fn empty() -> Self {
        Self {
            items: vec![],
            total: 0,
        }
    }
}

/// Remote paginated query.
pub trait PageSource {
    type Item;
    type Filter;

    /// Fetches up to `limit` items matching `filter`, skipping `offset`.
    fn fetch_page(
        &self,
        filter: &Self::Filter,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Page<Self::Item>, DashboardError>>;
}

/// Request for the next page issued by [`PagedList::begin_next`].
#[derive(Clone, Debug)]
pub struct PageRequest<F> {
    pub filter: F,
    pub offset: usize,
    pub limit: usize,
    ticket: Ticket,
}

impl<F> PageRequest<F> {
    /// 1-based page number for sources paginating by page.
    pub fn page(&self) -> usize {
        self.offset / self.limit.max(1) + 1
    }

    pub fn is_current(&self) -> bool {
        self.ticket.is_current()
    }
}

/// Load status of a [`PagedList`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListStatus {
    Idle,
    Loading { first_page: bool },
    Loaded,
    End,
}

/// Incrementally loaded remote list with "load more" semantics.
///
/// Accumulates pages in order, tracks the remote total count and the end of
/// the list. Changing the filter discards everything loaded so far,
/// including responses still in flight for the previous filter.
#[derive(Debug)]
pub struct PagedList<T, F> {
    filter: F,
    page_size: usize,
    items: Vec<T>,
    total: Option<usize>,
    status: ListStatus,
    epoch: Epoch,
}

impl<T, F: Clone + PartialEq + Debug> PagedList<T, F> {
    pub fn new(filter: F) -> Self {
        Self::with_page_size(filter, DEFAULT_PAGE_SIZE)
    }

    /// # Panics
    ///
    /// If `page_size` is zero.
    pub fn with_page_size(filter: F, page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be positive");
        Self {
            filter,
            page_size,
            items: vec![],
            total: None,
            status: ListStatus::Idle,
            epoch: Epoch::new(),
        }
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Items accumulated across all loaded pages.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Total count last reported by the source, `None` before the first page.
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    pub fn status(&self) -> ListStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, ListStatus::Loading { .. })
    }

    /// `true` once at least the first page has been applied.
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, ListStatus::Loaded | ListStatus::End)
            || matches!(self.status, ListStatus::Loading { first_page: false })
    }

    pub fn is_end(&self) -> bool {
        self.status == ListStatus::End
    }

    /// Switches to a new filter, discarding all accumulated items and any
    /// request in flight. No-op if the filter did not change.
    pub fn set_filter(&mut self, filter: F) {
        if self.filter == filter {
            return;
        }
        tracing::debug!(old = ?self.filter, new = ?filter, "List filter changed, resetting");
        self.filter = filter;
        self.reset();
    }

    /// Drops all accumulated items and pending requests, back to idle.
    pub fn reset(&mut self) {
        self.epoch.invalidate();
        self.items.clear();
        self.total = None;
        self.status = ListStatus::Idle;
    }

    /// Issues the request for the next page, or `None` while a page is
    /// loading or once the end of the list has been reached.
    pub fn begin_next(&mut self) -> Option<PageRequest<F>> {
        let first_page = match self.status {
            ListStatus::Loading { .. } | ListStatus::End => return None,
            ListStatus::Idle => true,
            ListStatus::Loaded => false,
        };
        self.status = ListStatus::Loading { first_page };
        Some(PageRequest {
            filter: self.filter.clone(),
            offset: self.items.len(),
            limit: self.page_size,
            ticket: self.epoch.advance(),
        })
    }

    /// Applies the outcome of a request issued by [`Self::begin_next`].
    ///
    /// Returns `false` if the request was superseded (filter change or
    /// reset) and its outcome was discarded.
    pub fn apply(
        &mut self,
        request: PageRequest<F>,
        result: Result<Page<T>, DashboardError>,
    ) -> bool {
        if !request.ticket.belongs_to(&self.epoch) || !request.ticket.is_current() {
            tracing::debug!(offset = request.offset, "Discarding page of superseded request");
            return false;
        }

        let page = match result {
            Ok(page) => page,
            // A failed first page reads as an empty list
            Err(err) if self.total.is_none() => {
                tracing::warn!(%err, offset = request.offset, "Failed to load first page");
                Page::empty()
            }
            Err(err) => {
                tracing::warn!(%err, offset = request.offset, "Failed to load page");
                self.status = ListStatus::Loaded;
                return true;
            }
        };

        let returned = page.items.len();
        let room = page.total.saturating_sub(self.items.len());
        if returned > room {
            tracing::debug!(
                returned,
                room,
                total = page.total,
                "Page exceeds reported total, truncating"
            );
        }
        self.items.extend(page.items.into_iter().take(room));
        self.items.truncate(page.total);
        self.total = Some(page.total);

        self.status = if returned < request.limit || self.items.len() >= page.total {
            ListStatus::End
        } else {
            ListStatus::Loaded
        };
        true
    }

    /// Loads the next page from `source`. Returns `false` if nothing was
    /// requested (already loading or at the end) or the page got discarded.
    pub async fn load_next<S>(&mut self, source: &S) -> bool
    where
        S: PageSource<Item = T, Filter = F>,
    {
        let Some(request) = self.begin_next() else {
            return false;
        };
        let result = source
            .fetch_page(&request.filter, request.offset, request.limit)
            .await;
        self.apply(request, result)
    }

    /// Loads pages until the end of the list, at most `max_pages` pages.
    pub async fn load_all<S>(&mut self, source: &S, max_pages: usize) -> &[T]
    where
        S: PageSource<Item = T, Filter = F>,
    {
        for _ in 0..max_pages {
            let before = self.items.len();
            if !self.load_next(source).await || (self.items.len() == before && !self.is_end()) {
                break;
            }
        }
        &self.items
    }
}

impl<T: Keyed, F> PagedList<T, F> {
    /// Joins every accumulated item against the given metadata snapshot.
    /// Synchronous, never re-fetches.
    pub fn entities<M>(&self, table: &MetadataTable<T::Key, M>) -> Vec<ViewEntity<&T, M>> {
        join(&self.items, table)
    }
}
