//! Aggregation pipeline.
//!
//! Turns a list of independent remote sources (pools, bonds, voters) into one
//! ordered view model, tolerating failure of individual sources:
//!
//! 1. [`fetch_sequential`] queries source items one at a time, a failed item
//!    degrades to [`FetchResult::NotApplicable`].
//! 2. [`retain_populated`]/[`flatten_populated`] drop inapplicable items
//!    without reordering.
//! 3. [`join`] attaches metadata from a [`MetadataTable`] snapshot.
//! 4. [`aggregate`] functions derive sums and rank thresholds.
//!
//! [`PagedList`] runs as an independent flow feeding "load more" interactions
//! from a [`PageSource`].
//!
//! Results of superseded runs (account or filter changed meanwhile) are
//! dropped at commit time by [`Epoch`]/[`Ticket`] checks, see [`ViewSlot`].

pub mod aggregate;
mod epoch;
mod filter;
mod join;
mod paged;
mod sequential;

pub use aggregate::Standing;
pub use epoch::{Epoch, Loadable, Ticket, ViewSlot};
pub use filter::{FetchResult, flatten_populated, retain_populated};
pub use join::{Keyed, MetadataStore, MetadataTable, ViewEntity, join};
pub use paged::{DEFAULT_PAGE_SIZE, ListStatus, Page, PageRequest, PageSource, PagedList};
pub use sequential::fetch_sequential;
