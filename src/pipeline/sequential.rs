use std::fmt::Display;

use super::{FetchResult, Ticket};

/// Runs `op` over `items` strictly one after another, in order.
///
/// The operation for item *i+1* is only invoked once the operation for item
/// *i* has settled, so the result at index *i* always corresponds to item *i*.
/// A failed item resolves to [`FetchResult::NotApplicable`] and never
/// affects its siblings.
///
/// Before each item the `ticket` is checked: once a newer run has been
/// started, no further items are invoked and `None` is returned, discarding
/// results already collected. An operation that is in flight when the run
/// gets superseded is awaited to completion, its result is ignored.
pub async fn fetch_sequential<I, T, E, F, Fut>(
    items: impl IntoIterator<Item = I>,
    ticket: &Ticket,
    mut op: F,
) -> Option<Vec<FetchResult<T>>>
where
    F: FnMut(I) -> Fut,
    Fut: Future<Output = Result<FetchResult<T>, E>>,
    E: Display,
{
    let items = items.into_iter();
    let mut results = Vec::with_capacity(items.size_hint().0);

    for (index, item) in items.enumerate() {
        if !ticket.is_current() {
            tracing::debug!(
                index,
                generation = ticket.generation(),
                "Sequential fetch superseded, dropping partial results"
            );
            return None;
        }

        let result = match op(item).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(index, %err, "Fetch failed, treating item as not applicable");
                FetchResult::NotApplicable
            }
        };
        results.push(result);
    }

    ticket.is_current().then_some(results)
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        time::Duration,
    };

    use super::*;
    use crate::pipeline::Epoch;

    #[tokio::test(start_paused = true)]
    async fn test_results_keep_item_order_regardless_of_latency() {
        let epoch = Epoch::new();
        let ticket = epoch.advance();
        let in_flight = Cell::new(0);
        let max_in_flight = Cell::new(0);

        let results = fetch_sequential([30u64, 10, 20, 0], &ticket, |delay| {
            let in_flight = &in_flight;
            let max_in_flight = &max_in_flight;
            async move {
                in_flight.set(in_flight.get() + 1);
                max_in_flight.set(max_in_flight.get().max(in_flight.get()));
                tokio::time::sleep(Duration::from_millis(delay)).await;
                in_flight.set(in_flight.get() - 1);
                Ok::<_, String>(FetchResult::Populated(delay))
            }
        })
        .await
        .unwrap();

        assert_eq!(
            results,
            vec![
                FetchResult::Populated(30),
                FetchResult::Populated(10),
                FetchResult::Populated(20),
                FetchResult::Populated(0),
            ]
        );
        assert_eq!(max_in_flight.get(), 1);
    }

    #[tokio::test]
    async fn test_failed_item_becomes_not_applicable() {
        let epoch = Epoch::new();
        let ticket = epoch.advance();

        let results = fetch_sequential(1..=4, &ticket, |i| async move {
            match i {
                2 => Err("rpc unavailable"),
                3 => Ok(FetchResult::NotApplicable),
                _ => Ok(FetchResult::Populated(i * 10)),
            }
        })
        .await
        .unwrap();

        assert_eq!(
            results,
            vec![
                FetchResult::Populated(10),
                FetchResult::NotApplicable,
                FetchResult::NotApplicable,
                FetchResult::Populated(40),
            ]
        );
    }

    #[tokio::test]
    async fn test_superseded_run_stops_invoking_items() {
        let epoch = Epoch::new();
        let ticket = epoch.advance();
        let invoked = RefCell::new(vec![]);

        let results = fetch_sequential(0..5, &ticket, |i| {
            invoked.borrow_mut().push(i);
            if i == 1 {
                // e.g. the account changed while item 1 was in flight
                epoch.advance();
            }
            async move { Ok::<_, String>(FetchResult::Populated(i)) }
        })
        .await;

        assert_eq!(results, None);
        assert_eq!(*invoked.borrow(), vec![0, 1]);
    }

    #[test]
    fn test_empty_input() {
        let ticket = Epoch::new().advance();
        let results = tokio_test::block_on(fetch_sequential(Vec::<u8>::new(), &ticket, |_| async {
            Ok::<FetchResult<u8>, String>(FetchResult::NotApplicable)
        }));
        assert_eq!(results, Some(vec![]));
    }
}
