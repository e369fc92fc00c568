use std::time::Duration;

use futures::{Stream, stream};

use crate::{client::ContractClient, error::DashboardError};

/// Returns stream of newly mined block numbers, starting after `from`.
///
/// Polls [`ContractClient::block_number`] every `poll_interval`, emitting
/// every block number exactly once and in order, even if several blocks
/// were mined between two polls. A failed poll is emitted as an error and
/// polling continues afterwards.
///
/// Used to refresh views on new blocks.
pub fn blocks<C, S, SFut>(
    client: &C,
    from: u64,
    poll_interval: Duration,
    sleep: S,
) -> impl Stream<Item = Result<u64, DashboardError>>
where
    C: ContractClient,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    stream::unfold((from, from), move |(mut last, mut head)| async move {
        loop {
            if head > last {
                last += 1;
                return Some((Ok(last), (last, head)));
            }
            match client.block_number().await {
                Ok(number) if number > last => head = number,
                Ok(_) => sleep(poll_interval).await,
                Err(err) => {
                    sleep(poll_interval).await;
                    return Some((Err(err), (last, head)));
                }
            }
        }
    })
}
