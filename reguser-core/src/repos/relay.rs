/*
    relay.rs - Re-pipe a store stream through a repository-owned buffer

    The relay task reads from the store's stream, maps each item and pushes
    it into its own bounded channel. It stops when the caller cancels, when
    its consumer drops the returned stream, or when the store stream ends.
    Stopping drops the inner stream, which in turn cancels the store
    producer.
*/

use crate::store::EntityStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Capacity of the repository-side buffer
pub const RELAY_BUFFER: usize = 100;

pub(crate) fn relay<T, U, F>(
    op: &'static str,
    mut inner: EntityStream<T>,
    token: &CancellationToken,
    map: F,
) -> EntityStream<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + 'static,
{
    let (tx, rx) = mpsc::channel(RELAY_BUFFER);
    let relay_token = token.child_token();
    let task_token = relay_token.clone();

    tokio::spawn(async move {
        let mut relayed = 0usize;
        loop {
            let item = tokio::select! {
                biased;
                _ = task_token.cancelled() => break,
                next = inner.recv() => match next {
                    Some(item) => item,
                    None => break,
                },
            };

            tokio::select! {
                biased;
                _ = task_token.cancelled() => break,
                res = tx.send(map(item)) => {
                    if res.is_err() {
                        break;
                    }
                    relayed += 1;
                }
            }
        }
        trace!(op, relayed, "relay finished");
    });

    EntityStream::new(rx, relay_token)
}
