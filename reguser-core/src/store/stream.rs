/*
    stream.rs - Bounded, cancellable result streams

    A search or listing returns an EntityStream backed by a bounded mpsc
    channel. The producing task watches a cancellation token that fires
    when either the caller cancels or the consumer drops the stream.
*/

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, trace};

use crate::metrics;

/// Default capacity of every result buffer
pub const DEFAULT_STREAM_BUFFER: usize = 100;

/// Default wall-clock budget for a single search or listing
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Finite, unordered sequence of entities delivered incrementally.
///
/// The stream ends when the producer finishes, gives up after its time
/// budget, or observes cancellation. Truncation is silent. Dropping the
/// stream cancels the producer.
pub struct EntityStream<T> {
    rx: mpsc::Receiver<T>,
    _cancel_on_drop: DropGuard,
}

impl<T> EntityStream<T> {
    pub(crate) fn new(rx: mpsc::Receiver<T>, token: CancellationToken) -> Self {
        EntityStream {
            rx,
            _cancel_on_drop: token.drop_guard(),
        }
    }

    /// Receive the next entity, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Consume the stream into a vector
    pub async fn collect_all(mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Some(item) = self.rx.recv().await {
            items.push(item);
        }
        items
    }
}

impl<T> Stream for EntityStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

impl<T> std::fmt::Debug for EntityStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStream").finish_non_exhaustive()
    }
}

/// Spawn a producer that feeds `items` into a new stream.
///
/// The producer stops at the first of: all items sent, `budget` elapsed,
/// `token` (or the returned stream's own token) cancelled, consumer gone.
pub(crate) fn spawn_producer<T>(
    op: &'static str,
    items: Vec<T>,
    token: &CancellationToken,
    budget: Duration,
    capacity: usize,
) -> EntityStream<T>
where
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let stream_token = token.child_token();
    let producer_token = stream_token.clone();
    let deadline = Instant::now() + budget;
    let total = items.len();

    tokio::spawn(async move {
        let expired = tokio::time::sleep_until(deadline);
        tokio::pin!(expired);

        let mut sent = 0usize;
        for item in items {
            tokio::select! {
                biased;
                _ = producer_token.cancelled() => {
                    debug!(op, sent, total, "stream cancelled");
                    metrics::record_stream_end(op, "cancelled");
                    return;
                }
                _ = &mut expired => {
                    debug!(op, sent, total, "stream budget elapsed, result truncated");
                    metrics::record_stream_end(op, "timeout");
                    return;
                }
                res = tx.send(item) => {
                    if res.is_err() {
                        trace!(op, sent, "stream consumer went away");
                        metrics::record_stream_end(op, "dropped");
                        return;
                    }
                    sent += 1;
                }
            }
        }

        trace!(op, sent, "stream complete");
        metrics::record_stream_end(op, "complete");
    });

    EntityStream::new(rx, stream_token)
}
