//! Outbound message channel with credit-based flow control.
//!
//! Everything the miner sends to the node passes through one bounded queue.
//! The queue is drained by [`OutboundQueue::into_stream`], which hands each
//! message to the transport and then waits for one unit of [`Credit`] before
//! pulling the next. Credit is returned only when a response arrives, so the
//! number of requests the node has not yet answered stays bounded even when
//! producers run ahead.
//!
//! ```text
//!  miner ──┐
//!          ├─> [ queue: 4 ] ──> stream ──> transport ──> node
//! session ─┘                      ▲                        │
//!                                 └── credit.release() <───┘ (responses only)
//! ```
//!
//! The queue and the credit are deliberately separate primitives: the queue
//! bounds buffering, the credit bounds in-flight requests.

use std::sync::Arc;

use futures::Stream;
use tokio::sync::{mpsc, Semaphore};

use crate::error::{MinerError, MinerResult};
use crate::protocol::KaspadMessage;
use crate::tracing::prelude::*;

/// An entry in the outbound queue.
#[derive(Debug)]
pub enum Outbound {
    /// Forward this message to the node.
    Message(KaspadMessage),
    /// End the send sequence. Consumed, never forwarded.
    Shutdown,
}

/// Create the outbound queue and its credit pool.
pub fn channel(queue_capacity: usize, credit_limit: usize) -> (SubmissionSender, OutboundQueue) {
    let (tx, rx) = mpsc::channel(queue_capacity.max(1));
    let credit = Credit::new(credit_limit);
    (
        SubmissionSender { tx },
        OutboundQueue { rx, credit },
    )
}

/// Producer side of the outbound queue.
#[derive(Debug, Clone)]
pub struct SubmissionSender {
    tx: mpsc::Sender<Outbound>,
}

impl SubmissionSender {
    /// Enqueue a message, waiting while the queue is full.
    pub async fn send(&self, msg: KaspadMessage) -> MinerResult<()> {
        self.tx
            .send(Outbound::Message(msg))
            .await
            .map_err(|_| MinerError::ChannelClosed)
    }

    /// Enqueue the shutdown sentinel.
    pub async fn shutdown(&self) -> MinerResult<()> {
        self.tx
            .send(Outbound::Shutdown)
            .await
            .map_err(|_| MinerError::ChannelClosed)
    }
}

/// Counting allowance for requests awaiting a response.
#[derive(Debug, Clone)]
pub struct Credit {
    permits: Arc<Semaphore>,
}

impl Credit {
    fn new(limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit)),
        }
    }

    /// Return one unit, typically on receipt of a response.
    pub fn release(&self) {
        self.permits.add_permits(1);
    }

    /// Units currently available.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Take one unit, waiting until one is available.
    async fn acquire(&self) -> MinerResult<()> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| MinerError::ChannelClosed)?;
        // Consumed until a response explicitly gives it back
        permit.forget();
        Ok(())
    }
}

/// Consumer side of the outbound queue.
#[derive(Debug)]
pub struct OutboundQueue {
    rx: mpsc::Receiver<Outbound>,
    credit: Credit,
}

impl OutboundQueue {
    /// Handle for returning credit as responses arrive.
    pub fn credit(&self) -> Credit {
        self.credit.clone()
    }

    /// Turn the queue into the stream of messages to send.
    ///
    /// The first message goes out immediately. Each later pull first takes
    /// one unit of credit. The stream ends at the shutdown sentinel or when
    /// every sender has been dropped.
    pub fn into_stream(self) -> impl Stream<Item = KaspadMessage> + Send + 'static {
        futures::stream::unfold((self, false), |(mut queue, sent)| async move {
            if sent && queue.credit.acquire().await.is_err() {
                return None;
            }

            match queue.rx.recv().await {
                Some(Outbound::Message(msg)) => {
                    trace!(kind = msg.kind(), "Sending");
                    Some((msg, (queue, true)))
                }
                Some(Outbound::Shutdown) => {
                    debug!("Outbound queue reached shutdown marker");
                    None
                }
                None => {
                    debug!("Outbound queue closed");
                    None
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::time::{timeout, Duration};

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_messages_flow_in_order() {
        let (tx, queue) = channel(4, 10);
        tx.send(KaspadMessage::get_info()).await.unwrap();
        tx.send(KaspadMessage::get_block_dag_info()).await.unwrap();

        let mut stream = Box::pin(queue.into_stream());
        assert_eq!(stream.next().await, Some(KaspadMessage::get_info()));
        assert_eq!(stream.next().await, Some(KaspadMessage::get_block_dag_info()));
    }

    #[tokio::test]
    async fn test_sends_block_when_credit_exhausted() {
        let (tx, queue) = channel(8, 2);
        let credit = queue.credit();
        for _ in 0..5 {
            tx.send(KaspadMessage::get_info()).await.unwrap();
        }

        let mut stream = Box::pin(queue.into_stream());

        // The first message is free; the next two each consume one unit
        for _ in 0..3 {
            assert!(timeout(SHORT, stream.next()).await.unwrap().is_some());
        }
        assert_eq!(credit.available(), 0);

        // Out of credit: the fourth message waits
        assert!(timeout(SHORT, stream.next()).await.is_err());

        // One response releases exactly one more send
        credit.release();
        assert!(timeout(SHORT, stream.next()).await.unwrap().is_some());
        assert!(timeout(SHORT, stream.next()).await.is_err());
    }

    #[tokio::test]
    async fn test_release_adds_one_unit() {
        let (_tx, queue) = channel(4, 3);
        let credit = queue.credit();
        assert_eq!(credit.available(), 3);
        credit.release();
        assert_eq!(credit.available(), 4);
    }

    #[tokio::test]
    async fn test_shutdown_marker_ends_stream() {
        let (tx, queue) = channel(4, 10);
        tx.send(KaspadMessage::get_info()).await.unwrap();
        tx.shutdown().await.unwrap();
        tx.send(KaspadMessage::get_block_dag_info()).await.unwrap();

        let forwarded: Vec<_> = timeout(SHORT, queue.into_stream().collect::<Vec<_>>())
            .await
            .unwrap();
        assert_eq!(forwarded, vec![KaspadMessage::get_info()]);
    }

    #[tokio::test]
    async fn test_stream_ends_when_senders_dropped() {
        let (tx, queue) = channel(4, 10);
        tx.send(KaspadMessage::get_info()).await.unwrap();
        drop(tx);

        let forwarded: Vec<_> = timeout(SHORT, queue.into_stream().collect::<Vec<_>>())
            .await
            .unwrap();
        assert_eq!(forwarded.len(), 1);
    }

    #[tokio::test]
    async fn test_full_queue_applies_backpressure() {
        let (tx, queue) = channel(1, 10);
        tx.send(KaspadMessage::get_info()).await.unwrap();
        assert!(timeout(SHORT, tx.send(KaspadMessage::get_info())).await.is_err());
        drop(queue);
        assert!(matches!(
            tx.send(KaspadMessage::get_info()).await,
            Err(MinerError::ChannelClosed)
        ));
    }
}
