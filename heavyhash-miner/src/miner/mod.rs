//! Work coordination and the nonce search loop.
//!
//! The [`Miner`] owns at most one active [`WorkItem`]. The protocol session
//! replaces it through [`Miner::set_work`] whenever the node delivers a new
//! template, and a single search loop ([`Miner::mine`]) tries nonces against
//! it in small batches.
//!
//! ```text
//!   session ── set_work ──> [ Mutex<Option<WorkItem>> ] <── run_batch ── mine loop
//!                                   │                             │
//!                          work_available (watch)          hit: submitBlock
//!                                                                 │
//!                                                                 v
//!                                                         SubmissionSender
//! ```
//!
//! Every read or replacement of the active work happens under one lock held
//! for the whole transaction, so a batch never mixes state from two
//! templates, and a template cleared before a batch starts can never be
//! submitted.

mod hashrate;
mod work;

pub use hashrate::{report_hashrate, HashCounter};
pub use work::WorkItem;

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::{MinerError, MinerResult};
use crate::header::RpcBlock;
use crate::pow::Xoshiro256PlusPlus;
use crate::protocol::KaspadMessage;
use crate::submission::SubmissionSender;
use crate::tracing::prelude::*;

/// Nonces tried per lock acquisition unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Shared mining state.
#[derive(Debug)]
pub struct Miner {
    work: Mutex<Option<WorkItem>>,

    /// True while there is a work item worth searching.
    work_available: watch::Sender<bool>,

    hashes: Arc<HashCounter>,
    outbound: SubmissionSender,
    batch_size: usize,

    /// Cancelled if the search loop fails.
    reporter: CancellationToken,
}

impl Miner {
    pub fn new(outbound: SubmissionSender, batch_size: usize, reporter: CancellationToken) -> Self {
        let (work_available, _) = watch::channel(false);
        Self {
            work: Mutex::new(None),
            work_available,
            hashes: Arc::new(HashCounter::new()),
            outbound,
            batch_size: batch_size.max(1),
            reporter,
        }
    }

    /// Counter fed by the search loop, for the hashrate reporter.
    pub fn hash_counter(&self) -> Arc<HashCounter> {
        Arc::clone(&self.hashes)
    }

    /// Replace the active work.
    ///
    /// `None` stops the search. Otherwise the block's target, pre-PoW hash
    /// and matrix are derived while the lock is held, so the search loop
    /// only ever sees a complete item.
    pub async fn set_work(&self, block: Option<RpcBlock>) {
        let mut work = self.work.lock().await;
        match block {
            None => {
                *work = None;
                self.work_available.send_replace(false);
                debug!("Work cleared");
            }
            Some(block) => {
                let item = WorkItem::new(block);
                trace!(
                    daa_score = item.block.header.daa_score,
                    timestamp = item.block.header.timestamp,
                    "New work"
                );
                *work = Some(item);
                self.work_available.send_replace(true);
            }
        }
    }

    /// Whether a work item is currently active.
    pub async fn has_work(&self) -> bool {
        self.work.lock().await.is_some()
    }

    /// Run the nonce search until `shutdown` is cancelled.
    ///
    /// `rng` supplies the nonces and is owned by the loop for its lifetime.
    /// Any failure stops the hashrate reporter and pushes the shutdown marker
    /// into the outbound queue before the error is returned.
    pub async fn mine(
        &self,
        mut rng: Xoshiro256PlusPlus,
        shutdown: CancellationToken,
    ) -> MinerResult<()> {
        let result = self.search(&mut rng, &shutdown).await;

        if let Err(e) = &result {
            error!(error = %e, "Error while mining");
            self.reporter.cancel();
            if self.outbound.shutdown().await.is_err() {
                debug!("Outbound queue already closed");
            }
        }

        result
    }

    async fn search(
        &self,
        rng: &mut Xoshiro256PlusPlus,
        shutdown: &CancellationToken,
    ) -> MinerResult<()> {
        let mut work_available = self.work_available.subscribe();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Mining loop stopped");
                    return Ok(());
                }
                ready = work_available.wait_for(|available| *available) => {
                    ready.map_err(|_| MinerError::WorkSignalClosed)?;
                }
            }

            self.run_batch(rng).await?;
            tokio::task::yield_now().await;
        }
    }

    /// Try one batch of nonces against the active work.
    ///
    /// On a hit the work item is consumed: its header is stamped with the
    /// winning nonce and queued for submission, and the search idles until
    /// new work arrives.
    async fn run_batch(&self, rng: &mut Xoshiro256PlusPlus) -> MinerResult<()> {
        let solved = {
            let mut work = self.work.lock().await;
            let Some(item) = work.as_ref() else {
                return Ok(());
            };

            let hit = (0..self.batch_size).find_map(|i| {
                let nonce = rng.next_u64();
                let (met, _) = item.pow.check(nonce);
                met.then_some((i, nonce))
            });

            match hit {
                Some((i, nonce)) => {
                    self.hashes.add(i as u64 + 1).await;
                    self.work_available.send_replace(false);
                    work.take().map(|item| item.into_solved(nonce))
                }
                None => {
                    self.hashes.add(self.batch_size as u64).await;
                    None
                }
            }
        };

        if let Some(block) = solved {
            info!(hash = %block.header.hash(), nonce = block.header.nonce, "Found block");
            self.outbound.send(KaspadMessage::submit_block(block)).await?;
        }

        Ok(())
    }
}
