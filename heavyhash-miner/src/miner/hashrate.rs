//! Hash counting and periodic hashrate reports.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::tracing::prelude::*;
use crate::types::HashRate;

/// Running count of nonces tried since the last sample.
#[derive(Debug)]
pub struct HashCounter {
    state: Mutex<CounterState>,
}

#[derive(Debug)]
struct CounterState {
    hashes: u64,
    since: Instant,
}

impl HashCounter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CounterState {
                hashes: 0,
                since: Instant::now(),
            }),
        }
    }

    pub async fn add(&self, hashes: u64) {
        let mut state = self.state.lock().await;
        state.hashes = state.hashes.saturating_add(hashes);
    }

    /// Hashes counted since the last successful sample.
    pub async fn count(&self) -> u64 {
        self.state.lock().await.hashes
    }

    /// Compute the rate since the last sample and start a new interval.
    ///
    /// If no time has passed, nothing is reset and `None` is returned.
    pub async fn sample_at(&self, now: Instant) -> Option<HashRate> {
        let mut state = self.state.lock().await;
        let elapsed = now.checked_duration_since(state.since)?;
        let rate = HashRate::from_hashes(state.hashes, elapsed)?;
        state.hashes = 0;
        state.since = now;
        Some(rate)
    }

    pub async fn sample(&self) -> Option<HashRate> {
        self.sample_at(Instant::now()).await
    }
}

impl Default for HashCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Log the hashrate every `interval` until `shutdown` is cancelled.
pub async fn report_hashrate(
    counter: Arc<HashCounter>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Hashrate reporter stopped");
                break;
            }
            _ = ticker.tick() => {
                if let Some(rate) = counter.sample().await {
                    info!(hashrate = %rate, "Hashrate");
                }
            }
        }
    }
}
