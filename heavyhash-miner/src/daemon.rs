//! Daemon lifecycle for heavyhash-miner.
//!
//! Connects to the node, wires the miner, hashrate reporter, outbound pump
//! and protocol session together as tracked tasks, and tears everything down
//! on a signal or when the connection ends.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal::unix::{self, SignalKind};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::config::Config;
use crate::miner::{report_hashrate, Miner};
use crate::pow::Xoshiro256PlusPlus;
use crate::protocol::{Session, SessionOptions};
use crate::tracing::prelude::*;
use crate::{submission, transport};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// The main daemon.
pub struct Daemon {
    config: Config,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl Daemon {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Run the daemon until shutdown is requested or the node goes away.
    pub async fn run(self) -> anyhow::Result<()> {
        let config = &self.config;

        let (reader, writer) =
            tokio::time::timeout(CONNECT_TIMEOUT, transport::connect(&config.node_addr))
                .await
                .with_context(|| format!("Timed out connecting to {}", config.node_addr))?
                .with_context(|| format!("Failed to connect to {}", config.node_addr))?;

        let (outbound, queue) = submission::channel(config.queue_capacity, config.credit_limit);
        let credit = queue.credit();

        // The reporter stops with the daemon, or on its own if mining fails
        let reporter = self.shutdown.child_token();
        let miner = Arc::new(Miner::new(
            outbound.clone(),
            config.batch_size,
            reporter.clone(),
        ));

        self.tracker.spawn(report_hashrate(
            miner.hash_counter(),
            config.hashrate_interval,
            reporter,
        ));

        self.tracker.spawn({
            let miner = Arc::clone(&miner);
            let shutdown = self.shutdown.clone();
            async move {
                // Failures are logged inside; the pump then ends on the marker
                let _ = miner.mine(Xoshiro256PlusPlus::from_entropy(), shutdown).await;
            }
        });

        // Outbound pump: queue -> node
        self.tracker.spawn({
            let shutdown = self.shutdown.clone();
            async move {
                tokio::select! {
                    result = transport::forward(writer, queue.into_stream()) => {
                        match result {
                            Ok(()) => info!("Outbound stream ended"),
                            Err(e) => error!(error = %e, "Failed to send to node"),
                        }
                    }
                    _ = shutdown.cancelled() => {}
                }
                shutdown.cancel();
            }
        });

        // Inbound: node -> session
        let session = Session::new(miner, outbound, credit, SessionOptions::from(config));
        let session_task = self.tracker.spawn({
            let shutdown = self.shutdown.clone();
            async move {
                let result = tokio::select! {
                    result = async {
                        session.start().await?;
                        session.run(transport::inbound(reader)).await
                    } => result,
                    _ = shutdown.cancelled() => Ok(()),
                };
                shutdown.cancel();
                result
            }
        });

        self.tracker.close();

        info!(
            node = %config.node_addr,
            pay_address = %config.pay_address,
            "Started."
        );
        info!("For debugging, set RUST_LOG=heavyhash_miner=debug or trace.");

        let mut sigint = unix::signal(SignalKind::interrupt())?;
        let mut sigterm = unix::signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT.");
            },
            _ = sigterm.recv() => {
                info!("Received SIGTERM.");
            },
            _ = self.shutdown.cancelled() => {
                info!("Connection to node ended.");
            },
        }

        self.shutdown.cancel();
        self.tracker.wait().await;
        info!("Exiting.");

        session_task.await?.context("Session with node failed")
    }
}
