//! Protocol session with the node.
//!
//! The session subscribes to new block templates and keeps the miner fed:
//!
//! ```text
//!   start ──> getInfo, getBlockDagInfo, notifyNewBlockTemplate, getBlockTemplate
//!
//!   newBlockTemplateNotification ──> getBlockTemplate
//!   getBlockTemplateResponse     ──> Miner::set_work
//!   submitBlockResponse          ──> log rejection
//! ```
//!
//! Every response returns one unit of outbound credit, whatever its content.
//! Errors reported by the node are logged and otherwise ignored. A message
//! the session has no business receiving ends it.

use std::sync::Arc;

use futures::Stream;
use tokio_stream::StreamExt;

use super::messages::KaspadMessage;
use crate::config::Config;
use crate::error::{MinerError, MinerResult};
use crate::miner::Miner;
use crate::submission::{Credit, SubmissionSender};
use crate::tracing::prelude::*;
use crate::transport::TransportError;

/// What the session asks the node for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub pay_address: String,
    pub extra_data: String,
    pub mine_when_not_synced: bool,
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            pay_address: config.pay_address.clone(),
            extra_data: config.extra_data.clone(),
            mine_when_not_synced: config.mine_when_not_synced,
        }
    }
}

pub struct Session {
    miner: Arc<Miner>,
    outbound: SubmissionSender,
    credit: Credit,
    options: SessionOptions,
}

impl Session {
    pub fn new(
        miner: Arc<Miner>,
        outbound: SubmissionSender,
        credit: Credit,
        options: SessionOptions,
    ) -> Self {
        Self {
            miner,
            outbound,
            credit,
            options,
        }
    }

    /// Queue the startup requests.
    pub async fn start(&self) -> MinerResult<()> {
        self.outbound.send(KaspadMessage::get_info()).await?;
        self.outbound.send(KaspadMessage::get_block_dag_info()).await?;
        self.outbound
            .send(KaspadMessage::notify_new_block_template())
            .await?;
        self.request_template().await
    }

    /// Process inbound messages until the node closes the stream.
    pub async fn run<S>(&self, inbound: S) -> MinerResult<()>
    where
        S: Stream<Item = Result<KaspadMessage, TransportError>>,
    {
        let mut inbound = std::pin::pin!(inbound);

        while let Some(msg) = inbound.next().await {
            match msg {
                Ok(msg) => self.handle_message(msg).await?,
                Err(TransportError::UnknownMessage(kind)) => {
                    return self.bad_response(kind).await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to read from node");
                    self.outbound.shutdown().await?;
                    return Err(e.into());
                }
            }
        }

        info!("Node closed the connection");
        Ok(())
    }

    /// Handle one message from the node.
    pub async fn handle_message(&self, msg: KaspadMessage) -> MinerResult<()> {
        if msg.is_response() {
            self.credit.release();
        }

        if let Some(text) = msg.error() {
            error!("Error from {}: {}", msg.kind(), text);
            return Ok(());
        }

        match msg {
            KaspadMessage::GetInfoResponse(info) => {
                info!(version = %info.server_version, synced = info.is_synced, "Connected to node");
            }
            KaspadMessage::GetBlockDagInfoResponse(dag) => {
                info!(network = %dag.network_name, "Network");
            }
            KaspadMessage::NotifyNewBlockTemplateResponse(_) => {
                info!("Subscribed to template notifier");
            }
            KaspadMessage::NewBlockTemplateNotification(_) => {
                self.request_template().await?;
            }
            KaspadMessage::GetBlockTemplateResponse(template) => {
                if !template.is_synced && !self.options.mine_when_not_synced {
                    warn!("Node is not synced, skipping template");
                    return Ok(());
                }
                let Some(block) = template.block else {
                    warn!("Template response carried no block");
                    return Ok(());
                };
                info!("Current target: {}", block.header.target());
                self.miner.set_work(Some(block)).await;
            }
            KaspadMessage::SubmitBlockResponse(result) => {
                if result.reject_reason.is_rejected() {
                    error!(reason = %result.reject_reason, "Block rejected");
                } else {
                    info!("Block accepted");
                }
            }
            other => return self.bad_response(other.kind().to_string()).await,
        }

        Ok(())
    }

    async fn request_template(&self) -> MinerResult<()> {
        self.outbound
            .send(KaspadMessage::get_block_template(
                &self.options.pay_address,
                &self.options.extra_data,
            ))
            .await
    }

    async fn bad_response(&self, kind: String) -> MinerResult<()> {
        error!("Bad response: {}", kind);
        self.outbound.shutdown().await?;
        Err(MinerError::UnexpectedMessage { kind })
    }
}
