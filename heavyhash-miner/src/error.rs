//! Error types for the mining engine and its session.

use thiserror::Error;

use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum MinerError {
    #[error("Outbound channel closed")]
    ChannelClosed,

    #[error("Work signal closed")]
    WorkSignalClosed,

    #[error("Unexpected message from node: {kind}")]
    UnexpectedMessage { kind: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type MinerResult<T> = Result<T, MinerError>;
