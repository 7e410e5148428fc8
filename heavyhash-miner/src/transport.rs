//! Newline-delimited JSON transport to the node.
//!
//! Each line carries one [`KaspadMessage`] envelope. The reader half decodes
//! lines into messages; the writer half drains the outbound stream produced
//! by the submission channel. Both halves are generic over tokio I/O so tests
//! can run them over in-memory pipes.

use futures::{SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use crate::protocol::KaspadMessage;
use crate::tracing::prelude::*;

/// Longest line accepted from the node. Templates with many transactions
/// are large, but never this large.
pub const MAX_LINE_LENGTH: usize = 32 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line codec error: {0}")]
    Codec(#[from] LinesCodecError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message is not a single-kind object")]
    Envelope,

    #[error("Malformed {kind}: {source}")]
    Decode {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown message kind: {0}")]
    UnknownMessage(String),
}

/// Open a TCP connection to the node and split it into halves.
pub async fn connect(addr: &str) -> Result<(OwnedReadHalf, OwnedWriteHalf), TransportError> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    info!(addr = %addr, "Connected to node");
    Ok(stream.into_split())
}

/// Decode one line into a message.
///
/// The envelope's kind is checked against the known vocabulary before the
/// payload is decoded, so an unrecognized kind is reported as such rather
/// than as a generic decode failure.
pub fn decode_line(line: &str) -> Result<KaspadMessage, TransportError> {
    let value: serde_json::Value = serde_json::from_str(line)?;

    let kind = match value.as_object() {
        Some(object) if object.len() == 1 => object.keys().next().cloned(),
        _ => None,
    }
    .ok_or(TransportError::Envelope)?;

    if !KaspadMessage::KINDS.contains(&kind.as_str()) {
        return Err(TransportError::UnknownMessage(kind));
    }

    serde_json::from_value(value).map_err(|source| TransportError::Decode { kind, source })
}

/// Stream of messages read from the node.
pub fn inbound<R>(reader: R) -> impl Stream<Item = Result<KaspadMessage, TransportError>>
where
    R: AsyncRead + Unpin,
{
    FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH))
        .map(|line| decode_line(&line?))
}

/// Write every message from `outbound` to the node, one per line.
///
/// Returns once `outbound` ends.
pub async fn forward<W, S>(writer: W, outbound: S) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
    S: Stream<Item = KaspadMessage>,
{
    let mut sink = FramedWrite::new(writer, LinesCodec::new());
    let mut outbound = std::pin::pin!(outbound);

    while let Some(msg) = outbound.next().await {
        let line = serde_json::to_string(&msg)?;
        sink.send(line).await?;
    }

    debug!("Outbound stream finished");
    Ok(())
}
