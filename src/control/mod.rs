//! C2: Control Transport.
//!
//! Owns the control WebSocket, split into an independently-driveable sender
//! half and receiver half so the session's sender and receiver tasks never
//! contend on the same lock for unrelated operations.

pub mod error;
pub mod ws;

use crate::constants::CONTROL_SEND_TIMEOUT;
use futures::{
    stream::{SplitSink, SplitStream, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;
use voicecore_model::ControlPayload;
use ws::{Inbound, InboundFramer, OutboundFramer, WsStream};

pub use error::{Error, Result};

/// The sending half of a control transport.
///
/// Cloneable; every clone shares the same send mutex and outbound buffer,
/// so sends across clones still serialise.
#[derive(Clone)]
pub struct ControlSender {
    inner: Arc<Mutex<(SplitSink<WsStream, async_tungstenite::tungstenite::Message>, OutboundFramer)>>,
}

impl ControlSender {
    #[instrument(skip(self, payload))]
    pub async fn send(&self, payload: &ControlPayload) -> Result<()> {
        let mut guard = tokio::time::timeout(CONTROL_SEND_TIMEOUT, self.inner.lock())
            .await
            .map_err(|_| Error::Timeout)?;

        let (sink, framer) = &mut *guard;
        let message = framer.encode(payload)?;

        sink.send(message).await?;
        Ok(())
    }

    /// Closes the socket. `reconnect_intended = true` signals the peer to
    /// preserve session state for a resume; `false` is a normal closure.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, reconnect_intended: bool) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let (sink, _) = &mut *guard;
        ws::send_close_on_sink(sink, reconnect_intended).await
    }
}

/// The receiving half of a control transport. Not `Clone`: receives are
/// single-consumer by contract.
pub struct ControlReceiver {
    stream: SplitStream<WsStream>,
    framer: InboundFramer,
}

impl ControlReceiver {
    /// Returns the next decoded payload, `Ok(None)` on a clean peer-initiated
    /// close, or an error for anything else (including an explicit close
    /// frame, surfaced as [`Error::WsClosed`]).
    #[instrument(skip(self))]
    pub async fn recv(&mut self) -> Result<Option<ControlPayload>> {
        loop {
            let message = match self.stream.next().await {
                Some(Ok(m)) => m,
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(None),
            };

            match self.framer.push(message)? {
                Inbound::Payload(p) => return Ok(Some(p)),
                Inbound::Incomplete => continue,
                Inbound::Closed(frame) => return Err(Error::WsClosed(frame)),
            }
        }
    }
}

/// Opens a control WebSocket connection to `url`, returning independently
/// owned send/receive halves.
///
/// Connects exactly once; reconnection means calling this again to
/// construct a fresh pair.
#[instrument]
pub async fn connect(url: url::Url) -> Result<(ControlSender, ControlReceiver)> {
    let stream = ws::connect(url).await?;
    let (sink, stream) = stream.split();

    let sender = ControlSender { inner: Arc::new(Mutex::new((sink, OutboundFramer::new()))) };
    let receiver = ControlReceiver { stream, framer: InboundFramer::new() };

    Ok((sender, receiver))
}
