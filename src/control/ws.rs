//! Wire framing for the control WebSocket.
//!
//! Encodes and decodes [`ControlPayload`]s over an `async-tungstenite`
//! [`WsStream`], bounding outbound payload size and accumulating inbound
//! bytes across frames into a segmented buffer until a full JSON document
//! can be decoded.

use crate::constants::MAX_OUTBOUND_PAYLOAD_BYTES;
pub use crate::control::error::{Error, Result};
use async_tungstenite::{
    tokio::ConnectStream,
    tungstenite::{protocol::frame::coding::CloseCode, protocol::CloseFrame, Message},
    WebSocketStream,
};
use futures::SinkExt;
use voicecore_model::ControlPayload;

pub type WsStream = WebSocketStream<ConnectStream>;

/// Default capacity the outbound buffer is reset to after any send, win or
/// lose. Chosen well above the typical Identify/SelectProtocol payload size
/// but far below [`MAX_OUTBOUND_PAYLOAD_BYTES`].
const NOMINAL_OUTBOUND_CAPACITY: usize = 512;

/// Encodes [`ControlPayload`]s into a single reusable buffer.
///
/// Cleared after every send. A payload that would exceed
/// [`MAX_OUTBOUND_PAYLOAD_BYTES`] fails with [`Error::PayloadTooLarge`] and
/// the buffer is reset to [`NOMINAL_OUTBOUND_CAPACITY`] — a grown buffer is
/// discarded rather than kept around, to bound steady-state memory.
pub struct OutboundFramer {
    buf: Vec<u8>,
}

impl OutboundFramer {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(NOMINAL_OUTBOUND_CAPACITY) }
    }

    pub fn encode(&mut self, payload: &ControlPayload) -> Result<Message> {
        self.buf.clear();
        serde_json::to_writer(&mut self.buf, payload)?;

        if self.buf.len() > MAX_OUTBOUND_PAYLOAD_BYTES {
            self.buf.clear();
            self.buf.shrink_to(NOMINAL_OUTBOUND_CAPACITY);
            return Err(Error::PayloadTooLarge);
        }

        let text = String::from_utf8(self.buf.clone())
            .expect("serde_json always emits valid UTF-8");
        Ok(Message::Text(text))
    }
}

impl Default for OutboundFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of feeding one inbound WebSocket frame to [`InboundFramer`].
pub enum Inbound {
    /// A complete payload was decoded; the buffer has been cleared.
    Payload(ControlPayload),
    /// Not enough bytes yet to form a complete JSON document.
    Incomplete,
    /// The peer closed the connection.
    Closed(Option<CloseFrame<'static>>),
}

/// Accumulates inbound bytes across socket frames into a segmented buffer
/// until a full JSON document can be decoded, then dispatches it by opcode.
#[derive(Default)]
pub struct InboundFramer {
    buf: Vec<u8>,
}

impl InboundFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) -> Result<Inbound> {
        match message {
            Message::Text(text) => self.buf.extend_from_slice(text.as_bytes()),
            Message::Binary(bytes) => self.buf.extend_from_slice(&bytes),
            Message::Close(frame) => return Ok(Inbound::Closed(frame)),
            // Ping/Pong are handled internally by tungstenite before we see them.
            _ => return Ok(Inbound::Incomplete),
        }

        match serde_json::from_slice::<ControlPayload>(&self.buf) {
            Ok(payload) => {
                self.buf.clear();
                Ok(Inbound::Payload(payload))
            },
            Err(e) if e.is_eof() => Ok(Inbound::Incomplete),
            Err(e) => {
                self.buf.clear();
                Err(e.into())
            },
        }
    }
}

/// Opens a control WebSocket connection to `url`.
pub async fn connect(url: url::Url) -> Result<WsStream> {
    let (stream, _response) = async_tungstenite::tokio::connect_async_with_config::<url::Url>(
        url,
        Some(async_tungstenite::tungstenite::protocol::WebSocketConfig {
            max_message_size: None,
            max_frame_size: None,
            ..Default::default()
        }),
    )
    .await?;

    Ok(stream)
}

/// Sends a close frame over a split sink half.
///
/// `reconnect_intended = true` uses [`CloseCode::Restart`], a status that
/// signals a transient restart so the peer preserves session state;
/// `false` uses a normal closure.
pub async fn send_close_on_sink<S>(sink: &mut S, reconnect_intended: bool) -> Result<()>
where
    S: futures::Sink<Message, Error = async_tungstenite::tungstenite::Error> + Unpin,
{
    let code = if reconnect_intended { CloseCode::Restart } else { CloseCode::Normal };

    sink.send(Message::Close(Some(CloseFrame { code, reason: "".into() })))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicecore_model::payload::Heartbeat;

    #[test]
    fn encode_then_decode_round_trips() {
        let mut out = OutboundFramer::new();
        let mut inb = InboundFramer::new();

        let payload = ControlPayload::Heartbeat(Heartbeat { nonce: 42 });
        let message = out.encode(&payload).unwrap();

        match inb.push(message).unwrap() {
            Inbound::Payload(ControlPayload::Heartbeat(h)) => assert_eq!(h.nonce, 42),
            _ => panic!("expected a decoded Heartbeat"),
        }
    }

    #[test]
    fn oversized_payload_is_rejected_and_buffer_resets() {
        let mut out = OutboundFramer::new();

        // `token` padded out well past the 4096-byte limit.
        let huge_token = "a".repeat(8192);
        let payload = ControlPayload::Resume(voicecore_model::payload::Resume {
            server_id: voicecore_model::id::ServerId(1),
            session_id: "s".into(),
            token: huge_token,
        });

        let result = out.encode(&payload);
        assert!(matches!(result, Err(Error::PayloadTooLarge)));
        assert!(out.buf.is_empty());
        assert!(out.buf.capacity() >= NOMINAL_OUTBOUND_CAPACITY);
    }

    #[test]
    fn split_json_across_two_frames_still_decodes() {
        let mut inb = InboundFramer::new();
        let whole = serde_json::to_vec(&ControlPayload::Heartbeat(Heartbeat { nonce: 7 })).unwrap();
        let (first, second) = whole.split_at(whole.len() / 2);

        let step1 = inb.push(Message::Text(String::from_utf8(first.to_vec()).unwrap())).unwrap();
        assert!(matches!(step1, Inbound::Incomplete));

        let step2 = inb.push(Message::Text(String::from_utf8(second.to_vec()).unwrap())).unwrap();
        assert!(matches!(step2, Inbound::Payload(ControlPayload::Heartbeat(_))));
    }
}
