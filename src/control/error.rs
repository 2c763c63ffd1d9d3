//! Errors from the control transport (C2).

use async_tungstenite::tungstenite::{
    error::Error as TungsteniteError,
    protocol::CloseFrame,
};
use serde_json::Error as JsonError;
use std::{error::Error as StdError, fmt};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The accumulated inbound buffer did not decode as a valid
    /// [`voicecore_model::ControlPayload`].
    Json(JsonError),
    /// The underlying WebSocket transport failed.
    Ws(TungsteniteError),
    /// The peer closed the connection with an explicit close frame.
    WsClosed(Option<CloseFrame<'static>>),
    /// An outbound payload exceeded
    /// [`crate::constants::MAX_OUTBOUND_PAYLOAD_BYTES`]. The send buffer has
    /// already been reset to its nominal capacity.
    PayloadTooLarge,
    /// A bounded wait (e.g. for the send mutex) elapsed.
    Timeout,
}

impl From<JsonError> for Error {
    fn from(e: JsonError) -> Self {
        Error::Json(e)
    }
}

impl From<TungsteniteError> for Error {
    fn from(e: TungsteniteError) -> Self {
        Error::Ws(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Json(e) => write!(f, "control payload JSON error: {}", e),
            Error::Ws(e) => write!(f, "control websocket error: {}", e),
            Error::WsClosed(frame) => write!(f, "control websocket closed: {:?}", frame),
            Error::PayloadTooLarge => write!(f, "outbound control payload too large"),
            Error::Timeout => write!(f, "control transport operation timed out"),
        }
    }
}

impl StdError for Error {}
