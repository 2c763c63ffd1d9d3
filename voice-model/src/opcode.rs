use serde_repr::{Deserialize_repr, Serialize_repr};

/// Enum mapping the integer opcodes used on the voice control-plane wire.
#[derive(
    Clone, Copy, Debug, Deserialize_repr, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize_repr,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum OpCode {
    /// Used to begin a voice websocket connection.
    Identify = 0,
    /// Used to select the voice protocol and encryption mode.
    SelectProtocol = 1,
    /// Used to complete the websocket handshake.
    Ready = 2,
    /// Used to keep the websocket connection alive.
    Heartbeat = 3,
    /// Describes the negotiated session (the secret key).
    SessionDescription = 4,
    /// Used to indicate which users are speaking.
    Speaking = 5,
    /// Heartbeat ACK, received to show the server's receipt of a heartbeat.
    HeartbeatAck = 6,
    /// Sent after a disconnect to attempt to resume a session.
    Resume = 7,
    /// Used to determine how often the client must send a heartbeat.
    Hello = 8,
    /// Sent by the server if a session was successfully resumed.
    Resumed = 9,
    /// Status update indicating that another user has disconnected.
    ClientDisconnect = 13,
    /// Server's announcement of the codec in use for this session.
    CodecDescription = 14,
}
