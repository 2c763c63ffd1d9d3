//! Constants tied to the wire format rather than to any particular session.

/// Gateway version of the voice API this crate encodes (`?v=4`).
pub const GATEWAY_VERSION: u8 = 4;

/// Close codes sent by the voice gateway when it terminates the WebSocket.
///
/// `BAD_PAYLOAD` and `RATE_LIMITED` are not attested by the upstream voice
/// model this crate was adapted from; they are assigned placeholder codes
/// in the same numbering scheme pending confirmation from a live gateway
/// trace (see DESIGN.md).
pub mod voice_close_codes {
    /// Invalid voice opcode.
    pub const UNKNOWN_OPCODE: u16 = 4001;

    /// A payload was sent that could not be decoded, or violated the
    /// expected shape for its opcode.
    pub const BAD_PAYLOAD: u16 = 4002;

    /// A payload was sent prior to identifying.
    pub const NOT_AUTHENTICATED: u16 = 4003;

    /// The token sent with the identify payload was incorrect.
    pub const AUTH_FAILED: u16 = 4004;

    /// More than one identify payload was sent.
    pub const ALREADY_AUTHENTICATED: u16 = 4005;

    /// The session is no longer valid.
    pub const SESSION_INVALID: u16 = 4006;

    /// A session timed out.
    pub const SESSION_TIMEOUT: u16 = 4009;

    /// The server for the last connection attempt could not be found.
    pub const SERVER_NOT_FOUND: u16 = 4011;

    /// The voice protocol chosen was not recognised.
    pub const UNKNOWN_PROTOCOL: u16 = 4012;

    /// Disconnected, either due to channel closure/removal or a kick.
    ///
    /// Should not reconnect.
    pub const DISCONNECTED: u16 = 4014;

    /// The connected voice server crashed.
    ///
    /// Should reconnect.
    pub const VOICE_SERVER_CRASH: u16 = 4015;

    /// The encryption scheme requested was not recognised.
    pub const UNKNOWN_ENCRYPTION_MODE: u16 = 4016;

    /// Too many payloads were sent in too short a window.
    pub const RATE_LIMITED: u16 = 4018;
}
