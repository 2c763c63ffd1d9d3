//! Error taxonomy for the voice client core.
//!
//! Every fallible operation in this crate returns one of the per-component
//! error enums below; [`VoiceError`] composes them for callers that only
//! care about the outcome of `start`/`stop`/`transmit_audio`. Classification
//! into "resume"/"reconnect"/"fatal" lives in [`crate::session::reconnect`],
//! not here.

use crate::{control, media};
use std::{error::Error as StdError, fmt};

/// Errors local to this process: bad call sequencing or argument ranges.
#[derive(Debug)]
pub enum LocalError {
    /// An operation was attempted from a [`crate::session::ConnectionStatus`]
    /// that does not permit it (e.g. `start` while not `Offline`).
    InvalidState,
    /// An outbound control payload exceeded
    /// [`crate::constants::MAX_OUTBOUND_PAYLOAD_BYTES`].
    PayloadTooLarge,
    /// A component was used before the call that initializes it.
    NotInitialized,
    /// `wait_for` was called for a server id that already has a pending
    /// rendezvous.
    AlreadyPending,
    /// A configuration value fell outside its accepted range.
    ArgumentOutOfRange,
    /// A second caller attempted `transmit_audio` while one was already in
    /// flight.
    AlreadyTransmitting,
}

impl fmt::Display for LocalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalError::InvalidState => write!(f, "operation not valid in current state"),
            LocalError::PayloadTooLarge => write!(f, "outbound payload exceeded size limit"),
            LocalError::NotInitialized => write!(f, "component used before initialization"),
            LocalError::AlreadyPending => write!(f, "rendezvous already pending for this id"),
            LocalError::ArgumentOutOfRange => write!(f, "argument out of accepted range"),
            LocalError::AlreadyTransmitting => write!(f, "a transmission is already in progress"),
        }
    }
}

impl StdError for LocalError {}

/// Errors surfaced by the remote voice-gateway control plane.
#[derive(Debug)]
pub enum RemoteControlError {
    /// The gateway closed the socket with the given close code.
    VoiceGatewayClose(u16),
    /// A payload violated the expected protocol shape (e.g. `Ready` before
    /// `Hello`).
    VoiceGatewayProtocolViolation,
}

impl fmt::Display for RemoteControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteControlError::VoiceGatewayClose(code) =>
                write!(f, "voice gateway closed with code {}", code),
            RemoteControlError::VoiceGatewayProtocolViolation =>
                write!(f, "voice gateway protocol violation"),
        }
    }
}

impl StdError for RemoteControlError {}

/// Errors from the transport layer underlying the control WebSocket.
#[derive(Debug)]
pub enum TransportError {
    /// The WebSocket closed with the given close code.
    WebSocketClose(Option<u16>),
    /// A timeout elapsed waiting on a bounded operation.
    Timeout,
    /// A miscellaneous I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::WebSocketClose(code) =>
                write!(f, "websocket closed ({:?})", code),
            TransportError::Timeout => write!(f, "operation timed out"),
            TransportError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}

/// Errors from the UDP media path.
#[derive(Debug)]
pub enum MediaError {
    /// The OS rejected or failed an outbound UDP send.
    UdpSendFailed(i32),
    /// The IP discovery exchange did not complete (timeout, short read, or a
    /// mismatched packet type).
    IpDiscoveryFailed,
    /// None of the peer-offered encryption mode names were recognised.
    NoSupportedEncryptionMode,
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::UdpSendFailed(code) => write!(f, "UDP send failed (os code {})", code),
            MediaError::IpDiscoveryFailed => write!(f, "IP discovery did not complete"),
            MediaError::NoSupportedEncryptionMode =>
                write!(f, "no offered encryption mode is supported"),
        }
    }
}

impl StdError for MediaError {}

/// Errors from the Opus encoder wrapper.
#[derive(Debug)]
pub enum CodecError {
    /// Opus returned the given platform error code.
    OpusError(audiopus::ErrorCode),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::OpusError(code) => write!(f, "opus error: {:?}", code),
        }
    }
}

impl StdError for CodecError {}

impl From<audiopus::Error> for CodecError {
    fn from(e: audiopus::Error) -> Self {
        match e {
            audiopus::Error::Opus(code) => CodecError::OpusError(code),
            other => {
                // audiopus only returns `Opus` for libopus-side failures; any
                // other variant (argument/conversion errors on our side) is
                // not a platform error code, but callers only need to know
                // encoding failed.
                let _ = other;
                CodecError::OpusError(audiopus::ErrorCode::BadArg)
            },
        }
    }
}

/// Errors from the AEAD layer protecting RTP payloads.
#[derive(Debug)]
pub struct CryptoError;

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AEAD operation failed")
    }
}

impl StdError for CryptoError {}

impl From<xsalsa20poly1305::aead::Error> for CryptoError {
    fn from(_: xsalsa20poly1305::aead::Error) -> Self {
        CryptoError
    }
}

/// Top-level error returned to callers of [`crate::session::VoiceSession`].
#[derive(Debug)]
pub enum VoiceError {
    Local(LocalError),
    RemoteControl(RemoteControlError),
    Transport(TransportError),
    Media(MediaError),
    Codec(CodecError),
    Crypto(CryptoError),
    /// The session's cancellation token fired mid-operation.
    Cancelled,
}

impl fmt::Display for VoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceError::Local(e) => write!(f, "{}", e),
            VoiceError::RemoteControl(e) => write!(f, "{}", e),
            VoiceError::Transport(e) => write!(f, "{}", e),
            VoiceError::Media(e) => write!(f, "{}", e),
            VoiceError::Codec(e) => write!(f, "{}", e),
            VoiceError::Crypto(e) => write!(f, "{}", e),
            VoiceError::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl StdError for VoiceError {}

impl From<LocalError> for VoiceError {
    fn from(e: LocalError) -> Self {
        VoiceError::Local(e)
    }
}

impl From<RemoteControlError> for VoiceError {
    fn from(e: RemoteControlError) -> Self {
        VoiceError::RemoteControl(e)
    }
}

impl From<TransportError> for VoiceError {
    fn from(e: TransportError) -> Self {
        VoiceError::Transport(e)
    }
}

impl From<MediaError> for VoiceError {
    fn from(e: MediaError) -> Self {
        VoiceError::Media(e)
    }
}

impl From<CodecError> for VoiceError {
    fn from(e: CodecError) -> Self {
        VoiceError::Codec(e)
    }
}

impl From<CryptoError> for VoiceError {
    fn from(e: CryptoError) -> Self {
        VoiceError::Crypto(e)
    }
}

impl From<control::ws::Error> for VoiceError {
    fn from(e: control::ws::Error) -> Self {
        match e {
            control::ws::Error::Json(_) =>
                VoiceError::RemoteControl(RemoteControlError::VoiceGatewayProtocolViolation),
            control::ws::Error::Ws(_) => VoiceError::Transport(TransportError::WebSocketClose(None)),
            control::ws::Error::WsClosed(Some(frame)) =>
                VoiceError::RemoteControl(RemoteControlError::VoiceGatewayClose(u16::from(frame.code))),
            control::ws::Error::WsClosed(None) =>
                VoiceError::Transport(TransportError::WebSocketClose(None)),
            control::ws::Error::PayloadTooLarge => VoiceError::Local(LocalError::PayloadTooLarge),
            control::ws::Error::Timeout => VoiceError::Transport(TransportError::Timeout),
        }
    }
}

impl From<media::error::Error> for VoiceError {
    fn from(e: media::error::Error) -> Self {
        use media::error::Error::*;
        match e {
            Crypto(c) => VoiceError::Crypto(c.into()),
            Io(i) => VoiceError::Transport(i.into()),
            IpDiscoveryFailed => VoiceError::Media(MediaError::IpDiscoveryFailed),
            NoSupportedEncryptionMode => VoiceError::Media(MediaError::NoSupportedEncryptionMode),
            NotInitialized => VoiceError::Local(LocalError::NotInitialized),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VoiceError>;
