//! Classifies a send/receive failure into what the lifecycle runner should
//! do next.

use crate::error::{RemoteControlError, TransportError, VoiceError};
use voicecore_model::constants::voice_close_codes as codes;

/// What the lifecycle runner should do after a send/receive failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReconnectAction {
    /// The closure was expected; stop without error.
    ExitOk,
    /// Re-identify over a fresh control socket using the existing session,
    /// without re-running the handshake rendezvous.
    Resume,
    /// Discard the current session entirely and start over from C1.
    Reconnect,
    /// Unrecoverable; the session returns to `Offline` and surfaces the
    /// error to the caller.
    Fatal,
}

const NORMAL_CLOSURE: u16 = 1000;

/// Classifies a known voice-gateway close code.
pub fn classify_close_code(code: u16) -> ReconnectAction {
    match code {
        NORMAL_CLOSURE => ReconnectAction::ExitOk,
        codes::ALREADY_AUTHENTICATED
        | codes::BAD_PAYLOAD
        | codes::RATE_LIMITED
        | codes::UNKNOWN_ENCRYPTION_MODE
        | codes::UNKNOWN_PROTOCOL
        | codes::UNKNOWN_OPCODE => ReconnectAction::Resume,
        codes::NOT_AUTHENTICATED
        | codes::SESSION_INVALID
        | codes::SESSION_TIMEOUT
        | codes::SERVER_NOT_FOUND
        | codes::VOICE_SERVER_CRASH => ReconnectAction::Reconnect,
        codes::AUTH_FAILED | codes::DISCONNECTED => ReconnectAction::Fatal,
        _ => ReconnectAction::Resume,
    }
}

/// Classifies any error surfaced by the send or receive task.
pub fn classify(err: &VoiceError) -> ReconnectAction {
    match err {
        VoiceError::RemoteControl(RemoteControlError::VoiceGatewayClose(code)) =>
            classify_close_code(*code),
        VoiceError::Transport(TransportError::WebSocketClose(Some(code))) =>
            classify_close_code(*code),
        VoiceError::Transport(TransportError::WebSocketClose(None)) => ReconnectAction::Resume,
        VoiceError::Cancelled => ReconnectAction::ExitOk,
        // Local call-sequencing errors and anything else not explicitly
        // classified above default to Resume, per the reconnect policy's
        // catch-all.
        _ => ReconnectAction::Resume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_closure_exits_cleanly() {
        assert_eq!(classify_close_code(1000), ReconnectAction::ExitOk);
    }

    #[test]
    fn bad_payload_resumes() {
        assert_eq!(classify_close_code(codes::BAD_PAYLOAD), ReconnectAction::Resume);
    }

    #[test]
    fn session_invalid_reconnects() {
        assert_eq!(classify_close_code(codes::SESSION_INVALID), ReconnectAction::Reconnect);
    }

    #[test]
    fn auth_failed_is_fatal() {
        assert_eq!(classify_close_code(codes::AUTH_FAILED), ReconnectAction::Fatal);
    }

    #[test]
    fn unrecognised_code_defaults_to_resume() {
        assert_eq!(classify_close_code(9999), ReconnectAction::Resume);
    }

    #[test]
    fn cancellation_exits_cleanly() {
        assert_eq!(classify(&VoiceError::Cancelled), ReconnectAction::ExitOk);
    }

    #[test]
    fn voice_gateway_close_is_classified_by_code() {
        let err = VoiceError::RemoteControl(RemoteControlError::VoiceGatewayClose(codes::SESSION_INVALID));
        assert_eq!(classify(&err), ReconnectAction::Reconnect);
    }
}
