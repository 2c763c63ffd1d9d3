//! The narrow seam between the voice core and a host bot framework's
//! main-gateway/REST client.
//!
//! Neither trait here is implemented by this crate: host integrations (e.g.
//! a serenity or twilight adapter) supply their own implementations and
//! pass them to [`crate::session::VoiceSession`]. This generalizes the
//! teacher's two concrete, feature-gated gateway integrations into a single
//! seam, since adapter code for any specific host framework is out of scope.

use crate::id::{ChannelId, ServerId, UserId};
use async_trait::async_trait;

/// A user's voice-channel membership, as announced by the main gateway.
///
/// The core only acts on snapshots whose `user_id` matches the bot's own
/// identity (see [`RestUserClient`]); foreign users are discarded by C1.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoiceStateSnapshot {
    pub server_id: ServerId,
    pub user_id: UserId,
    pub session_id: String,
}

/// The voice server assigned to a server, as announced by the main gateway.
///
/// `endpoint: None` is a fatal condition for the connection attempt in
/// progress; the core does not retry it itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoiceServerSnapshot {
    pub server_id: ServerId,
    pub endpoint: Option<String>,
    pub token: String,
}

/// Outbound command asking the main gateway to join, move, or leave a voice
/// channel.
///
/// Issued with `channel_id: Some(_)` at session start and with
/// `channel_id: None` at session stop.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateVoiceState {
    pub server_id: ServerId,
    pub channel_id: Option<ChannelId>,
    pub self_mute: bool,
    pub self_deaf: bool,
}

/// A message bus to the bot's main (non-voice) gateway connection.
///
/// Implementations forward [`UpdateVoiceState`] to the host framework's
/// gateway socket; the host framework is responsible for routing
/// `VOICE_STATE_UPDATE`/`VOICE_SERVER_UPDATE` events back into
/// [`crate::rendezvous::Rendezvous::submit_state`]/`submit_server`.
#[async_trait]
pub trait MainGatewayClient: Send + Sync {
    /// Submit-only; this is a fire-and-forget bus, not a request/response
    /// call.
    async fn update_voice_state(&self, command: UpdateVoiceState);
}

/// Exposes the bot's own identity, used by C1 to filter voice-state events
/// that are not the bot's own.
#[async_trait]
pub trait RestUserClient: Send + Sync {
    /// Returns the bot's own user id. Implementations are expected to cache
    /// this after the first successful call.
    async fn get_current_user(&self) -> UserId;
}
