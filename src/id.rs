//! Session-layer identifiers.
//!
//! [`ServerId`] and [`UserId`] are the same correlation keys used on the
//! wire (see `voicecore_model::id`); [`ChannelId`] only ever appears in
//! outbound gateway commands, so it has no wire-model counterpart.
use std::fmt::{Display, Formatter, Result as FmtResult};

pub use voicecore_model::id::{ServerId, UserId};

/// Opaque identifier of a voice channel within a server.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ChannelId(pub u64);

impl Display for ChannelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl From<u64> for ChannelId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
