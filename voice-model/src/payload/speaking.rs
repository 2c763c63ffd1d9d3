use crate::{id::UserId, speaking_state::SpeakingState};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Speaking {
    /// Voice-packet delay in milliseconds; `0` unless throttled upstream.
    pub delay: Option<u32>,
    pub speaking: SpeakingState,
    pub ssrc: u32,
    /// Only set on inbound `Speaking` events from other session members.
    pub user_id: Option<UserId>,
}
