use serde::{Deserialize, Serialize};

/// Server's announcement of the codec in use for this session.
///
/// The voice session does not currently act on this beyond logging it —
/// the core only ever negotiates Opus — but it must round-trip through the
/// tagged union without being misparsed as an error.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct CodecDescription {
    pub audio_codec: String,
    #[serde(default)]
    pub video_codec: Option<String>,
    pub media_session_id: Option<String>,
}
