mod client_disconnect;
mod codec_description;
mod heartbeat;
mod heartbeat_ack;
mod hello;
mod identify;
mod ready;
mod resume;
mod select_protocol;
mod session_description;
mod speaking;

pub use client_disconnect::ClientDisconnect;
pub use codec_description::CodecDescription;
pub use heartbeat::Heartbeat;
pub use heartbeat_ack::HeartbeatAck;
pub use hello::Hello;
pub use identify::Identify;
pub use ready::Ready;
pub use resume::Resume;
pub use select_protocol::SelectProtocol;
pub use session_description::SessionDescription;
pub use speaking::Speaking;
