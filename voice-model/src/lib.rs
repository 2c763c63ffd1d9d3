//! Wire types for the voice control-plane protocol.
//!
//! This crate only describes *shape*: how JSON opcodes map onto typed
//! payloads. It has no knowledge of sockets, heartbeats, or the session
//! life cycle — those live in `voicecore`.

pub mod constants;
pub mod event;
pub mod id;
pub mod opcode;
pub mod payload;
pub mod protocol_data;
pub mod speaking_state;
mod util;

pub use event::ControlPayload;
pub use opcode::OpCode;
pub use protocol_data::ProtocolData;
pub use speaking_state::SpeakingState;
