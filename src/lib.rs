//! An async voice client core: joins a voice channel, negotiates the voice
//! gateway handshake, and streams Opus-encoded audio over an encrypted RTP
//! transport.
//!
//! The five components compose as: a caller drives [`session::VoiceSession`],
//! which uses [`rendezvous::Rendezvous`] (C1) to correlate main-gateway
//! events, [`control`] (C2) for the voice-gateway WebSocket, [`media`] (C3)
//! for the UDP RTP transport, and [`codec`] (C4) to encode PCM16 into Opus.

pub mod codec;
pub mod config;
pub mod constants;
pub mod control;
pub mod error;
pub mod gateway;
pub mod id;
pub mod media;
pub mod rendezvous;
pub mod session;

pub use audiopus as opus;
pub use discortp as packet;
pub use voicecore_model as model;

pub use crate::{
    config::SessionConfig,
    error::{Result, VoiceError},
    session::{ConnectionStatus, VoiceSession},
};
