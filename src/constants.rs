//! Constants affecting session behaviour and protocol framing.

use audiopus::{Bitrate, SampleRate};
use discortp::rtp::RtpType;
use std::time::Duration;

/// The voice gateway version used by this client.
pub const VOICE_GATEWAY_VERSION: u8 = voicecore_model::constants::GATEWAY_VERSION;

/// Sample rate of audio sent to the voice server.
pub const SAMPLE_RATE: SampleRate = SampleRate::Hz48000;

/// Sample rate of audio sent to the voice server, as a raw integer.
pub const SAMPLE_RATE_RAW: usize = 48_000;

/// Number of audio channels carried in every PCM16/Opus frame.
pub const CHANNELS: usize = 2;

/// Default duration of a single audio frame, in milliseconds.
pub const DEFAULT_SAMPLE_DURATION_MS: u32 = 40;

/// Default bitrate used for Opus encoding: the platform ceiling.
pub const DEFAULT_BITRATE: Bitrate = Bitrate::BitsPerSecond(128_000);

/// Opus in-band FEC expects this fraction of packets to be lost.
pub const EXPECTED_PACKET_LOSS_PERCENT: u8 = 15;

/// Maximum safe UDP payload size before fragmentation risk.
pub const VOICE_PACKET_MAX: usize = 1460;

/// Size, in bytes, of the IP discovery request/response packet.
pub const IP_DISCOVERY_PACKET_SIZE: usize = 74;

/// Wall-clock budget for the handshake rendezvous (C1).
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Wall-clock budget for the IP discovery round trip (C3).
pub const IP_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(1);

/// Wall-clock budget for acquiring the control send mutex.
pub const CONTROL_SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Wall-clock budget for awaiting `SessionDescription` after `SelectProtocol`.
pub const SESSION_DESCRIPTION_TIMEOUT: Duration = Duration::from_secs(2);

/// Largest outbound control payload this crate will frame.
///
/// The send buffer is reset to its nominal capacity after any rejection so a
/// single oversized payload cannot bloat steady-state memory.
pub const MAX_OUTBOUND_PAYLOAD_BYTES: usize = 4096;

/// Polling interval used by the sender task between queued-payload checks.
pub const SEND_TASK_IDLE_POLL: Duration = Duration::from_millis(100);

/// Fraction of the send-path latency pacing compensates for, as a multiplier
/// on `sample_duration_ms`. See `session` module docs.
pub const PACING_COMPENSATION_FACTOR: f64 = 0.75;

/// The one (and only) RTP version used on the voice media path.
pub const RTP_VERSION: u8 = 2;

/// Payload type used for Opus audio traffic, per the wire layout in `media`.
pub const RTP_PROFILE_TYPE: RtpType = RtpType::Dynamic(120);
