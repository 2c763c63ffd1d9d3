//! Session configuration.

use std::time::Duration;

/// Signal-type hint passed to the Opus encoder at creation time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum AudioOptimization {
    /// Tuned for speech.
    Voip,
    /// Tuned for music/general audio.
    Audio,
    /// Tuned for the lowest achievable algorithmic delay.
    LowDelay,
}

impl Default for AudioOptimization {
    fn default() -> Self {
        AudioOptimization::Audio
    }
}

/// Tunable parameters for a [`crate::session::VoiceSession`].
///
/// Mirrors the shape of the teacher's `driver::Config`/`DecodeMode` pair:
/// a small, cheaply-`Clone`able bag of knobs threaded through the session
/// and its background tasks.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Subtracted from the announced heartbeat interval so heartbeats are
    /// sent slightly early. Clamped to `[0, interval / 2]` when applied.
    pub heartbeat_safety_margin: Duration,
    /// Signal-type hint for the Opus encoder.
    pub audio_optimization: AudioOptimization,
    /// Length of one PCM sample read/encode/send cycle, in milliseconds.
    /// Must be a valid Opus frame duration (2.5, 5, 10, 20, 40, 60 ms).
    pub sample_duration_ms: u32,
}

impl SessionConfig {
    /// Clamps `heartbeat_safety_margin` to `[0, interval / 2]` for the given
    /// announced heartbeat interval.
    pub fn effective_heartbeat_margin(&self, interval: Duration) -> Duration {
        self.heartbeat_safety_margin.min(interval / 2)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_safety_margin: Duration::from_millis(
                crate::constants::DEFAULT_SAMPLE_DURATION_MS as u64,
            ),
            audio_optimization: AudioOptimization::default(),
            sample_duration_ms: crate::constants::DEFAULT_SAMPLE_DURATION_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_clamps_to_half_interval() {
        let cfg = SessionConfig {
            heartbeat_safety_margin: Duration::from_secs(10),
            ..Default::default()
        };

        assert_eq!(
            cfg.effective_heartbeat_margin(Duration::from_secs(2)),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn margin_passes_through_when_small() {
        let cfg = SessionConfig {
            heartbeat_safety_margin: Duration::from_millis(100),
            ..Default::default()
        };

        assert_eq!(
            cfg.effective_heartbeat_margin(Duration::from_secs(2)),
            Duration::from_millis(100)
        );
    }
}
