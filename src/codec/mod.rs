//! C4: Opus Encoder Wrapper.
//!
//! Configures the codec for the fixed voice parameters this crate always
//! uses (48 kHz, stereo), encodes PCM16 into Opus frames, and exposes the
//! frame-size arithmetic the session's pacing loop needs.

use crate::{
    config::AudioOptimization,
    constants::{CHANNELS, DEFAULT_BITRATE, EXPECTED_PACKET_LOSS_PERCENT, SAMPLE_RATE, SAMPLE_RATE_RAW},
    error::CodecError,
};
use audiopus::{coder::Encoder as OpusEncoder, Application, Bitrate, Channels, Signal};

pub type Result<T> = std::result::Result<T, CodecError>;

fn application_for(mode: AudioOptimization) -> Application {
    match mode {
        AudioOptimization::Voip => Application::Voip,
        AudioOptimization::Audio => Application::Audio,
        AudioOptimization::LowDelay => Application::LowDelay,
    }
}

fn signal_for(mode: AudioOptimization) -> Signal {
    match mode {
        AudioOptimization::Voip => Signal::Voice,
        AudioOptimization::Audio => Signal::Music,
        AudioOptimization::LowDelay => Signal::Auto,
    }
}

/// Number of PCM16 bytes carried by a frame of `duration_ms` at the fixed
/// sample rate and channel count.
pub fn sample_size_bytes(duration_ms: u32) -> usize {
    duration_ms as usize * CHANNELS * (SAMPLE_RATE_RAW / 1000) * 2
}

/// Number of samples per channel represented by `sample_size_bytes` bytes
/// of PCM16.
pub fn frame_size_samples(sample_size_bytes: usize) -> usize {
    sample_size_bytes / CHANNELS / 2
}

/// Owns one libopus encoder instance, configured for this crate's fixed
/// voice parameters.
pub struct OpusEncoderWrapper {
    inner: OpusEncoder,
    mode: AudioOptimization,
}

impl OpusEncoderWrapper {
    /// Creates an encoder tuned for `mode`: 48 kHz stereo, 15% expected
    /// packet loss, in-band FEC enabled, the platform's default bitrate
    /// ceiling.
    pub fn create(mode: AudioOptimization) -> Result<Self> {
        let mut inner = OpusEncoder::new(SAMPLE_RATE, Channels::Stereo, application_for(mode))?;
        inner.set_bitrate(DEFAULT_BITRATE)?;
        inner.set_packet_loss_perc(EXPECTED_PACKET_LOSS_PERCENT)?;
        inner.set_inband_fec(true)?;
        inner.set_signal(signal_for(mode))?;

        Ok(Self { inner, mode })
    }

    pub fn mode(&self) -> AudioOptimization {
        self.mode
    }

    /// Encodes one frame of PCM16 `pcm16` into `out`, returning the number
    /// of bytes written.
    pub fn encode(&mut self, pcm16: &[i16], out: &mut [u8]) -> Result<usize> {
        Ok(self.inner.encode(pcm16, out)?)
    }

    pub fn set_bitrate(&mut self, bps: i32) -> Result<()> {
        self.inner.set_bitrate(Bitrate::BitsPerSecond(bps))?;
        Ok(())
    }

    /// Resets the encoder's internal state, discarding any look-ahead
    /// buffered from prior frames.
    pub fn reset(&mut self) -> Result<()> {
        self.inner.reset_state()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_size_bytes_matches_40ms_stereo_frame() {
        // 48kHz * 40ms = 1920 samples/channel, * 2 channels * 2 bytes/sample.
        assert_eq!(sample_size_bytes(40), 1920 * 2 * 2);
    }

    #[test]
    fn frame_size_samples_inverts_sample_size_bytes() {
        let bytes = sample_size_bytes(20);
        assert_eq!(frame_size_samples(bytes), 960);
    }

    #[test]
    fn create_and_encode_a_silent_frame() {
        let mut encoder = OpusEncoderWrapper::create(AudioOptimization::Audio).unwrap();
        let pcm = vec![0i16; frame_size_samples(sample_size_bytes(20)) * CHANNELS];
        let mut out = vec![0u8; 4000];
        let written = encoder.encode(&pcm, &mut out).unwrap();
        assert!(written > 0);
    }

    #[test]
    fn reset_succeeds_after_encoding() {
        let mut encoder = OpusEncoderWrapper::create(AudioOptimization::Voip).unwrap();
        let pcm = vec![0i16; frame_size_samples(sample_size_bytes(20)) * CHANNELS];
        let mut out = vec![0u8; 4000];
        encoder.encode(&pcm, &mut out).unwrap();
        encoder.reset().unwrap();
    }
}
