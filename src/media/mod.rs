//! C3: Media Transport.
//!
//! Owns the UDP socket used for the voice data path: IP discovery,
//! per-packet AEAD encryption, and RTP framing and send.

pub mod crypto;
pub mod discovery;
pub mod error;

use crate::constants::{IP_DISCOVERY_TIMEOUT, RTP_PROFILE_TYPE, RTP_VERSION, VOICE_PACKET_MAX};
pub use crypto::EncryptionMode;
pub use error::{Error, Result};
use discortp::{
    rtp::{MutableRtpPacket, RtpPacket},
    MutablePacket, Packet,
};
use rand::random;
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::instrument;
use xsalsa20poly1305::{KeyInit, XSalsa20Poly1305 as Cipher};

/// The externally visible address and port an IP discovery exchange found
/// for this socket, to be reported back to the peer via `SelectProtocol`.
pub struct DiscoveredAddress {
    pub address: IpAddr,
    pub port: u16,
}

struct Initialized {
    cipher: Cipher,
    mode: EncryptionMode,
}

/// Owns one voice UDP socket across its connect → initialize → send →
/// disconnect lifecycle.
pub struct MediaTransport {
    socket: Option<UdpSocket>,
    ssrc: u32,
    sequence: u16,
    timestamp: u32,
    packet: Box<[u8; VOICE_PACKET_MAX]>,
    initialized: Option<Initialized>,
}

impl MediaTransport {
    pub fn new() -> Self {
        Self {
            socket: None,
            ssrc: 0,
            sequence: random(),
            timestamp: random(),
            packet: Box::new([0u8; VOICE_PACKET_MAX]),
            initialized: None,
        }
    }

    /// Picks the first peer-offered encryption mode name this
    /// implementation recognises.
    pub fn select_encryption_mode(offered: &[String]) -> Result<EncryptionMode> {
        EncryptionMode::select(offered)
    }

    /// Opens the UDP socket to `(ip, port)` and runs the IP discovery
    /// exchange for `ssrc`, latching it for subsequent sends.
    #[instrument(skip(self))]
    pub async fn connect(&mut self, ip: IpAddr, port: u16, ssrc: u32) -> Result<DiscoveredAddress> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(SocketAddr::new(ip, port)).await?;

        let request = discovery::build_request(ssrc);
        socket.send(&request).await?;

        let mut response = [0u8; crate::constants::IP_DISCOVERY_PACKET_SIZE];
        let len = tokio::time::timeout(IP_DISCOVERY_TIMEOUT, socket.recv(&mut response))
            .await
            .map_err(|_| Error::IpDiscoveryFailed)??;

        let discovered = discovery::parse_response(&response, len)?;

        self.ssrc = ssrc;
        self.socket = Some(socket);

        {
            let mut rtp = MutableRtpPacket::new(&mut self.packet[..])
                .expect("VOICE_PACKET_MAX holds at least an RTP header");
            rtp.set_version(RTP_VERSION);
            rtp.set_payload_type(RTP_PROFILE_TYPE);
            rtp.set_sequence(self.sequence.into());
            rtp.set_timestamp(self.timestamp.into());
            rtp.set_ssrc(self.ssrc);
        }

        Ok(DiscoveredAddress { address: discovered.address, port: discovered.port })
    }

    /// Derives the AEAD cipher from the session's secret key. Must be
    /// called before [`MediaTransport::send_frame`].
    pub fn initialize(&mut self, mode: EncryptionMode, secret_key: &[u8; 32]) -> Result<()> {
        let cipher = Cipher::new_from_slice(secret_key).expect("secret key is exactly 32 bytes");
        self.initialized = Some(Initialized { cipher, mode });
        Ok(())
    }

    /// Builds and emits one RTP packet carrying `opus_frame`, advancing the
    /// sequence and timestamp counters by the number of samples represented
    /// by `pcm16_length` bytes of the PCM this frame was encoded from.
    #[instrument(skip(self, opus_frame))]
    pub async fn send_frame(&mut self, opus_frame: &[u8], pcm16_length: usize) -> Result<()> {
        let frame_size_samples =
            (pcm16_length / crate::constants::CHANNELS / std::mem::size_of::<i16>()) as u32;
        let socket = self.socket.as_ref().ok_or(Error::NotInitialized)?;
        let Initialized { cipher, mode } =
            self.initialized.as_ref().ok_or(Error::NotInitialized)?;

        let rtp_header: [u8; 12] = {
            let rtp = MutableRtpPacket::new(&mut self.packet[..])
                .expect("VOICE_PACKET_MAX holds at least an RTP header");
            rtp.packet()[..12].try_into().expect("slice is 12 bytes")
        };

        let header_len = RtpPacket::minimum_packet_size();
        let written = {
            let mut rtp = MutableRtpPacket::new(&mut self.packet[..])
                .expect("VOICE_PACKET_MAX holds at least an RTP header");
            let payload = rtp.payload_mut();
            payload[xsalsa20poly1305::TAG_SIZE..xsalsa20poly1305::TAG_SIZE + opus_frame.len()]
                .copy_from_slice(opus_frame);

            crypto::encrypt_in_place(
                *mode,
                cipher,
                &rtp_header,
                self.timestamp,
                payload,
                opus_frame.len(),
            )?
        };

        let total_len = header_len + written;
        socket.send(&self.packet[..total_len]).await?;

        self.sequence = self.sequence.wrapping_add(1);
        self.timestamp = self.timestamp.wrapping_add(frame_size_samples);

        let mut rtp = MutableRtpPacket::new(&mut self.packet[..])
            .expect("VOICE_PACKET_MAX holds at least an RTP header");
        rtp.set_sequence(self.sequence.into());
        rtp.set_timestamp(self.timestamp.into());

        Ok(())
    }

    /// Resets the transport to its pre-`connect` state. The socket itself
    /// is released on drop.
    pub fn disconnect(&mut self) {
        self.socket = None;
        self.initialized = None;
    }
}

impl Default for MediaTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_encryption_mode_delegates_to_crypto() {
        let offered = vec!["xsalsa20_poly1305".to_string()];
        assert_eq!(MediaTransport::select_encryption_mode(&offered).unwrap(), EncryptionMode::Normal);
    }

    #[tokio::test]
    async fn send_frame_before_initialize_fails() {
        let mut transport = MediaTransport::new();
        // No connect() call means no socket either, so this exercises the
        // same NotInitialized guard without needing a real UDP peer.
        let result = transport.send_frame(b"frame", 3840).await;
        assert!(matches!(result, Err(Error::NotInitialized)));
    }

    #[test]
    fn disconnect_clears_socket_and_cipher_state() {
        let mut transport = MediaTransport::new();
        transport.initialized =
            Some(Initialized { cipher: Cipher::new_from_slice(&[1u8; 32]).unwrap(), mode: EncryptionMode::Normal });
        transport.disconnect();
        assert!(transport.initialized.is_none());
        assert!(transport.socket.is_none());
    }

    #[tokio::test]
    async fn connect_times_out_without_a_discovery_response() {
        // A peer that never answers the discovery request; `connect` must
        // still resolve within its local timeout rather than hang.
        let silent_peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = silent_peer.local_addr().unwrap();

        let mut transport = MediaTransport::new();
        let result = transport.connect(addr.ip(), addr.port(), 7).await;

        assert!(matches!(result, Err(Error::IpDiscoveryFailed)));
    }

    #[tokio::test]
    async fn sequence_wraps_from_65535_to_0() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = peer.local_addr().unwrap();

        let client = UdpSocket::bind("0.0.0.0:0").await.unwrap();
        client.connect(addr).await.unwrap();

        let mut transport = MediaTransport::new();
        transport.socket = Some(client);
        transport.ssrc = 42;
        transport.sequence = 65535;
        transport.timestamp = 0;
        transport.initialized =
            Some(Initialized { cipher: Cipher::new_from_slice(&[3u8; 32]).unwrap(), mode: EncryptionMode::Normal });

        // 3840 PCM16 bytes at 2 channels == 960 samples/channel per frame.
        transport.send_frame(b"frame-one", 3840).await.unwrap();
        assert_eq!(transport.sequence, 0);
        assert_eq!(transport.timestamp, 960);

        transport.send_frame(b"frame-two", 3840).await.unwrap();
        assert_eq!(transport.sequence, 1);
        assert_eq!(transport.timestamp, 1920);
    }
}
