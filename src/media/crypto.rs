//! Encryption modes for the RTP media path.
//!
//! All three modes are fully implemented: the nonce differs by mode, but
//! the underlying AEAD (XSalsa20Poly1305) and packet layout — a 16-byte
//! Poly1305 tag immediately followed by ciphertext, with any mode-specific
//! nonce material appended after that — are shared.

use super::error::{Error, Result};
use rand::Rng;
use xsalsa20poly1305::{aead::AeadInPlace, Nonce, XSalsa20Poly1305 as Cipher, TAG_SIZE};

/// Variants of the XSalsa20Poly1305 encryption scheme offered by the voice
/// server's `Ready` payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum EncryptionMode {
    /// The nonce is the zero-padded 12-byte RTP header; no extra packet
    /// overhead.
    Normal,
    /// The nonce is a random 24-byte value, appended to the packet after
    /// the encrypted payload.
    Suffix,
    /// The nonce is the current RTP timestamp, zero-extended to 24 bytes
    /// and appended to the packet (as 4 bytes) after the encrypted payload.
    Lite,
}

impl EncryptionMode {
    /// The name this mode is negotiated under.
    pub fn to_request_str(self) -> &'static str {
        match self {
            EncryptionMode::Normal => "xsalsa20_poly1305",
            EncryptionMode::Suffix => "xsalsa20_poly1305_suffix",
            EncryptionMode::Lite => "xsalsa20_poly1305_lite",
        }
    }

    fn from_request_str(name: &str) -> Option<Self> {
        match name {
            "xsalsa20_poly1305" => Some(EncryptionMode::Normal),
            "xsalsa20_poly1305_suffix" => Some(EncryptionMode::Suffix),
            "xsalsa20_poly1305_lite" => Some(EncryptionMode::Lite),
            _ => None,
        }
    }

    /// Picks the first name in `offered` that this implementation
    /// recognises.
    pub fn select(offered: &[String]) -> Result<Self> {
        offered
            .iter()
            .find_map(|name| Self::from_request_str(name))
            .ok_or(Error::NoSupportedEncryptionMode)
    }

    /// Bytes appended to the packet after the encrypted payload, carrying
    /// this mode's nonce material for the receiver to reconstruct it.
    pub fn trailer_len(self) -> usize {
        match self {
            EncryptionMode::Normal => 0,
            EncryptionMode::Suffix => 24,
            EncryptionMode::Lite => 4,
        }
    }
}

/// Encrypts `plaintext_len` bytes already written at
/// `payload[TAG_SIZE..TAG_SIZE + plaintext_len]` in place, writes the
/// Poly1305 tag to `payload[..TAG_SIZE]`, and appends any mode-specific
/// nonce trailer right after the ciphertext.
///
/// `rtp_header` is the packet's 12-byte RTP header, used verbatim as the
/// nonce under [`EncryptionMode::Normal`]. `rtp_timestamp` is the current
/// RTP timestamp, used as the Lite-mode counter. Returns the total length
/// of tag + ciphertext + trailer written starting at `payload[0]`.
pub fn encrypt_in_place(
    mode: EncryptionMode,
    cipher: &Cipher,
    rtp_header: &[u8],
    rtp_timestamp: u32,
    payload: &mut [u8],
    plaintext_len: usize,
) -> Result<usize> {
    let mut nonce = Nonce::default();

    match mode {
        EncryptionMode::Normal => {
            let header_len = rtp_header.len().min(nonce.len());
            nonce[..header_len].copy_from_slice(&rtp_header[..header_len]);
        },
        EncryptionMode::Suffix => {
            rand::thread_rng().fill(&mut nonce[..]);
        },
        EncryptionMode::Lite => {
            nonce[..4].copy_from_slice(&rtp_timestamp.to_be_bytes());
        },
    }

    let ciphertext_end = TAG_SIZE + plaintext_len;
    let tag = cipher
        .encrypt_in_place_detached(&nonce, b"", &mut payload[TAG_SIZE..ciphertext_end])?;
    payload[..TAG_SIZE].copy_from_slice(&tag[..]);

    let mut written = ciphertext_end;
    match mode {
        EncryptionMode::Normal => {},
        EncryptionMode::Suffix => {
            payload[written..written + 24].copy_from_slice(&nonce[..]);
            written += 24;
        },
        EncryptionMode::Lite => {
            payload[written..written + 4].copy_from_slice(&nonce[..4]);
            written += 4;
        },
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xsalsa20poly1305::KeyInit;

    fn cipher() -> Cipher {
        Cipher::new_from_slice(&[7u8; 32]).unwrap()
    }

    #[test]
    fn select_prefers_first_recognised_offered_mode() {
        let offered = vec!["xsalsa20_poly1305_lite".to_string(), "xsalsa20_poly1305".to_string()];
        assert_eq!(EncryptionMode::select(&offered).unwrap(), EncryptionMode::Lite);
    }

    #[test]
    fn select_skips_unrecognised_names() {
        let offered = vec!["aead_aes256_gcm_rtpsize".to_string(), "xsalsa20_poly1305".to_string()];
        assert_eq!(EncryptionMode::select(&offered).unwrap(), EncryptionMode::Normal);
    }

    #[test]
    fn select_fails_when_nothing_recognised() {
        let offered = vec!["aead_aes256_gcm_rtpsize".to_string()];
        assert!(matches!(EncryptionMode::select(&offered), Err(Error::NoSupportedEncryptionMode)));
    }

    #[test]
    fn normal_mode_appends_no_trailer() {
        let cipher = cipher();
        let rtp_header = [0x80, 0x78, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3];
        let mut payload = vec![0u8; TAG_SIZE + 5];
        payload[TAG_SIZE..].copy_from_slice(b"hello");

        let written =
            encrypt_in_place(EncryptionMode::Normal, &cipher, &rtp_header, 2, &mut payload, 5)
                .unwrap();

        assert_eq!(written, TAG_SIZE + 5);
    }

    #[test]
    fn suffix_mode_appends_24_byte_nonce() {
        let cipher = cipher();
        let rtp_header = [0u8; 12];
        let mut payload = vec![0u8; TAG_SIZE + 5 + 24];
        payload[TAG_SIZE..TAG_SIZE + 5].copy_from_slice(b"hello");

        let written =
            encrypt_in_place(EncryptionMode::Suffix, &cipher, &rtp_header, 0, &mut payload, 5)
                .unwrap();

        assert_eq!(written, TAG_SIZE + 5 + 24);
    }

    #[test]
    fn lite_mode_appends_4_byte_timestamp_counter() {
        let cipher = cipher();
        let rtp_header = [0u8; 12];
        let mut payload = vec![0u8; TAG_SIZE + 5 + 4];
        payload[TAG_SIZE..TAG_SIZE + 5].copy_from_slice(b"hello");

        let written =
            encrypt_in_place(EncryptionMode::Lite, &cipher, &rtp_header, 0xAABB_CCDD, &mut payload, 5)
                .unwrap();

        assert_eq!(written, TAG_SIZE + 5 + 4);
        assert_eq!(&payload[TAG_SIZE + 5..written], &0xAABB_CCDDu32.to_be_bytes());
    }
}
