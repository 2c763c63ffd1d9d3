//! Errors from the UDP media transport (C3).

use std::{error::Error as StdError, fmt, io};
use xsalsa20poly1305::aead::Error as AeadError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// AEAD encryption of an RTP payload failed.
    Crypto(AeadError),
    /// A miscellaneous I/O error on the UDP socket.
    Io(io::Error),
    /// The IP discovery exchange did not complete: timeout, a short read,
    /// or a mismatched packet type/length.
    IpDiscoveryFailed,
    /// None of the peer-offered encryption mode names were recognised.
    NoSupportedEncryptionMode,
    /// `send_frame` was called before `initialize`.
    NotInitialized,
}

impl From<AeadError> for Error {
    fn from(e: AeadError) -> Self {
        Error::Crypto(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Crypto(e) => write!(f, "packet encryption failed: {}", e),
            Error::Io(e) => write!(f, "UDP I/O error: {}", e),
            Error::IpDiscoveryFailed => write!(f, "IP discovery did not complete"),
            Error::NoSupportedEncryptionMode =>
                write!(f, "no offered encryption mode is supported"),
            Error::NotInitialized => write!(f, "media transport used before initialize()"),
        }
    }
}

impl StdError for Error {}
