//! The one-shot IP discovery exchange that learns the externally visible
//! address and port a caller's UDP socket is reachable on, for NAT
//! traversal before the real RTP stream starts.

use super::error::{Error, Result};
use discortp::discord::{IpDiscoveryPacket, IpDiscoveryType, MutableIpDiscoveryPacket};
use std::{net::IpAddr, str::FromStr};

/// The externally-visible address the peer observed for the discovery
/// request's source.
pub struct Discovered {
    pub address: IpAddr,
    pub port: u16,
}

/// Builds a discovery request packet for `ssrc`.
pub fn build_request(ssrc: u32) -> [u8; IpDiscoveryPacket::const_packet_size()] {
    let mut bytes = [0u8; IpDiscoveryPacket::const_packet_size()];
    {
        let mut view = MutableIpDiscoveryPacket::new(&mut bytes[..])
            .expect("buffer is exactly const_packet_size() long");
        view.set_pkt_type(IpDiscoveryType::Request);
        view.set_length(70);
        view.set_ssrc(ssrc);
    }
    bytes
}

/// Parses a discovery response out of the first `len` bytes of `bytes`.
pub fn parse_response(bytes: &[u8], len: usize) -> Result<Discovered> {
    let view = IpDiscoveryPacket::new(&bytes[..len]).ok_or(Error::IpDiscoveryFailed)?;

    if view.get_pkt_type() != IpDiscoveryType::Response {
        return Err(Error::IpDiscoveryFailed);
    }

    let nul_byte_index = view
        .get_address_raw()
        .iter()
        .position(|&b| b == 0)
        .ok_or(Error::IpDiscoveryFailed)?;

    let address_str = std::str::from_utf8(&view.get_address_raw()[..nul_byte_index])
        .map_err(|_| Error::IpDiscoveryFailed)?;

    let address = IpAddr::from_str(address_str).map_err(|_| Error::IpDiscoveryFailed)?;

    Ok(Discovered { address, port: view.get_port() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_ssrc_and_request_type() {
        let bytes = build_request(0xdead_beef);
        let view = IpDiscoveryPacket::new(&bytes[..]).unwrap();
        assert_eq!(view.get_pkt_type(), IpDiscoveryType::Request);
        assert_eq!(view.get_ssrc(), 0xdead_beef);
        assert_eq!(view.get_length(), 70);
    }

    #[test]
    fn response_round_trips_address_and_port() {
        let mut bytes = [0u8; IpDiscoveryPacket::const_packet_size()];
        {
            let mut view = MutableIpDiscoveryPacket::new(&mut bytes[..]).unwrap();
            view.set_pkt_type(IpDiscoveryType::Response);
            view.set_length(70);
            view.set_ssrc(1);
            let addr = b"203.0.113.42";
            let raw = view.get_address_raw_mut();
            raw[..addr.len()].copy_from_slice(addr);
            view.set_port(50123);
        }

        let discovered = parse_response(&bytes, bytes.len()).unwrap();
        assert_eq!(discovered.address, "203.0.113.42".parse::<IpAddr>().unwrap());
        assert_eq!(discovered.port, 50123);
    }

    #[test]
    fn wrong_packet_type_is_rejected() {
        let bytes = build_request(1);
        assert!(matches!(parse_response(&bytes, bytes.len()), Err(Error::IpDiscoveryFailed)));
    }
}
