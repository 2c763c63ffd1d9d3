use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// The `data` field of a `SelectProtocol` payload: the client's externally
/// visible address, as discovered over UDP, plus the chosen encryption mode.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ProtocolData {
    pub address: IpAddr,
    pub mode: String,
    pub port: u16,
}
