//! The tagged union of every payload the voice control plane can carry,
//! keyed by its integer opcode.
use crate::{opcode::OpCode, payload::*};
use serde::{
    de::{value::U8Deserializer, Deserializer, Error as DeError, IntoDeserializer, MapAccess, Visitor},
    ser::{SerializeStruct, Serializer},
    Deserialize, Serialize,
};
use serde_json::value::RawValue;

/// A single control-plane message, paired with its opcode.
///
/// Bidirectional: [`ControlPayload::Heartbeat`], [`ControlPayload::HeartbeatAck`],
/// [`ControlPayload::Speaking`]. Outbound only: [`ControlPayload::Identify`],
/// [`ControlPayload::SelectProtocol`], [`ControlPayload::Resume`]. Inbound
/// only: everything else.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum ControlPayload {
    Identify(Identify),
    SelectProtocol(SelectProtocol),
    Ready(Ready),
    Heartbeat(Heartbeat),
    SessionDescription(SessionDescription),
    Speaking(Speaking),
    HeartbeatAck(HeartbeatAck),
    Resume(Resume),
    Hello(Hello),
    Resumed,
    ClientDisconnect(ClientDisconnect),
    CodecDescription(CodecDescription),
}

impl ControlPayload {
    pub fn kind(&self) -> OpCode {
        use ControlPayload::*;
        match self {
            Identify(_) => OpCode::Identify,
            SelectProtocol(_) => OpCode::SelectProtocol,
            Ready(_) => OpCode::Ready,
            Heartbeat(_) => OpCode::Heartbeat,
            SessionDescription(_) => OpCode::SessionDescription,
            Speaking(_) => OpCode::Speaking,
            HeartbeatAck(_) => OpCode::HeartbeatAck,
            Resume(_) => OpCode::Resume,
            Hello(_) => OpCode::Hello,
            Resumed => OpCode::Resumed,
            ClientDisconnect(_) => OpCode::ClientDisconnect,
            CodecDescription(_) => OpCode::CodecDescription,
        }
    }
}

impl Serialize for ControlPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ControlPayload", 2)?;
        s.serialize_field("op", &self.kind())?;

        use ControlPayload::*;
        match self {
            Identify(e) => s.serialize_field("d", e)?,
            SelectProtocol(e) => s.serialize_field("d", e)?,
            Ready(e) => s.serialize_field("d", e)?,
            Heartbeat(e) => s.serialize_field("d", e)?,
            SessionDescription(e) => s.serialize_field("d", e)?,
            Speaking(e) => s.serialize_field("d", e)?,
            HeartbeatAck(e) => s.serialize_field("d", e)?,
            Resume(e) => s.serialize_field("d", e)?,
            Hello(e) => s.serialize_field("d", e)?,
            Resumed => s.serialize_field("d", &None::<()>)?,
            ClientDisconnect(e) => s.serialize_field("d", e)?,
            CodecDescription(e) => s.serialize_field("d", e)?,
        }

        s.end()
    }
}

struct ControlPayloadVisitor;

impl<'de> Visitor<'de> for ControlPayloadVisitor {
    type Value = ControlPayload;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a map with at least two keys ('d', 'op')")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut d = None;
        let mut op = None;

        loop {
            match map.next_key::<&str>()? {
                Some("op") => {
                    let raw = map.next_value::<u8>()?;
                    let des: U8Deserializer<A::Error> = raw.into_deserializer();
                    let valid_op = OpCode::deserialize(des).map_err(|_| {
                        DeError::invalid_value(
                            serde::de::Unexpected::Unsigned(raw.into()),
                            &"a recognised voice opcode",
                        )
                    })?;
                    op = Some(valid_op);
                },
                Some("d") => match op {
                    Some(OpCode::Identify) => return Ok(ControlPayload::Identify(map.next_value()?)),
                    Some(OpCode::SelectProtocol) =>
                        return Ok(ControlPayload::SelectProtocol(map.next_value()?)),
                    Some(OpCode::Ready) => return Ok(ControlPayload::Ready(map.next_value()?)),
                    Some(OpCode::Heartbeat) => return Ok(ControlPayload::Heartbeat(map.next_value()?)),
                    Some(OpCode::HeartbeatAck) =>
                        return Ok(ControlPayload::HeartbeatAck(map.next_value()?)),
                    Some(OpCode::SessionDescription) =>
                        return Ok(ControlPayload::SessionDescription(map.next_value()?)),
                    Some(OpCode::Speaking) => return Ok(ControlPayload::Speaking(map.next_value()?)),
                    Some(OpCode::Resume) => return Ok(ControlPayload::Resume(map.next_value()?)),
                    Some(OpCode::Hello) => return Ok(ControlPayload::Hello(map.next_value()?)),
                    Some(OpCode::Resumed) => {
                        let _ = map.next_value::<Option<()>>()?;
                        return Ok(ControlPayload::Resumed);
                    },
                    Some(OpCode::ClientDisconnect) =>
                        return Ok(ControlPayload::ClientDisconnect(map.next_value()?)),
                    Some(OpCode::CodecDescription) =>
                        return Ok(ControlPayload::CodecDescription(map.next_value()?)),
                    None => {
                        d = Some(map.next_value::<&RawValue>()?);
                    },
                },
                Some(_) => {},
                None =>
                    if d.is_none() {
                        return Err(DeError::missing_field("d"));
                    } else if op.is_none() {
                        return Err(DeError::missing_field("op"));
                    },
            }

            if d.is_some() && op.is_some() {
                break;
            }
        }

        let d = d.expect("loop only breaks once both fields are set").get();
        let op = op.expect("loop only breaks once both fields are set");

        (match op {
            OpCode::Identify => serde_json::from_str(d).map(ControlPayload::Identify),
            OpCode::SelectProtocol => serde_json::from_str(d).map(ControlPayload::SelectProtocol),
            OpCode::Ready => serde_json::from_str(d).map(ControlPayload::Ready),
            OpCode::Heartbeat => serde_json::from_str(d).map(ControlPayload::Heartbeat),
            OpCode::HeartbeatAck => serde_json::from_str(d).map(ControlPayload::HeartbeatAck),
            OpCode::SessionDescription =>
                serde_json::from_str(d).map(ControlPayload::SessionDescription),
            OpCode::Speaking => serde_json::from_str(d).map(ControlPayload::Speaking),
            OpCode::Resume => serde_json::from_str(d).map(ControlPayload::Resume),
            OpCode::Hello => serde_json::from_str(d).map(ControlPayload::Hello),
            OpCode::Resumed => Ok(ControlPayload::Resumed),
            OpCode::ClientDisconnect => serde_json::from_str(d).map(ControlPayload::ClientDisconnect),
            OpCode::CodecDescription => serde_json::from_str(d).map(ControlPayload::CodecDescription),
        })
        .map_err(DeError::custom)
    }
}

impl<'de> Deserialize<'de> for ControlPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ControlPayloadVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::ControlPayload;
    use crate::{id::*, opcode::OpCode, payload::*};
    use serde_test::{Configure, Token};
    use std::net::Ipv4Addr;

    #[test]
    fn deserialize_identify_json() {
        let json_data = r#"{
          "d": {
            "server_id": "41771983423143937",
            "user_id": "104694319306248192",
            "session_id": "my_session_id",
            "token": "my_token"
          },
          "op": 0
        }"#;

        let event: ControlPayload = serde_json::from_str(json_data).unwrap();

        let ident = Identify {
            session_id: "my_session_id".into(),
            token: "my_token".into(),
            server_id: ServerId(41771983423143937),
            user_id: UserId(104694319306248192),
        };

        assert!(matches!(event, ControlPayload::Identify(i) if i == ident));
    }

    #[test]
    fn deserialize_ready_json() {
        let json_data = r#"{
            "op": 2,
            "d": {
                "ssrc": 1,
                "ip": "127.0.0.1",
                "port": 1234,
                "modes": ["xsalsa20_poly1305", "xsalsa20_poly1305_suffix", "xsalsa20_poly1305_lite"],
                "heartbeat_interval": 1
            }
        }"#;

        let event: ControlPayload = serde_json::from_str(json_data).unwrap();

        let ready = Ready {
            ssrc: 1,
            ip: Ipv4Addr::new(127, 0, 0, 1).into(),
            port: 1234,
            modes: vec![
                "xsalsa20_poly1305".into(),
                "xsalsa20_poly1305_suffix".into(),
                "xsalsa20_poly1305_lite".into(),
            ],
        };

        assert!(matches!(event, ControlPayload::Ready(r) if r == ready));
    }

    #[test]
    fn deserialize_resumed_ignores_null_body() {
        let json_data = r#"{"op": 9, "d": null}"#;
        let event: ControlPayload = serde_json::from_str(json_data).unwrap();
        assert!(matches!(event, ControlPayload::Resumed));
    }

    #[test]
    fn unrecognised_opcode_is_rejected() {
        let json_data = r#"{"op": 99, "d": {}}"#;
        let event = serde_json::from_str::<ControlPayload>(json_data);
        assert!(event.is_err());
    }

    #[test]
    fn serialize_identify() {
        let value = ControlPayload::Identify(Identify {
            server_id: ServerId(1),
            session_id: "56f88a86dce65c65b9".into(),
            token: "56f88a86dce65c65b8".into(),
            user_id: UserId(2),
        });

        serde_test::assert_ser_tokens(
            &value,
            &[
                Token::Struct { name: "ControlPayload", len: 2 },
                Token::Str("op"),
                Token::U8(OpCode::Identify as u8),
                Token::Str("d"),
                Token::Struct { name: "Identify", len: 4 },
                Token::Str("server_id"),
                Token::Str("1"),
                Token::Str("session_id"),
                Token::Str("56f88a86dce65c65b9"),
                Token::Str("token"),
                Token::Str("56f88a86dce65c65b8"),
                Token::Str("user_id"),
                Token::Str("2"),
                Token::StructEnd,
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn serialize_ready() {
        let value = ControlPayload::Ready(Ready {
            modes: vec![
                "xsalsa20_poly1305".into(),
                "xsalsa20_poly1305_suffix".into(),
                "xsalsa20_poly1305_lite".into(),
            ],
            ip: Ipv4Addr::new(127, 0, 0, 1).into(),
            port: 12345,
            ssrc: 0xcafe_d00d,
        });

        serde_test::assert_ser_tokens(
            &value.compact(),
            &[
                Token::Struct { name: "ControlPayload", len: 2 },
                Token::Str("op"),
                Token::U8(OpCode::Ready as u8),
                Token::Str("d"),
                Token::Struct { name: "Ready", len: 4 },
                Token::Str("ip"),
                Token::NewtypeVariant { name: "IpAddr", variant: "V4" },
                Token::Tuple { len: 4 },
                Token::U8(127),
                Token::U8(0),
                Token::U8(0),
                Token::U8(1),
                Token::TupleEnd,
                Token::Str("modes"),
                Token::Seq { len: Some(3) },
                Token::Str("xsalsa20_poly1305"),
                Token::Str("xsalsa20_poly1305_suffix"),
                Token::Str("xsalsa20_poly1305_lite"),
                Token::SeqEnd,
                Token::Str("port"),
                Token::U16(12345),
                Token::Str("ssrc"),
                Token::U32(0xcafe_d00d),
                Token::StructEnd,
                Token::StructEnd,
            ],
        );
    }
}
