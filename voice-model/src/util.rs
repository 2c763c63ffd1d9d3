//! Snowflake-style IDs are wider than JS's safe integer range, so the gateway
//! sends and receives them as JSON strings. This module bridges that to a
//! plain `u64` field via `#[serde(with = "json_safe_u64")]`.

pub mod json_safe_u64 {
    use serde::{de::Error as DeError, Deserialize, Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(val: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        struct V;

        impl<'de> serde::de::Visitor<'de> for V {
            type Value = u64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a u64 or its string representation")
            }

            fn visit_u64<E: DeError>(self, v: u64) -> Result<u64, E> {
                Ok(v)
            }

            fn visit_str<E: DeError>(self, v: &str) -> Result<u64, E> {
                v.parse().map_err(|_| E::custom("invalid snowflake string"))
            }
        }

        d.deserialize_any(V)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Wrapper(#[serde(with = "super::json_safe_u64")] u64);

    #[test]
    fn round_trips_through_string() {
        let w = Wrapper(123456789012345678);
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, "\"123456789012345678\"");

        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.0, 123456789012345678);
    }

    #[test]
    fn accepts_bare_numbers_too() {
        let back: Wrapper = serde_json::from_str("42").unwrap();
        assert_eq!(back.0, 42);
    }
}
