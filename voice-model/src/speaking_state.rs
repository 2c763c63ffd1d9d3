use bitflags::bitflags;
use serde::{
    de::{Deserialize, Deserializer},
    ser::{Serialize, Serializer},
};

bitflags! {
    /// Flags describing which audio sources a participant is currently
    /// transmitting.
    #[derive(Default)]
    pub struct SpeakingState: u8 {
        const MICROPHONE = 1;
        const SOUNDSHARE = 1 << 1;
        const PRIORITY = 1 << 2;
    }
}

impl Serialize for SpeakingState {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for SpeakingState {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(d)?;
        Ok(Self::from_bits_truncate(bits))
    }
}
