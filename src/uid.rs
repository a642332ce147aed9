use std::fmt;

use serde::{
    de::{EnumAccess, Error as DeError, Unexpected, VariantAccess},
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_bytes::{ByteBuf, Bytes};

use crate::marker::{SpecialType, SPECIAL_TYPE_ENUM, SPECIAL_TYPE_VARIANTS};

/// A 16-byte UUID, written with its own wire tag rather than as a generic 16-byte buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uuid(uuid::Uuid);

impl Uuid {
    /// A new random (version 4) UUID.
    pub fn new_v4() -> Self {
        Uuid(uuid::Uuid::new_v4())
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Uuid(uuid::Uuid::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl From<uuid::Uuid> for Uuid {
    fn from(v: uuid::Uuid) -> Self {
        Uuid(v)
    }
}

impl From<Uuid> for uuid::Uuid {
    fn from(v: Uuid) -> Self {
        v.0
    }
}

impl TryFrom<&[u8]> for Uuid {
    type Error = String;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; 16] = value
            .try_into()
            .map_err(|_| format!("UUID must be 16 bytes, got {}", value.len()))?;
        Ok(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for Uuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let special = SpecialType::Uuid;
        if serializer.is_human_readable() {
            serializer.serialize_newtype_variant(
                SPECIAL_TYPE_ENUM,
                special.index() as u32,
                special.as_str(),
                &self.0.hyphenated().to_string(),
            )
        } else {
            serializer.serialize_newtype_variant(
                SPECIAL_TYPE_ENUM,
                special.index() as u32,
                special.as_str(),
                Bytes::new(self.as_bytes()),
            )
        }
    }
}

impl<'de> Deserialize<'de> for Uuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct UuidVisitor {
            is_human_readable: bool,
        }

        impl<'de> serde::de::Visitor<'de> for UuidVisitor {
            type Value = Uuid;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(fmt, "{} enum with variant Uuid", SPECIAL_TYPE_ENUM)
            }

            fn visit_enum<A>(self, data: A) -> Result<Self::Value, A::Error>
            where
                A: EnumAccess<'de>,
            {
                let variant = match data.variant()? {
                    (SpecialType::Uuid, variant) => variant,
                    (e, _) => {
                        return Err(A::Error::invalid_type(
                            Unexpected::Other(e.as_str()),
                            &"Uuid",
                        ))
                    }
                };
                if self.is_human_readable {
                    let s: String = variant.newtype_variant()?;
                    uuid::Uuid::parse_str(&s)
                        .map(Uuid)
                        .map_err(A::Error::custom)
                } else {
                    let bytes: ByteBuf = variant.newtype_variant()?;
                    Uuid::try_from(bytes.as_ref()).map_err(A::Error::custom)
                }
            }
        }

        let is_human_readable = deserializer.is_human_readable();
        deserializer.deserialize_enum(
            SPECIAL_TYPE_ENUM,
            SPECIAL_TYPE_VARIANTS,
            UuidVisitor { is_human_readable },
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wire_form() {
        let id = Uuid::from_bytes([0x42; 16]);
        let enc = crate::to_vec(&id).unwrap();
        assert_eq!(enc.len(), 17);
        assert_eq!(enc[0], 0x1d);
        assert_eq!(&enc[1..], &[0x42; 16]);
        let dec: Uuid = crate::from_slice(&enc).unwrap();
        assert_eq!(dec, id);
    }

    #[test]
    fn not_a_plain_buffer() {
        // A 16-byte buffer gets the Xword tag and doesn't decode as a UUID
        let enc = crate::to_vec(Bytes::new(&[0x42; 16])).unwrap();
        assert_eq!(enc[0], 0x15);
        assert!(crate::from_slice::<Uuid>(&enc).is_err());
    }

    #[test]
    fn human_readable() {
        let id = Uuid::new_v4();
        let json = serde_json::to_string(&id).unwrap();
        let back: Uuid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn wrong_length() {
        assert!(Uuid::try_from(&[0u8; 15][..]).is_err());
    }
}
