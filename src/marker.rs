use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Unexpected, Visitor};

/// Wire type tags. Every encoded value starts with one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Unknown,
    Str,
    Int32,
    Int64,
    F32,
    F64,
    Bool,
    Null,
    Undefined,
    Array,
    Object,
    BigInt,
    Buffer,
    Function,
    Custom,
    Date,
    Byte,
    Word,
    Dword,
    Lword,
    Mword,
    Xword,
    Int8,
    Int16,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    F16,
    Uuid,
}

impl Marker {
    /// Construct a marker from a single byte. Returns `None` if the tag isn't assigned.
    pub fn from_u8(n: u8) -> Option<Marker> {
        Some(match n {
            0x00 => Marker::Unknown,
            0x01 => Marker::Str,
            0x02 => Marker::Int32,
            0x03 => Marker::Int64,
            0x04 => Marker::F32,
            0x05 => Marker::F64,
            0x06 => Marker::Bool,
            0x07 => Marker::Null,
            0x08 => Marker::Undefined,
            0x09 => Marker::Array,
            0x0a => Marker::Object,
            0x0b => Marker::BigInt,
            0x0c => Marker::Buffer,
            0x0d => Marker::Function,
            0x0e => Marker::Custom,
            0x0f => Marker::Date,
            0x10 => Marker::Byte,
            0x11 => Marker::Word,
            0x12 => Marker::Dword,
            0x13 => Marker::Lword,
            0x14 => Marker::Mword,
            0x15 => Marker::Xword,
            0x16 => Marker::Int8,
            0x17 => Marker::Int16,
            0x18 => Marker::UInt8,
            0x19 => Marker::UInt16,
            0x1a => Marker::UInt32,
            0x1b => Marker::UInt64,
            0x1c => Marker::F16,
            0x1d => Marker::Uuid,
            _ => return None,
        })
    }

    /// Converts a marker into its single-byte representation.
    pub fn into_u8(self) -> u8 {
        match self {
            Marker::Unknown => 0x00,
            Marker::Str => 0x01,
            Marker::Int32 => 0x02,
            Marker::Int64 => 0x03,
            Marker::F32 => 0x04,
            Marker::F64 => 0x05,
            Marker::Bool => 0x06,
            Marker::Null => 0x07,
            Marker::Undefined => 0x08,
            Marker::Array => 0x09,
            Marker::Object => 0x0a,
            Marker::BigInt => 0x0b,
            Marker::Buffer => 0x0c,
            Marker::Function => 0x0d,
            Marker::Custom => 0x0e,
            Marker::Date => 0x0f,
            Marker::Byte => 0x10,
            Marker::Word => 0x11,
            Marker::Dword => 0x12,
            Marker::Lword => 0x13,
            Marker::Mword => 0x14,
            Marker::Xword => 0x15,
            Marker::Int8 => 0x16,
            Marker::Int16 => 0x17,
            Marker::UInt8 => 0x18,
            Marker::UInt16 => 0x19,
            Marker::UInt32 => 0x1a,
            Marker::UInt64 => 0x1b,
            Marker::F16 => 0x1c,
            Marker::Uuid => 0x1d,
        }
    }

    /// The payload size of the fixed-size byte tags, which carry no length prefix.
    pub fn fixed_bin_len(self) -> Option<usize> {
        match self {
            Marker::Byte => Some(1),
            Marker::Word => Some(2),
            Marker::Dword => Some(4),
            Marker::Lword => Some(8),
            Marker::Mword => Some(12),
            Marker::Xword => Some(16),
            _ => None,
        }
    }

    /// Pick the fixed-size byte tag for a given length, if there is one.
    pub fn for_bin_len(len: usize) -> Option<Marker> {
        match len {
            1 => Some(Marker::Byte),
            2 => Some(Marker::Word),
            4 => Some(Marker::Dword),
            8 => Some(Marker::Lword),
            12 => Some(Marker::Mword),
            16 => Some(Marker::Xword),
            _ => None,
        }
    }

    /// Markers that decode to an absent value. A function marker counts, as its body is skipped.
    pub fn is_nothing(self) -> bool {
        matches!(
            self,
            Marker::Unknown | Marker::Null | Marker::Undefined | Marker::Function
        )
    }
}

impl From<Marker> for u8 {
    fn from(val: Marker) -> u8 {
        val.into_u8()
    }
}

/// Name of the pseudo-enum that carries the special value types through serde.
///
/// [`Date`](crate::Date), [`Uuid`](crate::Uuid) and [`BigInt`](crate::BigInt) serialize as a
/// newtype variant of this enum, which lets the serializer give them their own wire tags instead
/// of treating them as plain numbers or byte strings.
pub const SPECIAL_TYPE_ENUM: &str = "$torken::SpecialType";
pub const SPECIAL_TYPE_VARIANTS: &[&str] = &["Date", "Uuid", "BigInt"];
pub const SPECIAL_TYPE_DATE_INDEX: u64 = 0;
pub const SPECIAL_TYPE_UUID_INDEX: u64 = 1;
pub const SPECIAL_TYPE_BIGINT_INDEX: u64 = 2;

/// The special value types with dedicated wire tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialType {
    Date,
    Uuid,
    BigInt,
}

impl SpecialType {
    pub fn index(self) -> u64 {
        match self {
            SpecialType::Date => SPECIAL_TYPE_DATE_INDEX,
            SpecialType::Uuid => SPECIAL_TYPE_UUID_INDEX,
            SpecialType::BigInt => SPECIAL_TYPE_BIGINT_INDEX,
        }
    }

    pub fn from_index(v: u64) -> Option<SpecialType> {
        match v {
            SPECIAL_TYPE_DATE_INDEX => Some(SpecialType::Date),
            SPECIAL_TYPE_UUID_INDEX => Some(SpecialType::Uuid),
            SPECIAL_TYPE_BIGINT_INDEX => Some(SpecialType::BigInt),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        SPECIAL_TYPE_VARIANTS[self.index() as usize]
    }
}

impl<'de> Deserialize<'de> for SpecialType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SpecialVisitor;

        impl<'de> Visitor<'de> for SpecialVisitor {
            type Value = SpecialType;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(fmt, "{} variant index or name", SPECIAL_TYPE_ENUM)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                SpecialType::from_index(v)
                    .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                SPECIAL_TYPE_VARIANTS
                    .iter()
                    .position(|name| *name == v)
                    .and_then(|i| SpecialType::from_index(i as u64))
                    .ok_or_else(|| E::unknown_variant(v, SPECIAL_TYPE_VARIANTS))
            }
        }

        deserializer.deserialize_identifier(SpecialVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tag_roundtrip() {
        for n in 0..=u8::MAX {
            match Marker::from_u8(n) {
                Some(marker) => assert_eq!(marker.into_u8(), n),
                None => assert!(n > 0x1d, "0x{:02x} should be an assigned tag", n),
            }
        }
    }

    #[test]
    fn fixed_bin_sizes() {
        for len in 0..32 {
            if let Some(marker) = Marker::for_bin_len(len) {
                assert_eq!(marker.fixed_bin_len(), Some(len));
            }
        }
        assert_eq!(Marker::for_bin_len(3), None);
        assert_eq!(Marker::Buffer.fixed_bin_len(), None);
        assert_eq!(Marker::Uuid.fixed_bin_len(), None);
    }
}
