use std::collections::BTreeMap;
use std::ops::Index;

use crate::marker::{Marker, SpecialType};
use crate::{BigInt, Date, Uuid};

/// A dynamically-typed value, covering every kind the wire format can carry.
///
/// Integers and floats keep the width they were encoded with. Objects are held in key order, so
/// re-encoding a decoded `Value` can reorder entries relative to the original bytes.
///
/// Dates are held as a whole-millisecond [`Date`]. A wire Date with a fractional millisecond
/// count loses the fraction, so it re-encodes to different bytes, and a non-finite or
/// out-of-range Date fails to decode into a `Value` even though [`skip_value`](crate::skip_value)
/// walks past it.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Undefined,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    /// Truncated to whole milliseconds on decode.
    Date(Date),
    Uuid(Uuid),
    BigInt(BigInt),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(
            self,
            Value::I8(_)
                | Value::I16(_)
                | Value::I32(_)
                | Value::I64(_)
                | Value::U8(_)
                | Value::U16(_)
                | Value::U32(_)
                | Value::U64(_)
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::F32(_) | Value::F64(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_bin(&self) -> bool {
        matches!(self, Value::Bin(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Value::Date(_))
    }

    pub fn is_uuid(&self) -> bool {
        matches!(self, Value::Uuid(_))
    }

    pub fn is_bigint(&self) -> bool {
        matches!(self, Value::BigInt(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    /// Any integer that fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v),
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Any integer that fits in a `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::I8(v) => u64::try_from(v).ok(),
            Value::I16(v) => u64::try_from(v).ok(),
            Value::I32(v) => u64::try_from(v).ok(),
            Value::I64(v) => u64::try_from(v).ok(),
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => Some(v),
            _ => None,
        }
    }

    /// Either float width, widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::Str(ref v) = *self {
            Some(v.as_str())
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> Option<&[u8]> {
        if let Value::Bin(ref v) = *self {
            Some(v.as_slice())
        } else {
            None
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        if let Value::Array(ref v) = *self {
            Some(v.as_slice())
        } else {
            None
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        if let Value::Array(ref mut v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        if let Value::Object(ref v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        if let Value::Object(ref mut v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_date(&self) -> Option<Date> {
        if let Value::Date(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        if let Value::Uuid(ref v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_bigint(&self) -> Option<&BigInt> {
        if let Value::BigInt(ref v) = *self {
            Some(v)
        } else {
            None
        }
    }

    /// The tag this value gets when encoded at the top level.
    pub fn marker(&self) -> Marker {
        match self {
            Value::Null => Marker::Null,
            Value::Undefined => Marker::Undefined,
            Value::Bool(_) => Marker::Bool,
            Value::I8(_) => Marker::Int8,
            Value::I16(_) => Marker::Int16,
            Value::I32(_) => Marker::Int32,
            Value::I64(_) => Marker::Int64,
            Value::U8(_) => Marker::UInt8,
            Value::U16(_) => Marker::UInt16,
            Value::U32(_) => Marker::UInt32,
            Value::U64(_) => Marker::UInt64,
            Value::F32(_) => Marker::F32,
            Value::F64(_) => Marker::F64,
            Value::Str(_) => Marker::Str,
            Value::Bin(v) => Marker::for_bin_len(v.len()).unwrap_or(Marker::Buffer),
            Value::Array(_) => Marker::Array,
            Value::Object(_) => Marker::Object,
            Value::Date(_) => Marker::Date,
            Value::Uuid(_) => Marker::Uuid,
            Value::BigInt(_) => Marker::BigInt,
        }
    }
}

static NULL: Value = Value::Null;

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        self.as_array().and_then(|v| v.get(index)).unwrap_or(&NULL)
    }
}

impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, index: &str) -> &Self::Output {
        self.as_object().and_then(|v| v.get(index)).unwrap_or(&NULL)
    }
}

macro_rules! impl_value_from {
    ($t: ty, $p: ident) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$p(v)
            }
        }
    };
}

impl_value_from!(bool, Bool);
impl_value_from!(i8, I8);
impl_value_from!(i16, I16);
impl_value_from!(i32, I32);
impl_value_from!(i64, I64);
impl_value_from!(u8, U8);
impl_value_from!(u16, U16);
impl_value_from!(u32, U32);
impl_value_from!(u64, U64);
impl_value_from!(f32, F32);
impl_value_from!(f64, F64);
impl_value_from!(String, Str);
impl_value_from!(Vec<u8>, Bin);
impl_value_from!(Vec<Value>, Array);
impl_value_from!(BTreeMap<String, Value>, Object);
impl_value_from!(Date, Date);
impl_value_from!(Uuid, Uuid);
impl_value_from!(BigInt, BigInt);

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl<'a> From<&'a str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl<'a> From<&'a [u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bin(v.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Undefined,
        }
    }
}

impl<V: Into<Value>> std::iter::FromIterator<V> for Value {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        let v: Vec<Value> = iter.into_iter().map(Into::into).collect();
        Value::Array(v)
    }
}

macro_rules! impl_try_from_value {
    ($t: ty, $p: ident) => {
        impl TryFrom<Value> for $t {
            type Error = Value;
            fn try_from(v: Value) -> Result<Self, Self::Error> {
                match v {
                    Value::$p(v) => Ok(v),
                    _ => Err(v),
                }
            }
        }
    };
}

impl_try_from_value!(bool, Bool);
impl_try_from_value!(String, Str);
impl_try_from_value!(Vec<u8>, Bin);
impl_try_from_value!(Vec<Value>, Array);
impl_try_from_value!(BTreeMap<String, Value>, Object);
impl_try_from_value!(Date, Date);
impl_try_from_value!(Uuid, Uuid);
impl_try_from_value!(BigInt, BigInt);

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Undefined => serializer.serialize_none(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::I8(v) => serializer.serialize_i8(*v),
            Value::I16(v) => serializer.serialize_i16(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U8(v) => serializer.serialize_u8(*v),
            Value::U16(v) => serializer.serialize_u16(*v),
            Value::U32(v) => serializer.serialize_u32(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F32(v) => serializer.serialize_f32(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::Str(v) => serializer.serialize_str(v),
            Value::Bin(v) => serializer.serialize_bytes(v),
            Value::Array(v) => v.serialize(serializer),
            Value::Object(v) => v.serialize(serializer),
            Value::Date(v) => v.serialize(serializer),
            Value::Uuid(v) => v.serialize(serializer),
            Value::BigInt(v) => v.serialize(serializer),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::*;
        use std::fmt;

        struct ValueVisitor;
        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
                fmt.write_str("any valid torken Value")
            }

            fn visit_bool<E: Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i8<E: Error>(self, v: i8) -> Result<Self::Value, E> {
                Ok(Value::I8(v))
            }

            fn visit_i16<E: Error>(self, v: i16) -> Result<Self::Value, E> {
                Ok(Value::I16(v))
            }

            fn visit_i32<E: Error>(self, v: i32) -> Result<Self::Value, E> {
                Ok(Value::I32(v))
            }

            fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Value::I64(v))
            }

            fn visit_u8<E: Error>(self, v: u8) -> Result<Self::Value, E> {
                Ok(Value::U8(v))
            }

            fn visit_u16<E: Error>(self, v: u16) -> Result<Self::Value, E> {
                Ok(Value::U16(v))
            }

            fn visit_u32<E: Error>(self, v: u32) -> Result<Self::Value, E> {
                Ok(Value::U32(v))
            }

            fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Value::U64(v))
            }

            fn visit_i128<E: Error>(self, v: i128) -> Result<Self::Value, E> {
                Ok(Value::BigInt(BigInt::from(v)))
            }

            fn visit_u128<E: Error>(self, v: u128) -> Result<Self::Value, E> {
                Ok(Value::BigInt(BigInt::from(v)))
            }

            fn visit_f32<E: Error>(self, v: f32) -> Result<Self::Value, E> {
                Ok(Value::F32(v))
            }

            fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(Value::F64(v))
            }

            fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Value::Str(v.into()))
            }

            fn visit_string<E: Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(Value::Str(v))
            }

            fn visit_bytes<E: Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(Value::Bin(v.into()))
            }

            fn visit_byte_buf<E: Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                Ok(Value::Bin(v))
            }

            fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
                Ok(Value::Undefined)
            }

            fn visit_some<D: serde::Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> Result<Self::Value, D::Error> {
                Value::deserialize(deserializer)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                // Don't trust the size hint beyond what serde itself would preallocate
                let mut seq = match access.size_hint() {
                    Some(size) => Vec::with_capacity(size.min(4096)),
                    None => Vec::new(),
                };
                while let Some(elem) = access.next_element()? {
                    seq.push(elem);
                }
                Ok(Value::Array(seq))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = BTreeMap::new();
                while let Some((key, val)) = access.next_entry()? {
                    map.insert(key, val);
                }
                Ok(Value::Object(map))
            }

            /// Only reached for the special types, whose variant arrives as an index.
            fn visit_enum<A: EnumAccess<'de>>(self, access: A) -> Result<Self::Value, A::Error> {
                use serde_bytes::ByteBuf;
                let (variant, access) = access.variant::<SpecialType>()?;
                match variant {
                    SpecialType::Date => {
                        let ms: f64 = access.newtype_variant()?;
                        let val = Date::from_millis_f64(ms).ok_or_else(|| {
                            A::Error::invalid_value(Unexpected::Float(ms), &"a representable date")
                        })?;
                        Ok(Value::Date(val))
                    }
                    SpecialType::Uuid => {
                        let bytes: ByteBuf = access.newtype_variant()?;
                        let val = Uuid::try_from(bytes.as_ref()).map_err(A::Error::custom)?;
                        Ok(Value::Uuid(val))
                    }
                    SpecialType::BigInt => {
                        let bytes: ByteBuf = access.newtype_variant()?;
                        let val = BigInt::from_wire_bytes(&bytes).map_err(A::Error::custom)?;
                        Ok(Value::BigInt(val))
                    }
                }
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{from_slice, to_vec};

    fn sample() -> Value {
        let mut inner = BTreeMap::new();
        inner.insert("bytes".to_string(), Value::from(vec![1u8, 2, 3]));
        inner.insert("uuid".to_string(), Value::Uuid(Uuid::from_bytes([9; 16])));
        inner.insert("when".to_string(), Value::Date(Date::from_millis(5).unwrap()));
        inner.insert("big".to_string(), Value::BigInt(BigInt::from(-1i64 << 40)));
        inner.insert("nothing".to_string(), Value::Undefined);
        let mut outer = BTreeMap::new();
        outer.insert("inner".to_string(), Value::Object(inner));
        outer.insert(
            "list".to_string(),
            Value::Array(vec![
                Value::Null,
                Value::Bool(true),
                Value::I8(-1),
                Value::I16(-300),
                Value::I32(-70000),
                Value::I64(-5_000_000_000),
                Value::U8(1),
                Value::U16(300),
                Value::U32(70000),
                Value::U64(5_000_000_000),
                Value::F32(1.5),
                Value::F64(-2.25),
                Value::from("text"),
            ]),
        );
        Value::Object(outer)
    }

    #[test]
    fn roundtrip_keeps_widths() {
        let value = sample();
        let enc = to_vec(&value).unwrap();
        let dec: Value = from_slice(&enc).unwrap();
        assert_eq!(dec, value);
    }

    #[test]
    fn fixed_size_buffers_read_back_as_bin() {
        let value = Value::Bin(vec![7; 16]);
        assert_eq!(value.marker(), Marker::Xword);
        let enc = to_vec(&value).unwrap();
        assert_eq!(enc[0], Marker::Xword.into_u8());
        let dec: Value = from_slice(&enc).unwrap();
        assert_eq!(dec, value);
    }

    #[test]
    fn markers_match_encoding() {
        let value = sample();
        let items = value["list"].as_array().unwrap();
        for item in items {
            let enc = to_vec(item).unwrap();
            assert_eq!(enc[0], item.marker().into_u8(), "{:?}", item);
        }
        assert_eq!(value.marker(), Marker::Object);
    }

    #[test]
    fn indexing() {
        let value = sample();
        assert_eq!(value["list"][2].as_i64(), Some(-1));
        assert_eq!(value["list"][9].as_u64(), Some(5_000_000_000));
        assert!(value["list"][99].is_null());
        assert!(value["missing"]["deeper"].is_null());
        assert!(value["inner"]["nothing"].is_undefined());
        assert_eq!(value["inner"]["when"].as_date().map(|d| d.millis()), Some(5));
    }

    #[test]
    fn integer_accessors() {
        assert_eq!(Value::U64(u64::MAX).as_i64(), None);
        assert_eq!(Value::I8(-1).as_u64(), None);
        assert_eq!(Value::U16(7).as_i64(), Some(7));
        assert_eq!(Value::F32(0.5).as_f64(), Some(0.5));
        assert_eq!(Value::Str("x".into()).as_i64(), None);
    }

    #[test]
    fn decodes_function_as_undefined() {
        let enc = [0x0d, 0x07];
        let dec: Value = from_slice(&enc).unwrap();
        assert!(dec.is_undefined());
    }

    #[test]
    fn unknown_tag_is_undefined() {
        let dec: Value = from_slice(&[0x00]).unwrap();
        assert!(dec.is_undefined());
    }

    #[test]
    fn from_option() {
        assert!(Value::from(None::<u8>).is_undefined());
        assert_eq!(Value::from(Some(3u8)), Value::U8(3));
    }

    #[test]
    fn dates_truncate_to_whole_milliseconds() {
        let mut enc = vec![0x0f];
        enc.extend_from_slice(&1.5f64.to_le_bytes());
        let value: Value = from_slice(&enc).unwrap();
        assert_eq!(value, Value::Date(Date::from_millis(1).unwrap()));
        let reencoded = to_vec(&value).unwrap();
        assert_eq!(&reencoded[1..], &1.0f64.to_le_bytes());

        let mut enc = vec![0x0f];
        enc.extend_from_slice(&f64::NAN.to_le_bytes());
        assert!(from_slice::<Value>(&enc).is_err());
        assert_eq!(crate::skip_value(&enc).unwrap(), 9);
    }
}
