//! Deserialization.
//!
//! Numbers are handed to the visitor at the exact width they were encoded with, and serde
//! takes care of widening or narrowing into the target type. Object entries the target doesn't
//! know about are walked past without being materialized.

use std::fmt;

use serde::de::Error as DeError;
use serde::de::*;

use crate::depth_tracking::DepthTracker;
use crate::{
    big_int::{decode_i128, decode_u128},
    element::*,
    error::{Error, Result},
    marker::{Marker, SpecialType, SPECIAL_TYPE_ENUM},
};

/// Deserialize a value from a byte slice. The slice must hold exactly one encoded value.
pub fn from_slice<'de, T: Deserialize<'de>>(buf: &'de [u8]) -> Result<T> {
    let mut de = TorkenDeserializer::new(buf);
    let value = T::deserialize(&mut de)?;
    let left = de.parser.remaining().len();
    if left != 0 {
        return Err(Error::Decode(format!(
            "{} trailing bytes after the encoded value",
            left
        )));
    }
    Ok(value)
}

/// Walk past the first encoded value in `buf` without materializing it, returning how many
/// bytes it occupies. Fails only on structurally malformed data.
pub fn skip_value(buf: &[u8]) -> Result<usize> {
    let mut parser = Parser::new(buf);
    parser.skip_value()?;
    Ok(buf.len() - parser.remaining().len())
}

struct TorkenDeserializer<'a> {
    depth_tracking: DepthTracker,
    parser: Parser<'a>,
}

impl<'a> TorkenDeserializer<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            depth_tracking: DepthTracker::new(),
            parser: Parser::new(buf),
        }
    }

    fn next_elem(&mut self) -> Result<Element<'a>> {
        let elem = self.parser.next_elem()?;
        self.depth_tracking.update_elem(&elem)?;
        Ok(elem)
    }

    fn visit_elem<V: Visitor<'a>>(&mut self, elem: Element<'a>, visitor: V) -> Result<V::Value> {
        match elem {
            Element::Null => visitor.visit_unit(),
            Element::Undefined => visitor.visit_none(),
            Element::Bool(v) => visitor.visit_bool(v),
            Element::I8(v) => visitor.visit_i8(v),
            Element::I16(v) => visitor.visit_i16(v),
            Element::I32(v) => visitor.visit_i32(v),
            Element::I64(v) => visitor.visit_i64(v),
            Element::U8(v) => visitor.visit_u8(v),
            Element::U16(v) => visitor.visit_u16(v),
            Element::U32(v) => visitor.visit_u32(v),
            Element::U64(v) => visitor.visit_u64(v),
            Element::F32(v) => visitor.visit_f32(v),
            Element::F64(v) => visitor.visit_f64(v),
            Element::Str(v) => visitor.visit_borrowed_str(v),
            Element::Bin(v) => visitor.visit_borrowed_bytes(v),
            Element::Date(v) => visitor.visit_enum(SpecialAccess::new(Special::Date(v))),
            Element::Uuid(v) => visitor.visit_enum(SpecialAccess::new(Special::Uuid(v))),
            Element::BigInt(v) => visitor.visit_enum(SpecialAccess::new(Special::BigInt(v))),
            Element::Array(len) => {
                let mut access = SeqAccess::new(self, len);
                let value = visitor.visit_seq(&mut access)?;
                access.end()?;
                Ok(value)
            }
            Element::Object(len) => {
                let mut access = MapAccess::new(self, len);
                let value = visitor.visit_map(&mut access)?;
                access.end()?;
                Ok(value)
            }
        }
    }
}

impl<'de, 'a> serde::Deserializer<'de> for &'a mut TorkenDeserializer<'de> {
    type Error = Error;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let elem = self.next_elem()?;
        self.visit_elem(elem, visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let marker = self.parser.peek_marker()?;
        if marker.is_nothing() {
            self.next_elem()?;
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.next_elem()? {
            Element::Null | Element::Undefined => visitor.visit_unit(),
            elem => self.visit_elem(elem, visitor),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.next_elem()? {
            Element::Bin(v) | Element::Uuid(v) => visitor.visit_borrowed_bytes(v),
            elem => self.visit_elem(elem, visitor),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_i128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.next_elem()? {
            Element::BigInt(v) => visitor.visit_i128(decode_i128(v)?),
            elem => self.visit_elem(elem, visitor),
        }
    }

    fn deserialize_u128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.next_elem()? {
            Element::BigInt(v) => visitor.visit_u128(decode_u128(v)?),
            elem => self.visit_elem(elem, visitor),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        match self.next_elem()? {
            // Fixed-size byte arrays may arrive as byte strings
            Element::Bin(v) | Element::Uuid(v) => {
                if v.len() != len {
                    return Err(Error::Decode(format!(
                        "byte array length mismatch: encoded {} bytes, expected {}",
                        v.len(),
                        len
                    )));
                }
                visitor.visit_seq(value::SeqDeserializer::<_, Error>::new(v.iter().copied()))
            }
            Element::Array(n) if n != len => Err(Error::Decode(format!(
                "array length mismatch: encoded {} elements, expected {}",
                n, len
            ))),
            elem @ Element::Array(_) => self.visit_elem(elem, visitor),
            elem => Err(Error::invalid_type(elem.unexpected(), &visitor)),
        }
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        if name == SPECIAL_TYPE_ENUM {
            let elem = self.next_elem()?;
            match elem {
                Element::Date(v) => visitor.visit_enum(SpecialAccess::new(Special::Date(v))),
                Element::Uuid(v) => visitor.visit_enum(SpecialAccess::new(Special::Uuid(v))),
                Element::BigInt(v) => visitor.visit_enum(SpecialAccess::new(Special::BigInt(v))),
                _ => Err(Error::invalid_type(
                    elem.unexpected(),
                    &"a Date, Uuid, or BigInt",
                )),
            }
        } else {
            visitor.visit_enum(EnumAccess::new(self))
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        // Counts as a single element at the current depth
        self.parser.skip_value()?;
        self.depth_tracking.update_elem(&Element::Undefined)?;
        visitor.visit_unit()
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str
        string seq map struct identifier
    }
}

#[derive(Clone, Copy, Debug)]
enum Special<'de> {
    Date(f64),
    Uuid(&'de [u8]),
    BigInt(&'de [u8]),
}

impl<'de> Special<'de> {
    fn special_type(&self) -> SpecialType {
        match self {
            Special::Date(_) => SpecialType::Date,
            Special::Uuid(_) => SpecialType::Uuid,
            Special::BigInt(_) => SpecialType::BigInt,
        }
    }
}

/// Presents a special value as a newtype variant of the special-type enum: first the variant
/// index, then the content.
struct SpecialAccess<'de> {
    special: Special<'de>,
    tag_was_read: bool,
}

impl<'de> SpecialAccess<'de> {
    fn new(special: Special<'de>) -> Self {
        Self {
            special,
            tag_was_read: false,
        }
    }
}

impl<'de> serde::de::EnumAccess<'de> for SpecialAccess<'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(mut self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let val = seed.deserialize(&mut self)?;
        Ok((val, self))
    }
}

impl<'de> serde::de::VariantAccess<'de> for SpecialAccess<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        let unexp = Unexpected::NewtypeVariant;
        Err(Error::invalid_type(unexp, &"unit variant"))
    }

    fn newtype_variant_seed<T>(mut self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(&mut self)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let unexp = Unexpected::NewtypeVariant;
        Err(Error::invalid_type(unexp, &"struct variant"))
    }

    fn tuple_variant<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let unexp = Unexpected::NewtypeVariant;
        Err(Error::invalid_type(unexp, &"tuple variant"))
    }
}

impl<'de> Deserializer<'de> for &mut SpecialAccess<'de> {
    type Error = Error;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if !self.tag_was_read {
            self.tag_was_read = true;
            visitor.visit_u64(self.special.special_type().index())
        } else {
            match self.special {
                Special::Date(v) => visitor.visit_f64(v),
                Special::Uuid(v) | Special::BigInt(v) => visitor.visit_borrowed_bytes(v),
            }
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str
        string bytes byte_buf option unit unit_struct newtype_struct
        seq tuple tuple_struct map struct enum identifier ignored_any
    }
}

/// Enums arrive either as a bare variant name, or as a single-entry Object keyed by the variant
/// name.
struct EnumAccess<'a, 'de> {
    de: &'a mut TorkenDeserializer<'de>,
    has_value: bool,
}

impl<'a, 'de> EnumAccess<'a, 'de> {
    fn new(de: &'a mut TorkenDeserializer<'de>) -> Self {
        Self {
            de,
            has_value: false,
        }
    }
}

impl<'a, 'de> serde::de::EnumAccess<'de> for EnumAccess<'a, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(mut self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let marker = self.de.parser.peek_marker()?;
        let val = match marker {
            Marker::Object => {
                if let Element::Object(n) = self.de.next_elem()? {
                    if n != 1 {
                        return Err(Error::Decode(format!(
                            "expected a single-entry Object for an enum, got {} entries",
                            n
                        )));
                    }
                }
                self.has_value = true;
                let key = self.de.parser.next_key()?;
                seed.deserialize(KeyStr(key))?
            }
            Marker::Str => {
                self.has_value = false;
                seed.deserialize(&mut *self.de)?
            }
            _ => {
                return Err(Error::Decode(
                    "expected a single-entry Object or a String for an enum".to_string(),
                ))
            }
        };
        Ok((val, self))
    }
}

impl<'a, 'de> serde::de::VariantAccess<'de> for EnumAccess<'a, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        if self.has_value {
            Err(Error::Decode(
                "invalid type: non-unit variant, expected unit variant".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        if self.has_value {
            seed.deserialize(&mut *self.de)
        } else {
            Err(Error::Decode(
                "invalid type: unit variant, expected newtype variant".to_string(),
            ))
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.has_value {
            self.de.deserialize_map(visitor)
        } else {
            Err(Error::Decode(
                "invalid type: unit variant, expected struct variant".to_string(),
            ))
        }
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.has_value {
            self.de.deserialize_tuple(len, visitor)
        } else {
            Err(Error::Decode(
                "invalid type: unit variant, expected tuple variant".to_string(),
            ))
        }
    }
}

struct SeqAccess<'a, 'de> {
    de: &'a mut TorkenDeserializer<'de>,
    size_left: usize,
}

impl<'a, 'de> SeqAccess<'a, 'de> {
    fn new(de: &'a mut TorkenDeserializer<'de>, len: usize) -> Self {
        Self { de, size_left: len }
    }

    fn end(&self) -> Result<()> {
        if self.size_left == 0 {
            Ok(())
        } else {
            Err(Error::Decode(format!(
                "array has {} more elements than the target accepts",
                self.size_left
            )))
        }
    }
}

impl<'a, 'de> serde::de::SeqAccess<'de> for SeqAccess<'a, 'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if self.size_left > 0 {
            self.size_left -= 1;
            let val = seed.deserialize(&mut *self.de)?;
            Ok(Some(val))
        } else {
            Ok(None)
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.size_left)
    }
}

#[derive(Clone, Copy)]
struct KeyStr<'de>(&'de str);

impl<'de> Deserializer<'de> for KeyStr<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_str(self.0)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str
        string bytes byte_buf option unit unit_struct newtype_struct
        seq tuple tuple_struct map struct enum identifier ignored_any
    }
}

impl<'de> fmt::Debug for KeyStr<'de> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "key {:?}", self.0)
    }
}

struct MapAccess<'a, 'de> {
    de: &'a mut TorkenDeserializer<'de>,
    size_left: usize,
}

impl<'a, 'de> MapAccess<'a, 'de> {
    fn new(de: &'a mut TorkenDeserializer<'de>, len: usize) -> Self {
        Self { de, size_left: len }
    }

    fn end(&self) -> Result<()> {
        if self.size_left == 0 {
            Ok(())
        } else {
            Err(Error::Decode(format!(
                "object has {} unread entries",
                self.size_left
            )))
        }
    }
}

impl<'a, 'de> serde::de::MapAccess<'de> for MapAccess<'a, 'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        if self.size_left > 0 {
            self.size_left -= 1;
            let key = self.de.parser.next_key()?;
            Ok(Some(seed.deserialize(KeyStr(key))?))
        } else {
            Ok(None)
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        seed.deserialize(&mut *self.de)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.size_left)
    }
}
