//! Serialization.
//!
//! Integers keep their exact width on the wire, `i128`/`u128` become BigInts, and byte strings
//! pick a fixed-size tag when their length allows one. `None` is written as Undefined while unit
//! values are written as Null.
//!
//! Enum variants, when mapped, are:
//! - Unit - Just the variant name as a string
//! - Newtype - Object with one entry. Key is variant name, content is the value
//! - Tuple - Object with one entry. Key is variant name, content is the tuple as an array
//! - Struct - Object with one entry. Key is variant name, content is the struct
//!
//! Map and struct entries are written in the order they are visited.

use serde::ser::*;
use std::mem;

use crate::element::*;
use crate::marker::{SpecialType, SPECIAL_TYPE_ENUM};

use crate::error::{Error, Result};

use crate::depth_tracking::DepthTracker;

/// Serialize a value into a byte vector.
///
/// Struct fields are written under their serde names: the `#[serde(rename = "...")]` name when
/// one is given, the Rust field name otherwise. Only fields marked `#[serde(skip)]` (or
/// skipped by `skip_serializing_if`) are left out.
///
/// Fails if a map has keys that aren't strings, if a length doesn't fit in 32 bits, if the value
/// nests deeper than [`MAX_DEPTH`](crate::MAX_DEPTH), or if the value's own `Serialize`
/// implementation raises an error.
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut se = TorkenSerializer::default();
    value.serialize(&mut se)?;
    Ok(se.buf)
}

#[derive(Default)]
struct TorkenSerializer {
    depth_tracking: DepthTracker,
    buf: Vec<u8>,
}

impl TorkenSerializer {
    fn encode_element(&mut self, elem: Element) -> Result<()> {
        self.depth_tracking.update_elem(&elem)?;
        serialize_elem(&mut self.buf, elem)
    }

    fn encode_key(&mut self, key: &str) -> Result<()> {
        serialize_key(&mut self.buf, key)
    }

    fn encode_i128(&mut self, v: i128) -> Result<()> {
        let bytes = crate::big_int::encode_i128(v);
        self.encode_element(Element::BigInt(&bytes))
    }

    fn encode_u128(&mut self, v: u128) -> Result<()> {
        let bytes = crate::big_int::encode_u128(v);
        self.encode_element(Element::BigInt(&bytes))
    }
}

impl<'a> Serializer for &'a mut TorkenSerializer {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = SeqSerializer<'a>;
    type SerializeTuple = TupleSerializer<'a>;
    type SerializeTupleStruct = TupleSerializer<'a>;
    type SerializeTupleVariant = TupleSerializer<'a>;
    type SerializeMap = MapSerializer<'a>;
    type SerializeStruct = StructSerializer<'a>;
    type SerializeStructVariant = StructSerializer<'a>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.encode_element(Element::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.encode_element(Element::I8(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.encode_element(Element::I16(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.encode_element(Element::I32(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.encode_element(Element::I64(v))
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.encode_i128(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.encode_element(Element::U8(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.encode_element(Element::U16(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.encode_element(Element::U32(v))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.encode_element(Element::U64(v))
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.encode_u128(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.encode_element(Element::F32(v))
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.encode_element(Element::F64(v))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut tmp = [0u8; 4];
        self.encode_element(Element::Str(v.encode_utf8(&mut tmp)))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.encode_element(Element::Str(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.encode_element(Element::Bin(v))
    }

    fn serialize_none(self) -> Result<()> {
        self.encode_element(Element::Undefined)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, v: &T) -> Result<()> {
        v.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.encode_element(Element::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        v: &T,
    ) -> Result<()> {
        v.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        if name == SPECIAL_TYPE_ENUM {
            let special = SpecialType::from_index(variant_index as u64).ok_or_else(|| {
                Error::Encode(format!("unrecognized special type variant {}", variant))
            })?;
            let mut special_se = SpecialSerializer::new(special, self);
            value.serialize(&mut special_se)?;
            special_se.finish()
        } else {
            self.encode_element(Element::Object(1))?;
            self.encode_key(variant)?;
            value.serialize(self)
        }
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        SeqSerializer::new(self, len)
    }

    fn serialize_tuple(self, len: usize) -> Result<TupleSerializer<'a>> {
        self.encode_element(Element::Array(len))?;
        Ok(TupleSerializer::new(self))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<TupleSerializer<'a>> {
        self.encode_element(Element::Array(len))?;
        Ok(TupleSerializer::new(self))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.encode_element(Element::Object(1))?;
        self.encode_key(variant)?;
        self.encode_element(Element::Array(len))?;
        Ok(TupleSerializer::new(self))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        MapSerializer::new(self, len)
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.encode_element(Element::Object(len))?;
        Ok(StructSerializer::new(self))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.encode_element(Element::Object(1))?;
        self.encode_key(variant)?;
        self.encode_element(Element::Object(len))?;
        Ok(StructSerializer::new(self))
    }
}

/// Writes a sequence. Without a length hint the Array header can't go first, so elements are
/// counted into a side buffer that gets spliced in behind the real header at `end`. A placeholder
/// Array holds the depth slot in the meantime.
struct SeqSerializer<'a> {
    se: &'a mut TorkenSerializer,
    unknown_len: Option<(usize, Vec<u8>)>,
}

impl<'a> SeqSerializer<'a> {
    fn new(se: &'a mut TorkenSerializer, len: Option<usize>) -> Result<Self> {
        if let Some(len) = len {
            se.encode_element(Element::Array(len))?;
            Ok(Self {
                se,
                unknown_len: None,
            })
        } else {
            se.depth_tracking
                .update_elem(&Element::Array(u32::MAX as usize))?;
            let enc = mem::take(&mut se.buf);
            Ok(Self {
                se,
                unknown_len: Some((0, enc)),
            })
        }
    }
}

impl<'a> SerializeSeq for SeqSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        if let Some((ref mut len, _)) = self.unknown_len {
            *len += 1;
        }
        value.serialize(&mut *self.se)
    }

    fn end(self) -> Result<()> {
        if let Some((len, enc)) = self.unknown_len {
            let enc = mem::replace(&mut self.se.buf, enc);
            serialize_elem(&mut self.se.buf, Element::Array(len))?;
            self.se.buf.extend_from_slice(&enc);
            self.se.depth_tracking.early_end();
        }
        Ok(())
    }
}

struct TupleSerializer<'a> {
    se: &'a mut TorkenSerializer,
}

impl<'a> TupleSerializer<'a> {
    fn new(se: &'a mut TorkenSerializer) -> Self {
        Self { se }
    }
}

impl<'a> SerializeTuple for TupleSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.se)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> SerializeTupleStruct for TupleSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.se)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> SerializeTupleVariant for TupleSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.se)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Map encoding. Sized maps write straight through; unsized ones go through a temporary buffer
/// the same way [`SeqSerializer`] does.
struct MapSerializer<'a> {
    se: &'a mut TorkenSerializer,
    key: String,
    unknown_len: Option<(usize, Vec<u8>)>,
}

impl<'a> MapSerializer<'a> {
    fn new(se: &'a mut TorkenSerializer, len: Option<usize>) -> Result<Self> {
        if let Some(len) = len {
            se.encode_element(Element::Object(len))?;
            Ok(Self {
                se,
                key: String::new(),
                unknown_len: None,
            })
        } else {
            se.depth_tracking
                .update_elem(&Element::Object(u32::MAX as usize))?;
            let enc = mem::take(&mut se.buf);
            Ok(Self {
                se,
                key: String::new(),
                unknown_len: Some((0, enc)),
            })
        }
    }
}

impl<'a> SerializeMap for MapSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        if let Some((ref mut len, _)) = self.unknown_len {
            *len += 1;
        }
        // Turn the key into a String or fail (this clears out the string before serializing)
        value.serialize(KeySerializer::new(&mut self.key))?;
        self.se.encode_key(&self.key)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.se)
    }

    fn end(self) -> Result<()> {
        if let Some((len, enc)) = self.unknown_len {
            let enc = mem::replace(&mut self.se.buf, enc);
            serialize_elem(&mut self.se.buf, Element::Object(len))?;
            self.se.buf.extend_from_slice(&enc);
            self.se.depth_tracking.early_end();
        }
        Ok(())
    }
}

struct StructSerializer<'a> {
    se: &'a mut TorkenSerializer,
}

impl<'a> StructSerializer<'a> {
    fn new(se: &'a mut TorkenSerializer) -> Self {
        Self { se }
    }

    fn serialize_field_inner<T: Serialize + ?Sized>(
        &mut self,
        field: &'static str,
        value: &T,
    ) -> Result<()> {
        self.se.encode_key(field)?;
        value.serialize(&mut *self.se)
    }
}

impl<'a> SerializeStruct for StructSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        field: &'static str,
        value: &T,
    ) -> Result<()> {
        self.serialize_field_inner(field, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> SerializeStructVariant for StructSerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        field: &'static str,
        value: &T,
    ) -> Result<()> {
        self.serialize_field_inner(field, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Fills in serializer methods that only ever fail with `ser_fail`.
macro_rules! reject {
    ($($method:ident($($arg:ty),*) -> $ret:ty = $what:literal;)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<$ret> {
                Err(self.ser_fail($what))
            }
        )*
    };
}

/// Receives the inner value of a special type: milliseconds for a Date, raw bytes for a Uuid or
/// BigInt. Anything else is an error.
struct SpecialSerializer<'a> {
    special: SpecialType,
    received: bool,
    se: &'a mut TorkenSerializer,
}

impl<'a> SpecialSerializer<'a> {
    fn new(special: SpecialType, se: &'a mut TorkenSerializer) -> Self {
        Self {
            special,
            received: false,
            se,
        }
    }

    fn ser_fail(&self, received: &'static str) -> Error {
        let expected = match self.special {
            SpecialType::Date => "f64",
            SpecialType::Uuid | SpecialType::BigInt => "bytes",
        };
        Error::Encode(format!(
            "expected {} for {:?}, received {}",
            expected, self.special, received
        ))
    }

    fn finish(self) -> Result<()> {
        if self.received {
            Ok(())
        } else {
            Err(Error::Encode(format!("{:?} had no content", self.special)))
        }
    }
}

impl<'a, 'b> Serializer for &'b mut SpecialSerializer<'a> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Impossible<(), Error>;
    type SerializeTuple = Impossible<(), Error>;
    type SerializeTupleStruct = Impossible<(), Error>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Impossible<(), Error>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        if self.received {
            return Err(self.ser_fail("a second value"));
        }
        if self.special != SpecialType::Date {
            return Err(self.ser_fail("f64"));
        }
        self.received = true;
        self.se.encode_element(Element::Date(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        if self.received {
            return Err(self.ser_fail("a second value"));
        }
        let elem = match self.special {
            SpecialType::Date => return Err(self.ser_fail("bytes")),
            SpecialType::Uuid => Element::Uuid(v),
            SpecialType::BigInt => {
                match v.first() {
                    Some(0) | Some(1) => (),
                    _ => {
                        return Err(Error::Encode(
                            "BigInt bytes must start with a 0 or 1 sign byte".to_string(),
                        ))
                    }
                }
                Element::BigInt(v)
            }
        };
        self.received = true;
        self.se.encode_element(elem)
    }

    reject! {
        serialize_bool(bool) -> () = "bool";
        serialize_i8(i8) -> () = "i8";
        serialize_i16(i16) -> () = "i16";
        serialize_i32(i32) -> () = "i32";
        serialize_i64(i64) -> () = "i64";
        serialize_u8(u8) -> () = "u8";
        serialize_u16(u16) -> () = "u16";
        serialize_u32(u32) -> () = "u32";
        serialize_u64(u64) -> () = "u64";
        serialize_f32(f32) -> () = "f32";
        serialize_char(char) -> () = "char";
        serialize_str(&str) -> () = "str";
        serialize_none() -> () = "None";
        serialize_unit() -> () = "unit";
        serialize_unit_struct(&'static str) -> () = "unit_struct";
        serialize_unit_variant(&'static str, u32, &'static str) -> () = "unit_variant";
        serialize_seq(Option<usize>) -> Self::SerializeSeq = "seq";
        serialize_tuple(usize) -> Self::SerializeTuple = "tuple";
        serialize_tuple_struct(&'static str, usize) -> Self::SerializeTupleStruct = "tuple_struct";
        serialize_tuple_variant(&'static str, u32, &'static str, usize) -> Self::SerializeTupleVariant = "tuple_variant";
        serialize_map(Option<usize>) -> Self::SerializeMap = "map";
        serialize_struct(&'static str, usize) -> Self::SerializeStruct = "struct";
        serialize_struct_variant(&'static str, u32, &'static str, usize) -> Self::SerializeStructVariant = "struct_variant";
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _: &T) -> Result<()> {
        Err(self.ser_fail("Some"))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        v: &T,
    ) -> Result<()> {
        v.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(self.ser_fail("newtype_variant"))
    }
}

/// Map keys must be strings. Chars, unit enum variants and newtypes around strings are accepted
/// as well, since they serialize as strings everywhere else.
struct KeySerializer<'a> {
    s: &'a mut String,
}

impl<'a> KeySerializer<'a> {
    fn new(s: &'a mut String) -> Self {
        s.clear();
        Self { s }
    }

    fn ser_fail(&self, received: &'static str) -> Error {
        Error::Encode(format!("map keys must be strings, received {}", received))
    }
}

impl<'a> Serializer for KeySerializer<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_char(self, v: char) -> Result<()> {
        self.s.push(v);
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.s.push_str(v);
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.s.push_str(variant);
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        v: &T,
    ) -> Result<()> {
        v.serialize(self)
    }

    type SerializeSeq = Impossible<(), Error>;
    type SerializeTuple = Impossible<(), Error>;
    type SerializeTupleStruct = Impossible<(), Error>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Impossible<(), Error>;
    type SerializeStructVariant = Impossible<(), Error>;

    fn is_human_readable(&self) -> bool {
        false
    }

    reject! {
        serialize_bool(bool) -> () = "bool";
        serialize_i8(i8) -> () = "i8";
        serialize_i16(i16) -> () = "i16";
        serialize_i32(i32) -> () = "i32";
        serialize_i64(i64) -> () = "i64";
        serialize_u8(u8) -> () = "u8";
        serialize_u16(u16) -> () = "u16";
        serialize_u32(u32) -> () = "u32";
        serialize_u64(u64) -> () = "u64";
        serialize_f32(f32) -> () = "f32";
        serialize_f64(f64) -> () = "f64";
        serialize_bytes(&[u8]) -> () = "bytes";
        serialize_none() -> () = "None";
        serialize_unit() -> () = "unit";
        serialize_unit_struct(&'static str) -> () = "unit_struct";
        serialize_seq(Option<usize>) -> Self::SerializeSeq = "seq";
        serialize_tuple(usize) -> Self::SerializeTuple = "tuple";
        serialize_tuple_struct(&'static str, usize) -> Self::SerializeTupleStruct = "tuple_struct";
        serialize_tuple_variant(&'static str, u32, &'static str, usize) -> Self::SerializeTupleVariant = "tuple_variant";
        serialize_map(Option<usize>) -> Self::SerializeMap = "map";
        serialize_struct(&'static str, usize) -> Self::SerializeStruct = "struct";
        serialize_struct_variant(&'static str, u32, &'static str, usize) -> Self::SerializeStructVariant = "struct_variant";
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _: &T) -> Result<()> {
        Err(self.ser_fail("Some"))
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(self.ser_fail("newtype_variant"))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Serialize;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn exact_integer_widths() {
        assert_eq!(to_vec(&5i8).unwrap(), &[0x16, 0x05]);
        assert_eq!(to_vec(&5u16).unwrap(), &[0x19, 0x05, 0x00]);
        assert_eq!(to_vec(&-1i32).unwrap(), &[0x02, 0xff, 0xff, 0xff, 0xff]);
        let enc = to_vec(&-1i64).unwrap();
        assert_eq!(enc[0], 0x03);
        assert_eq!(enc.len(), 9);
        let enc = to_vec(&1u64).unwrap();
        assert_eq!(enc[0], 0x1b);
    }

    #[test]
    fn wide_integers_are_bigints() {
        assert_eq!(
            to_vec(&-258i128).unwrap(),
            &[0x0b, 0x03, 0x00, 0x00, 0x00, 0x01, 0x02, 0x01]
        );
        assert_eq!(to_vec(&0u128).unwrap(), &[0x0b, 0x01, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn absent_values() {
        assert_eq!(to_vec(&()).unwrap(), &[0x07]);
        assert_eq!(to_vec(&Option::<u8>::None).unwrap(), &[0x08]);
        assert_eq!(to_vec(&Some(3u8)).unwrap(), &[0x18, 0x03]);
    }

    #[test]
    fn byte_strings() {
        let enc = to_vec(serde_bytes::Bytes::new(&[1, 2, 3, 4])).unwrap();
        assert_eq!(enc, &[0x12, 1, 2, 3, 4]);
        let enc = to_vec(serde_bytes::Bytes::new(&[9; 3])).unwrap();
        assert_eq!(enc, &[0x0c, 0x03, 0x00, 0x00, 0x00, 9, 9, 9]);
        // Plain vectors of bytes are sequences, not byte strings
        let enc = to_vec(&vec![1u8, 2]).unwrap();
        assert_eq!(enc, &[0x09, 0x02, 0x00, 0x00, 0x00, 0x18, 0x01, 0x18, 0x02]);
    }

    #[test]
    fn struct_field_names() {
        #[derive(Serialize)]
        struct Claims {
            #[serde(rename = "sub")]
            subject: String,
            #[serde(skip)]
            _cache: u32,
            admin: bool,
        }

        let enc = to_vec(&Claims {
            subject: "ab".into(),
            _cache: 7,
            admin: true,
        })
        .unwrap();
        let expected: Vec<u8> = vec![
            0x0a, 0x02, 0x00, 0x00, 0x00, // Object, 2 entries
            0x03, 0x00, 0x00, 0x00, b's', b'u', b'b', // key "sub"
            0x01, 0x02, 0x00, 0x00, 0x00, b'a', b'b', // "ab"
            0x05, 0x00, 0x00, 0x00, b'a', b'd', b'm', b'i', b'n', // key "admin"
            0x06, 0x01, // true
        ];
        assert_eq!(enc, expected);
    }

    #[test]
    fn non_string_keys() {
        let mut map = BTreeMap::new();
        map.insert(1u32, "one");
        let err = to_vec(&map).unwrap_err();
        assert!(matches!(err, Error::Encode(_)), "got {:?}", err);

        let mut map = HashMap::new();
        map.insert((1u8, 2u8), true);
        assert!(matches!(to_vec(&map), Err(Error::Encode(_))));
    }

    #[test]
    fn unsized_sequences() {
        struct Unsized(Vec<u16>);
        impl Serialize for Unsized {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                let mut seq = serializer.serialize_seq(None)?;
                for v in self.0.iter() {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
        }
        let enc = to_vec(&(Unsized(vec![1, 2]), true)).unwrap();
        let expected: Vec<u8> = vec![
            0x09, 0x02, 0x00, 0x00, 0x00, // outer tuple
            0x09, 0x02, 0x00, 0x00, 0x00, // inner sequence
            0x19, 0x01, 0x00, 0x19, 0x02, 0x00, 0x06, 0x01,
        ];
        assert_eq!(enc, expected);
    }

    #[test]
    fn enum_variants() {
        #[derive(Serialize)]
        enum Role {
            Guest,
            Member(u8),
        }
        assert_eq!(
            to_vec(&Role::Guest).unwrap(),
            &[0x01, 0x05, 0x00, 0x00, 0x00, b'G', b'u', b'e', b's', b't']
        );
        let enc = to_vec(&Role::Member(2)).unwrap();
        let mut expected = vec![0x0a, 0x01, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00];
        expected.extend_from_slice(b"Member");
        expected.extend_from_slice(&[0x18, 0x02]);
        assert_eq!(enc, expected);
    }

    #[test]
    fn depth_limit() {
        let mut value = serde_json::Value::Null;
        for _ in 0..(crate::MAX_DEPTH + 1) {
            value = serde_json::Value::Array(vec![value]);
        }
        assert!(matches!(to_vec(&value), Err(Error::ParseLimit(_))));
    }
}
