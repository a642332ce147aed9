use byteorder::{LittleEndian, ReadBytesExt};
use serde::de::Unexpected;

use crate::error::{Error, Result};
use crate::marker::Marker;
use crate::MAX_DEPTH;

/// A single encoded item. Arrays and Objects only carry their count; their contents follow as
/// further elements (with a bare key string in front of each Object value).
#[derive(Clone, Debug, PartialEq)]
pub enum Element<'a> {
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
    /// Milliseconds since the Unix epoch
    Date(f64),
    Str(&'a str),
    Uuid(&'a [u8]),
    Bin(&'a [u8]),
    /// Sign byte followed by the little-endian magnitude
    BigInt(&'a [u8]),
    Array(usize),
    Object(usize),
}

impl<'a> Element<'a> {
    pub fn name(&self) -> &'static str {
        use self::Element::*;
        match self {
            Null => "Null",
            Undefined => "Undefined",
            Bool(_) => "Bool",
            I8(_) => "Int8",
            I16(_) => "Int16",
            I32(_) => "Int32",
            I64(_) => "Int64",
            U8(_) => "Uint8",
            U16(_) => "Uint16",
            U32(_) => "Uint32",
            U64(_) => "Uint64",
            F32(_) => "Float32",
            F64(_) => "Float64",
            Date(_) => "Date",
            Str(_) => "String",
            Uuid(_) => "Uuid",
            Bin(_) => "Buffer",
            BigInt(_) => "BigInt",
            Array(_) => "Array",
            Object(_) => "Object",
        }
    }

    pub fn unexpected(&self) -> Unexpected<'_> {
        use self::Element::*;
        match self {
            Null => Unexpected::Unit,
            Undefined => Unexpected::Option,
            Bool(v) => Unexpected::Bool(*v),
            I8(v) => Unexpected::Signed(*v as i64),
            I16(v) => Unexpected::Signed(*v as i64),
            I32(v) => Unexpected::Signed(*v as i64),
            I64(v) => Unexpected::Signed(*v),
            U8(v) => Unexpected::Unsigned(*v as u64),
            U16(v) => Unexpected::Unsigned(*v as u64),
            U32(v) => Unexpected::Unsigned(*v as u64),
            U64(v) => Unexpected::Unsigned(*v),
            F32(v) => Unexpected::Float(*v as f64),
            F64(v) => Unexpected::Float(*v),
            Date(_) => Unexpected::Other("date"),
            Str(v) => Unexpected::Str(v),
            Uuid(_) => Unexpected::Other("uuid"),
            Bin(v) => Unexpected::Bytes(v),
            BigInt(_) => Unexpected::Other("bigint"),
            Array(_) => Unexpected::Seq,
            Object(_) => Unexpected::Map,
        }
    }
}

fn push_len(buf: &mut Vec<u8>, len: usize, what: &str) -> Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| Error::Encode(format!("{} length {} doesn't fit in 32 bits", what, len)))?;
    buf.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

/// Serialize an element onto a byte vector. Doesn't check if Array & Object structures make
/// sense, just writes elements out.
pub fn serialize_elem(buf: &mut Vec<u8>, elem: Element) -> Result<()> {
    use self::Element::*;
    match elem {
        Null => buf.push(Marker::Null.into()),
        Undefined => buf.push(Marker::Undefined.into()),
        Bool(v) => {
            buf.push(Marker::Bool.into());
            buf.push(v as u8);
        }
        I8(v) => {
            buf.push(Marker::Int8.into());
            buf.push(v as u8);
        }
        I16(v) => {
            buf.push(Marker::Int16.into());
            buf.extend_from_slice(&v.to_le_bytes());
        }
        I32(v) => {
            buf.push(Marker::Int32.into());
            buf.extend_from_slice(&v.to_le_bytes());
        }
        I64(v) => {
            buf.push(Marker::Int64.into());
            buf.extend_from_slice(&v.to_le_bytes());
        }
        U8(v) => {
            buf.push(Marker::UInt8.into());
            buf.push(v);
        }
        U16(v) => {
            buf.push(Marker::UInt16.into());
            buf.extend_from_slice(&v.to_le_bytes());
        }
        U32(v) => {
            buf.push(Marker::UInt32.into());
            buf.extend_from_slice(&v.to_le_bytes());
        }
        U64(v) => {
            buf.push(Marker::UInt64.into());
            buf.extend_from_slice(&v.to_le_bytes());
        }
        F32(v) => {
            buf.push(Marker::F32.into());
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        F64(v) => {
            buf.push(Marker::F64.into());
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        Date(v) => {
            buf.push(Marker::Date.into());
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        Str(v) => {
            buf.push(Marker::Str.into());
            push_len(buf, v.len(), "String")?;
            buf.extend_from_slice(v.as_bytes());
        }
        Uuid(v) => {
            if v.len() != 16 {
                return Err(Error::Encode(format!(
                    "UUID must be 16 bytes, got {}",
                    v.len()
                )));
            }
            buf.push(Marker::Uuid.into());
            buf.extend_from_slice(v);
        }
        Bin(v) => {
            if let Some(marker) = Marker::for_bin_len(v.len()) {
                buf.push(marker.into());
            } else {
                buf.push(Marker::Buffer.into());
                push_len(buf, v.len(), "Buffer")?;
            }
            buf.extend_from_slice(v);
        }
        BigInt(v) => {
            buf.push(Marker::BigInt.into());
            push_len(buf, v.len(), "BigInt")?;
            buf.extend_from_slice(v);
        }
        Array(len) => {
            buf.push(Marker::Array.into());
            push_len(buf, len, "Array")?;
        }
        Object(len) => {
            buf.push(Marker::Object.into());
            push_len(buf, len, "Object")?;
        }
    }
    Ok(())
}

/// Serialize an Object key. Keys are bare length-prefixed strings, without a type tag.
pub fn serialize_key(buf: &mut Vec<u8>, key: &str) -> Result<()> {
    push_len(buf, key.len(), "Object key")?;
    buf.extend_from_slice(key.as_bytes());
    Ok(())
}

#[derive(Clone, Debug)]
pub struct Parser<'a> {
    data: &'a [u8],
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a [u8]) -> Parser<'a> {
        Self { data }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Look at the next type tag without consuming it.
    pub fn peek_marker(&self) -> Result<Marker> {
        let tag = *self.data.first().ok_or(Error::LengthTooShort {
            step: "peek type tag",
            actual: 0,
            expected: 1,
        })?;
        Marker::from_u8(tag)
            .ok_or_else(|| Error::Decode(format!("Unrecognized type tag 0x{:02x}", tag)))
    }

    fn read_marker(&mut self) -> Result<Marker> {
        let marker = self.peek_marker()?;
        self.data = &self.data[1..];
        Ok(marker)
    }

    fn take(&mut self, len: usize, step: &'static str) -> Result<&'a [u8]> {
        if len > self.data.len() {
            return Err(Error::LengthTooShort {
                step,
                actual: self.data.len(),
                expected: len,
            });
        }
        let (bytes, data) = self.data.split_at(len);
        self.data = data;
        Ok(bytes)
    }

    fn read_len(&mut self, step: &'static str) -> Result<usize> {
        let len = self
            .data
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::LengthTooShort {
                step,
                actual: self.data.len(),
                expected: 4,
            })?;
        Ok(len as usize)
    }

    fn read_str(&mut self, step: &'static str) -> Result<&'a str> {
        let len = self.read_len(step)?;
        let bytes = self.take(len, step)?;
        std::str::from_utf8(bytes).map_err(|e| Error::Decode(format!("{} not UTF-8: {}", step, e)))
    }

    /// Read the key in front of an Object value.
    pub fn next_key(&mut self) -> Result<&'a str> {
        self.read_str("decode Object key")
    }

    /// Read the next element. A function marker is consumed together with the value it
    /// carries, and reads as `Undefined`.
    pub fn next_elem(&mut self) -> Result<Element<'a>> {
        let marker = self.read_marker()?;
        self.parse_element(marker)
    }

    /// Walk past one complete value, including everything nested inside it, without
    /// materializing any of it.
    pub fn skip_value(&mut self) -> Result<()> {
        self.skip_nested(0)
    }

    fn skip_nested(&mut self, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(Error::ParseLimit("Depth limit exceeded".to_string()));
        }
        let marker = self.read_marker()?;
        if marker == Marker::Function {
            return self.skip_nested(depth + 1);
        }
        match self.parse_element(marker)? {
            Element::Array(len) => {
                for _ in 0..len {
                    self.skip_nested(depth + 1)?;
                }
            }
            Element::Object(len) => {
                for _ in 0..len {
                    self.next_key()?;
                    self.skip_nested(depth + 1)?;
                }
            }
            _ => (),
        }
        Ok(())
    }

    // Given a retrieved marker, try to turn it into the next element, which may move through the
    // data. If we can't, error.
    fn parse_element(&mut self, marker: Marker) -> Result<Element<'a>> {
        use self::Marker::*;
        let elem = match marker {
            Unknown | Undefined => Element::Undefined,
            Null => Element::Null,
            Bool => {
                let v = self.data.read_u8().map_err(|_| Error::LengthTooShort {
                    step: "decode Bool",
                    actual: 0,
                    expected: 1,
                })?;
                match v {
                    0 => Element::Bool(false),
                    1 => Element::Bool(true),
                    v => return Err(Error::Decode(format!("Got Bool with value = {}", v))),
                }
            }
            Int8 => {
                let v = self.data.read_i8().map_err(|_| Error::LengthTooShort {
                    step: "decode Int8",
                    actual: 0,
                    expected: 1,
                })?;
                Element::I8(v)
            }
            Int16 => {
                let v = self
                    .data
                    .read_i16::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode Int16",
                        actual: self.data.len(),
                        expected: 2,
                    })?;
                Element::I16(v)
            }
            Int32 => {
                let v = self
                    .data
                    .read_i32::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode Int32",
                        actual: self.data.len(),
                        expected: 4,
                    })?;
                Element::I32(v)
            }
            Int64 => {
                let v = self
                    .data
                    .read_i64::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode Int64",
                        actual: self.data.len(),
                        expected: 8,
                    })?;
                Element::I64(v)
            }
            UInt8 => {
                let v = self.data.read_u8().map_err(|_| Error::LengthTooShort {
                    step: "decode Uint8",
                    actual: 0,
                    expected: 1,
                })?;
                Element::U8(v)
            }
            UInt16 => {
                let v = self
                    .data
                    .read_u16::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode Uint16",
                        actual: self.data.len(),
                        expected: 2,
                    })?;
                Element::U16(v)
            }
            UInt32 => {
                let v = self
                    .data
                    .read_u32::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode Uint32",
                        actual: self.data.len(),
                        expected: 4,
                    })?;
                Element::U32(v)
            }
            UInt64 => {
                let v = self
                    .data
                    .read_u64::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode Uint64",
                        actual: self.data.len(),
                        expected: 8,
                    })?;
                Element::U64(v)
            }
            F32 => {
                let v = self
                    .data
                    .read_f32::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode Float32",
                        actual: self.data.len(),
                        expected: 4,
                    })?;
                Element::F32(v)
            }
            F64 => {
                let v = self
                    .data
                    .read_f64::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode Float64",
                        actual: self.data.len(),
                        expected: 8,
                    })?;
                Element::F64(v)
            }
            Date => {
                let v = self
                    .data
                    .read_f64::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode Date",
                        actual: self.data.len(),
                        expected: 8,
                    })?;
                Element::Date(v)
            }
            Str => Element::Str(self.read_str("decode String")?),
            Uuid => Element::Uuid(self.take(16, "get Uuid content")?),
            Buffer => {
                let len = self.read_len("decode Buffer length")?;
                Element::Bin(self.take(len, "get Buffer content")?)
            }
            Byte | Word | Dword | Lword | Mword | Xword => {
                let len = marker.fixed_bin_len().unwrap_or_default();
                Element::Bin(self.take(len, "get fixed Buffer content")?)
            }
            BigInt => {
                let len = self.read_len("decode BigInt length")?;
                let bytes = self.take(len, "get BigInt content")?;
                match bytes.first() {
                    None => return Err(Error::Decode("BigInt has no sign byte".to_string())),
                    Some(sign) if *sign > 1 => {
                        return Err(Error::Decode(format!(
                            "Got BigInt with sign byte = {}",
                            sign
                        )))
                    }
                    _ => Element::BigInt(bytes),
                }
            }
            Array => {
                let len = self.read_len("decode Array length")?;
                // Every element takes at least one byte
                if len > self.data.len() {
                    return Err(Error::LengthTooShort {
                        step: "get Array content",
                        actual: self.data.len(),
                        expected: len,
                    });
                }
                Element::Array(len)
            }
            Object => {
                let len = self.read_len("decode Object length")?;
                // Every entry takes at least a key length and a type tag
                let min = len.saturating_mul(5);
                if min > self.data.len() {
                    return Err(Error::LengthTooShort {
                        step: "get Object content",
                        actual: self.data.len(),
                        expected: min,
                    });
                }
                Element::Object(len)
            }
            Function => {
                self.skip_nested(1)?;
                Element::Undefined
            }
            Custom | F16 => {
                return Err(Error::Decode(format!(
                    "Type tag 0x{:02x} is not supported",
                    marker.into_u8()
                )))
            }
        };
        Ok(elem)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn enc(elem: Element) -> Vec<u8> {
        let mut buf = Vec::new();
        serialize_elem(&mut buf, elem).unwrap();
        buf
    }

    fn roundtrip(elem: Element) {
        let buf = enc(elem.clone());
        println!("{} = {:x?}", elem.name(), buf);
        let mut parser = Parser::new(&buf);
        let val = parser.next_elem().unwrap();
        assert!(parser.is_empty());
        assert_eq!(val, elem);
    }

    #[test]
    fn unassigned_tags() {
        for tag in 0x1e..=u8::MAX {
            let data = [tag, 0, 0, 0, 0];
            let mut parser = Parser::new(&data);
            let result = parser.next_elem();
            assert!(
                matches!(result, Err(Error::Decode(_))),
                "0x{:x} should fail because it is not an assigned tag",
                tag
            );
        }
    }

    #[test]
    fn unsupported_tags() {
        for tag in [0x0e, 0x1c] {
            let data = [tag, 0, 0];
            let mut parser = Parser::new(&data);
            assert!(matches!(parser.next_elem(), Err(Error::Decode(_))));
        }
    }

    #[test]
    fn empty() {
        let mut parser = Parser::new(&[]);
        assert!(matches!(
            parser.next_elem(),
            Err(Error::LengthTooShort { .. })
        ));
    }

    mod null {
        use super::*;

        #[test]
        fn roundtrip_all() {
            roundtrip(Element::Null);
            roundtrip(Element::Undefined);
        }

        #[test]
        fn spec() {
            assert_eq!(enc(Element::Null), &[0x07]);
            assert_eq!(enc(Element::Undefined), &[0x08]);
        }

        #[test]
        fn unknown_is_undefined() {
            let mut parser = Parser::new(&[0x00]);
            assert_eq!(parser.next_elem().unwrap(), Element::Undefined);
        }
    }

    mod bool {
        use super::*;

        #[test]
        fn roundtrip_both() {
            roundtrip(Element::Bool(true));
            roundtrip(Element::Bool(false));
        }

        #[test]
        fn spec() {
            assert_eq!(enc(Element::Bool(false)), &[0x06, 0x00]);
            assert_eq!(enc(Element::Bool(true)), &[0x06, 0x01]);
        }

        #[test]
        fn not_canonical() {
            let mut parser = Parser::new(&[0x06, 0x02]);
            assert!(matches!(parser.next_elem(), Err(Error::Decode(_))));
        }

        #[test]
        fn not_enough_bytes() {
            let mut parser = Parser::new(&[0x06]);
            assert!(matches!(
                parser.next_elem(),
                Err(Error::LengthTooShort { .. })
            ));
        }
    }

    mod integer {
        use super::*;

        #[test]
        fn roundtrip_edges() {
            let cases = vec![
                Element::I8(i8::MIN),
                Element::I8(-1),
                Element::I8(i8::MAX),
                Element::I16(i16::MIN),
                Element::I16(i16::MAX),
                Element::I32(i32::MIN),
                Element::I32(0),
                Element::I32(i32::MAX),
                Element::I64(i64::MIN),
                Element::I64(i64::MAX),
                Element::U8(0),
                Element::U8(u8::MAX),
                Element::U16(u16::MAX),
                Element::U32(u32::MAX),
                Element::U64(0),
                Element::U64(u64::MAX),
            ];
            for (i, case) in cases.into_iter().enumerate() {
                println!("Test #{}", i);
                roundtrip(case);
            }
        }

        #[test]
        fn spec() {
            let cases: Vec<(Element, Vec<u8>)> = vec![
                (Element::I8(-2), vec![0x16, 0xfe]),
                (Element::I16(0x0102), vec![0x17, 0x02, 0x01]),
                (Element::I32(1), vec![0x02, 0x01, 0x00, 0x00, 0x00]),
                (
                    Element::I64(-1),
                    vec![0x03, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
                ),
                (Element::U8(200), vec![0x18, 0xc8]),
                (Element::U16(0x0102), vec![0x19, 0x02, 0x01]),
                (Element::U32(0x01020304), vec![0x1a, 0x04, 0x03, 0x02, 0x01]),
                (
                    Element::U64(1),
                    vec![0x1b, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
                ),
            ];
            for (i, (elem, expected)) in cases.into_iter().enumerate() {
                println!("Test #{}", i);
                assert_eq!(enc(elem), expected);
            }
        }

        #[test]
        fn not_enough_bytes() {
            let cases: Vec<Vec<u8>> = vec![
                vec![0x16],
                vec![0x17, 0x00],
                vec![0x02, 0x00, 0x00, 0x00],
                vec![0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
                vec![0x18],
                vec![0x19, 0x00],
                vec![0x1a, 0x00, 0x00],
                vec![0x1b, 0x00, 0x00, 0x00, 0x00],
            ];
            for (i, case) in cases.iter().enumerate() {
                println!("Test #{}", i);
                let mut parser = Parser::new(case);
                assert!(matches!(
                    parser.next_elem(),
                    Err(Error::LengthTooShort { .. })
                ));
            }
        }
    }

    mod float {
        use super::*;

        #[test]
        fn roundtrip_values() {
            roundtrip(Element::F32(1.5));
            roundtrip(Element::F32(f32::MIN_POSITIVE));
            roundtrip(Element::F64(-1.0e300));
            roundtrip(Element::Date(1_700_000_000_123.0));
        }

        #[test]
        fn spec() {
            assert_eq!(enc(Element::F32(1.0)), &[0x04, 0x00, 0x00, 0x80, 0x3f]);
            let mut expected = vec![0x05];
            expected.extend_from_slice(&1.0f64.to_le_bytes());
            assert_eq!(enc(Element::F64(1.0)), expected);
            let mut expected = vec![0x0f];
            expected.extend_from_slice(&1000.0f64.to_le_bytes());
            assert_eq!(enc(Element::Date(1000.0)), expected);
        }
    }

    mod string {
        use super::*;

        #[test]
        fn roundtrip_strs() {
            roundtrip(Element::Str(""));
            roundtrip(Element::Str("hello"));
            roundtrip(Element::Str("Grüße, 世界"));
        }

        #[test]
        fn spec() {
            assert_eq!(
                enc(Element::Str("abc")),
                &[0x01, 0x03, 0x00, 0x00, 0x00, b'a', b'b', b'c']
            );
        }

        #[test]
        fn not_enough_bytes() {
            let mut parser = Parser::new(&[0x01, 0x04, 0x00, 0x00, 0x00, b'a', b'b']);
            assert!(matches!(
                parser.next_elem(),
                Err(Error::LengthTooShort { .. })
            ));
        }

        #[test]
        fn bad_utf8() {
            let mut parser = Parser::new(&[0x01, 0x02, 0x00, 0x00, 0x00, 0xc3, 0x28]);
            assert!(matches!(parser.next_elem(), Err(Error::Decode(_))));
        }
    }

    mod bin {
        use super::*;

        #[test]
        fn fixed_tags() {
            let data = [0xa5u8; 20];
            let cases = [
                (1, 0x10),
                (2, 0x11),
                (4, 0x12),
                (8, 0x13),
                (12, 0x14),
                (16, 0x15),
            ];
            for (len, tag) in cases {
                println!("Test len {}", len);
                let buf = enc(Element::Bin(&data[..len]));
                assert_eq!(buf[0], tag);
                assert_eq!(buf.len(), len + 1);
                roundtrip(Element::Bin(&data[..len]));
            }
        }

        #[test]
        fn variable_tags() {
            let data = [0x5au8; 40];
            for len in [0, 3, 5, 9, 15, 17, 40] {
                println!("Test len {}", len);
                let buf = enc(Element::Bin(&data[..len]));
                assert_eq!(buf[0], 0x0c);
                assert_eq!(&buf[1..5], &(len as u32).to_le_bytes());
                assert_eq!(buf.len(), len + 5);
                roundtrip(Element::Bin(&data[..len]));
            }
        }

        #[test]
        fn uuid() {
            let data = [7u8; 16];
            let buf = enc(Element::Uuid(&data));
            assert_eq!(buf[0], 0x1d);
            assert_eq!(buf.len(), 17);
            roundtrip(Element::Uuid(&data));
            let mut out = Vec::new();
            assert!(serialize_elem(&mut out, Element::Uuid(&data[..15])).is_err());
        }

        #[test]
        fn not_enough_bytes() {
            let cases: Vec<Vec<u8>> = vec![
                vec![0x10],
                vec![0x15, 0x00, 0x00],
                vec![0x1d, 0x00],
                vec![0x0c, 0x05, 0x00, 0x00, 0x00, 0x01],
                vec![0x0c, 0x05, 0x00],
            ];
            for (i, case) in cases.iter().enumerate() {
                println!("Test #{}", i);
                let mut parser = Parser::new(case);
                assert!(matches!(
                    parser.next_elem(),
                    Err(Error::LengthTooShort { .. })
                ));
            }
        }
    }

    mod bigint {
        use super::*;

        #[test]
        fn roundtrip_payloads() {
            roundtrip(Element::BigInt(&[0]));
            roundtrip(Element::BigInt(&[1, 0xff, 0x01]));
        }

        #[test]
        fn spec() {
            assert_eq!(
                enc(Element::BigInt(&[1, 0x05])),
                &[0x0b, 0x02, 0x00, 0x00, 0x00, 0x01, 0x05]
            );
        }

        #[test]
        fn malformed() {
            let mut parser = Parser::new(&[0x0b, 0x00, 0x00, 0x00, 0x00]);
            assert!(matches!(parser.next_elem(), Err(Error::Decode(_))));
            let mut parser = Parser::new(&[0x0b, 0x02, 0x00, 0x00, 0x00, 0x02, 0x01]);
            assert!(matches!(parser.next_elem(), Err(Error::Decode(_))));
        }
    }

    mod structure {
        use super::*;

        #[test]
        fn spec() {
            assert_eq!(
                enc(Element::Array(2)),
                &[0x09, 0x02, 0x00, 0x00, 0x00]
            );
            assert_eq!(
                enc(Element::Object(1)),
                &[0x0a, 0x01, 0x00, 0x00, 0x00]
            );
            let mut buf = Vec::new();
            serialize_key(&mut buf, "id").unwrap();
            assert_eq!(buf, &[0x02, 0x00, 0x00, 0x00, b'i', b'd']);
        }

        #[test]
        fn count_too_large() {
            let mut parser = Parser::new(&[0x09, 0xff, 0xff, 0xff, 0xff, 0x07]);
            assert!(matches!(
                parser.next_elem(),
                Err(Error::LengthTooShort { .. })
            ));
            let mut parser = Parser::new(&[0x0a, 0x02, 0x00, 0x00, 0x00, 0x07, 0x07, 0x07]);
            assert!(matches!(
                parser.next_elem(),
                Err(Error::LengthTooShort { .. })
            ));
        }

        #[test]
        fn skip_nested() {
            let mut buf = Vec::new();
            serialize_elem(&mut buf, Element::Object(2)).unwrap();
            serialize_key(&mut buf, "a").unwrap();
            serialize_elem(&mut buf, Element::Array(2)).unwrap();
            serialize_elem(&mut buf, Element::Str("x")).unwrap();
            serialize_elem(&mut buf, Element::Bin(&[1, 2, 3])).unwrap();
            serialize_key(&mut buf, "b").unwrap();
            serialize_elem(&mut buf, Element::U64(9)).unwrap();
            serialize_elem(&mut buf, Element::Bool(true)).unwrap();

            let mut parser = Parser::new(&buf);
            parser.skip_value().unwrap();
            assert_eq!(parser.next_elem().unwrap(), Element::Bool(true));
            assert!(parser.is_empty());
        }

        #[test]
        fn skip_truncated() {
            let mut buf = Vec::new();
            serialize_elem(&mut buf, Element::Array(3)).unwrap();
            serialize_elem(&mut buf, Element::Null).unwrap();
            serialize_elem(&mut buf, Element::Null).unwrap();
            let mut parser = Parser::new(&buf);
            assert!(parser.skip_value().is_err());
        }

        #[test]
        fn skip_depth_limit() {
            let mut buf = Vec::new();
            for _ in 0..(MAX_DEPTH + 2) {
                serialize_elem(&mut buf, Element::Array(1)).unwrap();
            }
            serialize_elem(&mut buf, Element::Null).unwrap();
            let mut parser = Parser::new(&buf);
            assert!(matches!(parser.skip_value(), Err(Error::ParseLimit(_))));
        }
    }

    mod function {
        use super::*;

        #[test]
        fn body_is_skipped() {
            let mut buf = vec![0x0d];
            serialize_elem(&mut buf, Element::Str("() => 1")).unwrap();
            serialize_elem(&mut buf, Element::I32(5)).unwrap();
            let mut parser = Parser::new(&buf);
            assert_eq!(parser.next_elem().unwrap(), Element::Undefined);
            assert_eq!(parser.next_elem().unwrap(), Element::I32(5));
        }

        #[test]
        fn chained_markers_hit_limit() {
            let buf = vec![0x0du8; MAX_DEPTH + 10];
            let mut parser = Parser::new(&buf);
            assert!(parser.next_elem().is_err());
        }
    }

    #[test]
    fn unexpected_borrows_contents() {
        let text = String::from("ab");
        let elem = Element::Str(&text);
        assert_eq!(elem.unexpected(), Unexpected::Str("ab"));
        assert_eq!(Element::U16(7).unexpected(), Unexpected::Unsigned(7));
        assert_eq!(Element::Date(1.0).unexpected(), Unexpected::Other("date"));
    }
}
