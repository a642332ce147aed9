use std::{fmt, str::FromStr};

use num_bigint::Sign;
use num_traits::Zero;
use serde::{
    de::{EnumAccess, Error as DeError, Unexpected, VariantAccess},
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_bytes::{ByteBuf, Bytes};

use crate::error::{Error, Result};
use crate::marker::{SpecialType, SPECIAL_TYPE_ENUM, SPECIAL_TYPE_VARIANTS};

/// An arbitrary-precision integer.
///
/// The wire form is a sign byte (0 for zero or positive, 1 for negative) followed by the
/// magnitude in little-endian byte order, with no trailing zero bytes. Zero is just the sign
/// byte.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigInt(num_bigint::BigInt);

impl BigInt {
    pub fn as_bigint(&self) -> &num_bigint::BigInt {
        &self.0
    }

    pub fn into_bigint(self) -> num_bigint::BigInt {
        self.0
    }

    /// Encode as sign byte plus little-endian magnitude.
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        if self.0.is_zero() {
            return vec![0];
        }
        let (sign, mut magnitude) = self.0.to_bytes_le();
        magnitude.insert(0, (sign == Sign::Minus) as u8);
        magnitude
    }

    /// Decode from sign byte plus little-endian magnitude. Fails if the sign byte is missing or
    /// isn't 0 or 1.
    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self> {
        let (sign, magnitude) = split_sign(bytes)?;
        let sign = if sign { Sign::Minus } else { Sign::Plus };
        Ok(BigInt(num_bigint::BigInt::from_bytes_le(sign, magnitude)))
    }

    /// Convert to an `i128`, if it fits.
    pub fn to_i128(&self) -> Option<i128> {
        i128::try_from(&self.0).ok()
    }
}

impl From<num_bigint::BigInt> for BigInt {
    fn from(v: num_bigint::BigInt) -> Self {
        BigInt(v)
    }
}

impl From<BigInt> for num_bigint::BigInt {
    fn from(v: BigInt) -> Self {
        v.0
    }
}

macro_rules! impl_bigint_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for BigInt {
                fn from(v: $t) -> Self {
                    BigInt(num_bigint::BigInt::from(v))
                }
            }
        )*
    };
}

impl_bigint_from!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128);

impl FromStr for BigInt {
    type Err = num_bigint::ParseBigIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        num_bigint::BigInt::from_str(s).map(BigInt)
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

fn split_sign(bytes: &[u8]) -> Result<(bool, &[u8])> {
    match bytes.split_first() {
        Some((0, rest)) => Ok((false, rest)),
        Some((1, rest)) => Ok((true, rest)),
        Some((sign, _)) => Err(Error::Decode(format!(
            "Got BigInt with sign byte = {}",
            sign
        ))),
        None => Err(Error::Decode("BigInt has no sign byte".to_string())),
    }
}

fn push_magnitude(out: &mut Vec<u8>, mut magnitude: u128) {
    while magnitude != 0 {
        out.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }
}

fn read_magnitude(bytes: &[u8]) -> Result<u128> {
    let mut magnitude: u128 = 0;
    for b in bytes.iter().rev() {
        if magnitude >> 120 != 0 {
            return Err(Error::Decode("BigInt too large for 128 bits".to_string()));
        }
        magnitude = (magnitude << 8) | (*b as u128);
    }
    Ok(magnitude)
}

pub(crate) fn encode_i128(v: i128) -> Vec<u8> {
    let mut out = Vec::with_capacity(17);
    out.push((v < 0) as u8);
    push_magnitude(&mut out, v.unsigned_abs());
    out
}

pub(crate) fn encode_u128(v: u128) -> Vec<u8> {
    let mut out = Vec::with_capacity(17);
    out.push(0);
    push_magnitude(&mut out, v);
    out
}

pub(crate) fn decode_i128(bytes: &[u8]) -> Result<i128> {
    let (negative, magnitude) = split_sign(bytes)?;
    let magnitude = read_magnitude(magnitude)?;
    if negative {
        if magnitude > i128::MAX as u128 + 1 {
            return Err(Error::Decode("BigInt too small for i128".to_string()));
        }
        Ok((magnitude as i128).wrapping_neg())
    } else {
        i128::try_from(magnitude).map_err(|_| Error::Decode("BigInt too large for i128".to_string()))
    }
}

pub(crate) fn decode_u128(bytes: &[u8]) -> Result<u128> {
    let (negative, magnitude) = split_sign(bytes)?;
    let magnitude = read_magnitude(magnitude)?;
    if negative && magnitude != 0 {
        return Err(Error::Decode("negative BigInt for unsigned target".to_string()));
    }
    Ok(magnitude)
}

impl Serialize for BigInt {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let special = SpecialType::BigInt;
        if serializer.is_human_readable() {
            serializer.serialize_newtype_variant(
                SPECIAL_TYPE_ENUM,
                special.index() as u32,
                special.as_str(),
                &self.0.to_string(),
            )
        } else {
            serializer.serialize_newtype_variant(
                SPECIAL_TYPE_ENUM,
                special.index() as u32,
                special.as_str(),
                Bytes::new(&self.to_wire_bytes()),
            )
        }
    }
}

impl<'de> Deserialize<'de> for BigInt {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BigIntVisitor {
            is_human_readable: bool,
        }

        impl<'de> serde::de::Visitor<'de> for BigIntVisitor {
            type Value = BigInt;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(fmt, "{} enum with variant BigInt", SPECIAL_TYPE_ENUM)
            }

            fn visit_enum<A>(self, data: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: EnumAccess<'de>,
            {
                let variant = match data.variant()? {
                    (SpecialType::BigInt, variant) => variant,
                    (e, _) => {
                        return Err(A::Error::invalid_type(
                            Unexpected::Other(e.as_str()),
                            &"BigInt",
                        ))
                    }
                };
                if self.is_human_readable {
                    let s: String = variant.newtype_variant()?;
                    BigInt::from_str(&s).map_err(A::Error::custom)
                } else {
                    let bytes: ByteBuf = variant.newtype_variant()?;
                    BigInt::from_wire_bytes(&bytes).map_err(A::Error::custom)
                }
            }
        }

        let is_human_readable = deserializer.is_human_readable();
        deserializer.deserialize_enum(
            SPECIAL_TYPE_ENUM,
            SPECIAL_TYPE_VARIANTS,
            BigIntVisitor { is_human_readable },
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wire_bytes() {
        let cases: Vec<(BigInt, Vec<u8>)> = vec![
            (BigInt::from(0), vec![0]),
            (BigInt::from(1), vec![0, 1]),
            (BigInt::from(-1), vec![1, 1]),
            (BigInt::from(256), vec![0, 0, 1]),
            (BigInt::from(-0x1234_5678i64), vec![1, 0x78, 0x56, 0x34, 0x12]),
        ];
        for (i, (v, bytes)) in cases.into_iter().enumerate() {
            println!("Test #{}", i);
            assert_eq!(v.to_wire_bytes(), bytes);
            assert_eq!(BigInt::from_wire_bytes(&bytes).unwrap(), v);
        }
    }

    #[test]
    fn matches_i128_encoding() {
        for v in [0i128, 1, -1, 255, -256, i128::MAX, i128::MIN, i64::MIN as i128] {
            println!("Value {}", v);
            let bytes = encode_i128(v);
            assert_eq!(bytes, BigInt::from(v).to_wire_bytes());
            assert_eq!(decode_i128(&bytes).unwrap(), v);
        }
        for v in [0u128, 1, u64::MAX as u128 + 1, u128::MAX] {
            let bytes = encode_u128(v);
            assert_eq!(bytes, BigInt::from(v).to_wire_bytes());
            assert_eq!(decode_u128(&bytes).unwrap(), v);
        }
    }

    #[test]
    fn out_of_range() {
        let huge = BigInt::from_str("340282366920938463463374607431768211456").unwrap();
        assert!(decode_u128(&huge.to_wire_bytes()).is_err());
        assert!(decode_u128(&encode_i128(-5)).is_err());
        assert!(decode_i128(&encode_u128(u128::MAX)).is_err());
        // Negative zero is still zero
        assert_eq!(decode_u128(&[1]).unwrap(), 0);
    }

    #[test]
    fn bad_sign() {
        assert!(BigInt::from_wire_bytes(&[]).is_err());
        assert!(BigInt::from_wire_bytes(&[2, 1]).is_err());
    }

    #[test]
    fn arbitrary_precision_roundtrip() {
        let v = BigInt::from_str("-123456789012345678901234567890123456789012345678901234567890")
            .unwrap();
        let enc = crate::to_vec(&v).unwrap();
        assert_eq!(enc[0], 0x0b);
        let dec: BigInt = crate::from_slice(&enc).unwrap();
        assert_eq!(dec, v);
    }

    #[test]
    fn human_readable() {
        let v = BigInt::from(-42);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"BigInt":"-42"}"#);
        let back: BigInt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
