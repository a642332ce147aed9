use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{
    de::{EnumAccess, Error as DeError, Unexpected, VariantAccess},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::marker::{SpecialType, SPECIAL_TYPE_ENUM, SPECIAL_TYPE_VARIANTS};

/// A point in time with millisecond precision.
///
/// On the wire this is a Date tag followed by the milliseconds since the Unix epoch as a
/// little-endian `f64`. Human-readable formats get an RFC 3339 string instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(DateTime<Utc>);

impl Date {
    /// The current time, truncated to whole milliseconds.
    pub fn now() -> Self {
        Self::truncate(Utc::now())
    }

    /// Build from milliseconds since the Unix epoch. Returns `None` if out of range.
    pub fn from_millis(ms: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(ms).map(Date)
    }

    /// Build from the floating-point millisecond count used on the wire. The fractional part is
    /// dropped.
    pub fn from_millis_f64(ms: f64) -> Option<Self> {
        if !ms.is_finite() || ms < i64::MIN as f64 || ms > i64::MAX as f64 {
            return None;
        }
        Self::from_millis(ms as i64)
    }

    pub fn millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    fn truncate(time: DateTime<Utc>) -> Self {
        DateTime::from_timestamp_millis(time.timestamp_millis())
            .map(Date)
            .unwrap_or(Date(time))
    }
}

impl From<DateTime<Utc>> for Date {
    fn from(time: DateTime<Utc>) -> Self {
        Self::truncate(time)
    }
}

impl From<Date> for DateTime<Utc> {
    fn from(date: Date) -> Self {
        date.0
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let special = SpecialType::Date;
        if serializer.is_human_readable() {
            serializer.serialize_newtype_variant(
                SPECIAL_TYPE_ENUM,
                special.index() as u32,
                special.as_str(),
                &self.to_string(),
            )
        } else {
            serializer.serialize_newtype_variant(
                SPECIAL_TYPE_ENUM,
                special.index() as u32,
                special.as_str(),
                &(self.millis() as f64),
            )
        }
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DateVisitor {
            is_human_readable: bool,
        }

        impl<'de> serde::de::Visitor<'de> for DateVisitor {
            type Value = Date;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(fmt, "{} enum with variant Date", SPECIAL_TYPE_ENUM)
            }

            fn visit_enum<A>(self, data: A) -> Result<Self::Value, A::Error>
            where
                A: EnumAccess<'de>,
            {
                let variant = match data.variant()? {
                    (SpecialType::Date, variant) => variant,
                    (e, _) => {
                        return Err(A::Error::invalid_type(
                            Unexpected::Other(e.as_str()),
                            &"Date",
                        ))
                    }
                };
                if self.is_human_readable {
                    let s: String = variant.newtype_variant()?;
                    let time = DateTime::parse_from_rfc3339(&s).map_err(A::Error::custom)?;
                    Ok(Date::from(time.with_timezone(&Utc)))
                } else {
                    let ms: f64 = variant.newtype_variant()?;
                    Date::from_millis_f64(ms).ok_or_else(|| {
                        A::Error::invalid_value(Unexpected::Float(ms), &"a representable date")
                    })
                }
            }
        }

        let is_human_readable = deserializer.is_human_readable();
        deserializer.deserialize_enum(
            SPECIAL_TYPE_ENUM,
            SPECIAL_TYPE_VARIANTS,
            DateVisitor { is_human_readable },
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn millisecond_precision() {
        let date = Date::now();
        let back = Date::from_millis(date.millis()).unwrap();
        assert_eq!(date, back);
    }

    #[test]
    fn fractional_millis_truncate() {
        let date = Date::from_millis_f64(1500.9).unwrap();
        assert_eq!(date.millis(), 1500);
        assert!(Date::from_millis_f64(f64::NAN).is_none());
        assert!(Date::from_millis_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn binary_roundtrip() {
        let date = Date::from_millis(1_700_000_000_123).unwrap();
        let enc = crate::to_vec(&date).unwrap();
        let mut expected = vec![0x0f];
        expected.extend_from_slice(&1_700_000_000_123f64.to_le_bytes());
        assert_eq!(enc, expected);
        let dec: Date = crate::from_slice(&enc).unwrap();
        assert_eq!(dec, date);
    }

    #[test]
    fn human_readable() {
        let date = Date::from_millis(86_400_001).unwrap();
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, r#"{"Date":"1970-01-02T00:00:00.001Z"}"#);
        let back: Date = serde_json::from_str(&json).unwrap();
        assert_eq!(back, date);
    }
}
