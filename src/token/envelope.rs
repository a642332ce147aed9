//! The byte layout of a token, before scrambling and text encoding.
//!
//! ```text
//! vhead (1) | identifier (12, only if flagged) | nonce (16) | ciphertext (rest)
//! ```
//!
//! `vhead` packs the version into bits 0-3, the algorithm into bits 4-6, and the identifier flag
//! into bit 7. The nonce is the little-endian `valid_from` and `expires_in` (4 bytes each)
//! followed by the 8-byte checksum over
//! `vhead | identifier | valid_from | expires_in | plaintext`.

use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Utc};
use serde::de::{Deserialize, DeserializeOwned};

use super::identifier::{Identifier, IDENTIFIER_LEN};
use crate::crypto::{Algorithm, Checksummer, CHECKSUM_LEN, NONCE_LEN};
use crate::error::{Error, Result};
use crate::marker::Marker;

const IDENTIFIER_FLAG: u8 = 0x80;

/// The decoded header byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub version: u8,
    pub algorithm: Algorithm,
    pub has_identifier: bool,
}

impl Header {
    pub fn new(version: u8, algorithm: Algorithm, has_identifier: bool) -> Result<Self> {
        if version > 0x0f {
            return Err(Error::Encode(format!(
                "version {} doesn't fit in 4 bits",
                version
            )));
        }
        Ok(Self {
            version,
            algorithm,
            has_identifier,
        })
    }

    pub fn to_byte(self) -> u8 {
        let flag = if self.has_identifier {
            IDENTIFIER_FLAG
        } else {
            0
        };
        self.version | (self.algorithm.into_u8() << 4) | flag
    }

    pub fn from_byte(vhead: u8) -> Result<Self> {
        let algorithm_bits = (vhead >> 4) & 0x07;
        let algorithm = Algorithm::from_u8(algorithm_bits).ok_or_else(|| {
            Error::Decode(format!("unknown token algorithm {}", algorithm_bits))
        })?;
        Ok(Self {
            version: vhead & 0x0f,
            algorithm,
            has_identifier: vhead & IDENTIFIER_FLAG != 0,
        })
    }

    /// Total bytes before the ciphertext.
    pub fn prefix_len(self) -> usize {
        let id_len = if self.has_identifier {
            IDENTIFIER_LEN
        } else {
            0
        };
        1 + id_len + NONCE_LEN
    }
}

/// The checksum binding the header, identifier, and validity window to the plaintext.
pub(crate) fn envelope_checksum(
    vhead: u8,
    identifier: &Identifier,
    valid_from: u32,
    expires_in: u32,
    plaintext: &[u8],
) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Checksummer::new();
    hasher
        .update(&[vhead])
        .update(identifier.as_bytes())
        .update(&valid_from.to_le_bytes())
        .update(&expires_in.to_le_bytes())
        .update(plaintext);
    hasher.finalize()
}

pub(crate) fn build_nonce(
    valid_from: u32,
    expires_in: u32,
    checksum: &[u8; CHECKSUM_LEN],
) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    LittleEndian::write_u32(&mut nonce[0..4], valid_from);
    LittleEndian::write_u32(&mut nonce[4..8], expires_in);
    nonce[8..].copy_from_slice(checksum);
    nonce
}

/// Assemble the unscrambled envelope.
pub(crate) fn assemble(
    header: Header,
    identifier: &Identifier,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(header.prefix_len() + ciphertext.len());
    buf.push(header.to_byte());
    buf.extend_from_slice(identifier.as_bytes());
    buf.extend_from_slice(nonce);
    buf.extend_from_slice(ciphertext);
    buf
}

/// Whether `now` falls in the window. A zero `expires_in` never expires.
pub(crate) fn window_contains(valid_from: u32, expires_in: u32, now: i64) -> bool {
    if expires_in == 0 {
        return true;
    }
    let start = valid_from as i64;
    let end = start + expires_in as i64;
    now >= start && now < end
}

fn unix_time(secs: u32) -> DateTime<Utc> {
    DateTime::from_timestamp(secs.into(), 0).unwrap_or_default()
}

/// A parsed but not yet decrypted token.
///
/// Produced by [`Tokenizer::begin`](super::Tokenizer::begin). Everything here comes straight
/// from the token and is unauthenticated until [`Tokenizer::finalize`](super::Tokenizer::finalize)
/// has checked the checksum.
#[derive(Clone, Debug)]
pub struct Intermediate {
    pub(crate) header: Header,
    pub(crate) vhead: u8,
    pub(crate) identifier: Identifier,
    pub(crate) nonce: [u8; NONCE_LEN],
    pub(crate) ciphertext: Vec<u8>,
    pub(crate) valid_from: u32,
    pub(crate) expires_in: u32,
    pub(crate) is_valid: bool,
}

impl Intermediate {
    /// Split an unscrambled envelope into its fields, checking the window against `now`.
    pub(crate) fn parse(bytes: &[u8], now: i64) -> Result<Self> {
        let vhead = *bytes.first().ok_or(Error::LengthTooShort {
            step: "decode token header",
            actual: 0,
            expected: 1,
        })?;
        let header = Header::from_byte(vhead)?;
        let prefix_len = header.prefix_len();
        if bytes.len() < prefix_len {
            return Err(Error::LengthTooShort {
                step: "decode token envelope",
                actual: bytes.len(),
                expected: prefix_len,
            });
        }

        let (identifier, rest) = if header.has_identifier {
            let (id, rest) = bytes[1..].split_at(IDENTIFIER_LEN);
            (Identifier::from_bytes(id)?, rest)
        } else {
            (Identifier::anonymous(), &bytes[1..])
        };
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);

        let valid_from = LittleEndian::read_u32(&nonce[0..4]);
        let expires_in = LittleEndian::read_u32(&nonce[4..8]);
        Ok(Self {
            header,
            vhead,
            identifier,
            nonce,
            ciphertext: ciphertext.to_vec(),
            valid_from,
            expires_in,
            is_valid: window_contains(valid_from, expires_in, now),
        })
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn version(&self) -> u8 {
        self.header.version
    }

    pub fn algorithm(&self) -> Algorithm {
        self.header.algorithm
    }

    pub fn valid_from(&self) -> u32 {
        self.valid_from
    }

    pub fn expires_in(&self) -> u32 {
        self.expires_in
    }

    /// Whether the validity window covered the reference time when the token was parsed.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub(crate) fn checksum(&self) -> &[u8] {
        &self.nonce[8..]
    }

    pub(crate) fn info(&self) -> TokenInfo {
        TokenInfo {
            valid_from: unix_time(self.valid_from),
            valid_from_secs: self.valid_from,
            expires_in: self.expires_in,
            is_valid: self.is_valid,
            identifier: self.identifier,
            version: self.header.version,
            algorithm: self.header.algorithm,
        }
    }
}

/// Metadata of a verified token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    /// When the token became valid.
    pub valid_from: DateTime<Utc>,
    /// `valid_from` as it was stored, in seconds since the Unix epoch.
    pub valid_from_secs: u32,
    /// Seconds the token stays valid for. Zero means it never expires.
    pub expires_in: u32,
    /// Whether the reference time was inside the validity window. Expiry is reported, not
    /// enforced: an expired token still verifies.
    pub is_valid: bool,
    pub identifier: Identifier,
    pub version: u8,
    pub algorithm: Algorithm,
}

impl TokenInfo {
    /// When the token stops being valid, or `None` if it never expires.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.expires_in == 0 {
            return None;
        }
        let end = self.valid_from_secs as i64 + self.expires_in as i64;
        DateTime::from_timestamp(end, 0)
    }
}

/// A token whose checksum has been verified, holding the encoded payload.
#[derive(Clone, Debug)]
pub struct Verified {
    pub(crate) plaintext: Vec<u8>,
    pub(crate) info: TokenInfo,
}

impl Verified {
    pub fn info(&self) -> &TokenInfo {
        &self.info
    }

    /// The encoded payload.
    pub fn plaintext(&self) -> &[u8] {
        &self.plaintext
    }

    /// The wire tag of the payload's top-level value.
    pub fn payload_type(&self) -> Option<Marker> {
        self.plaintext.first().and_then(|tag| Marker::from_u8(*tag))
    }

    /// Decode the payload, possibly borrowing from it.
    pub fn decode<'a, T: Deserialize<'a>>(&'a self) -> Result<T> {
        crate::from_slice(&self.plaintext)
    }

    pub fn into_decrypted<T: DeserializeOwned>(self) -> Result<Decrypted<T>> {
        let payload = crate::from_slice(&self.plaintext)?;
        Ok(Decrypted {
            payload,
            info: self.info,
        })
    }
}

/// A verified, decoded token.
#[derive(Clone, Debug, PartialEq)]
pub struct Decrypted<T> {
    pub payload: T,
    pub info: TokenInfo,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_byte() {
        let cases = [
            (Header::new(1, Algorithm::ChaCha20, false).unwrap(), 0x01u8),
            (Header::new(1, Algorithm::Aes256Gcm, false).unwrap(), 0x11),
            (Header::new(1, Algorithm::ChaCha20, true).unwrap(), 0x81),
            (Header::new(15, Algorithm::Aes256Gcm, true).unwrap(), 0x9f),
            (Header::new(0, Algorithm::ChaCha20, false).unwrap(), 0x00),
        ];
        for (i, (header, byte)) in cases.iter().enumerate() {
            println!("Test #{}", i);
            assert_eq!(header.to_byte(), *byte);
            assert_eq!(Header::from_byte(*byte).unwrap(), *header);
        }
        assert!(matches!(
            Header::new(16, Algorithm::ChaCha20, false),
            Err(Error::Encode(_))
        ));
        for alg in 2..8u8 {
            assert!(matches!(Header::from_byte(alg << 4), Err(Error::Decode(_))));
        }
    }

    #[test]
    fn nonce_layout() {
        let nonce = build_nonce(0x0102_0304, 0x0a0b_0c0d, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(
            nonce,
            [4, 3, 2, 1, 0x0d, 0x0c, 0x0b, 0x0a, 1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn checksum_covers_identifier() {
        let id = Identifier::from([7u8; IDENTIFIER_LEN]);
        let with = envelope_checksum(0x81, &id, 1, 2, b"x");
        let without = envelope_checksum(0x81, &Identifier::anonymous(), 1, 2, b"x");
        assert_ne!(with, without);
        let mut manual = vec![0x81];
        manual.extend_from_slice(&[7u8; IDENTIFIER_LEN]);
        manual.extend_from_slice(&1u32.to_le_bytes());
        manual.extend_from_slice(&2u32.to_le_bytes());
        manual.push(b'x');
        assert_eq!(with, crate::crypto::checksum(&manual));
    }

    #[test]
    fn parse_layout() {
        let header = Header::new(1, Algorithm::ChaCha20, true).unwrap();
        let id = Identifier::from([0x33u8; IDENTIFIER_LEN]);
        let nonce = build_nonce(100, 50, &[9; 8]);
        let bytes = assemble(header, &id, &nonce, b"cipher");
        assert_eq!(bytes.len(), 1 + 12 + 16 + 6);

        let parsed = Intermediate::parse(&bytes, 120).unwrap();
        assert_eq!(parsed.identifier(), &id);
        assert_eq!(parsed.valid_from(), 100);
        assert_eq!(parsed.expires_in(), 50);
        assert!(parsed.is_valid());
        assert_eq!(parsed.checksum(), &[9; 8]);
        assert_eq!(parsed.ciphertext, b"cipher");

        let parsed = Intermediate::parse(&bytes, 150).unwrap();
        assert!(!parsed.is_valid());
    }

    #[test]
    fn parse_too_short() {
        assert!(matches!(
            Intermediate::parse(&[], 0),
            Err(Error::LengthTooShort { .. })
        ));
        let header = Header::new(1, Algorithm::ChaCha20, true).unwrap();
        let bytes = vec![header.to_byte(); 1 + 12 + 15];
        assert!(matches!(
            Intermediate::parse(&bytes, 0),
            Err(Error::LengthTooShort { .. })
        ));
        // Same length is fine without an identifier, leaving an empty ciphertext
        let mut bytes = bytes;
        bytes[0] = 0x01;
        bytes.truncate(17);
        let parsed = Intermediate::parse(&bytes, 0).unwrap();
        assert!(parsed.ciphertext.is_empty());
        assert!(parsed.identifier().is_anonymous());
    }

    #[test]
    fn window() {
        assert!(window_contains(0, 0, i64::MAX));
        assert!(window_contains(100, 0, 0));
        assert!(window_contains(100, 10, 100));
        assert!(window_contains(100, 10, 109));
        assert!(!window_contains(100, 10, 110));
        assert!(!window_contains(100, 10, 99));
        // The end of the window doesn't wrap around
        assert!(window_contains(u32::MAX - 5, 100, u32::MAX as i64 + 50));
    }

    #[test]
    fn expiry_time() {
        let info = Intermediate::parse(
            &assemble(
                Header::new(1, Algorithm::ChaCha20, false).unwrap(),
                &Identifier::anonymous(),
                &build_nonce(1000, 60, &[0; 8]),
                &[],
            ),
            0,
        )
        .unwrap()
        .info();
        assert_eq!(info.valid_from.timestamp(), 1000);
        assert_eq!(info.expires_at().map(|t| t.timestamp()), Some(1060));
        assert!(!info.is_valid);
    }
}
