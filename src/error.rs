use std::fmt;

use serde::{de, ser};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// A transcoder alphabet was too short, too long, not ASCII, or contained a repeated
    /// character.
    #[error("Bad alphabet: {0}")]
    Alphabet(String),
    /// A value could not be represented in the binary format. This covers non-string map keys,
    /// lengths that don't fit in 32 bits, and failures raised by a type's own `Serialize`
    /// implementation.
    #[error("Encoding failure: {0}")]
    Encode(String),
    /// The byte stream was malformed, used an unrecognized type tag, or didn't fit the target
    /// type.
    #[error("Decoding failure: {0}")]
    Decode(String),
    /// The byte stream ended too early.
    #[error("Expected data length {expected}, but got {actual} on step [{step}]")]
    LengthTooShort {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// Encoding or decoding hit the nesting limit.
    #[error("Hit parsing limit: {0}")]
    ParseLimit(String),
    /// An identifier wasn't exactly 12 bytes, or its hex form was malformed.
    #[error("Bad identifier: {0}")]
    Identifier(String),
    /// The cipher provider failed to encrypt.
    #[error("Encryption failed: {0}")]
    Encryption(String),
    /// The cipher provider failed to decrypt. For AEAD algorithms this is also how a wrong key
    /// or altered ciphertext shows up.
    #[error("Decryption failed: {0}")]
    Decryption(String),
    /// The decrypted payload didn't match the checksum carried in the token.
    #[error("Token integrity check failed")]
    Integrity,
    /// A key resolver had no key for the token's identifier.
    #[error("No key available for the token identifier")]
    MissingKey,
}

impl Error {
    /// Returns true for any failure to read a byte stream: malformed data, truncation, or an
    /// exceeded nesting limit.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Error::Decode(_) | Error::LengthTooShort { .. } | Error::ParseLimit(_)
        )
    }
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Encode(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Decode(msg.to_string())
    }
}
