use std::fmt;
use std::str::FromStr;

use rand::{rngs::OsRng, RngCore};

use crate::error::{Error, Result};

/// Length of a non-anonymous identifier.
pub const IDENTIFIER_LEN: usize = 12;

/// Identifies a token without revealing its payload, typically so the verifier can pick the
/// right key. A token either carries exactly 12 identifier bytes or is anonymous.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Identifier(Option<[u8; IDENTIFIER_LEN]>);

impl Identifier {
    /// A new identifier from the operating system's random number generator.
    pub fn random() -> Self {
        let mut id = [0u8; IDENTIFIER_LEN];
        OsRng.fill_bytes(&mut id);
        Identifier(Some(id))
    }

    pub fn anonymous() -> Self {
        Identifier(None)
    }

    /// An empty slice gives an anonymous identifier; anything else must be exactly 12 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Identifier(None));
        }
        let id: [u8; IDENTIFIER_LEN] = bytes.try_into().map_err(|_| {
            Error::Identifier(format!(
                "identifier must be empty or {} bytes, got {}",
                IDENTIFIER_LEN,
                bytes.len()
            ))
        })?;
        Ok(Identifier(Some(id)))
    }

    /// Parse from hexadecimal. The empty string gives an anonymous identifier.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| Error::Identifier(format!("identifier is not valid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Lowercase hexadecimal, or the empty string if anonymous.
    pub fn to_hex(&self) -> String {
        self.0.map(hex::encode).unwrap_or_default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_none()
    }

    /// The identifier bytes. Empty if anonymous.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            Some(id) => &id[..],
            None => &[],
        }
    }
}

impl From<[u8; IDENTIFIER_LEN]> for Identifier {
    fn from(id: [u8; IDENTIFIER_LEN]) -> Self {
        Identifier(Some(id))
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Some(id) => f.write_str(&hex::encode(id)),
            None => f.write_str("<anonymous>"),
        }
    }
}
