use chrono::{DateTime, Utc};

use crate::crypto::Algorithm;

/// Per-call settings for issuing a token. Anything left unset falls back to the
/// [`Tokenizer`](super::Tokenizer)'s defaults: the current time, no expiry, the latest protocol
/// version, and the tokenizer's scrambler, algorithm, and alphabet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncryptOptions {
    pub(crate) valid_from: Option<i64>,
    pub(crate) expires_in: Option<u32>,
    pub(crate) scrambler: Option<String>,
    pub(crate) algorithm: Option<Algorithm>,
    pub(crate) version: Option<u8>,
    pub(crate) alphabet: Option<String>,
}

impl EncryptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// When the token becomes valid. Must lie within the range of a 32-bit Unix timestamp.
    pub fn valid_from(mut self, time: DateTime<Utc>) -> Self {
        self.valid_from = Some(time.timestamp());
        self
    }

    /// When the token becomes valid, in seconds since the Unix epoch.
    pub fn valid_from_secs(mut self, secs: u32) -> Self {
        self.valid_from = Some(secs.into());
        self
    }

    /// Seconds after `valid_from` at which the token stops being valid. Zero means it never
    /// expires.
    pub fn expires_in(mut self, secs: u32) -> Self {
        self.expires_in = Some(secs);
        self
    }

    pub fn scrambler(mut self, scrambler: impl Into<String>) -> Self {
        self.scrambler = Some(scrambler.into());
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn chacha20(self) -> Self {
        self.algorithm(Algorithm::ChaCha20)
    }

    pub fn aes(self) -> Self {
        self.algorithm(Algorithm::Aes256Gcm)
    }

    /// Protocol version written to the header. Only 4 bits are available, so issuing fails for
    /// anything above 15.
    pub fn version(mut self, version: u8) -> Self {
        self.version = Some(version);
        self
    }

    pub fn alphabet(mut self, alphabet: impl Into<String>) -> Self {
        self.alphabet = Some(alphabet.into());
        self
    }
}

/// Per-call settings for verifying a token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecryptOptions {
    pub(crate) scrambler: Option<String>,
    pub(crate) alphabet: Option<String>,
    pub(crate) reference_time: Option<DateTime<Utc>>,
}

impl DecryptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scrambler(mut self, scrambler: impl Into<String>) -> Self {
        self.scrambler = Some(scrambler.into());
        self
    }

    pub fn alphabet(mut self, alphabet: impl Into<String>) -> Self {
        self.alphabet = Some(alphabet.into());
        self
    }

    /// Check the validity window against this time instead of the system clock.
    pub fn reference_time(mut self, time: DateTime<Utc>) -> Self {
        self.reference_time = Some(time);
        self
    }
}
