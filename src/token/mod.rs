//! Issuing and verifying tokens.
//!
//! Issuing encodes the payload, checksums it together with the header, identifier, and
//! validity window, encrypts it, scrambles the resulting envelope, and renders it with the
//! tokenizer's alphabet. Verification runs the same steps backwards in two phases:
//! [`Tokenizer::begin`] parses the envelope and exposes the [`Identifier`], so the caller can look
//! up the right key, and [`Tokenizer::finalize`] decrypts and checks the checksum.
//!
//! A [`Tokenizer`] only holds defaults. Every call takes its own options, and nothing a call does
//! changes the tokenizer, so one instance can be shared freely across threads.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};

use crate::basex::BaseX;
use crate::crypto::{self, checksum_matches, CipherProvider, RustCryptoCipher};
use crate::error::{Error, Result};

mod config;
mod envelope;
mod identifier;
mod options;

pub use crate::crypto::Algorithm;
pub use config::TokenizerConfig;
pub use envelope::{Decrypted, Intermediate, TokenInfo, Verified};
pub use identifier::{Identifier, IDENTIFIER_LEN};
pub use options::{DecryptOptions, EncryptOptions};

use envelope::{assemble, build_nonce, envelope_checksum, Header};

/// The protocol version written by this library.
pub const LATEST_VERSION: u8 = 0x01;

/// The scrambler used when none is configured.
pub const DEFAULT_SCRAMBLER: &str = "DEFAULT_SCRAMBLER";

/// Issues and verifies tokens.
#[derive(Clone)]
pub struct Tokenizer {
    scrambler: String,
    basex: BaseX,
    algorithm: Algorithm,
    cipher: Arc<dyn CipherProvider>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("alphabet", &self.basex.alphabet())
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl Tokenizer {
    /// A tokenizer with the default scrambler, the Base58 alphabet, ChaCha20, and the
    /// [`RustCryptoCipher`] provider.
    pub fn new() -> Self {
        Self {
            scrambler: DEFAULT_SCRAMBLER.to_string(),
            basex: BaseX::default(),
            algorithm: Algorithm::default(),
            cipher: Arc::new(RustCryptoCipher),
        }
    }

    /// Build from a loaded configuration. Fails if the configured alphabet is unusable.
    pub fn from_config(config: &TokenizerConfig) -> Result<Self> {
        Ok(Self {
            scrambler: config.scrambler.clone(),
            basex: BaseX::new(&config.alphabet)?,
            algorithm: config.algorithm,
            cipher: Arc::new(RustCryptoCipher),
        })
    }

    /// Replace the cipher provider.
    pub fn with_cipher(mut self, cipher: impl CipherProvider + 'static) -> Self {
        self.cipher = Arc::new(cipher);
        self
    }

    pub fn set_alphabet(&mut self, alphabet: &str) -> Result<()> {
        self.basex = BaseX::new(alphabet)?;
        Ok(())
    }

    pub fn alphabet(&self) -> &str {
        self.basex.alphabet()
    }

    pub fn set_scrambler(&mut self, scrambler: impl Into<String>) {
        self.scrambler = scrambler.into();
    }

    pub fn scrambler(&self) -> &str {
        &self.scrambler
    }

    /// The algorithm used when the per-call options don't pick one.
    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn transcoder(&self, alphabet: Option<&str>) -> Result<Cow<'_, BaseX>> {
        match alphabet {
            Some(alphabet) => Ok(Cow::Owned(BaseX::new(alphabet)?)),
            None => Ok(Cow::Borrowed(&self.basex)),
        }
    }

    /// Issue a token bound to `identifier`. An anonymous identifier issues an anonymous token.
    pub fn encrypt<T, K>(
        &self,
        payload: &T,
        key: K,
        identifier: &Identifier,
        opts: &EncryptOptions,
    ) -> Result<String>
    where
        T: Serialize + ?Sized,
        K: AsRef<[u8]>,
    {
        let plaintext = crate::to_vec(payload)?;
        self.encrypt_plaintext(&plaintext, key.as_ref(), identifier, opts)
    }

    /// Issue a token without an identifier.
    pub fn encrypt_anonymous<T, K>(&self, payload: &T, key: K, opts: &EncryptOptions) -> Result<String>
    where
        T: Serialize + ?Sized,
        K: AsRef<[u8]>,
    {
        self.encrypt(payload, key, &Identifier::anonymous(), opts)
    }

    fn encrypt_plaintext(
        &self,
        plaintext: &[u8],
        key: &[u8],
        identifier: &Identifier,
        opts: &EncryptOptions,
    ) -> Result<String> {
        let basex = self.transcoder(opts.alphabet.as_deref())?;
        let scrambler = opts.scrambler.as_deref().unwrap_or(&self.scrambler);
        let algorithm = opts.algorithm.unwrap_or(self.algorithm);
        let version = opts.version.unwrap_or(LATEST_VERSION);
        let valid_from = opts.valid_from.unwrap_or_else(|| Utc::now().timestamp());
        let valid_from = u32::try_from(valid_from).map_err(|_| {
            Error::Encode(format!(
                "valid_from {} is outside the 32-bit timestamp range",
                valid_from
            ))
        })?;
        let expires_in = opts.expires_in.unwrap_or(0);

        let header = Header::new(version, algorithm, !identifier.is_anonymous())?;
        let vhead = header.to_byte();
        debug!(
            "Issuing token: version {}, algorithm {}, identified {}, payload {} bytes",
            version,
            algorithm,
            header.has_identifier,
            plaintext.len()
        );

        let checksum = envelope_checksum(vhead, identifier, valid_from, expires_in, plaintext);
        let nonce = build_nonce(valid_from, expires_in, &checksum);
        let ciphertext = self
            .cipher
            .encrypt(algorithm, plaintext, key, &nonce)
            .map_err(|e| {
                warn!("Token encryption failed: {}", e);
                e
            })?;

        let mut envelope = assemble(header, identifier, &nonce, &ciphertext);
        crypto::shuffle(&mut envelope, scrambler.as_bytes());
        Ok(basex.encode(&envelope))
    }

    /// Parse a token without decrypting it.
    pub fn begin(&self, token: &str, opts: &DecryptOptions) -> Result<Intermediate> {
        let basex = self.transcoder(opts.alphabet.as_deref())?;
        let scrambler = opts.scrambler.as_deref().unwrap_or(&self.scrambler);
        let now = opts.reference_time.unwrap_or_else(Utc::now).timestamp();

        let mut envelope = basex.decode(token)?;
        crypto::unshuffle(&mut envelope, scrambler.as_bytes());
        let intermediate = Intermediate::parse(&envelope, now)?;
        debug!(
            "Parsed token: version {}, algorithm {}, identified {}, ciphertext {} bytes, valid {}",
            intermediate.version(),
            intermediate.algorithm(),
            !intermediate.identifier().is_anonymous(),
            intermediate.ciphertext.len(),
            intermediate.is_valid()
        );
        Ok(intermediate)
    }

    /// Decrypt a parsed token and verify its checksum.
    pub fn finalize<K: AsRef<[u8]>>(&self, intermediate: Intermediate, key: K) -> Result<Verified> {
        let algorithm = intermediate.algorithm();
        let plaintext = self
            .cipher
            .decrypt(
                algorithm,
                &intermediate.ciphertext,
                key.as_ref(),
                &intermediate.nonce,
            )
            .map_err(|e| {
                warn!("Token decryption failed ({}): {}", algorithm, e);
                e
            })?;

        let expected = envelope_checksum(
            intermediate.vhead,
            &intermediate.identifier,
            intermediate.valid_from,
            intermediate.expires_in,
            &plaintext,
        );
        if !checksum_matches(&expected, intermediate.checksum()) {
            warn!(
                "Token checksum mismatch (algorithm {}, identified {})",
                algorithm,
                !intermediate.identifier().is_anonymous()
            );
            return Err(Error::Integrity);
        }

        Ok(Verified {
            info: intermediate.info(),
            plaintext,
        })
    }

    /// Verify a token and decode its payload.
    pub fn decrypt<T, K>(&self, token: &str, key: K, opts: &DecryptOptions) -> Result<Decrypted<T>>
    where
        T: DeserializeOwned,
        K: AsRef<[u8]>,
    {
        let intermediate = self.begin(token, opts)?;
        self.finalize(intermediate, key)?.into_decrypted()
    }

    /// Verify a token, asking `resolver` for the key once the token's identifier is known.
    /// A resolver returning `None` fails with [`Error::MissingKey`].
    pub fn decrypt_with<T, F, K>(
        &self,
        token: &str,
        resolver: F,
        opts: &DecryptOptions,
    ) -> Result<Decrypted<T>>
    where
        T: DeserializeOwned,
        F: FnOnce(&Identifier) -> Option<K>,
        K: AsRef<[u8]>,
    {
        let intermediate = self.begin(token, opts)?;
        let key = resolver(intermediate.identifier()).ok_or(Error::MissingKey)?;
        self.finalize(intermediate, key)?.into_decrypted()
    }
}
