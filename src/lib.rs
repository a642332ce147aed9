//! Compact, opaque, self-contained security tokens.
//!
//! torken packs an arbitrary serde payload into a short alphanumeric string. Issuing a token
//! runs the payload through a tagged binary codec, binds it to a header, an optional 12-byte
//! identifier and a validity window with a truncated SHA-256 checksum, encrypts it, scrambles
//! the byte order, and renders the result in a base-58 style alphabet. Verification undoes each
//! step and refuses any token whose checksum doesn't match.
//!
//! The two halves can be used on their own:
//!
//! - The codec ([`to_vec`], [`from_slice`], [`skip_value`]) is a serde data format. Every value
//!   starts with a one-byte type tag, integers keep their width, byte strings of common sizes
//!   get length-free tags, and [`Date`], [`Uuid`] and [`BigInt`] have tags of their own.
//!   Decoding into a struct silently skips Object keys the struct doesn't know, and [`Value`]
//!   can hold anything the format can express.
//! - The token layer ([`Tokenizer`]) issues and verifies tokens. Verification happens in two
//!   steps, [`Tokenizer::begin`] and [`Tokenizer::finalize`], so the decryption key can be
//!   chosen based on the token's [`Identifier`] before anything is decrypted.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use torken::{DecryptOptions, EncryptOptions, Tokenizer};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Claims {
//!     #[serde(rename = "sub")]
//!     subject: String,
//!     #[serde(rename = "adm")]
//!     admin: bool,
//! }
//!
//! let tokenizer = Tokenizer::new();
//! let claims = Claims { subject: "ada".into(), admin: false };
//! let opts = EncryptOptions::new().expires_in(3600);
//! let token = tokenizer.encrypt_anonymous(&claims, b"server key", &opts).unwrap();
//!
//! let decrypted = tokenizer
//!     .decrypt::<Claims, _>(&token, b"server key", &DecryptOptions::new())
//!     .unwrap();
//! assert_eq!(decrypted.payload, claims);
//! assert!(decrypted.info.is_valid);
//! ```
//!
//! The checksum and the byte scrambling are tamper evidence, not authentication at full
//! strength: the checksum is 64 bits and the scrambler is usually a shared, low-entropy string.
//! Pick [`Algorithm::Aes256Gcm`] when the cipher itself should authenticate the token.

mod big_int;
mod date;
mod de;
mod depth_tracking;
mod element;
mod error;
mod marker;
mod ser;
mod uid;
mod value;

pub mod basex;
pub mod crypto;
pub mod token;

pub use basex::BaseX;
pub use big_int::BigInt;
pub use crypto::{CipherProvider, RustCryptoCipher};
pub use date::Date;
pub use de::{from_slice, skip_value};
pub use error::{Error, Result};
pub use marker::Marker;
pub use ser::to_vec;
pub use token::{
    Algorithm, DecryptOptions, Decrypted, EncryptOptions, Identifier, Intermediate, TokenInfo,
    Tokenizer, TokenizerConfig, Verified,
};
pub use uid::Uuid;
pub use value::Value;

/// The maximum nesting depth of Arrays and Objects, for both encoding and decoding.
pub const MAX_DEPTH: usize = 100;
