//! Integrity, obfuscation, and encryption primitives used by the token envelope.
//!
//! None of these know about the envelope layout. The checksum and the shuffle are fixed
//! algorithms; encryption goes through the [`CipherProvider`] trait so the envelope can be
//! driven by another implementation.

mod checksum;
mod cipher;
mod shuffle;

pub use checksum::{checksum, checksum_matches, Checksummer, CHECKSUM_LEN};
pub use cipher::{Algorithm, CipherProvider, RustCryptoCipher, NONCE_LEN};
pub use shuffle::{shuffle, unshuffle};
