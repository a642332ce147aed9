use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{generic_array::GenericArray, Aead, KeyInit};
use chacha20::cipher::consts::U10;
use chacha20::cipher::{Block, KeyIvInit, StreamCipherCore, StreamCipherSeekCore};
use chacha20::ChaChaCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};

/// Length of the nonce handed to a cipher.
pub const NONCE_LEN: usize = 16;

/// AES-256-GCM taking the full 16-byte nonce.
type Aes256Gcm16 = aes_gcm::AesGcm<aes_gcm::aes::Aes256, U16>;

/// The cipher a token is encrypted with. Stored in 3 bits of the token header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Algorithm {
    /// Raw ChaCha20 stream cipher. Provides no authentication of its own.
    #[default]
    ChaCha20 = 0,
    /// AES-256 in Galois/Counter mode, with a 16-byte tag appended to the ciphertext.
    Aes256Gcm = 1,
}

impl Algorithm {
    pub fn from_u8(v: u8) -> Option<Algorithm> {
        match v {
            0 => Some(Algorithm::ChaCha20),
            1 => Some(Algorithm::Aes256Gcm),
            _ => None,
        }
    }

    pub fn into_u8(self) -> u8 {
        self as u8
    }

    /// Whether the cipher authenticates the ciphertext itself.
    pub fn is_authenticated(self) -> bool {
        matches!(self, Algorithm::Aes256Gcm)
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Algorithm::ChaCha20 => f.write_str("ChaCha20"),
            Algorithm::Aes256Gcm => f.write_str("AES-256-GCM"),
        }
    }
}

/// Encrypts and decrypts token payloads.
///
/// The key is whatever the caller handed to the tokenizer; deriving a usable cipher key from it
/// is up to the implementation. The nonce carries the token's validity window and checksum.
pub trait CipherProvider: Send + Sync {
    fn encrypt(
        &self,
        algorithm: Algorithm,
        plaintext: &[u8],
        key: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>>;

    fn decrypt(
        &self,
        algorithm: Algorithm,
        ciphertext: &[u8],
        key: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>>;
}

/// The default [`CipherProvider`], built on the RustCrypto cipher crates.
///
/// The cipher key is the SHA-256 digest of the caller's key. ChaCha20 reads the nonce the way
/// OpenSSL does: the first 4 bytes are the initial block counter (little-endian) and the last 12
/// are the IETF nonce. AES-256-GCM uses all 16 bytes as its nonce.
#[derive(Clone, Copy, Debug, Default)]
pub struct RustCryptoCipher;

fn derive_key(key: &[u8]) -> Option<Zeroizing<[u8; 32]>> {
    if key.is_empty() {
        return None;
    }
    Some(Zeroizing::new(Sha256::digest(key).into()))
}

/// Applies the ChaCha20 keystream one block at a time. When the 32-bit block counter wraps, the
/// carry goes into the first nonce word, which gives the 128-bit counter layout OpenSSL uses.
fn chacha20_apply(key: &[u8; 32], nonce: &[u8; NONCE_LEN], data: &mut [u8]) {
    let mut counter = [0u8; 4];
    counter.copy_from_slice(&nonce[..4]);
    let mut counter = u32::from_le_bytes(counter);
    let mut iv = [0u8; 12];
    iv.copy_from_slice(&nonce[4..]);

    let key = chacha20::Key::from_slice(key);
    let mut core = ChaChaCore::<U10>::new(key, chacha20::Nonce::from_slice(&iv));
    core.set_block_pos(counter);
    let mut block = Block::<ChaChaCore<U10>>::default();
    for chunk in data.chunks_mut(64) {
        core.write_keystream_block(&mut block);
        for (byte, ks) in chunk.iter_mut().zip(block.iter()) {
            *byte ^= ks;
        }
        if counter == u32::MAX {
            let mut word = [0u8; 4];
            word.copy_from_slice(&iv[..4]);
            let word = u32::from_le_bytes(word).wrapping_add(1);
            iv[..4].copy_from_slice(&word.to_le_bytes());
            core = ChaChaCore::<U10>::new(key, chacha20::Nonce::from_slice(&iv));
            counter = 0;
        } else {
            counter += 1;
        }
    }
    block.as_mut_slice().zeroize();
    iv.zeroize();
}

impl CipherProvider for RustCryptoCipher {
    fn encrypt(
        &self,
        algorithm: Algorithm,
        plaintext: &[u8],
        key: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>> {
        let key = derive_key(key).ok_or_else(|| Error::Encryption("empty key".to_string()))?;
        match algorithm {
            Algorithm::ChaCha20 => {
                let mut buf = plaintext.to_vec();
                chacha20_apply(&key, nonce, &mut buf);
                Ok(buf)
            }
            Algorithm::Aes256Gcm => {
                let cipher = Aes256Gcm16::new(GenericArray::from_slice(&key[..]));
                cipher
                    .encrypt(GenericArray::from_slice(nonce), plaintext)
                    .map_err(|_| Error::Encryption("AES-256-GCM encryption failed".to_string()))
            }
        }
    }

    fn decrypt(
        &self,
        algorithm: Algorithm,
        ciphertext: &[u8],
        key: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>> {
        let key = derive_key(key).ok_or_else(|| Error::Decryption("empty key".to_string()))?;
        match algorithm {
            Algorithm::ChaCha20 => {
                let mut buf = ciphertext.to_vec();
                chacha20_apply(&key, nonce, &mut buf);
                Ok(buf)
            }
            Algorithm::Aes256Gcm => {
                let cipher = Aes256Gcm16::new(GenericArray::from_slice(&key[..]));
                cipher
                    .decrypt(GenericArray::from_slice(nonce), ciphertext)
                    .map_err(|_| {
                        Error::Decryption("AES-256-GCM authentication failed".to_string())
                    })
            }
        }
    }
}
