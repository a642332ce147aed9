//! Base-X text encoding.
//!
//! Bytes are treated as one big-endian number and written out in the alphabet's radix, with the
//! alphabet's first character standing in for each leading zero byte. With the default alphabet
//! this is the familiar Base58 encoding.

use crate::error::{Error, Result};

/// The Base58 alphabet, which drops `0`, `O`, `I` and `l`.
pub const DEFAULT_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const INVALID: u8 = 0xff;

/// A base-X transcoder for a fixed alphabet.
#[derive(Clone)]
pub struct BaseX {
    alphabet: Vec<u8>,
    base_map: [u8; 256],
}

impl BaseX {
    /// Build a transcoder. The alphabet must be 2 to 254 ASCII characters, none repeated.
    pub fn new(alphabet: &str) -> Result<Self> {
        if !alphabet.is_ascii() {
            return Err(Error::Alphabet("alphabet must be ASCII".to_string()));
        }
        let alphabet = alphabet.as_bytes();
        if alphabet.len() < 2 {
            return Err(Error::Alphabet(
                "alphabet must have at least 2 characters".to_string(),
            ));
        }
        if alphabet.len() >= INVALID as usize {
            return Err(Error::Alphabet(format!(
                "alphabet has {} characters, the limit is {}",
                alphabet.len(),
                INVALID - 1
            )));
        }
        let mut base_map = [INVALID; 256];
        for (i, &c) in alphabet.iter().enumerate() {
            if base_map[c as usize] != INVALID {
                return Err(Error::Alphabet(format!(
                    "{:?} is ambiguous in alphabet",
                    c as char
                )));
            }
            base_map[c as usize] = i as u8;
        }
        Ok(Self {
            alphabet: alphabet.to_vec(),
            base_map,
        })
    }

    pub fn alphabet(&self) -> &str {
        // Checked to be ASCII on construction
        std::str::from_utf8(&self.alphabet).unwrap_or_default()
    }

    pub fn base(&self) -> usize {
        self.alphabet.len()
    }

    fn leader(&self) -> u8 {
        self.alphabet[0]
    }

    pub fn encode(&self, data: &[u8]) -> String {
        let base = self.base() as u32;
        let zeros = data.iter().take_while(|&&b| b == 0).count();

        // Digits in the target radix, least significant first
        let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 138 / 100 + 1);
        for &byte in &data[zeros..] {
            let mut carry = byte as u32;
            for digit in digits.iter_mut() {
                carry += (*digit as u32) << 8;
                *digit = (carry % base) as u8;
                carry /= base;
            }
            while carry != 0 {
                digits.push((carry % base) as u8);
                carry /= base;
            }
        }

        let mut out = String::with_capacity(zeros + digits.len());
        for _ in 0..zeros {
            out.push(self.leader() as char);
        }
        for &digit in digits.iter().rev() {
            out.push(self.alphabet[digit as usize] as char);
        }
        out
    }

    pub fn decode(&self, text: &str) -> Result<Vec<u8>> {
        let text = text.as_bytes();
        let base = self.base() as u32;
        let zeros = text.iter().take_while(|&&c| c == self.leader()).count();

        // Bytes, least significant first
        let mut bytes: Vec<u8> = Vec::with_capacity(text.len());
        for &c in &text[zeros..] {
            let value = self.base_map[c as usize];
            if value == INVALID {
                return Err(Error::Decode(format!(
                    "invalid character {:?} for base {}",
                    c as char, base
                )));
            }
            let mut carry = value as u32;
            for byte in bytes.iter_mut() {
                carry += (*byte as u32) * base;
                *byte = (carry & 0xff) as u8;
                carry >>= 8;
            }
            while carry != 0 {
                bytes.push((carry & 0xff) as u8);
                carry >>= 8;
            }
        }

        let mut out = vec![0u8; zeros];
        out.extend(bytes.iter().rev());
        Ok(out)
    }
}

impl Default for BaseX {
    fn default() -> Self {
        let mut base_map = [INVALID; 256];
        for (i, &c) in DEFAULT_ALPHABET.as_bytes().iter().enumerate() {
            base_map[c as usize] = i as u8;
        }
        Self {
            alphabet: DEFAULT_ALPHABET.as_bytes().to_vec(),
            base_map,
        }
    }
}

impl std::fmt::Debug for BaseX {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("BaseX")
            .field("alphabet", &self.alphabet())
            .finish()
    }
}
