//! Keyed byte-order scrambling.
//!
//! The permutation comes from stable-sorting the positions `0..len` by `sha256(key)[i % 32]`.
//! It hides where each envelope field lands in the rendered token. It has no cryptographic
//! strength.

use sha2::{Digest, Sha256};

fn permutation(len: usize, key: &[u8]) -> Vec<usize> {
    let digest: [u8; 32] = Sha256::digest(key).into();
    let mut indices: Vec<usize> = (0..len).collect();
    // Stable, so ties keep their original order
    indices.sort_by_key(|&i| digest[i % 32]);
    indices
}

/// Reorder `data` in place so that `out[i] = in[P[i]]`.
pub fn shuffle(data: &mut [u8], key: &[u8]) {
    let perm = permutation(data.len(), key);
    let src = data.to_vec();
    for (dst, &from) in data.iter_mut().zip(perm.iter()) {
        *dst = src[from];
    }
}

/// Undo [`shuffle`] with the same key.
pub fn unshuffle(data: &mut [u8], key: &[u8]) {
    let perm = permutation(data.len(), key);
    let src = data.to_vec();
    for (i, &to) in perm.iter().enumerate() {
        data[to] = src[i];
    }
}
