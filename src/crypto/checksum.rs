use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of a checksum: the first 8 bytes of a SHA-256 digest.
pub const CHECKSUM_LEN: usize = 8;

/// Checksum a single buffer.
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Checksummer::new();
    hasher.update(data);
    hasher.finalize()
}

/// Compare a computed checksum against one read from a token, in constant time.
pub fn checksum_matches(expected: &[u8; CHECKSUM_LEN], actual: &[u8]) -> bool {
    expected[..].ct_eq(actual).into()
}

/// Incremental checksum, for covering several fields without concatenating them first.
#[derive(Clone, Default)]
pub struct Checksummer(Sha256);

impl Checksummer {
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.0.update(data);
        self
    }

    pub fn finalize(self) -> [u8; CHECKSUM_LEN] {
        let digest = self.0.finalize();
        let mut out = [0u8; CHECKSUM_LEN];
        out.copy_from_slice(&digest[..CHECKSUM_LEN]);
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn truncated_sha256() {
        let cases: &[(&[u8], &str)] = &[
            (b"", "e3b0c44298fc1c14"),
            (b"abc", "ba7816bf8f01cfea"),
        ];
        for (i, (data, expected)) in cases.iter().enumerate() {
            println!("Test #{}", i);
            assert_eq!(hex::encode(checksum(data)), *expected);
        }
    }

    #[test]
    fn incremental_matches_oneshot() {
        let mut hasher = Checksummer::new();
        hasher.update(&[0x01]).update(b"header").update(&[]).update(b"payload");
        assert_eq!(hasher.finalize(), checksum(b"\x01headerpayload"));
    }

    #[test]
    fn comparison() {
        let sum = checksum(b"data");
        assert!(checksum_matches(&sum, &sum));
        let mut other = sum;
        other[7] ^= 1;
        assert!(!checksum_matches(&sum, &other));
        assert!(!checksum_matches(&sum, &sum[..7]));
    }
}
