use serde::{Deserialize, Serialize};

use super::DEFAULT_SCRAMBLER;
use crate::basex::DEFAULT_ALPHABET;
use crate::crypto::Algorithm;

/// Defaults for a [`Tokenizer`](super::Tokenizer), loadable from any serde format. Missing
/// fields take their default values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub scrambler: String,
    pub alphabet: String,
    pub algorithm: Algorithm,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            scrambler: DEFAULT_SCRAMBLER.to_string(),
            alphabet: DEFAULT_ALPHABET.to_string(),
            algorithm: Algorithm::ChaCha20,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_config() {
        let config: TokenizerConfig =
            serde_json::from_str(r#"{ "algorithm": "Aes256Gcm", "scrambler": "site-wide" }"#)
                .unwrap();
        assert_eq!(config.algorithm, Algorithm::Aes256Gcm);
        assert_eq!(config.scrambler, "site-wide");
        assert_eq!(config.alphabet, DEFAULT_ALPHABET);

        let config: TokenizerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TokenizerConfig::default());
    }

    #[test]
    fn roundtrip_through_codec() {
        let config = TokenizerConfig {
            scrambler: "x".into(),
            alphabet: "0123456789".into(),
            algorithm: Algorithm::Aes256Gcm,
        };
        let enc = crate::to_vec(&config).unwrap();
        let dec: TokenizerConfig = crate::from_slice(&enc).unwrap();
        assert_eq!(dec, config);
    }
}
