//! License key generation.

use keygate_types::{DurationKind, LicenseKey};
use rand::Rng;

/// Alphabet for the random key suffix.
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of the random key suffix.
const SUFFIX_LEN: usize = 6;

/// Generates license keys of the form `PREFIX-KINDTOKEN-SUFFIX`, e.g.
/// `KG-7DAYS-X4Q9TZ`.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    prefix: String,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new("KG")
    }
}

impl KeyGenerator {
    /// Creates a generator with the given key prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generates a fresh key for the given duration kind.
    ///
    /// The suffix is drawn uniformly from `[A-Z0-9]`. Collisions with
    /// existing keys are not retried; the entropy is treated as
    /// sufficient at this store's scale.
    #[must_use]
    pub fn generate(&self, kind: DurationKind) -> LicenseKey {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        LicenseKey::new(format!("{}-{}-{}", self.prefix, kind.token(), suffix))
    }
}
