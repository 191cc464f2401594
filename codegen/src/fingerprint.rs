//! Content fingerprints used as cache keys.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// SHA-256 of a value's canonical JSON encoding, rendered as lowercase hex.
///
/// Equal inputs always produce equal fingerprints, so stage outputs can be
/// reused whenever the fingerprint of their input matches.
///
/// # Examples
///
/// ```
/// use optforge_codegen::fingerprint::Fingerprint;
///
/// let a = Fingerprint::of(&vec!["--output", "-o"]).unwrap();
/// let b = Fingerprint::of(&vec!["--output", "-o"]).unwrap();
/// let c = Fingerprint::of(&vec!["-o", "--output"]).unwrap();
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let mut hasher = Sha256::new();
        serde_json::to_writer(&mut hasher, value)?;
        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Fingerprint of several fingerprints, order-sensitive.
    pub fn combine(parts: &[&Fingerprint]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.0.as_bytes());
            hasher.update([0u8]);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First twelve hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
