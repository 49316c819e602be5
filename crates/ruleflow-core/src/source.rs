//! Rule source identity: content fingerprints and source descriptors
//!
//! Fingerprints are BLAKE3 hashes of the raw source bytes. Two sources with
//! equal fingerprints compile to identical artifacts, which is what makes
//! compiled-artifact caching sound.

use chrono::{DateTime, Utc};
use std::fmt;

/// BLAKE3 content hash of a rule source
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Hash raw source bytes
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(bytes);
        Self(*hasher.finalize().as_bytes())
    }

    /// Hash source text
    pub fn of_str(content: &str) -> Self {
        Self::of_bytes(content.as_bytes())
    }

    /// Hex rendering of the hash
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Shortened hex prefix for log lines
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

/// Identity record for one rule-definition unit
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSourceDescriptor {
    /// Logical name/path of the source
    pub source_id: String,
    /// Fingerprint of the last observed content
    pub fingerprint: Fingerprint,
    /// Last observed modification time
    pub last_modified: DateTime<Utc>,
}

impl RuleSourceDescriptor {
    pub fn new(source_id: impl Into<String>, fingerprint: Fingerprint) -> Self {
        Self {
            source_id: source_id.into(),
            fingerprint,
            last_modified: Utc::now(),
        }
    }

    /// Record newly observed content, refreshing the modification time
    pub fn observe(&mut self, fingerprint: Fingerprint) {
        if self.fingerprint != fingerprint {
            self.fingerprint = fingerprint;
            self.last_modified = Utc::now();
        }
    }
}
