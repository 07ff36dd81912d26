//! Content fingerprints.
//!
//! Fingerprints decide whether a file is re-processed downstream, so a
//! collision would hide a real change. SHA-256 is used rather than a
//! checksum.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a fingerprint in hex characters.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// SHA-256 digest of a file's bytes, rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Parse a fingerprint from its hex form.
    pub fn parse(text: &str) -> Result<Self, String> {
        if text.len() != FINGERPRINT_HEX_LEN {
            return Err(format!(
                "fingerprint must be {FINGERPRINT_HEX_LEN} hex characters, got {}",
                text.len()
            ));
        }
        let mut digest = [0u8; FINGERPRINT_HEX_LEN / 2];
        hex::decode_to_slice(text, &mut digest)
            .map_err(|e| format!("fingerprint {text:?} is not hex: {e}"))?;
        if text.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(format!("fingerprint {text:?} is not lowercase hex"));
        }
        Ok(Self(text.to_string()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for logs.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the fingerprint of a byte sequence.
pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
    Fingerprint(hex::encode(Sha256::digest(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(fingerprint(b"hello"), fingerprint(b"hello"));
        assert_ne!(fingerprint(b"hello"), fingerprint(b"hello world"));
    }

    #[test]
    fn fingerprint_matches_known_sha256() {
        assert_eq!(
            fingerprint(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            fingerprint(b"hello").as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn parse_accepts_own_output() {
        let fp = fingerprint(b"content");
        assert_eq!(Fingerprint::parse(fp.as_str()), Ok(fp));
    }

    #[test]
    fn parse_rejects_malformed_hex() {
        assert!(Fingerprint::parse("abc").is_err());
        assert!(Fingerprint::parse(&"G".repeat(64)).is_err());
        assert!(Fingerprint::parse(&"A".repeat(64)).is_err());
        assert!(Fingerprint::parse(&"a".repeat(65)).is_err());
    }

    #[test]
    fn parse_error_names_the_problem() {
        let upper = fingerprint(b"hello").as_str().to_ascii_uppercase();
        let err = Fingerprint::parse(&upper).unwrap_err();
        assert!(err.contains("lowercase"), "{err}");

        let err = Fingerprint::parse(&"z".repeat(64)).unwrap_err();
        assert!(err.contains("not hex"), "{err}");
    }

    #[test]
    fn serde_rejects_bad_fingerprint() {
        let result: Result<Fingerprint, _> = serde_json::from_str("\"not-a-digest\"");
        assert!(result.is_err());

        let fp = fingerprint(b"x");
        let json = serde_json::to_string(&fp).unwrap();
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn short_form_is_prefix() {
        let fp = fingerprint(b"hello");
        assert_eq!(fp.short(), "2cf24dba5fb0");
    }
}
