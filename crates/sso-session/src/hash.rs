//! Session identity
//!
//! The validator stores and revokes sessions by `keccak256(abi.encode(spec))`.
//! Any change to any field of the spec yields a different hash.

use crate::abi::encode_session_params;
use alloy_primitives::{keccak256, B256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sso_core::serialization::from_json;
use sso_core::{SessionSpec, SsoError, SsoResult};
use std::fmt;
use std::str::FromStr;

/// 32-byte session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHash(B256);

impl SessionHash {
    /// Raw digest
    pub fn to_b256(&self) -> B256 {
        self.0
    }

    /// Digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }
}

impl From<B256> for SessionHash {
    fn from(hash: B256) -> Self {
        Self(hash)
    }
}

impl From<SessionHash> for B256 {
    fn from(hash: SessionHash) -> Self {
        hash.0
    }
}

impl fmt::Display for SessionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for SessionHash {
    type Err = SsoError;

    fn from_str(s: &str) -> SsoResult<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| SsoError::serialization(format!("session hash {s:?}: {e}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            SsoError::serialization(format!(
                "session hash must be 32 bytes, got {}",
                b.len()
            ))
        })?;
        Ok(Self(B256::from(bytes)))
    }
}

impl Serialize for SessionHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SessionHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Hash a session spec.
///
/// Fails when the spec carries an invalid limit.
pub fn session_hash(spec: &SessionSpec) -> SsoResult<SessionHash> {
    let encoded = encode_session_params(spec)?;
    let hash = SessionHash(keccak256(&encoded));
    tracing::trace!(%hash, signer = %spec.signer, "computed session hash");
    Ok(hash)
}

/// Parse a spec from canonical JSON and hash it
pub fn session_hash_from_json(json: &str) -> SsoResult<SessionHash> {
    let spec: SessionSpec = from_json(json)?;
    session_hash(&spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse() {
        let hash = SessionHash::from(B256::repeat_byte(0x0f));
        let text = hash.to_string();
        assert_eq!(text, format!("0x{}", "0f".repeat(32)));
        assert_eq!(text.parse::<SessionHash>().unwrap(), hash);
        assert_eq!(text[2..].parse::<SessionHash>().unwrap(), hash);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("0x1234".parse::<SessionHash>().is_err());
        assert!(format!("0x{}", "zz".repeat(32)).parse::<SessionHash>().is_err());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let hash = SessionHash::from(B256::repeat_byte(0xaa));
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "aa".repeat(32)));
        let back: SessionHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
