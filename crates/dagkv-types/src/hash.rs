use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use multihash::Multihash;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Multihash code for BLAKE3 (256-bit output).
pub const BLAKE3_CODE: u64 = 0x1e;

/// Multihash code for SHA2-256.
pub const SHA2_256_CODE: u64 = 0x12;

/// Content hash identifying one entry inside a piece's index.
///
/// Wraps a multihash (code + digest). The canonical string form is the
/// lowercase hex encoding of the multihash's binary form; that string is
/// what gets embedded in store keys, so it must be collision-free and
/// stable.
///
/// Hashes order by code, then digest length, then digest bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(Multihash<64>);

impl ContentHash {
    /// Wrap a digest produced by the hash function identified by `code`.
    pub fn wrap(code: u64, digest: &[u8]) -> Result<Self, TypeError> {
        Multihash::wrap(code, digest)
            .map(Self)
            .map_err(|e| TypeError::InvalidMultihash(e.to_string()))
    }

    /// BLAKE3 multihash of `data`.
    pub fn blake3(data: &[u8]) -> Self {
        // A 32-byte digest always fits in a 64-byte multihash.
        let digest = blake3::hash(data);
        match Multihash::wrap(BLAKE3_CODE, digest.as_bytes()) {
            Ok(mh) => Self(mh),
            Err(_) => unreachable!("32-byte digest exceeds multihash capacity"),
        }
    }

    /// Parse from the multihash binary form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        Multihash::from_bytes(bytes)
            .map(Self)
            .map_err(|e| TypeError::InvalidMultihash(e.to_string()))
    }

    /// Parse from the canonical hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// The multihash function code.
    pub fn code(&self) -> u64 {
        self.0.code()
    }

    /// The raw digest bytes.
    pub fn digest(&self) -> &[u8] {
        self.0.digest()
    }

    /// The multihash binary form (code varint ++ length varint ++ digest).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes()
    }

    /// Canonical string form: lowercase hex of [`Self::to_bytes`].
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }

    /// Borrow the inner multihash.
    pub fn as_multihash(&self) -> &Multihash<64> {
        &self.0
    }
}

impl Ord for ContentHash {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.code(), self.digest().len(), self.digest()).cmp(&(
            other.code(),
            other.digest().len(),
            other.digest(),
        ))
    }
}

impl PartialOrd for ContentHash {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Multihash<64>> for ContentHash {
    fn from(mh: Multihash<64>) -> Self {
        Self(mh)
    }
}

impl FromStr for ContentHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        let short = hex.get(..16).unwrap_or(&hex);
        write!(f, "ContentHash({short})")
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blake3_is_deterministic() {
        assert_eq!(ContentHash::blake3(b"hello"), ContentHash::blake3(b"hello"));
        assert_ne!(ContentHash::blake3(b"hello"), ContentHash::blake3(b"world"));
    }

    #[test]
    fn blake3_carries_code_and_digest() {
        let h = ContentHash::blake3(b"data");
        assert_eq!(h.code(), BLAKE3_CODE);
        assert_eq!(h.digest(), blake3::hash(b"data").as_bytes());
    }

    #[test]
    fn hex_form_starts_with_code_and_length() {
        let h = ContentHash::blake3(b"data");
        let hex = h.to_hex();
        // 0x1e code, 0x20 (32) length, then 64 hex chars of digest.
        assert!(hex.starts_with("1e20"));
        assert_eq!(hex.len(), 4 + 64);
        assert_eq!(h.to_string(), hex);
    }

    #[test]
    fn hex_roundtrip() {
        let h = ContentHash::wrap(SHA2_256_CODE, &[7u8; 32]).unwrap();
        let parsed: ContentHash = h.to_hex().parse().unwrap();
        assert_eq!(parsed, h);
    }

    #[test]
    fn ordering_groups_by_code_then_length() {
        let short = ContentHash::wrap(SHA2_256_CODE, &[0xff; 4]).unwrap();
        let long = ContentHash::wrap(SHA2_256_CODE, &[0x00; 8]).unwrap();
        let other_code = ContentHash::wrap(BLAKE3_CODE, &[0x00; 2]).unwrap();
        assert!(short < long);
        assert!(long < other_code);

        let a = ContentHash::wrap(SHA2_256_CODE, &[1, 2]).unwrap();
        let b = ContentHash::wrap(SHA2_256_CODE, &[1, 3]).unwrap();
        assert!(a < b);
    }

    #[test]
    fn invalid_hex_is_rejected() {
        assert!(matches!(
            ContentHash::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn truncated_multihash_is_rejected() {
        // Declares a 32-byte digest but carries only 2 bytes.
        assert!(matches!(
            ContentHash::from_hex("12200102"),
            Err(TypeError::InvalidMultihash(_))
        ));
    }

    #[test]
    fn oversized_digest_is_rejected() {
        assert!(ContentHash::wrap(SHA2_256_CODE, &[0u8; 65]).is_err());
    }

    #[test]
    fn serde_uses_hex_string() {
        let h = ContentHash::blake3(b"serde");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_hex()));
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    proptest! {
        #[test]
        fn distinct_hashes_have_distinct_strings(
            a in proptest::collection::vec(any::<u8>(), 1..64),
            b in proptest::collection::vec(any::<u8>(), 1..64),
        ) {
            let ha = ContentHash::wrap(SHA2_256_CODE, &a).unwrap();
            let hb = ContentHash::wrap(SHA2_256_CODE, &b).unwrap();
            prop_assert_eq!(ha == hb, ha.to_hex() == hb.to_hex());
        }
    }
}
