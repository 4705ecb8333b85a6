use std::fmt;
use std::str::FromStr;

use cid::Cid;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::hash::ContentHash;

/// `raw` multicodec.
pub const RAW_CODEC: u64 = 0x55;

/// Content identifier of a piece.
///
/// The canonical string form is the CID's multibase string (base32-lower
/// for CIDv1). That string is embedded verbatim in registry keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceCid(Cid);

impl PieceCid {
    /// Build a CIDv1 from a codec and a content hash.
    pub fn new_v1(codec: u64, hash: &ContentHash) -> Self {
        Self(Cid::new_v1(codec, *hash.as_multihash()))
    }

    /// Wrap an existing `Cid`.
    pub fn from_cid(cid: Cid) -> Self {
        Self(cid)
    }

    /// Parse from the canonical string form.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        Cid::try_from(s)
            .map(Self)
            .map_err(|e| TypeError::InvalidCid(format!("{s}: {e}")))
    }

    /// Borrow the inner `Cid`.
    pub fn as_cid(&self) -> &Cid {
        &self.0
    }

    /// The multicodec of the piece.
    pub fn codec(&self) -> u64 {
        self.0.codec()
    }
}

impl FromStr for PieceCid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for PieceCid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PieceCid({})", self.0)
    }
}

impl fmt::Display for PieceCid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for PieceCid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PieceCid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(seed: &[u8]) -> PieceCid {
        PieceCid::new_v1(RAW_CODEC, &ContentHash::blake3(seed))
    }

    #[test]
    fn string_roundtrip() {
        let p = piece(b"piece-1");
        let s = p.to_string();
        assert!(s.starts_with('b'), "CIDv1 renders as base32: {s}");
        assert_eq!(s.parse::<PieceCid>().unwrap(), p);
    }

    #[test]
    fn distinct_pieces_have_distinct_strings() {
        assert_ne!(piece(b"a").to_string(), piece(b"b").to_string());
    }

    #[test]
    fn codec_is_preserved() {
        assert_eq!(piece(b"x").codec(), RAW_CODEC);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            PieceCid::parse("not-a-cid"),
            Err(TypeError::InvalidCid(_))
        ));
    }

    #[test]
    fn serde_roundtrip() {
        let p = piece(b"serde");
        let json = serde_json::to_string(&p).unwrap();
        let back: PieceCid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
