//! Key codec.
//!
//! Every key starts with a fixed-width numeric prefix: the LEB128 encoding
//! of a discriminant, zero-padded to [`PREFIX_WIDTH`] bytes. The
//! discriminant selects the key class:
//!
//! | Discriminant | Class    | Suffix                       | Value          |
//! |--------------|----------|------------------------------|----------------|
//! | `0`          | System   | none                         | next cursor    |
//! | `1`          | Registry | piece CID string             | bound cursor   |
//! | `>= 100`     | Entry    | content hash hex string      | byte offset    |
//!
//! Discriminants `2..=99` are reserved and never decode. Values are 8-byte
//! big-endian integers.

use dagkv_types::varint::{decode_uvarint, encode_uvarint, MAX_VARINT_LEN64};
use dagkv_types::{ContentHash, Cursor, PieceCid, RESERVED_CURSORS};

use crate::error::{LayoutError, LayoutResult};

/// Width of the numeric prefix of every key.
pub const PREFIX_WIDTH: usize = MAX_VARINT_LEN64;

/// Discriminant of the system counter key.
pub const SYSTEM_DISCRIMINANT: u64 = 0;

/// Discriminant of piece registry keys.
pub const REGISTRY_DISCRIMINANT: u64 = 1;

/// Size of every stored value.
pub const VALUE_WIDTH: usize = 8;

/// A decoded store key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    /// The single system counter.
    System,
    /// Binding of a piece to its namespace.
    Registry(PieceCid),
    /// One entry of a namespace.
    Entry { cursor: Cursor, hash: ContentHash },
}

impl Key {
    pub fn discriminant(&self) -> u64 {
        match self {
            Self::System => SYSTEM_DISCRIMINANT,
            Self::Registry(_) => REGISTRY_DISCRIMINANT,
            Self::Entry { cursor, .. } => cursor.get(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut key = encode_prefix(self.discriminant());
        match self {
            Self::System => {}
            Self::Registry(piece) => key.extend_from_slice(piece.to_string().as_bytes()),
            Self::Entry { hash, .. } => key.extend_from_slice(hash.to_hex().as_bytes()),
        }
        key
    }

    pub fn decode(key: &[u8]) -> LayoutResult<Self> {
        let (discriminant, suffix) = split_prefix(key)?;
        match discriminant {
            SYSTEM_DISCRIMINANT => {
                if !suffix.is_empty() {
                    return Err(LayoutError::key_decode(key, "system key has a suffix"));
                }
                Ok(Self::System)
            }
            REGISTRY_DISCRIMINANT => {
                let piece = PieceCid::parse(suffix_str(key, suffix)?)
                    .map_err(|e| LayoutError::key_decode(key, e.to_string()))?;
                Ok(Self::Registry(piece))
            }
            d if d < RESERVED_CURSORS => Err(LayoutError::key_decode(
                key,
                format!("discriminant {d} is reserved"),
            )),
            d => {
                let cursor = Cursor::new(d)?;
                let hash = ContentHash::from_hex(suffix_str(key, suffix)?)
                    .map_err(|e| LayoutError::key_decode(key, e.to_string()))?;
                Ok(Self::Entry { cursor, hash })
            }
        }
    }
}

fn suffix_str<'a>(key: &[u8], suffix: &'a [u8]) -> LayoutResult<&'a str> {
    std::str::from_utf8(suffix).map_err(|_| LayoutError::key_decode(key, "suffix is not UTF-8"))
}

/// The fixed-width prefix for `discriminant`.
pub fn encode_prefix(discriminant: u64) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(PREFIX_WIDTH);
    encode_uvarint(discriminant, &mut prefix);
    prefix.resize(PREFIX_WIDTH, 0);
    prefix
}

/// Prefix shared by every entry key of `cursor`.
pub fn namespace_prefix(cursor: Cursor) -> Vec<u8> {
    encode_prefix(cursor.get())
}

/// Prefix shared by every registry key.
pub fn registry_prefix() -> Vec<u8> {
    encode_prefix(REGISTRY_DISCRIMINANT)
}

/// Split a key into its discriminant and the bytes after the prefix.
pub fn split_prefix(key: &[u8]) -> LayoutResult<(u64, &[u8])> {
    if key.len() < PREFIX_WIDTH {
        return Err(LayoutError::key_decode(key, "shorter than the prefix"));
    }
    let (header, suffix) = key.split_at(PREFIX_WIDTH);
    let (discriminant, _) =
        decode_uvarint(header).map_err(|e| LayoutError::key_decode(key, e.to_string()))?;
    if header != encode_prefix(discriminant).as_slice() {
        return Err(LayoutError::key_decode(key, "non-canonical prefix"));
    }
    Ok((discriminant, suffix))
}

pub fn encode_value(value: u64) -> [u8; VALUE_WIDTH] {
    value.to_be_bytes()
}

pub fn decode_value(key: &[u8], value: &[u8]) -> LayoutResult<u64> {
    let bytes: [u8; VALUE_WIDTH] = value.try_into().map_err(|_| LayoutError::CorruptValue {
        key: hex::encode(key),
        len: value.len(),
    })?;
    Ok(u64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagkv_types::piece::RAW_CODEC;
    use proptest::prelude::*;

    fn piece(seed: &[u8]) -> PieceCid {
        PieceCid::new_v1(RAW_CODEC, &ContentHash::blake3(seed))
    }

    #[test]
    fn prefixes_are_fixed_width_and_padded() {
        assert_eq!(encode_prefix(0), vec![0u8; PREFIX_WIDTH]);
        let mut one = vec![0u8; PREFIX_WIDTH];
        one[0] = 1;
        assert_eq!(registry_prefix(), one);

        let wide = encode_prefix(300);
        assert_eq!(wide.len(), PREFIX_WIDTH);
        assert_eq!(&wide[..2], &[0xac, 0x02]);
        assert!(wide[2..].iter().all(|&b| b == 0));

        assert_eq!(encode_prefix(u64::MAX).len(), PREFIX_WIDTH);
    }

    #[test]
    fn each_class_decodes_back() {
        let keys = [
            Key::System,
            Key::Registry(piece(b"p1")),
            Key::Entry {
                cursor: Cursor::FIRST,
                hash: ContentHash::blake3(b"h1"),
            },
            Key::Entry {
                cursor: Cursor::new(u64::MAX).unwrap(),
                hash: ContentHash::blake3(b"h2"),
            },
        ];
        for key in keys {
            assert_eq!(Key::decode(&key.encode()).unwrap(), key);
        }
    }

    #[test]
    fn entry_suffix_is_hash_hex() {
        let hash = ContentHash::blake3(b"h");
        let key = Key::Entry {
            cursor: Cursor::FIRST,
            hash,
        }
        .encode();
        let (d, suffix) = split_prefix(&key).unwrap();
        assert_eq!(d, 100);
        assert_eq!(suffix, hash.to_hex().as_bytes());
    }

    #[test]
    fn reserved_discriminants_do_not_decode() {
        for d in [2u64, 50, 99] {
            let key = encode_prefix(d);
            assert!(matches!(
                Key::decode(&key),
                Err(LayoutError::KeyDecode { .. })
            ));
        }
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(split_prefix(&[0u8; 4]).is_err());

        let mut padded = encode_prefix(100);
        padded[5] = 1;
        assert!(split_prefix(&padded).is_err());

        let mut system = encode_prefix(0);
        system.push(b'x');
        assert!(Key::decode(&system).is_err());

        let mut entry = encode_prefix(100);
        entry.extend_from_slice(b"not-hex");
        assert!(matches!(
            Key::decode(&entry),
            Err(LayoutError::KeyDecode { .. })
        ));

        assert!(split_prefix(&[0xff; PREFIX_WIDTH]).is_err());
    }

    #[test]
    fn overlong_prefix_is_not_an_alias() {
        let mut overlong = vec![0xe4, 0x80, 0x00];
        overlong.resize(PREFIX_WIDTH, 0);
        overlong.extend_from_slice(ContentHash::blake3(b"h").to_hex().as_bytes());
        assert!(matches!(
            split_prefix(&overlong),
            Err(LayoutError::KeyDecode { .. })
        ));

        let canonical = Key::Entry {
            cursor: Cursor::FIRST,
            hash: ContentHash::blake3(b"h"),
        }
        .encode();
        assert_eq!(split_prefix(&canonical).unwrap().0, 100);
    }

    #[test]
    fn values_are_eight_byte_big_endian() {
        assert_eq!(encode_value(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(decode_value(b"k", &encode_value(512)).unwrap(), 512);
        assert!(matches!(
            decode_value(b"k", &[1, 2, 3]),
            Err(LayoutError::CorruptValue { len: 3, .. })
        ));
    }

    #[test]
    fn classes_do_not_share_prefixes() {
        let system = Key::System.encode();
        let registry = Key::Registry(piece(b"p")).encode();
        let entry = Key::Entry {
            cursor: Cursor::FIRST,
            hash: ContentHash::blake3(b"e"),
        }
        .encode();
        assert!(!registry.starts_with(&encode_prefix(0)));
        assert!(!entry.starts_with(&registry_prefix()));
        assert!(!system.starts_with(&namespace_prefix(Cursor::FIRST)));
    }

    proptest! {
        #[test]
        fn namespaces_are_disjoint(
            a in 100u64..u64::MAX,
            b in 100u64..u64::MAX,
            seed in any::<u64>(),
        ) {
            prop_assume!(a != b);
            let key = Key::Entry {
                cursor: Cursor::new(a).unwrap(),
                hash: ContentHash::blake3(&seed.to_le_bytes()),
            }
            .encode();
            prop_assert!(key.starts_with(&namespace_prefix(Cursor::new(a).unwrap())));
            prop_assert!(!key.starts_with(&namespace_prefix(Cursor::new(b).unwrap())));
        }
    }
}
