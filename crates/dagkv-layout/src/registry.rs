use std::sync::Arc;

use dagkv_store::{KvStore, ScanIter};
use dagkv_types::{Cursor, PieceCid};
use tracing::debug;

use crate::error::{LayoutError, LayoutResult};
use crate::keys::{decode_value, encode_value, registry_prefix, Key};

/// Piece to namespace bindings. Last write wins.
#[derive(Clone)]
pub struct PieceRegistry {
    store: Arc<dyn KvStore>,
}

impl PieceRegistry {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Bind `piece` to `cursor`, replacing any earlier binding. The old
    /// namespace stays in the store but is no longer reachable.
    pub fn bind(&self, piece: &PieceCid, cursor: Cursor) -> LayoutResult<()> {
        let key = Key::Registry(*piece).encode();
        self.store.put(&key, &encode_value(cursor.get()))?;
        debug!(piece = %piece, cursor = %cursor, "piece bound");
        Ok(())
    }

    pub fn lookup(&self, piece: &PieceCid) -> LayoutResult<Cursor> {
        let key = Key::Registry(*piece).encode();
        let raw = self
            .store
            .get(&key)?
            .ok_or(LayoutError::NotFound(*piece))?;
        Ok(Cursor::new(decode_value(&key, &raw)?)?)
    }

    /// Every binding, in key order.
    pub fn pieces(&self) -> LayoutResult<Bindings<'_>> {
        Ok(Bindings {
            inner: self.store.scan_prefix(&registry_prefix())?,
        })
    }
}

impl std::fmt::Debug for PieceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PieceRegistry").finish_non_exhaustive()
    }
}

/// Lazy iterator over registry bindings.
pub struct Bindings<'a> {
    inner: ScanIter<'a>,
}

impl Iterator for Bindings<'_> {
    type Item = LayoutResult<(PieceCid, Cursor)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = match self.inner.next()? {
            Ok(pair) => pair,
            Err(e) => return Some(Err(e.into())),
        };
        Some(decode_binding(&key, &value))
    }
}

fn decode_binding(key: &[u8], value: &[u8]) -> LayoutResult<(PieceCid, Cursor)> {
    match Key::decode(key)? {
        Key::Registry(piece) => Ok((piece, Cursor::new(decode_value(key, value)?)?)),
        other => Err(LayoutError::key_decode(
            key,
            format!("expected a registry key, found {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::encode_prefix;
    use dagkv_store::InMemoryKvStore;
    use dagkv_types::piece::RAW_CODEC;
    use dagkv_types::ContentHash;

    fn piece(seed: &[u8]) -> PieceCid {
        PieceCid::new_v1(RAW_CODEC, &ContentHash::blake3(seed))
    }

    fn cursor(n: u64) -> Cursor {
        Cursor::new(n).unwrap()
    }

    #[test]
    fn bind_then_lookup() {
        let registry = PieceRegistry::new(Arc::new(InMemoryKvStore::new()));
        let p = piece(b"p1");
        registry.bind(&p, cursor(100)).unwrap();
        assert_eq!(registry.lookup(&p).unwrap(), cursor(100));
    }

    #[test]
    fn lookup_of_unbound_piece_is_not_found() {
        let registry = PieceRegistry::new(Arc::new(InMemoryKvStore::new()));
        let p = piece(b"missing");
        match registry.lookup(&p) {
            Err(LayoutError::NotFound(found)) => assert_eq!(found, p),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn rebinding_keeps_only_latest() {
        let registry = PieceRegistry::new(Arc::new(InMemoryKvStore::new()));
        let p = piece(b"p1");
        registry.bind(&p, cursor(100)).unwrap();
        registry.bind(&p, cursor(101)).unwrap();
        assert_eq!(registry.lookup(&p).unwrap(), cursor(101));
        assert_eq!(registry.pieces().unwrap().count(), 1);
    }

    #[test]
    fn pieces_lists_only_registry_keys() {
        let store = Arc::new(InMemoryKvStore::new());
        store.put(&Key::System.encode(), &encode_value(102)).unwrap();
        store
            .put(
                &Key::Entry {
                    cursor: cursor(100),
                    hash: ContentHash::blake3(b"e"),
                }
                .encode(),
                &encode_value(0),
            )
            .unwrap();

        let registry = PieceRegistry::new(store);
        let (a, b) = (piece(b"a"), piece(b"b"));
        registry.bind(&a, cursor(100)).unwrap();
        registry.bind(&b, cursor(101)).unwrap();

        let mut bindings = registry
            .pieces()
            .unwrap()
            .collect::<LayoutResult<Vec<_>>>()
            .unwrap();
        bindings.sort();
        let mut expected = vec![(a, cursor(100)), (b, cursor(101))];
        expected.sort();
        assert_eq!(bindings, expected);
    }

    #[test]
    fn corrupt_binding_value_surfaces() {
        let store = Arc::new(InMemoryKvStore::new());
        let p = piece(b"p");
        store.put(&Key::Registry(p).encode(), b"short").unwrap();
        let registry = PieceRegistry::new(store);
        assert!(matches!(
            registry.lookup(&p),
            Err(LayoutError::CorruptValue { len: 5, .. })
        ));
    }

    #[test]
    fn garbage_under_registry_prefix_is_a_decode_error() {
        let store = Arc::new(InMemoryKvStore::new());
        let mut key = encode_prefix(1);
        key.extend_from_slice(b"not a cid");
        store.put(&key, &encode_value(100)).unwrap();
        let registry = PieceRegistry::new(store);
        let first = registry.pieces().unwrap().next().unwrap();
        assert!(matches!(first, Err(LayoutError::KeyDecode { .. })));
    }
}
