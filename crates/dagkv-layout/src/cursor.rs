use std::sync::Arc;

use dagkv_store::KvStore;
use dagkv_types::Cursor;
use tracing::debug;

use crate::error::{LayoutError, LayoutResult};
use crate::keys::{decode_value, encode_value, Key};

/// Owner of the system counter: the next free namespace id.
///
/// `allocate` is a compare-and-swap loop on the counter key, so concurrent
/// importers sharing one store never receive the same cursor and never
/// skip one.
#[derive(Clone)]
pub struct CursorAllocator {
    store: Arc<dyn KvStore>,
}

impl CursorAllocator {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// The next cursor `allocate` would return.
    pub fn current(&self) -> LayoutResult<Cursor> {
        let key = Key::System.encode();
        let raw = self
            .store
            .get(&key)?
            .ok_or(LayoutError::NotInitialized)?;
        Ok(Cursor::new(decode_value(&key, &raw)?)?)
    }

    /// Set the counter unconditionally.
    pub fn initialize(&self, start: Cursor) -> LayoutResult<()> {
        self.store
            .put(&Key::System.encode(), &encode_value(start.get()))?;
        debug!(start = %start, "cursor counter initialized");
        Ok(())
    }

    /// Set the counter to `start` only if it was never set. Returns the
    /// counter's value afterwards.
    pub fn ensure_initialized(&self, start: Cursor) -> LayoutResult<Cursor> {
        let key = Key::System.encode();
        if self
            .store
            .compare_and_swap(&key, None, &encode_value(start.get()))?
        {
            debug!(start = %start, "cursor counter initialized");
            return Ok(start);
        }
        self.current()
    }

    /// Move the counter to `start`, seeding it if it was never set. Fails
    /// with `CounterRegression` if `start` is below the current value, since
    /// every cursor under the current value may already own a namespace.
    pub fn reseed(&self, start: Cursor) -> LayoutResult<Cursor> {
        let key = Key::System.encode();
        let new = encode_value(start.get());
        loop {
            let raw = self.store.get(&key)?;
            if let Some(raw) = &raw {
                let current = Cursor::new(decode_value(&key, raw)?)?;
                if start < current {
                    return Err(LayoutError::CounterRegression {
                        current,
                        requested: start,
                    });
                }
            }
            if self.store.compare_and_swap(&key, raw.as_deref(), &new)? {
                debug!(start = %start, "cursor counter reseeded");
                return Ok(start);
            }
        }
    }

    /// Hand out the current cursor and advance the counter by one.
    pub fn allocate(&self) -> LayoutResult<Cursor> {
        let key = Key::System.encode();
        loop {
            let raw = self
                .store
                .get(&key)?
                .ok_or(LayoutError::NotInitialized)?;
            let cursor = Cursor::new(decode_value(&key, &raw)?)?;
            let next = cursor.next()?;
            if self
                .store
                .compare_and_swap(&key, Some(raw.as_slice()), &encode_value(next.get()))?
            {
                debug!(cursor = %cursor, "cursor allocated");
                return Ok(cursor);
            }
            debug!(cursor = %cursor, "cursor allocation raced, retrying");
        }
    }
}

impl std::fmt::Debug for CursorAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorAllocator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagkv_store::InMemoryKvStore;
    use dagkv_types::TypeError;
    use std::thread;

    fn allocator() -> CursorAllocator {
        CursorAllocator::new(Arc::new(InMemoryKvStore::new()))
    }

    #[test]
    fn current_before_initialize_fails() {
        let alloc = allocator();
        assert!(matches!(alloc.current(), Err(LayoutError::NotInitialized)));
        assert!(matches!(alloc.allocate(), Err(LayoutError::NotInitialized)));
    }

    #[test]
    fn first_allocation_is_100() {
        let alloc = allocator();
        alloc.initialize(Cursor::FIRST).unwrap();
        assert_eq!(alloc.allocate().unwrap().get(), 100);
        assert_eq!(alloc.current().unwrap().get(), 101);
    }

    #[test]
    fn allocations_strictly_increase() {
        let alloc = allocator();
        alloc.initialize(Cursor::FIRST).unwrap();
        let mut last = alloc.allocate().unwrap();
        for _ in 0..20 {
            let next = alloc.allocate().unwrap();
            assert!(next > last);
            assert!(next.get() >= 100);
            last = next;
        }
    }

    #[test]
    fn initialize_overwrites() {
        let alloc = allocator();
        alloc.initialize(Cursor::FIRST).unwrap();
        alloc.allocate().unwrap();
        alloc.initialize(Cursor::new(500).unwrap()).unwrap();
        assert_eq!(alloc.allocate().unwrap().get(), 500);
    }

    #[test]
    fn reseed_moves_forward_only() {
        let alloc = allocator();
        assert_eq!(alloc.reseed(Cursor::new(200).unwrap()).unwrap().get(), 200);
        assert_eq!(alloc.allocate().unwrap().get(), 200);
        assert_eq!(alloc.reseed(Cursor::new(201).unwrap()).unwrap().get(), 201);
        assert_eq!(alloc.reseed(Cursor::new(900).unwrap()).unwrap().get(), 900);

        let err = alloc.reseed(Cursor::FIRST).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::CounterRegression { current, requested }
                if current.get() == 900 && requested == Cursor::FIRST
        ));
        assert_eq!(alloc.current().unwrap().get(), 900);
    }

    #[test]
    fn ensure_initialized_does_not_reseed() {
        let alloc = allocator();
        assert_eq!(alloc.ensure_initialized(Cursor::FIRST).unwrap().get(), 100);
        alloc.allocate().unwrap();
        alloc.allocate().unwrap();
        assert_eq!(alloc.ensure_initialized(Cursor::FIRST).unwrap().get(), 102);
    }

    #[test]
    fn reserved_counter_value_is_rejected() {
        let store = Arc::new(InMemoryKvStore::new());
        store.put(&Key::System.encode(), &encode_value(7)).unwrap();
        let alloc = CursorAllocator::new(store);
        assert!(matches!(
            alloc.allocate(),
            Err(LayoutError::Type(TypeError::ReservedCursor(7)))
        ));
    }

    #[test]
    fn exhausted_counter_overflows() {
        let alloc = allocator();
        alloc.initialize(Cursor::new(u64::MAX).unwrap()).unwrap();
        assert!(matches!(
            alloc.allocate(),
            Err(LayoutError::Type(TypeError::CursorOverflow))
        ));
    }

    #[test]
    fn concurrent_allocations_are_unique_and_dense() {
        let alloc = allocator();
        alloc.initialize(Cursor::FIRST).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let alloc = alloc.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|_| alloc.allocate().unwrap().get())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("allocator thread panicked"))
            .collect();
        all.sort();
        assert_eq!(all, (100..300).collect::<Vec<_>>());
        assert_eq!(alloc.current().unwrap().get(), 300);
    }
}
