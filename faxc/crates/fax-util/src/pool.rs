//! Generic free-list pool allocator.
//!
//! Fixed-purpose pools back `Conditional`, `IncludeState`,
//! and `Define` so the preprocessor doesn't churn the general allocator while
//! pushing/popping short-lived nested structures. Rust's allocator doesn't
//! need that for throughput, but the free-list *reuse* behavior is still part
//! of the observable design (bounded memory under deep nesting),
//! so `Pool<T>` reproduces it with a `Vec<T>` arena plus a free index stack
//! rather than hand-rolled slab pointers.

/// A handle into a [`Pool`]. Indices are reused once freed, so a stale
/// handle can silently alias a different live value — callers are expected
/// to drop handles promptly once the value they name is logically gone.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PoolHandle(u32);

/// Free-list pool: allocates from `free` before growing `slots`.
pub struct Pool<T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Allocate a slot holding `value`, reusing a freed slot when available.
    pub fn alloc(&mut self, value: T) -> PoolHandle {
        if let Some(idx) = self.free.pop() {
            self.slots[idx as usize] = Some(value);
            PoolHandle(idx)
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Some(value));
            PoolHandle(idx)
        }
    }

    /// Release a slot back to the free list, returning its value.
    ///
    /// Panics if the handle was already freed — callers must never
    /// double-free a `Conditional`/`IncludeState`/`Define` node.
    pub fn free(&mut self, handle: PoolHandle) -> T {
        let slot = &mut self.slots[handle.0 as usize];
        let value = slot.take().expect("double free of pool handle");
        self.free.push(handle.0);
        value
    }

    pub fn get(&self, handle: PoolHandle) -> &T {
        self.slots[handle.0 as usize]
            .as_ref()
            .expect("stale pool handle")
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> &mut T {
        self.slots[handle.0 as usize]
            .as_mut()
            .expect("stale pool handle")
    }

    /// Live (non-freed) slot count.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_get_round_trip() {
        let mut pool = Pool::new();
        let h = pool.alloc(42);
        assert_eq!(*pool.get(h), 42);
    }

    #[test]
    fn freed_slot_is_reused() {
        let mut pool: Pool<i32> = Pool::new();
        let a = pool.alloc(1);
        pool.free(a);
        let b = pool.alloc(2);
        // Reuses the same backing slot index.
        assert_eq!(a, b);
        assert_eq!(*pool.get(b), 2);
    }

    #[test]
    fn live_count_tracks_allocations() {
        let mut pool = Pool::new();
        let a = pool.alloc("a");
        let _b = pool.alloc("b");
        assert_eq!(pool.live_count(), 2);
        pool.free(a);
        assert_eq!(pool.live_count(), 1);
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn double_free_panics() {
        let mut pool = Pool::new();
        let h = pool.alloc(1);
        pool.free(h);
        pool.free(h);
    }
}
