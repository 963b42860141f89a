//! Filename intern cache, owned by each preprocessor context.
//!
//! Unlike `fax_util::symbol::StringCache` (which hands back a `Symbol`
//! resolved through the cache's own borrow), filenames need to travel
//! inside [`crate::Span`]/`IncludeState` as cheap, independently-ownable
//! handles — a `Span` outlives any one `next_token` call. This cache
//! dedupes by content over the same 256-bucket, move-to-front hashed
//! scheme `StringCache` uses, but returns `Rc<str>` clones directly
//! instead of a `Symbol` handle.

use fax_util::symbol::djb2_xor_hash;
use std::rc::Rc;

const BUCKET_COUNT: usize = 256;

fn bucket_of(s: &str) -> usize {
    (djb2_xor_hash(s.as_bytes()) as usize) & (BUCKET_COUNT - 1)
}

pub struct FilenameCache {
    arena: Vec<Rc<str>>,
    buckets: Vec<Vec<u32>>,
}

impl Default for FilenameCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FilenameCache {
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            buckets: vec![Vec::new(); BUCKET_COUNT],
        }
    }

    /// Intern `name`, returning a cheap `Rc<str>` clone. Looking up a name
    /// already present promotes it to the head of its bucket; the arena
    /// itself never reorders.
    pub fn intern(&mut self, name: &str) -> Rc<str> {
        let bucket = &mut self.buckets[bucket_of(name)];
        if let Some(pos) = bucket.iter().position(|&idx| &*self.arena[idx as usize] == name) {
            let idx = bucket.remove(pos);
            bucket.insert(0, idx);
            return Rc::clone(&self.arena[idx as usize]);
        }
        let rc: Rc<str> = Rc::from(name);
        let idx = self.arena.len() as u32;
        self.arena.push(Rc::clone(&rc));
        self.buckets[bucket_of(name)].insert(0, idx);
        rc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_name_twice_shares_allocation() {
        let mut cache = FilenameCache::new();
        let a = cache.intern("main.c");
        let b = cache.intern("main.c");
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_names_are_distinct_allocations() {
        let mut cache = FilenameCache::new();
        let a = cache.intern("main.c");
        let b = cache.intern("other.c");
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn move_to_front_does_not_change_identity() {
        let mut cache = FilenameCache::new();
        let first = cache.intern("alpha.c");
        cache.intern("beta.c");
        cache.intern("gamma.c");
        let again = cache.intern("alpha.c");
        assert!(Rc::ptr_eq(&first, &again));
    }
}
