//! Interned-string handles and the per-context string cache.
//!
//! Unlike a single global, process-lifetime, `DashMap`-backed interner,
//! the preprocessor's string cache and filename cache are each scoped to
//! one `Context`. A [`Symbol`] is only comparable against other symbols
//! drawn from the same [`StringCache`]; there is no global table.

use std::fmt;

/// A handle into a [`StringCache`]. Cheap to copy, stable for the cache's
/// lifetime regardless of later insertions (bucket reordering from
/// move-to-front promotion never changes a symbol's arena index).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// Number of hash buckets.
const BUCKET_COUNT: usize = 256;

/// djb2 hash with a final XOR fold, taking an explicit length rather than
/// requiring a NUL terminator.
///
/// A preprocessor hash taking a NUL-terminated C string while a
/// calculator hash of the same name took a length is a bug worth not
/// replicating. This is the single length-based form used everywhere:
/// the macro table, the string cache, and the filename cache.
pub fn djb2_xor_hash(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 5381;
    for &b in bytes {
        hash = hash.wrapping_mul(33) ^ b as u32;
    }
    hash
}

fn bucket_of(s: &str) -> usize {
    (djb2_xor_hash(s.as_bytes()) as usize) & (BUCKET_COUNT - 1)
}

/// A hashed intern table producing stable [`Symbol`] handles.
///
/// Each of the 256 buckets models a singly-linked chain as a
/// `Vec<u32>` of arena indices, most-recently-looked-up first. Lookups
/// that hit promote their entry to the front of the bucket (move-to-front),
/// but the backing arena never reorders, so a `Symbol`'s
/// index is permanent once issued.
#[derive(Default)]
pub struct StringCache {
    arena: Vec<Box<str>>,
    buckets: Vec<Vec<u32>>,
}

impl StringCache {
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            buckets: vec![Vec::new(); BUCKET_COUNT],
        }
    }

    /// Intern `s`, returning its stable symbol. Looking up a string already
    /// present promotes it to the head of its bucket.
    pub fn intern(&mut self, s: &str) -> Symbol {
        let bucket = &mut self.buckets[bucket_of(s)];
        if let Some(pos) = bucket.iter().position(|&idx| &*self.arena[idx as usize] == s) {
            let idx = bucket.remove(pos);
            bucket.insert(0, idx);
            return Symbol(idx);
        }
        let idx = self.arena.len() as u32;
        self.arena.push(s.into());
        self.buckets[bucket_of(s)].insert(0, idx);
        Symbol(idx)
    }

    /// Resolve a symbol back to its string. Panics on a symbol from a
    /// different cache (out-of-bounds index) — handles are only ever used
    /// against their own cache.
    pub fn get(&self, sym: Symbol) -> &str {
        &self.arena[sym.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}
