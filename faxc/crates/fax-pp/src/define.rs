//! Macro table: 256-bucket hashed map from identifier to [`Define`].

use fax_util::pool::{Pool, PoolHandle};
use fax_util::symbol::djb2_xor_hash;

const BUCKET_COUNT: usize = 256;

/// A macro-table entry. Object-like macros have `paramcount == 0`;
/// function-like macros with zero formal parameters (`#define a()`) use
/// `paramcount == -1`; function-like macros with N parameters use N.
#[derive(Clone, Debug)]
pub struct Define {
    pub identifier: String,
    pub definition: String,
    pub original: Option<String>,
    pub parameters: Vec<String>,
    pub paramcount: i32,
}

impl Define {
    pub fn object_like(identifier: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            definition: definition.into(),
            original: None,
            parameters: Vec::new(),
            paramcount: 0,
        }
    }

    pub fn is_function_like(&self) -> bool {
        self.paramcount != 0
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p == name)
    }
}

fn bucket_index(name: &str) -> usize {
    (djb2_xor_hash(name.as_bytes()) as usize) & (BUCKET_COUNT - 1)
}

/// Hash-chained macro table, pool-backed for handle reuse.
pub struct MacroTable {
    pool: Pool<Define>,
    buckets: Vec<Vec<PoolHandle>>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self {
            pool: Pool::new(),
            buckets: vec![Vec::new(); BUCKET_COUNT],
        }
    }

    /// Insert at the head of its chain. Re-definition of an existing name
    /// is rejected rather than silently replaced.
    pub fn add_define(&mut self, define: Define) -> Result<(), Define> {
        if self.find_define(&define.identifier).is_some() {
            return Err(define);
        }
        let bucket = bucket_index(&define.identifier);
        let handle = self.pool.alloc(define);
        self.buckets[bucket].insert(0, handle);
        Ok(())
    }

    pub fn find_define(&self, name: &str) -> Option<&Define> {
        let bucket = &self.buckets[bucket_index(name)];
        bucket
            .iter()
            .map(|&h| self.pool.get(h))
            .find(|d| d.identifier == name)
    }

    /// Unlinks and pools the node. Returns whether a mapping existed.
    pub fn remove_define(&mut self, name: &str) -> bool {
        let bucket_idx = bucket_index(name);
        let bucket = &mut self.buckets[bucket_idx];
        if let Some(pos) = bucket
            .iter()
            .position(|&h| self.pool.get(h).identifier == name)
        {
            let handle = bucket.remove(pos);
            self.pool.free(handle);
            true
        } else {
            false
        }
    }
}

impl Default for MacroTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_find() {
        let mut table = MacroTable::new();
        table.add_define(Define::object_like("A", "2")).unwrap();
        assert_eq!(table.find_define("A").unwrap().definition, "2");
    }

    #[test]
    fn duplicate_define_is_rejected() {
        let mut table = MacroTable::new();
        table.add_define(Define::object_like("A", "1")).unwrap();
        let err = table.add_define(Define::object_like("A", "2"));
        assert!(err.is_err());
    }

    #[test]
    fn undef_then_redefine_succeeds() {
        let mut table = MacroTable::new();
        table.add_define(Define::object_like("A", "1")).unwrap();
        assert!(table.remove_define("A"));
        assert!(table.find_define("A").is_none());
        table.add_define(Define::object_like("A", "2")).unwrap();
        assert_eq!(table.find_define("A").unwrap().definition, "2");
    }

    #[test]
    fn define_then_undef_is_identity() {
        let mut table = MacroTable::new();
        table.add_define(Define::object_like("X", "Y")).unwrap();
        table.remove_define("X");
        assert!(table.find_define("X").is_none());
    }
}
