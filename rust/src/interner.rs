//! Name interning for the task arena.
//!
//! Task names from the load contract are mapped to dense integer ids once, so
//! every edge list and per-task table in the engine is a plain `Vec` index.

use rustc_hash::FxHashMap;

/// Dense task id (u32 for compact edge lists).
pub type TaskId = u32;

/// Bidirectional name <-> id table. Ids are assigned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct NameInterner {
    to_id: FxHashMap<String, TaskId>,
    names: Vec<String>,
}

impl NameInterner {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_id: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            names: Vec::with_capacity(capacity),
        }
    }

    /// Intern a name. Returns the id and whether the name was new.
    pub fn intern(&mut self, name: &str) -> (TaskId, bool) {
        if let Some(&id) = self.to_id.get(name) {
            return (id, false);
        }
        let id = self.names.len() as TaskId;
        self.names.push(name.to_string());
        self.to_id.insert(name.to_string(), id);
        (id, true)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<TaskId> {
        self.to_id.get(name).copied()
    }

    #[inline]
    pub fn resolve(&self, id: TaskId) -> Option<&str> {
        self.names.get(id as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_assigns_dense_ids_in_order() {
        let mut interner = NameInterner::with_capacity(4);

        let (one, new_one) = interner.intern("one");
        let (two, new_two) = interner.intern("two");
        let (again, new_again) = interner.intern("one");

        assert_eq!((one, two), (0, 1));
        assert!(new_one && new_two);
        assert_eq!(again, one);
        assert!(!new_again);
        assert_eq!(interner.len(), 2);

        assert_eq!(interner.resolve(two), Some("two"));
        assert_eq!(interner.get("one"), Some(0));
        assert_eq!(interner.get("three"), None);
        assert_eq!(interner.resolve(7), None);
    }
}
