//! Identity tracking for shared and cyclic instances.

use rustc_hash::FxHashMap;

use crate::value::ObjectRef;

/// Per-operation map from object identity to visit count and assigned name.
///
/// Visited objects are pinned so that identities stay unique while the
/// table lives.
pub struct ReferenceTable {
    counts: FxHashMap<usize, usize>,
    names: FxHashMap<usize, String>,
    pinned: Vec<ObjectRef>,
    prefix: String,
    next: usize,
}

impl ReferenceTable {
    /// Create a table generating names `<prefix><n>`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            counts: FxHashMap::default(),
            names: FxHashMap::default(),
            pinned: Vec::new(),
            prefix: prefix.into(),
            next: 0,
        }
    }

    /// Count a visit. Returns `true` on the first visit.
    pub fn visit(&mut self, object: &ObjectRef) -> bool {
        let count = self.counts.entry(object.id()).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.pinned.push(object.clone());
            true
        } else {
            false
        }
    }

    /// Whether the object was reached more than once.
    pub fn is_shared(&self, object: &ObjectRef) -> bool {
        self.counts.get(&object.id()).is_some_and(|&n| n > 1)
    }

    /// Assign the next reference name.
    pub fn assign(&mut self, object: &ObjectRef) -> String {
        let name = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        log::trace!("assigned reference {name}");
        self.names.insert(object.id(), name.clone());
        name
    }

    /// Name assigned to an already emitted object.
    pub fn name_of(&self, object: &ObjectRef) -> Option<&str> {
        self.names.get(&object.id()).map(String::as_str)
    }

    /// Number of objects reached more than once.
    pub fn shared_count(&self) -> usize {
        self.counts.values().filter(|&&n| n > 1).count()
    }
}
