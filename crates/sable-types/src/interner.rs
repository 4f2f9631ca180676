//! Member-name interning.
//!
//! Member lookup compares names constantly during protocol resolution, so
//! names are interned once into `Atom`s and compared as integers afterwards.
//! Interning goes through `&self` (sharded maps) so a universe shared across
//! threads can intern lookup names without synchronizing externally.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Interned name handle. Equality is O(1) and stable for the lifetime of the
/// owning interner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom(u32);

impl Atom {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Two-way name interner backed by sharded maps.
#[derive(Debug, Default)]
pub struct NameInterner {
    forward: DashMap<Arc<str>, Atom>,
    reverse: DashMap<Atom, Arc<str>>,
    next: AtomicU32,
}

impl NameInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning the existing atom when already present.
    pub fn intern(&self, text: &str) -> Atom {
        if let Some(atom) = self.forward.get(text) {
            return *atom;
        }
        let entry = self.forward.entry(Arc::from(text)).or_insert_with(|| {
            let atom = Atom(self.next.fetch_add(1, Ordering::Relaxed));
            self.reverse.insert(atom, Arc::from(text));
            atom
        });
        *entry
    }

    /// Resolve an atom back to its text.
    ///
    /// Panics when handed an atom from a different interner; that is a
    /// malformed-universe fault, not an expected failure.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        match self.reverse.get(&atom) {
            Some(text) => Arc::clone(&text),
            None => panic!("malformed type universe: unknown name atom {atom:?}"),
        }
    }
}
