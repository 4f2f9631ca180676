//! Caller-owned resolution memoization.
//!
//! Resolution is pure, so results can be memoized by type identity. The
//! engine mandates no caching internally; embedding tools that resolve the
//! same types repeatedly own one of these per universe and key it however
//! long their universe lives.

use crate::protocol::{ProtocolDescriptor, ProtocolFamily, ResolutionError};
use crate::resolver::resolve;
use rustc_hash::FxHashMap;
use sable_types::{TypeId, TypeUniverse};

/// Memoized `resolve` keyed by (subject, family).
#[derive(Default)]
pub struct ResolutionCache {
    entries: FxHashMap<(TypeId, ProtocolFamily), Result<ProtocolDescriptor, ResolutionError>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(
        &mut self,
        db: &dyn TypeUniverse,
        subject: TypeId,
        family: ProtocolFamily,
    ) -> &Result<ProtocolDescriptor, ResolutionError> {
        self.entries
            .entry((subject, family))
            .or_insert_with(|| resolve(db, subject, family))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
