//! Resource category classification.
//!
//! Iterators may hold resources that must be released on every loop exit
//! path. Which release strategy applies depends on the iterator's storage
//! category and on whether its conformance to the release protocol can be
//! proven at the binding site. Each category maps to exactly one IR shape;
//! the synthesizer never re-derives any of this.

use crate::protocol::Flavor;
use sable_types::{
    MethodId, StorageCategory, TypeId, TypeUniverse, decompose, implements, instance_method,
    is_sealed, own_instance_method, storage_category,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Release strategy for a resolved iterator type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    /// No release call is emitted.
    None,
    /// Stack-only value with an own release method; called unconditionally.
    /// Stack-only types cannot implement the release interface, so only the
    /// direct method is ever probed.
    StackOnlyDisposable,
    /// Value type implementing the release interface; called
    /// unconditionally, since a value cannot be absent.
    ValueDisposable,
    /// Reference type proven to implement the release interface; called
    /// behind a null check.
    ReferenceDisposable,
    /// Reference handle whose conformance cannot be proven at the binding
    /// site (interface-typed or unsealed). Release is deferred to a runtime
    /// type test, evaluated exactly once after the loop.
    ReferenceMaybeDisposable,
}

/// Category plus the release member it selected, when any.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: ResourceCategory,
    pub release: Option<MethodId>,
}

impl Classification {
    const NONE: Classification = Classification {
        category: ResourceCategory::None,
        release: None,
    };
}

/// Determine the release strategy for `iterator`.
pub fn classify(db: &dyn TypeUniverse, iterator: TypeId, flavor: Flavor) -> Classification {
    let release_name = db.intern_name(flavor.release_name());
    let classification = match storage_category(db, iterator) {
        StorageCategory::StackOnlyValue => {
            match own_instance_method(db, iterator, release_name, 0) {
                Some(release) => Classification {
                    category: ResourceCategory::StackOnlyDisposable,
                    release: Some(release.id),
                },
                None => Classification::NONE,
            }
        }
        StorageCategory::Value => match release_member(db, iterator, flavor) {
            Some(release) => Classification {
                category: ResourceCategory::ValueDisposable,
                release: Some(release),
            },
            None => Classification::NONE,
        },
        StorageCategory::Interface => match release_member(db, iterator, flavor) {
            Some(release) => Classification {
                category: ResourceCategory::ReferenceDisposable,
                release: Some(release),
            },
            None => deferred_release(db, flavor),
        },
        StorageCategory::Reference => match release_member(db, iterator, flavor) {
            Some(release) => Classification {
                category: ResourceCategory::ReferenceDisposable,
                release: Some(release),
            },
            None if is_sealed(db, iterator) => Classification::NONE,
            None => deferred_release(db, flavor),
        },
    };
    trace!(
        iterator = iterator.0,
        category = ?classification.category,
        "classified iterator resource category"
    );
    classification
}

/// Release member when `ty` provably implements the release interface:
/// the type's own declaration when it redeclares the member, otherwise the
/// interface's.
fn release_member(db: &dyn TypeUniverse, ty: TypeId, flavor: Flavor) -> Option<MethodId> {
    let interface = db.well_known(flavor.release_interface())?;
    let (interface_decl, _) = decompose(db, interface)?;
    implements(db, ty, interface_decl)?;
    let release_name = db.intern_name(flavor.release_name());
    instance_method(db, ty, release_name, 0)
        .or_else(|| own_instance_method(db, interface, release_name, 0))
        .map(|m| m.id)
}

/// Unproven conformance: defer to a runtime type test against the release
/// interface. Without a registered release interface the test cannot be
/// expressed and no release is emitted.
fn deferred_release(db: &dyn TypeUniverse, flavor: Flavor) -> Classification {
    let Some(interface) = db.well_known(flavor.release_interface()) else {
        return Classification::NONE;
    };
    let release_name = db.intern_name(flavor.release_name());
    match own_instance_method(db, interface, release_name, 0) {
        Some(release) => Classification {
            category: ResourceCategory::ReferenceMaybeDisposable,
            release: Some(release.id),
        },
        None => Classification::NONE,
    }
}
