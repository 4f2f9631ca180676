//! Generic-argument substitution.
//!
//! Member signatures of a generic declaration reference the declaration's
//! parameters as `TypeData::Param`. When a member is looked up through an
//! instantiation (`List<int>`), every signature type is rewritten with the
//! bound arguments, interning whatever instantiations the rewrite produces.

use crate::types::{TypeData, TypeId};
use crate::universe::TypeUniverse;
use smallvec::SmallVec;

/// Substitute `args` for parameter references inside `ty`.
///
/// With no arguments the identity is returned untouched, so member lookup on
/// an uninstantiated generic declaration leaves parameter references in
/// place. A parameter index outside `args` also stays untouched; the
/// resolver treats such a signature as belonging to the open declaration.
pub fn apply(db: &dyn TypeUniverse, ty: TypeId, args: &[TypeId]) -> TypeId {
    if args.is_empty() {
        return ty;
    }
    match db.lookup(ty) {
        Some(TypeData::Param { index, .. }) => {
            args.get(index as usize).copied().unwrap_or(ty)
        }
        Some(TypeData::Array(elem)) => {
            let rewritten = apply(db, elem, args);
            if rewritten == elem {
                ty
            } else {
                db.intern(TypeData::Array(rewritten))
            }
        }
        Some(TypeData::Application { base, args: inner }) => {
            let rewritten: SmallVec<[TypeId; 2]> =
                inner.iter().map(|&a| apply(db, a, args)).collect();
            if rewritten == inner {
                ty
            } else {
                db.intern(TypeData::Application {
                    base,
                    args: rewritten,
                })
            }
        }
        _ => ty,
    }
}
