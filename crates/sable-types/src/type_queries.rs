//! Read-only queries over the type universe.
//!
//! These are the building blocks the protocol resolver composes: member
//! lookup with generic substitution, base-chain walks, and the transitive
//! implemented-interface closure with bound arguments.

use crate::instantiate::apply;
use crate::types::{DeclId, MethodId, PropertyId, StorageCategory, TypeData, TypeFlags, TypeId};
use crate::universe::TypeUniverse;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// A method found on a type, with generic arguments already substituted
/// into its signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundMethod {
    pub id: MethodId,
    /// Type the handle was found on (instantiated).
    pub found_on: TypeId,
    pub params: SmallVec<[TypeId; 2]>,
    pub return_type: TypeId,
}

/// A property found on a type, with generic arguments substituted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundProperty {
    pub id: PropertyId,
    pub found_on: TypeId,
    pub type_id: TypeId,
}

/// Split a nominal type into its declaration and bound generic arguments.
/// Returns `None` for intrinsics, arrays, and parameter references.
pub fn decompose(db: &dyn TypeUniverse, ty: TypeId) -> Option<(DeclId, SmallVec<[TypeId; 2]>)> {
    match db.lookup(ty)? {
        TypeData::Declared(decl) => Some((decl, SmallVec::new())),
        TypeData::Application { base, args } => match db.lookup(base)? {
            TypeData::Declared(decl) => Some((decl, args)),
            _ => None,
        },
        _ => None,
    }
}

/// Storage category of a type. Instantiations share their declaration's
/// category; intrinsics and parameters behave as values, arrays as
/// references.
pub fn storage_category(db: &dyn TypeUniverse, ty: TypeId) -> StorageCategory {
    match decompose(db, ty) {
        Some((decl, _)) => db.decl(decl).category,
        None => match db.lookup(ty) {
            Some(TypeData::Array(_)) => StorageCategory::Reference,
            _ => StorageCategory::Value,
        },
    }
}

/// Whether conformance questions about `ty` are fully decided at its
/// declaration. Non-nominal types have no subtypes.
pub fn is_sealed(db: &dyn TypeUniverse, ty: TypeId) -> bool {
    match decompose(db, ty) {
        Some((decl, _)) => db.decl(decl).flags.contains(TypeFlags::SEALED),
        None => true,
    }
}

/// Own public instance method declared directly on `ty` with the given name
/// and arity. No base-type or interface walk. First declared match wins.
pub fn own_instance_method(
    db: &dyn TypeUniverse,
    ty: TypeId,
    name: crate::interner::Atom,
    arity: usize,
) -> Option<BoundMethod> {
    let (decl_id, args) = decompose(db, ty)?;
    let decl = db.decl(decl_id);
    for &mid in &decl.methods {
        let method = db.method(mid);
        if method.name == name && method.is_public_instance() && method.params.len() == arity {
            return Some(bind_method(db, mid, ty, &args));
        }
    }
    None
}

/// Own public readable instance property declared directly on `ty`.
pub fn own_instance_property(
    db: &dyn TypeUniverse,
    ty: TypeId,
    name: crate::interner::Atom,
) -> Option<BoundProperty> {
    let (decl_id, args) = decompose(db, ty)?;
    let decl = db.decl(decl_id);
    for &pid in &decl.properties {
        let property = db.property(pid);
        if property.name == name && property.is_public_instance() && property.is_readable() {
            return Some(BoundProperty {
                id: pid,
                found_on: ty,
                type_id: apply(db, property.type_id, &args),
            });
        }
    }
    None
}

/// Public instance method on `ty` or inherited through its base chain,
/// nearest declaration first.
pub fn instance_method(
    db: &dyn TypeUniverse,
    ty: TypeId,
    name: crate::interner::Atom,
    arity: usize,
) -> Option<BoundMethod> {
    let mut current = Some(ty);
    while let Some(t) = current {
        if let Some(found) = own_instance_method(db, t, name, arity) {
            return Some(found);
        }
        current = base_of(db, t);
    }
    None
}

/// Public readable instance property on `ty` or inherited through its base
/// chain, nearest declaration first.
pub fn instance_property(
    db: &dyn TypeUniverse,
    ty: TypeId,
    name: crate::interner::Atom,
) -> Option<BoundProperty> {
    let mut current = Some(ty);
    while let Some(t) = current {
        if let Some(found) = own_instance_property(db, t, name) {
            return Some(found);
        }
        current = base_of(db, t);
    }
    None
}

/// Base type of `ty` with the instantiation's arguments substituted in.
pub fn base_of(db: &dyn TypeUniverse, ty: TypeId) -> Option<TypeId> {
    let (decl_id, args) = decompose(db, ty)?;
    let base = db.decl(decl_id).base?;
    Some(apply(db, base, &args))
}

/// Transitive closure of interfaces implemented by `ty`, with generic
/// arguments bound at every hop: through the base chain and through
/// interface extension.
pub fn implemented_interfaces(db: &dyn TypeUniverse, ty: TypeId) -> Vec<TypeId> {
    let mut out = Vec::new();
    let mut seen = FxHashSet::default();
    let mut stack = vec![ty];
    while let Some(t) = stack.pop() {
        let Some((decl_id, args)) = decompose(db, t) else {
            continue;
        };
        let decl = db.decl(decl_id);
        for &iface in &decl.interfaces {
            let bound = apply(db, iface, &args);
            if seen.insert(bound) {
                out.push(bound);
                stack.push(bound);
            }
        }
        if let Some(base) = decl.base {
            let bound = apply(db, base, &args);
            if seen.insert(bound) {
                stack.push(bound);
            }
        }
    }
    out
}

/// Test whether `ty` is, or provably implements, the interface declared as
/// `target`, returning the bound generic arguments of the conforming
/// instantiation.
pub fn implements(
    db: &dyn TypeUniverse,
    ty: TypeId,
    target: DeclId,
) -> Option<SmallVec<[TypeId; 2]>> {
    if let Some((decl, args)) = decompose(db, ty) {
        if decl == target {
            return Some(args);
        }
    }
    for iface in implemented_interfaces(db, ty) {
        if let Some((decl, args)) = decompose(db, iface) {
            if decl == target {
                return Some(args);
            }
        }
    }
    None
}

fn bind_method(
    db: &dyn TypeUniverse,
    id: MethodId,
    found_on: TypeId,
    args: &[TypeId],
) -> BoundMethod {
    let method = db.method(id);
    BoundMethod {
        id,
        found_on,
        params: method.params.iter().map(|&p| apply(db, p, args)).collect(),
        return_type: apply(db, method.return_type, args),
    }
}
