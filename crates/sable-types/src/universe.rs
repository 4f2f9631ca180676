//! The type-universe query contract.
//!
//! Front-ends (runtime reflection or static analysis) supply type
//! information behind this trait; the resolution engine only ever consumes
//! `&dyn TypeUniverse`. All queries are read-only from the caller's point of
//! view; interning new instantiations during substitution goes through
//! interior sharding, so a universe can be shared across threads freely.

use crate::interner::Atom;
use crate::types::{
    DeclId, FreeFunctionData, FreeFunctionId, MethodData, MethodId, PropertyData, PropertyId,
    TypeData, TypeDecl, TypeId,
};
use std::sync::Arc;

/// Well-known types the universe can resolve for the engine: the canonical
/// generic protocol interfaces per family plus the auxiliary types the
/// protocols mention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WellKnown {
    /// Canonical sync iterable interface (`Iterable<T>`).
    Iterable,
    /// Canonical async iterable interface (`AsyncIterable<T>`).
    AsyncIterable,
    /// Canonical sync iterator interface (`Iterator<T>`).
    Iterator,
    /// Canonical async iterator interface (`AsyncIterator<T>`).
    AsyncIterator,
    /// Release-protocol interface (`Disposable`).
    Disposable,
    /// Async release-protocol interface (`AsyncDisposable`).
    AsyncDisposable,
    /// Suspension wrapper base (`Future<T>`).
    Future,
    /// Cancellation-style token type passed through acquire opaquely.
    CancelToken,
}

/// Uniform introspection contract over a front-end's type information.
///
/// Member accessors (`decl`, `method`, `property`, `free_function`) panic on
/// dangling handles: a handle that does not belong to this universe is a
/// malformed descriptor, which is a contract violation by the embedding
/// tool, not an expected failure.
pub trait TypeUniverse: Sync {
    /// Structural payload of a type, or `None` for an id this universe never
    /// issued.
    fn lookup(&self, id: TypeId) -> Option<TypeData>;

    /// Intern a structural type, returning the existing id when present.
    /// Needed by generic substitution, which can mention instantiations the
    /// front-end never wrote down.
    fn intern(&self, data: TypeData) -> TypeId;

    fn decl(&self, id: DeclId) -> TypeDecl;
    fn method(&self, id: MethodId) -> MethodData;
    fn property(&self, id: PropertyId) -> PropertyData;
    fn free_function(&self, id: FreeFunctionId) -> FreeFunctionData;

    /// Free functions with the given name, in declaration order. The
    /// reflection front-end returns an empty list.
    fn free_functions_named(&self, name: Atom) -> Vec<FreeFunctionId>;

    fn well_known(&self, which: WellKnown) -> Option<TypeId>;

    fn intern_name(&self, text: &str) -> Atom;
    fn name(&self, atom: Atom) -> Arc<str>;
}
