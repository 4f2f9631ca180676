//! Type universe for the sable loop-binding core.
//!
//! This crate provides the introspection substrate the protocol resolver
//! works against:
//! - Name interning (`Atom`, `NameInterner`)
//! - Interned structural types (`TypeId`, `TypeData`) with pre-seeded
//!   intrinsics
//! - Declared-type records with storage categories, flags, and member tables
//! - The `TypeUniverse` query trait the front-ends implement
//! - A concrete `TypeStore` with a builder API
//! - Generic substitution, member/interface queries, and type display
//!
//! Everything here is identity-based and immutable once built: queries hand
//! out copyable handles, and structural interning makes type equality an
//! integer comparison.

pub mod display;
pub mod instantiate;
pub mod interner;
pub mod store;
pub mod type_queries;
pub mod types;
pub mod universe;

pub use display::format_type;
pub use instantiate::apply;
pub use interner::{Atom, NameInterner};
pub use store::TypeStore;
pub use type_queries::{
    BoundMethod, BoundProperty, base_of, decompose, implemented_interfaces, implements,
    instance_method, instance_property, is_sealed, own_instance_method, own_instance_property,
    storage_category,
};
pub use types::{
    DeclId, FreeFunctionData, FreeFunctionId, IntrinsicKind, MemberFlags, MethodData, MethodId,
    PropertyData, PropertyId, StorageCategory, TypeData, TypeDecl, TypeFlags, TypeId,
};
pub use universe::{TypeUniverse, WellKnown};
