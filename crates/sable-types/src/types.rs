//! Core type representation.
//!
//! Types are interned: structurally equal `TypeData` values map to the same
//! `TypeId`, so type equality during resolution is an integer comparison.
//! Declared (nominal) types carry their member tables by handle; members are
//! never stored inline so descriptors can reference them cheaply.

use crate::interner::Atom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Interned type identity. `TypeId` comparison is the only equality the
/// resolution engine ever performs on types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Pre-seeded intrinsic: `bool`.
    pub const BOOL: TypeId = TypeId(0);
    /// Pre-seeded intrinsic: `int`.
    pub const INT: TypeId = TypeId(1);
    /// Pre-seeded intrinsic: `unit`.
    pub const UNIT: TypeId = TypeId(2);
}

/// Handle to a declared (nominal) type's record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub u32);

/// Handle to a method signature in the universe's member table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId(pub u32);

/// Handle to a property in the universe's member table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub u32);

/// Handle to a free (extension) function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FreeFunctionId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntrinsicKind {
    Bool,
    Int,
    Unit,
}

/// Structural payload behind a `TypeId`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    /// Built-in scalar.
    Intrinsic(IntrinsicKind),

    /// Intrinsic array-like type with a known length accessor.
    Array(TypeId),

    /// A generic parameter of a declared type, referenced by position.
    /// The name is carried for display only.
    Param { index: u32, name: Atom },

    /// Instantiation of a generic declared type: `base<args...>`.
    Application {
        base: TypeId,
        args: SmallVec<[TypeId; 2]>,
    },

    /// Declared nominal type (struct, class, interface, stack-only struct).
    Declared(DeclId),
}

/// Where values of a type live, which decides the resource-release strategy
/// for iterators of that type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageCategory {
    /// Copied value type; can implement interfaces, cannot be null.
    Value,
    /// Heap reference type; handles may be null.
    Reference,
    /// Value type barred from heap allocation, boxing, and escaping its
    /// frame; cannot implement interfaces in this model.
    StackOnlyValue,
    /// Interface type; the dynamic instance is not statically known.
    Interface,
}

bitflags::bitflags! {
    /// Declaration-level facts about a nominal type.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        /// No subtypes can exist; conformance is fully decided here.
        const SEALED = 1 << 0;
    }
}

bitflags::bitflags! {
    /// Member accessibility and shape bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u8 {
        const PUBLIC = 1 << 0;
        const STATIC = 1 << 1;
        /// Property has a getter (is readable).
        const GETTER = 1 << 2;
        /// Property has a setter.
        const SETTER = 1 << 3;
    }
}

/// Record of a declared nominal type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: Atom,
    pub category: StorageCategory,
    pub flags: TypeFlags,
    /// Generic parameter names; members reference them as `TypeData::Param`.
    pub generic_params: SmallVec<[Atom; 2]>,
    /// Base type, possibly an instantiation of a generic base.
    pub base: Option<TypeId>,
    /// Directly implemented interfaces with bound generic arguments.
    /// For interfaces these are the extended interfaces.
    pub interfaces: Vec<TypeId>,
    pub methods: Vec<MethodId>,
    pub properties: Vec<PropertyId>,
}

/// An instance or static method signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodData {
    pub name: Atom,
    /// Declaring type (the uninstantiated declared type).
    pub owner: TypeId,
    pub params: SmallVec<[TypeId; 2]>,
    pub return_type: TypeId,
    pub flags: MemberFlags,
}

/// A property with optional getter/setter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyData {
    pub name: Atom,
    pub owner: TypeId,
    pub type_id: TypeId,
    pub flags: MemberFlags,
}

/// A free function. When used as an extension, the first parameter is the
/// receiver type it is bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FreeFunctionData {
    pub name: Atom,
    pub params: SmallVec<[TypeId; 2]>,
    pub return_type: TypeId,
}

impl MethodData {
    pub fn is_public_instance(&self) -> bool {
        self.flags.contains(MemberFlags::PUBLIC) && !self.flags.contains(MemberFlags::STATIC)
    }
}

impl PropertyData {
    pub fn is_public_instance(&self) -> bool {
        self.flags.contains(MemberFlags::PUBLIC) && !self.flags.contains(MemberFlags::STATIC)
    }

    pub fn is_readable(&self) -> bool {
        self.flags.contains(MemberFlags::GETTER)
    }
}
