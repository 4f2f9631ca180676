//! Concrete `TypeUniverse` backed by interned tables.
//!
//! Front-ends populate a `TypeStore` through the `&mut self` builder API,
//! then hand it to the engine as an immutable universe. Queries clone small
//! records out of the tables; structural interning stays available through
//! `&self` so substitution can mint instantiations during resolution.

use crate::interner::{Atom, NameInterner};
use crate::types::{
    DeclId, FreeFunctionData, FreeFunctionId, IntrinsicKind, MemberFlags, MethodData, MethodId,
    PropertyData, PropertyId, StorageCategory, TypeData, TypeDecl, TypeFlags, TypeId,
};
use crate::universe::{TypeUniverse, WellKnown};
use dashmap::DashMap;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::{Arc, RwLock};

pub struct TypeStore {
    names: NameInterner,
    types: RwLock<Vec<TypeData>>,
    dedup: DashMap<TypeData, TypeId>,
    decls: Vec<TypeDecl>,
    methods: Vec<MethodData>,
    properties: Vec<PropertyData>,
    free_functions: Vec<FreeFunctionData>,
    /// Free functions grouped by name, preserving declaration order.
    free_by_name: IndexMap<Atom, Vec<FreeFunctionId>>,
    well_known: FxHashMap<WellKnown, TypeId>,
}

impl TypeStore {
    pub fn new() -> Self {
        let store = TypeStore {
            names: NameInterner::new(),
            types: RwLock::new(Vec::new()),
            dedup: DashMap::new(),
            decls: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            free_functions: Vec::new(),
            free_by_name: IndexMap::new(),
            well_known: FxHashMap::default(),
        };
        // Seed the intrinsics so the TypeId constants hold.
        assert_eq!(store.intern(TypeData::Intrinsic(IntrinsicKind::Bool)), TypeId::BOOL);
        assert_eq!(store.intern(TypeData::Intrinsic(IntrinsicKind::Int)), TypeId::INT);
        assert_eq!(store.intern(TypeData::Intrinsic(IntrinsicKind::Unit)), TypeId::UNIT);
        store
    }

    // =========================================================================
    // Builder API (front-end side)
    // =========================================================================

    pub fn declare_type(
        &mut self,
        name: &str,
        category: StorageCategory,
        flags: TypeFlags,
    ) -> TypeId {
        self.declare_generic_type(name, category, flags, &[])
    }

    pub fn declare_generic_type(
        &mut self,
        name: &str,
        category: StorageCategory,
        flags: TypeFlags,
        generic_params: &[&str],
    ) -> TypeId {
        let decl_id = DeclId(self.decls.len() as u32);
        self.decls.push(TypeDecl {
            name: self.names.intern(name),
            category,
            flags,
            generic_params: generic_params.iter().map(|p| self.names.intern(p)).collect(),
            base: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
        });
        self.intern(TypeData::Declared(decl_id))
    }

    /// Reference to the `index`-th generic parameter of a generic declared
    /// type, for use inside that declaration's member signatures.
    pub fn generic_param(&self, owner: TypeId, index: usize) -> TypeId {
        let decl = self.decl(self.decl_id_of(owner));
        let name = match decl.generic_params.get(index) {
            Some(&name) => name,
            None => panic!(
                "malformed type universe: `{}` has no generic parameter {index}",
                self.names.resolve(decl.name)
            ),
        };
        self.intern(TypeData::Param {
            index: index as u32,
            name,
        })
    }

    pub fn array(&self, elem: TypeId) -> TypeId {
        self.intern(TypeData::Array(elem))
    }

    pub fn application(&self, base: TypeId, args: &[TypeId]) -> TypeId {
        self.intern(TypeData::Application {
            base,
            args: SmallVec::from_slice(args),
        })
    }

    pub fn set_base(&mut self, ty: TypeId, base: TypeId) {
        let decl = self.decl_id_of(ty);
        self.decls[decl.0 as usize].base = Some(base);
    }

    /// Record that `ty` implements (or, for interfaces, extends) `interface`,
    /// which may be an instantiation binding generic arguments.
    pub fn implement(&mut self, ty: TypeId, interface: TypeId) {
        let decl = self.decl_id_of(ty);
        self.decls[decl.0 as usize].interfaces.push(interface);
    }

    pub fn add_method(
        &mut self,
        owner: TypeId,
        name: &str,
        params: &[TypeId],
        return_type: TypeId,
    ) -> MethodId {
        self.add_method_with_flags(owner, name, params, return_type, MemberFlags::PUBLIC)
    }

    pub fn add_method_with_flags(
        &mut self,
        owner: TypeId,
        name: &str,
        params: &[TypeId],
        return_type: TypeId,
        flags: MemberFlags,
    ) -> MethodId {
        let decl = self.decl_id_of(owner);
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(MethodData {
            name: self.names.intern(name),
            owner,
            params: SmallVec::from_slice(params),
            return_type,
            flags,
        });
        self.decls[decl.0 as usize].methods.push(id);
        id
    }

    pub fn add_property(&mut self, owner: TypeId, name: &str, type_id: TypeId) -> PropertyId {
        self.add_property_with_flags(
            owner,
            name,
            type_id,
            MemberFlags::PUBLIC | MemberFlags::GETTER,
        )
    }

    pub fn add_property_with_flags(
        &mut self,
        owner: TypeId,
        name: &str,
        type_id: TypeId,
        flags: MemberFlags,
    ) -> PropertyId {
        let decl = self.decl_id_of(owner);
        let id = PropertyId(self.properties.len() as u32);
        self.properties.push(PropertyData {
            name: self.names.intern(name),
            owner,
            type_id,
            flags,
        });
        self.decls[decl.0 as usize].properties.push(id);
        id
    }

    /// Register a free function. When used as an extension, `params[0]` is
    /// the receiver type. Declaration order is preserved per name.
    pub fn add_free_function(
        &mut self,
        name: &str,
        params: &[TypeId],
        return_type: TypeId,
    ) -> FreeFunctionId {
        let atom = self.names.intern(name);
        let id = FreeFunctionId(self.free_functions.len() as u32);
        self.free_functions.push(FreeFunctionData {
            name: atom,
            params: SmallVec::from_slice(params),
            return_type,
        });
        self.free_by_name
            .entry(atom)
            .or_insert_with(Vec::new)
            .push(id);
        id
    }

    pub fn set_well_known(&mut self, which: WellKnown, ty: TypeId) {
        self.well_known.insert(which, ty);
    }

    fn decl_id_of(&self, ty: TypeId) -> DeclId {
        match self.lookup(ty) {
            Some(TypeData::Declared(decl)) => decl,
            other => panic!("malformed type universe: {ty:?} is not a declared type ({other:?})"),
        }
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TypeUniverse Implementation
// =============================================================================

impl TypeUniverse for TypeStore {
    fn lookup(&self, id: TypeId) -> Option<TypeData> {
        self.types
            .read()
            .expect("type table poisoned")
            .get(id.0 as usize)
            .cloned()
    }

    fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = self.dedup.get(&data) {
            return *id;
        }
        let mut types = self.types.write().expect("type table poisoned");
        // Re-check under the write lock so racing interns agree on the id.
        if let Some(id) = self.dedup.get(&data) {
            return *id;
        }
        let id = TypeId(types.len() as u32);
        types.push(data.clone());
        self.dedup.insert(data, id);
        id
    }

    fn decl(&self, id: DeclId) -> TypeDecl {
        match self.decls.get(id.0 as usize) {
            Some(decl) => decl.clone(),
            None => panic!("malformed type universe: dangling declaration handle {id:?}"),
        }
    }

    fn method(&self, id: MethodId) -> MethodData {
        match self.methods.get(id.0 as usize) {
            Some(method) => method.clone(),
            None => panic!("malformed type universe: dangling method handle {id:?}"),
        }
    }

    fn property(&self, id: PropertyId) -> PropertyData {
        match self.properties.get(id.0 as usize) {
            Some(property) => property.clone(),
            None => panic!("malformed type universe: dangling property handle {id:?}"),
        }
    }

    fn free_function(&self, id: FreeFunctionId) -> FreeFunctionData {
        match self.free_functions.get(id.0 as usize) {
            Some(function) => function.clone(),
            None => panic!("malformed type universe: dangling free-function handle {id:?}"),
        }
    }

    fn free_functions_named(&self, name: Atom) -> Vec<FreeFunctionId> {
        self.free_by_name.get(&name).cloned().unwrap_or_default()
    }

    fn well_known(&self, which: WellKnown) -> Option<TypeId> {
        self.well_known.get(&which).copied()
    }

    fn intern_name(&self, text: &str) -> Atom {
        self.names.intern(text)
    }

    fn name(&self, atom: Atom) -> Arc<str> {
        self.names.resolve(atom)
    }
}
