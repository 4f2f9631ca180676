//! Iteration-protocol resolution.
//!
//! A pure function of a type universe: no descriptor mutation, no caching,
//! no side effects beyond interning instantiations. The precedence order is
//! a short-circuiting chain of option-returning lookups. Own-declared
//! members outrank extension functions, which outrank the canonical
//! interface, and the extra-parameter acquire overload outranks the
//! zero-parameter one.

use crate::classify::{Classification, classify};
use crate::protocol::{
    AcquireHandle, Flavor, IndexableShape, IterationShape, ProtocolDescriptor, ProtocolFamily,
    ResolutionError, names,
};
use sable_types::{
    MethodId, PropertyId, StorageCategory, TypeData, TypeId, TypeUniverse, WellKnown, decompose,
    implements, instance_method, instance_property, own_instance_method, own_instance_property,
    storage_category,
};
use tracing::trace;

/// Resolve `subject` against a protocol family.
///
/// Structural mismatch comes back as a `ResolutionError` value; the only
/// faults raised are malformed-universe handle panics.
pub fn resolve(
    db: &dyn TypeUniverse,
    subject: TypeId,
    family: ProtocolFamily,
) -> Result<ProtocolDescriptor, ResolutionError> {
    trace!(subject = subject.0, ?family, "resolving iteration protocol");
    match family {
        ProtocolFamily::Indexable => resolve_indexable(db, subject),
        ProtocolFamily::SyncIterator | ProtocolFamily::AsyncIterator => {
            let tail = resolve_iterator_members(db, family, subject)?;
            Ok(assemble(family, shape_from_tail(subject, None, false, subject, false, tail)))
        }
        ProtocolFamily::SyncIterable | ProtocolFamily::AsyncIterable => {
            resolve_iterable(db, subject, family)
        }
    }
}

/// Indexable family: intrinsic array-like types take the built-in fast path
/// (known length accessor, no indexer handle). Every other type runs the
/// shared acquire chain and yields the sync-iterable shape.
fn resolve_indexable(
    db: &dyn TypeUniverse,
    subject: TypeId,
) -> Result<ProtocolDescriptor, ResolutionError> {
    if let Some(TypeData::Array(elem)) = db.lookup(subject) {
        return Ok(ProtocolDescriptor::Indexable(IndexableShape {
            subject,
            item: elem,
        }));
    }
    resolve_iterable(db, subject, ProtocolFamily::SyncIterable)
}

fn resolve_iterable(
    db: &dyn TypeUniverse,
    subject: TypeId,
    family: ProtocolFamily,
) -> Result<ProtocolDescriptor, ResolutionError> {
    let acquired = find_acquire(db, subject, family)
        .ok_or(ResolutionError::MissingAcquire { family, subject })?;
    let tail = resolve_iterator_members(db, family, acquired.iterator)?;
    Ok(assemble(
        family,
        shape_from_tail(
            subject,
            Some(acquired.handle),
            acquired.passes_cancellation,
            acquired.iterator,
            acquired.from_interface,
            tail,
        ),
    ))
}

// =============================================================================
// Acquire lookup (steps 1-4)
// =============================================================================

struct AcquiredIterator {
    handle: AcquireHandle,
    iterator: TypeId,
    passes_cancellation: bool,
    from_interface: bool,
}

fn find_acquire(
    db: &dyn TypeUniverse,
    subject: TypeId,
    family: ProtocolFamily,
) -> Option<AcquiredIterator> {
    // Interface subjects resolve only through the canonical protocol
    // interface; direct and extension lookup apply to concrete types.
    let direct = if storage_category(db, subject) == StorageCategory::Interface {
        None
    } else {
        find_own_acquire(db, subject, family)
            .or_else(|| find_extension_acquire(db, subject, family))
    };
    direct.or_else(|| find_interface_acquire(db, subject, family))
}

/// Own public instance acquire method: the overload taking the family's
/// extra (cancellation-style) parameter first, then the zero-parameter one.
fn find_own_acquire(
    db: &dyn TypeUniverse,
    subject: TypeId,
    family: ProtocolFamily,
) -> Option<AcquiredIterator> {
    let name = db.intern_name(family.acquire_name());
    if let Some(token) = family_token(db, family) {
        if let Some(method) = own_instance_method(db, subject, name, 1) {
            if method.params.first() == Some(&token) {
                return Some(AcquiredIterator {
                    handle: AcquireHandle::Method(method.id),
                    iterator: method.return_type,
                    passes_cancellation: true,
                    from_interface: false,
                });
            }
        }
    }
    own_instance_method(db, subject, name, 0).map(|method| AcquiredIterator {
        handle: AcquireHandle::Method(method.id),
        iterator: method.return_type,
        passes_cancellation: false,
        from_interface: false,
    })
}

/// Extension acquire: a free function whose first parameter is the subject
/// type, with matching parameter count. First candidate in declaration
/// order wins.
fn find_extension_acquire(
    db: &dyn TypeUniverse,
    subject: TypeId,
    family: ProtocolFamily,
) -> Option<AcquiredIterator> {
    let name = db.intern_name(family.acquire_name());
    let token = family_token(db, family);
    for id in db.free_functions_named(name) {
        let function = db.free_function(id);
        if function.params.first() != Some(&subject) {
            continue;
        }
        match function.params.len() {
            1 => {
                return Some(AcquiredIterator {
                    handle: AcquireHandle::Extension(id),
                    iterator: function.return_type,
                    passes_cancellation: false,
                    from_interface: false,
                });
            }
            2 if token.is_some() && function.params.get(1) == token.as_ref() => {
                return Some(AcquiredIterator {
                    handle: AcquireHandle::Extension(id),
                    iterator: function.return_type,
                    passes_cancellation: true,
                    from_interface: false,
                });
            }
            _ => {}
        }
    }
    None
}

/// Canonical interface conformance: guarantees resolvability even absent a
/// direct method, with the item type substituted from the bound argument.
fn find_interface_acquire(
    db: &dyn TypeUniverse,
    subject: TypeId,
    family: ProtocolFamily,
) -> Option<AcquiredIterator> {
    let view = canonical_view(db, subject, family.iterable_interface())?;
    let name = db.intern_name(family.acquire_name());
    if let Some(token) = family_token(db, family) {
        if let Some(method) = own_instance_method(db, view, name, 1) {
            if method.params.first() == Some(&token) {
                return Some(AcquiredIterator {
                    handle: AcquireHandle::Method(method.id),
                    iterator: method.return_type,
                    passes_cancellation: true,
                    from_interface: true,
                });
            }
        }
    }
    own_instance_method(db, view, name, 0).map(|method| AcquiredIterator {
        handle: AcquireHandle::Method(method.id),
        iterator: method.return_type,
        passes_cancellation: false,
        from_interface: true,
    })
}

/// The family's optional extra acquire parameter: async families may thread
/// a cancellation token through, sync families carry none.
fn family_token(db: &dyn TypeUniverse, family: ProtocolFamily) -> Option<TypeId> {
    match family.flavor() {
        Flavor::Async => db.well_known(WellKnown::CancelToken),
        Flavor::Sync => None,
    }
}

// =============================================================================
// Iterator member tail (steps 5-8)
// =============================================================================

struct MemberTail {
    current: PropertyId,
    advance: MethodId,
    reset: Option<MethodId>,
    classification: Classification,
    item: TypeId,
    iterator_is_value: bool,
}

/// Resolve `current`/`advance` (and optionally `reset`) on an iterator
/// type, recursing into the canonical iterator interface when the concrete
/// type does not redeclare a member.
fn resolve_iterator_members(
    db: &dyn TypeUniverse,
    family: ProtocolFamily,
    iterator: TypeId,
) -> Result<MemberTail, ResolutionError> {
    let current_name = db.intern_name(names::CURRENT);
    let current = instance_property(db, iterator, current_name)
        .or_else(|| {
            let view = canonical_view(db, iterator, family.iterator_interface())?;
            own_instance_property(db, view, current_name)
        })
        .ok_or(ResolutionError::MissingCurrent { family, iterator })?;

    let advance_name = db.intern_name(family.advance_name());
    let advance = instance_method(db, iterator, advance_name, 0)
        .or_else(|| {
            let view = canonical_view(db, iterator, family.iterator_interface())?;
            own_instance_method(db, view, advance_name, 0)
        })
        .filter(|method| is_boolean_like(db, method.return_type, family.flavor()))
        .ok_or(ResolutionError::MissingAdvance { family, iterator })?;

    let reset_name = db.intern_name(names::RESET);
    let reset = instance_method(db, iterator, reset_name, 0)
        .or_else(|| {
            let view = canonical_view(db, iterator, family.iterator_interface())?;
            own_instance_method(db, view, reset_name, 0)
        })
        .map(|method| method.id);

    let classification = classify(db, iterator, family.flavor());
    let iterator_is_value = matches!(
        storage_category(db, iterator),
        StorageCategory::Value | StorageCategory::StackOnlyValue
    );

    Ok(MemberTail {
        current: current.id,
        advance: advance.id,
        reset,
        classification,
        item: current.type_id,
        iterator_is_value,
    })
}

/// The canonical interface instantiation `ty` conforms to, when it does.
fn canonical_view(db: &dyn TypeUniverse, ty: TypeId, which: WellKnown) -> Option<TypeId> {
    let interface = db.well_known(which)?;
    let (decl, _) = decompose(db, interface)?;
    let args = implements(db, ty, decl)?;
    if args.is_empty() {
        Some(interface)
    } else {
        Some(db.intern(TypeData::Application {
            base: interface,
            args,
        }))
    }
}

/// Advance must report element availability: `bool` directly, or
/// `Future<bool>` behind a suspension point for async families.
fn is_boolean_like(db: &dyn TypeUniverse, ty: TypeId, flavor: Flavor) -> bool {
    match flavor {
        Flavor::Sync => ty == TypeId::BOOL,
        Flavor::Async => {
            let Some(future) = db.well_known(WellKnown::Future) else {
                return false;
            };
            matches!(
                db.lookup(ty),
                Some(TypeData::Application { base, args })
                    if base == future && args.len() == 1 && args[0] == TypeId::BOOL
            )
        }
    }
}

fn shape_from_tail(
    subject: TypeId,
    acquire: Option<AcquireHandle>,
    passes_cancellation: bool,
    iterator: TypeId,
    acquire_from_interface: bool,
    tail: MemberTail,
) -> IterationShape {
    IterationShape {
        subject,
        acquire,
        passes_cancellation,
        iterator,
        current: tail.current,
        advance: tail.advance,
        reset: tail.reset,
        release: tail.classification.release,
        item: tail.item,
        category: tail.classification.category,
        iterator_is_value: tail.iterator_is_value,
        acquire_from_interface,
    }
}

fn assemble(family: ProtocolFamily, shape: IterationShape) -> ProtocolDescriptor {
    match family {
        ProtocolFamily::SyncIterable => ProtocolDescriptor::SyncIterable(shape),
        ProtocolFamily::AsyncIterable => ProtocolDescriptor::AsyncIterable(shape),
        ProtocolFamily::SyncIterator => ProtocolDescriptor::SyncIterator(shape),
        ProtocolFamily::AsyncIterator => ProtocolDescriptor::AsyncIterator(shape),
        // Non-array indexable subjects resolve through the sync-iterable
        // chain and are assembled there.
        ProtocolFamily::Indexable => ProtocolDescriptor::SyncIterable(shape),
    }
}
