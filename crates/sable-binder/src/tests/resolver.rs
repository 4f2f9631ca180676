use crate::classify::ResourceCategory;
use crate::protocol::{
    AcquireHandle, ProtocolDescriptor, ProtocolFamily, ResolutionError, names,
};
use crate::resolver::resolve;
use crate::well_known::{CoreProtocols, install_core_protocols};
use sable_types::{MethodId, PropertyId, StorageCategory, TypeFlags, TypeId, TypeStore};

fn store_with_core() -> (TypeStore, CoreProtocols) {
    let mut store = TypeStore::new();
    let core = install_core_protocols(&mut store);
    (store, core)
}

/// A value-type counter declaring the sync protocol directly.
fn declare_counter(store: &mut TypeStore) -> (TypeId, TypeId, MethodId, PropertyId, MethodId) {
    let counter = store.declare_type("Counter", StorageCategory::Value, TypeFlags::SEALED);
    let counter_iter = store.declare_type("CounterIter", StorageCategory::Value, TypeFlags::SEALED);
    let iterate = store.add_method(counter, names::ITERATE, &[], counter_iter);
    let current = store.add_property(counter_iter, names::CURRENT, TypeId::INT);
    let advance = store.add_method(counter_iter, names::ADVANCE, &[], TypeId::BOOL);
    (counter, counter_iter, iterate, current, advance)
}

#[test]
fn own_declared_members_resolve_with_own_handles() {
    let (mut store, _core) = store_with_core();
    let (counter, counter_iter, iterate, current, advance) = declare_counter(&mut store);

    let descriptor = resolve(&store, counter, ProtocolFamily::SyncIterable).expect("resolves");
    let shape = descriptor.iteration().expect("iteration shape");
    assert_eq!(shape.acquire, Some(AcquireHandle::Method(iterate)));
    assert_eq!(shape.iterator, counter_iter);
    assert_eq!(shape.current, current);
    assert_eq!(shape.advance, advance);
    assert_eq!(shape.item, TypeId::INT);
    assert_eq!(shape.category, ResourceCategory::None);
    assert_eq!(shape.reset, None);
    assert!(shape.iterator_is_value);
    assert!(!shape.acquire_from_interface);
    assert!(!shape.passes_cancellation);
}

#[test]
fn own_declared_current_beats_canonical_interface_member() {
    let (mut store, core) = store_with_core();
    let iter_ty = store.declare_type("OwnIter", StorageCategory::Reference, TypeFlags::SEALED);
    let iterator_int = store.application(core.iterator, &[TypeId::INT]);
    store.implement(iter_ty, iterator_int);
    let own_current = store.add_property(iter_ty, names::CURRENT, TypeId::INT);
    let own_advance = store.add_method(iter_ty, names::ADVANCE, &[], TypeId::BOOL);

    let descriptor = resolve(&store, iter_ty, ProtocolFamily::SyncIterator).expect("resolves");
    let shape = descriptor.iteration().expect("iteration shape");
    assert_eq!(shape.current, own_current);
    assert_eq!(shape.advance, own_advance);
    assert_ne!(shape.current, core.iterator_current);
}

#[test]
fn canonical_interface_conformance_substitutes_item_type() {
    let (mut store, core) = store_with_core();
    let cells = store.declare_type("CellSet", StorageCategory::Reference, TypeFlags::SEALED);
    let iterable_int = store.application(core.iterable, &[TypeId::INT]);
    store.implement(cells, iterable_int);

    let descriptor = resolve(&store, cells, ProtocolFamily::SyncIterable).expect("resolves");
    let shape = descriptor.iteration().expect("iteration shape");
    assert_eq!(shape.acquire, Some(AcquireHandle::Method(core.iterable_iterate)));
    assert!(shape.acquire_from_interface);
    assert_eq!(shape.item, TypeId::INT);
    assert_eq!(shape.current, core.iterator_current);
    assert_eq!(shape.reset, Some(core.iterator_reset));
    // Iterator<int> extends Disposable, so release is proven and
    // null-guarded.
    assert_eq!(shape.category, ResourceCategory::ReferenceDisposable);
    assert_eq!(shape.release, Some(core.disposable_dispose));
    assert!(!shape.iterator_is_value);
}

#[test]
fn interface_typed_subject_resolves_through_canonical_interface_only() {
    let (mut store, core) = store_with_core();
    // An interface declaring its own `iterate` does not satisfy the direct
    // lookup tiers; only canonical conformance applies to interface
    // subjects.
    let custom = store.declare_type("CustomColl", StorageCategory::Interface, TypeFlags::empty());
    let iter_ty = store.declare_type("CustomIter", StorageCategory::Reference, TypeFlags::SEALED);
    store.add_property(iter_ty, names::CURRENT, TypeId::INT);
    store.add_method(iter_ty, names::ADVANCE, &[], TypeId::BOOL);
    store.add_method(custom, names::ITERATE, &[], iter_ty);

    let err = resolve(&store, custom, ProtocolFamily::SyncIterable).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::MissingAcquire {
            family: ProtocolFamily::SyncIterable,
            subject: custom,
        }
    );

    // The canonical interface itself resolves fine.
    let iterable_int = store.application(core.iterable, &[TypeId::INT]);
    let descriptor = resolve(&store, iterable_int, ProtocolFamily::SyncIterable).expect("resolves");
    let shape = descriptor.iteration().expect("iteration shape");
    assert!(shape.acquire_from_interface);
    assert_eq!(shape.item, TypeId::INT);
}

#[test]
fn extension_acquire_first_declared_wins() {
    let (mut store, _core) = store_with_core();
    let rows = store.declare_type("Rows", StorageCategory::Reference, TypeFlags::SEALED);
    let first_iter = store.declare_type("RowIterA", StorageCategory::Reference, TypeFlags::SEALED);
    store.add_property(first_iter, names::CURRENT, TypeId::INT);
    store.add_method(first_iter, names::ADVANCE, &[], TypeId::BOOL);
    let second_iter = store.declare_type("RowIterB", StorageCategory::Reference, TypeFlags::SEALED);
    store.add_property(second_iter, names::CURRENT, TypeId::INT);
    store.add_method(second_iter, names::ADVANCE, &[], TypeId::BOOL);

    let first = store.add_free_function(names::ITERATE, &[rows], first_iter);
    store.add_free_function(names::ITERATE, &[rows], second_iter);

    let descriptor = resolve(&store, rows, ProtocolFamily::SyncIterable).expect("resolves");
    let shape = descriptor.iteration().expect("iteration shape");
    assert_eq!(shape.acquire, Some(AcquireHandle::Extension(first)));
    assert_eq!(shape.iterator, first_iter);
}

#[test]
fn own_acquire_outranks_extension_acquire() {
    let (mut store, _core) = store_with_core();
    let (counter, counter_iter, iterate, _, _) = declare_counter(&mut store);
    let other_iter = store.declare_type("OtherIter", StorageCategory::Reference, TypeFlags::SEALED);
    store.add_property(other_iter, names::CURRENT, TypeId::INT);
    store.add_method(other_iter, names::ADVANCE, &[], TypeId::BOOL);
    store.add_free_function(names::ITERATE, &[counter], other_iter);

    let descriptor = resolve(&store, counter, ProtocolFamily::SyncIterable).expect("resolves");
    let shape = descriptor.iteration().expect("iteration shape");
    assert_eq!(shape.acquire, Some(AcquireHandle::Method(iterate)));
    assert_eq!(shape.iterator, counter_iter);
}

#[test]
fn cancellation_overload_outranks_zero_parameter_acquire() {
    let (mut store, core) = store_with_core();
    let feed = store.declare_type("Feed", StorageCategory::Reference, TypeFlags::SEALED);
    let feed_iter = store.declare_type("FeedIter", StorageCategory::Reference, TypeFlags::SEALED);
    store.add_property(feed_iter, names::CURRENT, TypeId::INT);
    let future_bool = store.application(core.future, &[TypeId::BOOL]);
    store.add_method(feed_iter, names::ADVANCE_ASYNC, &[], future_bool);

    let plain = store.add_method(feed, names::ITERATE_ASYNC, &[], feed_iter);
    let with_token = store.add_method(feed, names::ITERATE_ASYNC, &[core.cancel_token], feed_iter);

    let descriptor = resolve(&store, feed, ProtocolFamily::AsyncIterable).expect("resolves");
    let shape = descriptor.iteration().expect("iteration shape");
    assert_eq!(shape.acquire, Some(AcquireHandle::Method(with_token)));
    assert_ne!(shape.acquire, Some(AcquireHandle::Method(plain)));
    assert!(shape.passes_cancellation);
}

#[test]
fn missing_acquire_is_reported_without_probing_members() {
    let (mut store, _core) = store_with_core();
    let bare = store.declare_type("Bare", StorageCategory::Reference, TypeFlags::SEALED);
    let err = resolve(&store, bare, ProtocolFamily::SyncIterable).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::MissingAcquire {
            family: ProtocolFamily::SyncIterable,
            subject: bare,
        }
    );
}

#[test]
fn missing_current_short_circuits_before_advance() {
    let (mut store, _core) = store_with_core();
    let source = store.declare_type("Source", StorageCategory::Reference, TypeFlags::SEALED);
    // The iterator has `advance` but no `current`; the error must be
    // MissingCurrent, never MissingAdvance.
    let iter_ty = store.declare_type("SourceIter", StorageCategory::Reference, TypeFlags::SEALED);
    store.add_method(iter_ty, names::ADVANCE, &[], TypeId::BOOL);
    store.add_method(source, names::ITERATE, &[], iter_ty);

    let err = resolve(&store, source, ProtocolFamily::SyncIterable).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::MissingCurrent {
            family: ProtocolFamily::SyncIterable,
            iterator: iter_ty,
        }
    );
}

#[test]
fn non_boolean_advance_is_missing_advance() {
    let (mut store, _core) = store_with_core();
    let source = store.declare_type("Counted", StorageCategory::Reference, TypeFlags::SEALED);
    let iter_ty = store.declare_type("CountedIter", StorageCategory::Reference, TypeFlags::SEALED);
    store.add_property(iter_ty, names::CURRENT, TypeId::INT);
    store.add_method(iter_ty, names::ADVANCE, &[], TypeId::INT);
    store.add_method(source, names::ITERATE, &[], iter_ty);

    let err = resolve(&store, source, ProtocolFamily::SyncIterable).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::MissingAdvance {
            family: ProtocolFamily::SyncIterable,
            iterator: iter_ty,
        }
    );
}

#[test]
fn inherited_members_resolve_through_base_chain() {
    let (mut store, _core) = store_with_core();
    let source = store.declare_type("Spans", StorageCategory::Reference, TypeFlags::SEALED);
    let base_iter = store.declare_type("BaseIter", StorageCategory::Reference, TypeFlags::empty());
    let current = store.add_property(base_iter, names::CURRENT, TypeId::INT);
    let advance = store.add_method(base_iter, names::ADVANCE, &[], TypeId::BOOL);
    let derived_iter =
        store.declare_type("DerivedIter", StorageCategory::Reference, TypeFlags::SEALED);
    store.set_base(derived_iter, base_iter);
    store.add_method(source, names::ITERATE, &[], derived_iter);

    let descriptor = resolve(&store, source, ProtocolFamily::SyncIterable).expect("resolves");
    let shape = descriptor.iteration().expect("iteration shape");
    assert_eq!(shape.current, current);
    assert_eq!(shape.advance, advance);
}

#[test]
fn iterator_family_binds_the_subject_itself() {
    let (mut store, _core) = store_with_core();
    let (_, counter_iter, _, current, advance) = declare_counter(&mut store);

    let descriptor = resolve(&store, counter_iter, ProtocolFamily::SyncIterator).expect("resolves");
    assert_eq!(descriptor.family(), ProtocolFamily::SyncIterator);
    let shape = descriptor.iteration().expect("iteration shape");
    assert_eq!(shape.acquire, None);
    assert_eq!(shape.iterator, counter_iter);
    assert_eq!(shape.current, current);
    assert_eq!(shape.advance, advance);
}

#[test]
fn async_iterator_family_requires_future_of_bool() {
    let (mut store, core) = store_with_core();
    let stream = store.declare_type("Stream", StorageCategory::Reference, TypeFlags::SEALED);
    store.add_property(stream, names::CURRENT, TypeId::INT);
    let future_bool = store.application(core.future, &[TypeId::BOOL]);
    let advance = store.add_method(stream, names::ADVANCE_ASYNC, &[], future_bool);

    let descriptor = resolve(&store, stream, ProtocolFamily::AsyncIterator).expect("resolves");
    let shape = descriptor.iteration().expect("iteration shape");
    assert_eq!(shape.advance, advance);

    // A sync `bool` advance does not satisfy the async family.
    let broken = store.declare_type("BrokenStream", StorageCategory::Reference, TypeFlags::SEALED);
    store.add_property(broken, names::CURRENT, TypeId::INT);
    store.add_method(broken, names::ADVANCE_ASYNC, &[], TypeId::BOOL);
    let err = resolve(&store, broken, ProtocolFamily::AsyncIterator).unwrap_err();
    assert!(matches!(err, ResolutionError::MissingAdvance { .. }));
}

#[test]
fn async_canonical_interface_resolves_with_suspending_members() {
    let (mut store, core) = store_with_core();
    let feed = store.declare_type("EventFeed", StorageCategory::Reference, TypeFlags::SEALED);
    let async_iterable_int = store.application(core.async_iterable, &[TypeId::INT]);
    store.implement(feed, async_iterable_int);

    let descriptor = resolve(&store, feed, ProtocolFamily::AsyncIterable).expect("resolves");
    let shape = descriptor.iteration().expect("iteration shape");
    assert_eq!(
        shape.acquire,
        Some(AcquireHandle::Method(core.async_iterable_iterate))
    );
    assert!(shape.passes_cancellation);
    assert_eq!(shape.advance, core.async_iterator_advance);
    assert_eq!(shape.item, TypeId::INT);
    // AsyncIterator<int> extends AsyncDisposable.
    assert_eq!(shape.category, ResourceCategory::ReferenceDisposable);
    assert_eq!(shape.release, Some(core.async_disposable_dispose));
}

#[test]
fn indexable_family_short_circuits_intrinsic_arrays() {
    let (store, _core) = store_with_core();
    let ints = store.array(TypeId::INT);
    let descriptor = resolve(&store, ints, ProtocolFamily::Indexable).expect("resolves");
    match descriptor {
        ProtocolDescriptor::Indexable(shape) => {
            assert_eq!(shape.subject, ints);
            assert_eq!(shape.item, TypeId::INT);
        }
        other => panic!("expected indexable fast path, got {other:?}"),
    }
}

#[test]
fn indexable_family_falls_through_to_iterable_chain() {
    let (mut store, _core) = store_with_core();
    let (counter, _, iterate, _, _) = declare_counter(&mut store);
    let descriptor = resolve(&store, counter, ProtocolFamily::Indexable).expect("resolves");
    let shape = descriptor.iteration().expect("iteration shape");
    assert_eq!(shape.acquire, Some(AcquireHandle::Method(iterate)));
}

#[test]
fn resolution_is_deterministic() {
    let (mut store, _core) = store_with_core();
    let (counter, _, _, _, _) = declare_counter(&mut store);
    let first = resolve(&store, counter, ProtocolFamily::SyncIterable);
    let second = resolve(&store, counter, ProtocolFamily::SyncIterable);
    assert_eq!(first, second);
}

#[test]
fn resolution_is_thread_safe_over_a_shared_universe() {
    use rayon::prelude::*;
    let (mut store, core) = store_with_core();
    let (counter, _, _, _, _) = declare_counter(&mut store);
    let cells = store.declare_type("CellSet", StorageCategory::Reference, TypeFlags::SEALED);
    let iterable_int = store.application(core.iterable, &[TypeId::INT]);
    store.implement(cells, iterable_int);

    let expected = resolve(&store, counter, ProtocolFamily::SyncIterable);
    let results: Vec<_> = (0..32)
        .into_par_iter()
        .map(|i| {
            if i % 2 == 0 {
                resolve(&store, counter, ProtocolFamily::SyncIterable)
            } else {
                resolve(&store, cells, ProtocolFamily::SyncIterable)
                    .map(|_| resolve(&store, counter, ProtocolFamily::SyncIterable).expect("ok"))
            }
        })
        .collect();
    for result in results {
        assert_eq!(result, expected);
    }
}

#[test]
fn cache_returns_the_memoized_resolution() {
    let (mut store, _core) = store_with_core();
    let (counter, _, _, _, _) = declare_counter(&mut store);
    let mut cache = crate::cache::ResolutionCache::new();
    let direct = resolve(&store, counter, ProtocolFamily::SyncIterable);
    assert_eq!(cache.resolve(&store, counter, ProtocolFamily::SyncIterable), &direct);
    assert_eq!(cache.resolve(&store, counter, ProtocolFamily::SyncIterable), &direct);
    assert_eq!(cache.len(), 1);
}

#[test]
fn descriptors_serialize_for_tooling() {
    let (mut store, _core) = store_with_core();
    let (counter, _, _, _, _) = declare_counter(&mut store);
    let descriptor = resolve(&store, counter, ProtocolFamily::SyncIterable).expect("resolves");
    let json = serde_json::to_string(&descriptor).expect("serializes");
    let back: ProtocolDescriptor = serde_json::from_str(&json).expect("deserializes");
    assert_eq!(back, descriptor);
}

#[test]
fn trace_instrumentation_does_not_affect_results() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();
    let (mut store, _core) = store_with_core();
    let (counter, _, _, _, _) = declare_counter(&mut store);
    let quiet = resolve(&store, counter, ProtocolFamily::SyncIterable);
    let traced = tracing::subscriber::with_default(subscriber, || {
        resolve(&store, counter, ProtocolFamily::SyncIterable)
    });
    assert_eq!(quiet, traced);
}

#[test]
fn errors_render_with_type_and_member_names() {
    let (mut store, _core) = store_with_core();
    let bare = store.declare_type("Bare", StorageCategory::Reference, TypeFlags::SEALED);
    let err = resolve(&store, bare, ProtocolFamily::SyncIterable).unwrap_err();
    let rendered = err.render(&store);
    assert!(rendered.contains("Bare"));
    assert!(rendered.contains(names::ITERATE));
}
