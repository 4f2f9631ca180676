//! Canonical protocol types.
//!
//! The language's core library declares one canonical generic interface per
//! protocol family plus the release interfaces and auxiliary types the
//! protocols mention. Front-ends that model the core library can install
//! them here; the handles come back in a `CoreProtocols` record so embedding
//! tools (and tests) can refer to the canonical members directly.

use crate::protocol::names;
use sable_types::{
    MethodId, PropertyId, StorageCategory, TypeFlags, TypeId, TypeStore, WellKnown,
};

/// Handles to the canonical protocol declarations.
#[derive(Clone, Copy, Debug)]
pub struct CoreProtocols {
    pub iterable: TypeId,
    pub async_iterable: TypeId,
    pub iterator: TypeId,
    pub async_iterator: TypeId,
    pub disposable: TypeId,
    pub async_disposable: TypeId,
    pub future: TypeId,
    pub cancel_token: TypeId,

    pub iterable_iterate: MethodId,
    pub async_iterable_iterate: MethodId,
    pub iterator_current: PropertyId,
    pub iterator_advance: MethodId,
    pub iterator_reset: MethodId,
    pub async_iterator_current: PropertyId,
    pub async_iterator_advance: MethodId,
    pub disposable_dispose: MethodId,
    pub async_disposable_dispose: MethodId,
}

/// Declare the canonical protocol types on `store` and register them as
/// well-known.
pub fn install_core_protocols(store: &mut TypeStore) -> CoreProtocols {
    let future = store.declare_generic_type(
        "Future",
        StorageCategory::Value,
        TypeFlags::SEALED,
        &["T"],
    );
    let cancel_token =
        store.declare_type("CancelToken", StorageCategory::Value, TypeFlags::SEALED);

    let disposable =
        store.declare_type("Disposable", StorageCategory::Interface, TypeFlags::empty());
    let disposable_dispose = store.add_method(disposable, names::DISPOSE, &[], TypeId::UNIT);

    let async_disposable = store.declare_type(
        "AsyncDisposable",
        StorageCategory::Interface,
        TypeFlags::empty(),
    );
    let future_unit = store.application(future, &[TypeId::UNIT]);
    let async_disposable_dispose =
        store.add_method(async_disposable, names::DISPOSE_ASYNC, &[], future_unit);

    // Iterator<T>: current/advance/reset, releasable through Disposable.
    let iterator = store.declare_generic_type(
        "Iterator",
        StorageCategory::Interface,
        TypeFlags::empty(),
        &["T"],
    );
    store.implement(iterator, disposable);
    let iterator_item = store.generic_param(iterator, 0);
    let iterator_current = store.add_property(iterator, names::CURRENT, iterator_item);
    let iterator_advance = store.add_method(iterator, names::ADVANCE, &[], TypeId::BOOL);
    let iterator_reset = store.add_method(iterator, names::RESET, &[], TypeId::UNIT);

    // AsyncIterator<T>: advance suspends, release goes through
    // AsyncDisposable.
    let async_iterator = store.declare_generic_type(
        "AsyncIterator",
        StorageCategory::Interface,
        TypeFlags::empty(),
        &["T"],
    );
    store.implement(async_iterator, async_disposable);
    let async_iterator_item = store.generic_param(async_iterator, 0);
    let async_iterator_current =
        store.add_property(async_iterator, names::CURRENT, async_iterator_item);
    let future_bool = store.application(future, &[TypeId::BOOL]);
    let async_iterator_advance =
        store.add_method(async_iterator, names::ADVANCE_ASYNC, &[], future_bool);

    // Iterable<T> / AsyncIterable<T>: the acquire side. The async acquire
    // carries the cancellation token parameter.
    let iterable = store.declare_generic_type(
        "Iterable",
        StorageCategory::Interface,
        TypeFlags::empty(),
        &["T"],
    );
    let iterable_item = store.generic_param(iterable, 0);
    let iterator_of_item = store.application(iterator, &[iterable_item]);
    let iterable_iterate = store.add_method(iterable, names::ITERATE, &[], iterator_of_item);

    let async_iterable = store.declare_generic_type(
        "AsyncIterable",
        StorageCategory::Interface,
        TypeFlags::empty(),
        &["T"],
    );
    let async_iterable_item = store.generic_param(async_iterable, 0);
    let async_iterator_of_item = store.application(async_iterator, &[async_iterable_item]);
    let async_iterable_iterate = store.add_method(
        async_iterable,
        names::ITERATE_ASYNC,
        &[cancel_token],
        async_iterator_of_item,
    );

    store.set_well_known(WellKnown::Iterable, iterable);
    store.set_well_known(WellKnown::AsyncIterable, async_iterable);
    store.set_well_known(WellKnown::Iterator, iterator);
    store.set_well_known(WellKnown::AsyncIterator, async_iterator);
    store.set_well_known(WellKnown::Disposable, disposable);
    store.set_well_known(WellKnown::AsyncDisposable, async_disposable);
    store.set_well_known(WellKnown::Future, future);
    store.set_well_known(WellKnown::CancelToken, cancel_token);

    CoreProtocols {
        iterable,
        async_iterable,
        iterator,
        async_iterator,
        disposable,
        async_disposable,
        future,
        cancel_token,
        iterable_iterate,
        async_iterable_iterate,
        iterator_current,
        iterator_advance,
        iterator_reset,
        async_iterator_current,
        async_iterator_advance,
        disposable_dispose,
        async_disposable_dispose,
    }
}
