//! Protocol families, vocabulary, and resolution results.
//!
//! The looping constructs of the language recognize a fixed set of member
//! shapes. The vocabulary below is that fixed set: constants, not
//! configuration. Resolution produces `ProtocolDescriptor` values holding
//! member handles that were actually found on the inspected types; a
//! descriptor never fabricates a handle.

use crate::classify::ResourceCategory;
use sable_types::{
    FreeFunctionId, MethodId, PropertyId, TypeId, TypeUniverse, WellKnown, format_type,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed member names the looping constructs look for.
pub mod names {
    /// Produces a fresh iterator from a sync iterable.
    pub const ITERATE: &str = "iterate";
    /// Produces a fresh iterator from an async iterable.
    pub const ITERATE_ASYNC: &str = "iterate_async";
    /// Read-only access to the element at the iterator's position.
    pub const CURRENT: &str = "current";
    /// Moves a sync iterator forward, reporting element availability.
    pub const ADVANCE: &str = "advance";
    /// Moves an async iterator forward behind a suspension point.
    pub const ADVANCE_ASYNC: &str = "advance_async";
    /// Rewinds an iterator to its initial position.
    pub const RESET: &str = "reset";
    /// Releases a sync iterator's resources.
    pub const DISPOSE: &str = "dispose";
    /// Releases an async iterator's resources behind a suspension point.
    pub const DISPOSE_ASYNC: &str = "dispose_async";
}

/// Whether a protocol's calls complete directly or through suspension
/// points. Decides member names, the advance result shape, and which
/// release interface applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flavor {
    Sync,
    Async,
}

impl Flavor {
    /// Release-protocol interface this flavor classifies against.
    pub fn release_interface(self) -> WellKnown {
        match self {
            Flavor::Sync => WellKnown::Disposable,
            Flavor::Async => WellKnown::AsyncDisposable,
        }
    }

    /// Release member name this flavor looks for.
    pub fn release_name(self) -> &'static str {
        match self {
            Flavor::Sync => names::DISPOSE,
            Flavor::Async => names::DISPOSE_ASYNC,
        }
    }
}

/// The recognized looping shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolFamily {
    /// Types acquiring a sync iterator (`iterate()`).
    SyncIterable,
    /// Types acquiring an async iterator (`iterate_async()`).
    AsyncIterable,
    /// Types that are themselves sync iterators.
    SyncIterator,
    /// Types that are themselves async iterators.
    AsyncIterator,
    /// Directly indexed loops; intrinsic array-like types take a built-in
    /// fast path, everything else falls through to the sync iterable chain.
    Indexable,
}

impl ProtocolFamily {
    pub fn flavor(self) -> Flavor {
        match self {
            ProtocolFamily::AsyncIterable | ProtocolFamily::AsyncIterator => Flavor::Async,
            _ => Flavor::Sync,
        }
    }

    pub fn is_iterator(self) -> bool {
        matches!(
            self,
            ProtocolFamily::SyncIterator | ProtocolFamily::AsyncIterator
        )
    }

    pub fn acquire_name(self) -> &'static str {
        match self.flavor() {
            Flavor::Sync => names::ITERATE,
            Flavor::Async => names::ITERATE_ASYNC,
        }
    }

    pub fn advance_name(self) -> &'static str {
        match self.flavor() {
            Flavor::Sync => names::ADVANCE,
            Flavor::Async => names::ADVANCE_ASYNC,
        }
    }

    /// Canonical iterable interface guaranteeing resolvability for this
    /// family.
    pub fn iterable_interface(self) -> WellKnown {
        match self.flavor() {
            Flavor::Sync => WellKnown::Iterable,
            Flavor::Async => WellKnown::AsyncIterable,
        }
    }

    /// Canonical iterator interface whose members stand in when a concrete
    /// iterator type does not redeclare them.
    pub fn iterator_interface(self) -> WellKnown {
        match self.flavor() {
            Flavor::Sync => WellKnown::Iterator,
            Flavor::Async => WellKnown::AsyncIterator,
        }
    }
}

/// How the iterator is acquired: a method on the subject or a free function
/// bound to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcquireHandle {
    Method(MethodId),
    Extension(FreeFunctionId),
}

/// Resolved member handles for an iterable or iterator protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationShape {
    /// The inspected type the loop operates on.
    pub subject: TypeId,
    /// Acquisition member; `None` for the iterator families, whose subject
    /// already is the iterator.
    pub acquire: Option<AcquireHandle>,
    /// Whether the acquire member takes the cancellation-style parameter,
    /// which the loop passes through opaquely.
    pub passes_cancellation: bool,
    /// The iterator type the loop drives.
    pub iterator: TypeId,
    pub current: PropertyId,
    pub advance: MethodId,
    pub reset: Option<MethodId>,
    /// Release member selected by the resource classifier, when any.
    pub release: Option<MethodId>,
    /// Element type produced by the loop variable.
    pub item: TypeId,
    pub category: ResourceCategory,
    /// The iterator is a value type (affects how the loop stores it).
    pub iterator_is_value: bool,
    /// The acquire member was declared on an interface rather than the
    /// subject itself (affects dispatch in the synthesized call).
    pub acquire_from_interface: bool,
}

/// The intrinsic array-like fast path: length is a built-in accessor and
/// indexing needs no member handle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexableShape {
    pub subject: TypeId,
    pub item: TypeId,
}

/// Canonical description of which members a loop must invoke.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolDescriptor {
    SyncIterable(IterationShape),
    AsyncIterable(IterationShape),
    SyncIterator(IterationShape),
    AsyncIterator(IterationShape),
    Indexable(IndexableShape),
}

impl ProtocolDescriptor {
    pub fn family(&self) -> ProtocolFamily {
        match self {
            ProtocolDescriptor::SyncIterable(_) => ProtocolFamily::SyncIterable,
            ProtocolDescriptor::AsyncIterable(_) => ProtocolFamily::AsyncIterable,
            ProtocolDescriptor::SyncIterator(_) => ProtocolFamily::SyncIterator,
            ProtocolDescriptor::AsyncIterator(_) => ProtocolFamily::AsyncIterator,
            ProtocolDescriptor::Indexable(_) => ProtocolFamily::Indexable,
        }
    }

    /// The iteration shape, for every family except the indexable fast
    /// path.
    pub fn iteration(&self) -> Option<&IterationShape> {
        match self {
            ProtocolDescriptor::SyncIterable(shape)
            | ProtocolDescriptor::AsyncIterable(shape)
            | ProtocolDescriptor::SyncIterator(shape)
            | ProtocolDescriptor::AsyncIterator(shape) => Some(shape),
            ProtocolDescriptor::Indexable(_) => None,
        }
    }

    /// Element type the loop variable receives.
    pub fn item_type(&self) -> TypeId {
        match self {
            ProtocolDescriptor::Indexable(shape) => shape.item,
            other => other.iteration().map(|s| s.item).unwrap_or(TypeId::UNIT),
        }
    }
}

/// Why a type does not conform to a protocol family. Returned as a value,
/// never raised: structural mismatch is the expected, frequent outcome and
/// feeds eligibility diagnostics upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionError {
    /// No applicable acquire member and no canonical interface conformance.
    /// Reported without probing downstream members.
    MissingAcquire {
        family: ProtocolFamily,
        subject: TypeId,
    },
    /// The iterator type has no readable `current` property. Reported
    /// without probing the advance member.
    MissingCurrent {
        family: ProtocolFamily,
        iterator: TypeId,
    },
    /// The iterator type has no advance method with a boolean-like result.
    MissingAdvance {
        family: ProtocolFamily,
        iterator: TypeId,
    },
}

impl ResolutionError {
    /// Diagnostic text naming the offending type, the way the compiler
    /// reports loop eligibility errors.
    pub fn render(&self, db: &dyn TypeUniverse) -> String {
        match *self {
            ResolutionError::MissingAcquire { family, subject } => format!(
                "type `{}` has no applicable public `{}` member and does not implement the iterable protocol",
                format_type(db, subject),
                family.acquire_name(),
            ),
            ResolutionError::MissingCurrent { iterator, .. } => format!(
                "iterator type `{}` has no readable `{}` property",
                format_type(db, iterator),
                names::CURRENT,
            ),
            ResolutionError::MissingAdvance { family, iterator } => format!(
                "iterator type `{}` has no `{}` method reporting element availability",
                format_type(db, iterator),
                family.advance_name(),
            ),
        }
    }

    /// Member name the error is about.
    pub fn missing_member(&self) -> &'static str {
        match *self {
            ResolutionError::MissingAcquire { family, .. } => family.acquire_name(),
            ResolutionError::MissingCurrent { .. } => names::CURRENT,
            ResolutionError::MissingAdvance { family, .. } => family.advance_name(),
        }
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ResolutionError::MissingAcquire { subject, .. } => {
                write!(f, "no `{}` member on type #{}", self.missing_member(), subject.0)
            }
            ResolutionError::MissingCurrent { iterator, .. }
            | ResolutionError::MissingAdvance { iterator, .. } => {
                write!(f, "no `{}` member on iterator type #{}", self.missing_member(), iterator.0)
            }
        }
    }
}
