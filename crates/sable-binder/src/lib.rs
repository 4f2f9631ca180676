//! Iteration-protocol binding for the sable compiler.
//!
//! Looping constructs accept any type that structurally conforms to one of
//! the recognized iteration protocols, with no marker interface required.
//! This crate decides conformance and describes it:
//!
//! - `resolver::resolve` runs the precedence algorithm per protocol family
//!   and returns a `ProtocolDescriptor` naming exactly which members a loop
//!   must invoke, or a `ResolutionError` value saying why the type is not
//!   eligible.
//! - `classify` determines which release strategy applies to the resolved
//!   iterator type.
//! - `well_known::install_core_protocols` declares the canonical protocol
//!   interfaces on a store.
//! - `ResolutionCache` is the caller-owned memoization layer.
//!
//! Everything is a pure function over an immutable `TypeUniverse`; no state
//! crosses calls.

pub mod cache;
pub mod classify;
pub mod protocol;
pub mod resolver;
pub mod well_known;

pub use cache::ResolutionCache;
pub use classify::{Classification, ResourceCategory, classify};
pub use protocol::{
    AcquireHandle, Flavor, IndexableShape, IterationShape, ProtocolDescriptor, ProtocolFamily,
    ResolutionError, names,
};
pub use resolver::resolve;
pub use well_known::{CoreProtocols, install_core_protocols};

#[cfg(test)]
mod tests;
