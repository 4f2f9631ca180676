//! Loop lowering for the sable compiler.
//!
//! Consumes the protocol descriptors produced by `sable-binder` and
//! synthesizes the lowered loop as a tree IR:
//!
//! - `ir`: the loop/branch/call node model with suspension markers
//! - `builder`: protocol-independent while / guarded-release primitives
//! - `synthesize`: the iteration synthesizer selecting the release wrapper
//!   by resource category
//! - `printer`: deterministic pseudo-code rendering for tests and tooling
//!
//! Fragments are built once per call and handed off; nothing here retains
//! them, suspends, or performs runtime type tests. Any such test is
//! emitted as IR for the consumer of the fragment to execute.

pub mod builder;
pub mod ir;
pub mod printer;
pub mod synthesize;

pub use builder::{
    FragmentBuilder, guarded_release, release_null_guarded, release_type_tested,
    release_unconditional, while_loop,
};
pub use ir::{BinaryOp, IrFragment, IrNode, LocalId, LocalInfo};
pub use printer::IrPrinter;
pub use synthesize::synthesize;
