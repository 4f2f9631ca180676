//! Lowered IR for synthesized loops.
//!
//! This module defines the tree-structured IR the synthesizer produces
//! instead of strings. The nodes represent the constructs a lowered loop
//! needs; a downstream lowering stage walks the tree and emits target code.
//!
//! # IR Structure
//!
//! The IR is a tree of `IrNode` variants. Statement-shaped nodes compose
//! through `Block`; expression-shaped nodes appear as initializers,
//! conditions, and call operands. Calls carry a `suspend` marker the
//! downstream stage must honor as "await, then continue"; nothing in this
//! crate ever suspends itself.

use sable_types::{FreeFunctionId, MethodId, PropertyId, TypeId};
use serde::{Deserialize, Serialize};

/// Handle to a local slot introduced by a fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `left < right`
    Lt,
    /// `left + right`
    Add,
}

/// Intermediate representation node for a synthesized loop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrNode {
    // =========================================================================
    // Literals
    // =========================================================================
    /// Integer literal: `42`
    IntLiteral(i64),

    /// Boolean literal: `true`, `false`
    BoolLiteral(bool),

    /// Null reference literal
    NullLiteral,

    /// Default value of a type: `default(CancelToken)`
    DefaultValue(TypeId),

    // =========================================================================
    // References
    // =========================================================================
    /// Read of a fragment local
    Local(LocalId),

    // =========================================================================
    // Expressions
    // =========================================================================
    /// Instance method call: `receiver.method(args)`.
    /// `suspend` marks the call as a suspension point for async protocols;
    /// `via_interface` marks dispatch through an interface declaration.
    CallMethod {
        receiver: Box<IrNode>,
        method: MethodId,
        args: Vec<IrNode>,
        suspend: bool,
        via_interface: bool,
    },

    /// Free-function call: `function(args)`; for extension acquires the
    /// receiver is the first argument.
    CallExtension {
        function: FreeFunctionId,
        args: Vec<IrNode>,
        suspend: bool,
    },

    /// Property read: `receiver.property`
    ReadProperty {
        receiver: Box<IrNode>,
        property: PropertyId,
    },

    /// Built-in length accessor of an intrinsic array-like value
    ArrayLength(Box<IrNode>),

    /// Built-in element access of an intrinsic array-like value
    ArrayIndex {
        array: Box<IrNode>,
        index: Box<IrNode>,
    },

    /// Binary expression: `left op right`
    Binary {
        op: BinaryOp,
        left: Box<IrNode>,
        right: Box<IrNode>,
    },

    /// Null test: `value != null`
    NotNull(Box<IrNode>),

    /// Runtime conformance test: `value as Target`, null when the dynamic
    /// instance does not conform.
    CastOrNull {
        value: Box<IrNode>,
        target: TypeId,
    },

    // =========================================================================
    // Statements
    // =========================================================================
    /// Statement sequence
    Block(Vec<IrNode>),

    /// Local binding: `let local: ty = init`
    DeclareLocal {
        local: LocalId,
        ty: TypeId,
        init: Option<Box<IrNode>>,
    },

    /// Local assignment: `local = value`
    Assign {
        local: LocalId,
        value: Box<IrNode>,
    },

    /// Loop: `while condition { body }`
    While {
        condition: Box<IrNode>,
        body: Box<IrNode>,
    },

    /// Conditional: `if condition { then } else { else }`
    If {
        condition: Box<IrNode>,
        then_branch: Box<IrNode>,
        else_branch: Option<Box<IrNode>>,
    },

    /// Guarded region: `cleanup` runs on every exit path out of `body`,
    /// normal or not.
    GuardedRelease {
        body: Box<IrNode>,
        cleanup: Box<IrNode>,
    },
}

/// Name and type of a local a fragment introduces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalInfo {
    pub name: String,
    pub ty: TypeId,
}

/// A synthesized loop: the locals it introduces plus the statement tree.
/// Built once per synthesis call and handed off; the engine keeps no
/// reference to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrFragment {
    pub locals: Vec<LocalInfo>,
    pub root: IrNode,
}
