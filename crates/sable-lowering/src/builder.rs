//! Protocol-independent IR builders.
//!
//! Generic `while` and guarded-release shapes plus the fragment local pool.
//! Nothing here knows about iteration protocols; the synthesizer selects
//! and composes these shapes.

use crate::ir::{IrFragment, IrNode, LocalId, LocalInfo};
use sable_types::{MethodId, TypeId};

/// Allocates fragment locals and assembles the final fragment.
#[derive(Debug, Default)]
pub struct FragmentBuilder {
    locals: Vec<LocalInfo>,
}

impl FragmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh local. The hint becomes the local's name, suffixed
    /// when the hint is already taken.
    pub fn fresh_local(&mut self, hint: &str, ty: TypeId) -> LocalId {
        let taken = self.locals.iter().filter(|l| l.name.starts_with(hint)).count();
        let name = if taken == 0 {
            hint.to_string()
        } else {
            format!("{hint}_{taken}")
        };
        let id = LocalId(self.locals.len() as u32);
        self.locals.push(LocalInfo { name, ty });
        id
    }

    pub fn finish(self, root: IrNode) -> IrFragment {
        IrFragment {
            locals: self.locals,
            root,
        }
    }
}

/// `while condition { body }`
pub fn while_loop(condition: IrNode, body: IrNode) -> IrNode {
    IrNode::While {
        condition: Box::new(condition),
        body: Box::new(body),
    }
}

/// Region whose cleanup runs on every exit path.
pub fn guarded_release(body: IrNode, cleanup: IrNode) -> IrNode {
    IrNode::GuardedRelease {
        body: Box::new(body),
        cleanup: Box::new(cleanup),
    }
}

/// Unconditional release call, for iterators that cannot be absent.
pub fn release_unconditional(iterator: IrNode, release: MethodId, suspend: bool) -> IrNode {
    IrNode::CallMethod {
        receiver: Box::new(iterator),
        method: release,
        args: Vec::new(),
        suspend,
        via_interface: false,
    }
}

/// Null-guarded release call, for reference iterators with proven
/// conformance.
pub fn release_null_guarded(iterator: IrNode, release: MethodId, suspend: bool) -> IrNode {
    IrNode::If {
        condition: Box::new(IrNode::NotNull(Box::new(iterator.clone()))),
        then_branch: Box::new(release_unconditional(iterator, release, suspend)),
        else_branch: None,
    }
}

/// Type-test-guarded release: the conformance test binds a probe local and
/// is evaluated exactly once, where this node is placed.
pub fn release_type_tested(
    builder: &mut FragmentBuilder,
    iterator: IrNode,
    target: TypeId,
    release: MethodId,
    suspend: bool,
) -> IrNode {
    let probe = builder.fresh_local("release_probe", target);
    IrNode::Block(vec![
        IrNode::DeclareLocal {
            local: probe,
            ty: target,
            init: Some(Box::new(IrNode::CastOrNull {
                value: Box::new(iterator),
                target,
            })),
        },
        IrNode::If {
            condition: Box::new(IrNode::NotNull(Box::new(IrNode::Local(probe)))),
            then_branch: Box::new(IrNode::CallMethod {
                receiver: Box::new(IrNode::Local(probe)),
                method: release,
                args: Vec::new(),
                suspend,
                via_interface: true,
            }),
            else_branch: None,
        },
    ])
}
