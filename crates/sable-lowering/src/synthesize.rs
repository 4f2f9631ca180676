//! Iteration synthesis.
//!
//! Consumes a resolved protocol descriptor and emits the lowered loop:
//! one acquisition binding (never re-invoked), the release wrapper selected
//! by the resource category, and the while loop driving advance/current with
//! the caller-built body. Synchronous and allocation-only; async protocols
//! only mark their calls as suspension points.

use crate::builder::{
    FragmentBuilder, guarded_release, release_null_guarded, release_type_tested,
    release_unconditional, while_loop,
};
use crate::ir::{BinaryOp, IrFragment, IrNode};
use sable_binder::{
    AcquireHandle, Flavor, IndexableShape, IterationShape, ProtocolDescriptor, ProtocolFamily,
    ResolutionError, ResourceCategory,
};
use sable_types::{MethodId, TypeId, TypeUniverse};
use tracing::debug;

/// Synthesize the loop fragment for a resolution result.
///
/// `subject` is the expression the loop iterates over; `cancellation` is the
/// optional token expression threaded through a cancellation-passing
/// acquire (the default token value is used when absent). `body` receives
/// the builder and the element-read expression and returns the loop body.
///
/// Calling this with a failed resolution is a contract violation by the
/// embedding tool and faults; the resolution error is the compile-time
/// diagnostic and no fragment exists for it.
pub fn synthesize(
    db: &dyn TypeUniverse,
    resolution: &Result<ProtocolDescriptor, ResolutionError>,
    subject: IrNode,
    cancellation: Option<IrNode>,
    body: impl FnOnce(&mut FragmentBuilder, IrNode) -> IrNode,
) -> IrFragment {
    let descriptor = match resolution {
        Ok(descriptor) => descriptor,
        Err(error) => panic!(
            "cannot synthesize iteration from a failed resolution: {}",
            error.render(db)
        ),
    };
    debug!(family = ?descriptor.family(), "synthesizing loop fragment");
    match descriptor {
        ProtocolDescriptor::Indexable(shape) => synthesize_indexable(shape, subject, body),
        ProtocolDescriptor::SyncIterable(shape)
        | ProtocolDescriptor::AsyncIterable(shape)
        | ProtocolDescriptor::SyncIterator(shape)
        | ProtocolDescriptor::AsyncIterator(shape) => {
            synthesize_iteration(db, descriptor.family(), shape, subject, cancellation, body)
        }
    }
}

fn synthesize_iteration(
    db: &dyn TypeUniverse,
    family: ProtocolFamily,
    shape: &IterationShape,
    subject: IrNode,
    cancellation: Option<IrNode>,
    body: impl FnOnce(&mut FragmentBuilder, IrNode) -> IrNode,
) -> IrFragment {
    let flavor = family.flavor();
    let suspend = flavor == Flavor::Async;
    let mut builder = FragmentBuilder::new();
    let iter_local = builder.fresh_local("iter", shape.iterator);

    // (a) One acquisition call bound to a local; iterator families bind the
    // subject itself.
    let acquire_expr = match shape.acquire {
        None => subject,
        Some(AcquireHandle::Method(method)) => {
            let args = cancellation_args(db, shape, cancellation);
            IrNode::CallMethod {
                receiver: Box::new(subject),
                method,
                args,
                suspend: false,
                via_interface: shape.acquire_from_interface,
            }
        }
        Some(AcquireHandle::Extension(function)) => {
            let mut args = vec![subject];
            args.extend(cancellation_args(db, shape, cancellation));
            IrNode::CallExtension {
                function,
                args,
                suspend: false,
            }
        }
    };

    // (c) The loop itself: advance drives the condition, the body reads
    // `current` through the caller's builder.
    let condition = IrNode::CallMethod {
        receiver: Box::new(IrNode::Local(iter_local)),
        method: shape.advance,
        args: Vec::new(),
        suspend,
        via_interface: false,
    };
    let element = IrNode::ReadProperty {
        receiver: Box::new(IrNode::Local(iter_local)),
        property: shape.current,
    };
    let body_node = body(&mut builder, element);
    let loop_node = while_loop(condition, body_node);

    // (b) The release wrapper selected by the resource category.
    let wrapped = match shape.category {
        ResourceCategory::None => loop_node,
        ResourceCategory::StackOnlyDisposable | ResourceCategory::ValueDisposable => {
            guarded_release(
                loop_node,
                release_unconditional(IrNode::Local(iter_local), release_member(shape), suspend),
            )
        }
        ResourceCategory::ReferenceDisposable => guarded_release(
            loop_node,
            release_null_guarded(IrNode::Local(iter_local), release_member(shape), suspend),
        ),
        ResourceCategory::ReferenceMaybeDisposable => {
            let target = match db.well_known(flavor.release_interface()) {
                Some(target) => target,
                None => panic!(
                    "malformed descriptor: deferred release with no release interface registered"
                ),
            };
            // The conformance test sits in the cleanup, after the loop, so
            // it is evaluated exactly once.
            let cleanup = release_type_tested(
                &mut builder,
                IrNode::Local(iter_local),
                target,
                release_member(shape),
                suspend,
            );
            guarded_release(loop_node, cleanup)
        }
    };

    let root = IrNode::Block(vec![
        IrNode::DeclareLocal {
            local: iter_local,
            ty: shape.iterator,
            init: Some(Box::new(acquire_expr)),
        },
        wrapped,
    ]);
    builder.finish(root)
}

/// The intrinsic array fast path: a counting loop over the built-in length
/// accessor. Arrays hold no resources, so no release wrapper applies.
fn synthesize_indexable(
    shape: &IndexableShape,
    subject: IrNode,
    body: impl FnOnce(&mut FragmentBuilder, IrNode) -> IrNode,
) -> IrFragment {
    let mut builder = FragmentBuilder::new();
    let array = builder.fresh_local("subject", shape.subject);
    let index = builder.fresh_local("index", TypeId::INT);

    let element = IrNode::ArrayIndex {
        array: Box::new(IrNode::Local(array)),
        index: Box::new(IrNode::Local(index)),
    };
    let body_node = body(&mut builder, element);

    let root = IrNode::Block(vec![
        IrNode::DeclareLocal {
            local: array,
            ty: shape.subject,
            init: Some(Box::new(subject)),
        },
        IrNode::DeclareLocal {
            local: index,
            ty: TypeId::INT,
            init: Some(Box::new(IrNode::IntLiteral(0))),
        },
        while_loop(
            IrNode::Binary {
                op: BinaryOp::Lt,
                left: Box::new(IrNode::Local(index)),
                right: Box::new(IrNode::ArrayLength(Box::new(IrNode::Local(array)))),
            },
            IrNode::Block(vec![
                body_node,
                IrNode::Assign {
                    local: index,
                    value: Box::new(IrNode::Binary {
                        op: BinaryOp::Add,
                        left: Box::new(IrNode::Local(index)),
                        right: Box::new(IrNode::IntLiteral(1)),
                    }),
                },
            ]),
        ),
    ]);
    builder.finish(root)
}

fn release_member(shape: &IterationShape) -> MethodId {
    match shape.release {
        Some(release) => release,
        None => panic!(
            "malformed descriptor: category {:?} requires a release member",
            shape.category
        ),
    }
}

/// The opaque token argument for a cancellation-passing acquire.
fn cancellation_args(
    db: &dyn TypeUniverse,
    shape: &IterationShape,
    cancellation: Option<IrNode>,
) -> Vec<IrNode> {
    if !shape.passes_cancellation {
        return Vec::new();
    }
    let provided = cancellation.unwrap_or_else(|| {
        let token_ty = match shape.acquire {
            Some(AcquireHandle::Method(method)) => db.method(method).params.last().copied(),
            Some(AcquireHandle::Extension(function)) => {
                db.free_function(function).params.last().copied()
            }
            None => None,
        };
        match token_ty {
            Some(ty) => IrNode::DefaultValue(ty),
            None => panic!("malformed descriptor: cancellation-passing acquire has no parameters"),
        }
    });
    vec![provided]
}
