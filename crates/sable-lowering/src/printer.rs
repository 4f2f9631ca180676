//! Deterministic pseudo-code rendering of fragments.
//!
//! Walks an `IrFragment` and prints one statement per line, resolving
//! member handles to their names through the universe. Used by tests to
//! assert on synthesized shapes and by tooling to show what a loop lowers
//! to.

use crate::ir::{BinaryOp, IrFragment, IrNode, LocalId};
use sable_types::{TypeUniverse, format_type};

pub struct IrPrinter<'a> {
    db: &'a dyn TypeUniverse,
    fragment: &'a IrFragment,
}

impl<'a> IrPrinter<'a> {
    pub fn new(db: &'a dyn TypeUniverse, fragment: &'a IrFragment) -> Self {
        IrPrinter { db, fragment }
    }

    pub fn print(&self) -> String {
        let mut out = String::new();
        self.stmt(&self.fragment.root, 0, &mut out);
        out
    }

    fn local_name(&self, local: LocalId) -> &str {
        match self.fragment.locals.get(local.0 as usize) {
            Some(info) => &info.name,
            None => "<unknown local>",
        }
    }

    fn line(&self, indent: usize, text: &str, out: &mut String) {
        for _ in 0..indent {
            out.push_str("  ");
        }
        out.push_str(text);
        out.push('\n');
    }

    fn stmt(&self, node: &IrNode, indent: usize, out: &mut String) {
        match node {
            IrNode::Block(stmts) => {
                for stmt in stmts {
                    self.stmt(stmt, indent, out);
                }
            }
            IrNode::DeclareLocal { local, ty, init } => {
                let text = match init {
                    Some(init) => format!(
                        "let {}: {} = {}",
                        self.local_name(*local),
                        format_type(self.db, *ty),
                        self.expr(init)
                    ),
                    None => format!(
                        "let {}: {}",
                        self.local_name(*local),
                        format_type(self.db, *ty)
                    ),
                };
                self.line(indent, &text, out);
            }
            IrNode::Assign { local, value } => {
                let text = format!("{} = {}", self.local_name(*local), self.expr(value));
                self.line(indent, &text, out);
            }
            IrNode::While { condition, body } => {
                self.line(indent, &format!("while {} {{", self.expr(condition)), out);
                self.stmt(body, indent + 1, out);
                self.line(indent, "}", out);
            }
            IrNode::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.line(indent, &format!("if {} {{", self.expr(condition)), out);
                self.stmt(then_branch, indent + 1, out);
                match else_branch {
                    Some(else_branch) => {
                        self.line(indent, "} else {", out);
                        self.stmt(else_branch, indent + 1, out);
                        self.line(indent, "}", out);
                    }
                    None => self.line(indent, "}", out),
                }
            }
            IrNode::GuardedRelease { body, cleanup } => {
                self.line(indent, "guard {", out);
                self.stmt(body, indent + 1, out);
                self.line(indent, "} release {", out);
                self.stmt(cleanup, indent + 1, out);
                self.line(indent, "}", out);
            }
            // Expression used in statement position (calls for effect).
            other => {
                let text = self.expr(other);
                self.line(indent, &text, out);
            }
        }
    }

    fn expr(&self, node: &IrNode) -> String {
        match node {
            IrNode::IntLiteral(value) => value.to_string(),
            IrNode::BoolLiteral(value) => value.to_string(),
            IrNode::NullLiteral => "null".to_string(),
            IrNode::DefaultValue(ty) => format!("default({})", format_type(self.db, *ty)),
            IrNode::Local(local) => self.local_name(*local).to_string(),
            IrNode::CallMethod {
                receiver,
                method,
                args,
                suspend,
                ..
            } => {
                let name = self.db.name(self.db.method(*method).name);
                let prefix = if *suspend { "await " } else { "" };
                format!(
                    "{prefix}{}.{name}({})",
                    self.expr(receiver),
                    self.args(args)
                )
            }
            IrNode::CallExtension {
                function,
                args,
                suspend,
            } => {
                let name = self.db.name(self.db.free_function(*function).name);
                let prefix = if *suspend { "await " } else { "" };
                format!("{prefix}{name}({})", self.args(args))
            }
            IrNode::ReadProperty { receiver, property } => {
                let name = self.db.name(self.db.property(*property).name);
                format!("{}.{name}", self.expr(receiver))
            }
            IrNode::ArrayLength(array) => format!("{}.length", self.expr(array)),
            IrNode::ArrayIndex { array, index } => {
                format!("{}[{}]", self.expr(array), self.expr(index))
            }
            IrNode::Binary { op, left, right } => {
                let op = match op {
                    BinaryOp::Lt => "<",
                    BinaryOp::Add => "+",
                };
                format!("{} {op} {}", self.expr(left), self.expr(right))
            }
            IrNode::NotNull(value) => format!("{} != null", self.expr(value)),
            IrNode::CastOrNull { value, target } => {
                format!("{} as {}", self.expr(value), format_type(self.db, *target))
            }
            // Statement-shaped nodes have no expression rendering; show a
            // placeholder rather than faulting in a diagnostic path.
            other => format!("<stmt {other:?}>"),
        }
    }

    fn args(&self, args: &[IrNode]) -> String {
        args.iter()
            .map(|arg| self.expr(arg))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
