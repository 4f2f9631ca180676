//! Tiny tree-walking evaluator for synthesized fragments.
//!
//! Tests register behavior per member handle and then drive a fragment the
//! way a downstream lowering stage eventually would: suspension markers are
//! counted and resumed immediately, runtime conformance tests consult a
//! registered conformance table.

use rustc_hash::FxHashMap;
use sable_lowering::ir::{BinaryOp, IrNode, LocalId};
use sable_types::{FreeFunctionId, MethodId, PropertyId, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub enum Value {
    Unit,
    Int(i64),
    Bool(bool),
    Null,
    Obj(Rc<Instance>),
    Array(Rc<Vec<Value>>),
}

impl Value {
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(value) => *value,
            other => panic!("expected int, got {other:?}"),
        }
    }

    fn as_bool(&self) -> bool {
        match self {
            Value::Bool(value) => *value,
            other => panic!("expected bool, got {other:?}"),
        }
    }
}

/// A runtime object with one integer state cell, which is all the test
/// iterators need.
#[derive(Debug)]
pub struct Instance {
    pub ty: TypeId,
    pub state: RefCell<i64>,
}

impl Instance {
    pub fn new(ty: TypeId) -> Rc<Self> {
        Rc::new(Instance {
            ty,
            state: RefCell::new(0),
        })
    }
}

type MethodFn = Rc<dyn Fn(&Value, &[Value]) -> Value>;
type PropertyFn = Rc<dyn Fn(&Value) -> Value>;
type ExtensionFn = Rc<dyn Fn(&[Value]) -> Value>;

#[derive(Default)]
pub struct Vm {
    methods: FxHashMap<MethodId, MethodFn>,
    properties: FxHashMap<PropertyId, PropertyFn>,
    extensions: FxHashMap<FreeFunctionId, ExtensionFn>,
    /// Dynamic conformance: instance type -> interfaces it satisfies.
    conforms: FxHashMap<TypeId, Vec<TypeId>>,
    locals: FxHashMap<LocalId, Value>,
    pub cast_evaluations: usize,
    pub suspensions: usize,
}

impl Vm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(&mut self, id: MethodId, f: impl Fn(&Value, &[Value]) -> Value + 'static) {
        self.methods.insert(id, Rc::new(f));
    }

    pub fn property(&mut self, id: PropertyId, f: impl Fn(&Value) -> Value + 'static) {
        self.properties.insert(id, Rc::new(f));
    }

    pub fn extension(&mut self, id: FreeFunctionId, f: impl Fn(&[Value]) -> Value + 'static) {
        self.extensions.insert(id, Rc::new(f));
    }

    pub fn conform(&mut self, ty: TypeId, interface: TypeId) {
        self.conforms.entry(ty).or_default().push(interface);
    }

    pub fn local(&self, id: LocalId) -> Value {
        match self.locals.get(&id) {
            Some(value) => value.clone(),
            None => panic!("local {id:?} never assigned"),
        }
    }

    pub fn run(&mut self, node: &IrNode) {
        self.exec(node);
    }

    fn exec(&mut self, node: &IrNode) {
        match node {
            IrNode::Block(stmts) => {
                for stmt in stmts {
                    self.exec(stmt);
                }
            }
            IrNode::DeclareLocal { local, init, .. } => {
                let value = match init {
                    Some(init) => self.eval(init),
                    None => Value::Unit,
                };
                self.locals.insert(*local, value);
            }
            IrNode::Assign { local, value } => {
                let value = self.eval(value);
                self.locals.insert(*local, value);
            }
            IrNode::While { condition, body } => {
                while self.eval(condition).as_bool() {
                    self.exec(body);
                }
            }
            IrNode::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition).as_bool() {
                    self.exec(then_branch);
                } else if let Some(else_branch) = else_branch {
                    self.exec(else_branch);
                }
            }
            IrNode::GuardedRelease { body, cleanup } => {
                self.exec(body);
                self.exec(cleanup);
            }
            other => {
                self.eval(other);
            }
        }
    }

    fn eval(&mut self, node: &IrNode) -> Value {
        match node {
            IrNode::IntLiteral(value) => Value::Int(*value),
            IrNode::BoolLiteral(value) => Value::Bool(*value),
            IrNode::NullLiteral => Value::Null,
            IrNode::DefaultValue(ty) => match *ty {
                TypeId::INT => Value::Int(0),
                TypeId::BOOL => Value::Bool(false),
                _ => Value::Unit,
            },
            IrNode::Local(local) => self.local(*local),
            IrNode::CallMethod {
                receiver,
                method,
                args,
                suspend,
                ..
            } => {
                let receiver = self.eval(receiver);
                let args: Vec<Value> = args.iter().map(|arg| self.eval(arg)).collect();
                if *suspend {
                    self.suspensions += 1;
                }
                let f = match self.methods.get(method) {
                    Some(f) => Rc::clone(f),
                    None => panic!("no behavior registered for method {method:?}"),
                };
                f(&receiver, &args)
            }
            IrNode::CallExtension {
                function,
                args,
                suspend,
            } => {
                let args: Vec<Value> = args.iter().map(|arg| self.eval(arg)).collect();
                if *suspend {
                    self.suspensions += 1;
                }
                let f = match self.extensions.get(function) {
                    Some(f) => Rc::clone(f),
                    None => panic!("no behavior registered for free function {function:?}"),
                };
                f(&args)
            }
            IrNode::ReadProperty { receiver, property } => {
                let receiver = self.eval(receiver);
                let f = match self.properties.get(property) {
                    Some(f) => Rc::clone(f),
                    None => panic!("no behavior registered for property {property:?}"),
                };
                f(&receiver)
            }
            IrNode::ArrayLength(array) => match self.eval(array) {
                Value::Array(values) => Value::Int(values.len() as i64),
                other => panic!("expected array, got {other:?}"),
            },
            IrNode::ArrayIndex { array, index } => {
                let index = self.eval(index).as_int();
                match self.eval(array) {
                    Value::Array(values) => values[index as usize].clone(),
                    other => panic!("expected array, got {other:?}"),
                }
            }
            IrNode::Binary { op, left, right } => {
                let left = self.eval(left).as_int();
                let right = self.eval(right).as_int();
                match op {
                    BinaryOp::Lt => Value::Bool(left < right),
                    BinaryOp::Add => Value::Int(left + right),
                }
            }
            IrNode::NotNull(value) => {
                let value = self.eval(value);
                Value::Bool(!matches!(value, Value::Null))
            }
            IrNode::CastOrNull { value, target } => {
                self.cast_evaluations += 1;
                let value = self.eval(value);
                match &value {
                    Value::Obj(instance)
                        if self
                            .conforms
                            .get(&instance.ty)
                            .is_some_and(|ifaces| ifaces.contains(target)) =>
                    {
                        value
                    }
                    _ => Value::Null,
                }
            }
            other => panic!("not an expression: {other:?}"),
        }
    }
}
