use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::error::Interrupt;
use crate::namespaces::State;
use crate::runtime::intrinsics::MethodDesc;
use crate::syntax::ast::FunctionDecl;

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    /// Shared by reference: every copy sees in-place mutation.
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<Object>>),
    /// A declared script function.
    Function(Rc<FunctionDecl>),
    Native(NativeFn),
    /// An intrinsic method read off a string or array, bound to that receiver.
    Method {
        receiver: Box<Value>,
        method: &'static MethodDesc,
    },
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(obj: Object) -> Self {
        Value::Object(Rc::new(RefCell::new(obj)))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_)   => "number",
            Value::Str(_)      => "string",
            Value::Bool(_)     => "boolean",
            Value::Null        => "null",
            Value::Undefined   => "undefined",
            Value::Array(_)    => "array",
            Value::Object(_)   => "object",
            Value::Function(_) | Value::Native(_) | Value::Method { .. } => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_) | Value::Method { .. })
    }

    pub fn as_number(&self) -> Option<f64> {
        match self { Value::Number(n) => Some(*n), _ => None }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self { Value::Str(s) => Some(s), _ => None }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Value::Number(n) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Str(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::Str(s) }
}

/// Script-facing string conversion (`"" + v`).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::runtime::ops::to_display(self))
    }
}

// ─── Object ──────────────────────────────────────────────────────────────────

/// String-keyed map that remembers insertion order. Overwriting a key keeps
/// its original position.
#[derive(Debug, Clone, Default)]
pub struct Object {
    entries: Vec<(String, Value)>,
}

impl Object {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut obj = Object::new();
        for (k, v) in iter {
            obj.set(k, v);
        }
        obj
    }
}

// ─── Native functions ────────────────────────────────────────────────────────

pub type NativeResult = Result<Value, Interrupt>;

/// Host callable that may suspend (timers, file and process I/O).
pub type AsyncNative = Rc<dyn Fn(Vec<Value>) -> LocalBoxFuture<'static, NativeResult>>;

/// Host callable that receives the live interpreter state ahead of its
/// arguments. Runs to completion without suspending.
pub type StatefulNative = Rc<dyn Fn(&mut State, &[Value]) -> NativeResult>;

/// Touches the state synchronously, then hands back a future that no
/// longer borrows it. The interpreter awaits that future before moving on.
pub type StatefulAsyncNative = Rc<dyn Fn(&mut State, &[Value]) -> LocalBoxFuture<'static, NativeResult>>;

#[derive(Clone)]
pub enum NativeKind {
    Async(AsyncNative),
    Stateful(StatefulNative),
    StatefulAsync(StatefulAsyncNative),
}

#[derive(Clone)]
pub struct NativeFn {
    pub name: Rc<str>,
    pub kind: NativeKind,
}

impl NativeFn {
    pub fn new<F>(name: &str, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> LocalBoxFuture<'static, NativeResult> + 'static,
    {
        Self { name: name.into(), kind: NativeKind::Async(Rc::new(f)) }
    }

    /// A native that never suspends.
    pub fn sync<F>(name: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> NativeResult + 'static,
    {
        Self::new(name, move |args| future::ready(f(&args)).boxed_local())
    }

    pub fn stateful<F>(name: &str, f: F) -> Self
    where
        F: Fn(&mut State, &[Value]) -> NativeResult + 'static,
    {
        Self { name: name.into(), kind: NativeKind::Stateful(Rc::new(f)) }
    }

    pub fn stateful_async<F>(name: &str, f: F) -> Self
    where
        F: Fn(&mut State, &[Value]) -> LocalBoxFuture<'static, NativeResult> + 'static,
    {
        Self { name: name.into(), kind: NativeKind::StatefulAsync(Rc::new(f)) }
    }

    /// Identity comparison: two handles to the same host closure.
    pub fn same(&self, other: &NativeFn) -> bool {
        match (&self.kind, &other.kind) {
            (NativeKind::Async(a), NativeKind::Async(b)) => Rc::ptr_eq(a, b),
            (NativeKind::Stateful(a), NativeKind::Stateful(b)) => Rc::ptr_eq(a, b),
            (NativeKind::StatefulAsync(a), NativeKind::StatefulAsync(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            NativeKind::Async(_) => "async",
            NativeKind::Stateful(_) => "stateful",
            NativeKind::StatefulAsync(_) => "stateful async",
        };
        write!(f, "NativeFn({}, {kind})", self.name)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
