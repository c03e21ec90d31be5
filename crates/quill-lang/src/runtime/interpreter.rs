//! Async tree-walking interpreter.
//!
//! Every node visit returns a boxed local future so host natives can
//! suspend, but statements still run strictly one after another. Control
//! flow (`return`, `break`, `continue`, `exit()`) travels on the error side
//! as an `Interrupt` until a handler catches it.
//!
//! Each nested script call costs a few native stack frames while the run is
//! polled, so call depth is capped by `State::max_call_depth`.

use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use crate::error::{Interrupt, RuntimeError};
use crate::namespaces::State;
use crate::runtime::interpolate::{self, Segment};
use crate::runtime::intrinsics;
use crate::runtime::ops::{self, is_truthy, to_display, to_number};
use crate::runtime::value::{NativeKind, Object, Value};
use crate::syntax::ast::{
    AssignTarget, BinOp, Expr, ForStmt, FunctionDecl, IfStmt, Literal, Program, Span, Stmt, UpdateOp,
    WhileStmt,
};

type Eval<'a, T> = LocalBoxFuture<'a, Result<T, Interrupt>>;

/// Index writes past this length are refused instead of allocating.
const MAX_ARRAY_LEN: usize = 1 << 24;

// ─── Places ──────────────────────────────────────────────────────────────────

/// An assignment target with its object and index already evaluated.
enum Place {
    Variable(String),
    Member(Value, String),
    Index(Value, Value),
}

// ─── Interpreter ─────────────────────────────────────────────────────────────

pub struct Interpreter<'s> {
    state: &'s mut State,
    /// Script functions currently executing.
    depth: usize,
}

impl<'s> Interpreter<'s> {
    pub fn new(state: &'s mut State) -> Self {
        Self { state, depth: 0 }
    }

    pub async fn run(&mut self, program: &Program) -> Result<(), Interrupt> {
        self.exec_block(&program.statements).await
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    pub fn exec_block<'a>(&'a mut self, stmts: &'a [Stmt]) -> Eval<'a, ()> {
        async move {
            for stmt in stmts {
                self.exec_stmt(stmt).await?;
            }
            Ok(())
        }
        .boxed_local()
    }

    pub fn exec_stmt<'a>(&'a mut self, stmt: &'a Stmt) -> Eval<'a, ()> {
        async move {
            match stmt {
                Stmt::Function(decl) => {
                    self.state.set(decl.name.clone(), Value::Function(decl.clone()));
                }

                Stmt::Return(expr, _) => {
                    let value = match expr {
                        Some(e) => self.eval_expr(e).await?,
                        None => Value::Null,
                    };
                    return Err(Interrupt::Return(value));
                }

                Stmt::If(i) => self.exec_if(i).await?,

                Stmt::While(w) => self.exec_while(w).await?,
                Stmt::For(f) => self.exec_for(f).await?,

                Stmt::Break(_) => return Err(Interrupt::Break),
                Stmt::Continue(_) => return Err(Interrupt::Continue),

                Stmt::Expr(e) => {
                    self.eval_expr(e).await?;
                }
            }
            Ok(())
        }
        .boxed_local()
    }

    async fn exec_while(&mut self, w: &WhileStmt) -> Result<(), Interrupt> {
        while is_truthy(&self.eval_expr(&w.condition).await?) {
            if !loop_control(self.exec_block(&w.body).await)? {
                break;
            }
        }
        Ok(())
    }

    /// The count is evaluated once; the variable keeps its last value.
    async fn exec_for(&mut self, f: &ForStmt) -> Result<(), Interrupt> {
        let count = to_number(&self.eval_expr(&f.count).await?);
        let mut i = 0.0;
        while i < count {
            self.state.set(f.var_name.clone(), Value::Number(i));
            if !loop_control(self.exec_block(&f.body).await)? {
                break;
            }
            i += 1.0;
        }
        Ok(())
    }

    async fn exec_if(&mut self, i: &IfStmt) -> Result<(), Interrupt> {
        if is_truthy(&self.eval_expr(&i.condition).await?) {
            return self.exec_block(&i.then_block).await;
        }
        for branch in &i.elseifs {
            if is_truthy(&self.eval_expr(&branch.condition).await?) {
                return self.exec_block(&branch.body).await;
            }
        }
        match &i.else_block {
            Some(block) => self.exec_block(block).await,
            None => Ok(()),
        }
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    pub fn eval_expr<'a>(&'a mut self, expr: &'a Expr) -> Eval<'a, Value> {
        async move {
            match expr {
                Expr::Literal(lit, span) => match lit {
                    Literal::Number(n) => Ok(Value::Number(*n)),
                    Literal::Str(s) if s.contains("${") => self.interpolate(s, *span).await.map(Value::Str),
                    Literal::Str(s) => Ok(Value::Str(s.clone())),
                    Literal::Bool(b) => Ok(Value::Bool(*b)),
                    Literal::Null => Ok(Value::Null),
                    Literal::Undefined => Ok(Value::Undefined),
                },

                Expr::Variable(name, span) => Ok(self.lookup(name, span.line)?),

                Expr::Assign { target, value, span } => self.eval_assign(target, value, span.line).await,

                Expr::CompoundAssign { target, op, value, span } => {
                    self.eval_compound(target, *op, value, span.line).await
                }

                Expr::Update { op, name, .. } => {
                    let old = self.state.get(name).cloned().unwrap_or(Value::Undefined);
                    let step = match op {
                        UpdateOp::Increment => BinOp::Add,
                        UpdateOp::Decrement => BinOp::Sub,
                    };
                    self.state.set(name.clone(), ops::binary(step, old.clone(), Value::Number(1.0)));
                    Ok(old)
                }

                Expr::Unary { op, operand, .. } => {
                    let v = self.eval_expr(operand).await?;
                    Ok(ops::unary(*op, v))
                }

                // No short-circuit: both sides always run.
                Expr::Binary { left, op, right, .. } => {
                    let l = self.eval_expr(left).await?;
                    let r = self.eval_expr(right).await?;
                    Ok(ops::binary(*op, l, r))
                }

                Expr::Call { callee, args, span } => self.eval_call(callee, args, span.line).await,

                Expr::Member { object, property, span } => {
                    let obj = self.eval_expr(object).await?;
                    Ok(get_member(&obj, property, span.line)?)
                }

                Expr::Index { object, index, span } => {
                    let obj = self.eval_expr(object).await?;
                    let idx = self.eval_expr(index).await?;
                    Ok(get_index(&obj, &idx, span.line)?)
                }

                Expr::Array(items, _) => Ok(Value::array(self.eval_all(items).await?)),

                // A new object on every visit.
                Expr::Object(props, _) => {
                    let mut obj = Object::new();
                    for (key, e) in props {
                        let v = self.eval_expr(e).await?;
                        obj.set(key.clone(), v);
                    }
                    Ok(Value::object(obj))
                }
            }
        }
        .boxed_local()
    }

    async fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, Interrupt> {
        let mut vals = Vec::with_capacity(exprs.len());
        for e in exprs {
            vals.push(self.eval_expr(e).await?);
        }
        Ok(vals)
    }

    async fn eval_call(&mut self, callee: &Expr, args: &[Expr], line: usize) -> Result<Value, Interrupt> {
        let f = self.eval_expr(callee).await?;
        let vals = self.eval_all(args).await?;
        if !f.is_callable() {
            let what = match callee {
                Expr::Variable(name, _) => format!("`{name}`"),
                Expr::Member { property, .. } => format!("`{property}`"),
                _ => format!("{} value", f.type_name()),
            };
            return Err(RuntimeError::new(line, format!("{what} is not a function")).into());
        }
        self.call_value(f, vals, line).await
    }

    fn lookup(&self, name: &str, line: usize) -> Result<Value, RuntimeError> {
        self.state.get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::new(line, format!("undefined variable `{name}`")))
    }

    async fn interpolate(&mut self, text: &str, span: Span) -> Result<String, Interrupt> {
        let mut out = String::with_capacity(text.len());
        for segment in interpolate::segments(text) {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Expr(src) => {
                    let expr = interpolate::compile(src, span)?;
                    let v = self.eval_expr(&expr).await?;
                    out.push_str(&to_display(&v));
                }
            }
        }
        Ok(out)
    }

    // ─── Assignment ──────────────────────────────────────────────────────────

    /// The assigned value is computed before the target's parts.
    async fn eval_assign(&mut self, target: &AssignTarget, value: &Expr, line: usize) -> Result<Value, Interrupt> {
        let v = self.eval_expr(value).await?;
        let place = self.resolve_place(target).await?;
        write_place(self.state, place, v, line)?;
        Ok(Value::Undefined)
    }

    async fn eval_compound(
        &mut self,
        target: &AssignTarget,
        op: BinOp,
        value: &Expr,
        line: usize,
    ) -> Result<Value, Interrupt> {
        let place = self.resolve_place(target).await?;
        let current = self.read_place(&place, line)?;
        let rhs = self.eval_expr(value).await?;
        write_place(self.state, place, ops::binary(op, current, rhs), line)?;
        Ok(Value::Undefined)
    }

    async fn resolve_place(&mut self, target: &AssignTarget) -> Result<Place, Interrupt> {
        Ok(match target {
            AssignTarget::Variable(name) => Place::Variable(name.clone()),
            AssignTarget::Member { object, property } => {
                Place::Member(self.eval_expr(object).await?, property.clone())
            }
            AssignTarget::Index { object, index } => {
                let obj = self.eval_expr(object).await?;
                let idx = self.eval_expr(index).await?;
                Place::Index(obj, idx)
            }
        })
    }

    fn read_place(&self, place: &Place, line: usize) -> Result<Value, RuntimeError> {
        match place {
            Place::Variable(name) => self.lookup(name, line),
            Place::Member(obj, property) => get_member(obj, property, line),
            Place::Index(obj, idx) => get_index(obj, idx, line),
        }
    }

    // ─── Calls ───────────────────────────────────────────────────────────────

    pub fn call_value<'a>(&'a mut self, callee: Value, args: Vec<Value>, line: usize) -> Eval<'a, Value> {
        async move {
            match callee {
                Value::Function(decl) => self.call_function(decl, args, line).await,

                Value::Native(native) => {
                    log::trace!("native `{}` ({} args)", native.name, args.len());
                    let result = match &native.kind {
                        NativeKind::Async(f) => f(args).await,
                        NativeKind::Stateful(f) => f(&mut *self.state, &args),
                        NativeKind::StatefulAsync(f) => f(&mut *self.state, &args).await,
                    };
                    result.map_err(|e| attribute(e, line))
                }

                Value::Method { receiver, method } => {
                    (method.call)(&receiver, &args).map_err(|e| attribute(e.into(), line))
                }

                other => Err(RuntimeError::new(line, format!("{} value is not a function", other.type_name())).into()),
            }
        }
        .boxed_local()
    }

    /// Runs a script function in the shared namespace. Parameters shadow
    /// same-named variables only for the duration of the call; every other
    /// assignment in the body stays visible afterwards.
    ///
    /// Calls nested past `State::max_call_depth` fail before any parameter
    /// is bound.
    async fn call_function(&mut self, decl: Rc<FunctionDecl>, args: Vec<Value>, line: usize) -> Result<Value, Interrupt> {
        if self.depth >= self.state.max_call_depth {
            log::debug!("call `{}` refused at depth {}", decl.name, self.depth);
            return Err(RuntimeError::new(line, "maximum call depth exceeded").into());
        }
        log::trace!("call `{}` at depth {}", decl.name, self.depth);

        // keyed by name: a repeated parameter overwrites its earlier entry
        let mut saved: HashMap<&str, Value> = HashMap::new();
        let mut args = args.into_iter();
        for param in &decl.params {
            if let Some(prev) = self.state.get(param) {
                saved.insert(param.as_str(), prev.clone());
            }
            self.state.set(param.clone(), args.next().unwrap_or(Value::Undefined));
        }

        self.depth += 1;
        let outcome = self.exec_block(&decl.body).await;
        self.depth -= 1;

        for param in &decl.params {
            match saved.get(param.as_str()) {
                Some(prev) => self.state.set(param.clone(), prev.clone()),
                None => {
                    self.state.variables.remove(param);
                }
            }
        }

        match outcome {
            Ok(()) => Ok(Value::Undefined),
            Err(Interrupt::Return(v)) => Ok(v),
            Err(other) => Err(other),
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Folds a loop body's outcome: `Ok(true)` keeps iterating, `Ok(false)` on
/// `break`, anything else propagates.
fn loop_control(result: Result<(), Interrupt>) -> Result<bool, Interrupt> {
    match result {
        Ok(()) | Err(Interrupt::Continue) => Ok(true),
        Err(Interrupt::Break) => Ok(false),
        Err(other) => Err(other),
    }
}

/// Natives raise errors without a position; give them the call site's.
fn attribute(e: Interrupt, line: usize) -> Interrupt {
    match e {
        Interrupt::Error(mut err) if err.line == 0 => {
            err.line = line;
            Interrupt::Error(err)
        }
        other => other,
    }
}

/// Non-negative integral numbers, and strings spelling one (`"2"`, not `"02"`).
fn element_index(index: &Value) -> Option<usize> {
    match index {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n < u32::MAX as f64 => Some(*n as usize),
        Value::Str(s) => s.parse::<usize>().ok().filter(|i| i.to_string() == *s),
        _ => None,
    }
}

fn get_member(obj: &Value, property: &str, line: usize) -> Result<Value, RuntimeError> {
    match obj {
        Value::Null | Value::Undefined => Err(RuntimeError::new(line, format!(
            "cannot read property `{property}` of {}", obj.type_name()
        ))),
        Value::Object(o) => Ok(o.borrow().get(property).cloned().unwrap_or(Value::Undefined)),
        other => Ok(intrinsics::lookup(other, property).unwrap_or(Value::Undefined)),
    }
}

fn get_index(obj: &Value, index: &Value, line: usize) -> Result<Value, RuntimeError> {
    match obj {
        Value::Null | Value::Undefined => Err(RuntimeError::new(line, format!(
            "cannot read index `{}` of {}", to_display(index), obj.type_name()
        ))),
        Value::Array(items) => match element_index(index) {
            Some(i) => Ok(items.borrow().get(i).cloned().unwrap_or(Value::Undefined)),
            None => get_member(obj, &to_display(index), line),
        },
        Value::Str(s) => match element_index(index) {
            Some(i) => Ok(s.chars().nth(i).map_or(Value::Undefined, |c| Value::Str(c.to_string()))),
            None => get_member(obj, &to_display(index), line),
        },
        _ => get_member(obj, &to_display(index), line),
    }
}

fn write_place(state: &mut State, place: Place, value: Value, line: usize) -> Result<(), RuntimeError> {
    match place {
        Place::Variable(name) => {
            state.set(name, value);
            Ok(())
        }
        Place::Member(obj, property) => set_property(&obj, &property, value, line),
        Place::Index(obj, idx) => match element_index(&idx) {
            Some(i) if matches!(obj, Value::Array(_)) => set_property_at(&obj, i, value, line),
            _ => set_property(&obj, &to_display(&idx), value, line),
        },
    }
}

/// Writes to primitives and functions are silently dropped.
fn set_property(obj: &Value, key: &str, value: Value, line: usize) -> Result<(), RuntimeError> {
    match obj {
        Value::Null | Value::Undefined => Err(RuntimeError::new(line, format!(
            "cannot set property `{key}` of {}", obj.type_name()
        ))),
        Value::Object(o) => {
            o.borrow_mut().set(key, value);
            Ok(())
        }
        Value::Array(items) if key == "length" => {
            let n = to_number(&value);
            if n < 0.0 || n.fract() != 0.0 || n as usize > MAX_ARRAY_LEN {
                return Err(RuntimeError::new(line, format!("invalid array length {}", to_display(&value))));
            }
            items.borrow_mut().resize(n as usize, Value::Undefined);
            Ok(())
        }
        Value::Array(_) => match element_index(&Value::str(key)) {
            Some(i) => set_property_at(obj, i, value, line),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Writing past the end pads with `undefined`.
fn set_property_at(obj: &Value, i: usize, value: Value, line: usize) -> Result<(), RuntimeError> {
    let Value::Array(items) = obj else { return Ok(()) };
    if i >= MAX_ARRAY_LEN {
        return Err(RuntimeError::new(line, format!("array index {i} is too large")));
    }
    let mut items = items.borrow_mut();
    if i >= items.len() {
        items.resize(i + 1, Value::Undefined);
    }
    items[i] = value;
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
