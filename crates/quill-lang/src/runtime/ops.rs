//! Value coercions and operator semantics.
//!
//! Scripts follow the loose rules of the browser host language they were
//! first written against: numbers and strings convert into each other on
//! demand, `+` prefers concatenation, `==` coerces across kinds and
//! arrays/objects compare by identity.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::runtime::value::Value;
use crate::syntax::ast::{BinOp, UnOp};

// ─── Conversions ─────────────────────────────────────────────────────────────

pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b)   => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::Str(s)    => !s.is_empty(),
        Value::Null | Value::Undefined => false,
        Value::Array(_) | Value::Object(_)
        | Value::Function(_) | Value::Native(_) | Value::Method { .. } => true,
    }
}

pub fn to_number(v: &Value) -> f64 {
    match v {
        Value::Number(n) => *n,
        Value::Bool(b)   => if *b { 1.0 } else { 0.0 },
        Value::Null      => 0.0,
        Value::Str(s)    => parse_number(s),
        Value::Array(_)  => parse_number(&to_display(v)),
        Value::Undefined | Value::Object(_)
        | Value::Function(_) | Value::Native(_) | Value::Method { .. } => f64::NAN,
    }
}

/// String to number: surrounding whitespace ignored, empty is 0, anything
/// that is not a complete numeric literal is NaN.
fn parse_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity"              => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = t.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).map(|n| n as f64).unwrap_or(f64::NAN);
        }
    }
    // Rust accepts `inf` / `nan` spellings that scripts must not.
    if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Integer conversion used for indices and counts: NaN becomes 0 and the
/// fraction is dropped toward zero.
pub fn to_integer(v: &Value) -> f64 {
    let n = to_number(v);
    if n.is_nan() { 0.0 } else { n.trunc() }
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if !(1e-6..1e21).contains(&abs) {
        let s = format!("{n:e}");
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => s,
        };
    }
    format!("{n}")
}

/// Script-visible string form of any value.
pub fn to_display(v: &Value) -> String {
    let mut seen = Vec::new();
    display_inner(v, &mut seen)
}

fn display_inner(v: &Value, seen: &mut Vec<*const ()>) -> String {
    match v {
        Value::Number(n) => format_number(*n),
        Value::Str(s)    => s.clone(),
        Value::Bool(b)   => b.to_string(),
        Value::Null      => "null".to_string(),
        Value::Undefined => "undefined".to_string(),
        Value::Array(items) => {
            let ptr = Rc::as_ptr(items) as *const ();
            if seen.contains(&ptr) {
                return String::new();
            }
            seen.push(ptr);
            let out = items.borrow().iter()
                .map(|item| match item {
                    Value::Null | Value::Undefined => String::new(),
                    other => display_inner(other, seen),
                })
                .collect::<Vec<_>>()
                .join(",");
            seen.pop();
            out
        }
        Value::Object(_) => "[object Object]".to_string(),
        Value::Function(f) => format!("function {}({}) {{ ... }}", f.name, f.params.join(", ")),
        Value::Native(n) => format!("function {}() {{ [native code] }}", n.name),
        Value::Method { method, .. } => format!("function {}() {{ [native code] }}", method.name),
    }
}

/// Arrays, objects and functions collapse to their string form; everything
/// else is already primitive.
fn to_primitive(v: Value) -> Value {
    match v {
        Value::Array(_) | Value::Object(_)
        | Value::Function(_) | Value::Native(_) | Value::Method { .. } => Value::Str(to_display(&v)),
        other => other,
    }
}

// ─── Equality ────────────────────────────────────────────────────────────────

fn same_reference(a: &Value, b: &Value) -> Option<bool> {
    Some(match (a, b) {
        (Value::Array(x), Value::Array(y))       => Rc::ptr_eq(x, y),
        (Value::Object(x), Value::Object(y))     => Rc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        (Value::Native(x), Value::Native(y))     => x.same(y),
        (Value::Method { receiver: ra, method: ma }, Value::Method { receiver: rb, method: mb }) => {
            std::ptr::eq(*ma, *mb) && strict_eq(ra, rb)
        }
        _ => return None,
    })
}

/// `===`: no coercion, NaN is unequal to itself.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Str(x), Value::Str(y))       => x == y,
        (Value::Bool(x), Value::Bool(y))     => x == y,
        (Value::Null, Value::Null)           => true,
        (Value::Undefined, Value::Undefined) => true,
        _ => same_reference(a, b).unwrap_or(false),
    }
}

/// Like `strict_eq` but NaN matches NaN. Used by `includes`.
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => strict_eq(a, b),
    }
}

/// `==` with cross-kind coercion.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (x, y) if x.is_nullish() || y.is_nullish() => x.is_nullish() && y.is_nullish(),

        (Value::Number(_), Value::Number(_))
        | (Value::Str(_), Value::Str(_))
        | (Value::Bool(_), Value::Bool(_)) => strict_eq(a, b),

        (Value::Number(x), Value::Str(_)) => *x == to_number(b),
        (Value::Str(_), Value::Number(y)) => to_number(a) == *y,

        (Value::Bool(_), _) => loose_eq(&Value::Number(to_number(a)), b),
        (_, Value::Bool(_)) => loose_eq(a, &Value::Number(to_number(b))),

        _ => match same_reference(a, b) {
            Some(same) => same,
            None => {
                // one side is a reference, the other a number or string
                let (a, b) = (to_primitive(a.clone()), to_primitive(b.clone()));
                match (&a, &b) {
                    (Value::Str(_) | Value::Number(_), Value::Str(_) | Value::Number(_)) => loose_eq(&a, &b),
                    _ => false,
                }
            }
        },
    }
}

// ─── Operators ───────────────────────────────────────────────────────────────

/// Both operands are already evaluated; `&&` and `||` select one of them.
pub fn binary(op: BinOp, l: Value, r: Value) -> Value {
    match op {
        BinOp::Add => {
            let (l, r) = (to_primitive(l), to_primitive(r));
            if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
                Value::Str(to_display(&l) + &to_display(&r))
            } else {
                Value::Number(to_number(&l) + to_number(&r))
            }
        }
        BinOp::Sub => Value::Number(to_number(&l) - to_number(&r)),
        BinOp::Mul => Value::Number(to_number(&l) * to_number(&r)),
        BinOp::Div => Value::Number(to_number(&l) / to_number(&r)),

        BinOp::Eq    => Value::Bool(loose_eq(&l, &r)),
        BinOp::NotEq => Value::Bool(!loose_eq(&l, &r)),

        BinOp::Lt   => Value::Bool(compare(l, r) == Some(Ordering::Less)),
        BinOp::Gt   => Value::Bool(compare(l, r) == Some(Ordering::Greater)),
        BinOp::LtEq => Value::Bool(matches!(compare(l, r), Some(Ordering::Less | Ordering::Equal))),
        BinOp::GtEq => Value::Bool(matches!(compare(l, r), Some(Ordering::Greater | Ordering::Equal))),

        BinOp::And => if is_truthy(&l) { r } else { l },
        BinOp::Or  => if is_truthy(&l) { l } else { r },
    }
}

/// Two strings compare lexicographically, anything else numerically.
/// `None` when either side is NaN.
fn compare(l: Value, r: Value) -> Option<Ordering> {
    let (l, r) = (to_primitive(l), to_primitive(r));
    match (&l, &r) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => to_number(&l).partial_cmp(&to_number(&r)),
    }
}

pub fn unary(op: UnOp, v: Value) -> Value {
    match op {
        UnOp::Neg => Value::Number(-to_number(&v)),
        UnOp::Not => Value::Bool(!is_truthy(&v)),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
