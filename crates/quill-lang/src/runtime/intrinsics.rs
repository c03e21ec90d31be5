//! Built-in properties and methods reachable through member access on
//! arrays and strings.
//!
//! Method lookups return a `Value::Method` that carries its receiver, so
//! `f = xs.push; f(1)` still pushes onto `xs`.

use crate::error::RuntimeError;
use crate::runtime::ops::{same_value_zero, strict_eq, to_display, to_integer};
use crate::runtime::value::Value;

/// Receives the bound receiver and pre-evaluated args.
pub type MethodFn = fn(&Value, &[Value]) -> Result<Value, RuntimeError>;

#[derive(Debug)]
pub struct MethodDesc {
    pub name: &'static str,
    pub call: MethodFn,
}

/// Property or bound method named `name` on `receiver`. `None` when the
/// receiver kind has no such intrinsic.
pub fn lookup(receiver: &Value, name: &str) -> Option<Value> {
    let (len, table) = match receiver {
        Value::Array(items) => (items.borrow().len(), ARRAY_METHODS),
        Value::Str(s)       => (s.chars().count(), STRING_METHODS),
        _ => return None,
    };
    if name == "length" {
        return Some(Value::Number(len as f64));
    }
    table.iter()
        .find(|m| m.name == name)
        .map(|method| Value::Method { receiver: Box::new(receiver.clone()), method })
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn receiver_str(v: &Value) -> Result<&str, RuntimeError> {
    v.as_str().ok_or_else(|| RuntimeError::native(format!("expected string receiver, got {}", v.type_name())))
}

fn arg_str(args: &[Value], i: usize) -> String {
    to_display(args.get(i).unwrap_or(&Value::Undefined))
}

/// Resolves a possibly negative `start`/`end` argument against `len`.
fn relative_index(arg: Option<&Value>, len: usize, default: usize) -> usize {
    match arg {
        None | Some(Value::Undefined) => default,
        Some(v) => {
            let n = to_integer(v);
            if n < 0.0 {
                (len as f64 + n).max(0.0) as usize
            } else {
                n.min(len as f64) as usize
            }
        }
    }
}

fn char_index(haystack: &str, byte_pos: usize) -> usize {
    haystack[..byte_pos].chars().count()
}

macro_rules! with_array {
    ($v:expr, $items:ident => $body:expr) => {
        match $v {
            Value::Array($items) => $body,
            other => Err(RuntimeError::native(format!("expected array receiver, got {}", other.type_name()))),
        }
    };
}

// ─── Arrays ──────────────────────────────────────────────────────────────────

static ARRAY_METHODS: &[MethodDesc] = &[
    MethodDesc {
        // Appends every argument; returns the new length.
        name: "push",
        call: |v, args| with_array!(v, items => {
            let mut items = items.borrow_mut();
            items.extend(args.iter().cloned());
            Ok(Value::Number(items.len() as f64))
        }),
    },
    MethodDesc {
        name: "pop",
        call: |v, _args| with_array!(v, items => Ok(items.borrow_mut().pop().unwrap_or(Value::Undefined))),
    },
    MethodDesc {
        name: "shift",
        call: |v, _args| with_array!(v, items => {
            let mut items = items.borrow_mut();
            Ok(if items.is_empty() { Value::Undefined } else { items.remove(0) })
        }),
    },
    MethodDesc {
        name: "join",
        call: |v, args| with_array!(v, items => {
            let sep = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(s) => to_display(s),
            };
            // nullish elements print as empty
            let parts: Vec<String> = items.borrow().iter()
                .map(|item| match item {
                    Value::Null | Value::Undefined => String::new(),
                    other => to_display(other),
                })
                .collect();
            Ok(Value::Str(parts.join(&sep)))
        }),
    },
    MethodDesc {
        name: "indexOf",
        call: |v, args| with_array!(v, items => {
            let needle = args.first().unwrap_or(&Value::Undefined);
            let pos = items.borrow().iter().position(|item| strict_eq(item, needle));
            Ok(Value::Number(pos.map_or(-1.0, |p| p as f64)))
        }),
    },
    MethodDesc {
        name: "includes",
        call: |v, args| with_array!(v, items => {
            let needle = args.first().unwrap_or(&Value::Undefined);
            Ok(Value::Bool(items.borrow().iter().any(|item| same_value_zero(item, needle))))
        }),
    },
    MethodDesc {
        // Shallow copy of `[start, end)`; the receiver is untouched.
        name: "slice",
        call: |v, args| with_array!(v, items => {
            let items = items.borrow();
            let start = relative_index(args.first(), items.len(), 0);
            let end = relative_index(args.get(1), items.len(), items.len());
            let out = if start < end { items[start..end].to_vec() } else { Vec::new() };
            Ok(Value::array(out))
        }),
    },
    MethodDesc {
        // In place; returns the same array.
        name: "reverse",
        call: |v, _args| with_array!(v, items => {
            items.borrow_mut().reverse();
            Ok(Value::Array(items.clone()))
        }),
    },
];

// ─── Strings ─────────────────────────────────────────────────────────────────

static STRING_METHODS: &[MethodDesc] = &[
    MethodDesc {
        name: "toUpperCase",
        call: |v, _args| Ok(Value::Str(receiver_str(v)?.to_uppercase())),
    },
    MethodDesc {
        name: "toLowerCase",
        call: |v, _args| Ok(Value::Str(receiver_str(v)?.to_lowercase())),
    },
    MethodDesc {
        name: "trim",
        call: |v, _args| Ok(Value::str(receiver_str(v)?.trim())),
    },
    MethodDesc {
        name: "split",
        call: |v, args| {
            let s = receiver_str(v)?;
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::Undefined) => vec![Value::str(s)],
                Some(sep) => {
                    let sep = to_display(sep);
                    if sep.is_empty() {
                        s.chars().map(|c| Value::Str(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(Value::str).collect()
                    }
                }
            };
            Ok(Value::array(parts))
        },
    },
    MethodDesc {
        name: "includes",
        call: |v, args| Ok(Value::Bool(receiver_str(v)?.contains(arg_str(args, 0).as_str()))),
    },
    MethodDesc {
        // Character position of the first match, or -1.
        name: "indexOf",
        call: |v, args| {
            let s = receiver_str(v)?;
            let pos = s.find(arg_str(args, 0).as_str()).map(|b| char_index(s, b));
            Ok(Value::Number(pos.map_or(-1.0, |p| p as f64)))
        },
    },
    MethodDesc {
        name: "slice",
        call: |v, args| {
            let chars: Vec<char> = receiver_str(v)?.chars().collect();
            let start = relative_index(args.first(), chars.len(), 0);
            let end = relative_index(args.get(1), chars.len(), chars.len());
            let out: String = if start < end { chars[start..end].iter().collect() } else { String::new() };
            Ok(Value::Str(out))
        },
    },
    MethodDesc {
        // First occurrence only.
        name: "replace",
        call: |v, args| {
            let s = receiver_str(v)?;
            Ok(Value::Str(s.replacen(arg_str(args, 0).as_str(), &arg_str(args, 1), 1)))
        },
    },
];

// ─── Tests ───────────────────────────────────────────────────────────────────
