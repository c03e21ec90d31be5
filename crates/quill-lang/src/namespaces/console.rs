//! `console.log`, `warn`, `error` and `clear`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::namespaces::{Host, Namespace, native_object};
use crate::runtime::ops::to_display;
use crate::runtime::value::{NativeFn, Value};

const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

#[derive(Debug)]
struct Circular;

/// `None` for values JSON has no spelling for (`undefined`, functions).
fn to_json(v: &Value, seen: &mut Vec<*const ()>) -> Result<Option<serde_json::Value>, Circular> {
    use serde_json::Value as Json;

    Ok(Some(match v {
        Value::Number(n) => {
            if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                Json::from(*n as i64)
            } else {
                serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number)
            }
        }
        Value::Str(s)  => Json::String(s.clone()),
        Value::Bool(b) => Json::Bool(*b),
        Value::Null    => Json::Null,
        Value::Undefined | Value::Function(_) | Value::Native(_) | Value::Method { .. } => return Ok(None),

        Value::Array(items) => {
            let ptr = Rc::as_ptr(items) as *const ();
            if seen.contains(&ptr) { return Err(Circular); }
            seen.push(ptr);
            let mut out = Vec::new();
            for item in items.borrow().iter() {
                out.push(to_json(item, seen)?.unwrap_or(Json::Null));
            }
            seen.pop();
            Json::Array(out)
        }
        Value::Object(obj) => {
            let ptr = Rc::as_ptr(obj) as *const ();
            if seen.contains(&ptr) { return Err(Circular); }
            seen.push(ptr);
            let mut out = serde_json::Map::new();
            for (k, item) in obj.borrow().iter() {
                if let Some(j) = to_json(item, seen)? {
                    out.insert(k.to_string(), j);
                }
            }
            seen.pop();
            Json::Object(out)
        }
    }))
}

/// Arrays and objects print as indented JSON; nullish values print empty.
pub fn format_arg(v: &Value) -> String {
    match v {
        Value::Array(_) | Value::Object(_) => match to_json(v, &mut Vec::new()) {
            Ok(Some(json)) => serde_json::to_string_pretty(&json).unwrap_or_default(),
            Ok(None) => String::new(),
            Err(Circular) => "[Circular Object]".to_string(),
        },
        Value::Null | Value::Undefined => String::new(),
        other => to_display(other),
    }
}

pub fn format_args(args: &[Value]) -> String {
    args.iter().map(format_arg).collect::<Vec<_>>().join(" ")
}

pub struct ConsoleNamespace;

impl Namespace for ConsoleNamespace {
    fn name(&self) -> &'static str { "console" }

    fn install(&self, vars: &mut HashMap<String, Value>, host: &Rc<dyn Host>) {
        let (h_log, h_warn, h_err, h_clear) = (host.clone(), host.clone(), host.clone(), host.clone());
        let console = native_object(vec![
            NativeFn::sync("log", move |args| {
                h_log.output(&format!("{}\n", format_args(args)));
                Ok(Value::Undefined)
            }),
            NativeFn::sync("warn", move |args| {
                h_warn.output(&format!("{YELLOW}{}{RESET}\n", format_args(args)));
                Ok(Value::Undefined)
            }),
            NativeFn::sync("error", move |args| {
                h_err.output(&format!("{RED}{}{RESET}\n", format_args(args)));
                Ok(Value::Undefined)
            }),
            NativeFn::sync("clear", move |_args| {
                h_clear.clear_console();
                Ok(Value::Undefined)
            }),
        ]);
        vars.insert("console".into(), console);
    }
}
