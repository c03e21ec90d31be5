use std::collections::HashMap;
use std::rc::Rc;

use crate::namespaces::{Host, Namespace, arg, native_object};
use crate::runtime::ops::to_number;
use crate::runtime::value::{NativeFn, Value};

fn unary(name: &str, f: fn(f64) -> f64) -> NativeFn {
    NativeFn::sync(name, move |args| Ok(Value::Number(f(to_number(arg(args, 0))))))
}

/// Rounds half-way cases toward positive infinity (`-2.5` becomes `-2`).
fn round_half_up(x: f64) -> f64 {
    let r = x.round();
    // `round` sends negative halves away from zero
    if x - r == 0.5 { r + 1.0 } else { r }
}

pub struct MathNamespace;

impl Namespace for MathNamespace {
    fn name(&self) -> &'static str { "math" }

    fn install(&self, vars: &mut HashMap<String, Value>, _host: &Rc<dyn Host>) {
        let math = native_object(vec![
            NativeFn::sync("random", |_args| Ok(Value::Number(rand::random::<f64>()))),
            unary("round", round_half_up),
            unary("floor", f64::floor),
            unary("ceil", f64::ceil),
            unary("abs", f64::abs),
            unary("sqrt", f64::sqrt),
            NativeFn::sync("pow", |args| {
                Ok(Value::Number(to_number(arg(args, 0)).powf(to_number(arg(args, 1)))))
            }),
        ]);
        vars.insert("math".into(), math);
    }
}
