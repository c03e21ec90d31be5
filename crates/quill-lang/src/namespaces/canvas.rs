//! `rect`, `pixel` and `clear`: the drawing surface bindings.

use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::namespaces::{Host, Namespace, arg};
use crate::runtime::ops::to_number;
use crate::runtime::value::{NativeFn, Value};
use crate::settings::Rgb;

/// One drawing instruction handed to the host, serialized as
/// `{ "command": "rect", "x": .., "color": { "r": .. } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum CanvasCommand {
    Rect { x: f64, y: f64, width: f64, height: f64, color: Rgb },
    Pixel { x: f64, y: f64, color: Rgb },
    /// Fill with the configured background.
    Clear { color: Rgb },
}

fn num(args: &[Value], i: usize) -> f64 {
    to_number(arg(args, i))
}

fn color_from(args: &[Value], first: usize) -> Rgb {
    Rgb::new(num(args, first), num(args, first + 1), num(args, first + 2))
}

pub struct CanvasNamespace;

impl Namespace for CanvasNamespace {
    fn name(&self) -> &'static str { "canvas" }

    fn install(&self, vars: &mut HashMap<String, Value>, host: &Rc<dyn Host>) {
        let h = host.clone();
        vars.insert("rect".into(), Value::Native(NativeFn::sync("rect", move |args| {
            h.canvas(CanvasCommand::Rect {
                x: num(args, 0),
                y: num(args, 1),
                width: num(args, 2),
                height: num(args, 3),
                color: color_from(args, 4),
            });
            Ok(Value::Undefined)
        })));

        let h = host.clone();
        vars.insert("pixel".into(), Value::Native(NativeFn::sync("pixel", move |args| {
            h.canvas(CanvasCommand::Pixel { x: num(args, 0), y: num(args, 1), color: color_from(args, 2) });
            Ok(Value::Undefined)
        })));

        // reads the background at call time, not install time
        let h = host.clone();
        vars.insert("clear".into(), Value::Native(NativeFn::stateful("clear", move |state, _args| {
            h.canvas(CanvasCommand::Clear { color: state.canvas.background });
            Ok(Value::Undefined)
        })));
    }
}
