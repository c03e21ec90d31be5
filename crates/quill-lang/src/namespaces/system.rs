//! Process-level bindings: `exit`, `wait`, and the opt-in `fs` and `shell`
//! namespaces. The actual I/O is delegated to the `Host`.

use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;

use crate::error::{Interrupt, RuntimeError};
use crate::namespaces::{DirEntry, Host, Namespace, arg, native_object};
use crate::runtime::ops::{to_display, to_number};
use crate::runtime::value::{NativeFn, Object, Value};
use crate::settings::Settings;

fn io_error(native: &str, e: std::io::Error) -> Interrupt {
    Interrupt::Error(RuntimeError::native(format!("{native}: {e}")))
}

pub struct SystemNamespace;

impl Namespace for SystemNamespace {
    fn name(&self) -> &'static str { "system" }

    fn install(&self, vars: &mut HashMap<String, Value>, host: &Rc<dyn Host>) {
        vars.insert("exit".into(), Value::Native(NativeFn::sync("exit", |_args| Err(Interrupt::Exit))));

        let h = host.clone();
        vars.insert("wait".into(), Value::Native(NativeFn::new("wait", move |args| {
            let h = h.clone();
            let ms = to_number(arg(&args, 0));
            async move {
                h.wait(ms).await;
                Ok(Value::Undefined)
            }.boxed_local()
        })));
    }
}

/// `{ entry, type }` with `type` either `"FILE"` or `"DIRECTORY"`.
fn dir_entry(d: DirEntry) -> Value {
    let obj: Object = [
        ("entry", Value::Str(d.entry)),
        ("type", Value::str(d.kind.as_str())),
    ].into_iter().collect();
    Value::object(obj)
}

pub struct FsNamespace;

impl Namespace for FsNamespace {
    fn name(&self) -> &'static str { "fs" }

    fn enabled(&self, settings: &Settings) -> bool { settings.enable_filesystem }

    fn install(&self, vars: &mut HashMap<String, Value>, host: &Rc<dyn Host>) {
        let (h_read, h_write, h_dir) = (host.clone(), host.clone(), host.clone());
        let fs = native_object(vec![
            NativeFn::new("readFileSync", move |args| {
                let h = h_read.clone();
                let path = to_display(arg(&args, 0));
                async move {
                    h.read_file(path).await
                        .map(Value::Str)
                        .map_err(|e| io_error("readFileSync", e))
                }.boxed_local()
            }),
            NativeFn::new("writeFileSync", move |args| {
                let h = h_write.clone();
                let path = to_display(arg(&args, 0));
                let data = to_display(arg(&args, 1));
                async move {
                    h.write_file(path, data).await
                        .map(|()| Value::Undefined)
                        .map_err(|e| io_error("writeFileSync", e))
                }.boxed_local()
            }),
            NativeFn::new("readdirSync", move |args| {
                let h = h_dir.clone();
                let path = to_display(arg(&args, 0));
                async move {
                    h.read_dir(path).await
                        .map(|entries| Value::array(entries.into_iter().map(dir_entry).collect()))
                        .map_err(|e| io_error("readdirSync", e))
                }.boxed_local()
            }),
        ]);
        vars.insert("fs".into(), fs);
    }
}

pub struct ShellNamespace;

impl Namespace for ShellNamespace {
    fn name(&self) -> &'static str { "shell" }

    fn enabled(&self, settings: &Settings) -> bool { settings.enable_shell }

    fn install(&self, vars: &mut HashMap<String, Value>, host: &Rc<dyn Host>) {
        let h = host.clone();
        let shell = native_object(vec![
            NativeFn::new("execSync", move |args| {
                let h = h.clone();
                let command = to_display(arg(&args, 0));
                async move {
                    h.exec(command).await
                        .map(Value::Str)
                        .map_err(|e| io_error("execSync", e))
                }.boxed_local()
            }),
        ]);
        vars.insert("shell".into(), shell);
    }
}
