use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::runtime::value::{NativeFn, NativeResult, Object, Value};
use crate::settings::{CanvasSettings, Settings};

pub mod canvas;
pub mod console;
pub mod math;
pub mod system;

pub use canvas::CanvasCommand;

// ─── Host seam ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "FILE",
            Self::Directory => "DIRECTORY",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirEntry {
    pub entry: String,
    pub kind: EntryKind,
}

fn unsupported<T: 'static>(what: &str) -> LocalBoxFuture<'static, io::Result<T>> {
    let err = io::Error::new(io::ErrorKind::Unsupported, format!("{what} is not supported by this host"));
    future::ready(Err(err)).boxed_local()
}

/// Everything the runtime asks of its embedder. Only `output` and `canvas`
/// are required; the I/O methods back the optional `fs` / `shell` bindings
/// and fail by default.
pub trait Host {
    /// A chunk of console text, newline included.
    fn output(&self, chunk: &str);

    fn canvas(&self, command: CanvasCommand);

    fn clear_console(&self) {}

    fn wait(&self, _ms: f64) -> LocalBoxFuture<'_, ()> {
        future::ready(()).boxed_local()
    }

    fn read_file(&self, _path: String) -> LocalBoxFuture<'_, io::Result<String>> {
        unsupported("reading files")
    }

    fn write_file(&self, _path: String, _contents: String) -> LocalBoxFuture<'_, io::Result<()>> {
        unsupported("writing files")
    }

    fn read_dir(&self, _path: String) -> LocalBoxFuture<'_, io::Result<Vec<DirEntry>>> {
        unsupported("listing directories")
    }

    /// Runs `command` and yields its standard output.
    fn exec(&self, _command: String) -> LocalBoxFuture<'_, io::Result<String>> {
        unsupported("running shell commands")
    }
}

/// Host plus the extra script-visible functions it wants to expose.
pub struct Callbacks {
    pub host: Rc<dyn Host>,
    /// Stateful natives, installed under their own names.
    pub custom_functions: Vec<NativeFn>,
}

impl Callbacks {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host, custom_functions: Vec::new() }
    }

    /// Registers `name` as a global that receives the live `State` followed
    /// by the script's arguments.
    pub fn with_function<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut State, &[Value]) -> NativeResult + 'static,
    {
        self.custom_functions.push(NativeFn::stateful(name, f));
        self
    }

    /// Like `with_function`, but the script waits for the returned future.
    /// Anything that needs the state has to happen before the future is
    /// built.
    pub fn with_async_function<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut State, &[Value]) -> LocalBoxFuture<'static, NativeResult> + 'static,
    {
        self.custom_functions.push(NativeFn::stateful_async(name, f));
        self
    }
}

// ─── State ───────────────────────────────────────────────────────────────────

/// The single flat namespace shared by top-level code and every function
/// body, plus the host records scripts can see.
#[derive(Debug)]
pub struct State {
    pub variables: HashMap<String, Value>,
    /// Same object as the `config` variable.
    pub config: Rc<RefCell<Object>>,
    pub canvas: CanvasSettings,
    /// Script function calls nested deeper than this fail with a runtime
    /// error. Every level costs native stack while the run is polled.
    pub max_call_depth: usize,
}

impl State {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }
}

// ─── Namespaces ──────────────────────────────────────────────────────────────

/// A group of host bindings installed into a fresh `State`.
pub trait Namespace {
    fn name(&self) -> &'static str;

    fn enabled(&self, _settings: &Settings) -> bool {
        true
    }

    fn install(&self, vars: &mut HashMap<String, Value>, host: &Rc<dyn Host>);
}

pub struct NamespaceRegistry {
    providers: Vec<Box<dyn Namespace>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self { Self { providers: Vec::new() } }

    pub fn register(&mut self, p: Box<dyn Namespace>) { self.providers.push(p); }

    pub fn standard() -> Self {
        let mut r = Self::new();
        r.register(Box::new(canvas::CanvasNamespace));
        r.register(Box::new(math::MathNamespace));
        r.register(Box::new(console::ConsoleNamespace));
        r.register(Box::new(system::SystemNamespace));
        r.register(Box::new(system::FsNamespace));
        r.register(Box::new(system::ShellNamespace));
        r
    }

    pub fn install_all(&self, vars: &mut HashMap<String, Value>, host: &Rc<dyn Host>, settings: &Settings) {
        for p in self.providers.iter().filter(|p| p.enabled(settings)) {
            log::trace!("installing `{}` bindings", p.name());
            p.install(vars, host);
        }
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self { Self::standard() }
}

/// Fresh state for one script run: `config`, the standard bindings allowed
/// by `settings`, then the host's custom functions (which may shadow them).
pub fn build_initial_state(callbacks: Callbacks, settings: &Settings) -> State {
    let config = Rc::new(RefCell::new(settings.config.to_object()));
    let mut state = State {
        variables: HashMap::new(),
        config: config.clone(),
        canvas: settings.canvas.clone(),
        max_call_depth: settings.max_call_depth,
    };
    state.set("config", Value::Object(config));

    NamespaceRegistry::standard().install_all(&mut state.variables, &callbacks.host, settings);

    for native in callbacks.custom_functions {
        state.set(native.name.to_string(), Value::Native(native));
    }
    state
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

/// Object value whose properties are the given natives, in order.
pub(crate) fn native_object(fns: Vec<NativeFn>) -> Value {
    let obj: Object = fns.into_iter()
        .map(|f| (f.name.to_string(), Value::Native(f)))
        .collect();
    Value::object(obj)
}

pub(crate) fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&Value::Undefined)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
