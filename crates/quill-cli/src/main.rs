use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use quill_lang::{build_initial_state, compile, interpret_program, Callbacks, InterpretError};

mod config;
mod host;

use host::TerminalHost;

/// Run a quill script in the terminal.
#[derive(Debug, Parser)]
#[command(name = "quill", version)]
struct Args {
    /// Script to run.
    script: PathBuf,

    /// Settings file (JSON). Defaults to `<config dir>/quill/settings.json`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Expose the `fs` namespace.
    #[arg(long)]
    fs: bool,

    /// Expose the `shell` namespace.
    #[arg(long)]
    shell: bool,

    /// Print canvas commands as JSON lines.
    #[arg(long)]
    canvas: bool,

    /// Debug logging unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut settings = config::load(args.config.as_deref())?;
    settings.enable_filesystem |= args.fs;
    settings.enable_shell |= args.shell;

    let source = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading {}", args.script.display()))?;

    let program = match compile(&source) {
        Ok(p) => p,
        Err(errors) => {
            for e in &errors {
                let phase = if e.code.is_lex() { "lex" } else { "parse" };
                eprintln!("{}: {phase} error {e}", args.script.display());
            }
            bail!("{} failed to compile ({} errors)", args.script.display(), errors.len());
        }
    };

    let host = Rc::new(TerminalHost::new(args.canvas));
    let mut state = build_initial_state(Callbacks::new(host.clone()), &settings);

    let result = interpret_program(&program, &mut state).await;
    log::debug!("{} canvas commands, {} variables", host.canvas_commands(), state.variables.len());

    match result {
        Ok(()) => Ok(()),
        Err(InterpretError::UncaughtSignal(signal)) => {
            bail!("internal error: `{signal}` escaped its handler")
        }
        Err(e) => Err(e).with_context(|| format!("running {}", args.script.display())),
    }
}
