pub mod error;
pub mod namespaces;
pub mod runtime;
pub mod settings;
pub mod syntax;

pub use error::{Error, ErrorCode, InterpretError, Interrupt, RuntimeError, SignalKind};
pub use namespaces::{build_initial_state, Callbacks, CanvasCommand, DirEntry, EntryKind, Host, State};
pub use runtime::value::{NativeFn, NativeResult, Object, Value};
pub use settings::{CanvasSettings, Config, Resolution, Rgb, Settings};
pub use syntax::ast::Program;
pub use syntax::token::{Token, TokenKind};

use runtime::interpreter::Interpreter;
use syntax::lexer::Lexer;
use syntax::parser::Parser;

// ─── Public API ───────────────────────────────────────────────────────────────

/// Lex and parse source text. Every unrecognised character is reported; the
/// parser stops at its first error.
pub fn compile(source: &str) -> Result<Program, Vec<Error>> {
    log::trace!("lexing {} bytes", source.len());
    let tokens = Lexer::new(source).tokenize()?;
    log::trace!("parsing {} tokens", tokens.len());
    Parser::new(tokens).parse().map_err(|e| vec![e])
}

/// Compile and run `source` against `state`.
///
/// A script that calls `exit()` finishes with `Ok(())`. Compile errors are
/// raised before anything is evaluated; the first runtime error aborts the
/// run and leaves `state` as it was at that point.
pub async fn interpret(source: &str, state: &mut State) -> Result<(), InterpretError> {
    let program = compile(source).map_err(InterpretError::Compile)?;
    interpret_program(&program, state).await
}

/// Run an already compiled program. The same `Program` can be run any
/// number of times, against the same or different states.
pub async fn interpret_program(program: &Program, state: &mut State) -> Result<(), InterpretError> {
    log::debug!("evaluating {} top-level statements", program.statements.len());
    match Interpreter::new(state).run(program).await {
        Ok(()) => Ok(()),
        Err(Interrupt::Exit) => {
            log::debug!("script called exit()");
            Ok(())
        }
        Err(Interrupt::Error(e)) => Err(e.into()),
        Err(Interrupt::Return(_)) => Err(InterpretError::UncaughtSignal(SignalKind::Return)),
        Err(Interrupt::Break) => Err(InterpretError::UncaughtSignal(SignalKind::Break)),
        Err(Interrupt::Continue) => Err(InterpretError::UncaughtSignal(SignalKind::Continue)),
    }
}
