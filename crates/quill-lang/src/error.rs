use crate::runtime::value::Value;

/// Error codes prefixed by phase: L = lexer, P = parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character

    // Parser
    P001, // unexpected token
    P002, // missing expected token
    P003, // unexpected end of input
    P004, // invalid assignment target
    P005, // `break` outside of a loop
    P006, // `continue` outside of a loop
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
            Self::P004 => "P004",
            Self::P005 => "P005",
            Self::P006 => "P006",
        }
    }

    pub fn is_lex(&self) -> bool { matches!(self, Self::L001) }

    pub fn is_parse(&self) -> bool { !self.is_lex() }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compile-time diagnostic. Lexer and parser failures share this shape and
/// are told apart by their code.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{code}] {line}:{column}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

// ─────────────────────────────────────────────────────────────────────────────

/// Raised while evaluating. A line of 0 means "not yet attributed"; the
/// interpreter fills it in from the call site when a native fails.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[runtime] line {line}: {message}")]
pub struct RuntimeError {
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }

    /// Error raised from host code that has no source position.
    pub fn native(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }
}

// ─── Control flow ────────────────────────────────────────────────────────────

/// Everything that can unwind an evaluation. Only `Error` is a failure; the
/// rest are signals caught at their designated boundary.
#[derive(Debug, Clone)]
pub enum Interrupt {
    /// Caught by the function-call wrapper.
    Return(Value),
    /// Caught by the nearest `while` / `for`.
    Break,
    Continue,
    /// Caught only by the top-level `interpret`.
    Exit,
    Error(RuntimeError),
}

impl From<RuntimeError> for Interrupt {
    fn from(e: RuntimeError) -> Self { Self::Error(e) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Return,
    Break,
    Continue,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Return   => "return",
            Self::Break    => "break",
            Self::Continue => "continue",
        })
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, thiserror::Error)]
pub enum InterpretError {
    /// Lexing or parsing failed; nothing was evaluated.
    #[error("{}", join_diagnostics(.0))]
    Compile(Vec<Error>),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// A control signal escaped its handler. This is an interpreter defect
    /// (or a `return`/`break` placed where the parser could not see it),
    /// never an ordinary script error.
    #[error("uncaught `{0}` signal reached the top level")]
    UncaughtSignal(SignalKind),
}

fn join_diagnostics(errors: &[Error]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n")
}
