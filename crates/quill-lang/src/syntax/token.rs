#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    StringLit(String),
    Ident(String),

    // Keywords
    If,
    Else,
    Elseif,
    While,
    For,
    End,
    Null,
    Undefined,
    True,
    False,
    Function,
    Return,
    Break,
    Continue,
    Not,
    And,
    Or,

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    PlusEq,     // +=
    MinusEq,    // -=
    StarEq,     // *=
    SlashEq,    // /=
    PlusPlus,   // ++
    MinusMinus, // --
    Eq,         // =
    EqEq,       // ==
    BangEq,     // !=
    Bang,       // ! (never produced by the lexer)
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=
    PipePipe,   // ||
    AmpAmp,     // &&

    // Punctuation
    Dollar,     // $
    Colon,      // :
    Comma,      // ,
    Semicolon,  // ;
    Dot,        // .
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]

    Eof,
}

impl TokenKind {
    /// Source spelling used in diagnostics.
    pub fn describe(&self) -> String {
        let s = match self {
            Self::Number(n)    => return format!("number `{n}`"),
            Self::StringLit(s) => return format!("string {s:?}"),
            Self::Ident(s)     => return format!("identifier `{s}`"),
            Self::Eof          => return "end of input".to_string(),
            Self::If => "if", Self::Else => "else", Self::Elseif => "elseif",
            Self::While => "while", Self::For => "for", Self::End => "end",
            Self::Null => "null", Self::Undefined => "undefined",
            Self::True => "true", Self::False => "false",
            Self::Function => "function", Self::Return => "return",
            Self::Break => "break", Self::Continue => "continue",
            Self::Not => "not", Self::And => "and", Self::Or => "or",
            Self::Plus => "+", Self::Minus => "-", Self::Star => "*", Self::Slash => "/",
            Self::PlusEq => "+=", Self::MinusEq => "-=", Self::StarEq => "*=", Self::SlashEq => "/=",
            Self::PlusPlus => "++", Self::MinusMinus => "--",
            Self::Eq => "=", Self::EqEq => "==", Self::BangEq => "!=", Self::Bang => "!",
            Self::Lt => "<", Self::LtEq => "<=", Self::Gt => ">", Self::GtEq => ">=",
            Self::PipePipe => "||", Self::AmpAmp => "&&",
            Self::Dollar => "$", Self::Colon => ":", Self::Comma => ",", Self::Semicolon => ";",
            Self::Dot => ".", Self::LParen => "(", Self::RParen => ")",
            Self::LBrace => "{", Self::RBrace => "}", Self::LBracket => "[", Self::RBracket => "]",
        };
        format!("`{s}`")
    }
}

/// Maps an identifier string to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "if"        => TokenKind::If,
        "else"      => TokenKind::Else,
        "elseif"    => TokenKind::Elseif,
        "while"     => TokenKind::While,
        "for"       => TokenKind::For,
        "end"       => TokenKind::End,
        "null"      => TokenKind::Null,
        "undefined" => TokenKind::Undefined,
        "true"      => TokenKind::True,
        "false"     => TokenKind::False,
        "function"  => TokenKind::Function,
        "return"    => TokenKind::Return,
        "break"     => TokenKind::Break,
        "continue"  => TokenKind::Continue,
        "not"       => TokenKind::Not,
        "and"       => TokenKind::And,
        "or"        => TokenKind::Or,
        _           => TokenKind::Ident(s),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
