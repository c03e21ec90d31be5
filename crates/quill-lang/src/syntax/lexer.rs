use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind, keyword_or_ident};

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self::at(source, 1, 1)
    }

    /// Lex a fragment that starts at `line:column` of some larger source,
    /// so positions in diagnostics point back into the original text.
    pub fn at(source: &str, line: usize, column: usize) -> Self {
        Self { source: source.chars().collect(), pos: 0, line, column }
    }

    /// Every stream ends with exactly one `Eof`. All unrecognised characters
    /// are reported, not just the first.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<Error>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.line, self.column));
                break;
            }

            match self.next_token() {
                Ok(Some(tok)) => tokens.push(tok),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() { Ok(tokens) } else { Err(errors) }
    }

    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        let line = self.line;
        let col = self.column;
        let ch = self.advance();

        let kind = match ch {
            // comment runs to end of line or end of input
            '#' => { self.skip_line(); return Ok(None); }

            '"' | '\'' => TokenKind::StringLit(self.read_string(ch)),
            '0'..='9' => TokenKind::Number(self.read_number(ch)),
            c if c.is_ascii_alphabetic() || c == '_' => keyword_or_ident(self.read_ident(ch)),

            '+' => {
                if self.peek() == '+' { self.advance(); TokenKind::PlusPlus }
                else if self.peek() == '=' { self.advance(); TokenKind::PlusEq }
                else { TokenKind::Plus }
            }
            '-' => {
                if self.peek() == '-' { self.advance(); TokenKind::MinusMinus }
                else if self.peek() == '=' { self.advance(); TokenKind::MinusEq }
                else { TokenKind::Minus }
            }
            '*' => {
                if self.peek() == '=' { self.advance(); TokenKind::StarEq }
                else { TokenKind::Star }
            }
            '/' => {
                if self.peek() == '=' { self.advance(); TokenKind::SlashEq }
                else { TokenKind::Slash }
            }
            '=' => {
                if self.peek() == '=' { self.advance(); TokenKind::EqEq }
                else { TokenKind::Eq }
            }
            '<' => {
                if self.peek() == '=' { self.advance(); TokenKind::LtEq }
                else { TokenKind::Lt }
            }
            '>' => {
                if self.peek() == '=' { self.advance(); TokenKind::GtEq }
                else { TokenKind::Gt }
            }
            '!' if self.peek() == '=' => { self.advance(); TokenKind::BangEq }
            '|' if self.peek() == '|' => { self.advance(); TokenKind::PipePipe }
            '&' if self.peek() == '&' => { self.advance(); TokenKind::AmpAmp }

            '$' => TokenKind::Dollar,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,

            other => {
                return Err(Error::new(ErrorCode::L001, line, col,
                    format!("unexpected character `{other}`")));
            }
        };

        Ok(Some(Token::new(kind, line, col)))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> char {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == '\n' { self.line += 1; self.column = 1; }
        else { self.column += 1; }
        ch
    }

    fn peek(&self) -> char {
        if self.is_at_end() { '\0' } else { self.source[self.pos] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' { self.advance(); }
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    /// Reads up to the matching quote. A string still open at end of input
    /// ends there without complaint.
    fn read_string(&mut self, quote: char) -> String {
        let mut s = String::new();
        while !self.is_at_end() && self.peek() != quote {
            let ch = self.advance();
            if ch != '\\' {
                s.push(ch);
                continue;
            }
            if self.is_at_end() { break; }
            match self.advance() {
                'n'   => s.push('\n'),
                't'   => s.push('\t'),
                'r'   => s.push('\r'),
                other => s.push(other), // covers \\ \' \" and any unknown escape
            }
        }
        if !self.is_at_end() { self.advance(); } // closing quote
        s
    }

    /// Consumes the whole run of digits and dots, then keeps the longest
    /// prefix that reads as a number: `1.2.3` is 1.2.
    fn read_number(&mut self, first: char) -> f64 {
        let mut run = String::new();
        run.push(first);
        while !self.is_at_end() && (self.peek().is_ascii_digit() || self.peek() == '.') {
            run.push(self.advance());
        }
        number_prefix(&run)
    }

    fn read_ident(&mut self, first: char) -> String {
        let mut s = String::new();
        s.push(first);
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
            s.push(self.advance());
        }
        s
    }
}

fn number_prefix(run: &str) -> f64 {
    let int_len = run.find(|c: char| !c.is_ascii_digit()).unwrap_or(run.len());
    let mut end = int_len;
    if run[int_len..].starts_with('.') {
        let frac = run[int_len + 1..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(run.len() - int_len - 1);
        if frac > 0 { end = int_len + 1 + frac; }
    }
    run[..end].parse().unwrap_or(f64::NAN)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
