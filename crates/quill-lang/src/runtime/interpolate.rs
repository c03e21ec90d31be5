//! `${expr}` markers inside string literals.
//!
//! A marker runs from `${` to the first `}` on the same line. A `${` with
//! no closing brace before the next newline stays literal text. The inner
//! text is lexed and parsed on its own each time the literal is evaluated.
//! Only the leading expression counts; tokens after it are dropped.

use crate::error::RuntimeError;
use crate::syntax::ast::{Expr, Span};
use crate::syntax::lexer::Lexer;
use crate::syntax::parser::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    /// Source between the braces.
    Expr(&'a str),
}

pub fn segments(s: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut text_start = 0;
    let mut search = 0;

    while let Some(rel) = s[search..].find("${") {
        let open = search + rel;
        let inner_start = open + 2;
        let close = s[inner_start..]
            .find(['}', '\n'])
            .map(|i| inner_start + i)
            .filter(|&i| s.as_bytes()[i] == b'}');

        match close {
            Some(close) => {
                if open > text_start {
                    out.push(Segment::Text(&s[text_start..open]));
                }
                out.push(Segment::Expr(&s[inner_start..close]));
                text_start = close + 1;
                search = close + 1;
            }
            None => search = open + 1,
        }
    }

    if text_start < s.len() {
        out.push(Segment::Text(&s[text_start..]));
    }
    out
}

/// Lex and parse one marker. Diagnostics point at the enclosing literal.
pub fn compile(source: &str, at: Span) -> Result<Expr, RuntimeError> {
    let fail = |msg: String| RuntimeError::new(at.line, format!("in `${{{source}}}`: {msg}"));

    let tokens = Lexer::at(source, at.line, at.column)
        .tokenize()
        .map_err(|errs| fail(errs.iter().map(|e| e.message.clone()).collect::<Vec<_>>().join("; ")))?;

    Parser::interpolation(tokens)
        .parse_expression()
        .map_err(|e| fail(e.message))
}
