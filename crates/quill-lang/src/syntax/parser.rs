use std::rc::Rc;

use crate::syntax::ast::*;
use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind};

/// `Interpolation` is used for the text inside `${...}`: a bare identifier is
/// taken as a variable reference before anything else is considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    #[default]
    Program,
    Interpolation,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    mode: ParseMode,
    /// Number of `while`/`for` bodies currently open. Function bodies do not
    /// reset it.
    loop_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, mode: ParseMode::Program, loop_depth: 0 }
    }

    pub fn interpolation(tokens: Vec<Token>) -> Self {
        Self { mode: ParseMode::Interpolation, ..Self::new(tokens) }
    }

    /// Stops at the first grammar violation.
    pub fn parse(mut self) -> Result<Program, Error> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_stmt()?);
        }
        Ok(Program { statements })
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_stmt(&mut self) -> Result<Stmt, Error> {
        match self.peek_kind() {
            TokenKind::If       => self.parse_if(),
            TokenKind::While    => self.parse_while(),
            TokenKind::For      => self.parse_for(),
            TokenKind::Function => self.parse_function(),
            TokenKind::Return   => self.parse_return(),

            TokenKind::Break => {
                let span = self.span();
                if self.loop_depth == 0 {
                    return Err(Error::new(ErrorCode::P005, span.line, span.column,
                        "cannot use `break` outside of a loop"));
                }
                self.advance();
                self.consume_semicolon();
                Ok(Stmt::Break(span))
            }
            TokenKind::Continue => {
                let span = self.span();
                if self.loop_depth == 0 {
                    return Err(Error::new(ErrorCode::P006, span.line, span.column,
                        "cannot use `continue` outside of a loop"));
                }
                self.advance();
                self.consume_semicolon();
                Ok(Stmt::Continue(span))
            }

            _ => {
                let expr = self.parse_expression()?;
                self.consume_semicolon();
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// Statements up to (not including) any of `terminators` or end of input.
    fn parse_body(&mut self, terminators: &[TokenKind]) -> Result<Vec<Stmt>, Error> {
        let mut stmts = Vec::new();
        while !self.is_at_end() && !terminators.contains(&self.peek().kind) {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_loop_body(&mut self) -> Result<Vec<Stmt>, Error> {
        self.loop_depth += 1;
        let body = self.parse_body(&[TokenKind::End]);
        self.loop_depth -= 1;
        body
    }

    /// `( expr ) ;?`
    fn parse_condition(&mut self) -> Result<Expr, Error> {
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        self.consume_semicolon();
        Ok(condition)
    }

    fn parse_end(&mut self) -> Result<(), Error> {
        self.expect(TokenKind::End)?;
        self.consume_semicolon();
        Ok(())
    }

    fn parse_if(&mut self) -> Result<Stmt, Error> {
        const BRANCH_END: [TokenKind; 3] = [TokenKind::Elseif, TokenKind::Else, TokenKind::End];

        let span = self.span();
        self.expect(TokenKind::If)?;
        let condition = self.parse_condition()?;
        let then_block = self.parse_body(&BRANCH_END)?;

        let mut elseifs = Vec::new();
        while self.matches(TokenKind::Elseif) {
            let condition = self.parse_condition()?;
            let body = self.parse_body(&BRANCH_END)?;
            elseifs.push(ElseIf { condition, body });
        }

        let else_block = if self.matches(TokenKind::Else) {
            self.consume_semicolon();
            Some(self.parse_body(&[TokenKind::End])?)
        } else {
            None
        };

        self.parse_end()?;
        Ok(Stmt::If(IfStmt { condition, then_block, elseifs, else_block, span }))
    }

    fn parse_while(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::While)?;
        let condition = self.parse_condition()?;
        let body = self.parse_loop_body()?;
        self.parse_end()?;
        Ok(Stmt::While(WhileStmt { condition, body, span }))
    }

    /// `for (ident, count); body end`
    fn parse_for(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;
        let var_name = self.expect_ident()?;
        self.expect(TokenKind::Comma)?;
        let count = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        self.consume_semicolon();
        let body = self.parse_loop_body()?;
        self.parse_end()?;
        Ok(Stmt::For(ForStmt { var_name, count, body, span }))
    }

    fn parse_function(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Function)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            params.push(self.expect_ident()?);
            while self.matches(TokenKind::Comma) {
                params.push(self.expect_ident()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        self.consume_semicolon();
        let body = self.parse_body(&[TokenKind::End])?;
        self.parse_end()?;
        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body, span })))
    }

    fn parse_return(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Return)?;
        let value = match self.peek_kind() {
            TokenKind::Semicolon | TokenKind::End | TokenKind::Else
            | TokenKind::Elseif | TokenKind::Eof => None,
            _ => Some(self.parse_expression()?),
        };
        self.consume_semicolon();
        Ok(Stmt::Return(value, span))
    }

    // ─── Expressions (precedence climbing) ───────────────────────────────────

    pub fn parse_expression(&mut self) -> Result<Expr, Error> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, Error> {
        let left = self.parse_or()?;
        let op = match self.peek_kind() {
            TokenKind::Eq      => None,
            TokenKind::PlusEq  => Some(BinOp::Add),
            TokenKind::MinusEq => Some(BinOp::Sub),
            TokenKind::StarEq  => Some(BinOp::Mul),
            TokenKind::SlashEq => Some(BinOp::Div),
            _ => return Ok(left),
        };
        let span = left.span();
        self.advance();
        let value = Box::new(self.parse_assignment()?);

        let target = match left {
            Expr::Variable(name, _) => AssignTarget::Variable(name),
            Expr::Member { object, property, .. } => AssignTarget::Member { object, property },
            Expr::Index { object, index, .. } => AssignTarget::Index { object, index },
            other => {
                let at = other.span();
                return Err(Error::new(ErrorCode::P004, at.line, at.column, "invalid assignment target"));
            }
        };

        Ok(match op {
            None     => Expr::Assign { target, value, span },
            Some(op) => Expr::CompoundAssign { target, op, value, span },
        })
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_and()?;
        while matches!(self.peek_kind(), TokenKind::PipePipe | TokenKind::Or) {
            let span = left.span();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary { left: Box::new(left), op: BinOp::Or, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_equality()?;
        while matches!(self.peek_kind(), TokenKind::AmpAmp | TokenKind::And) {
            let span = left.span();
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::Binary { left: Box::new(left), op: BinOp::And, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq   => BinOp::Eq,
                TokenKind::BangEq => BinOp::NotEq,
                _ => break,
            };
            let span = left.span();
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_addition()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt   => BinOp::Lt,
                TokenKind::LtEq => BinOp::LtEq,
                TokenKind::Gt   => BinOp::Gt,
                TokenKind::GtEq => BinOp::GtEq,
                _ => break,
            };
            let span = left.span();
            self.advance();
            let right = self.parse_addition()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_addition(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_multiplication()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus  => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let span = left.span();
            self.advance();
            let right = self.parse_multiplication()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_multiplication(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star  => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            let span = left.span();
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        let op = match self.peek_kind() {
            TokenKind::Minus             => UnOp::Neg,
            TokenKind::Bang | TokenKind::Not => UnOp::Not,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary { op, operand: Box::new(operand), span })
    }

    /// `.prop`, `[index]` and `(args)` applied left to right, then an
    /// optional trailing `++` / `--`.
    fn parse_postfix(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    let span = expr.span();
                    self.advance();
                    let property = self.expect_ident()?;
                    expr = Expr::Member { object: Box::new(expr), property, span };
                }
                TokenKind::LBracket => {
                    let span = expr.span();
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Index { object: Box::new(expr), index: Box::new(index), span };
                }
                TokenKind::LParen => {
                    let span = expr.span();
                    self.advance();
                    let args = self.parse_arg_list()?;
                    self.expect(TokenKind::RParen)?;
                    expr = Expr::Call { callee: Box::new(expr), args, span };
                }
                _ => break,
            }
        }

        let op = match self.peek_kind() {
            TokenKind::PlusPlus   => UpdateOp::Increment,
            TokenKind::MinusMinus => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        match expr {
            Expr::Variable(name, span) => {
                self.advance();
                Ok(Expr::Update { op, name, span })
            }
            other => {
                let at = self.span();
                Err(Error::new(ErrorCode::P004, at.line, at.column, format!(
                    "invalid update target for {}, expected a variable (found at {}:{})",
                    self.peek_kind().describe(), other.span().line, other.span().column
                )))
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let tok = self.peek().clone();
        let span = Span::new(tok.line, tok.column);

        if self.mode == ParseMode::Interpolation {
            if let TokenKind::Ident(name) = tok.kind {
                self.advance();
                return Ok(Expr::Variable(name, span));
            }
        }

        match tok.kind {
            TokenKind::Number(n)    => { self.advance(); Ok(Expr::Literal(Literal::Number(n), span)) }
            TokenKind::StringLit(s) => { self.advance(); Ok(Expr::Literal(Literal::Str(s), span)) }
            TokenKind::Null      => { self.advance(); Ok(Expr::Literal(Literal::Null, span)) }
            TokenKind::Undefined => { self.advance(); Ok(Expr::Literal(Literal::Undefined, span)) }
            TokenKind::True      => { self.advance(); Ok(Expr::Literal(Literal::Bool(true), span)) }
            TokenKind::False     => { self.advance(); Ok(Expr::Literal(Literal::Bool(false), span)) }

            // `$name` shorthand for a variable reference
            TokenKind::Dollar => {
                self.advance();
                let name = self.expect_ident()?;
                Ok(Expr::Variable(name, span))
            }

            TokenKind::Ident(name) => { self.advance(); Ok(Expr::Variable(name, span)) }

            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace   => self.parse_object_literal(),

            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }

            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        self.expect(TokenKind::LBracket)?;
        let mut elements = Vec::new();
        if !self.check(TokenKind::RBracket) {
            elements.push(self.parse_expression()?);
            while self.matches(TokenKind::Comma) {
                elements.push(self.parse_expression()?);
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::Array(elements, span))
    }

    fn parse_object_literal(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        self.expect(TokenKind::LBrace)?;
        let mut properties: Vec<(String, Expr)> = Vec::new();
        if !self.check(TokenKind::RBrace) {
            loop {
                let key = match self.peek_kind() {
                    TokenKind::StringLit(s) | TokenKind::Ident(s) => { self.advance(); s }
                    _ => return Err(self.unexpected("property name")),
                };
                self.expect(TokenKind::Colon)?;
                let value = self.parse_expression()?;
                match properties.iter_mut().find(|(k, _)| *k == key) {
                    Some(slot) => slot.1 = value,
                    None => properties.push((key, value)),
                }
                if !self.matches(TokenKind::Comma) { break; }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Object(properties, span))
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>, Error> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            args.push(self.parse_expression()?);
            while self.matches(TokenKind::Comma) {
                args.push(self.parse_expression()?);
            }
        }
        Ok(args)
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    /// The trailing `;` is optional everywhere.
    fn consume_semicolon(&mut self) {
        self.matches(TokenKind::Semicolon);
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(kind.clone()) {
            return Ok(self.advance());
        }
        let tok = self.peek();
        let code = if self.is_at_end() { ErrorCode::P003 } else { ErrorCode::P002 };
        Err(Error::new(code, tok.line, tok.column,
            format!("expected {}, found {}", kind.describe(), tok.kind.describe())))
    }

    fn expect_ident(&mut self) -> Result<String, Error> {
        match self.peek_kind() {
            TokenKind::Ident(s) => { self.advance(); Ok(s) }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let tok = self.peek();
        let code = if self.is_at_end() { ErrorCode::P003 } else { ErrorCode::P001 };
        Error::new(code, tok.line, tok.column,
            format!("expected {}, found {}", expected, tok.kind.describe()))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
