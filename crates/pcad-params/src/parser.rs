//! Expression Parser
//!
//! Recursive descent over the token stream. Precedence, loosest first:
//!
//! ```text
//! additive       := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := power (('*' | '/') power)*
//! power          := unary ('^' power)?
//! unary          := ('+' | '-') unary | primary
//! primary        := number | ident | ident '(' args? ')' | '(' additive ')'
//! ```

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::lexer::{Token, TokenKind, tokenize};

/// Parse `source` into an expression tree.
pub fn parse(source: &str) -> Result<Expr, SyntaxError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens: &tokens,
        pos: 0,
    };

    let expr = parser.additive()?;

    if let Some(token) = parser.peek() {
        let kind = if token.kind == TokenKind::RParen {
            SyntaxErrorKind::UnbalancedParen
        } else {
            SyntaxErrorKind::UnexpectedToken(token.text(source).to_string())
        };
        return Err(SyntaxError::new(kind, token.offset));
    }

    Ok(expr)
}

/// Non-failing check that `source` parses.
pub fn is_valid_expression(source: &str) -> bool {
    parse(source).is_ok()
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, token: &Token) -> SyntaxError {
        SyntaxError::new(
            SyntaxErrorKind::UnexpectedToken(token.text(self.source).to_string()),
            token.offset,
        )
    }

    fn end(&self) -> SyntaxError {
        SyntaxError::new(SyntaxErrorKind::UnexpectedEnd, self.source.len())
    }

    fn additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.power()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.power()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn power(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.unary()?;
        if self.eat(&TokenKind::Caret) {
            // Recursing on the right gives `a^b^c == a^(b^c)`
            let exponent = self.power()?;
            return Ok(Expr::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::Minus) => UnaryOp::Neg,
            _ => return self.primary(),
        };
        self.pos += 1;
        let arg = self.unary()?;
        Ok(Expr::unary(op, arg))
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.next().ok_or_else(|| self.end())?;
        match &token.kind {
            TokenKind::Number(value) => Ok(Expr::Number(*value)),
            TokenKind::Ident(name) => match self.peek() {
                Some(open) if open.kind == TokenKind::LParen => {
                    self.pos += 1;
                    let args = self.arguments(open)?;
                    Ok(Expr::call(name.clone(), args))
                }
                _ => Ok(Expr::Ident(name.clone())),
            },
            TokenKind::LParen => {
                let inner = self.additive()?;
                self.close(token)?;
                Ok(inner)
            }
            _ => Err(self.unexpected(token)),
        }
    }

    /// Arguments after `name(`, consuming the closing `)`.
    fn arguments(&mut self, open: &Token) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.additive()?);
            match self.next() {
                Some(t) if t.kind == TokenKind::Comma => continue,
                Some(t) if t.kind == TokenKind::RParen => return Ok(args),
                Some(t) => return Err(self.unexpected(t)),
                None => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnbalancedParen,
                        open.offset,
                    ));
                }
            }
        }
    }

    fn close(&mut self, open: &Token) -> Result<(), SyntaxError> {
        match self.next() {
            Some(t) if t.kind == TokenKind::RParen => Ok(()),
            Some(t) => Err(self.unexpected(t)),
            None => Err(SyntaxError::new(
                SyntaxErrorKind::UnbalancedParen,
                open.offset,
            )),
        }
    }
}
