//! Recursive-descent parser for the selection language.
//!
//! Grammar (function and keyword names are case-insensitive):
//!
//! ```text
//! expr     := call | variable | STRING | NUMBER | BOOL
//! call     := IDENT '(' (expr (',' expr)*)? ')'
//! variable := '@' IDENT
//! ```

use crate::ast::{
    BoolLiteral, Expr, FunctionCall, NumberLiteral, StringLiteral, Token, TokenKind, Variable,
};
use crate::errors::ParseError;
use crate::lexer::Lexer;
use crate::units;

/// Maximum nesting depth of expressions. Deeply nested input fails fast
/// with a dedicated message instead of overflowing the call stack.
pub const MAX_RECURSION_DEPTH: usize = 100;

pub struct Parser {
    lexer: Lexer,
    current: Token,
    depth: usize,
}

impl Parser {
    /// Create a parser for the given input.
    ///
    /// Fails if the lexer rejects the input (size cap).
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input)?;
        let current = lexer.next_token();
        Ok(Parser {
            lexer,
            current,
            depth: 0,
        })
    }

    /// Parse the input as a single expression consuming everything.
    ///
    /// Trailing tokens after a complete expression are an error.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;

        if self.current.kind != TokenKind::Eof {
            return Err(self.error(format!(
                "unexpected token '{}', expected end of input",
                self.current.value
            )));
        }

        Ok(expr)
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.current.kind != kind {
            return Err(self.error(format!("expected {}, got {}", kind, self.current.kind)));
        }
        self.advance();
        Ok(())
    }

    /// A ParseError at the current token, with its source line attached.
    fn error(&self, message: impl Into<String>) -> ParseError {
        let context = self.lexer.context_line(self.current.pos);
        ParseError::with_context(self.current.pos, message, context)
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.depth += 1;
        if self.depth > MAX_RECURSION_DEPTH {
            return Err(self.error(format!(
                "expression nesting exceeds maximum depth of {}",
                MAX_RECURSION_DEPTH
            )));
        }
        let result = self.parse_expression_inner();
        self.depth -= 1;
        result
    }

    fn parse_expression_inner(&mut self) -> Result<Expr, ParseError> {
        match self.current.kind {
            TokenKind::Ident => self.parse_function_call(),
            TokenKind::At => self.parse_variable(),
            TokenKind::Str { .. } => self.parse_string(),
            TokenKind::Number => self.parse_number(),
            TokenKind::True | TokenKind::False => self.parse_bool(),
            TokenKind::Error => Err(self.error(self.current.value.clone())),
            _ => Err(self.error(format!("unexpected token '{}'", self.current.value))),
        }
    }

    /// call := IDENT '(' (expr (',' expr)*)? ')'
    fn parse_function_call(&mut self) -> Result<Expr, ParseError> {
        let pos = self.current.pos;
        let name = self.current.value.clone();
        self.advance(); // consume identifier

        if self.current.kind != TokenKind::LParen {
            return Err(self.error(format!("expected '(' after function name '{}'", name)));
        }
        self.advance(); // consume '('

        let mut args = Vec::new();

        if self.current.kind != TokenKind::RParen {
            loop {
                args.push(self.parse_expression()?);

                if self.current.kind == TokenKind::Comma {
                    self.advance(); // consume ','
                } else {
                    break;
                }
            }
        }

        self.expect(TokenKind::RParen)?;

        Ok(Expr::Call(FunctionCall { pos, name, args }))
    }

    /// variable := '@' IDENT
    fn parse_variable(&mut self) -> Result<Expr, ParseError> {
        let pos = self.current.pos;
        self.advance(); // consume '@'

        if self.current.kind != TokenKind::Ident {
            return Err(self.error("expected variable name after '@'"));
        }

        let name = self.current.value.clone();
        self.advance(); // consume identifier

        Ok(Expr::Variable(Variable { pos, name }))
    }

    fn parse_string(&mut self) -> Result<Expr, ParseError> {
        let pos = self.current.pos;
        let value = self.current.value.clone();
        let raw = matches!(self.current.kind, TokenKind::Str { raw: true });
        self.advance();

        Ok(Expr::Str(StringLiteral { pos, value, raw }))
    }

    /// Numbers are resolved here, at parse time: an unknown unit suffix is a
    /// parse error, not something deferred to evaluation.
    fn parse_number(&mut self) -> Result<Expr, ParseError> {
        let pos = self.current.pos;
        let raw = self.current.value.clone();

        let (value, unit) = units::parse_number_with_unit(&raw)
            .map_err(|e| ParseError::new(pos, e.to_string()))?;

        self.advance();

        Ok(Expr::Number(NumberLiteral {
            pos,
            value,
            raw,
            unit,
        }))
    }

    fn parse_bool(&mut self) -> Result<Expr, ParseError> {
        let pos = self.current.pos;
        let value = self.current.kind == TokenKind::True;
        self.advance();

        Ok(Expr::Bool(BoolLiteral { pos, value }))
    }
}
