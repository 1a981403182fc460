//! Recursive-descent parser producing [`Expr`] trees.
//!
//! Precedence, loosest first:
//!
//! ```text
//! or  <  and  <  not  <  comparisons  <  + -  <  * / %  <  unary - +  <  ** ^
//! ```
//!
//! Power is right-associative and binds tighter than a unary minus on its
//! left, so `-x^2` is `-(x^2)` and `2^-1` is `0.5`.

use std::f64::consts::{E, PI};

use crate::ast::{BinaryOp, CompareOp, Expr, Function, UnaryOp, Var};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::ExprError;

/// Parse a complete expression string.
pub fn parse_expr(src: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(src)?;
    parse_tokens(&tokens, src.len())
}

/// Parse a slice of already-tokenized input.
///
/// `end_offset` is reported when the slice is empty or ends early.
pub fn parse_tokens(tokens: &[Token], end_offset: usize) -> Result<Expr, ExprError> {
    if tokens.is_empty() {
        return Err(ExprError::EmptyExpression { offset: end_offset });
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or_expr()?;
    if let Some(tok) = parser.peek() {
        return Err(ExprError::UnexpectedToken {
            offset: tok.start,
            expected: "end of expression",
            found: tok.kind.describe(),
        });
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<&'a Token, ExprError> {
        match self.advance() {
            Some(tok) if tok.kind == kind => Ok(tok),
            Some(tok) => Err(ExprError::UnexpectedToken {
                offset: tok.start,
                expected,
                found: tok.kind.describe(),
            }),
            None => Err(ExprError::UnexpectedEnd { expected }),
        }
    }

    fn or_expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.and_expr()?;
        while self.peek_kind() == Some(&TokenKind::Or) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.not_expr()?;
        while self.peek_kind() == Some(&TokenKind::And) {
            self.pos += 1;
            let rhs = self.not_expr()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, ExprError> {
        if self.peek_kind() == Some(&TokenKind::Not) {
            self.pos += 1;
            let operand = self.not_expr()?;
            return Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand) });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        let first = self.sum()?;
        let mut rest = Vec::new();
        while let Some(op) = self.peek_kind().and_then(compare_op) {
            self.pos += 1;
            rest.push((op, self.sum()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare { first: Box::new(first), rest })
        }
    }

    fn sum(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Pos,
            _ => return self.power(),
        };
        self.pos += 1;
        let operand = self.unary()?;
        Ok(Expr::Unary { op, operand: Box::new(operand) })
    }

    fn power(&mut self) -> Result<Expr, ExprError> {
        let base = self.primary()?;
        if self.peek_kind() == Some(&TokenKind::Power) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let tok = self.advance().ok_or(ExprError::UnexpectedEnd { expected: "a value" })?;
        match &tok.kind {
            TokenKind::Number(v) => Ok(Expr::Number(*v)),
            TokenKind::LParen => {
                let inner = self.or_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                if self.peek_kind() == Some(&TokenKind::LParen) {
                    self.pos += 1;
                    return self.call(name, tok.start);
                }
                identifier(name, tok.start)
            }
            other => Err(ExprError::UnexpectedToken {
                offset: tok.start,
                expected: "a value",
                found: other.describe(),
            }),
        }
    }

    fn call(&mut self, name: &str, offset: usize) -> Result<Expr, ExprError> {
        let func = Function::from_name(name).ok_or_else(|| ExprError::UnknownFunction {
            offset,
            name: name.to_string(),
        })?;

        let mut args = Vec::new();
        if self.peek_kind() != Some(&TokenKind::RParen) {
            loop {
                args.push(self.or_expr()?);
                if self.peek_kind() == Some(&TokenKind::Comma) {
                    self.pos += 1;
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        if args.len() != func.arity() {
            return Err(ExprError::WrongArity {
                name: name.to_string(),
                expected: func.arity(),
                found: args.len(),
            });
        }
        Ok(Expr::Call { func, args })
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
}

fn compare_op(kind: &TokenKind) -> Option<CompareOp> {
    Some(match kind {
        TokenKind::Lt => CompareOp::Lt,
        TokenKind::Le => CompareOp::Le,
        TokenKind::Gt => CompareOp::Gt,
        TokenKind::Ge => CompareOp::Ge,
        TokenKind::EqEq => CompareOp::Eq,
        TokenKind::NotEq => CompareOp::Ne,
        _ => return None,
    })
}

fn identifier(name: &str, offset: usize) -> Result<Expr, ExprError> {
    if let Some(var) = Var::from_name(name) {
        return Ok(Expr::Var(var));
    }
    match name.strip_prefix("np.").unwrap_or(name) {
        "pi" => Ok(Expr::Number(PI)),
        "e" => Ok(Expr::Number(E)),
        _ => Err(ExprError::UnknownIdentifier { offset, name: name.to_string() }),
    }
}
