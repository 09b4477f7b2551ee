//! Pratt parser for formula token streams.
//!
//! Operator precedence (lowest to highest): comparison; concatenation `&`;
//! additive `+ -`; multiplicative `* /`; exponent `^` (right-associative);
//! unary `+ -` and postfix `%`; reference operators (`:`, space
//! intersection, `,` union inside parentheses); atoms.

use crate::error::{Error, Result};
use crate::formula::ast::{BinaryOp, Expr, RefExpr, UnaryOp};
use crate::formula::tokenizer::{tokenize, Token, TokenKind};
use crate::reference::{CellRef, Range};

const BP_COMPARE: u8 = 10;
const BP_CONCAT: u8 = 20;
const BP_ADDITIVE: u8 = 30;
const BP_MULTIPLICATIVE: u8 = 40;
const BP_POWER: u8 = 50;
const BP_UNARY: u8 = 60;
const BP_PERCENT: u8 = 70;

/// Parse a formula string into an AST.
///
/// A leading `=` is tolerated and stripped; stored formula text does not
/// carry one.
pub fn parse_formula(input: &str) -> Result<Expr> {
    let body = input.trim().strip_prefix('=').unwrap_or(input.trim());
    if body.trim().is_empty() {
        return Err(Error::FormulaParse {
            position: 0,
            detail: "empty formula".to_string(),
        });
    }
    let tokens = tokenize(body)?;
    let mut parser = Parser {
        tokens,
        index: 0,
        end: body.len(),
    };
    let expr = parser.parse_expr(0)?;
    if let Some((token, _)) = parser.peek() {
        return Err(Error::FormulaParse {
            position: token.pos,
            detail: format!("unexpected trailing token {:?}", token.kind),
        });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    end: usize,
}

impl Parser {
    /// Peek the next significant token, reporting whether whitespace
    /// precedes it.
    fn peek(&self) -> Option<(&Token, bool)> {
        let mut i = self.index;
        let mut ws = false;
        while let Some(t) = self.tokens.get(i) {
            if t.kind == TokenKind::Whitespace {
                ws = true;
                i += 1;
            } else {
                return Some((t, ws));
            }
        }
        None
    }

    fn advance(&mut self) -> Option<Token> {
        while let Some(t) = self.tokens.get(self.index) {
            self.index += 1;
            if t.kind != TokenKind::Whitespace {
                return Some(t.clone());
            }
        }
        None
    }

    fn error_here(&self, detail: impl Into<String>) -> Error {
        let position = self
            .peek()
            .map(|(t, _)| t.pos)
            .unwrap_or(self.end);
        Error::FormulaParse {
            position,
            detail: detail.into(),
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        match self.peek() {
            Some((t, _)) if t.kind == *kind => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error_here(format!("expected {kind:?}"))),
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let Some((token, _)) = self.peek() else { break };

            if token.kind == TokenKind::Percent && BP_PERCENT > min_bp {
                self.advance();
                lhs = Expr::Unary {
                    op: UnaryOp::Percent,
                    operand: Box::new(lhs),
                };
                continue;
            }

            let Some((op, bp, right_assoc)) = binary_op(&token.kind) else {
                break;
            };
            if bp <= min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(if right_assoc { bp - 1 } else { bp })?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        match self.peek() {
            Some((t, _)) if t.kind == TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expr(BP_UNARY)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            Some((t, _)) if t.kind == TokenKind::Plus => {
                self.advance();
                let operand = self.parse_expr(BP_UNARY)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Pos,
                    operand: Box::new(operand),
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let Some((token, _)) = self.peek() else {
            return Err(self.error_here("unexpected end of formula"));
        };

        match token.kind.clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::Text(s) => {
                self.advance();
                Ok(Expr::Text(s))
            }
            TokenKind::Bool(b) => {
                self.advance();
                Ok(Expr::Bool(b))
            }
            TokenKind::ErrorLit(e) => {
                self.advance();
                Ok(Expr::Error(e))
            }
            TokenKind::FuncName(name) => {
                self.advance();
                self.parse_call(name)
            }
            TokenKind::LParen => {
                self.advance();
                self.parse_paren()
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_array()
            }
            TokenKind::Ref(_) | TokenKind::SheetName(_) => self.parse_reference_chain(),
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Name(name))
            }
            other => Err(self.error_here(format!("unexpected token {other:?}"))),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expr> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if matches!(self.peek(), Some((t, _)) if t.kind == TokenKind::RParen) {
            self.advance();
            return Ok(Expr::Call { name, args });
        }
        loop {
            // An immediately following separator is an omitted argument.
            let arg = match self.peek() {
                Some((t, _)) if t.kind == TokenKind::Comma || t.kind == TokenKind::RParen => {
                    Expr::Empty
                }
                _ => self.parse_expr(0)?,
            };
            args.push(arg);
            match self.peek() {
                Some((t, _)) if t.kind == TokenKind::Comma => {
                    self.advance();
                }
                Some((t, _)) if t.kind == TokenKind::RParen => {
                    self.advance();
                    break;
                }
                _ => return Err(self.error_here("expected ',' or ')' in argument list")),
            }
        }
        Ok(Expr::Call { name, args })
    }

    fn parse_paren(&mut self) -> Result<Expr> {
        let first = self.parse_expr(0)?;
        if matches!(self.peek(), Some((t, _)) if t.kind == TokenKind::Comma) {
            // Reference union.
            let mut parts = vec![first];
            while matches!(self.peek(), Some((t, _)) if t.kind == TokenKind::Comma) {
                self.advance();
                parts.push(self.parse_expr(0)?);
            }
            self.expect(&TokenKind::RParen)?;
            return Ok(Expr::Paren(Box::new(Expr::Union(parts))));
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Expr::Paren(Box::new(first)))
    }

    fn parse_array(&mut self) -> Result<Expr> {
        let mut rows: Vec<Vec<Expr>> = Vec::new();
        let mut row: Vec<Expr> = Vec::new();
        loop {
            row.push(self.parse_array_element()?);
            let Some((token, _)) = self.peek() else {
                return Err(self.error_here("unterminated array literal"));
            };
            match token.kind {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Semicolon => {
                    self.advance();
                    rows.push(std::mem::take(&mut row));
                }
                TokenKind::RBrace => {
                    self.advance();
                    rows.push(row);
                    break;
                }
                _ => return Err(self.error_here("expected ',', ';' or '}' in array")),
            }
        }
        let width = rows[0].len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(self.error_here("array rows have unequal lengths"));
        }
        Ok(Expr::Array(rows))
    }

    /// Array elements are constants: numbers (optionally signed), strings,
    /// booleans, and error literals.
    fn parse_array_element(&mut self) -> Result<Expr> {
        let Some((token, _)) = self.peek() else {
            return Err(self.error_here("unterminated array literal"));
        };
        match token.kind.clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::Text(s) => {
                self.advance();
                Ok(Expr::Text(s))
            }
            TokenKind::Bool(b) => {
                self.advance();
                Ok(Expr::Bool(b))
            }
            TokenKind::ErrorLit(e) => {
                self.advance();
                Ok(Expr::Error(e))
            }
            TokenKind::Minus => {
                self.advance();
                match self.peek().map(|(t, _)| t.kind.clone()) {
                    Some(TokenKind::Number(n)) => {
                        self.advance();
                        Ok(Expr::Number(-n))
                    }
                    _ => Err(self.error_here("expected number after '-' in array")),
                }
            }
            other => Err(self.error_here(format!("invalid array element {other:?}"))),
        }
    }

    /// Parse a reference atom and fold any chain of space-separated
    /// intersections.
    fn parse_reference_chain(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_reference_atom()?;
        loop {
            match self.peek() {
                Some((t, true))
                    if matches!(t.kind, TokenKind::Ref(_) | TokenKind::SheetName(_)) =>
                {
                    let rhs = self.parse_reference_atom()?;
                    lhs = Expr::Intersection(Box::new(lhs), Box::new(rhs));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_reference_atom(&mut self) -> Result<Expr> {
        let sheet = match self.peek().map(|(t, _)| t.kind.clone()) {
            Some(TokenKind::SheetName(name)) => {
                self.advance();
                self.expect(&TokenKind::Bang)?;
                Some(name)
            }
            _ => None,
        };

        let start = self.expect_ref()?;
        let range = if matches!(self.peek(), Some((t, _)) if t.kind == TokenKind::Colon) {
            self.advance();
            // Tolerate a repeated qualifier on the right-hand side.
            if matches!(self.peek().map(|(t, _)| t.kind.clone()), Some(TokenKind::SheetName(_))) {
                self.advance();
                self.expect(&TokenKind::Bang)?;
            }
            let end = self.expect_ref()?;
            Range::new(start, end)
        } else {
            Range::cell(start)
        };

        Ok(Expr::Reference(RefExpr { sheet, range }))
    }

    fn expect_ref(&mut self) -> Result<CellRef> {
        match self.peek().map(|(t, _)| t.kind.clone()) {
            Some(TokenKind::Ref(r)) => {
                self.advance();
                Ok(r)
            }
            _ => Err(self.error_here("expected a cell reference")),
        }
    }
}

fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8, bool)> {
    let entry = match kind {
        TokenKind::Eq => (BinaryOp::Eq, BP_COMPARE, false),
        TokenKind::Ne => (BinaryOp::Ne, BP_COMPARE, false),
        TokenKind::Lt => (BinaryOp::Lt, BP_COMPARE, false),
        TokenKind::Le => (BinaryOp::Le, BP_COMPARE, false),
        TokenKind::Gt => (BinaryOp::Gt, BP_COMPARE, false),
        TokenKind::Ge => (BinaryOp::Ge, BP_COMPARE, false),
        TokenKind::Amp => (BinaryOp::Concat, BP_CONCAT, false),
        TokenKind::Plus => (BinaryOp::Add, BP_ADDITIVE, false),
        TokenKind::Minus => (BinaryOp::Sub, BP_ADDITIVE, false),
        TokenKind::Star => (BinaryOp::Mul, BP_MULTIPLICATIVE, false),
        TokenKind::Slash => (BinaryOp::Div, BP_MULTIPLICATIVE, false),
        TokenKind::Caret => (BinaryOp::Pow, BP_POWER, true),
        _ => return None,
    };
    Some(entry)
}
