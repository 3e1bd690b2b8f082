//! Recursive descent parser.
//!
//! Precedence, lowest first:
//! `or`, `and`, `not`, comparisons and `in`, `+ -`, `* / %`, unary `-`.
//! `not` binds looser than comparisons, so `not a == b` is `not (a == b)`.
//! Trees deeper than `config::MAX_EXPRESSION_DEPTH` are rejected.

use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::error::{ExpressionError, Result};
use super::lexer::{tokenize, Spanned, Token};
use super::model_path::ModelPath;
use super::value::Value;
use crate::config;

/// Parse expression source into a tree.
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExpressionError::syntax(0, "empty expression"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
        depth: 0,
    };
    let expr = parser.parse_or()?;
    if let Some(extra) = parser.peek() {
        return Err(ExpressionError::syntax(
            extra.position,
            format!("unexpected {}", extra.token.describe()),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    /// Height of the tree being built above the current token. Bounded by
    /// `config::MAX_EXPRESSION_DEPTH` so evaluation and drop stay shallow.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume the next token if it equals `expected`, returning its position.
    fn eat(&mut self, expected: &Token) -> Option<usize> {
        match self.peek() {
            Some(spanned) if &spanned.token == expected => {
                let position = spanned.position;
                self.pos += 1;
                Some(position)
            }
            _ => None,
        }
    }

    /// Take the next token if `select` maps it to an operator.
    fn eat_op<T>(&mut self, select: fn(&Token) -> Option<T>) -> Option<(T, usize)> {
        let spanned = self.peek()?;
        let op = select(&spanned.token)?;
        let position = spanned.position;
        self.pos += 1;
        Some((op, position))
    }

    /// One more level of nesting at `position`.
    fn descend(&mut self, position: usize) -> Result<()> {
        self.depth += 1;
        if self.depth > config::MAX_EXPRESSION_DEPTH {
            return Err(ExpressionError::syntax(position, "expression nested too deeply"));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let outer = self.depth;
        let mut left = self.parse_and()?;
        while let Some(position) = self.eat(&Token::Or) {
            self.descend(position)?;
            let right = self.parse_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = outer;
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let outer = self.depth;
        let mut left = self.parse_not()?;
        while let Some(position) = self.eat(&Token::And) {
            self.descend(position)?;
            let right = self.parse_not()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = outer;
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if let Some(position) = self.eat(&Token::Not) {
            self.descend(position)?;
            let operand = self.parse_not()?;
            self.depth -= 1;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        self.parse_binary(Parser::parse_additive, |token| match token {
            Token::Eq => Some(BinaryOp::Eq),
            Token::Ne => Some(BinaryOp::Ne),
            Token::Lt => Some(BinaryOp::Lt),
            Token::Le => Some(BinaryOp::Le),
            Token::Gt => Some(BinaryOp::Gt),
            Token::Ge => Some(BinaryOp::Ge),
            Token::In => Some(BinaryOp::In),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        self.parse_binary(Parser::parse_multiplicative, |token| match token {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        self.parse_binary(Parser::parse_unary, |token| match token {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    /// Left associative chain of `operand (op operand)*`.
    fn parse_binary(
        &mut self,
        operand: fn(&mut Parser) -> Result<Expr>,
        select: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<Expr> {
        let outer = self.depth;
        let mut left = operand(self)?;
        while let Some((op, position)) = self.eat_op(select) {
            self.descend(position)?;
            let right = operand(self)?;
            left = binary(op, left, right);
        }
        self.depth = outer;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if let Some(position) = self.eat(&Token::Minus) {
            self.descend(position)?;
            let operand = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let Some(Spanned { token, position }) = self.next() else {
            return Err(ExpressionError::syntax(self.end, "unexpected end of expression"));
        };
        match token {
            Token::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::Path(text) => Ok(Expr::Path(ModelPath::parse(&text))),
            Token::LParen => {
                self.descend(position)?;
                let inner = self.parse_or()?;
                if self.eat(&Token::RParen).is_none() {
                    let position = self.peek().map(|s| s.position).unwrap_or(self.end);
                    return Err(ExpressionError::syntax(position, "expected ')'"));
                }
                self.depth -= 1;
                Ok(inner)
            }
            other => Err(ExpressionError::syntax(
                position,
                format!("unexpected {}", other.describe()),
            )),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
