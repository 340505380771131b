//! Precedence-climbing parser for the expression language.
//!
//! The grammar is the usual infix one: `+ - * /` with their customary
//! precedence, parentheses, unary minus, and the barrier operator `|`,
//! which binds loosest of all. Every binary operator is left
//! associative.

use super::{Expr, Literal};
use super::operator::Operator;
use super::tokenizer::{Token, TokenData, read_tokens};
use crate::memo::{Interned, KeyEncodingError};
use crate::numeric::Exact;
use crate::parsing::source::{LineColumn, SourceOffset};
use crate::parsing::tokenizer::TokenizerState;

use num::Zero;
use thiserror::Error;

use std::str::FromStr;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
  #[error("{message} at {position}")]
  Syntax { message: String, position: LineColumn },
  #[error("{0}")]
  Intern(#[from] KeyEncodingError),
}

struct Parser<'a> {
  source: &'a str,
  tokens: Vec<Token>,
  index: usize,
}

/// Parses `input` into an interned expression tree.
pub fn parse_expr(input: &str) -> Result<Interned<Expr>, ParseError> {
  let mut state = TokenizerState::new(input);
  let tokens = read_tokens(&mut state).map_err(|err| ParseError::Syntax {
    message: err.to_string(),
    position: state.line_column(err.position()),
  })?;
  let mut parser = Parser { source: input, tokens, index: 0 };
  let expr = parser.parse_binary(None)?;
  match parser.peek() {
    None => Ok(expr),
    Some(token) => Err(parser.error_at("Unexpected token after expression", token.span.start)),
  }
}

impl<'a> Parser<'a> {
  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.index)
  }

  fn next(&mut self) -> Option<Token> {
    let token = self.tokens.get(self.index).cloned();
    if token.is_some() {
      self.index += 1;
    }
    token
  }

  fn end_of_input(&self) -> SourceOffset {
    SourceOffset(self.source.len())
  }

  fn error_at(&self, message: &str, pos: SourceOffset) -> ParseError {
    ParseError::Syntax {
      message: message.to_owned(),
      position: LineColumn::locate(self.source, pos),
    }
  }

  /// Parses operators binding at least as tightly as `min_op`, or any
  /// operator if `min_op` is `None`.
  fn parse_binary(&mut self, min_op: Option<Operator>) -> Result<Interned<Expr>, ParseError> {
    let mut left = self.parse_unary()?;
    while let Some(Token { data: TokenData::Operator(op), span }) = self.peek().cloned() {
      if min_op.is_some_and(|min| op.precedence() < min.right_precedence()) {
        break;
      }
      self.index += 1;
      let right = self.parse_binary(Some(op))?;
      left = self.combine(op, left, right, span.start)?;
    }
    Ok(left)
  }

  fn parse_unary(&mut self) -> Result<Interned<Expr>, ParseError> {
    if let Some(Token { data: TokenData::Operator(Operator::Sub), .. }) = self.peek() {
      self.index += 1;
      let operand = self.parse_unary()?;
      return Ok(negate(operand)?);
    }
    self.parse_primary()
  }

  fn parse_primary(&mut self) -> Result<Interned<Expr>, ParseError> {
    let Some(token) = self.next() else {
      return Err(self.error_at("Unexpected end of input", self.end_of_input()));
    };
    match token.data {
      TokenData::Number(text) => Ok(Expr::literal(read_literal(text))?),
      TokenData::Identifier(name) => Ok(Expr::variable(name)?),
      TokenData::LeftParen => {
        let inner = self.parse_binary(None)?;
        match self.next() {
          Some(Token { data: TokenData::RightParen, .. }) => Ok(inner),
          Some(other) => Err(self.error_at("Expected ')'", other.span.start)),
          None => Err(self.error_at("Expected ')'", self.end_of_input())),
        }
      }
      TokenData::RightParen | TokenData::Operator(_) => {
        Err(self.error_at("Expected an operand", token.span.start))
      }
    }
  }

  fn combine(
    &self,
    op: Operator,
    left: Interned<Expr>,
    right: Interned<Expr>,
    pos: SourceOffset,
  ) -> Result<Interned<Expr>, ParseError> {
    if op == Operator::Div {
      if let (Some(Exact::Finite(a)), Some(Exact::Finite(b))) = (left.as_exact(), right.as_exact()) {
        if b.is_zero() {
          return Err(self.error_at("Division by zero", pos));
        }
        return Ok(Expr::literal(Exact::Finite(a / b))?);
      }
    }
    Ok(Expr::binary(op, left, right)?)
  }
}

fn read_literal(text: String) -> Literal {
  match Exact::from_str(&text) {
    Ok(value) => Literal::Exact(value),
    Err(_) => Literal::Text(text),
  }
}

fn negate(operand: Interned<Expr>) -> Result<Interned<Expr>, KeyEncodingError> {
  match &*operand {
    Expr::Literal(Literal::Exact(value)) => Expr::literal(-value),
    Expr::Literal(Literal::Text(text)) => {
      let negated = match text.strip_prefix('-') {
        Some(positive) => positive.to_owned(),
        None => format!("-{}", text),
      };
      Expr::literal(Literal::Text(negated))
    }
    Expr::Negate(inner) => Ok(inner.clone()),
    _ => Expr::negate(operand.clone()),
  }
}
