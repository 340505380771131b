//! Arithmetic expressions over named inputs and numeric literals.
//!
//! Expression nodes are interned, so structurally equal subtrees
//! built on the same thread share one allocation, and memoized
//! functions of an expression hit the cache for every occurrence of a
//! repeated subtree.

pub mod eval;
pub mod operator;
pub mod parser;
pub mod tokenizer;

pub use eval::{Env, EvalError, error_eval};
pub use operator::Operator;
pub use parser::{ParseError, parse_expr};

use crate::memo::{Interned, KeyEncodingError};
use crate::numeric::Exact;

use serde::Serialize;

use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Expr {
  Variable(String),
  Literal(Literal),
  /// Unary minus. Kept as its own node since negation is exact, while
  /// `0 - x` would be charged a rounding step.
  Negate(Interned<Expr>),
  Binary {
    op: Operator,
    left: Interned<Expr>,
    right: Interned<Expr>,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Literal {
  Exact(Exact),
  /// A literal which is kept as written, because reading it exactly
  /// would be unreasonably expensive (such as `1e99999999`).
  Text(String),
}

impl Expr {
  pub fn variable(name: impl Into<String>) -> Result<Interned<Expr>, KeyEncodingError> {
    Expr::intern(Expr::Variable(name.into()))
  }

  pub fn literal(literal: impl Into<Literal>) -> Result<Interned<Expr>, KeyEncodingError> {
    Expr::intern(Expr::Literal(literal.into()))
  }

  pub fn negate(operand: Interned<Expr>) -> Result<Interned<Expr>, KeyEncodingError> {
    Expr::intern(Expr::Negate(operand))
  }

  pub fn binary(
    op: Operator,
    left: Interned<Expr>,
    right: Interned<Expr>,
  ) -> Result<Interned<Expr>, KeyEncodingError> {
    Expr::intern(Expr::Binary { op, left, right })
  }

  fn intern(expr: Expr) -> Result<Interned<Expr>, KeyEncodingError> {
    Interned::new(expr, |expr| expr)
  }

  /// The value of this node, if it is an exactly known literal.
  pub fn as_exact(&self) -> Option<&Exact> {
    match self {
      Expr::Literal(Literal::Exact(value)) => Some(value),
      _ => None,
    }
  }

  /// The number of nodes in the tree, counting shared subtrees once
  /// per occurrence.
  pub fn size(&self) -> usize {
    match self {
      Expr::Variable(_) | Expr::Literal(_) => 1,
      Expr::Negate(operand) => 1 + operand.size(),
      Expr::Binary { left, right, .. } => 1 + left.size() + right.size(),
    }
  }
}

impl From<Exact> for Literal {
  fn from(value: Exact) -> Self {
    Literal::Exact(value)
  }
}

impl Display for Literal {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      // Parenthesized so that the printed form reads back as one
      // literal in any operand position.
      Literal::Exact(Exact::Finite(r)) if !r.is_integer() => write!(f, "({})", r),
      Literal::Exact(value) => write!(f, "{}", value),
      Literal::Text(text) => f.write_str(text),
    }
  }
}

impl Display for Expr {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Expr::Variable(name) => f.write_str(name),
      Expr::Literal(literal) => write!(f, "{}", literal),
      Expr::Negate(operand) => write!(f, "(-{})", operand),
      Expr::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
    }
  }
}
