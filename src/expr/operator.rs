use serde::{Serialize, Deserialize};

use std::fmt::{self, Display, Formatter};

/// The binary operators of the expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
  Add,
  Sub,
  Mul,
  Div,
  /// Evaluates both operands and joins their results.
  Barrier,
}

/// The binding strength of an operator. Higher binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Precedence(u64);

impl Operator {
  pub const ALL: [Operator; 5] =
    [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div, Operator::Barrier];

  pub fn symbol(self) -> &'static str {
    match self {
      Operator::Add => "+",
      Operator::Sub => "-",
      Operator::Mul => "*",
      Operator::Div => "/",
      Operator::Barrier => "|",
    }
  }

  pub fn from_symbol(symbol: &str) -> Option<Operator> {
    Operator::ALL.into_iter().find(|op| op.symbol() == symbol)
  }

  pub fn precedence(self) -> Precedence {
    match self {
      Operator::Barrier => Precedence(100),
      Operator::Add | Operator::Sub => Precedence(180),
      Operator::Mul | Operator::Div => Precedence(190),
    }
  }

  /// The minimum precedence of an operator on the right-hand side which
  /// does not need to be parenthesized. Every operator is left
  /// associative, so this is strictly above the operator's own.
  pub fn right_precedence(self) -> Precedence {
    Precedence(self.precedence().0 + 1)
  }
}

impl Display for Operator {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(self.symbol())
  }
}
