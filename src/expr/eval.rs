//! Round-off error analysis of expressions.
//!
//! Evaluation is bottom-up in the error-semantics domain and memoized
//! per node. Because expression nodes are interned, a subtree shared
//! between many candidate rewrites of an expression is analyzed once.

use super::{Expr, Literal};
use super::operator::Operator;
use crate::error::Error;
use crate::interval::Lattice;
use crate::memo::{Interned, KeyEncodingError, Memoized};
use crate::numeric::{IntoExact, NumericContext, ParseValueError};
use crate::numeric::context;
use crate::semantics::ErrorSemantics;

use serde::Serialize;
use thiserror::Error;

use std::collections::BTreeMap;

/// The inputs of an expression. Ordered, so that equal environments
/// encode to equal cache keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Env {
  bindings: BTreeMap<String, ErrorSemantics>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvalError {
  #[error("Unbound variable {0}")]
  UnboundVariable(String),
  #[error("Operator {0} is not supported by error analysis")]
  UnsupportedOperator(Operator),
  #[error("{0}")]
  ParseValue(#[from] ParseValueError),
  #[error("{0}")]
  KeyEncoding(#[from] KeyEncodingError),
}

type EvalArgs = (Interned<Expr>, Env, NumericContext);

static ERROR_EVAL: Memoized<EvalArgs, Result<ErrorSemantics, EvalError>> =
  Memoized::new("error_eval", eval_in_context);

impl Env {
  pub fn new() -> Env {
    Env::default()
  }

  /// Binds each name to an input known only to lie in the given
  /// range, as by [`ErrorSemantics::cast`].
  pub fn from_bounds<I, S, A, B>(bounds: I) -> Result<Env, Error>
  where I: IntoIterator<Item = (S, (A, B))>,
        S: Into<String>,
        A: IntoExact,
        B: IntoExact {
    let mut env = Env::new();
    for (name, (min, max)) in bounds {
      env.insert(name, ErrorSemantics::cast(min, max)?);
    }
    Ok(env)
  }

  pub fn insert(&mut self, name: impl Into<String>, value: ErrorSemantics) -> Option<ErrorSemantics> {
    self.bindings.insert(name.into(), value)
  }

  pub fn get(&self, name: &str) -> Option<&ErrorSemantics> {
    self.bindings.get(name)
  }

  pub fn len(&self) -> usize {
    self.bindings.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bindings.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &ErrorSemantics)> {
    self.bindings.iter().map(|(name, value)| (name.as_str(), value))
  }
}

impl FromIterator<(String, ErrorSemantics)> for Env {
  fn from_iter<I: IntoIterator<Item = (String, ErrorSemantics)>>(iter: I) -> Self {
    Env { bindings: iter.into_iter().collect() }
  }
}

/// The value range and round-off error of `expr` evaluated in the
/// ambient numeric context, with inputs bound by `env`.
///
/// Results are cached per thread, keyed by the expression, the
/// environment, and the numeric context.
pub fn error_eval(expr: &Interned<Expr>, env: &Env) -> Result<ErrorSemantics, EvalError> {
  ERROR_EVAL.call((expr.clone(), env.clone(), context::current()))?
}

fn eval_in_context((expr, env, ctx): EvalArgs) -> Result<ErrorSemantics, EvalError> {
  context::with_context(ctx, || eval_node(&expr, &env))
}

fn eval_node(expr: &Expr, env: &Env) -> Result<ErrorSemantics, EvalError> {
  match expr {
    Expr::Variable(name) => {
      env.get(name).cloned().ok_or_else(|| EvalError::UnboundVariable(name.clone()))
    }
    Expr::Literal(Literal::Exact(value)) => Ok(ErrorSemantics::cast_constant(value)?),
    Expr::Literal(Literal::Text(text)) => Ok(ErrorSemantics::cast_constant(text.as_str())?),
    Expr::Negate(operand) => Ok(-error_eval(operand, env)?),
    Expr::Binary { op, left, right } => {
      let left = error_eval(left, env)?;
      let right = error_eval(right, env)?;
      match op {
        Operator::Add => Ok(left + right),
        Operator::Sub => Ok(left - right),
        Operator::Mul => Ok(left * right),
        Operator::Barrier => Ok(left.join(&right)),
        Operator::Div => Err(EvalError::UnsupportedOperator(*op)),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::expr::parse_expr;
  use crate::interval::{ExactInterval, FloatInterval};
  use crate::numeric::{Exact, Float, SignedInfinity};

  fn env_ab() -> Env {
    Env::from_bounds([("a", (1, 2)), ("b", (10, 20))]).unwrap()
  }

  #[test]
  fn test_variables_and_literals() {
    let env = env_ab();
    let a = parse_expr("a").unwrap();
    assert_eq!(error_eval(&a, &env).unwrap(), ErrorSemantics::cast(1, 2).unwrap());
    let tenth = parse_expr("0.1").unwrap();
    assert_eq!(error_eval(&tenth, &env).unwrap(), ErrorSemantics::cast_constant("0.1").unwrap());
  }

  #[test]
  fn test_binary_operators() {
    let env = env_ab();
    let a = env.get("a").unwrap().clone();
    let b = env.get("b").unwrap().clone();
    let cases = [
      ("a + b", &a + &b),
      ("a - b", &a - &b),
      ("a * b", &a * &b),
      ("a | b", a.join(&b)),
      ("(a + b) * a", &(&a + &b) * &a),
    ];
    for (input, expected) in cases {
      let expr = parse_expr(input).unwrap();
      assert_eq!(error_eval(&expr, &env).unwrap(), expected, "{input}");
    }
  }

  #[test]
  fn test_exact_input_picks_up_rounding_error() {
    let exact_one = ErrorSemantics::from(FloatInterval::from_values(1, 1).unwrap());
    let env = Env::from_iter([("x".to_owned(), exact_one)]);
    let expr = parse_expr("x + x").unwrap();
    let result = error_eval(&expr, &env).unwrap();
    assert_eq!(result.v(), &FloatInterval::from_values(2, 2).unwrap());
    // Half an ulp of 2 in double precision.
    assert_eq!(result.e(), &ExactInterval::symmetric(Exact::pow2(-52)));
  }

  #[test]
  fn test_negation_commits_no_error() {
    let exact_input = ErrorSemantics::from(FloatInterval::from_values(1, 2).unwrap());
    let env = Env::from_iter([("x".to_owned(), exact_input)]);
    let result = error_eval(&parse_expr("-x").unwrap(), &env).unwrap();
    assert_eq!(result.v(), &FloatInterval::from_values(-2, -1).unwrap());
    assert_eq!(result.e(), &ExactInterval::point(Exact::zero()));
    let sub = error_eval(&parse_expr("0 - x").unwrap(), &env).unwrap();
    assert!(sub.max_error() > Exact::zero());
  }

  #[test]
  fn test_overflowed_literals_cancel_to_unbounded() {
    let expr = parse_expr("1e400 - 1e400").unwrap();
    let result = context::with_context(NumericContext::DOUBLE, || error_eval(&expr, &Env::new())).unwrap();
    assert_eq!(result.v().min(), &Float::infinity(SignedInfinity::NegInfinity));
    assert_eq!(result.v().max(), &Float::infinity(SignedInfinity::PosInfinity));
    assert_eq!(result.max_error(), Exact::Infinite(SignedInfinity::PosInfinity));
    let bounds = result.bounds();
    assert_eq!(bounds.min(), &Float::infinity(SignedInfinity::NegInfinity));
  }

  #[test]
  fn test_unbound_variable() {
    let expr = parse_expr("a + c").unwrap();
    assert_eq!(error_eval(&expr, &env_ab()), Err(EvalError::UnboundVariable("c".to_owned())));
  }

  #[test]
  fn test_division_unsupported() {
    let expr = parse_expr("a / b").unwrap();
    assert_eq!(error_eval(&expr, &env_ab()), Err(EvalError::UnsupportedOperator(Operator::Div)));
  }

  #[test]
  fn test_text_literal_fails_to_parse() {
    let expr = parse_expr("a * 1e999999999").unwrap();
    assert!(matches!(error_eval(&expr, &env_ab()), Err(EvalError::ParseValue(_))));
  }

  #[test]
  fn test_result_depends_on_context() {
    let env = env_ab();
    let expr = parse_expr("a * 0.1").unwrap();
    let double = error_eval(&expr, &env).unwrap();
    let single = context::with_context(NumericContext::SINGLE, || {
      // Inputs are re-cast so they carry single-precision error.
      let env = Env::from_bounds([("a", (1, 2))]).unwrap();
      error_eval(&expr, &env).unwrap()
    });
    assert!(single.max_error() > double.max_error());
  }

  #[test]
  fn test_results_are_memoized() {
    let env = env_ab();
    let expr = parse_expr("(a + b) * (a + b)").unwrap();
    ERROR_EVAL.cache_clear();
    error_eval(&expr, &env).unwrap();
    // The shared subtree `a + b` is evaluated once.
    let info = ERROR_EVAL.cache_info();
    assert_eq!(info.misses, 4);
    assert_eq!(info.hits, 1);
    error_eval(&expr, &env).unwrap();
    assert_eq!(ERROR_EVAL.cache_info().hits, 2);
  }
}
