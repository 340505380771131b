//! Error semantics: a floating value range paired with a bound on how
//! far the computed value may be from the exact result.
//!
//! An [`ErrorSemantics`] `(v, e)` states that for some floating value
//! `x` in `v` and some exact `d` in `e`, the exact result of the
//! computation is `x + d`. Operations propagate both components so
//! that this remains true of their results.

use crate::error::Error;
use crate::interval::{Interval, FloatInterval, ExactInterval, Lattice, InvalidIntervalError};
use crate::numeric::{self, Exact, Float, IntoExact, ParseValueError, RoundingMode, SignedInfinity, rounding_scoped};

use serde::Serialize;

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::ops;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorSemantics {
  v: FloatInterval,
  e: ExactInterval,
}

/// The round-off error committed by rounding any exact value whose
/// floating result lies in `v`: `[-u/2, u/2]` where `u` is the ulp of
/// the larger bound magnitude.
pub fn round_off_error(v: &FloatInterval) -> ExactInterval {
  half_ulp_interval(&v.magnitude().to_exact())
}

fn half_ulp_interval(magnitude: &Exact) -> ExactInterval {
  let half_ulp = numeric::ulp(magnitude) * Exact::ratio(1, 2);
  ExactInterval::symmetric(half_ulp)
}

impl ErrorSemantics {
  /// Pairs a value range with an error range. The bounds of `v` are
  /// re-rounded to the ambient precision.
  pub fn new(v: FloatInterval, e: ExactInterval) -> ErrorSemantics {
    ErrorSemantics { v: v.rerounded(), e }
  }

  /// An input known only to lie in `[min, max]`. Its error is the
  /// round-off error of the range.
  pub fn cast(min: impl IntoExact, max: impl IntoExact) -> Result<ErrorSemantics, Error> {
    let range = ExactInterval::from_values(min, max)?;
    let v = FloatInterval::round(&range);
    let e = half_ulp_interval(&range.magnitude());
    Ok(ErrorSemantics { v, e })
  }

  /// An input known only to lie near `value`. Same as `cast(value,
  /// value)`.
  pub fn cast_point(value: impl IntoExact) -> Result<ErrorSemantics, Error> {
    let value = value.into_exact()?;
    ErrorSemantics::cast(value.clone(), value)
  }

  /// A known exact constant. The error is the exact difference between
  /// the constant and its rounded value, which is tighter than the
  /// bound [`cast`](ErrorSemantics::cast) would give.
  ///
  /// A constant too large for the working precision rounds to an
  /// infinity, and its error is unbounded.
  pub fn cast_constant(value: impl IntoExact) -> Result<ErrorSemantics, ParseValueError> {
    let exact = value.into_exact()?;
    let rounded = Float::round(&exact);
    let e = if rounded.is_finite() {
      Interval::point(&exact - &rounded.to_exact())
    } else {
      half_ulp_interval(&exact.abs())
    };
    Ok(ErrorSemantics { v: Interval::point(rounded), e })
  }

  pub fn v(&self) -> &FloatInterval {
    &self.v
  }

  pub fn e(&self) -> &ExactInterval {
    &self.e
  }

  pub fn into_parts(self) -> (FloatInterval, ExactInterval) {
    (self.v, self.e)
  }

  /// The largest absolute error, `max(|e.min|, |e.max|)`.
  pub fn max_error(&self) -> Exact {
    self.e.magnitude()
  }

  /// Orders by worst-case absolute error only. Distinct values with the
  /// same worst-case error compare equal here, so this is the total
  /// preorder used for ranking equivalent expressions.
  pub fn cmp_accuracy(&self, other: &ErrorSemantics) -> Ordering {
    self.max_error().cmp(&other.max_error())
  }

  /// A floating interval containing every possible exact result:
  /// `v + e`, with the lower bound rounded down and the upper bound
  /// rounded up. An overflowed value whose error reaches the opposite
  /// infinity leaves that bound unbounded.
  pub fn bounds(&self) -> FloatInterval {
    let (lo, hi) = (self.v.min().to_exact(), self.v.max().to_exact());
    let add = rounding_scoped(|(a, b): (&Exact, &Exact), toward: SignedInfinity| {
      Float::round(&a.add_toward(b, toward))
    });
    let min = add((&lo, self.e.min()), SignedInfinity::NegInfinity, RoundingMode::TowardNegative);
    let max = add((&hi, self.e.max()), SignedInfinity::PosInfinity, RoundingMode::TowardPositive);
    Interval::new_unchecked(min, max)
  }
}

impl From<FloatInterval> for ErrorSemantics {
  fn from(v: FloatInterval) -> ErrorSemantics {
    ErrorSemantics { v, e: Interval::point(Exact::zero()) }
  }
}

impl Lattice for ErrorSemantics {
  fn join(&self, other: &ErrorSemantics) -> ErrorSemantics {
    ErrorSemantics { v: self.v.join(&other.v), e: self.e.join(&other.e) }
  }

  fn meet(&self, other: &ErrorSemantics) -> Result<ErrorSemantics, InvalidIntervalError> {
    Ok(ErrorSemantics { v: self.v.meet(&other.v)?, e: self.e.meet(&other.e)? })
  }
}

/// `Equal` only for identical values. Otherwise ordered by worst-case
/// error, and incomparable when that error ties.
impl PartialOrd for ErrorSemantics {
  fn partial_cmp(&self, other: &ErrorSemantics) -> Option<Ordering> {
    if self == other {
      return Some(Ordering::Equal);
    }
    match self.cmp_accuracy(other) {
      Ordering::Equal => None,
      ord => Some(ord),
    }
  }
}

impl ops::Add for &ErrorSemantics {
  type Output = ErrorSemantics;

  fn add(self, other: &ErrorSemantics) -> ErrorSemantics {
    let v = &self.v + &other.v;
    let e = &(&self.e + &other.e) + &round_off_error(&v);
    ErrorSemantics { v, e }
  }
}

impl ops::Add for ErrorSemantics {
  type Output = ErrorSemantics;

  fn add(self, other: ErrorSemantics) -> ErrorSemantics {
    &self + &other
  }
}

impl ops::Sub for &ErrorSemantics {
  type Output = ErrorSemantics;

  fn sub(self, other: &ErrorSemantics) -> ErrorSemantics {
    let v = &self.v - &other.v;
    let e = &(&self.e - &other.e) + &round_off_error(&v);
    ErrorSemantics { v, e }
  }
}

impl ops::Sub for ErrorSemantics {
  type Output = ErrorSemantics;

  fn sub(self, other: ErrorSemantics) -> ErrorSemantics {
    &self - &other
  }
}

/// First-order propagation: `e1*e2 + round_off(v) + v1*e2 + v2*e1`,
/// with the value ranges taken exactly in the cross terms.
impl ops::Mul for &ErrorSemantics {
  type Output = ErrorSemantics;

  fn mul(self, other: &ErrorSemantics) -> ErrorSemantics {
    let v = &self.v * &other.v;
    let mut e = &(&self.e * &other.e) + &round_off_error(&v);
    e = &e + &(&self.v.to_exact() * &other.e);
    e = &e + &(&other.v.to_exact() * &self.e);
    ErrorSemantics { v, e }
  }
}

impl ops::Mul for ErrorSemantics {
  type Output = ErrorSemantics;

  fn mul(self, other: ErrorSemantics) -> ErrorSemantics {
    &self * &other
  }
}

/// Negation is exact, so it commits no round-off error.
impl ops::Neg for &ErrorSemantics {
  type Output = ErrorSemantics;

  fn neg(self) -> ErrorSemantics {
    ErrorSemantics { v: -&self.v, e: -&self.e }
  }
}

impl ops::Neg for ErrorSemantics {
  type Output = ErrorSemantics;

  fn neg(self) -> ErrorSemantics {
    ErrorSemantics { v: -self.v, e: -self.e }
  }
}

impl Display for ErrorSemantics {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}x{}", self.v, self.e)
  }
}
