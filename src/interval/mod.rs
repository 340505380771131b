//! Closed intervals, the lattice they form, and interval arithmetic.

mod exact;
mod float;

pub use exact::ExactInterval;
pub use float::FloatInterval;

use crate::numeric::SignedInfinity;

use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use thiserror::Error;

use std::fmt::Display;
use std::ops::{Add, Sub, Mul, Neg};

/// A closed, nonempty interval `[min, max]`.
///
/// Intervals are always valid: `min <= max` is checked at
/// construction and preserved by every operation on this type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Interval<T> {
  min: T,
  max: T,
}

/// An interval was requested whose lower bound exceeds its upper
/// bound. This is also how `meet` reports that two intervals are
/// disjoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid interval: min {min} exceeds max {max}")]
pub struct InvalidIntervalError {
  pub min: String,
  pub max: String,
}

/// A lattice whose meet may fail, since the domains here have no
/// bottom element to represent an empty intersection.
pub trait Lattice: Sized {
  /// The least upper bound. Always defined.
  fn join(&self, other: &Self) -> Self;

  /// The greatest lower bound, if there is one.
  fn meet(&self, other: &Self) -> Result<Self, InvalidIntervalError>;
}

/// Arithmetic on interval bounds. Bounds may be infinite, and a sum
/// of opposite infinities has no value of its own; it resolves to the
/// infinity `toward`, which is always the outward direction of the
/// bound being computed.
pub trait Endpoint: Sized {
  fn add_toward(&self, other: &Self, toward: SignedInfinity) -> Self;
  fn sub_toward(&self, other: &Self, toward: SignedInfinity) -> Self;
}

impl<T: Ord + Display> Interval<T> {
  pub fn new(min: T, max: T) -> Result<Self, InvalidIntervalError> {
    if min > max {
      return Err(InvalidIntervalError { min: min.to_string(), max: max.to_string() });
    }
    Ok(Self { min, max })
  }
}

impl<T> Interval<T> {
  /// Builds an interval whose bounds the caller already knows to be
  /// in order.
  pub(crate) fn new_unchecked(min: T, max: T) -> Self {
    Self { min, max }
  }

  pub fn point(value: T) -> Self where T: Clone {
    Self { min: value.clone(), max: value }
  }

  pub fn min(&self) -> &T {
    &self.min
  }

  pub fn max(&self) -> &T {
    &self.max
  }

  pub fn into_bounds(self) -> (T, T) {
    (self.min, self.max)
  }

  pub fn contains(&self, value: &T) -> bool where T: Ord {
    &self.min <= value && value <= &self.max
  }

  /// `max - min`. An interval with both bounds on the same infinity
  /// has infinite width.
  pub fn width(&self) -> T where T: Endpoint {
    self.max.sub_toward(&self.min, SignedInfinity::PosInfinity)
  }

  /// Whether `other` lies entirely within this interval.
  pub fn encloses(&self, other: &Interval<T>) -> bool where T: Ord {
    self.min <= other.min && other.max <= self.max
  }

  /// Applies a unary, monotone (order-preserving) function to both
  /// bounds. It is the caller's responsibility to ensure that the
  /// function is monotone.
  pub fn map_monotone<F, U>(self, f: F) -> Interval<U>
  where F: Fn(T) -> U {
    Interval { min: f(self.min), max: f(self.max) }
  }
}

impl<T: Ord + Clone + Display> Lattice for Interval<T> {
  fn join(&self, other: &Self) -> Self {
    Interval {
      min: (&self.min).min(&other.min).clone(),
      max: (&self.max).max(&other.max).clone(),
    }
  }

  fn meet(&self, other: &Self) -> Result<Self, InvalidIntervalError> {
    Interval::new(
      (&self.min).max(&other.min).clone(),
      (&self.max).min(&other.max).clone(),
    )
  }
}

impl<T: Endpoint> Add for &Interval<T> {
  type Output = Interval<T>;

  fn add(self, other: &Interval<T>) -> Interval<T> {
    Interval::new_unchecked(
      self.min.add_toward(&other.min, SignedInfinity::NegInfinity),
      self.max.add_toward(&other.max, SignedInfinity::PosInfinity),
    )
  }
}

impl<T: Endpoint> Add for Interval<T> {
  type Output = Interval<T>;

  fn add(self, other: Interval<T>) -> Interval<T> {
    &self + &other
  }
}

impl<T: Endpoint> Sub for &Interval<T> {
  type Output = Interval<T>;

  fn sub(self, other: &Interval<T>) -> Interval<T> {
    Interval::new_unchecked(
      self.min.sub_toward(&other.max, SignedInfinity::NegInfinity),
      self.max.sub_toward(&other.min, SignedInfinity::PosInfinity),
    )
  }
}

impl<T: Endpoint> Sub for Interval<T> {
  type Output = Interval<T>;

  fn sub(self, other: Interval<T>) -> Interval<T> {
    &self - &other
  }
}

/// Negation swaps the bounds.
impl<T: Neg<Output = T>> Neg for Interval<T> {
  type Output = Interval<T>;

  fn neg(self) -> Interval<T> {
    Interval::new_unchecked(-self.max, -self.min)
  }
}

impl<'a, T> Neg for &'a Interval<T>
where &'a T: Neg<Output = T> {
  type Output = Interval<T>;

  fn neg(self) -> Interval<T> {
    Interval::new_unchecked(-&self.max, -&self.min)
  }
}

/// General-case multiplication: the hull of all four endpoint
/// products. Signs are not special-cased.
impl<'a, T> Mul for &'a Interval<T>
where &'a T: Mul<Output = T>,
      T: Ord + Clone {
  type Output = Interval<T>;

  fn mul(self, other: &'a Interval<T>) -> Interval<T> {
    let products = [
      &self.min * &other.min,
      &self.min * &other.max,
      &self.max * &other.min,
      &self.max * &other.max,
    ];
    match products.into_iter().minmax() {
      MinMaxResult::MinMax(min, max) => Interval::new_unchecked(min, max),
      MinMaxResult::OneElement(x) => Interval::point(x),
      MinMaxResult::NoElements => unreachable!("four products"),
    }
  }
}

impl<T> Mul for Interval<T>
where for<'a> &'a T: Mul<Output = T>,
      T: Ord + Clone {
  type Output = Interval<T>;

  fn mul(self, other: Interval<T>) -> Interval<T> {
    &self * &other
  }
}
