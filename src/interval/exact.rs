use super::{Interval, FloatInterval, Endpoint};
use crate::error::Error;
use crate::numeric::{Exact, Float, IntoExact, SignedInfinity};

use std::fmt::{self, Display, Formatter};

/// An interval whose bounds are exact values. No rounding ever takes
/// place in exact interval arithmetic.
pub type ExactInterval = Interval<Exact>;

impl Interval<Exact> {
  pub fn from_values(min: impl IntoExact, max: impl IntoExact) -> Result<ExactInterval, Error> {
    Ok(Interval::new(min.into_exact()?, max.into_exact()?)?)
  }

  /// `[-radius, radius]`. A negative radius is taken by magnitude.
  pub fn symmetric(radius: Exact) -> ExactInterval {
    let radius = radius.abs();
    Interval::new_unchecked(-&radius, radius)
  }

  /// The larger of the absolute values of the two bounds.
  pub fn magnitude(&self) -> Exact {
    self.min().abs().max(self.max().abs())
  }
}

impl Endpoint for Exact {
  fn add_toward(&self, other: &Exact, toward: SignedInfinity) -> Exact {
    Exact::add_toward(self, other, toward)
  }

  fn sub_toward(&self, other: &Exact, toward: SignedInfinity) -> Exact {
    Exact::sub_toward(self, other, toward)
  }
}

impl From<&FloatInterval> for ExactInterval {
  fn from(interval: &FloatInterval) -> ExactInterval {
    interval.clone().map_monotone(|x| x.to_exact())
  }
}

impl From<FloatInterval> for ExactInterval {
  fn from(interval: FloatInterval) -> ExactInterval {
    ExactInterval::from(&interval)
  }
}

/// Each bound is shown as its nearest floating value in the ambient
/// context, marked with `~` since the shown value is approximate.
impl Display for Interval<Exact> {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "[~{}, ~{}]", Float::round(self.min()), Float::round(self.max()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::interval::Lattice;
  use crate::numeric::SignedInfinity;

  #[test]
  fn test_from_values_is_exact() {
    let interval = ExactInterval::from_values("0.1", "1/3").unwrap();
    assert_eq!(interval.min(), &Exact::ratio(1, 10));
    assert_eq!(interval.max(), &Exact::ratio(1, 3));
    assert!(matches!(ExactInterval::from_values("1/3", "0.1"), Err(Error::InvalidInterval(_))));
  }

  #[test]
  fn test_symmetric() {
    let interval = ExactInterval::symmetric(Exact::ratio(-1, 4));
    assert_eq!(interval.min(), &Exact::ratio(-1, 4));
    assert_eq!(interval.max(), &Exact::ratio(1, 4));
    let unbounded = ExactInterval::symmetric(Exact::Infinite(SignedInfinity::PosInfinity));
    assert_eq!(unbounded.min(), &Exact::Infinite(SignedInfinity::NegInfinity));
  }

  #[test]
  fn test_from_float_interval() {
    let floats = FloatInterval::from_values("0.5", "0.75").unwrap();
    assert_eq!(ExactInterval::from(&floats), ExactInterval::from_values("1/2", "3/4").unwrap());
  }

  #[test]
  fn test_exact_arithmetic_does_not_round() {
    let a = ExactInterval::from_values("1/3", "1/2").unwrap();
    let b = ExactInterval::from_values("1/7", "1").unwrap();
    assert_eq!(&a + &b, ExactInterval::from_values("10/21", "3/2").unwrap());
    assert_eq!(&a * &b, ExactInterval::from_values("1/21", "1/2").unwrap());
    assert_eq!(a.join(&b), ExactInterval::from_values("1/7", "1").unwrap());
  }

  #[test]
  fn test_magnitude() {
    assert_eq!(ExactInterval::from_values(-5, 2).unwrap().magnitude(), Exact::from(5));
  }

  #[test]
  fn test_display() {
    let interval = ExactInterval::from_values("-0.5", "1/4").unwrap();
    assert_eq!(interval.to_string(), "[~-0.5, ~0.25]");
  }
}
