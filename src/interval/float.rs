use super::{Interval, ExactInterval, Endpoint};
use crate::error::Error;
use crate::numeric::{Float, IntoExact, RoundingMode, SignedInfinity};
use crate::numeric::context;

use std::fmt::{self, Display, Formatter};

/// An interval whose bounds are floating values of the working
/// precision.
///
/// Arithmetic on floating intervals rounds each bound under the
/// ambient context, exactly as the floating operations themselves
/// would. Rounding is monotone, so the result is always a valid
/// interval.
pub type FloatInterval = Interval<Float>;

impl Interval<Float> {
  /// Rounds `min` and `max` to the working precision and builds the
  /// interval between them.
  pub fn from_values(min: impl IntoExact, max: impl IntoExact) -> Result<FloatInterval, Error> {
    let min = Float::round(&min.into_exact()?);
    let max = Float::round(&max.into_exact()?);
    Ok(Interval::new(min, max)?)
  }

  /// Rounds the bounds of an exact interval under the ambient context.
  pub fn round(interval: &ExactInterval) -> FloatInterval {
    interval.clone().map_monotone(|x| Float::round(&x))
  }

  /// The smallest floating interval containing every value of
  /// `interval`.
  pub fn enclosing(interval: &ExactInterval) -> FloatInterval {
    let ctx = context::current();
    Interval::new_unchecked(
      Float::round_with(interval.min(), &ctx.with_rounding(RoundingMode::TowardNegative)),
      Float::round_with(interval.max(), &ctx.with_rounding(RoundingMode::TowardPositive)),
    )
  }

  /// The same interval, with bounds re-rounded to the ambient
  /// precision. Bounds built under a wider context lose their excess
  /// bits here.
  pub fn rerounded(&self) -> FloatInterval {
    self.clone().map_monotone(|x| Float::round(&x.to_exact()))
  }

  /// The larger of the absolute values of the two bounds.
  pub fn magnitude(&self) -> Float {
    self.min().abs().max(self.max().abs())
  }

  pub fn to_exact(&self) -> ExactInterval {
    ExactInterval::from(self)
  }
}

/// Bounds are rounded under the ambient context, as the floating
/// operations themselves are.
impl Endpoint for Float {
  fn add_toward(&self, other: &Float, toward: SignedInfinity) -> Float {
    Float::add_toward(self, other, toward)
  }

  fn sub_toward(&self, other: &Float, toward: SignedInfinity) -> Float {
    Float::sub_toward(self, other, toward)
  }
}

impl Display for Interval<Float> {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "[{}, {}]", self.min(), self.max())
  }
}
