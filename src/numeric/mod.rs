//! Exact values, floating values, and conversions between them.

pub mod context;
pub mod exact;
pub mod float;
pub mod infinity;

pub use context::{NumericContext, RoundingMode, InvalidContextError, rounding_scoped};
pub use exact::{Exact, IntoExact, ParseValueError};
pub use float::Float;
pub use infinity::SignedInfinity;

/// Converts any finite floating value, rational, integer, or numeric
/// text to its exact value.
pub fn to_exact(value: impl IntoExact) -> Result<Exact, ParseValueError> {
  value.into_exact()
}

/// The unit in the last place of `value` under the ambient context:
/// the weight of the least significant mantissa bit once `value` is
/// rounded away from zero to a floating value.
///
/// Rounding away from zero can only move `value` into a higher binade,
/// so the result never underestimates the spacing of floating values
/// near `value`. Zero has the smallest positive value as its ulp. If
/// the rounded value overflows, the result is positive infinity.
pub fn ulp(value: &Exact) -> Exact {
  let ctx = context::current();
  let rounded = Float::round_with(value, &ctx.with_rounding(RoundingMode::AwayFromZero));
  match rounded.as_mantissa_exp() {
    None => Exact::Infinite(SignedInfinity::PosInfinity),
    Some((mantissa, exponent)) if mantissa.bits() == 0 => {
      debug_assert_eq!(exponent, 0);
      Exact::pow2(ctx.min_lsb())
    }
    Some((mantissa, exponent)) => {
      let magnitude = mantissa.bits() as i64 - 1 + exponent;
      let lsb = (magnitude - i64::from(ctx.precision()) + 1).max(ctx.min_lsb());
      Exact::pow2(lsb)
    }
  }
}
