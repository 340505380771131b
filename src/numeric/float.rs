use super::context::{self, NumericContext, RoundingMode};
use super::exact::Exact;
use super::infinity::SignedInfinity;

use num::{BigInt, BigRational, Integer, Zero, One, Signed, ToPrimitive};
use approx::{AbsDiffEq, RelativeEq, UlpsEq};
use serde::Serialize;

use std::fmt::{self, Display, Formatter};
use std::ops;
use std::cmp::Ordering;

/// A binary floating value, bound to the precision and exponent range
/// of the context it was rounded under.
///
/// Finite values are stored as `mantissa * 2^exponent` with an odd
/// mantissa (or a zero mantissa and exponent for zero), so equal
/// values always have equal representations. There is no NaN and no
/// negative zero.
///
/// Every arithmetic operation computes its exact result and then
/// rounds once, under the ambient [`NumericContext`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Float {
  inner: FloatImpl,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
enum FloatImpl {
  Finite { mantissa: BigInt, exponent: i64 },
  Infinite(SignedInfinity),
}

impl Float {
  pub fn zero() -> Float {
    Float { inner: FloatImpl::Finite { mantissa: BigInt::zero(), exponent: 0 } }
  }

  pub fn infinity(sign: SignedInfinity) -> Float {
    Float { inner: FloatImpl::Infinite(sign) }
  }

  /// `mantissa * 2^exponent`, which must already be representable.
  fn from_parts(mantissa: BigInt, exponent: i64) -> Float {
    if mantissa.is_zero() {
      return Float::zero();
    }
    let shift = mantissa.trailing_zeros().unwrap_or(0);
    Float {
      inner: FloatImpl::Finite { mantissa: mantissa >> shift, exponent: exponent + shift as i64 },
    }
  }

  /// Rounds an exact value under the ambient context.
  pub fn round(value: &Exact) -> Float {
    Float::round_with(value, &context::current())
  }

  /// Rounds an exact value under an explicit context.
  pub fn round_with(value: &Exact, ctx: &NumericContext) -> Float {
    match value {
      Exact::Infinite(inf) => Float::infinity(*inf),
      Exact::Finite(r) => round_rational(r, ctx),
    }
  }

  pub fn to_exact(&self) -> Exact {
    match &self.inner {
      FloatImpl::Infinite(inf) => Exact::Infinite(*inf),
      FloatImpl::Finite { mantissa, exponent } => {
        Exact::Finite(BigRational::from_integer(mantissa.clone()) * super::exact::pow2_rational(*exponent))
      }
    }
  }

  /// The canonical `(mantissa, exponent)` pair, with an odd mantissa.
  /// `None` for infinities.
  pub fn as_mantissa_exp(&self) -> Option<(&BigInt, i64)> {
    match &self.inner {
      FloatImpl::Finite { mantissa, exponent } => Some((mantissa, *exponent)),
      FloatImpl::Infinite(_) => None,
    }
  }

  pub fn is_finite(&self) -> bool {
    matches!(self.inner, FloatImpl::Finite { .. })
  }

  pub fn is_zero(&self) -> bool {
    matches!(&self.inner, FloatImpl::Finite { mantissa, .. } if mantissa.is_zero())
  }

  pub fn is_negative(&self) -> bool {
    match &self.inner {
      FloatImpl::Finite { mantissa, .. } => mantissa.is_negative(),
      FloatImpl::Infinite(inf) => inf.is_negative(),
    }
  }

  pub fn abs(&self) -> Float {
    match &self.inner {
      FloatImpl::Finite { mantissa, exponent } =>
        Float { inner: FloatImpl::Finite { mantissa: mantissa.abs(), exponent: *exponent } },
      FloatImpl::Infinite(_) => Float::infinity(SignedInfinity::PosInfinity),
    }
  }

  /// The rounded sum, with the sum of opposite infinities taken to be
  /// the infinity `toward`. See [`Exact::add_toward`].
  pub fn add_toward(&self, other: &Float, toward: SignedInfinity) -> Float {
    Float::round(&self.to_exact().add_toward(&other.to_exact(), toward))
  }

  pub fn sub_toward(&self, other: &Float, toward: SignedInfinity) -> Float {
    Float::round(&self.to_exact().sub_toward(&other.to_exact(), toward))
  }

  /// The unit in the last place of this value, relative to the
  /// ambient context.
  pub fn ulp(&self) -> Exact {
    super::ulp(&self.to_exact())
  }

  /// Converts to the nearest `f64`, ties to even.
  pub fn to_f64(&self) -> f64 {
    let double = Float::round_with(&self.to_exact(), &NumericContext::DOUBLE);
    match &double.inner {
      FloatImpl::Infinite(inf) => inf.to_f64(),
      FloatImpl::Finite { mantissa, exponent } => {
        // At most 53 bits, so the conversion is exact. The scaling is
        // split so that neither factor leaves the range of f64.
        let m = mantissa.to_f64().unwrap_or(f64::NAN);
        let half = (*exponent / 2) as i32;
        let rest = (*exponent - *exponent / 2) as i32;
        m * 2f64.powi(half) * 2f64.powi(rest)
      }
    }
  }

  /// The largest finite magnitude of the context, with the given sign.
  fn max_finite(ctx: &NumericContext, negative: bool) -> Float {
    let precision = ctx.precision();
    let mantissa = (BigInt::one() << precision) - BigInt::one();
    let mantissa = if negative { -mantissa } else { mantissa };
    Float::from_parts(mantissa, ctx.emax() - i64::from(precision))
  }

  /// The result of an overflow in the given direction, which depends
  /// on the rounding mode.
  fn overflow(ctx: &NumericContext, negative: bool) -> Float {
    let to_infinity = match ctx.rounding() {
      RoundingMode::Nearest | RoundingMode::AwayFromZero => true,
      RoundingMode::TowardZero => false,
      RoundingMode::TowardPositive => !negative,
      RoundingMode::TowardNegative => negative,
    };
    if to_infinity {
      Float::infinity(SignedInfinity::with_sign(negative))
    } else {
      Float::max_finite(ctx, negative)
    }
  }
}

/// `floor(log2(n / d))` for positive `n` and `d`.
fn floor_log2(n: &BigInt, d: &BigInt) -> i64 {
  let k = n.bits() as i64 - d.bits() as i64;
  // 2^(k-1) < n/d < 2^(k+1); one comparison settles which side of 2^k.
  let below = if k >= 0 {
    n < &(d << (k as u64))
  } else {
    &(n << (k.unsigned_abs())) < d
  };
  if below { k - 1 } else { k }
}

fn round_rational(r: &BigRational, ctx: &NumericContext) -> Float {
  if r.is_zero() {
    return Float::zero();
  }
  let negative = r.is_negative();
  let n = r.numer().abs();
  let d = r.denom().clone();

  let k = floor_log2(&n, &d);
  let lsb = (k - i64::from(ctx.precision()) + 1).max(ctx.min_lsb());

  let (num, den) = if lsb <= 0 {
    (n << lsb.unsigned_abs(), d)
  } else {
    (n, d << (lsb as u64))
  };
  let (mut mantissa, remainder) = num.div_rem(&den);

  let inexact = !remainder.is_zero();
  let round_up = inexact && match ctx.rounding() {
    RoundingMode::Nearest => {
      let twice: BigInt = remainder << 1u32;
      match twice.cmp(&den) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => mantissa.is_odd(),
      }
    }
    RoundingMode::TowardZero => false,
    RoundingMode::AwayFromZero => true,
    RoundingMode::TowardPositive => !negative,
    RoundingMode::TowardNegative => negative,
  };
  if round_up {
    mantissa += 1u32;
  }

  if !mantissa.is_zero() && mantissa.bits() as i64 + lsb > ctx.emax() {
    return Float::overflow(ctx, negative);
  }
  if negative {
    mantissa = -mantissa;
  }
  Float::from_parts(mantissa, lsb)
}

impl From<f64> for Float {
  /// Exact conversion. NaN has no counterpart and is taken to be
  /// positive infinity.
  fn from(x: f64) -> Float {
    if x.is_nan() || x.is_infinite() {
      return Float::infinity(SignedInfinity::with_sign(x < 0.0));
    }
    match BigRational::from_float(x) {
      Some(r) => {
        let numer = r.numer().clone();
        let shift = r.denom().trailing_zeros().unwrap_or(0);
        Float::from_parts(numer, -(shift as i64))
      }
      None => Float::zero(),
    }
  }
}

impl From<f32> for Float {
  fn from(x: f32) -> Float {
    Float::from(f64::from(x))
  }
}

impl Default for Float {
  fn default() -> Float {
    Float::zero()
  }
}

impl Ord for Float {
  fn cmp(&self, other: &Float) -> Ordering {
    self.to_exact().cmp(&other.to_exact())
  }
}

impl PartialOrd for Float {
  fn partial_cmp(&self, other: &Float) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

/// # Panics
///
/// Panics when adding infinities of opposite sign.
impl ops::Add for &Float {
  type Output = Float;

  fn add(self, other: &Float) -> Float {
    Float::round(&(self.to_exact() + other.to_exact()))
  }
}

impl ops::Add for Float {
  type Output = Float;

  fn add(self, other: Float) -> Float {
    &self + &other
  }
}

impl ops::Sub for &Float {
  type Output = Float;

  fn sub(self, other: &Float) -> Float {
    Float::round(&(self.to_exact() - other.to_exact()))
  }
}

impl ops::Sub for Float {
  type Output = Float;

  fn sub(self, other: Float) -> Float {
    &self - &other
  }
}

impl ops::Mul for &Float {
  type Output = Float;

  fn mul(self, other: &Float) -> Float {
    Float::round(&(self.to_exact() * other.to_exact()))
  }
}

impl ops::Mul for Float {
  type Output = Float;

  fn mul(self, other: Float) -> Float {
    &self * &other
  }
}

/// Negation is exact.
impl ops::Neg for Float {
  type Output = Float;

  fn neg(self) -> Float {
    match self.inner {
      FloatImpl::Finite { mantissa, exponent } =>
        Float { inner: FloatImpl::Finite { mantissa: -mantissa, exponent } },
      FloatImpl::Infinite(inf) => Float::infinity(-inf),
    }
  }
}

impl ops::Neg for &Float {
  type Output = Float;

  fn neg(self) -> Float {
    self.clone().neg()
  }
}

/// Values exactly representable as `f64` print in the shortest form
/// that reads back to the same `f64`. Anything else prints as
/// `mantissa*2^exponent`.
impl Display for Float {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match &self.inner {
      FloatImpl::Infinite(inf) => write!(f, "{}", inf),
      FloatImpl::Finite { mantissa, exponent } => {
        let approx = self.to_f64();
        if approx.is_finite() && Float::from(approx) == *self {
          write!(f, "{}", approx)
        } else {
          write!(f, "{}*2^{}", mantissa, exponent)
        }
      }
    }
  }
}

impl AbsDiffEq for Float {
  type Epsilon = f64;

  fn default_epsilon() -> f64 {
    f64::default_epsilon()
  }

  fn abs_diff_eq(&self, other: &Float, epsilon: f64) -> bool {
    self.to_f64().abs_diff_eq(&other.to_f64(), epsilon)
  }
}

impl RelativeEq for Float {
  fn default_max_relative() -> f64 {
    f64::default_max_relative()
  }

  fn relative_eq(&self, other: &Float, epsilon: f64, max_relative: f64) -> bool {
    self.to_f64().relative_eq(&other.to_f64(), epsilon, max_relative)
  }
}

impl UlpsEq for Float {
  fn default_max_ulps() -> u32 {
    f64::default_max_ulps()
  }

  fn ulps_eq(&self, other: &Float, epsilon: f64, max_ulps: u32) -> bool {
    self.to_f64().ulps_eq(&other.to_f64(), epsilon, max_ulps)
  }
}
