use super::infinity::SignedInfinity;
use super::float::Float;

use num::{BigInt, BigRational, Zero, One, Signed};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use once_cell::sync::Lazy;
use regex::Regex;

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::ops;
use std::cmp::Ordering;

/// Decimal exponents beyond this magnitude are rejected by the
/// parser rather than expanded into enormous integers.
const MAX_DECIMAL_EXPONENT: i64 = 100_000;

/// An exact value: an arbitrary-precision rational, or a signed
/// infinity.
///
/// Infinities only arise as error bounds that could not be computed
/// (see [`ulp`](super::ulp)) and from floating values which
/// overflowed. Arithmetic between finite values never leaves the
/// rationals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exact {
  Finite(BigRational),
  Infinite(SignedInfinity),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid value {input}")]
pub struct ParseValueError {
  pub input: String,
}

/// Values which can be converted exactly to an [`Exact`].
///
/// Every finite floating value converts without loss. Text is parsed
/// with [`Exact::from_str`].
pub trait IntoExact {
  fn into_exact(self) -> Result<Exact, ParseValueError>;
}

impl Exact {
  pub fn zero() -> Exact {
    Exact::Finite(BigRational::zero())
  }

  pub fn one() -> Exact {
    Exact::Finite(BigRational::one())
  }

  /// The rational `numer / denom`.
  ///
  /// # Panics
  ///
  /// Panics if `denom` is zero.
  pub fn ratio(numer: impl Into<BigInt>, denom: impl Into<BigInt>) -> Exact {
    Exact::Finite(BigRational::new(numer.into(), denom.into()))
  }

  /// `2^k`, exactly.
  pub fn pow2(k: i64) -> Exact {
    Exact::Finite(pow2_rational(k))
  }

  pub fn is_finite(&self) -> bool {
    matches!(self, Exact::Finite(_))
  }

  pub fn is_zero(&self) -> bool {
    matches!(self, Exact::Finite(r) if r.is_zero())
  }

  pub fn is_negative(&self) -> bool {
    match self {
      Exact::Finite(r) => r.is_negative(),
      Exact::Infinite(inf) => inf.is_negative(),
    }
  }

  pub fn as_rational(&self) -> Option<&BigRational> {
    match self {
      Exact::Finite(r) => Some(r),
      Exact::Infinite(_) => None,
    }
  }

  pub fn abs(&self) -> Exact {
    match self {
      Exact::Finite(r) => Exact::Finite(r.abs()),
      Exact::Infinite(_) => Exact::Infinite(SignedInfinity::PosInfinity),
    }
  }

  /// `self + other`, except that the sum of opposite infinities, which
  /// has no value, is taken to be the infinity `toward`. Interval
  /// endpoints are added this way: lower bounds toward negative
  /// infinity, upper bounds toward positive infinity.
  pub fn add_toward(&self, other: &Exact, toward: SignedInfinity) -> Exact {
    match (self, other) {
      (Exact::Infinite(a), Exact::Infinite(b)) if a != b => Exact::Infinite(toward),
      _ => self + other,
    }
  }

  /// `self - other`, resolving an indeterminate difference as
  /// [`add_toward`](Exact::add_toward) does.
  pub fn sub_toward(&self, other: &Exact, toward: SignedInfinity) -> Exact {
    self.add_toward(&-other, toward)
  }

  /// The nearest `f64`, ties to even.
  pub fn to_f64(&self) -> f64 {
    Float::round_with(self, &super::NumericContext::DOUBLE).to_f64()
  }
}

pub(crate) fn pow2_rational(k: i64) -> BigRational {
  let magnitude = BigInt::one() << k.unsigned_abs();
  if k >= 0 {
    BigRational::from_integer(magnitude)
  } else {
    BigRational::new(BigInt::one(), magnitude)
  }
}

impl From<BigRational> for Exact {
  fn from(r: BigRational) -> Exact {
    Exact::Finite(r)
  }
}

impl From<BigInt> for Exact {
  fn from(i: BigInt) -> Exact {
    Exact::Finite(BigRational::from_integer(i))
  }
}

impl From<i64> for Exact {
  fn from(i: i64) -> Exact {
    Exact::from(BigInt::from(i))
  }
}

impl From<i32> for Exact {
  fn from(i: i32) -> Exact {
    Exact::from(BigInt::from(i))
  }
}

impl From<SignedInfinity> for Exact {
  fn from(inf: SignedInfinity) -> Exact {
    Exact::Infinite(inf)
  }
}

impl Default for Exact {
  fn default() -> Exact {
    Exact::zero()
  }
}

impl Ord for Exact {
  fn cmp(&self, other: &Exact) -> Ordering {
    match (self, other) {
      (Exact::Finite(a), Exact::Finite(b)) => a.cmp(b),
      (Exact::Infinite(a), Exact::Infinite(b)) => a.cmp(b),
      (Exact::Infinite(a), Exact::Finite(_)) =>
        if a.is_negative() { Ordering::Less } else { Ordering::Greater },
      (Exact::Finite(_), Exact::Infinite(b)) =>
        if b.is_negative() { Ordering::Greater } else { Ordering::Less },
    }
  }
}

impl PartialOrd for Exact {
  fn partial_cmp(&self, other: &Exact) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

/// # Panics
///
/// Adding infinities of opposite sign has no meaningful result and
/// panics. Use [`Exact::add_toward`] where either operand may be an
/// overflowed bound.
impl ops::Add for Exact {
  type Output = Exact;

  fn add(self, other: Exact) -> Exact {
    match (self, other) {
      (Exact::Finite(a), Exact::Finite(b)) => Exact::Finite(a + b),
      (Exact::Infinite(a), Exact::Finite(_)) | (Exact::Finite(_), Exact::Infinite(a)) =>
        Exact::Infinite(a),
      (Exact::Infinite(a), Exact::Infinite(b)) => {
        assert_eq!(a, b, "Sum of opposite infinities is undefined");
        Exact::Infinite(a)
      }
    }
  }
}

impl ops::Add for &Exact {
  type Output = Exact;

  fn add(self, other: &Exact) -> Exact {
    self.clone() + other.clone()
  }
}

impl ops::Sub for Exact {
  type Output = Exact;

  fn sub(self, other: Exact) -> Exact {
    self + (- other)
  }
}

impl ops::Sub for &Exact {
  type Output = Exact;

  fn sub(self, other: &Exact) -> Exact {
    self.clone() - other.clone()
  }
}

/// Zero times an infinity is zero. An infinite error bound on a
/// quantity known to vanish contributes nothing.
impl ops::Mul for Exact {
  type Output = Exact;

  fn mul(self, other: Exact) -> Exact {
    match (self, other) {
      (Exact::Finite(a), Exact::Finite(b)) => Exact::Finite(a * b),
      (Exact::Infinite(a), Exact::Infinite(b)) => Exact::Infinite(a * b),
      (Exact::Infinite(inf), Exact::Finite(r)) | (Exact::Finite(r), Exact::Infinite(inf)) => {
        if r.is_zero() {
          Exact::zero()
        } else {
          Exact::Infinite(inf * SignedInfinity::with_sign(r.is_negative()))
        }
      }
    }
  }
}

impl ops::Mul for &Exact {
  type Output = Exact;

  fn mul(self, other: &Exact) -> Exact {
    self.clone() * other.clone()
  }
}

impl ops::Neg for Exact {
  type Output = Exact;

  fn neg(self) -> Exact {
    match self {
      Exact::Finite(r) => Exact::Finite(-r),
      Exact::Infinite(inf) => Exact::Infinite(-inf),
    }
  }
}

impl ops::Neg for &Exact {
  type Output = Exact;

  fn neg(self) -> Exact {
    self.clone().neg()
  }
}

impl Display for Exact {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Exact::Finite(r) => write!(f, "{}", r),
      Exact::Infinite(inf) => write!(f, "{}", inf),
    }
  }
}

impl FromStr for Exact {
  type Err = ParseValueError;

  fn from_str(s: &str) -> Result<Exact, ParseValueError> {
    let s = s.trim();
    parse_infinity(s).or_else(|| {
      parse_ratio(s)
    }).or_else(|| {
      parse_decimal(s)
    }).ok_or_else(|| ParseValueError { input: s.to_owned() })
  }
}

fn parse_infinity(s: &str) -> Option<Exact> {
  static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([+-]?)(?i:inf|infinity)$").unwrap());
  let caps = RE.captures(s)?;
  Some(Exact::Infinite(SignedInfinity::with_sign(&caps[1] == "-")))
}

fn parse_ratio(s: &str) -> Option<Exact> {
  static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([+-]?\d+)\s*/\s*([+-]?\d+)$").unwrap());
  let caps = RE.captures(s)?;
  let numerator = BigInt::from_str(&caps[1]).ok()?;
  let denominator = BigInt::from_str(&caps[2]).ok()?;
  if denominator.is_zero() {
    return None;
  }
  Some(Exact::Finite(BigRational::new(numerator, denominator)))
}

/// Decimal notation, read exactly: `0.1` is one tenth, not the binary
/// floating value nearest to it.
fn parse_decimal(s: &str) -> Option<Exact> {
  static RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?)(\d*)(?:\.(\d*))?(?:[eE]([+-]?\d+))?$").unwrap()
  });
  let caps = RE.captures(s)?;
  let integral = caps.get(2).map_or("", |m| m.as_str());
  let fractional = caps.get(3).map_or("", |m| m.as_str());
  if integral.is_empty() && fractional.is_empty() {
    return None;
  }
  let exponent = match caps.get(4) {
    None => 0,
    Some(m) => m.as_str().parse::<i64>().ok()?,
  };
  if exponent.abs() > MAX_DECIMAL_EXPONENT {
    return None;
  }
  let digits = format!("{}{}", integral, fractional);
  let mut mantissa = BigInt::from_str(&digits).ok()?;
  if &caps[1] == "-" {
    mantissa = -mantissa;
  }
  let scale = exponent - fractional.len() as i64;
  let ten = BigInt::from(10);
  let power = num::pow(ten, scale.unsigned_abs() as usize);
  let value = if scale >= 0 {
    BigRational::from_integer(mantissa * power)
  } else {
    BigRational::new(mantissa, power)
  };
  Some(Exact::Finite(value))
}

impl IntoExact for Exact {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    Ok(self)
  }
}

impl IntoExact for &Exact {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    Ok(self.clone())
  }
}

impl IntoExact for Float {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    Ok(self.to_exact())
  }
}

impl IntoExact for &Float {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    Ok(self.to_exact())
  }
}

impl IntoExact for BigRational {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    Ok(Exact::Finite(self))
  }
}

impl IntoExact for BigInt {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    Ok(Exact::from(self))
  }
}

impl IntoExact for i32 {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    Ok(Exact::from(self))
  }
}

impl IntoExact for i64 {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    Ok(Exact::from(self))
  }
}

/// Machine floats convert exactly. NaN has no exact value.
impl IntoExact for f64 {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    if self.is_infinite() {
      return Ok(Exact::Infinite(SignedInfinity::with_sign(self < 0.0)));
    }
    BigRational::from_float(self)
      .map(Exact::Finite)
      .ok_or_else(|| ParseValueError { input: self.to_string() })
  }
}

impl IntoExact for f32 {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    f64::from(self).into_exact()
  }
}

impl IntoExact for &str {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    Exact::from_str(self)
  }
}

impl IntoExact for String {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    Exact::from_str(&self)
  }
}

impl IntoExact for &String {
  fn into_exact(self) -> Result<Exact, ParseValueError> {
    Exact::from_str(self)
  }
}
