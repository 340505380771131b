//! The ambient numeric context.
//!
//! Every floating-point construction and every ulp computation is
//! performed relative to the context installed on the current thread:
//! a working precision, an exponent range, and a rounding mode.
//! Worker threads each start from [`NumericContext::default`] and
//! never observe each other's overrides.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use std::cell::Cell;
use std::convert::TryFrom;
use std::marker::PhantomData;

/// Smallest significand width accepted by [`NumericContext::new`].
pub const MIN_PRECISION: u32 = 2;

/// How an exact value is rounded to the nearest representable
/// floating value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
  /// Round to nearest, ties to even.
  #[default]
  Nearest,
  TowardZero,
  TowardPositive,
  TowardNegative,
  AwayFromZero,
}

/// Working precision and exponent range of floating values.
///
/// A finite nonzero floating value is `m * 2^e` where `|m| <
/// 2^precision`. Magnitudes at or above `2^emax` overflow, and the
/// smallest positive magnitude is `2^(emin - 1)`; values below the
/// normal range lose precision gradually, as with IEEE subnormals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ContextConfig")]
pub struct NumericContext {
  precision: u32,
  emin: i64,
  emax: i64,
  rounding: RoundingMode,
}

/// Unvalidated form of [`NumericContext`], as it appears in
/// configuration files.
#[derive(Debug, Clone, Deserialize)]
struct ContextConfig {
  precision: u32,
  emin: i64,
  emax: i64,
  #[serde(default)]
  rounding: RoundingMode,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidContextError {
  #[error("Precision must be at least {MIN_PRECISION} bits, got {0}")]
  PrecisionTooSmall(u32),
  #[error("Empty exponent range: emin = {emin}, emax = {emax}")]
  EmptyExponentRange { emin: i64, emax: i64 },
  #[error("No IEEE interchange format is {0} bits wide")]
  UnsupportedWidth(u32),
  #[error("Malformed context configuration: {0}")]
  Malformed(String),
}

thread_local! {
  static CONTEXT: Cell<NumericContext> = const { Cell::new(NumericContext::DOUBLE) };
}

/// Restores the previously installed context when dropped. Returned
/// by [`enter`].
#[must_use = "the context is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ContextGuard {
  previous: NumericContext,
  // The guard restores a thread-local, so it must stay on this thread.
  _not_send: PhantomData<*const ()>,
}

impl NumericContext {
  /// IEEE-754 binary32.
  pub const SINGLE: NumericContext = NumericContext {
    precision: 24,
    emin: -148,
    emax: 128,
    rounding: RoundingMode::Nearest,
  };

  /// IEEE-754 binary64.
  pub const DOUBLE: NumericContext = NumericContext {
    precision: 53,
    emin: -1073,
    emax: 1024,
    rounding: RoundingMode::Nearest,
  };

  pub fn new(precision: u32, emin: i64, emax: i64) -> Result<Self, InvalidContextError> {
    if precision < MIN_PRECISION {
      return Err(InvalidContextError::PrecisionTooSmall(precision));
    }
    if emin >= emax {
      return Err(InvalidContextError::EmptyExponentRange { emin, emax });
    }
    Ok(Self { precision, emin, emax, rounding: RoundingMode::Nearest })
  }

  /// The context of the IEEE-754 interchange format which is `bits`
  /// wide. Supported widths are 16, 32, 64, and any multiple of 32
  /// from 128 upward.
  pub fn ieee(bits: u32) -> Result<Self, InvalidContextError> {
    let (precision, emax) = match bits {
      16 => (11, 16),
      32 => (24, 128),
      64 => (53, 1024),
      _ if bits >= 128 && bits % 32 == 0 => {
        let precision = bits - (4.0 * f64::from(bits).log2()).round() as u32 + 13;
        let shift = bits - precision - 1;
        if shift >= 62 {
          return Err(InvalidContextError::UnsupportedWidth(bits));
        }
        (precision, 1i64 << shift)
      }
      _ => return Err(InvalidContextError::UnsupportedWidth(bits)),
    };
    let emin = 4 - emax - i64::from(precision);
    NumericContext::new(precision, emin, emax)
  }

  pub fn precision(&self) -> u32 {
    self.precision
  }

  pub fn emin(&self) -> i64 {
    self.emin
  }

  pub fn emax(&self) -> i64 {
    self.emax
  }

  pub fn rounding(&self) -> RoundingMode {
    self.rounding
  }

  pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
    self.rounding = rounding;
    self
  }

  pub fn with_precision(mut self, precision: u32) -> Result<Self, InvalidContextError> {
    if precision < MIN_PRECISION {
      return Err(InvalidContextError::PrecisionTooSmall(precision));
    }
    self.precision = precision;
    Ok(self)
  }

  /// Reads a context from a JSON object with `precision`, `emin`,
  /// `emax`, and optionally `rounding` fields.
  pub fn from_json(json: &str) -> Result<Self, InvalidContextError> {
    let config: ContextConfig = serde_json::from_str(json)
      .map_err(|err| InvalidContextError::Malformed(err.to_string()))?;
    NumericContext::try_from(config)
  }

  /// The exponent of the least significant bit of the smallest
  /// positive value.
  pub(crate) fn min_lsb(&self) -> i64 {
    self.emin - 1
  }
}

impl Default for NumericContext {
  fn default() -> Self {
    NumericContext::DOUBLE
  }
}

impl TryFrom<ContextConfig> for NumericContext {
  type Error = InvalidContextError;

  fn try_from(config: ContextConfig) -> Result<Self, Self::Error> {
    NumericContext::new(config.precision, config.emin, config.emax)
      .map(|ctx| ctx.with_rounding(config.rounding))
  }
}

impl Drop for ContextGuard {
  fn drop(&mut self) {
    CONTEXT.with(|ctx| ctx.set(self.previous));
  }
}

/// The context installed on the current thread.
pub fn current() -> NumericContext {
  CONTEXT.with(|ctx| ctx.get())
}

/// Replaces the current thread's context for the rest of the thread's
/// lifetime (or until the next replacement).
pub fn set_context(context: NumericContext) {
  CONTEXT.with(|ctx| ctx.set(context));
}

/// Installs `context` until the returned guard is dropped.
pub fn enter(context: NumericContext) -> ContextGuard {
  let previous = CONTEXT.with(|ctx| ctx.replace(context));
  ContextGuard { previous, _not_send: PhantomData }
}

/// Runs `f` under `context`. The previous context is restored
/// afterward, including when `f` panics.
pub fn with_context<R>(context: NumericContext, f: impl FnOnce() -> R) -> R {
  let _guard = enter(context);
  f()
}

/// Runs `f` with the working precision replaced, keeping the current
/// exponent range and rounding mode.
pub fn with_precision<R>(precision: u32, f: impl FnOnce() -> R) -> Result<R, InvalidContextError> {
  let context = current().with_precision(precision)?;
  Ok(with_context(context, f))
}

/// Runs `f` with the rounding mode replaced.
pub fn with_rounding<R>(rounding: RoundingMode, f: impl FnOnce() -> R) -> R {
  with_context(current().with_rounding(rounding), f)
}

/// Lifts a binary operation into one that takes the rounding mode to
/// perform it under as a third argument.
///
/// Interval bounds are computed this way: lower bounds toward
/// negative infinity, upper bounds toward positive infinity.
pub fn rounding_scoped<A, B, R, F>(op: F) -> impl Fn(A, B, RoundingMode) -> R
where F: Fn(A, B) -> R {
  move |a, b, mode| with_rounding(mode, || op(a, b))
}
