use crate::expr::{EvalError, ParseError};
use crate::interval::InvalidIntervalError;
use crate::memo::{KeyEncodingError, PoolError};
use crate::numeric::{InvalidContextError, ParseValueError};

use thiserror::Error;

use std::error::{Error as StdError};

/// Every error this crate can report. Each component has its own
/// error type, and this collects them for callers which do not care
/// where a failure came from.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
  #[error("{0}")]
  CustomError(Box<dyn StdError + Send + Sync + 'static>),
  #[error("{0}")]
  InvalidInterval(#[from] InvalidIntervalError),
  #[error("{0}")]
  ParseValue(#[from] ParseValueError),
  #[error("{0}")]
  InvalidContext(#[from] InvalidContextError),
  #[error("{0}")]
  KeyEncoding(#[from] KeyEncodingError),
  #[error("{0}")]
  Pool(#[from] PoolError),
  #[error("{0}")]
  Parse(#[from] ParseError),
  #[error("{0}")]
  Eval(#[from] EvalError),
}

impl Error {
  pub fn custom_error(err: impl StdError + Send + Sync + 'static) -> Self {
    Self::CustomError(Box::new(err))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::interval::ExactInterval;
  use crate::numeric::{Exact, NumericContext};

  use std::fmt;

  #[derive(Debug)]
  struct Opaque;

  impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "opaque failure")
    }
  }

  impl StdError for Opaque {}

  #[test]
  fn test_conversions_keep_message() {
    let err: Error = "1/0".parse::<Exact>().unwrap_err().into();
    assert!(matches!(err, Error::ParseValue(_)));
    assert_eq!(err.to_string(), "Invalid value 1/0");

    let err: Error = NumericContext::new(1, -10, 10).unwrap_err().into();
    assert!(matches!(err, Error::InvalidContext(_)));
  }

  #[test]
  fn test_question_mark_conversion() {
    fn lower_bound(min: &str, max: &str) -> Result<Exact, Error> {
      let interval = ExactInterval::from_values(min, max)?;
      Ok(interval.min().clone())
    }
    assert_eq!(lower_bound("1", "2").unwrap(), Exact::one());
    assert!(matches!(lower_bound("2", "1"), Err(Error::InvalidInterval(_))));
  }

  #[test]
  fn test_custom_error() {
    let err = Error::custom_error(Opaque);
    assert_eq!(err.to_string(), "opaque failure");
  }
}
