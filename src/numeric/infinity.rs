use serde::{Serialize, Deserialize};

use std::fmt::{self, Display, Formatter};
use std::ops::{Neg, Mul};

/// An infinity value with a known sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignedInfinity {
  NegInfinity,
  PosInfinity,
}

impl SignedInfinity {
  /// The infinity in the direction of the given sign. `true` selects
  /// negative infinity.
  pub fn with_sign(negative: bool) -> Self {
    if negative {
      SignedInfinity::NegInfinity
    } else {
      SignedInfinity::PosInfinity
    }
  }

  pub fn is_negative(self) -> bool {
    self == SignedInfinity::NegInfinity
  }

  pub fn is_positive(self) -> bool {
    self == SignedInfinity::PosInfinity
  }

  pub fn to_f64(self) -> f64 {
    match self {
      SignedInfinity::NegInfinity => f64::NEG_INFINITY,
      SignedInfinity::PosInfinity => f64::INFINITY,
    }
  }
}

impl Neg for SignedInfinity {
  type Output = SignedInfinity;

  fn neg(self) -> SignedInfinity {
    match self {
      SignedInfinity::NegInfinity => SignedInfinity::PosInfinity,
      SignedInfinity::PosInfinity => SignedInfinity::NegInfinity,
    }
  }
}

impl Mul for SignedInfinity {
  type Output = SignedInfinity;

  fn mul(self, other: SignedInfinity) -> SignedInfinity {
    SignedInfinity::with_sign(self.is_negative() != other.is_negative())
  }
}

impl Display for SignedInfinity {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      SignedInfinity::NegInfinity => write!(f, "-inf"),
      SignedInfinity::PosInfinity => write!(f, "inf"),
    }
  }
}
