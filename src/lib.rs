//! Sound bounds on floating-point round-off error.
//!
//! Values are tracked as pairs of a floating value range and an exact
//! error range ([`ErrorSemantics`]), computed in an ambient, per-thread
//! [`NumericContext`]. Expressions over such values can be parsed,
//! interned, and evaluated with per-node memoization.

pub mod error;
pub mod expr;
pub mod interval;
pub mod memo;
pub mod numeric;
pub mod parsing;
pub mod semantics;

mod proptests;

pub use error::Error;
pub use expr::{Expr, Env, error_eval, parse_expr};
pub use interval::{Interval, ExactInterval, FloatInterval, Endpoint, Lattice};
pub use numeric::{Exact, Float, NumericContext, RoundingMode, ulp};
pub use semantics::{ErrorSemantics, round_off_error};
