//! Property-based tests for rounding, interval arithmetic, error
//! propagation, and memoization.
