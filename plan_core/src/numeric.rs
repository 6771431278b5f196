//! # Numeric Policy
//!
//! Every formula reads user-typed text and writes derived values through the
//! helpers in this module, so the blank/zero rules live in one place:
//!
//! - Quantities that are summed (pieces, scrap rolls, extra %) read a missing
//!   or non-numeric input as `0` via [`or_zero`].
//! - Ratios whose denominator is zero, missing, or NaN produce `None` (a blank
//!   output) via [`checked_ratio`], never `0` or `NaN`.
//! - `floor`/`ceil` are applied with a small tolerance so binary
//!   representation error does not cost a whole roll or panel
//!   (`0.3 / 0.01` is `29.999999999999996` in `f64`).
//!
//! ## Example
//!
//! ```rust
//! use plan_core::numeric::{checked_ratio, floor_tolerant, parse_input, round_to};
//!
//! assert_eq!(parse_input(" 0,5 "), Some(0.5));
//! assert_eq!(parse_input("abc"), None);
//! assert_eq!(checked_ratio(1.0, 0.0), None);
//! assert_eq!(floor_tolerant(0.3 / 0.01), 30.0);
//! assert_eq!(round_to(1.5 / 0.9, 1), 1.7);
//! ```

/// Absolute tolerance for floor/ceil on values that should be integral
const INTEGRAL_TOLERANCE: f64 = 1e-9;

/// Parse raw user input into a number.
///
/// Blank input, non-numeric text, and non-finite values all yield `None`.
/// A comma is accepted as decimal separator.
pub fn parse_input(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read an optional quantity as zero when missing.
pub fn or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Keep the value only if it is a finite, strictly positive number.
pub fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Divide, yielding `None` when the denominator is zero or the result is
/// not finite.
pub fn checked_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let ratio = numerator / denominator;
    ratio.is_finite().then_some(ratio)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Floor that treats values within tolerance of the next integer as that
/// integer.
pub fn floor_tolerant(value: f64) -> f64 {
    (value + INTEGRAL_TOLERANCE).floor()
}

/// Ceil that treats values within tolerance of the previous integer as that
/// integer.
pub fn ceil_tolerant(value: f64) -> f64 {
    (value - INTEGRAL_TOLERANCE).ceil()
}
