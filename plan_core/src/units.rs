//! # Unit Types
//!
//! Type-safe wrappers for the lengths a cutting plan mixes together. Fabric
//! widths arrive in centimeters, collaretto strip widths in millimeters, and
//! roll/gross lengths and consumption in meters. The formulas convert through
//! these wrappers instead of sprinkling `/ 10.0`, `/ 100.0`, `/ 1000.0`.
//!
//! ## Example
//!
//! ```rust
//! use plan_core::units::{Centimeters, Meters, Millimeters};
//!
//! let strip = Millimeters(20.0);
//! let strip_cm: Centimeters = strip.into();
//! assert_eq!(strip_cm.0, 2.0);
//!
//! let width: Meters = Centimeters(150.0).into();
//! assert_eq!(width.0, 1.5);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Length Units
// ============================================================================

/// Length in millimeters (collaretto strip widths)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Length in centimeters (fabric usable/total widths)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Centimeters(pub f64);

/// Length in meters (gross lengths, rewound widths, consumption)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl From<Millimeters> for Centimeters {
    fn from(mm: Millimeters) -> Self {
        Centimeters(mm.0 / 10.0)
    }
}

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 / 1000.0)
    }
}

impl From<Centimeters> for Meters {
    fn from(cm: Centimeters) -> Self {
        Meters(cm.0 / 100.0)
    }
}

impl From<Meters> for Centimeters {
    fn from(m: Meters) -> Self {
        Centimeters(m.0 * 100.0)
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

macro_rules! impl_length_ops {
    ($unit:ident) => {
        impl Add for $unit {
            type Output = $unit;
            fn add(self, rhs: $unit) -> $unit {
                $unit(self.0 + rhs.0)
            }
        }

        impl Sub for $unit {
            type Output = $unit;
            fn sub(self, rhs: $unit) -> $unit {
                $unit(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $unit {
            type Output = $unit;
            fn mul(self, rhs: f64) -> $unit {
                $unit(self.0 * rhs)
            }
        }

        /// Ratio of two lengths in the same unit (dimensionless)
        impl Div for $unit {
            type Output = f64;
            fn div(self, rhs: $unit) -> f64 {
                self.0 / rhs.0
            }
        }
    };
}

impl_length_ops!(Millimeters);
impl_length_ops!(Centimeters);
impl_length_ops!(Meters);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_width_conversions() {
        let strip = Millimeters(10.0);
        assert_eq!(Centimeters::from(strip).0, 1.0);
        assert!((Meters::from(strip).0 - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_width_to_meters_and_back() {
        let width = Centimeters(150.0);
        let m: Meters = width.into();
        assert_eq!(m.0, 1.5);
        let back: Centimeters = m.into();
        assert_eq!(back.0, 150.0);
    }

    #[test]
    fn test_same_unit_ratio() {
        assert_eq!(Centimeters(150.0) / Centimeters(2.0), 75.0);
        assert_eq!((Meters(1.0) + Meters(0.5)) * 2.0, Meters(3.0));
        assert_eq!(Meters(1.0) - Meters(0.25), Meters(0.75));
    }

    #[test]
    fn test_serialization_is_bare_number() {
        let json = serde_json::to_string(&Millimeters(20.0)).unwrap();
        assert_eq!(json, "20.0");
    }
}
