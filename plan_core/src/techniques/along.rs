//! # Along Collaretto
//!
//! Strips cut along the grain from a roll of usable width.
//!
//! ```text
//! rolls            = floor(usable_width / (collaretto_width / 10)) - scrap_roll
//! meters_collaretto = round2(pieces * theoretical_consumption * (1 + extra_pct / 100))
//! consumption      = round2(meters_collaretto / rolls)   if rolls > 0
//!                  = 0                                    otherwise
//! ```
//!
//! Unlike Bias and Weft, a non-positive or unknown roll count yields a
//! literal `0` consumption rather than a blank.

use serde::{Deserialize, Serialize};

use crate::numeric::{checked_ratio, floor_tolerant, or_zero, parse_input, round_to};
use crate::row::Field;
use crate::techniques::FormulaContext;
use crate::units::{Centimeters, Millimeters};

/// Inputs and derived outputs of an Along row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlongDetails {
    pub pieces: Option<f64>,

    /// Usable fabric width (cm)
    pub usable_width: Option<f64>,

    /// Meters of strip per piece
    pub theoretical_consumption: Option<f64>,

    /// Strip width (mm)
    pub collaretto_width: Option<f64>,

    pub scrap_roll: Option<f64>,

    // Derived
    pub rolls: Option<f64>,
    pub meters_collaretto: Option<f64>,
    pub consumption: Option<f64>,
}

impl AlongDetails {
    /// Store one typed value; returns `false` for fields this technique lacks.
    pub fn apply_edit(&mut self, field: Field, raw: &str) -> bool {
        let value = parse_input(raw);
        match field {
            Field::Pieces => self.pieces = value,
            Field::UsableWidth => self.usable_width = value,
            Field::TheoreticalConsumption => self.theoretical_consumption = value,
            Field::CollarettoWidth => self.collaretto_width = value,
            Field::ScrapRoll => self.scrap_roll = value,
            _ => return false,
        }
        true
    }

    /// Recompute rolls, meters of collaretto and consumption.
    pub fn derive(&mut self, ctx: &FormulaContext<'_>) {
        self.rolls = self.compute_rolls();

        let meters = or_zero(self.pieces) * or_zero(self.theoretical_consumption) * ctx.extra_factor();
        let meters = round_to(meters, 2);
        self.meters_collaretto = Some(meters);

        // TODO: align with Bias/Weft (blank instead of 0) once the report
        // screens accept a missing consumption for Along rows
        self.consumption = Some(match self.rolls {
            Some(rolls) if rolls > 0.0 => round_to(meters / rolls, 2),
            _ => 0.0,
        });
    }

    fn compute_rolls(&self) -> Option<f64> {
        let strip: Centimeters = Millimeters(self.collaretto_width?).into();
        let strips = checked_ratio(or_zero(self.usable_width), strip.0)?;
        Some(floor_tolerant(strips) - or_zero(self.scrap_roll))
    }
}
