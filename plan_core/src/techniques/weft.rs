//! # Weft Collaretto
//!
//! Strips cut across the weft from panels of usable width, then rewound.
//!
//! ```text
//! pcs_seam_to_seam = round1((usable_width / 100) / gross_length)
//! rolls            = floor(rewound_width / (collaretto_width / 1000)) - scrap_roll
//! panels           = ceil(pieces * (1 + extra_pct / 100) / (rolls * pcs_seam_to_seam))
//! consumption      = round2(panels * rewound_width)
//! ```
//!
//! `panels` and `consumption` are blank unless both `rolls` and
//! `pcs_seam_to_seam` are positive. `pcs_seam_to_seam` follows the same
//! automatic/sticky rule as Bias rows.

use serde::{Deserialize, Serialize};

use crate::numeric::{ceil_tolerant, checked_ratio, floor_tolerant, or_zero, parse_input, positive, round_to};
use crate::row::Field;
use crate::techniques::FormulaContext;
use crate::units::{Centimeters, Meters, Millimeters};

/// Inputs and derived outputs of a Weft row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeftDetails {
    pub pieces: Option<f64>,

    /// Usable fabric width (cm)
    pub usable_width: Option<f64>,

    /// Panel gross length (m)
    pub gross_length: Option<f64>,

    /// Strip width (mm)
    pub collaretto_width: Option<f64>,

    /// Rewound roll width (m)
    pub rewound_width: Option<f64>,

    pub scrap_roll: Option<f64>,

    /// Pieces per panel, seam to seam
    pub pcs_seam_to_seam: Option<f64>,

    /// `false` once the user has typed `pcs_seam_to_seam`
    pub is_pcs_seam_calculated: bool,

    // Derived
    pub rolls: Option<f64>,
    pub panels: Option<f64>,
    pub consumption: Option<f64>,
}

impl Default for WeftDetails {
    fn default() -> Self {
        WeftDetails {
            pieces: None,
            usable_width: None,
            gross_length: None,
            collaretto_width: None,
            rewound_width: None,
            scrap_roll: None,
            pcs_seam_to_seam: None,
            is_pcs_seam_calculated: true,
            rolls: None,
            panels: None,
            consumption: None,
        }
    }
}

impl WeftDetails {
    /// Store one typed value; returns `false` for fields this technique lacks.
    pub fn apply_edit(&mut self, field: Field, raw: &str) -> bool {
        let value = parse_input(raw);
        match field {
            Field::Pieces => self.pieces = value,
            Field::UsableWidth => self.usable_width = value,
            Field::GrossLength => self.gross_length = value,
            Field::CollarettoWidth => self.collaretto_width = value,
            Field::RewoundWidth => self.rewound_width = value,
            Field::ScrapRoll => self.scrap_roll = value,
            Field::PcsSeamtoSeam => {
                self.pcs_seam_to_seam = value;
                self.is_pcs_seam_calculated = false;
            }
            _ => return false,
        }
        true
    }

    /// Recompute pcs seam-to-seam (when automatic), rolls, panels and consumption.
    pub fn derive(&mut self, ctx: &FormulaContext<'_>) {
        if self.is_pcs_seam_calculated {
            self.pcs_seam_to_seam = self.compute_pcs_seam_to_seam();
        }
        self.rolls = self.compute_rolls();
        self.panels = self.compute_panels(ctx.extra_factor());
        self.consumption = self
            .panels
            .map(|panels| round_to(panels * or_zero(self.rewound_width), 2));
    }

    fn compute_pcs_seam_to_seam(&self) -> Option<f64> {
        let usable: Meters = Centimeters(self.usable_width?).into();
        checked_ratio(usable.0, or_zero(self.gross_length)).map(|pcs| round_to(pcs, 1))
    }

    fn compute_rolls(&self) -> Option<f64> {
        let strip: Meters = Millimeters(self.collaretto_width?).into();
        let strips = checked_ratio(or_zero(self.rewound_width), strip.0)?;
        Some(floor_tolerant(strips) - or_zero(self.scrap_roll))
    }

    fn compute_panels(&self, extra_factor: f64) -> Option<f64> {
        let rolls = positive(self.rolls)?;
        let pcs = positive(self.pcs_seam_to_seam)?;
        checked_ratio(or_zero(self.pieces) * extra_factor, rolls * pcs).map(ceil_tolerant)
    }
}
