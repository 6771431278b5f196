//! # Bias Collaretto
//!
//! Strips cut at 45° across folded panels, then rewound.
//!
//! ```text
//! pcs_seam_to_seam = round1(((total_width / 100) * √2 - collaretto_width / 1000) / gross_length)
//! rolls            = floor(rewound_width / (collaretto_width / 1000)) - scrap_roll
//! panels           = ceil(pieces / (rolls * pcs_seam_to_seam))   when both factors > 0
//! consumption      = round2(panels * rewound_width * √2)
//! ```
//!
//! `pcs_seam_to_seam` is machine-computed until the user types a value; from
//! then on it is sticky and never recomputed for the lifetime of the row.

use std::f64::consts::SQRT_2;

use serde::{Deserialize, Serialize};

use crate::numeric::{ceil_tolerant, checked_ratio, floor_tolerant, or_zero, parse_input, positive, round_to};
use crate::row::Field;
use crate::units::{Centimeters, Meters, Millimeters};

/// Inputs and derived outputs of a Bias row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasDetails {
    pub pieces: Option<f64>,

    /// Total fabric width (cm)
    pub total_width: Option<f64>,

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

impl Default for BiasDetails {
    fn default() -> Self {
        BiasDetails {
            pieces: None,
            total_width: None,
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

impl BiasDetails {
    /// Store one typed value; returns `false` for fields this technique lacks.
    pub fn apply_edit(&mut self, field: Field, raw: &str) -> bool {
        let value = parse_input(raw);
        match field {
            Field::Pieces => self.pieces = value,
            Field::TotalWidth => self.total_width = value,
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
    pub fn derive(&mut self) {
        if self.is_pcs_seam_calculated {
            self.pcs_seam_to_seam = self.compute_pcs_seam_to_seam();
        }
        self.rolls = self.compute_rolls();
        self.panels = self.compute_panels();
        self.consumption = self
            .panels
            .map(|panels| round_to(panels * or_zero(self.rewound_width) * SQRT_2, 2));
    }

    fn compute_pcs_seam_to_seam(&self) -> Option<f64> {
        let diagonal = Meters::from(Centimeters(self.total_width?)) * SQRT_2;
        let strip: Meters = Millimeters(self.collaretto_width?).into();
        let usable = diagonal - strip;
        checked_ratio(usable.0, or_zero(self.gross_length)).map(|pcs| round_to(pcs, 1))
    }

    fn compute_rolls(&self) -> Option<f64> {
        let strip: Meters = Millimeters(self.collaretto_width?).into();
        let strips = checked_ratio(or_zero(self.rewound_width), strip.0)?;
        Some(floor_tolerant(strips) - or_zero(self.scrap_roll))
    }

    fn compute_panels(&self) -> Option<f64> {
        let rolls = positive(self.rolls)?;
        let pcs = positive(self.pcs_seam_to_seam)?;
        checked_ratio(or_zero(self.pieces), rolls * pcs).map(ceil_tolerant)
    }
}
