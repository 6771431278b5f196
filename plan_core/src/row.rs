//! # Plan Rows
//!
//! A [`PlanRow`] is one line of a cutting plan. The attributes every
//! technique shares (identity, ordering, dye lot, size filter, phase) live
//! here; the technique-specific inputs and derived outputs live in
//! [`RowDetails`](crate::techniques::RowDetails).
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "id": "5b1f0a3e-8c1d-4b8e-9d7c-3b0d5c1f2a10",
//!   "external_id": "row-812",
//!   "sequence_number": 3,
//!   "dye_lot": "B-2231",
//!   "sizes": "ALL",
//!   "status": "Planned",
//!   "details": {
//!     "kind": "along",
//!     "pieces": 10.0,
//!     "usable_width": 150.0,
//!     "theoretical_consumption": 0.5,
//!     "collaretto_width": 20.0,
//!     "scrap_roll": 2.0,
//!     "rolls": 73.0,
//!     "meters_collaretto": 5.15,
//!     "consumption": 0.07
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::techniques::{RowDetails, Technique};

/// Group label for rows without a usable dye lot
pub const NO_BAGNO: &str = "No Bagno";

/// Dye-lot value the backend sends when it has no lot on record
pub const UNKNOWN_BAGNO: &str = "Unknown";

/// Size filter of a freshly created row
pub const DEFAULT_SIZES: &str = "ALL";

/// Collapse empty and "Unknown" dye lots into the [`NO_BAGNO`] group.
///
/// ```rust
/// use plan_core::row::{normalize_dye_lot, NO_BAGNO};
///
/// assert_eq!(normalize_dye_lot(""), NO_BAGNO);
/// assert_eq!(normalize_dye_lot("Unknown"), NO_BAGNO);
/// assert_eq!(normalize_dye_lot(" B-12 "), "B-12");
/// ```
pub fn normalize_dye_lot(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == UNKNOWN_BAGNO {
        NO_BAGNO
    } else {
        trimmed
    }
}

/// Whether a dye-lot label names a real batch (and may trigger a piece lookup).
pub fn is_valid_dye_lot(raw: &str) -> bool {
    let trimmed = raw.trim();
    !trimmed.is_empty() && trimmed != UNKNOWN_BAGNO && trimmed != NO_BAGNO
}

/// Production phase of a row, supplied by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowStatus {
    /// Newly planned, fully editable
    #[default]
    Planned,
    /// Released to the cutting room but not started
    Ready,
    /// Cutting in progress
    OnCut,
    /// Cut and closed
    Completed,
}

impl RowStatus {
    /// Only rows that have not reached the cutting floor accept edits
    pub fn is_editable(&self) -> bool {
        matches!(self, RowStatus::Planned | RowStatus::Ready)
    }

    /// Short display name
    pub fn code(&self) -> &'static str {
        match self {
            RowStatus::Planned => "Planned",
            RowStatus::Ready => "Ready",
            RowStatus::OnCut => "OnCut",
            RowStatus::Completed => "Completed",
        }
    }
}

/// Editable row fields.
///
/// Not every technique has every field; an edit naming a field the row's
/// technique does not carry leaves the row unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // Common
    Bagno,
    Sizes,

    // Mattress / Adhesive
    Width,
    MarkerName,
    Layers,
    LayersActual,
    ExpectedConsumption,
    ActualConsumption,

    // Collaretto (Along / Bias / Weft)
    Pieces,
    UsableWidth,
    TotalWidth,
    TheoreticalConsumption,
    GrossLength,
    CollarettoWidth,
    RewoundWidth,
    ScrapRoll,
    #[serde(rename = "pcs_seam_to_seam")]
    PcsSeamtoSeam,
}

/// One line of a cutting plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRow {
    /// Engine-assigned identifier, stable for the row's lifetime
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Backend identifier, present once the row has been saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Display/processing order within the owning table
    pub sequence_number: u32,

    /// Dye lot ("bagno") label as typed; see [`normalize_dye_lot`]
    #[serde(rename = "dye_lot", default)]
    pub bagno: String,

    /// Size filter label
    #[serde(default = "default_sizes")]
    pub sizes: String,

    /// Externally supplied phase
    #[serde(default)]
    pub status: RowStatus,

    /// Technique-specific inputs and derived outputs
    pub details: RowDetails,
}

fn default_sizes() -> String {
    DEFAULT_SIZES.to_string()
}

impl PlanRow {
    /// Create a blank, editable row for a technique.
    pub fn new(technique: Technique, sequence_number: u32) -> Self {
        PlanRow {
            id: Uuid::new_v4(),
            external_id: None,
            sequence_number,
            bagno: String::new(),
            sizes: default_sizes(),
            status: RowStatus::Planned,
            details: RowDetails::blank(technique),
        }
    }

    /// Technique of this row's details
    pub fn technique(&self) -> Technique {
        self.details.technique()
    }

    /// Whether the row's phase allows edits
    pub fn is_editable(&self) -> bool {
        self.status.is_editable()
    }

    /// Grouping key for dye-lot aggregation
    pub fn dye_lot_key(&self) -> &str {
        normalize_dye_lot(&self.bagno)
    }

    /// Whether the row's dye lot names a real batch
    pub fn has_valid_bagno(&self) -> bool {
        is_valid_dye_lot(&self.bagno)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_row_defaults() {
        let row = PlanRow::new(Technique::Weft, 4);
        assert_eq!(row.sequence_number, 4);
        assert_eq!(row.sizes, "ALL");
        assert!(row.bagno.is_empty());
        assert!(row.is_editable());
        assert_eq!(row.technique(), Technique::Weft);
        assert_eq!(row.dye_lot_key(), NO_BAGNO);
    }

    #[test]
    fn test_dye_lot_sentinel() {
        assert_eq!(normalize_dye_lot(""), normalize_dye_lot("Unknown"));
        assert_eq!(normalize_dye_lot("  "), NO_BAGNO);
        assert!(!is_valid_dye_lot("Unknown"));
        assert!(!is_valid_dye_lot(NO_BAGNO));
        assert!(is_valid_dye_lot("B-7"));
    }

    #[test]
    fn test_status_editability() {
        assert!(RowStatus::Planned.is_editable());
        assert!(RowStatus::Ready.is_editable());
        assert!(!RowStatus::OnCut.is_editable());
        assert!(!RowStatus::Completed.is_editable());
    }

    #[test]
    fn test_row_serialization_uses_wire_names() {
        let mut row = PlanRow::new(Technique::Along, 1);
        row.bagno = "B-1".to_string();
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"dye_lot\":\"B-1\""));
        assert!(json.contains("\"kind\":\"along\""));
        assert!(!json.contains("external_id"));

        let roundtrip: PlanRow = serde_json::from_str(&json).unwrap();
        assert_eq!(row, roundtrip);
    }

    #[test]
    fn test_field_names() {
        let json = serde_json::to_string(&Field::PcsSeamtoSeam).unwrap();
        assert_eq!(json, "\"pcs_seam_to_seam\"");
    }
}
