//! # Cutting Techniques
//!
//! One formula set per cutting technique. Each technique module follows the
//! same pattern:
//!
//! - `*Details` - the technique's inputs and derived outputs (JSON-serializable)
//! - `apply_edit(field, raw)` - store one typed value, returning `false` if
//!   the technique has no such field
//! - `derive(ctx)` - recompute every derived output from the current inputs
//!
//! [`recompute`] is the single entry point: it never mutates its input and,
//! because outputs are always derived from inputs, calling it twice with the
//! same edit yields the same row.
//!
//! ## Available Techniques
//!
//! - [`mattress`] - Mattress and Adhesive spreading (marker driven)
//! - [`along`] - Collaretto cut along the grain
//! - [`bias`] - Collaretto cut on the bias
//! - [`weft`] - Collaretto cut along the weft
//!
//! ## Example
//!
//! ```rust
//! use plan_core::markers::MarkerCatalog;
//! use plan_core::row::{Field, PlanRow};
//! use plan_core::table::TableParams;
//! use plan_core::techniques::{recompute, FormulaContext, RowDetails, Technique};
//!
//! let params = TableParams { extra_pct: Some(3.0), ..TableParams::default() };
//! let markers = MarkerCatalog::default();
//! let ctx = FormulaContext::new(&params, &markers);
//!
//! let mut row = PlanRow::new(Technique::Along, 1);
//! for (field, value) in [
//!     (Field::Pieces, "10"),
//!     (Field::TheoreticalConsumption, "0.5"),
//!     (Field::UsableWidth, "150"),
//!     (Field::CollarettoWidth, "20"),
//!     (Field::ScrapRoll, "2"),
//! ] {
//!     row = recompute(&row, field, value, &ctx);
//! }
//!
//! let RowDetails::Along(along) = &row.details else { unreachable!() };
//! assert_eq!(along.rolls, Some(73.0));
//! assert_eq!(along.meters_collaretto, Some(5.15));
//! assert_eq!(along.consumption, Some(0.07));
//! ```

pub mod along;
pub mod bias;
pub mod mattress;
pub mod weft;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::markers::MarkerCatalog;
use crate::numeric::or_zero;
use crate::row::{Field, PlanRow};
use crate::table::TableParams;

pub use along::AlongDetails;
pub use bias::BiasDetails;
pub use mattress::MarkerDetails;
pub use weft::WeftDetails;

/// Cutting technique tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Technique {
    Mattress,
    Adhesive,
    Along,
    Bias,
    Weft,
}

impl Technique {
    /// All techniques in display order
    pub const ALL: [Technique; 5] = [
        Technique::Mattress,
        Technique::Adhesive,
        Technique::Along,
        Technique::Bias,
        Technique::Weft,
    ];

    /// Lowercase wire name (matches the `kind` tag of [`RowDetails`])
    pub fn code(&self) -> &'static str {
        match self {
            Technique::Mattress => "mattress",
            Technique::Adhesive => "adhesive",
            Technique::Along => "along",
            Technique::Bias => "bias",
            Technique::Weft => "weft",
        }
    }

    /// Whether rows carry a `pieces` input that a dye-lot lookup can fill
    pub fn has_pieces_input(&self) -> bool {
        matches!(self, Technique::Along | Technique::Bias | Technique::Weft)
    }

    /// Whether the table carries an `extra_pct` parameter
    pub fn uses_extra_pct(&self) -> bool {
        matches!(self, Technique::Along | Technique::Weft)
    }
}

impl std::fmt::Display for Technique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Technique-specific inputs and derived outputs of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowDetails {
    Mattress(MarkerDetails),
    Adhesive(MarkerDetails),
    Along(AlongDetails),
    Bias(BiasDetails),
    Weft(WeftDetails),
}

impl RowDetails {
    /// Blank inputs for a technique
    pub fn blank(technique: Technique) -> Self {
        match technique {
            Technique::Mattress => RowDetails::Mattress(MarkerDetails::default()),
            Technique::Adhesive => RowDetails::Adhesive(MarkerDetails::default()),
            Technique::Along => RowDetails::Along(AlongDetails::default()),
            Technique::Bias => RowDetails::Bias(BiasDetails::default()),
            Technique::Weft => RowDetails::Weft(WeftDetails::default()),
        }
    }

    pub fn technique(&self) -> Technique {
        match self {
            RowDetails::Mattress(_) => Technique::Mattress,
            RowDetails::Adhesive(_) => Technique::Adhesive,
            RowDetails::Along(_) => Technique::Along,
            RowDetails::Bias(_) => Technique::Bias,
            RowDetails::Weft(_) => Technique::Weft,
        }
    }

    /// Marker-driven details (Mattress / Adhesive)
    pub fn as_marker(&self) -> Option<&MarkerDetails> {
        match self {
            RowDetails::Mattress(d) | RowDetails::Adhesive(d) => Some(d),
            _ => None,
        }
    }

    /// Pieces input of collaretto rows
    pub fn pieces(&self) -> Option<f64> {
        match self {
            RowDetails::Along(d) => d.pieces,
            RowDetails::Bias(d) => d.pieces,
            RowDetails::Weft(d) => d.pieces,
            RowDetails::Mattress(_) | RowDetails::Adhesive(_) => None,
        }
    }

    /// Planned consumption in meters (expected for marker rows, derived for collaretto)
    pub fn planned_consumption(&self) -> Option<f64> {
        match self {
            RowDetails::Mattress(d) | RowDetails::Adhesive(d) => d.expected_consumption,
            RowDetails::Along(d) => d.consumption,
            RowDetails::Bias(d) => d.consumption,
            RowDetails::Weft(d) => d.consumption,
        }
    }

    /// Actual consumption in meters, when recorded
    pub fn actual_consumption(&self) -> Option<f64> {
        self.as_marker().and_then(|d| d.actual_consumption)
    }

    /// Rolls count of collaretto rows
    pub fn rolls(&self) -> Option<f64> {
        match self {
            RowDetails::Along(d) => d.rolls,
            RowDetails::Bias(d) => d.rolls,
            RowDetails::Weft(d) => d.rolls,
            RowDetails::Mattress(_) | RowDetails::Adhesive(_) => None,
        }
    }

    /// Panels count of Bias / Weft rows
    pub fn panels(&self) -> Option<f64> {
        match self {
            RowDetails::Bias(d) => d.panels,
            RowDetails::Weft(d) => d.panels,
            _ => None,
        }
    }

    fn apply_edit(&mut self, field: Field, raw: &str, ctx: &FormulaContext<'_>) -> bool {
        match self {
            RowDetails::Mattress(d) | RowDetails::Adhesive(d) => d.apply_edit(field, raw, ctx.markers),
            RowDetails::Along(d) => d.apply_edit(field, raw),
            RowDetails::Bias(d) => d.apply_edit(field, raw),
            RowDetails::Weft(d) => d.apply_edit(field, raw),
        }
    }

    fn derive(&mut self, ctx: &FormulaContext<'_>) {
        match self {
            // Marker rows carry no derived outputs
            RowDetails::Mattress(_) | RowDetails::Adhesive(_) => {}
            RowDetails::Along(d) => d.derive(ctx),
            RowDetails::Bias(d) => d.derive(),
            RowDetails::Weft(d) => d.derive(ctx),
        }
    }
}

/// Everything a formula may read besides the row itself.
#[derive(Debug, Clone, Copy)]
pub struct FormulaContext<'a> {
    pub params: &'a TableParams,
    pub markers: &'a MarkerCatalog,
}

impl<'a> FormulaContext<'a> {
    pub fn new(params: &'a TableParams, markers: &'a MarkerCatalog) -> Self {
        FormulaContext { params, markers }
    }

    /// Table extra percentage, missing read as 0
    pub fn extra_pct(&self) -> f64 {
        or_zero(self.params.extra_pct)
    }

    /// `1 + extra_pct / 100`
    pub fn extra_factor(&self) -> f64 {
        1.0 + self.extra_pct() / 100.0
    }
}

/// Apply one field edit to a row and recompute its derived outputs.
///
/// Pure: the input row is left untouched and a new row is returned. Edits
/// naming a field the technique lacks return an unchanged copy.
pub fn recompute(row: &PlanRow, field: Field, raw: &str, ctx: &FormulaContext<'_>) -> PlanRow {
    let mut updated = row.clone();
    let applied = match field {
        Field::Bagno => {
            updated.bagno = raw.trim().to_string();
            true
        }
        Field::Sizes => {
            updated.sizes = raw.trim().to_string();
            true
        }
        _ => updated.details.apply_edit(field, raw, ctx),
    };

    if !applied {
        debug!(row_id = %row.id, ?field, technique = %row.technique(), "Field not carried by technique");
        return updated;
    }

    updated.details.derive(ctx);
    debug!(row_id = %row.id, ?field, value = raw, "Recomputed row");
    updated
}

/// Recompute derived outputs from current inputs without an edit.
///
/// Used for table-wide passes (e.g. after `extra_pct` changes).
pub fn rederive(row: &PlanRow, ctx: &FormulaContext<'_>) -> PlanRow {
    let mut updated = row.clone();
    updated.details.derive(ctx);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_parts() -> (TableParams, MarkerCatalog) {
        (TableParams::default(), MarkerCatalog::default())
    }

    #[test]
    fn test_recompute_does_not_mutate_input() {
        let (params, markers) = ctx_parts();
        let ctx = FormulaContext::new(&params, &markers);
        let row = PlanRow::new(Technique::Along, 1);
        let before = row.clone();
        let updated = recompute(&row, Field::Pieces, "12", &ctx);
        assert_eq!(row, before);
        assert_eq!(updated.details.pieces(), Some(12.0));
    }

    #[test]
    fn test_unknown_field_leaves_row_unchanged() {
        let (params, markers) = ctx_parts();
        let ctx = FormulaContext::new(&params, &markers);
        let row = PlanRow::new(Technique::Weft, 1);
        let updated = recompute(&row, Field::MarkerName, "MK-1", &ctx);
        assert_eq!(row, updated);
    }

    #[test]
    fn test_common_fields() {
        let (params, markers) = ctx_parts();
        let ctx = FormulaContext::new(&params, &markers);
        let row = PlanRow::new(Technique::Mattress, 1);
        let row = recompute(&row, Field::Bagno, " B-44 ", &ctx);
        let row = recompute(&row, Field::Sizes, "S-M", &ctx);
        assert_eq!(row.bagno, "B-44");
        assert_eq!(row.sizes, "S-M");
    }

    #[test]
    fn test_technique_flags() {
        assert!(Technique::Along.uses_extra_pct());
        assert!(Technique::Weft.uses_extra_pct());
        assert!(!Technique::Bias.uses_extra_pct());
        assert!(!Technique::Mattress.has_pieces_input());
        assert!(Technique::Bias.has_pieces_input());
        for technique in Technique::ALL {
            assert_eq!(RowDetails::blank(technique).technique(), technique);
        }
    }

    #[test]
    fn test_details_tag() {
        let json = serde_json::to_string(&RowDetails::blank(Technique::Adhesive)).unwrap();
        assert!(json.starts_with("{\"kind\":\"adhesive\""));
    }
}
