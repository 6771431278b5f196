//! # Aggregation
//!
//! Read-only summaries derived from table snapshots, for the planning and
//! report screens. Nothing here mutates its input.
//!
//! Dye-lot groupings keep the order in which each lot is first met while
//! walking the rows in sequence order. Empty, missing and `"Unknown"` lots
//! collapse into the `"No Bagno"` group, which is ordered like any other lot.
//!
//! ## Example
//!
//! ```rust
//! use plan_core::aggregation::planned_by_dye_lot;
//! use plan_core::row::PlanRow;
//! use plan_core::table::Table;
//! use plan_core::techniques::Technique;
//!
//! let mut table = Table::new(Technique::Along);
//! for (seq, lot) in ["B", "A", "B", ""].iter().enumerate() {
//!     let mut row = PlanRow::new(Technique::Along, seq as u32 + 1);
//!     row.bagno = lot.to_string();
//!     table.rows.push(row);
//! }
//!
//! let by_lot = planned_by_dye_lot(&table);
//! assert_eq!(by_lot.order(), ["B", "A", "No Bagno"]);
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::numeric::positive;
use crate::row::PlanRow;
use crate::table::Table;
use crate::techniques::{RowDetails, Technique};

/// Pieces per size label
pub type SizeTotals = BTreeMap<String, f64>;

/// Values grouped by key, remembering first-seen key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedGroups<V> {
    order: Vec<String>,
    groups: HashMap<String, V>,
}

impl<V> Default for OrderedGroups<V> {
    fn default() -> Self {
        OrderedGroups {
            order: Vec::new(),
            groups: HashMap::new(),
        }
    }
}

impl<V: Default> OrderedGroups<V> {
    /// Group for `key`, created (and ordered last) on first use
    pub fn entry(&mut self, key: &str) -> &mut V {
        if !self.groups.contains_key(key) {
            self.order.push(key.to_string());
        }
        self.groups.entry(key.to_string()).or_default()
    }
}

impl<V> OrderedGroups<V> {
    /// Keys in first-seen order
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.groups.get(key)
    }

    /// Groups in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.order
            .iter()
            .filter_map(|k| self.groups.get(k).map(|v| (k.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl OrderedGroups<SizeTotals> {
    /// Per-size totals summed over every group
    pub fn size_totals(&self) -> SizeTotals {
        let mut totals = SizeTotals::new();
        for (_, sizes) in self.iter() {
            add_sizes(&mut totals, sizes);
        }
        totals
    }
}

fn add_sizes(into: &mut SizeTotals, from: &SizeTotals) {
    for (size, pieces) in from {
        *into.entry(size.clone()).or_insert(0.0) += pieces;
    }
}

/// Planned pieces of a row per size label.
///
/// Marker rows yield `pieces_per_size * layers`; collaretto rows yield their
/// `pieces` under the row's size filter.
fn planned_pieces_by_size(row: &PlanRow) -> SizeTotals {
    match &row.details {
        RowDetails::Mattress(d) | RowDetails::Adhesive(d) => d.planned_pieces(),
        other => {
            let mut sizes = SizeTotals::new();
            if let Some(pieces) = other.pieces() {
                sizes.insert(row.sizes.clone(), pieces);
            }
            sizes
        }
    }
}

/// Consumption of a row, preferring the actual value over the planned one
fn preferred_consumption(row: &PlanRow) -> f64 {
    row.details
        .actual_consumption()
        .or_else(|| row.details.planned_consumption())
        .unwrap_or(0.0)
}

/// Σ `pieces_per_size * layers` per size (Mattress / Adhesive rows only).
pub fn planned_quantities(table: &Table) -> SizeTotals {
    let mut totals = SizeTotals::new();
    for marker in table.rows.iter().filter_map(|r| r.details.as_marker()) {
        add_sizes(&mut totals, &marker.planned_pieces());
    }
    totals
}

/// Σ `pieces_per_size * layers_actual` per size (Mattress / Adhesive rows only).
pub fn actual_quantities(table: &Table) -> SizeTotals {
    let mut totals = SizeTotals::new();
    for marker in table.rows.iter().filter_map(|r| r.details.as_marker()) {
        add_sizes(&mut totals, &marker.actual_pieces());
    }
    totals
}

/// Planned pieces per size, grouped by dye lot.
pub fn planned_by_dye_lot(table: &Table) -> OrderedGroups<SizeTotals> {
    let mut groups = OrderedGroups::default();
    for row in &table.rows {
        add_sizes(groups.entry(row.dye_lot_key()), &planned_pieces_by_size(row));
    }
    groups
}

/// Consumption grouped by dye lot, actual preferred over planned per row.
pub fn consumption_by_dye_lot(table: &Table) -> OrderedGroups<f64> {
    let mut groups = OrderedGroups::default();
    for row in &table.rows {
        *groups.entry(row.dye_lot_key()) += preferred_consumption(row);
    }
    groups
}

/// Pieces and consumption of one fabric width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidthTotals {
    /// Fabric width (cm)
    pub width: f64,
    pub pieces: SizeTotals,
    pub consumption: f64,
}

/// Widths of a dye lot, in first-seen order
pub type WidthGroups = Vec<WidthTotals>;

/// Per dye lot, per width: piece totals and summed consumption.
///
/// Rows without a positive width or layer count are skipped, as are
/// collaretto rows, which have neither.
pub fn widths_by_dye_lot(table: &Table) -> OrderedGroups<WidthGroups> {
    let mut groups: OrderedGroups<WidthGroups> = OrderedGroups::default();
    for row in &table.rows {
        let Some(marker) = row.details.as_marker() else {
            continue;
        };
        let (Some(width), Some(_)) = (marker.valid_width(), marker.valid_layers()) else {
            continue;
        };

        let widths = groups.entry(row.dye_lot_key());
        let index = match widths.iter().position(|w| w.width == width) {
            Some(index) => index,
            None => {
                widths.push(WidthTotals {
                    width,
                    pieces: SizeTotals::new(),
                    consumption: 0.0,
                });
                widths.len() - 1
            }
        };
        let totals = &mut widths[index];
        add_sizes(&mut totals.pieces, &marker.planned_pieces());
        totals.consumption += preferred_consumption(row);
    }
    groups
}

/// Table or cross-table summary statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub row_count: usize,
    pub planned_pieces: f64,
    pub actual_pieces: f64,
    pub planned_consumption: f64,
    pub actual_consumption: f64,
    /// `planned_consumption / planned_pieces`, 0 without pieces
    pub avg_consumption_planned: f64,
    /// `actual_consumption / actual_pieces`, 0 without pieces
    pub avg_consumption_actual: f64,
    pub total_rolls: f64,
    pub total_panels: f64,
    pub total_meters_collaretto: f64,
}

impl SummaryStats {
    fn add_row(&mut self, row: &PlanRow) {
        self.row_count += 1;
        match &row.details {
            RowDetails::Mattress(d) | RowDetails::Adhesive(d) => {
                self.planned_pieces += d.planned_pieces().values().sum::<f64>();
                self.actual_pieces += d.actual_pieces().values().sum::<f64>();
                self.actual_consumption += d.actual_consumption.unwrap_or(0.0);
            }
            other => {
                self.planned_pieces += other.pieces().unwrap_or(0.0);
                self.total_rolls += positive(other.rolls()).unwrap_or(0.0);
                self.total_panels += other.panels().unwrap_or(0.0);
            }
        }
        if let RowDetails::Along(d) = &row.details {
            self.total_meters_collaretto += d.meters_collaretto.unwrap_or(0.0);
        }
        self.planned_consumption += row.details.planned_consumption().unwrap_or(0.0);
    }

    fn absorb(&mut self, other: &SummaryStats) {
        self.row_count += other.row_count;
        self.planned_pieces += other.planned_pieces;
        self.actual_pieces += other.actual_pieces;
        self.planned_consumption += other.planned_consumption;
        self.actual_consumption += other.actual_consumption;
        self.total_rolls += other.total_rolls;
        self.total_panels += other.total_panels;
        self.total_meters_collaretto += other.total_meters_collaretto;
    }

    fn with_averages(mut self) -> Self {
        self.avg_consumption_planned = average(self.planned_consumption, self.planned_pieces);
        self.avg_consumption_actual = average(self.actual_consumption, self.actual_pieces);
        self
    }
}

fn average(total: f64, pieces: f64) -> f64 {
    if pieces > 0.0 {
        total / pieces
    } else {
        0.0
    }
}

/// Summary of one table.
pub fn table_summary(table: &Table) -> SummaryStats {
    let mut stats = SummaryStats::default();
    for row in &table.rows {
        stats.add_row(row);
    }
    stats.with_averages()
}

/// Summary across tables, overall and per technique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub total: SummaryStats,
    pub by_technique: BTreeMap<Technique, SummaryStats>,
}

/// Summarise many tables; averages are recomputed from the summed totals.
pub fn order_summary<'a>(tables: impl IntoIterator<Item = &'a Table>) -> OrderSummary {
    let mut total = SummaryStats::default();
    let mut by_technique: BTreeMap<Technique, SummaryStats> = BTreeMap::new();
    for table in tables {
        let stats = table_summary(table);
        total.absorb(&stats);
        by_technique.entry(table.technique).or_default().absorb(&stats);
    }
    OrderSummary {
        total: total.with_averages(),
        by_technique: by_technique
            .into_iter()
            .map(|(technique, stats)| (technique, stats.with_averages()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::NO_BAGNO;
    use crate::techniques::{AlongDetails, MarkerDetails, WeftDetails};

    fn marker_row(seq: u32, lot: &str, width: f64, layers: f64, consumption: f64) -> PlanRow {
        let mut row = PlanRow::new(Technique::Mattress, seq);
        row.bagno = lot.to_string();
        let mut details = MarkerDetails {
            width: Some(width),
            marker_name: Some("MK".to_string()),
            layers: Some(layers),
            expected_consumption: Some(consumption),
            ..MarkerDetails::default()
        };
        details.pieces_per_size.insert("S".to_string(), 1);
        details.pieces_per_size.insert("M".to_string(), 2);
        row.details = RowDetails::Mattress(details);
        row
    }

    fn along_row(seq: u32, lot: &str, pieces: f64, consumption: f64) -> PlanRow {
        let mut row = PlanRow::new(Technique::Along, seq);
        row.bagno = lot.to_string();
        row.details = RowDetails::Along(AlongDetails {
            pieces: Some(pieces),
            rolls: Some(10.0),
            meters_collaretto: Some(consumption * 10.0),
            consumption: Some(consumption),
            ..AlongDetails::default()
        });
        row
    }

    fn mattress_table() -> Table {
        let mut table = Table::new(Technique::Mattress);
        table.rows = vec![
            marker_row(1, "B", 150.0, 10.0, 60.0),
            marker_row(2, "A", 150.0, 5.0, 30.0),
            marker_row(3, "B", 140.0, 2.0, 12.0),
            marker_row(4, "Unknown", 150.0, 1.0, 6.0),
        ];
        table
    }

    #[test]
    fn test_planned_quantities() {
        let totals = planned_quantities(&mattress_table());
        // layers 10 + 5 + 2 + 1 = 18
        assert_eq!(totals["S"], 18.0);
        assert_eq!(totals["M"], 36.0);
    }

    #[test]
    fn test_actual_quantities_default_zero() {
        let mut table = mattress_table();
        if let RowDetails::Mattress(d) = &mut table.rows[0].details {
            d.layers_actual = Some(9.0);
        }
        let totals = actual_quantities(&table);
        assert_eq!(totals["S"], 9.0);
        assert_eq!(totals["M"], 18.0);
    }

    #[test]
    fn test_planned_by_dye_lot_first_seen_order() {
        let by_lot = planned_by_dye_lot(&mattress_table());
        assert_eq!(by_lot.order(), ["B", "A", NO_BAGNO]);
        assert_eq!(by_lot.get("B").unwrap()["S"], 12.0);
        assert_eq!(by_lot.get(NO_BAGNO).unwrap()["M"], 2.0);
    }

    #[test]
    fn test_sentinel_collapses_empty_and_unknown() {
        let mut table = Table::new(Technique::Along);
        table.rows = vec![along_row(1, "", 5.0, 0.1), along_row(2, "Unknown", 7.0, 0.2)];
        let by_lot = planned_by_dye_lot(&table);
        assert_eq!(by_lot.order(), [NO_BAGNO]);
        assert_eq!(by_lot.get(NO_BAGNO).unwrap()["ALL"], 12.0);
    }

    #[test]
    fn test_dye_lot_totals_match_flat_totals() {
        let table = mattress_table();
        assert_eq!(planned_by_dye_lot(&table).size_totals(), planned_quantities(&table));
    }

    #[test]
    fn test_consumption_prefers_actual() {
        let mut table = mattress_table();
        if let RowDetails::Mattress(d) = &mut table.rows[0].details {
            d.actual_consumption = Some(55.0);
        }
        let by_lot = consumption_by_dye_lot(&table);
        assert_eq!(by_lot.get("B"), Some(&67.0));
        assert_eq!(by_lot.get("A"), Some(&30.0));
        assert_eq!(by_lot.get(NO_BAGNO), Some(&6.0));
    }

    #[test]
    fn test_widths_by_dye_lot() {
        let mut table = mattress_table();
        table.rows.push(marker_row(5, "B", 150.0, 0.0, 99.0));
        let mut no_width = marker_row(6, "C", 150.0, 3.0, 1.0);
        if let RowDetails::Mattress(d) = &mut no_width.details {
            d.width = None;
        }
        table.rows.push(no_width);

        let widths = widths_by_dye_lot(&table);
        // lot C only had an invalid row
        assert_eq!(widths.order(), ["B", "A", NO_BAGNO]);
        let b = widths.get("B").unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b[0].width, 150.0);
        assert_eq!(b[0].pieces["M"], 20.0);
        assert_eq!(b[0].consumption, 60.0);
        assert_eq!(b[1].width, 140.0);
        assert_eq!(b[1].consumption, 12.0);
    }

    #[test]
    fn test_table_summary_mattress() {
        let stats = table_summary(&mattress_table());
        assert_eq!(stats.row_count, 4);
        // 18 layers * 3 pieces
        assert_eq!(stats.planned_pieces, 54.0);
        assert_eq!(stats.planned_consumption, 108.0);
        assert_eq!(stats.avg_consumption_planned, 2.0);
        assert_eq!(stats.actual_pieces, 0.0);
        assert_eq!(stats.avg_consumption_actual, 0.0);
    }

    #[test]
    fn test_table_summary_collaretto() {
        let mut table = Table::new(Technique::Weft);
        let mut row = PlanRow::new(Technique::Weft, 1);
        row.details = RowDetails::Weft(WeftDetails {
            pieces: Some(100.0),
            rolls: Some(29.0),
            panels: Some(3.0),
            consumption: Some(0.9),
            ..WeftDetails::default()
        });
        let mut invalid = PlanRow::new(Technique::Weft, 2);
        invalid.details = RowDetails::Weft(WeftDetails {
            rolls: Some(-1.0),
            ..WeftDetails::default()
        });
        table.rows = vec![row, invalid];

        let stats = table_summary(&table);
        assert_eq!(stats.total_rolls, 29.0);
        assert_eq!(stats.total_panels, 3.0);
        assert_eq!(stats.planned_pieces, 100.0);
        assert!((stats.avg_consumption_planned - 0.009).abs() < 1e-12);
    }

    #[test]
    fn test_empty_table_summary() {
        let stats = table_summary(&Table::new(Technique::Bias));
        assert_eq!(stats, SummaryStats::default());
    }

    #[test]
    fn test_order_summary_recomputes_averages() {
        let mattress = mattress_table();
        let mut along = Table::new(Technique::Along);
        along.rows = vec![along_row(1, "B", 46.0, 0.5), along_row(2, "B", 0.0, 1.5)];

        let summary = order_summary([&mattress, &along]);
        assert_eq!(summary.total.row_count, 6);
        assert_eq!(summary.total.planned_pieces, 100.0);
        assert_eq!(summary.total.planned_consumption, 110.0);
        assert_eq!(summary.total.avg_consumption_planned, 1.1);
        assert_eq!(summary.total.total_meters_collaretto, 20.0);
        assert_eq!(summary.by_technique[&Technique::Along].planned_consumption, 2.0);
        assert_eq!(summary.by_technique.len(), 2);
    }
}
