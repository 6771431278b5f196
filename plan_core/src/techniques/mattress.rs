//! # Mattress / Adhesive Rows
//!
//! Marker-driven spreading. The user picks a fabric width, then a marker laid
//! out for that width; the marker's length, efficiency and per-size yield are
//! copied verbatim from the catalog. Expected consumption is supplied by the
//! backend, not derived here.
//!
//! Changing the width to a different value invalidates the marker selection:
//! the marker and everything copied from it are cleared, forcing re-selection.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "kind": "mattress",
//!   "width": 150.0,
//!   "marker_name": "MK-150-A",
//!   "marker_length": 6.2,
//!   "efficiency": 82.5,
//!   "pieces_per_size": { "S": 2, "M": 4 },
//!   "layers": 40.0,
//!   "expected_consumption": 250.0
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::markers::MarkerCatalog;
use crate::numeric::{or_zero, parse_input, positive};
use crate::row::Field;

/// Inputs of a Mattress or Adhesive row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerDetails {
    /// Fabric width (cm)
    pub width: Option<f64>,

    /// Selected marker, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_name: Option<String>,

    /// Copied from the marker (m)
    pub marker_length: Option<f64>,

    /// Copied from the marker (%)
    pub efficiency: Option<f64>,

    /// Copied from the marker: pieces per size per layer
    pub pieces_per_size: BTreeMap<String, u32>,

    /// Planned layers
    pub layers: Option<f64>,

    /// Layers actually spread, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers_actual: Option<f64>,

    /// Planned consumption from the backend (m)
    pub expected_consumption: Option<f64>,

    /// Consumption reported by the cutting room (m)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_consumption: Option<f64>,
}

impl MarkerDetails {
    /// Store one typed value; returns `false` for fields this technique lacks.
    pub fn apply_edit(&mut self, field: Field, raw: &str, markers: &MarkerCatalog) -> bool {
        match field {
            Field::Width => {
                let width = parse_input(raw);
                if width != self.width {
                    self.width = width;
                    self.clear_marker();
                }
            }
            Field::MarkerName => self.select_marker(raw, markers),
            Field::Layers => self.layers = parse_input(raw),
            Field::LayersActual => self.layers_actual = parse_input(raw),
            Field::ExpectedConsumption => self.expected_consumption = parse_input(raw),
            Field::ActualConsumption => self.actual_consumption = parse_input(raw),
            _ => return false,
        }
        true
    }

    fn select_marker(&mut self, raw: &str, markers: &MarkerCatalog) {
        let name = raw.trim();
        if name.is_empty() {
            self.clear_marker();
            return;
        }
        match markers.get(name) {
            Some(marker) => {
                self.marker_name = Some(marker.marker_name.clone());
                self.marker_length = Some(marker.marker_length);
                self.efficiency = Some(marker.efficiency);
                self.pieces_per_size = marker.size_quantities.clone();
            }
            None => {
                // Keep the previous selection; the catalog may be stale
                warn!(marker_name = name, "Marker not in catalog, selection unchanged");
            }
        }
    }

    fn clear_marker(&mut self) {
        self.marker_name = None;
        self.marker_length = None;
        self.efficiency = None;
        self.pieces_per_size.clear();
    }

    /// Whether a marker is selected and its data copied
    pub fn has_marker(&self) -> bool {
        self.marker_name.is_some()
    }

    /// Pieces per size for a layer count: `pieces_per_size * layers`
    pub fn pieces_for_layers(&self, layers: Option<f64>) -> BTreeMap<String, f64> {
        let layers = or_zero(layers);
        self.pieces_per_size
            .iter()
            .map(|(size, qty)| (size.clone(), f64::from(*qty) * layers))
            .collect()
    }

    /// Planned pieces per size
    pub fn planned_pieces(&self) -> BTreeMap<String, f64> {
        self.pieces_for_layers(self.layers)
    }

    /// Actual pieces per size (zero when no actual layers are recorded)
    pub fn actual_pieces(&self) -> BTreeMap<String, f64> {
        self.pieces_for_layers(self.layers_actual)
    }

    /// Width valid for width grouping (positive number)
    pub fn valid_width(&self) -> Option<f64> {
        positive(self.width)
    }

    /// Layer count valid for width grouping (positive number)
    pub fn valid_layers(&self) -> Option<f64> {
        positive(self.layers)
    }
}
