//! # Marker Catalog
//!
//! Markers are cutting layouts with a fixed width, length, efficiency and
//! per-size piece yield. The catalog is fetched from the backend for a style
//! and size set (see [`MarkerSource`](crate::lookup::MarkerSource)) and is
//! read-only from then on: Mattress and Adhesive rows copy marker data into
//! themselves when a marker is selected.
//!
//! ## Example
//!
//! ```rust
//! use plan_core::markers::{Marker, MarkerCatalog};
//!
//! let catalog = MarkerCatalog::from_markers(vec![
//!     Marker::new("MK-150-A", 150.0, 6.2, 82.5).with_size("S", 2).with_size("M", 4),
//! ]);
//!
//! let marker = catalog.get("MK-150-A").unwrap();
//! assert_eq!(marker.pieces_per_layer(), 6);
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// One cutting layout from the marker catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Unique marker name (catalog key)
    pub marker_name: String,

    /// Fabric width the marker is laid out for (cm)
    pub marker_width: f64,

    /// Marker length (m)
    pub marker_length: f64,

    /// Layout efficiency (%)
    pub efficiency: f64,

    /// Pieces per size per layer
    #[serde(default)]
    pub size_quantities: BTreeMap<String, u32>,
}

impl Marker {
    /// Create a marker with no size yields
    pub fn new(name: impl Into<String>, width: f64, length: f64, efficiency: f64) -> Self {
        Marker {
            marker_name: name.into(),
            marker_width: width,
            marker_length: length,
            efficiency,
            size_quantities: BTreeMap::new(),
        }
    }

    /// Add a per-size yield (builder pattern)
    pub fn with_size(mut self, size: impl Into<String>, quantity: u32) -> Self {
        self.size_quantities.insert(size.into(), quantity);
        self
    }

    /// Total pieces cut from one layer
    pub fn pieces_per_layer(&self) -> u32 {
        self.size_quantities.values().sum()
    }
}

/// Read-only dictionary of markers keyed by `marker_name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerCatalog {
    markers: HashMap<String, Marker>,
}

impl MarkerCatalog {
    /// Build a catalog; a later marker with the same name replaces an earlier one.
    pub fn from_markers(markers: impl IntoIterator<Item = Marker>) -> Self {
        MarkerCatalog {
            markers: markers
                .into_iter()
                .map(|m| (m.marker_name.clone(), m))
                .collect(),
        }
    }

    /// Look up a marker by name
    pub fn get(&self, name: &str) -> Option<&Marker> {
        self.markers.get(name)
    }

    /// Markers laid out for a fabric width, sorted by name.
    ///
    /// These are the choices left to a row once its width is set.
    pub fn for_width(&self, width: f64) -> Vec<&Marker> {
        let mut matching: Vec<&Marker> = self
            .markers
            .values()
            .filter(|m| (m.marker_width - width).abs() < 1e-6)
            .collect();
        matching.sort_by(|a, b| a.marker_name.cmp(&b.marker_name));
        matching
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
