//! # Order Data Structures
//!
//! The `Order` struct is the root container for one production order's
//! cutting plan: one [`TableCollection`] per technique plus metadata and
//! planning settings.
//!
//! ## Structure
//!
//! ```text
//! Order
//! ├── meta: OrderMetadata (version, order id, style, timestamps)
//! ├── settings: PlanSettings (lookup debounce per technique)
//! └── collections: one TableCollection per technique
//! ```
//!
//! ## Persistence shape
//!
//! The backend loads and saves an [`OrderPayload`]: tables keyed by
//! technique, rows carrying `sequence_number`, `dye_lot` and a nested
//! `details` bag. Rows and tables that arrive without an engine id get one on
//! load; ids and derived values round-trip unchanged.
//!
//! ## Example
//!
//! ```rust
//! use plan_core::order::Order;
//! use plan_core::table::TableParams;
//! use plan_core::techniques::Technique;
//!
//! let mut order = Order::new("ORD-2291", "ST-450");
//! let table_id = order.collection_mut(Technique::Along).add_table(TableParams::default());
//! order.collection_mut(Technique::Along).add_row(&table_id).unwrap();
//!
//! let json = serde_json::to_string(&order.to_payload()).unwrap();
//! let restored = Order::from_payload_json(&json).unwrap();
//! assert_eq!(restored.collection(Technique::Along).tables()[0].rows.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collection::{DeletionLog, TableCollection};
use crate::errors::{PlanError, PlanResult};
use crate::table::Table;
use crate::techniques::Technique;

/// Current schema version of the order payload
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root container of an order's cutting plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub meta: OrderMetadata,

    #[serde(default)]
    pub settings: PlanSettings,

    collections: TechniqueCollections,
}

impl Order {
    /// Create an order with empty collections for every technique.
    pub fn new(order_id: impl Into<String>, style: impl Into<String>) -> Self {
        let now = Utc::now();
        Order {
            meta: OrderMetadata {
                version: SCHEMA_VERSION.to_string(),
                order_id: order_id.into(),
                style: style.into(),
                created: now,
                modified: now,
            },
            settings: PlanSettings::default(),
            collections: TechniqueCollections::default(),
        }
    }

    /// Builder-style settings
    pub fn with_settings(mut self, settings: PlanSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Collection of a technique
    pub fn collection(&self, technique: Technique) -> &TableCollection {
        self.collections.get(technique)
    }

    /// Mutable collection of a technique.
    ///
    /// Note: marks the order as modified.
    pub fn collection_mut(&mut self, technique: Technique) -> &mut TableCollection {
        self.meta.modified = Utc::now();
        self.collections.get_mut(technique)
    }

    /// All tables of every technique, in technique then creation order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        Technique::ALL
            .into_iter()
            .flat_map(move |t| self.collection(t).tables().iter())
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Collect removed backend identifiers from every collection.
    pub fn take_deletions(&mut self) -> BTreeMap<Technique, DeletionLog> {
        Technique::ALL
            .into_iter()
            .map(|t| (t, self.collections.get_mut(t).take_deletions()))
            .filter(|(_, log)| !log.is_empty())
            .collect()
    }

    /// Build the persistence payload.
    pub fn to_payload(&self) -> OrderPayload {
        OrderPayload {
            order_id: self.meta.order_id.clone(),
            style: self.meta.style.clone(),
            tables: Technique::ALL
                .into_iter()
                .map(|t| (t, self.collection(t).tables().to_vec()))
                .collect(),
        }
    }

    /// Rebuild an order from a persistence payload.
    pub fn from_payload(payload: OrderPayload) -> PlanResult<Self> {
        let mut order = Order::new(payload.order_id, payload.style);
        let mut count = 0;
        for (technique, tables) in payload.tables {
            let collection = order.collection_mut(technique);
            for table in tables {
                collection.insert_table(table)?;
                count += 1;
            }
        }
        info!(order_id = %order.meta.order_id, tables = count, "Loaded order");
        Ok(order)
    }

    /// Parse and rebuild an order from payload JSON.
    pub fn from_payload_json(json: &str) -> PlanResult<Self> {
        let payload: OrderPayload = serde_json::from_str(json)?;
        Order::from_payload(payload)
    }
}

/// The five technique collections of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TechniqueCollections {
    mattress: TableCollection,
    adhesive: TableCollection,
    along: TableCollection,
    bias: TableCollection,
    weft: TableCollection,
}

impl Default for TechniqueCollections {
    fn default() -> Self {
        TechniqueCollections {
            mattress: TableCollection::new(Technique::Mattress),
            adhesive: TableCollection::new(Technique::Adhesive),
            along: TableCollection::new(Technique::Along),
            bias: TableCollection::new(Technique::Bias),
            weft: TableCollection::new(Technique::Weft),
        }
    }
}

impl TechniqueCollections {
    fn get(&self, technique: Technique) -> &TableCollection {
        match technique {
            Technique::Mattress => &self.mattress,
            Technique::Adhesive => &self.adhesive,
            Technique::Along => &self.along,
            Technique::Bias => &self.bias,
            Technique::Weft => &self.weft,
        }
    }

    fn get_mut(&mut self, technique: Technique) -> &mut TableCollection {
        match technique {
            Technique::Mattress => &mut self.mattress,
            Technique::Adhesive => &mut self.adhesive,
            Technique::Along => &mut self.along,
            Technique::Bias => &mut self.bias,
            Technique::Weft => &mut self.weft,
        }
    }
}

/// Order metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Production order number
    pub order_id: String,

    /// Garment style the markers are fetched for
    pub style: String,

    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Tables of an order as exchanged with the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub order_id: String,

    #[serde(default)]
    pub style: String,

    #[serde(default)]
    pub tables: BTreeMap<Technique, Vec<Table>>,
}

/// Planning settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
    /// Delay before a dye-lot piece lookup fires, per technique
    pub fetch_debounce: FetchDebounce,
}

impl PlanSettings {
    /// Parse settings JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> PlanResult<Self> {
        serde_json::from_str(json).map_err(PlanError::from)
    }
}

/// Debounce delays (ms) of the dye-lot piece lookup.
///
/// Mattress and Adhesive rows have no `pieces` input and never schedule a
/// lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchDebounce {
    pub along_ms: u64,
    pub weft_ms: u64,
    pub bias_ms: u64,
}

impl Default for FetchDebounce {
    fn default() -> Self {
        FetchDebounce {
            along_ms: 300,
            weft_ms: 500,
            bias_ms: 1500,
        }
    }
}

impl FetchDebounce {
    /// Delay for a technique, `None` if it never looks up pieces
    pub fn delay_for(&self, technique: Technique) -> Option<Duration> {
        let ms = match technique {
            Technique::Along => self.along_ms,
            Technique::Weft => self.weft_ms,
            Technique::Bias => self.bias_ms,
            Technique::Mattress | Technique::Adhesive => return None,
        };
        Some(Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableParams;

    #[test]
    fn test_order_creation() {
        let order = Order::new("ORD-1", "ST-9");
        assert_eq!(order.meta.order_id, "ORD-1");
        assert_eq!(order.meta.version, SCHEMA_VERSION);
        for technique in Technique::ALL {
            assert!(order.collection(technique).is_empty());
            assert_eq!(order.collection(technique).technique(), technique);
        }
    }

    #[test]
    fn test_payload_roundtrip_is_lossless() {
        let mut order = Order::new("ORD-1", "ST-9");
        let params = TableParams {
            fabric_code: "F-100".to_string(),
            extra_pct: Some(5.0),
            ..TableParams::default()
        };
        let table_id = order.collection_mut(Technique::Weft).add_table(params);
        let row_id = order.collection_mut(Technique::Weft).add_row(&table_id).unwrap();

        let mut table = order.collection(Technique::Weft).table(&table_id).unwrap().clone();
        table.rows[0].bagno = "B-3".to_string();
        table.rows[0].external_id = Some("r-77".to_string());
        order.collection_mut(Technique::Weft).replace_table(table).unwrap();

        let payload = order.to_payload();
        let json = serde_json::to_string_pretty(&payload).unwrap();
        assert!(json.contains("\"sequence_number\": 1"));
        assert!(json.contains("\"dye_lot\": \"B-3\""));
        assert!(json.contains("\"details\""));

        let restored = Order::from_payload_json(&json).unwrap();
        assert_eq!(restored.to_payload(), payload);
        let row = restored
            .collection(Technique::Weft)
            .table(&table_id)
            .unwrap()
            .row(&row_id)
            .unwrap();
        assert_eq!(row.external_id.as_deref(), Some("r-77"));
    }

    #[test]
    fn test_backend_payload_without_engine_ids() {
        let json = r#"{
            "order_id": "ORD-5",
            "tables": {
                "Along": [{
                    "external_id": "t-1",
                    "technique": "Along",
                    "params": { "fabric_type": "Jersey", "extra_pct": 3 },
                    "rows": [
                        { "external_id": "r-2", "sequence_number": 2, "dye_lot": "B-1",
                          "details": { "kind": "along", "pieces": 10 } },
                        { "external_id": "r-1", "sequence_number": 1, "dye_lot": "",
                          "details": { "kind": "along" } }
                    ]
                }]
            }
        }"#;
        let order = Order::from_payload_json(json).unwrap();
        let table = &order.collection(Technique::Along).tables()[0];
        assert_eq!(table.params.extra_pct, Some(3.0));
        assert_eq!(table.rows[0].external_id.as_deref(), Some("r-1"));
        assert_eq!(table.rows[1].details.pieces(), Some(10.0));
        assert_eq!(table.rows[0].sizes, "ALL");
        assert_eq!(table.next_sequence_number().unwrap(), 3);
    }

    #[test]
    fn test_add_row_after_max_sequence_number() {
        let json = r#"{
            "order_id": "ORD-6",
            "tables": {
                "Weft": [{
                    "technique": "Weft",
                    "rows": [{ "sequence_number": 4294967295, "details": { "kind": "weft" } }]
                }]
            }
        }"#;
        let mut order = Order::from_payload_json(json).unwrap();
        let weft = order.collection_mut(Technique::Weft);
        let table_id = weft.tables()[0].id;

        let err = weft.add_row(&table_id).unwrap_err();
        assert_eq!(err.error_code(), "SEQUENCE_EXHAUSTED");
        assert_eq!(weft.table(&table_id).unwrap().len(), 1);
    }

    #[test]
    fn test_payload_technique_mismatch() {
        let json = r#"{
            "order_id": "ORD-5",
            "tables": { "Bias": [{ "technique": "Weft" }] }
        }"#;
        let err = Order::from_payload_json(json).unwrap_err();
        assert_eq!(err.error_code(), "TECHNIQUE_MISMATCH");
    }

    #[test]
    fn test_take_deletions() {
        let mut order = Order::new("ORD-1", "ST-9");
        let table_id = order.collection_mut(Technique::Bias).add_table(TableParams::default());
        let mut table = order.collection(Technique::Bias).table(&table_id).unwrap().clone();
        table.external_id = Some("t-5".to_string());
        order.collection_mut(Technique::Bias).replace_table(table).unwrap();
        order.collection_mut(Technique::Bias).remove_table(&table_id).unwrap();

        let deletions = order.take_deletions();
        assert_eq!(deletions.len(), 1);
        assert_eq!(deletions[&Technique::Bias].tables, vec!["t-5".to_string()]);
        assert!(order.take_deletions().is_empty());
    }

    #[test]
    fn test_settings_defaults_and_overrides() {
        let defaults = PlanSettings::default();
        assert_eq!(
            defaults.fetch_debounce.delay_for(Technique::Bias),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(defaults.fetch_debounce.delay_for(Technique::Mattress), None);

        let settings = PlanSettings::from_json(r#"{ "fetch_debounce": { "weft_ms": 800 } }"#).unwrap();
        assert_eq!(settings.fetch_debounce.weft_ms, 800);
        assert_eq!(settings.fetch_debounce.along_ms, 300);
        assert!(PlanSettings::from_json("{ nope").is_err());
    }
}
