//! # plan_core - Fabric-Cutting Order Planning Engine
//!
//! `plan_core` holds the planning state of a production order: per-technique
//! tables of cutting rows, the formulas that derive each row's outputs from
//! its inputs, debounced dye-lot piece lookups and the read-only aggregations
//! shown on the planning and report screens. All state is JSON-serializable
//! so it can be loaded from and sent back to the order backend unchanged.
//!
//! ## Design Philosophy
//!
//! - **Pure recompute**: an edit yields a new row; derived fields never drift
//! - **JSON-First**: every type implements Serialize/Deserialize
//! - **Rich Errors**: structured [`PlanError`] values, not strings
//! - **Async at the edges**: only lookups against the backend are async
//!
//! ## Quick Start
//!
//! ```rust
//! use plan_core::row::Field;
//! use plan_core::{Order, RecomputeEngine, Technique};
//!
//! let mut order = Order::new("ORD-1001", "STYLE-A");
//! let mut engine = RecomputeEngine::new(order.settings.clone(), Default::default());
//!
//! let along = order.collection_mut(Technique::Along);
//! let table_id = along.add_table(Default::default());
//! let row_id = along.add_row(&table_id).unwrap();
//!
//! let table = along.table(&table_id).unwrap().clone();
//! let table = engine.edit_row(&table, &row_id, Field::Pieces, "73").unwrap().table;
//! assert_eq!(table.rows[0].details.pieces(), Some(73.0));
//! ```
//!
//! ## Modules
//!
//! - [`order`] - Order container, metadata, settings and backend payload
//! - [`collection`] - Tables of one technique and pending deletions
//! - [`table`] / [`row`] - Plan tables and their rows
//! - [`techniques`] - Per-technique inputs, outputs and formulas
//! - [`engine`] - Edit entry point tying formulas and lookups together
//! - [`scheduler`] / [`lookup`] - Debounced dye-lot piece lookups
//! - [`aggregation`] - Per-size, per-dye-lot and summary totals
//! - [`markers`] - Marker catalog for Mattress / Adhesive rows
//! - [`numeric`] / [`units`] - Input parsing, rounding and unit wrappers
//! - [`errors`] - Structured error types

pub mod aggregation;
pub mod collection;
pub mod engine;
pub mod errors;
pub mod lookup;
pub mod markers;
pub mod numeric;
pub mod order;
pub mod row;
pub mod scheduler;
pub mod table;
pub mod techniques;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use collection::TableCollection;
pub use engine::{RecomputeEngine, RowEdit};
pub use errors::{PlanError, PlanResult};
pub use order::{Order, OrderPayload, PlanSettings};
pub use row::{Field, PlanRow, RowStatus};
pub use table::{Table, TableParams};
pub use techniques::{RowDetails, Technique};
