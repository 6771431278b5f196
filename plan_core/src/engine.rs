//! # Recompute Engine
//!
//! Applies field edits to tables. Every edit goes through the row's formula
//! set ([`techniques::recompute`](crate::techniques::recompute)) and returns a
//! new [`Table`] value; storing it is the caller's business (usually
//! [`TableCollection::replace_table`]).
//!
//! Only the edited row is recomputed, except when the table's `extra_pct`
//! changes, which re-derives every row of the table.
//!
//! The engine also owns the per-row map of debounced dye-lot piece lookups.
//! A dye-lot edit to a real batch, or a size-filter edit while a real batch
//! is set, (re)schedules a lookup for that row; any other dye-lot edit only
//! cancels the pending one. A lookup that cannot be scheduled is reported in
//! [`RowEdit::lookup_error`]; the edit itself still applies. Completed lookups
//! are fed back through [`RecomputeEngine::apply_fetch`].
//!
//! ## Example
//!
//! ```rust
//! use plan_core::engine::RecomputeEngine;
//! use plan_core::order::Order;
//! use plan_core::row::Field;
//! use plan_core::table::TableParams;
//! use plan_core::techniques::Technique;
//!
//! let mut order = Order::new("ORD-1", "ST-1");
//! let mut engine = RecomputeEngine::new(order.settings.clone(), Default::default());
//!
//! let weft = order.collection_mut(Technique::Weft);
//! let table_id = weft.add_table(TableParams { extra_pct: Some(10.0), ..Default::default() });
//! let row_id = weft.add_row(&table_id).unwrap();
//!
//! let mut table = weft.table(&table_id).unwrap().clone();
//! for (field, value) in [
//!     (Field::Pieces, "100"),
//!     (Field::UsableWidth, "150"),
//!     (Field::GrossLength, "0.9"),
//!     (Field::CollarettoWidth, "10"),
//!     (Field::RewoundWidth, "0.3"),
//!     (Field::ScrapRoll, "1"),
//! ] {
//!     table = engine.edit_row(&table, &row_id, field, value).unwrap().table;
//! }
//! weft.replace_table(table).unwrap();
//!
//! let row = weft.table(&table_id).unwrap().row(&row_id).unwrap();
//! assert_eq!(row.details.panels(), Some(3.0));
//! assert_eq!(row.details.planned_consumption(), Some(0.9));
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collection::TableCollection;
use crate::errors::{PlanError, PlanResult};
use crate::lookup::{DyeLotPieceSource, PieceRequest};
use crate::markers::MarkerCatalog;
use crate::numeric::parse_input;
use crate::order::PlanSettings;
use crate::row::{Field, PlanRow};
use crate::scheduler::{FetchOutcome, PieceFetchScheduler};
use crate::table::Table;
use crate::techniques::{recompute, rederive, FormulaContext};

/// A row edit's updated table.
#[derive(Debug, Clone)]
pub struct RowEdit {
    pub table: Table,

    /// Set when the edit called for a piece lookup that could not be
    /// scheduled; `pieces` will not be filled automatically.
    pub lookup_error: Option<PlanError>,
}

/// Applies edits to tables and schedules dye-lot piece lookups.
#[derive(Debug)]
pub struct RecomputeEngine {
    settings: PlanSettings,
    markers: MarkerCatalog,
    fetches: Option<PieceFetchScheduler>,
}

impl RecomputeEngine {
    /// Create an engine without a piece source; dye-lot edits then never
    /// schedule lookups.
    pub fn new(settings: PlanSettings, markers: MarkerCatalog) -> Self {
        RecomputeEngine {
            settings,
            markers,
            fetches: None,
        }
    }

    /// Attach a dye-lot piece source. Returns the receiver completed lookups
    /// are delivered on.
    pub fn with_piece_source(
        mut self,
        source: Arc<dyn DyeLotPieceSource>,
    ) -> (Self, mpsc::UnboundedReceiver<FetchOutcome>) {
        let (scheduler, outcomes) = PieceFetchScheduler::new(source);
        self.fetches = Some(scheduler);
        (self, outcomes)
    }

    pub fn settings(&self) -> &PlanSettings {
        &self.settings
    }

    pub fn markers(&self) -> &MarkerCatalog {
        &self.markers
    }

    /// Swap in a freshly loaded marker catalog.
    pub fn set_markers(&mut self, markers: MarkerCatalog) {
        info!(markers = markers.len(), "Replaced marker catalog");
        self.markers = markers;
    }

    /// Apply one field edit to a row of `table`.
    ///
    /// Returns the updated table and, for dye-lot or size edits, any error
    /// scheduling the piece lookup; `table` itself is untouched. Blank or
    /// non-numeric values never fail: they leave the affected outputs blank.
    pub fn edit_row(
        &mut self,
        table: &Table,
        row_id: &Uuid,
        field: Field,
        raw: &str,
    ) -> PlanResult<RowEdit> {
        let (updated, before, after) = self.recompute_in_table(table, row_id, field, raw)?;
        let lookup_error = match field {
            Field::Bagno | Field::Sizes => self.on_lot_or_sizes_edit(table, &before, &after).err(),
            _ => None,
        };
        Ok(RowEdit {
            table: updated,
            lookup_error,
        })
    }

    /// Change the table's extra percentage and re-derive every row.
    pub fn set_extra_pct(&self, table: &Table, raw: &str) -> Table {
        let mut updated = table.clone();
        updated.params.extra_pct = parse_input(raw);
        let ctx = FormulaContext::new(&updated.params, &self.markers);
        updated.rows = updated.rows.iter().map(|row| rederive(row, &ctx)).collect();
        debug!(table_id = %table.id, extra_pct = ?updated.params.extra_pct, rows = updated.rows.len(), "Recomputed table");
        updated
    }

    /// Re-derive every row of a table from its current inputs.
    pub fn recompute_table(&self, table: &Table) -> Table {
        let mut updated = table.clone();
        let ctx = FormulaContext::new(&table.params, &self.markers);
        updated.rows = table.rows.iter().map(|row| rederive(row, &ctx)).collect();
        updated
    }

    /// Remove a row from its collection, cancelling its pending lookup.
    pub fn remove_row(
        &mut self,
        collection: &mut TableCollection,
        table_id: &Uuid,
        row_id: &Uuid,
    ) -> PlanResult<PlanRow> {
        let removed = collection.remove_row(table_id, row_id)?;
        if let Some(fetches) = self.fetches.as_mut() {
            fetches.cancel(row_id);
        }
        Ok(removed)
    }

    /// Remove a table from its collection, cancelling its rows' pending lookups.
    pub fn remove_table(
        &mut self,
        collection: &mut TableCollection,
        table_id: &Uuid,
    ) -> PlanResult<Table> {
        let removed = collection.remove_table(table_id)?;
        if let Some(fetches) = self.fetches.as_mut() {
            for row in &removed.rows {
                fetches.cancel(&row.id);
            }
        }
        Ok(removed)
    }

    /// Apply a completed piece lookup to the table it was scheduled for.
    ///
    /// - `Ok(Some(table))`: the row's `pieces` was filled and its outputs
    ///   recomputed.
    /// - `Ok(None)`: the outcome was superseded by a later edit, or the row is
    ///   gone; nothing to store.
    /// - `Err(TableNotFound)`: `table` is not the table the lookup was
    ///   scheduled for; the outcome stays pending and can be applied again.
    /// - `Err(LookupFailed)`: the lookup failed; keep the current table.
    pub fn apply_fetch(&mut self, table: &Table, outcome: &FetchOutcome) -> PlanResult<Option<Table>> {
        let request = &outcome.request;
        let Some(fetches) = self.fetches.as_mut().filter(|f| f.is_current(outcome)) else {
            debug!(row_id = %request.row_id, generation = outcome.generation, "Discarded stale piece lookup");
            return Ok(None);
        };
        if request.table_id != table.id {
            return Err(PlanError::table_not_found(request.table_id));
        }
        fetches.complete(outcome);

        let availability = match &outcome.result {
            Ok(availability) => availability,
            Err(err) => {
                warn!(row_id = %request.row_id, bagno = %request.bagno, error = %err, "Piece lookup failed, pieces unchanged");
                return Err(match err {
                    PlanError::LookupFailed { .. } => err.clone(),
                    other => PlanError::lookup_failed("dye-lot pieces", other.to_string()),
                });
            }
        };

        let Some(row) = table.row(&request.row_id) else {
            debug!(row_id = %request.row_id, "Row removed before lookup completed");
            return Ok(None);
        };
        if row.bagno != request.bagno || row.sizes != request.sizes {
            debug!(row_id = %request.row_id, "Row lot/sizes changed since lookup was scheduled");
            return Ok(None);
        }

        let pieces = availability.pieces.to_string();
        let (updated, _, _) = self.recompute_in_table(table, &request.row_id, Field::Pieces, &pieces)?;
        info!(row_id = %request.row_id, bagno = %request.bagno, pieces = availability.pieces, "Filled pieces from dye lot");
        Ok(Some(updated))
    }

    /// Whether a lookup is pending for a row
    pub fn is_fetch_pending(&self, row_id: &Uuid) -> bool {
        self.fetches.as_ref().is_some_and(|f| f.is_pending(row_id))
    }

    /// Number of pending lookups
    pub fn pending_fetches(&self) -> usize {
        self.fetches.as_ref().map_or(0, |f| f.pending_count())
    }

    fn recompute_in_table(
        &self,
        table: &Table,
        row_id: &Uuid,
        field: Field,
        raw: &str,
    ) -> PlanResult<(Table, PlanRow, PlanRow)> {
        let index = table
            .row_index(row_id)
            .ok_or_else(|| PlanError::row_not_found(table.id, row_id))?;
        let before = &table.rows[index];
        if !before.is_editable() {
            return Err(PlanError::row_not_editable(row_id, before.status.code()));
        }

        let ctx = FormulaContext::new(&table.params, &self.markers);
        let after = recompute(before, field, raw, &ctx);

        let mut updated = table.clone();
        updated.rows[index] = after.clone();
        Ok((updated, before.clone(), after))
    }

    fn on_lot_or_sizes_edit(
        &mut self,
        table: &Table,
        before: &PlanRow,
        after: &PlanRow,
    ) -> PlanResult<()> {
        if before.bagno == after.bagno && before.sizes == after.sizes {
            return Ok(());
        }
        let Some(delay) = self.settings.fetch_debounce.delay_for(table.technique) else {
            return Ok(());
        };
        let Some(fetches) = self.fetches.as_mut() else {
            return Ok(());
        };

        if !after.has_valid_bagno() {
            fetches.cancel(&after.id);
            return Ok(());
        }

        let request = PieceRequest {
            bagno: after.bagno.clone(),
            table_id: table.id,
            row_id: after.id,
            table_type: table.technique,
            sizes: after.sizes.clone(),
        };
        fetches.schedule(request, delay).map(|_| ())
    }
}
