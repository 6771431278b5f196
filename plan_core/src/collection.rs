//! # Table Collections
//!
//! One [`TableCollection`] per technique per order. It owns the tables, hands
//! out row ids and sequence numbers, and remembers the backend identifiers of
//! everything removed so the persistence layer can delete them on save.
//!
//! ## Sequence numbers
//!
//! A new row receives `max(existing) + 1`. Gaps left by removals are kept;
//! rows are never renumbered.
//!
//! ## Example
//!
//! ```rust
//! use plan_core::collection::TableCollection;
//! use plan_core::table::TableParams;
//! use plan_core::techniques::Technique;
//!
//! let mut weft = TableCollection::new(Technique::Weft);
//! let table_id = weft.add_table(TableParams::default());
//! let first = weft.add_row(&table_id).unwrap();
//! let second = weft.add_row(&table_id).unwrap();
//! weft.remove_row(&table_id, &first).unwrap();
//! let third = weft.add_row(&table_id).unwrap();
//!
//! let table = weft.table(&table_id).unwrap();
//! assert_eq!(table.row(&second).unwrap().sequence_number, 2);
//! assert_eq!(table.row(&third).unwrap().sequence_number, 3);
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::{PlanError, PlanResult};
use crate::row::PlanRow;
use crate::table::{Table, TableParams};
use crate::techniques::Technique;

/// Backend identifiers removed since the last save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeletionLog {
    pub tables: Vec<String>,
    pub rows: Vec<String>,
}

impl DeletionLog {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.rows.is_empty()
    }
}

/// Ordered tables of one technique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCollection {
    technique: Technique,
    tables: Vec<Table>,
    #[serde(default)]
    deleted: DeletionLog,
}

impl TableCollection {
    /// Create an empty collection
    pub fn new(technique: Technique) -> Self {
        TableCollection {
            technique,
            tables: Vec::new(),
            deleted: DeletionLog::default(),
        }
    }

    pub fn technique(&self) -> Technique {
        self.technique
    }

    /// Tables in creation order
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Get a table by id
    pub fn table(&self, table_id: &Uuid) -> PlanResult<&Table> {
        self.tables
            .iter()
            .find(|t| t.id == *table_id)
            .ok_or_else(|| PlanError::table_not_found(table_id))
    }

    fn table_mut(&mut self, table_id: &Uuid) -> PlanResult<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.id == *table_id)
            .ok_or_else(|| PlanError::table_not_found(table_id))
    }

    /// Create an empty table and return its id.
    pub fn add_table(&mut self, params: TableParams) -> Uuid {
        let table = Table::new(self.technique).with_params(params);
        let id = table.id;
        self.tables.push(table);
        info!(table_id = %id, technique = %self.technique, "Added table");
        id
    }

    /// Adopt an existing table (e.g. loaded from the backend).
    ///
    /// Rows are sorted by sequence number; every row must be of the
    /// collection's technique.
    pub fn insert_table(&mut self, mut table: Table) -> PlanResult<Uuid> {
        if table.technique != self.technique {
            return Err(PlanError::technique_mismatch(
                self.technique.code(),
                table.technique.code(),
            ));
        }
        if let Some(row) = table.rows.iter().find(|r| r.technique() != self.technique) {
            return Err(PlanError::technique_mismatch(
                self.technique.code(),
                row.technique().code(),
            ));
        }
        table.rows.sort_by_key(|r| r.sequence_number);
        debug_assert!(
            table.has_unique_sequence_numbers(),
            "duplicate sequence number in table {}",
            table.id
        );
        let id = table.id;
        self.tables.push(table);
        Ok(id)
    }

    /// Replace a table with an updated value of the same id.
    ///
    /// This is how engine output is stored back.
    pub fn replace_table(&mut self, table: Table) -> PlanResult<()> {
        if table.technique != self.technique {
            return Err(PlanError::technique_mismatch(
                self.technique.code(),
                table.technique.code(),
            ));
        }
        debug_assert!(table.has_unique_sequence_numbers());
        let slot = self.table_mut(&table.id)?;
        *slot = table;
        Ok(())
    }

    /// Remove a table and, with it, all of its rows.
    pub fn remove_table(&mut self, table_id: &Uuid) -> PlanResult<Table> {
        let index = self
            .tables
            .iter()
            .position(|t| t.id == *table_id)
            .ok_or_else(|| PlanError::table_not_found(table_id))?;
        let table = self.tables.remove(index);

        self.deleted
            .rows
            .extend(table.rows.iter().filter_map(|r| r.external_id.clone()));
        if let Some(external) = &table.external_id {
            self.deleted.tables.push(external.clone());
        }
        info!(table_id = %table_id, rows = table.rows.len(), "Removed table");
        Ok(table)
    }

    /// Append a blank row with sequence number `max + 1`.
    pub fn add_row(&mut self, table_id: &Uuid) -> PlanResult<Uuid> {
        let technique = self.technique;
        let table = self.table_mut(table_id)?;
        let row = PlanRow::new(technique, table.next_sequence_number()?);
        let id = row.id;
        info!(table_id = %table_id, row_id = %id, sequence_number = row.sequence_number, "Added row");
        table.insert_sorted(row);
        Ok(id)
    }

    /// Remove a row, recording its backend identifier for deletion sync.
    pub fn remove_row(&mut self, table_id: &Uuid, row_id: &Uuid) -> PlanResult<PlanRow> {
        let table = self.table_mut(table_id)?;
        let index = table
            .row_index(row_id)
            .ok_or_else(|| PlanError::row_not_found(table_id, row_id))?;
        let row = table.rows.remove(index);
        if let Some(external) = &row.external_id {
            self.deleted.rows.push(external.clone());
        }
        info!(table_id = %table_id, row_id = %row_id, "Removed row");
        Ok(row)
    }

    /// Removed backend identifiers not yet synced
    pub fn pending_deletions(&self) -> &DeletionLog {
        &self.deleted
    }

    /// Hand over removed backend identifiers and reset the log.
    pub fn take_deletions(&mut self) -> DeletionLog {
        std::mem::take(&mut self.deleted)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection_with_rows(n: usize) -> (TableCollection, Uuid, Vec<Uuid>) {
        let mut collection = TableCollection::new(Technique::Along);
        let table_id = collection.add_table(TableParams::default());
        let rows = (0..n)
            .map(|_| collection.add_row(&table_id).unwrap())
            .collect();
        (collection, table_id, rows)
    }

    #[test]
    fn test_sequence_numbers_max_plus_one() {
        let (mut collection, table_id, rows) = collection_with_rows(3);
        collection.remove_row(&table_id, &rows[2]).unwrap();
        collection.remove_row(&table_id, &rows[0]).unwrap();
        let new_row = collection.add_row(&table_id).unwrap();

        let table = collection.table(&table_id).unwrap();
        let seqs: Vec<_> = table.rows.iter().map(|r| r.sequence_number).collect();
        // gap at 1 kept, 3 reused as max(2) + 1
        assert_eq!(seqs, vec![2, 3]);
        assert_eq!(table.row(&new_row).unwrap().sequence_number, 3);
    }

    #[test]
    fn test_remove_row_tracks_external_id() {
        let (mut collection, table_id, rows) = collection_with_rows(2);
        let mut table = collection.table(&table_id).unwrap().clone();
        table.rows[0].external_id = Some("row-1".to_string());
        collection.replace_table(table).unwrap();

        collection.remove_row(&table_id, &rows[0]).unwrap();
        collection.remove_row(&table_id, &rows[1]).unwrap();
        assert_eq!(collection.pending_deletions().rows, vec!["row-1".to_string()]);

        let log = collection.take_deletions();
        assert_eq!(log.rows.len(), 1);
        assert!(collection.pending_deletions().is_empty());
    }

    #[test]
    fn test_remove_table_cascades() {
        let (mut collection, table_id, _) = collection_with_rows(2);
        let mut table = collection.table(&table_id).unwrap().clone();
        table.external_id = Some("tbl-9".to_string());
        table.rows[0].external_id = Some("row-a".to_string());
        table.rows[1].external_id = Some("row-b".to_string());
        collection.replace_table(table).unwrap();

        let removed = collection.remove_table(&table_id).unwrap();
        assert_eq!(removed.rows.len(), 2);
        assert!(collection.is_empty());
        let log = collection.pending_deletions();
        assert_eq!(log.tables, vec!["tbl-9".to_string()]);
        assert_eq!(log.rows, vec!["row-a".to_string(), "row-b".to_string()]);
    }

    #[test]
    fn test_unknown_ids() {
        let (mut collection, table_id, _) = collection_with_rows(1);
        let missing = Uuid::new_v4();
        assert_eq!(
            collection.add_row(&missing).unwrap_err().error_code(),
            "TABLE_NOT_FOUND"
        );
        assert_eq!(
            collection.remove_row(&table_id, &missing).unwrap_err().error_code(),
            "ROW_NOT_FOUND"
        );
    }

    #[test]
    fn test_insert_table_rejects_other_technique() {
        let mut collection = TableCollection::new(Technique::Weft);
        let err = collection.insert_table(Table::new(Technique::Bias)).unwrap_err();
        assert_eq!(err.error_code(), "TECHNIQUE_MISMATCH");

        let mut table = Table::new(Technique::Weft);
        table.rows.push(PlanRow::new(Technique::Along, 1));
        assert!(collection.insert_table(table).is_err());
    }

    #[test]
    fn test_insert_table_sorts_rows() {
        let mut collection = TableCollection::new(Technique::Weft);
        let mut table = Table::new(Technique::Weft);
        table.rows.push(PlanRow::new(Technique::Weft, 7));
        table.rows.push(PlanRow::new(Technique::Weft, 2));
        let id = collection.insert_table(table).unwrap();
        let seqs: Vec<_> = collection
            .table(&id)
            .unwrap()
            .rows
            .iter()
            .map(|r| r.sequence_number)
            .collect();
        assert_eq!(seqs, vec![2, 7]);
        assert_eq!(collection.table(&id).unwrap().next_sequence_number().unwrap(), 8);
    }
}
