//! # Plan Tables
//!
//! A [`Table`] owns an ordered set of same-technique rows plus the fabric
//! parameters shared by all of them. Along and Weft tables also carry an
//! `extra_pct` overhead applied to every row's consumption.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{PlanError, PlanResult};
use crate::row::PlanRow;
use crate::techniques::Technique;

/// Technique-level parameters shared by every row of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableParams {
    pub fabric_type: String,
    pub fabric_code: String,
    pub fabric_color: String,

    /// Extra percentage (Along / Weft only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_pct: Option<f64>,
}

/// Ordered rows of one technique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Engine-assigned identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Backend identifier, present once the table has been saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    pub technique: Technique,

    #[serde(default)]
    pub params: TableParams,

    /// Rows sorted by `sequence_number`
    #[serde(default)]
    pub rows: Vec<PlanRow>,
}

impl Table {
    /// Create an empty table
    pub fn new(technique: Technique) -> Self {
        Table {
            id: Uuid::new_v4(),
            external_id: None,
            technique,
            params: TableParams::default(),
            rows: Vec::new(),
        }
    }

    /// Builder-style params
    pub fn with_params(mut self, params: TableParams) -> Self {
        self.params = params;
        self
    }

    /// Get a row by id
    pub fn row(&self, row_id: &Uuid) -> Option<&PlanRow> {
        self.rows.iter().find(|r| r.id == *row_id)
    }

    /// Position of a row in display order
    pub fn row_index(&self, row_id: &Uuid) -> Option<usize> {
        self.rows.iter().position(|r| r.id == *row_id)
    }

    /// Sequence number a new row receives: max(existing) + 1.
    ///
    /// Fails once the highest sequence number is `u32::MAX`.
    pub fn next_sequence_number(&self) -> PlanResult<u32> {
        match self.rows.iter().map(|r| r.sequence_number).max() {
            None => Ok(1),
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| PlanError::sequence_exhausted(self.id)),
        }
    }

    /// Insert a row keeping sequence order
    pub(crate) fn insert_sorted(&mut self, row: PlanRow) {
        let at = self
            .rows
            .partition_point(|r| r.sequence_number < row.sequence_number);
        self.rows.insert(at, row);
    }

    /// Whether every sequence number is unique
    pub fn has_unique_sequence_numbers(&self) -> bool {
        self.rows
            .windows(2)
            .all(|pair| pair[0].sequence_number < pair[1].sequence_number)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_sequence_number() {
        let mut table = Table::new(Technique::Along);
        assert_eq!(table.next_sequence_number().unwrap(), 1);
        table.insert_sorted(PlanRow::new(Technique::Along, 1));
        table.insert_sorted(PlanRow::new(Technique::Along, 5));
        assert_eq!(table.next_sequence_number().unwrap(), 6);
    }

    #[test]
    fn test_next_sequence_number_at_max() {
        let mut table = Table::new(Technique::Along);
        table.insert_sorted(PlanRow::new(Technique::Along, u32::MAX));
        let err = table.next_sequence_number().unwrap_err();
        assert_eq!(err.error_code(), "SEQUENCE_EXHAUSTED");
    }

    #[test]
    fn test_insert_sorted_keeps_order() {
        let mut table = Table::new(Technique::Bias);
        table.insert_sorted(PlanRow::new(Technique::Bias, 3));
        table.insert_sorted(PlanRow::new(Technique::Bias, 1));
        table.insert_sorted(PlanRow::new(Technique::Bias, 2));
        let seqs: Vec<_> = table.rows.iter().map(|r| r.sequence_number).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert!(table.has_unique_sequence_numbers());
    }

    #[test]
    fn test_row_lookup() {
        let mut table = Table::new(Technique::Weft);
        let row = PlanRow::new(Technique::Weft, 1);
        let id = row.id;
        table.insert_sorted(row);
        assert_eq!(table.row_index(&id), Some(0));
        assert!(table.row(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_params_default_when_missing() {
        let table: Table = serde_json::from_str(r#"{ "technique": "Along" }"#).unwrap();
        assert_eq!(table.params, TableParams::default());
        assert!(table.is_empty());
    }
}
