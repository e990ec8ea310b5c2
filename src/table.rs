//! The `Table` façade and `ColumnSelector` (spec §6): an ordered list of
//! labeled columns with optional per-column metadata, and a chained
//! predicate builder for picking columns out of it.

use std::collections::HashMap;

use crate::column::{CapabilitySet, Column, ColumnCategory, ColumnTypeId};
use crate::error::Error;

/// An ordered list of labeled columns, all the same length.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    labels: Vec<String>,
    label_index: HashMap<String, usize>,
    meta: HashMap<String, HashMap<String, String>>,
}

impl Table {
    /// An empty table with no columns.
    pub fn new() -> Self {
        Table::default()
    }

    /// Appends `column` under `label`. Fails if `label` is already in use,
    /// or if the table already has columns and `column`'s length disagrees
    /// with theirs.
    pub fn push_column(&mut self, label: impl Into<String>, column: Column) -> Result<(), Error> {
        let label = label.into();
        if self.label_index.contains_key(&label) {
            return Err(Error::invalid_argument(format!("duplicate column label {label:?}")));
        }
        if let Some(existing) = self.columns.first() {
            if existing.size() != column.size() {
                return Err(Error::invalid_argument(
                    "column length does not match the table's existing columns",
                ));
            }
        }
        self.label_index.insert(label.clone(), self.columns.len());
        self.labels.push(label);
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows, or `0` for a table with no columns.
    pub fn height(&self) -> usize {
        self.columns.first().map(Column::size).unwrap_or(0)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, label: &str) -> Option<&Column> {
        self.label_index.get(label).map(|&i| &self.columns[i])
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Attaches a metadata `value` under `key` to the column named `label`.
    /// Overwrites any previous value for the same key.
    pub fn set_meta(&mut self, label: &str, key: impl Into<String>, value: impl Into<String>) -> Result<(), Error> {
        if !self.label_index.contains_key(label) {
            return Err(Error::invalid_argument(format!("no column labeled {label:?}")));
        }
        self.meta.entry(label.to_string()).or_default().insert(key.into(), value.into());
        Ok(())
    }

    pub fn meta(&self, label: &str, key: &str) -> Option<&str> {
        self.meta.get(label)?.get(key).map(String::as_str)
    }

    /// Starts a [`ColumnSelector`] over this table's columns.
    pub fn select(&self) -> ColumnSelector<'_> {
        ColumnSelector {
            table: self,
            predicates: Vec::new(),
        }
    }
}

/// A chained, logical-AND predicate builder over a table's columns. Each
/// `of_*`/`with_*` call narrows the set further; [`ColumnSelector::labels`]
/// and [`ColumnSelector::columns`] resolve the final selection.
pub struct ColumnSelector<'t> {
    table: &'t Table,
    predicates: Vec<Box<dyn Fn(usize, &Column) -> bool + 't>>,
}

impl<'t> ColumnSelector<'t> {
    pub fn of_type_id(mut self, id: ColumnTypeId) -> Self {
        self.predicates.push(Box::new(move |_, c| c.column_type().id == id));
        self
    }

    pub fn of_category(mut self, category: ColumnCategory) -> Self {
        self.predicates.push(Box::new(move |_, c| c.column_type().category == category));
        self
    }

    pub fn with_capability(mut self, capability: CapabilitySet) -> Self {
        self.predicates.push(Box::new(move |_, c| c.has_capability(capability)));
        self
    }

    /// Keeps columns that carry `key = value` in their table metadata.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        let table = self.table;
        self.predicates.push(Box::new(move |i, _| {
            let label = &table.labels[i];
            table.meta(label, &key) == Some(value.as_str())
        }));
        self
    }

    fn matches(&self, index: usize, column: &Column) -> bool {
        self.predicates.iter().all(|p| p(index, column))
    }

    /// Labels of the columns matching every predicate, in table order.
    pub fn labels(&self) -> Vec<String> {
        self.table
            .columns
            .iter()
            .enumerate()
            .filter(|(i, c)| self.matches(*i, c))
            .map(|(i, _)| self.table.labels[i].clone())
            .collect()
    }

    /// The columns matching every predicate, in table order.
    pub fn columns(&self) -> Vec<&Column> {
        self.table
            .columns
            .iter()
            .enumerate()
            .filter(|(i, c)| self.matches(*i, c))
            .map(|(_, c)| c)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColumnType, DenseNumericColumn};

    fn numeric(values: &[f64]) -> Column {
        Column::DenseNumeric(DenseNumericColumn::new(values.to_vec(), ColumnType::real()))
    }

    #[test]
    fn push_column_rejects_duplicate_labels() {
        let mut table = Table::new();
        table.push_column("a", numeric(&[1.0])).unwrap();
        assert!(table.push_column("a", numeric(&[2.0])).is_err());
    }

    #[test]
    fn push_column_rejects_mismatched_length() {
        let mut table = Table::new();
        table.push_column("a", numeric(&[1.0, 2.0])).unwrap();
        assert!(table.push_column("b", numeric(&[1.0])).is_err());
    }

    #[test]
    fn select_by_type_id_and_meta_composes_as_logical_and() {
        let mut table = Table::new();
        table.push_column("a", numeric(&[1.0])).unwrap();
        table.push_column("b", numeric(&[2.0])).unwrap();
        table.set_meta("a", "unit", "meters").unwrap();

        let labels = table.select().of_type_id(ColumnTypeId::Real).with_meta("unit", "meters").labels();
        assert_eq!(labels, vec!["a".to_string()]);
    }

    #[test]
    fn select_with_capability_filters_columns() {
        let mut table = Table::new();
        table.push_column("a", numeric(&[1.0])).unwrap();
        let columns = table.select().with_capability(CapabilitySet::SORTABLE).columns();
        assert_eq!(columns.len(), 1);
    }

    #[test]
    fn height_and_width_report_table_shape() {
        let mut table = Table::new();
        assert_eq!(table.height(), 0);
        assert_eq!(table.width(), 0);
        table.push_column("a", numeric(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(table.height(), 3);
        assert_eq!(table.width(), 1);
    }
}
