//! Column-oriented in-memory table.

use std::collections::{BTreeMap, HashSet};

use crate::{DType, DatasetError, Value, ValueKey};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: DType,
    values: Vec<Value>,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, dtype: DType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn dtype(&self) -> DType {
        self.dtype
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.dtype.is_numeric()
    }

    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// Distinct present values (missing cells are not counted).
    #[must_use]
    pub fn n_unique(&self) -> usize {
        self.values
            .iter()
            .filter(|v| !v.is_missing())
            .map(Value::key)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Distinct values with "missing" counted as a value of its own.
    #[must_use]
    pub fn n_distinct(&self) -> usize {
        self.values.iter().map(Value::key).collect::<HashSet<_>>().len()
    }

    /// Occurrences of each present value, keyed by its display form.
    #[must_use]
    pub fn value_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for value in self.values.iter().filter(|v| !v.is_missing()) {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Per-row numeric view; `None` for missing or non-numeric cells.
    #[must_use]
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(Value::as_f64).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<Column>,
    rows: usize,
}

impl Frame {
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let rows = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for column in &columns {
            if column.len() != rows {
                return Err(DatasetError::RaggedColumn {
                    column: column.name.clone(),
                    expected: rows,
                    found: column.len(),
                });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { columns, rows })
    }

    /// `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns.len())
    }

    #[must_use]
    pub const fn n_rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// First `n` rows as `{column: {row_index: value}}`.
    #[must_use]
    pub fn head_json(&self, n: usize) -> serde_json::Value {
        let take = n.min(self.rows);
        let mut out = serde_json::Map::new();
        for column in &self.columns {
            let mut cells = serde_json::Map::new();
            for (i, value) in column.values.iter().take(take).enumerate() {
                cells.insert(i.to_string(), value.to_json());
            }
            out.insert(column.name.clone(), serde_json::Value::Object(cells));
        }
        serde_json::Value::Object(out)
    }

    fn row_key(&self, row: usize) -> Vec<ValueKey<'_>> {
        self.columns.iter().map(|c| c.values[row].key()).collect()
    }

    /// Indices of rows identical to an earlier row.
    #[must_use]
    pub fn duplicate_rows(&self) -> Vec<usize> {
        let mut seen = HashSet::with_capacity(self.rows);
        (0..self.rows)
            .filter(|&row| !seen.insert(self.row_key(row)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, Frame};
    use crate::{DType, DatasetError, Value};

    fn frame() -> Frame {
        Frame::new(vec![
            Column::new(
                "x",
                DType::Int64,
                vec![Value::Int(1), Value::Int(2), Value::Int(1)],
            ),
            Column::new(
                "label",
                DType::Object,
                vec![
                    Value::Text("a".into()),
                    Value::Missing,
                    Value::Text("a".into()),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = Frame::new(vec![
            Column::new("a", DType::Int64, vec![Value::Int(1)]),
            Column::new("b", DType::Int64, vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, DatasetError::RaggedColumn { found: 0, .. }));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Frame::new(vec![
            Column::new("a", DType::Int64, vec![]),
            Column::new("a", DType::Int64, vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateColumn(name) if name == "a"));
    }

    #[test]
    fn counts_ignore_missing_except_n_distinct() {
        let f = frame();
        let label = f.column("label").unwrap();
        assert_eq!(label.missing_count(), 1);
        assert_eq!(label.n_unique(), 1);
        assert_eq!(label.n_distinct(), 2);
        assert_eq!(label.value_counts().get("a"), Some(&2));
    }

    #[test]
    fn finds_duplicate_rows() {
        assert_eq!(frame().duplicate_rows(), vec![2]);
    }

    #[test]
    fn head_json_is_keyed_by_row_index() {
        let head = frame().head_json(2);
        assert_eq!(head["x"]["0"], 1);
        assert!(head["label"]["1"].is_null());
        assert!(head["x"].get("2").is_none());
    }
}
