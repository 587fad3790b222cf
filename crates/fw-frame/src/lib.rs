#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use fw_index::{first_position_map, Index, Label};
use fw_seq::LazySeq;
use fw_types::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("shape mismatch: expected length {expected}, found {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
    #[error("column '{0}' not found")]
    UnknownColumn(String),
}

/// One named column: a lazy sequence of values paired positionally with an
/// index. Construction from existing sequences never copies value storage;
/// a transform shares upstream data until a terminal forces materialization.
#[derive(Debug, Clone)]
pub struct Series {
    name: Option<String>,
    index: Index,
    values: LazySeq<Value>,
}

impl Series {
    /// A series over plain values with the default integer index 0..n-1.
    #[must_use]
    pub fn from_values(values: Vec<Value>) -> Self {
        let index = Index::default_range(values.len());
        Self {
            name: None,
            index,
            values: LazySeq::from_values(values),
        }
    }

    /// A fully-lazy series. The default index is an unbounded counter paired
    /// against the values on traversal, so construction never forces the
    /// producer.
    #[must_use]
    pub fn from_seq(values: LazySeq<Value>) -> Self {
        Self {
            name: None,
            index: Index::counter(),
            values,
        }
    }

    /// A series with an explicit index. Lengths must match; a mismatch is a
    /// construction-time error, never deferred to materialization.
    pub fn with_index(index: Index, values: Vec<Value>) -> Result<Self, FrameError> {
        let index_len = index.len();
        if index_len != values.len() {
            return Err(FrameError::ShapeMismatch {
                expected: index_len,
                actual: values.len(),
            });
        }
        Ok(Self {
            name: None,
            index,
            values: LazySeq::from_values(values),
        })
    }

    /// Convenience over [`Series::with_index`] for plain label vectors.
    pub fn with_index_labels(labels: Vec<Label>, values: Vec<Value>) -> Result<Self, FrameError> {
        Self::with_index(Index::new(labels), values)
    }

    /// An explicitly-indexed lazy series. Both sides stay unforced, so the
    /// length invariant cannot be checked here; materializing operations zip
    /// and are bounded by the shorter side.
    #[must_use]
    pub fn with_index_seq(index: Index, values: LazySeq<Value>) -> Self {
        Self {
            name: None,
            index,
            values,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[must_use]
    pub fn seq(&self) -> &LazySeq<Value> {
        &self.values
    }

    /// Terminal: materialize the values.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.values.to_vec()
    }

    /// Terminal: label/value pairs in positional order. Bounded by the value
    /// count even when the index is an unbounded counter.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(Label, Value)> {
        self.index.seq().zip(&self.values).to_vec()
    }

    /// Terminal: number of values.
    #[must_use]
    pub fn count(&self) -> usize {
        self.values.count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.iter().next().is_none()
    }

    /// Label-based strict-inner merge.
    ///
    /// Candidate labels are the distinct labels of `self`, in the order they
    /// first appear once missing values are filtered out. A candidate
    /// survives only when both series hold a non-missing value at that label
    /// (first match on either side); otherwise it is dropped entirely and
    /// never appears in the result. No labels are synthesized, and there are
    /// no outer/left/right variants.
    ///
    /// Mismatched, disjoint, or empty inputs degrade to an empty series;
    /// this never fails.
    pub fn merge(&self, other: &Self, combine: impl Fn(&Value, &Value) -> Value) -> Self {
        let self_pairs = self.to_pairs();
        let other_pairs = other.to_pairs();
        let self_positions = first_position_map(self_pairs.iter().map(|(label, _)| label));
        let other_positions = first_position_map(other_pairs.iter().map(|(label, _)| label));

        let mut seen = HashSet::new();
        let mut labels = Vec::new();
        let mut merged = Vec::new();

        for (label, value) in &self_pairs {
            if value.is_missing() {
                continue;
            }
            let key = label.key();
            if !seen.insert(key.clone()) {
                continue;
            }

            // First-match lookup on both sides; a missing value on either
            // side drops the label even when the other side is defined.
            let left = &self_pairs[self_positions[&key]].1;
            if left.is_missing() {
                continue;
            }
            let Some(&other_position) = other_positions.get(&key) else {
                continue;
            };
            let right = &other_pairs[other_position].1;
            if right.is_missing() {
                continue;
            }

            labels.push(label.clone());
            merged.push(combine(left, right));
        }

        Self {
            name: self.name.clone(),
            index: Index::new(labels),
            values: LazySeq::from_values(merged),
        }
    }

    /// Type-preserving lazy transform. The index is untouched.
    pub fn map_values(&self, f: impl Fn(Value) -> Value + 'static) -> Self {
        Self {
            name: self.name.clone(),
            index: self.index.clone(),
            values: self.values.map(f),
        }
    }

    #[must_use]
    pub fn take(&self, n: usize) -> Self {
        Self {
            name: self.name.clone(),
            index: Index::from_seq(self.index.seq().take(n)),
            values: self.values.take(n),
        }
    }

    #[must_use]
    pub fn skip(&self, n: usize) -> Self {
        Self {
            name: self.name.clone(),
            index: Index::from_seq(self.index.seq().skip(n)),
            values: self.values.skip(n),
        }
    }
}

/// An ordered mapping of column name to [`Series`], all sharing one index.
/// Column insertion order is observable and preserved through every
/// transformation and through serialization.
#[derive(Debug, Clone)]
pub struct Frame {
    index: Index,
    columns: BTreeMap<String, Series>,
    column_order: Vec<String>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// The canonical empty frame: zero columns, zero rows, empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: Index::empty(),
            columns: BTreeMap::new(),
            column_order: Vec::new(),
        }
    }

    fn check_distinct(column_names: &[String]) -> Result<(), FrameError> {
        let mut seen = HashSet::new();
        for name in column_names {
            if !seen.insert(name.as_str()) {
                return Err(FrameError::DuplicateColumn(name.clone()));
            }
        }
        Ok(())
    }

    fn from_row_storage(
        index: Index,
        column_names: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, FrameError> {
        Self::check_distinct(&column_names)?;
        for row in &rows {
            if row.len() != column_names.len() {
                return Err(FrameError::ShapeMismatch {
                    expected: column_names.len(),
                    actual: row.len(),
                });
            }
        }

        // One shared row store; each column extracts its cell on demand, so
        // materializing one column never touches its siblings.
        let rows = Arc::new(rows);
        let mut columns = BTreeMap::new();
        for (position, name) in column_names.iter().enumerate() {
            let store = Arc::clone(&rows);
            let cells = LazySeq::from_fn(move || {
                let store = Arc::clone(&store);
                Box::new((0..store.len()).map(move |r| store[r][position].clone()))
            });
            let series = Series::with_index_seq(index.clone(), cells).with_name(name.clone());
            columns.insert(name.clone(), series);
        }

        Ok(Self {
            index,
            columns,
            column_order: column_names,
        })
    }

    /// Row-major construction with the default integer index.
    /// Every row must have the same arity as `column_names`.
    pub fn from_rows(
        column_names: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, FrameError> {
        let index = Index::default_range(rows.len());
        Self::from_row_storage(index, column_names, rows)
    }

    /// Row-major construction with an explicit index. The index length must
    /// match the row count.
    pub fn from_rows_with_index(
        index_labels: Vec<Label>,
        column_names: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, FrameError> {
        if index_labels.len() != rows.len() {
            return Err(FrameError::ShapeMismatch {
                expected: rows.len(),
                actual: index_labels.len(),
            });
        }
        Self::from_row_storage(Index::new(index_labels), column_names, rows)
    }

    /// Column-major construction with the default integer index. All columns
    /// must have the same length.
    pub fn from_columns(pairs: Vec<(String, Vec<Value>)>) -> Result<Self, FrameError> {
        let row_count = pairs.first().map_or(0, |(_, values)| values.len());
        Self::from_column_storage(Index::default_range(row_count), pairs, row_count)
    }

    /// Column-major construction with an explicit index.
    pub fn from_columns_with_index(
        index_labels: Vec<Label>,
        pairs: Vec<(String, Vec<Value>)>,
    ) -> Result<Self, FrameError> {
        let row_count = index_labels.len();
        Self::from_column_storage(Index::new(index_labels), pairs, row_count)
    }

    fn from_column_storage(
        index: Index,
        pairs: Vec<(String, Vec<Value>)>,
        row_count: usize,
    ) -> Result<Self, FrameError> {
        let column_names: Vec<String> = pairs.iter().map(|(name, _)| name.clone()).collect();
        Self::check_distinct(&column_names)?;

        let mut columns = BTreeMap::new();
        for (name, values) in pairs {
            if values.len() != row_count {
                return Err(FrameError::ShapeMismatch {
                    expected: row_count,
                    actual: values.len(),
                });
            }
            let series = Series::with_index_seq(index.clone(), LazySeq::from_values(values))
                .with_name(name.clone());
            columns.insert(name, series);
        }

        Ok(Self {
            index,
            columns,
            column_order: column_names,
        })
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_order
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns.get(name)
    }

    /// Row count. Counts the first column's values when columns exist (the
    /// authoritative row store), the index otherwise.
    #[must_use]
    pub fn count(&self) -> usize {
        match self.column_order.first() {
            Some(name) => self.columns[name].count(),
            None => self.index.len(),
        }
    }

    /// Row-major materialization preserving column order.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<Value>> {
        let materialized: Vec<Vec<Value>> = self
            .column_order
            .iter()
            .map(|name| self.columns[name].to_vec())
            .collect();
        let row_count = materialized.first().map_or(0, Vec::len);

        (0..row_count)
            .map(|r| materialized.iter().map(|column| column[r].clone()).collect())
            .collect()
    }

    /// A new frame with `series` reindexed against this frame's index
    /// positionally. Replaces an existing column of the same name in place;
    /// appends otherwise. The series length must match the row count.
    pub fn add_column(&self, name: impl Into<String>, values: Vec<Value>) -> Result<Self, FrameError> {
        let name = name.into();
        let row_count = self.count();
        if values.len() != row_count {
            return Err(FrameError::ShapeMismatch {
                expected: row_count,
                actual: values.len(),
            });
        }

        let series = Series::with_index_seq(self.index.clone(), LazySeq::from_values(values))
            .with_name(name.clone());

        let mut columns = self.columns.clone();
        let mut column_order = self.column_order.clone();
        if columns.insert(name.clone(), series).is_none() {
            column_order.push(name);
        }

        Ok(Self {
            index: self.index.clone(),
            columns,
            column_order,
        })
    }

    /// A new frame without `name`. Dropping an absent column is a no-op.
    #[must_use]
    pub fn drop_column(&self, name: &str) -> Self {
        let mut columns = self.columns.clone();
        columns.remove(name);
        let column_order = self
            .column_order
            .iter()
            .filter(|entry| entry.as_str() != name)
            .cloned()
            .collect();
        Self {
            index: self.index.clone(),
            columns,
            column_order,
        }
    }

    /// A new frame holding only `names`, in the order given.
    pub fn subset(&self, names: &[&str]) -> Result<Self, FrameError> {
        let mut columns = BTreeMap::new();
        let mut column_order = Vec::with_capacity(names.len());
        for &name in names {
            let Some(series) = self.columns.get(name) else {
                return Err(FrameError::UnknownColumn(name.to_owned()));
            };
            if columns.insert(name.to_owned(), series.clone()).is_some() {
                return Err(FrameError::DuplicateColumn(name.to_owned()));
            }
            column_order.push(name.to_owned());
        }
        Ok(Self {
            index: self.index.clone(),
            columns,
            column_order,
        })
    }

    #[must_use]
    pub fn take(&self, n: usize) -> Self {
        self.window(|series| series.take(n), Index::from_seq(self.index.seq().take(n)))
    }

    #[must_use]
    pub fn skip(&self, n: usize) -> Self {
        self.window(|series| series.skip(n), Index::from_seq(self.index.seq().skip(n)))
    }

    fn window(&self, slice: impl Fn(&Series) -> Series, index: Index) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(name, series)| {
                let mut sliced = slice(series);
                sliced.index = index.clone();
                (name.clone(), sliced)
            })
            .collect();
        Self {
            index,
            columns,
            column_order: self.column_order.clone(),
        }
    }
}
