#![forbid(unsafe_code)]

//! Shared fixtures for the cross-crate test suites under `tests/`.

use chrono::{DateTime, TimeZone, Utc};
use fw_frame::{Frame, Series};
use fw_index::Label;
use fw_types::Value;

/// A numeric series over the default index; `None` entries become missing.
#[must_use]
pub fn numeric_series(values: &[Option<f64>]) -> Series {
    Series::from_values(
        values
            .iter()
            .map(|entry| entry.map_or(Value::Missing, Value::Number))
            .collect(),
    )
}

/// A numeric series over explicit integer labels.
#[must_use]
pub fn labelled_series(labels: &[i64], values: &[f64]) -> Series {
    Series::with_index_labels(
        labels.iter().map(|&l| Label::from(l)).collect(),
        values.iter().map(|&v| Value::Number(v)).collect(),
    )
    .expect("fixture label and value slices must have equal lengths")
}

/// The numeric combine function used throughout the suites.
#[must_use]
pub fn add(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Value::Number(x + y),
        _ => Value::Missing,
    }
}

/// A three-row frame covering number, string, and boolean columns with an
/// explicit numeric index.
#[must_use]
pub fn mixed_frame() -> Frame {
    Frame::from_rows_with_index(
        vec![10_i64.into(), 20_i64.into(), 30_i64.into()],
        vec!["A".to_owned(), "B".to_owned(), "C".to_owned()],
        vec![
            vec![Value::Number(100.0), Value::from("a"), Value::Bool(true)],
            vec![Value::Number(200.0), Value::from("b"), Value::Bool(false)],
            vec![Value::Number(300.0), Value::from("c"), Value::Bool(false)],
        ],
    )
    .expect("mixed fixture frame must construct")
}

/// 2018-05-15T00:00:00Z, the pinned fixture instant.
#[must_use]
pub fn fixture_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 5, 15, 0, 0, 0)
        .single()
        .expect("fixture instant is unambiguous")
}

/// True when both frames agree on row count, column order, index labels,
/// and cell values (NaN-tolerant).
#[must_use]
pub fn frames_equivalent(left: &Frame, right: &Frame) -> bool {
    left.count() == right.count()
        && left.column_names() == right.column_names()
        && left.index().to_vec() == right.index().to_vec()
        && left
            .to_rows()
            .iter()
            .zip(right.to_rows().iter())
            .all(|(a, b)| {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.semantic_eq(y))
            })
}
