#![forbid(unsafe_code)]

//! Transport-neutral structural form for frames.
//!
//! A [`SerializedFrame`] is created on demand from a live frame, never
//! mutated in place, and consumed to reconstruct an equivalent frame.
//! Temporal values always travel as ISO-8601 strings, never as native
//! temporal objects.

use std::collections::BTreeMap;

use fw_frame::{Frame, FrameError};
use fw_index::{IndexKind, Label};
use fw_types::{format_iso, infer_kind, parse_iso, Value, ValueKind};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid serialized input: {0}")]
    InvalidSerializedInput(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// The wire record. Field names are camelCase on the wire
/// (`columnOrder`, `columns`, `index`, `values`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerializedFrame {
    pub column_order: Vec<String>,
    pub columns: BTreeMap<String, ValueKind>,
    pub index: Option<SerializedIndex>,
    pub values: Vec<BTreeMap<String, Json>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedIndex {
    #[serde(rename = "type")]
    pub kind: IndexKind,
    #[serde(default)]
    pub values: Vec<Json>,
}

impl SerializedFrame {
    /// The single structural form every zero-column frame serializes to.
    #[must_use]
    pub fn canonical_empty() -> Self {
        Self {
            column_order: Vec::new(),
            columns: BTreeMap::new(),
            index: Some(SerializedIndex {
                kind: IndexKind::Empty,
                values: Vec::new(),
            }),
            values: Vec::new(),
        }
    }
}

fn encode_number(value: f64) -> Json {
    serde_json::Number::from_f64(value).map_or(Json::Null, Json::Number)
}

fn encode_label(label: &Label) -> Json {
    match label {
        Label::Number(v) => encode_number(*v),
        Label::Utf8(v) => Json::String(v.clone()),
        Label::Timestamp(v) => Json::String(format_iso(v)),
    }
}

fn encode_value(value: &Value) -> Json {
    match value {
        Value::Missing => Json::Null,
        Value::Bool(v) => Json::Bool(*v),
        Value::Number(v) => encode_number(*v),
        Value::Utf8(v) => Json::String(v.clone()),
        Value::Timestamp(v) => Json::String(format_iso(v)),
    }
}

/// Convert a frame to the structural form.
///
/// A zero-column frame emits the canonical empty form regardless of row
/// count. Index and column kinds are tagged from the first qualifying value
/// (first label for the index, first non-missing value per column); later
/// rows never change a tag. A column with no non-missing value gets no tag.
/// Non-finite numbers (NaN, infinities) have no JSON representation and
/// encode as `null`, so they come back as missing after a round trip.
#[must_use]
pub fn serialize(frame: &Frame) -> SerializedFrame {
    if frame.column_names().is_empty() {
        return SerializedFrame::canonical_empty();
    }

    let labels = frame.index().to_vec();
    let index = SerializedIndex {
        kind: frame.index().kind(),
        values: labels.iter().map(encode_label).collect(),
    };

    let mut columns = BTreeMap::new();
    let mut encoded: Vec<(String, Vec<Json>)> = Vec::with_capacity(frame.column_names().len());
    for name in frame.column_names() {
        let cells = frame
            .column(name)
            .map(|series| series.to_vec())
            .unwrap_or_default();
        if let Some(kind) = infer_kind(&cells) {
            columns.insert(name.clone(), kind);
        }
        encoded.push((name.clone(), cells.iter().map(encode_value).collect()));
    }

    let row_count = encoded.first().map_or(0, |(_, cells)| cells.len());
    let values = (0..row_count)
        .map(|row| {
            encoded
                .iter()
                .map(|(name, cells)| (name.clone(), cells[row].clone()))
                .collect()
        })
        .collect();

    SerializedFrame {
        column_order: frame.column_names().to_vec(),
        columns,
        index: Some(index),
        values,
    }
}

fn decode_index_labels(index: &SerializedIndex) -> Result<Vec<Label>, CodecError> {
    match index.kind {
        IndexKind::Empty => Ok(Vec::new()),
        IndexKind::Number => index
            .values
            .iter()
            .map(|entry| {
                entry.as_f64().map(Label::Number).ok_or_else(|| {
                    CodecError::InvalidSerializedInput(format!(
                        "numeric index entry must be a number, found {entry}"
                    ))
                })
            })
            .collect(),
        IndexKind::Utf8 => index
            .values
            .iter()
            .map(|entry| match entry {
                Json::String(s) => Ok(Label::Utf8(s.clone())),
                other => Err(CodecError::InvalidSerializedInput(format!(
                    "string index entry must be a string, found {other}"
                ))),
            })
            .collect(),
        IndexKind::Date => index
            .values
            .iter()
            .map(|entry| match entry {
                Json::String(s) => parse_iso(s).map(Label::Timestamp).map_err(|err| {
                    CodecError::InvalidSerializedInput(err.to_string())
                }),
                other => Err(CodecError::InvalidSerializedInput(format!(
                    "date index entry must be a string, found {other}"
                ))),
            })
            .collect(),
    }
}

fn decode_cell(cell: &Json, kind: Option<ValueKind>) -> Result<Value, CodecError> {
    if cell.is_null() {
        return Ok(Value::Missing);
    }

    if kind == Some(ValueKind::Date) {
        let Json::String(input) = cell else {
            return Err(CodecError::InvalidSerializedInput(format!(
                "date column entry must be an ISO-8601 string, found {cell}"
            )));
        };
        return parse_iso(input)
            .map(Value::Timestamp)
            .map_err(|err| CodecError::InvalidSerializedInput(err.to_string()));
    }

    match cell {
        Json::Bool(v) => Ok(Value::Bool(*v)),
        Json::Number(v) => Ok(Value::Number(v.as_f64().unwrap_or(f64::NAN))),
        Json::String(v) => Ok(Value::Utf8(v.clone())),
        other => Err(CodecError::InvalidSerializedInput(format!(
            "unsupported cell value {other}"
        ))),
    }
}

/// Reconstruct a frame from the structural form.
///
/// Tolerant where absence is meaningful: absent input, a missing index section, or an
/// `"empty"`-typed index all recover to the canonical empty frame. Strict
/// where recovery would corrupt data: un-parseable date strings, non-string
/// entries in a date/string index, and an index whose length disagrees with
/// the row count are [`CodecError::InvalidSerializedInput`]. A `columnOrder`
/// entry with no `columns` tag is decoded pass-through (only the `"date"`
/// tag changes decoding).
pub fn deserialize(input: Option<&SerializedFrame>) -> Result<Frame, CodecError> {
    let Some(input) = input else {
        return Ok(Frame::new());
    };
    let Some(index) = &input.index else {
        return Ok(Frame::new());
    };
    if index.kind == IndexKind::Empty {
        return Ok(Frame::new());
    }

    let labels = decode_index_labels(index)?;
    if labels.len() != input.values.len() {
        return Err(CodecError::InvalidSerializedInput(format!(
            "index has {} labels but values has {} rows",
            labels.len(),
            input.values.len()
        )));
    }

    let mut pairs = Vec::with_capacity(input.column_order.len());
    for name in &input.column_order {
        let kind = input.columns.get(name).copied();
        let mut column = Vec::with_capacity(input.values.len());
        for row in &input.values {
            let cell = row.get(name).cloned().unwrap_or(Json::Null);
            column.push(decode_cell(&cell, kind)?);
        }
        pairs.push((name.clone(), column));
    }

    Ok(Frame::from_columns_with_index(labels, pairs)?)
}

/// Serialize a frame to its JSON text form.
pub fn to_json_string(frame: &Frame) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&serialize(frame))?)
}

/// Parse the JSON text form. `null` recovers to the canonical empty frame;
/// any other non-object top level is malformed.
pub fn from_json_str(input: &str) -> Result<Frame, CodecError> {
    let parsed: Json = serde_json::from_str(input)?;
    match parsed {
        Json::Null => Ok(Frame::new()),
        Json::Object(_) => {
            let structural: SerializedFrame = serde_json::from_value(parsed)?;
            deserialize(Some(&structural))
        }
        other => Err(CodecError::InvalidSerializedInput(format!(
            "top-level serialized form must be an object or null, found {other}"
        ))),
    }
}
