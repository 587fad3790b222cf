#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use fw_seq::LazySeq;
use serde::{Deserialize, Serialize};

/// A row label. Kind-first equality: labels of different kinds never compare
/// equal, so the numeric label `5` is distinct from the string label `"5"`.
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    Number(f64),
    Utf8(String),
    Timestamp(DateTime<Utc>),
}

impl From<f64> for Label {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::Utf8(value.to_owned())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self::Utf8(value)
    }
}

impl From<DateTime<Utc>> for Label {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Utf8(v) => write!(f, "{v}"),
            Self::Timestamp(v) => write!(f, "{v}"),
        }
    }
}

/// Bit-exact hashable form of a label, for first-position maps. `Label`
/// itself carries an `f64` and cannot derive `Eq`/`Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LabelKey {
    Number(u64),
    Utf8(String),
    Timestamp(i64, u32),
}

impl Label {
    #[must_use]
    pub fn key(&self) -> LabelKey {
        match self {
            Self::Number(v) => LabelKey::Number(v.to_bits()),
            Self::Utf8(v) => LabelKey::Utf8(v.clone()),
            Self::Timestamp(v) => LabelKey::Timestamp(v.timestamp(), v.timestamp_subsec_nanos()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> IndexKind {
        match self {
            Self::Number(_) => IndexKind::Number,
            Self::Utf8(_) => IndexKind::Utf8,
            Self::Timestamp(_) => IndexKind::Date,
        }
    }
}

/// The detected kind of an index, tagged on the wire. `Empty` is reserved
/// for the zero-label index and is never a data kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "string")]
    Utf8,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "empty")]
    Empty,
}

/// An ordered sequence of row labels. Insertion order is preserved verbatim:
/// no deduplication, no sorting. Immutable once attached to a Series or
/// Frame; operations that change the row set always build a new Index.
///
/// Backed by a restartable [`LazySeq`], so clones share the producer and a
/// default index can be an unbounded counter paired lazily against values.
#[derive(Debug, Clone)]
pub struct Index {
    labels: LazySeq<Label>,
}

impl PartialEq for Index {
    fn eq(&self, other: &Self) -> bool {
        self.labels.iter().eq(other.labels.iter())
    }
}

impl Index {
    #[must_use]
    pub fn new(labels: Vec<Label>) -> Self {
        Self {
            labels: LazySeq::from_values(labels),
        }
    }

    #[must_use]
    pub fn from_seq(labels: LazySeq<Label>) -> Self {
        Self { labels }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            labels: LazySeq::empty(),
        }
    }

    /// The default integer index 0..n-1.
    #[must_use]
    pub fn default_range(len: usize) -> Self {
        Self::from_seq(LazySeq::range(0, len).map(|i| Label::Number(i as f64)))
    }

    /// An unbounded default integer index 0, 1, 2, … for fully-lazy series.
    /// Must only be consumed through bounded traversal (`zip`, `take`).
    #[must_use]
    pub fn counter() -> Self {
        Self::from_seq(LazySeq::counter().map(|i| Label::Number(i as f64)))
    }

    #[must_use]
    pub fn seq(&self) -> &LazySeq<Label> {
        &self.labels
    }

    #[must_use]
    pub fn label_at(&self, position: usize) -> Option<Label> {
        self.labels.iter().nth(position)
    }

    /// Label count. Diverges on an unbounded counter index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.iter().next().is_none()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Label> {
        self.labels.to_vec()
    }

    /// Kind auto-detected from the first label; `Empty` when there are none.
    #[must_use]
    pub fn kind(&self) -> IndexKind {
        match self.labels.iter().next() {
            Some(label) => label.kind(),
            None => IndexKind::Empty,
        }
    }
}

/// First-seen position of each distinct label, in iteration order. Duplicate
/// labels keep their first position (first-match alignment semantics).
pub fn first_position_map<'a>(
    labels: impl IntoIterator<Item = &'a Label>,
) -> HashMap<LabelKey, usize> {
    let mut positions = HashMap::new();
    for (position, label) in labels.into_iter().enumerate() {
        positions.entry(label.key()).or_insert(position);
    }
    positions
}
