#![forbid(unsafe_code)]

//! Property suites over the merge and wire-cycle invariants.
//!
//! Strategy generators produce arbitrary but constructible inputs across the
//! (value kind x missing pattern x index overlap) space; properties assert
//! invariants that must hold for ALL inputs, not hand-picked fixtures.

use std::collections::HashSet;

use proptest::prelude::*;

use fw_codec::{deserialize, from_json_str, serialize, to_json_string};
use fw_conformance::{add, frames_equivalent};
use fw_frame::{Frame, Series};
use fw_index::{Label, LabelKey};
use fw_types::Value;

// ---------------------------------------------------------------------------
// Strategy generators
// ---------------------------------------------------------------------------

/// Numeric-or-missing values suited to the `add` combine function.
fn arb_numeric_values(len: usize) -> impl Strategy<Value = Vec<Value>> {
    proptest::collection::vec(
        prop_oneof![
            3 => (-1_000_000_i64..1_000_000).prop_map(|v| Value::Number(v as f64)),
            1 => Just(Value::Missing),
        ],
        len,
    )
}

/// Labels drawn from a small space so overlap and duplicates actually occur.
fn arb_labels(len: usize) -> impl Strategy<Value = Vec<Label>> {
    proptest::collection::vec(
        prop_oneof![
            3 => (0_i64..12).prop_map(Label::from),
            1 => "[a-c]{1,2}".prop_map(Label::from),
        ],
        len,
    )
}

fn arb_numeric_series(len: usize) -> impl Strategy<Value = Series> {
    (arb_labels(len), arb_numeric_values(len)).prop_map(|(labels, values)| {
        Series::with_index_labels(labels, values).expect("equal-length inputs must construct")
    })
}

fn arb_series_pair(max_len: usize) -> impl Strategy<Value = (Series, Series)> {
    (0..=max_len, 0..=max_len).prop_flat_map(|(len_a, len_b)| {
        (arb_numeric_series(len_a), arb_numeric_series(len_b))
    })
}

/// One column's values, homogeneous in kind (plus missing holes) so the
/// serialized type tag describes every row and the wire cycle is lossless.
fn arb_column(len: usize) -> impl Strategy<Value = Vec<Value>> {
    prop_oneof![
        arb_numeric_values(len),
        proptest::collection::vec(
            prop_oneof![
                3 => "[a-z]{0,6}".prop_map(Value::from),
                1 => Just(Value::Missing),
            ],
            len,
        ),
        proptest::collection::vec(
            prop_oneof![
                3 => any::<bool>().prop_map(Value::Bool),
                1 => Just(Value::Missing),
            ],
            len,
        ),
    ]
}

/// Kind-homogeneous index labels: the serialized index tag is detected from
/// the first label, so a mixed-kind index has no faithful wire form.
fn arb_index_labels(len: usize) -> impl Strategy<Value = Vec<Label>> {
    prop_oneof![
        proptest::collection::vec((-1000_i64..1000).prop_map(Label::from), len),
        proptest::collection::vec("[a-z]{1,6}".prop_map(Label::from), len),
    ]
}

/// At least one row: a zero-row frame serializes to an `"empty"`-kind index
/// and deserializes leniently to the canonical empty frame, dropping column
/// names, which is pinned separately below.
fn arb_frame(max_rows: usize) -> impl Strategy<Value = Frame> {
    (1..=max_rows, 1..=4_usize).prop_flat_map(|(rows, width)| {
        let names: Vec<String> = (0..width).map(|i| format!("c{i}")).collect();
        let columns = proptest::collection::vec(arb_column(rows), width);
        (Just(names), columns, arb_index_labels(rows)).prop_map(|(names, columns, labels)| {
            let pairs = names.into_iter().zip(columns).collect();
            Frame::from_columns_with_index(labels, pairs)
                .expect("generated frame must construct")
        })
    })
}

fn label_keys(series: &Series) -> HashSet<LabelKey> {
    series
        .index()
        .seq()
        .zip(series.seq())
        .to_vec()
        .into_iter()
        .map(|(label, _)| label.key())
        .collect()
}

fn result_label_keys(series: &Series) -> Vec<LabelKey> {
    series
        .to_pairs()
        .into_iter()
        .map(|(label, _)| label.key())
        .collect()
}

// ---------------------------------------------------------------------------
// Merge properties
// ---------------------------------------------------------------------------

proptest! {
    /// Every merged label exists in both inputs; none are synthesized.
    #[test]
    fn merge_labels_are_drawn_from_both_inputs((left, right) in arb_series_pair(12)) {
        let left_keys = label_keys(&left);
        let right_keys = label_keys(&right);

        for key in result_label_keys(&left.merge(&right, add)) {
            prop_assert!(left_keys.contains(&key));
            prop_assert!(right_keys.contains(&key));
        }
    }

    /// The merged row set (not its order) is direction-independent.
    #[test]
    fn merge_row_set_is_commutative((left, right) in arb_series_pair(12)) {
        let forward: HashSet<LabelKey> =
            result_label_keys(&left.merge(&right, add)).into_iter().collect();
        let backward: HashSet<LabelKey> =
            result_label_keys(&right.merge(&left, add)).into_iter().collect();
        prop_assert_eq!(forward, backward);
    }

    /// Merged output never contains a missing combine result for `add`
    /// over two non-missing numbers, and labels are distinct.
    #[test]
    fn merge_output_is_distinct_and_fully_defined((left, right) in arb_series_pair(12)) {
        let merged = left.merge(&right, add);
        let mut seen = HashSet::new();
        for (label, value) in merged.to_pairs() {
            prop_assert!(seen.insert(label.key()), "duplicate label in merge output");
            prop_assert!(!value.is_missing(), "missing value leaked through merge");
        }
    }

    /// Merging against an empty series is always empty, whatever the input.
    #[test]
    fn merge_with_empty_is_always_empty(series in arb_numeric_series(12)) {
        let empty = Series::from_values(vec![]);
        prop_assert!(series.merge(&empty, add).to_pairs().is_empty());
        prop_assert!(empty.merge(&series, add).to_pairs().is_empty());
    }
}

// ---------------------------------------------------------------------------
// Wire-cycle properties
// ---------------------------------------------------------------------------

proptest! {
    /// Structural round trip preserves row count, column order, index
    /// labels, and cell values for kind-homogeneous columns.
    #[test]
    fn structural_round_trip_is_lossless(frame in arb_frame(8)) {
        let restored = deserialize(Some(&serialize(&frame))).expect("round trip");
        prop_assert!(frames_equivalent(&frame, &restored));
    }

    /// The JSON text cycle agrees with the structural cycle.
    #[test]
    fn json_text_round_trip_is_lossless(frame in arb_frame(8)) {
        let text = to_json_string(&frame).expect("to text");
        let restored = from_json_str(&text).expect("from text");
        prop_assert!(frames_equivalent(&frame, &restored));
    }

    /// Serialized row count always equals the frame's count.
    #[test]
    fn serialized_rows_match_count(frame in arb_frame(8)) {
        let serialized = serialize(&frame);
        prop_assert_eq!(serialized.values.len(), frame.count());
    }

    /// Repeated materialization of the same lazy pipeline is identical
    /// element-for-element: restartability recomputes deterministically.
    #[test]
    fn materialization_is_idempotent(series in arb_numeric_series(12)) {
        let transformed = series.map_values(|v| match v {
            Value::Number(n) => Value::Number(n * 2.0),
            other => other,
        });
        prop_assert_eq!(transformed.to_pairs(), transformed.to_pairs());
        prop_assert_eq!(series.to_vec(), series.to_vec());
    }
}

// A zero-row frame with columns loses them across the wire: no labels means
// an "empty"-kind index, which deserialization leniently recovers as the
// canonical empty frame.
#[test]
fn zero_row_frames_collapse_to_empty_across_the_wire() {
    let frame = Frame::from_columns(vec![("A".to_owned(), Vec::new())]).unwrap();
    let serialized = serialize(&frame);
    assert_eq!(serialized.column_order, vec!["A".to_owned()]);

    let restored = deserialize(Some(&serialized)).unwrap();
    assert_eq!(restored.count(), 0);
    assert!(restored.column_names().is_empty());
}

// A zero-column frame serializes to the canonical empty form even when it
// carries rows. Constructible: rows of zero arity.
#[test]
fn zero_column_frames_always_serialize_canonically() {
    let rowful = Frame::from_rows(Vec::new(), vec![Vec::new(), Vec::new()]).unwrap();
    assert_eq!(rowful.count(), 2);
    assert_eq!(
        serialize(&rowful),
        fw_codec::SerializedFrame::canonical_empty()
    );
}
