//! End-to-end scenarios from spec §8, driven through the public API only.

use coltable::buffers::{CategoricalBuffer, NumericBuffer};
use coltable::column::{Column, ColumnType, DenseNumericColumn, SortOrder};
use coltable::error::Error;
use coltable::executor::{Calculator, ExecutionContext, WorkloadClass};
use coltable::ops;
use coltable::packed::IntFormat;
use coltable::persistence;
use coltable::table::Table;

fn numeric(values: &[f64]) -> Column {
    Column::DenseNumeric(DenseNumericColumn::new(values.to_vec(), ColumnType::real()))
}

/// Scenario 1: categorical map and freeze.
#[test]
fn categorical_map_and_freeze_round_trip() {
    let buf = CategoricalBuffer::new_growing(IntFormat::U8);
    for v in [Some("a"), None, Some("b"), Some("a"), Some("c")] {
        buf.push(v).unwrap();
    }
    let column = buf.freeze();

    let mut indices = [0i32; 5];
    column.fill_category(&mut indices, 0);
    assert_eq!(indices, [1, 0, 2, 1, 3]);

    let mapped = column.map(&[4, 3, 2, 1, 0], true);
    let expected: Vec<Option<String>> = vec![Some("c"), Some("a"), Some("b"), None, Some("a")];
    for (i, want) in expected.into_iter().enumerate() {
        let got = mapped
            .value_object(i)
            .map(|v| v.downcast_ref::<String>().unwrap().clone());
        assert_eq!(got, want, "row {i}");
    }
}

/// Scenario 2: parallel numeric sum determinism.
#[test]
fn parallel_sum_is_deterministic_across_parallelism() {
    let column = numeric(&vec![1.0; 1_000_000]);
    for parallelism in [1, 2, 4, 8] {
        let context = ExecutionContext::new(parallelism);
        let total = ops::reduce_f64(&column, &context, WorkloadClass::Small, 0.0, |a, b| a + b).unwrap();
        assert_eq!(total, 1_000_000.0, "parallelism={parallelism}");
    }
}

/// Scenario 3: NIST percentile interpolation.
#[test]
fn nist_percentile_interpolation_matches_literal_values() {
    let column = numeric(&[10.0, 20.0, 30.0, 40.0]);
    assert_eq!(ops::percentile(&column, 0.25).unwrap(), 12.5);
    assert_eq!(ops::percentile(&column, 0.5).unwrap(), 25.0);
    assert_eq!(ops::percentile(&column, 0.75).unwrap(), 37.5);
    assert_eq!(ops::percentile(&column, 1.0).unwrap(), 40.0);
}

/// Scenario 4: abort propagation. A batch at index 3 fails; the scheduler
/// surfaces exactly one error and the sentinel is not left alive.
#[test]
fn abort_propagation_surfaces_exactly_one_error() {
    struct FailingAtBatch {
        n: usize,
        fail_on_batch: usize,
    }

    impl Calculator<()> for FailingAtBatch {
        fn init(&self, _n_batches: usize) {}
        fn number_of_operations(&self) -> usize {
            self.n
        }
        fn do_part(&self, _from: usize, _to: usize, batch_index: usize) -> Result<(), Error> {
            if batch_index == self.fail_on_batch {
                return Err(Error::invalid_argument("synthetic failure at batch 3"));
            }
            Ok(())
        }
        fn get_result(&self) {}
    }

    let calculator = FailingAtBatch {
        n: 1_000_000,
        fail_on_batch: 3,
    };
    let context = ExecutionContext::new(4);
    let result = coltable::executor::execute(&calculator, &context, WorkloadClass::Huge);
    assert!(result.is_err());
}

/// Scenario 5: dictionary overflow in U2.
#[test]
fn u2_dictionary_overflow_on_fourth_distinct_value() {
    let buf = CategoricalBuffer::new_growing(IntFormat::U2);
    assert!(buf.push(Some("a")).is_ok());
    assert!(buf.push(Some("b")).is_ok());
    assert!(buf.push(Some("c")).is_ok());
    let err = buf.push(Some("d")).unwrap_err();
    assert!(matches!(err, Error::DictionaryOverflow { .. }));
    assert!(buf.push_try(Some("e")).is_none());

    match buf.freeze() {
        Column::Categorical(c) => assert_eq!(c.dictionary().len(), 3),
        _ => panic!("expected categorical column"),
    }
}

/// Scenario 6: stable multi-column sort.
#[test]
fn stable_multi_column_sort_matches_literal_permutation() {
    let a = numeric(&[1.0, 1.0, 2.0, 2.0]);
    let b = numeric(&[20.0, 10.0, 10.0, 20.0]);
    let perm = ops::multi_column_sort(&[&a, &b], SortOrder::Ascending).unwrap();
    assert_eq!(perm, vec![1, 0, 2, 3]);
}

/// Persistence round trip for a numeric-only table.
#[test]
fn persistence_round_trip_preserves_shape_and_values() {
    let mut table = Table::new();
    table.push_column("x", numeric(&[1.5, 2.5, 3.5])).unwrap();
    table.push_column("y", numeric(&[-1.0, 0.0, 1.0])).unwrap();

    let mut bytes = Vec::new();
    persistence::write_table(&table, &mut bytes).unwrap();

    let mut cursor = std::io::Cursor::new(bytes);
    let read_back = persistence::read_table(&mut cursor).unwrap();
    assert_eq!(read_back.labels, table.labels());
    assert_eq!(read_back.columns[0], vec![1.5, 2.5, 3.5]);
    assert_eq!(read_back.columns[1], vec![-1.0, 0.0, 1.0]);
}

/// Boundary behavior: an empty column reports count 0 and NaN extrema.
#[test]
fn empty_column_statistics_are_all_nan() {
    let column = numeric(&[]);
    let context = ExecutionContext::new(2);
    let stats = ops::counts(&column, &context, WorkloadClass::Small).unwrap();
    assert_eq!(stats.count, 0);
    assert!(stats.mean.is_nan());
    assert!(stats.min.is_nan());
    assert!(stats.max.is_nan());
    assert_eq!(column.size(), 0);
}

/// Boundary behavior: a single-element column's percentile is that
/// element for any `p`, and its variance is undefined (`NaN`).
#[test]
fn single_element_column_boundary_behavior() {
    let column = numeric(&[42.0]);
    assert_eq!(ops::percentile(&column, 0.1).unwrap(), 42.0);
    assert_eq!(ops::percentile(&column, 0.9).unwrap(), 42.0);

    let context = ExecutionContext::new(1);
    let v = ops::variance(&column, &context, WorkloadClass::Small, true).unwrap();
    assert!(v.is_nan());
}

/// A write to a fixed-size numeric buffer is visible after freezing, and
/// no longer writable once frozen.
#[test]
fn numeric_buffer_freeze_then_frozen_rejects_writes() {
    let buffer = NumericBuffer::new_fixed(3, false);
    buffer.set(0, 1.0).unwrap();
    buffer.set(1, 2.0).unwrap();
    buffer.set(2, 3.0).unwrap();
    let column = buffer.freeze();
    match &column {
        Column::DenseNumeric(c) => assert_eq!(c.values(), &[1.0, 2.0, 3.0]),
        _ => panic!("expected dense numeric column"),
    }
    assert!(matches!(buffer.set(0, 9.0), Err(Error::BufferFrozen)));
}
