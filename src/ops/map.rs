//! Map operators (spec §4.6): the executor runs a per-batch loop that
//! reads rows of one or more source columns through the appropriate
//! reader and writes a derived value into a target buffer.

use crate::buffers::{CategoricalBuffer, NumericBuffer, ObjectBuffer};
use crate::column::{Column, ObjectRef};
use crate::error::Error;
use crate::executor::{self, Calculator, ExecutionContext, WorkloadClass};
use crate::readers::RowReader;

/// Writes `f(row_values)` into `target[row]` for every row, where
/// `row_values[k]` is `sources[k]`'s value at that row. `target` must
/// already be sized to `sources`' row count.
pub fn map_numeric<F>(
    sources: &[&Column],
    target: &NumericBuffer,
    context: &ExecutionContext,
    workload: WorkloadClass,
    f: F,
) -> Result<(), Error>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    let calculator = RowMapCalculator {
        sources,
        row_count: row_count(sources)?,
        write: move |reader: &RowReader, row_values: &mut [f64], row: usize| -> Result<(), Error> {
            for (col, slot) in row_values.iter_mut().enumerate() {
                *slot = reader.read_f64(col);
            }
            target.set(row, f(row_values))
        },
    };
    executor::execute(&calculator, context, workload)
}

/// Writes `f(row_values)` into the categorical `target[row]` for every
/// row. The target's packed width is the caller's choice, not inferred
/// (spec §4.6).
pub fn map_categorical<F>(
    sources: &[&Column],
    target: &CategoricalBuffer,
    context: &ExecutionContext,
    workload: WorkloadClass,
    f: F,
) -> Result<(), Error>
where
    F: Fn(&[f64]) -> Option<String> + Sync,
{
    let calculator = RowMapCalculator {
        sources,
        row_count: row_count(sources)?,
        write: move |reader: &RowReader, row_values: &mut [f64], row: usize| -> Result<(), Error> {
            for (col, slot) in row_values.iter_mut().enumerate() {
                *slot = reader.read_f64(col);
            }
            target.set(row, f(row_values).as_deref())
        },
    };
    executor::execute(&calculator, context, workload)
}

/// Writes `f(row_values)` into the object `target[row]` for every row.
pub fn map_object<F>(
    sources: &[&Column],
    target: &ObjectBuffer,
    context: &ExecutionContext,
    workload: WorkloadClass,
    f: F,
) -> Result<(), Error>
where
    F: Fn(&[f64]) -> Option<ObjectRef> + Sync,
{
    let calculator = RowMapCalculator {
        sources,
        row_count: row_count(sources)?,
        write: move |reader: &RowReader, row_values: &mut [f64], row: usize| -> Result<(), Error> {
            for (col, slot) in row_values.iter_mut().enumerate() {
                *slot = reader.read_f64(col);
            }
            target.set(row, f(row_values))
        },
    };
    executor::execute(&calculator, context, workload)
}

fn row_count(sources: &[&Column]) -> Result<usize, Error> {
    let first = sources
        .first()
        .ok_or_else(|| Error::invalid_argument("map operator requires at least one source column"))?;
    let n = first.size();
    if sources.iter().any(|c| c.size() != n) {
        return Err(Error::invalid_argument(
            "all source columns passed to a map operator must have the same length",
        ));
    }
    Ok(n)
}

/// Drives a per-row write callback over batches assigned by the scheduler,
/// reading `sources` in lockstep through a fresh [`RowReader`] per batch
/// (a row reader carries its own seek/stripe state, so batches cannot
/// share one across threads).
struct RowMapCalculator<'a, W> {
    sources: &'a [&'a Column],
    row_count: usize,
    write: W,
}

impl<'a, W> Calculator<()> for RowMapCalculator<'a, W>
where
    W: Fn(&RowReader, &mut [f64], usize) -> Result<(), Error> + Sync,
{
    fn init(&self, _n_batches: usize) {}

    fn number_of_operations(&self) -> usize {
        self.row_count
    }

    fn do_part(&self, from: usize, to: usize, _batch_index: usize) -> Result<(), Error> {
        if from == to {
            return Ok(());
        }
        let mut reader = RowReader::new(self.sources.to_vec())?;
        if from > 0 {
            reader.set_position(from as i64 - 1)?;
        }
        let mut row_values = vec![f64::NAN; self.sources.len()];
        for row in from..to {
            reader.advance();
            (self.write)(&reader, &mut row_values, row)?;
        }
        Ok(())
    }

    fn get_result(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColumnType, DenseNumericColumn};
    use crate::packed::IntFormat;

    fn numeric(values: &[f64]) -> Column {
        Column::DenseNumeric(DenseNumericColumn::new(values.to_vec(), ColumnType::real()))
    }

    #[test]
    fn map_numeric_sums_two_columns_per_row() {
        let a = numeric(&[1.0, 2.0, 3.0]);
        let b = numeric(&[10.0, 20.0, 30.0]);
        let target = NumericBuffer::new_fixed(3, false);
        let context = ExecutionContext::new(2);
        map_numeric(&[&a, &b], &target, &context, WorkloadClass::Huge, |row| row[0] + row[1]).unwrap();
        match target.freeze() {
            Column::DenseNumeric(c) => assert_eq!(c.values(), &[11.0, 22.0, 33.0]),
            _ => panic!("expected dense numeric column"),
        }
    }

    #[test]
    fn map_categorical_buckets_values_by_threshold() {
        let a = numeric(&[1.0, 5.0, 10.0]);
        let target = CategoricalBuffer::new_fixed(IntFormat::U8, 3);
        let context = ExecutionContext::new(1);
        map_categorical(&[&a], &target, &context, WorkloadClass::Huge, |row| {
            Some(if row[0] < 5.0 { "low".to_string() } else { "high".to_string() })
        })
        .unwrap();
        match target.freeze() {
            Column::Categorical(c) => {
                let mut dst = [0i32; 3];
                c.fill_category(&mut dst, 0);
                assert_eq!(dst, [1, 2, 2]);
            }
            _ => panic!("expected categorical column"),
        }
    }

    #[test]
    fn map_rejects_mismatched_source_lengths() {
        let a = numeric(&[1.0, 2.0]);
        let b = numeric(&[1.0]);
        let target = NumericBuffer::new_fixed(2, false);
        let context = ExecutionContext::new(1);
        let result = map_numeric(&[&a, &b], &target, &context, WorkloadClass::Huge, |row| row[0]);
        assert!(result.is_err());
    }
}
