//! Reducers (spec §4.6): per-batch accumulation driven by the scheduler,
//! combined across batches by a [`CombineTree`]. A batch's final
//! accumulator is handed to the tree as soon as `do_part` finishes; the
//! tree itself decides when two sibling batches are ready to combine.

use std::sync::{Mutex, OnceLock};

use crate::column::Column;
use crate::error::Error;
use crate::executor::{self, Calculator, CombineTree, ExecutionContext, WorkloadClass};

/// Reduces `column` to a single `f64`, seeded per batch with `identity` and
/// folded with `op`. The combiner defaults to `op` itself, matching spec
/// §4.6's "the combiner defaults to the same operator as the reducer
/// unless a distinct one is provided".
pub fn reduce_f64(
    column: &Column,
    context: &ExecutionContext,
    workload: WorkloadClass,
    identity: f64,
    op: impl Fn(f64, f64) -> f64 + Sync,
) -> Result<f64, Error> {
    reduce(column, context, workload, || Some(identity), |acc, v| op(acc, v), |a, b| op(a, b))
}

/// Reduces `column` to a value of type `T`. `supplier` produces the
/// per-batch seed and must not return `None` — doing so fails the whole
/// reduction with [`Error::InvalidArgument`], per spec §4.6. `accumulate`
/// folds one row's `f64` value into the running accumulator; `combiner`
/// merges two batches' accumulators, ordered by the lower originating
/// batch index (spec §5).
pub fn reduce<T, S, A, C>(
    column: &Column,
    context: &ExecutionContext,
    workload: WorkloadClass,
    supplier: S,
    accumulate: A,
    combiner: C,
) -> Result<T, Error>
where
    T: Send + Clone,
    S: Fn() -> Option<T> + Sync,
    A: Fn(T, f64) -> T + Sync,
    C: Fn(T, T) -> T + Sync,
{
    let reducer = ColumnReducer {
        column,
        supplier,
        accumulate,
        combiner,
        tree: OnceLock::new(),
        result: Mutex::new(None),
    };
    executor::execute(&reducer, context, workload)
}

struct ColumnReducer<'c, T, S, A, C> {
    column: &'c Column,
    supplier: S,
    accumulate: A,
    combiner: C,
    tree: OnceLock<CombineTree<T>>,
    result: Mutex<Option<T>>,
}

impl<'c, T, S, A, C> Calculator<T> for ColumnReducer<'c, T, S, A, C>
where
    T: Send + Clone,
    S: Fn() -> Option<T> + Sync,
    A: Fn(T, f64) -> T + Sync,
    C: Fn(T, T) -> T + Sync,
{
    fn init(&self, n_batches: usize) {
        let _ = self.tree.set(CombineTree::new(n_batches.max(1)));
    }

    fn number_of_operations(&self) -> usize {
        self.column.size()
    }

    fn do_part(&self, from: usize, to: usize, batch_index: usize) -> Result<(), Error> {
        let mut acc = (self.supplier)()
            .ok_or_else(|| Error::invalid_argument("reducer supplier returned no value"))?;
        let mut values = vec![f64::NAN; to - from];
        self.column.fill_f64(&mut values, from);
        for v in values {
            acc = (self.accumulate)(acc, v);
        }
        let tree = self.tree.get().expect("init runs before do_part");
        if let Some(final_result) = tree.combine(batch_index, acc, &self.combiner) {
            *self.result.lock().expect("reducer result mutex poisoned") = Some(final_result);
        }
        Ok(())
    }

    fn get_result(&self) -> T {
        self.result
            .lock()
            .expect("reducer result mutex poisoned")
            .clone()
            .expect("combine-tree did not publish a result")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColumnType, DenseNumericColumn};

    fn numeric(values: Vec<f64>) -> Column {
        Column::DenseNumeric(DenseNumericColumn::new(values, ColumnType::real()))
    }

    #[test]
    fn reduce_f64_sums_in_parallel() {
        let column = numeric(vec![1.0; 1_000_000]);
        let context = ExecutionContext::new(4);
        let total = reduce_f64(&column, &context, WorkloadClass::Small, 0.0, |a, b| a + b).unwrap();
        assert_eq!(total, 1_000_000.0);
    }

    #[test]
    fn reduce_f64_is_invariant_under_parallelism() {
        let values: Vec<f64> = (0..5000).map(|i| i as f64).collect();
        let expected: f64 = values.iter().sum();
        let column = numeric(values);
        for parallelism in [1, 2, 8] {
            let context = ExecutionContext::new(parallelism);
            let total = reduce_f64(&column, &context, WorkloadClass::Large, 0.0, |a, b| a + b).unwrap();
            assert_eq!(total, expected, "parallelism={parallelism}");
        }
    }

    #[test]
    fn generic_reduce_counts_non_missing_rows() {
        let column = numeric(vec![1.0, f64::NAN, 2.0, f64::NAN, 3.0]);
        let context = ExecutionContext::new(2);
        let count = reduce(
            &column,
            &context,
            WorkloadClass::Huge,
            || Some(0usize),
            |acc, v| if v.is_nan() { acc } else { acc + 1 },
            |a, b| a + b,
        )
        .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn null_supplier_is_an_invalid_argument() {
        let column = numeric(vec![1.0]);
        let context = ExecutionContext::new(1);
        let result = reduce::<i32, _, _, _>(&column, &context, WorkloadClass::Small, || None, |a, _| a, |a, _| a);
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }
}
