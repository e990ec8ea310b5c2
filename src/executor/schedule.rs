//! The scheduler: picks batched / sequential / equal-part strategy from
//! `N` and the workload class, dispatches worker threads, and resolves the
//! cooperative-abort protocol (spec §4.5).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::Error;

use super::calculator::{Calculator, WorkloadClass};
use super::context::ExecutionContext;
use super::sentinel::Sentinel;

/// Runs `calculator` to completion against `context`, tuned by
/// `workload`. Blocks until every worker has finished, then returns
/// `calculator.get_result()`.
///
/// On failure, exactly one error reaches the caller: the first worker to
/// observe a failure (its own `do_part` error, or the context/sentinel
/// going inactive) flips the sentinel and its error is the one returned;
/// every other worker's contribution is discarded.
pub fn execute<T: Send>(calculator: &(impl Calculator<T> + ?Sized), context: &ExecutionContext, workload: WorkloadClass) -> Result<T, Error> {
    let n = calculator.number_of_operations();
    let n_tasks = context.parallelism().max(1);
    let (threshold_parallel, batch_size) = workload.thresholds();

    let plan = if n >= batch_size.saturating_mul(2).saturating_mul(n_tasks) {
        Plan::batched(n, batch_size)
    } else if n < threshold_parallel {
        Plan::sequential(n)
    } else {
        Plan::equal_part(n, n_tasks)
    };

    log::debug!(
        "scheduling {} over {} batch(es), {} worker(s)",
        plan.name(),
        plan.n_batches(),
        n_tasks
    );

    calculator.init(plan.n_batches());

    let sentinel = Sentinel::new();
    let first_error: Mutex<Option<Error>> = Mutex::new(None);

    match &plan {
        Plan::Sequential { n } => {
            run_one_batch(calculator, context, &sentinel, &first_error, 0, *n, 0);
        }
        Plan::Batched { n, batch_size } => {
            let cursor = AtomicUsize::new(0);
            let workers = n_tasks.min((*n).div_ceil(*batch_size).max(1));
            std::thread::scope(|scope| {
                let mut handles = Vec::with_capacity(workers);
                for _ in 0..workers {
                    handles.push(scope.spawn(|| loop {
                        if !context.is_active() || !sentinel.is_alive() {
                            record_abort(&sentinel, &first_error);
                            return;
                        }
                        let start = cursor.fetch_add(*batch_size, Ordering::SeqCst);
                        if start >= *n {
                            return;
                        }
                        let end = (start + *batch_size).min(*n);
                        let batch_index = start / *batch_size;
                        run_one_batch(calculator, context, &sentinel, &first_error, start, end, batch_index);
                    }));
                }
                // Join in reverse submission order, per spec §4.5.
                for handle in handles.into_iter().rev() {
                    let _ = handle.join();
                }
            });
        }
        Plan::EqualPart { n, target, n_tasks } => {
            std::thread::scope(|scope| {
                let mut handles = Vec::with_capacity(*n_tasks);
                for batch_index in 0..*n_tasks {
                    let start = batch_index * target;
                    let end = (start + target).min(*n);
                    handles.push(scope.spawn(move || {
                        run_one_batch(calculator, context, &sentinel, &first_error, start, end, batch_index);
                    }));
                }
                for handle in handles.into_iter().rev() {
                    let _ = handle.join();
                }
            });
        }
    }

    match first_error.into_inner().expect("first_error mutex poisoned") {
        Some(err) => Err(err),
        None => Ok(calculator.get_result()),
    }
}

fn run_one_batch<T: Send>(
    calculator: &(impl Calculator<T> + ?Sized),
    context: &ExecutionContext,
    sentinel: &Sentinel,
    first_error: &Mutex<Option<Error>>,
    start: usize,
    end: usize,
    do_part_batch_index: usize,
) {
    if !context.is_active() || !sentinel.is_alive() {
        record_abort(sentinel, first_error);
        return;
    }
    if let Err(err) = calculator.do_part(start, end, do_part_batch_index) {
        if sentinel.flip() {
            *first_error.lock().expect("first_error mutex poisoned") = Some(err);
        }
    }
}

fn record_abort(sentinel: &Sentinel, first_error: &Mutex<Option<Error>>) {
    if sentinel.flip() {
        log::warn!("sentinel flipped, aborting remaining batches");
        *first_error.lock().expect("first_error mutex poisoned") = Some(Error::TaskAborted { source: None });
    }
}

enum Plan {
    Sequential { n: usize },
    Batched { n: usize, batch_size: usize },
    EqualPart { n: usize, target: usize, n_tasks: usize },
}

impl Plan {
    fn sequential(n: usize) -> Self {
        Plan::Sequential { n }
    }

    fn batched(n: usize, batch_size: usize) -> Self {
        Plan::Batched { n, batch_size }
    }

    fn equal_part(n: usize, n_tasks: usize) -> Self {
        // Target batch size padded up to a multiple of 4 (U2 alignment).
        let raw_target = n.div_ceil(n_tasks).max(1);
        let target = raw_target.div_ceil(4) * 4;
        let n_tasks = n.div_ceil(target).max(1);
        Plan::EqualPart { n, target, n_tasks }
    }

    fn n_batches(&self) -> usize {
        match self {
            Plan::Sequential { .. } => 1,
            Plan::Batched { n, batch_size } => (*n).div_ceil(*batch_size).max(1),
            Plan::EqualPart { n_tasks, .. } => *n_tasks,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Plan::Sequential { .. } => "sequential",
            Plan::Batched { .. } => "batched",
            Plan::EqualPart { .. } => "equal-part",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI64;

    struct SumCalculator {
        values: Vec<f64>,
        partials: Mutex<Vec<f64>>,
        fail_on_batch: Option<usize>,
    }

    impl SumCalculator {
        fn new(values: Vec<f64>) -> Self {
            SumCalculator {
                values,
                partials: Mutex::new(Vec::new()),
                fail_on_batch: None,
            }
        }

        fn failing(values: Vec<f64>, fail_on_batch: usize) -> Self {
            SumCalculator {
                values,
                partials: Mutex::new(Vec::new()),
                fail_on_batch: Some(fail_on_batch),
            }
        }
    }

    impl Calculator<f64> for SumCalculator {
        fn init(&self, n_batches: usize) {
            *self.partials.lock().unwrap() = vec![0.0; n_batches];
        }

        fn number_of_operations(&self) -> usize {
            self.values.len()
        }

        fn do_part(&self, from: usize, to: usize, batch_index: usize) -> Result<(), Error> {
            if self.fail_on_batch == Some(batch_index) {
                return Err(Error::invalid_argument("synthetic failure"));
            }
            let partial: f64 = self.values[from..to].iter().sum();
            self.partials.lock().unwrap()[batch_index] = partial;
            Ok(())
        }

        fn get_result(&self) -> f64 {
            self.partials.lock().unwrap().iter().sum()
        }
    }

    #[test]
    fn sequential_path_for_small_n() {
        let calc = SumCalculator::new(vec![1.0; 10]);
        let ctx = ExecutionContext::new(4);
        let result = execute(&calc, &ctx, WorkloadClass::Small).unwrap();
        assert_eq!(result, 10.0);
    }

    #[test]
    fn batched_path_sums_a_million_rows_deterministically() {
        let values = vec![1.0; 1_000_000];
        for parallelism in [1, 2, 4, 8] {
            let calc = SumCalculator::new(values.clone());
            let ctx = ExecutionContext::new(parallelism);
            let result = execute(&calc, &ctx, WorkloadClass::Small).unwrap();
            assert_eq!(result, 1_000_000.0, "parallelism={parallelism}");
        }
    }

    #[test]
    fn equal_part_path_covers_every_row_exactly_once() {
        let values: Vec<f64> = (0..5000).map(|i| i as f64).collect();
        let expected: f64 = values.iter().sum();
        let calc = SumCalculator::new(values);
        let ctx = ExecutionContext::new(4);
        let result = execute(&calc, &ctx, WorkloadClass::Large).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn abort_on_do_part_failure_surfaces_exactly_one_error() {
        let values = vec![1.0; 1_000_000];
        let calc = SumCalculator::failing(values, 3);
        let ctx = ExecutionContext::new(4);
        let result = execute(&calc, &ctx, WorkloadClass::Small);
        assert!(result.is_err());
    }

    #[test]
    fn deactivated_context_is_observed_as_abort() {
        let counter = AtomicI64::new(0);
        struct NoopCalculator<'a>(&'a AtomicI64, usize);
        impl Calculator<i64> for NoopCalculator<'_> {
            fn init(&self, _: usize) {}
            fn number_of_operations(&self) -> usize {
                self.1
            }
            fn do_part(&self, _from: usize, _to: usize, _batch: usize) -> Result<(), Error> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            fn get_result(&self) -> i64 {
                self.0.load(Ordering::SeqCst)
            }
        }
        let ctx = ExecutionContext::new(2);
        ctx.deactivate();
        let calc = NoopCalculator(&counter, 2_000_000);
        let result = execute(&calc, &ctx, WorkloadClass::Small);
        assert!(result.is_err());
    }
}
