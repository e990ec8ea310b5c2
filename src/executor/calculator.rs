//! The `Calculator` contract driven by the scheduler, and the workload
//! classes that tune how it gets partitioned (spec §4.5).

use crate::error::Error;

/// A unit of parallelizable work over a row range `[from, to)`, split into
/// `n_batches` independent batches. Implementations own whatever
/// per-batch accumulator state they need (typically behind a lock or a
/// per-batch slot array) since `do_part` is called concurrently from
/// multiple worker threads.
pub trait Calculator<T>: Send + Sync
where
    T: Send,
{
    /// Called once, before any `do_part`, with the number of batches the
    /// scheduler decided on.
    fn init(&self, n_batches: usize);

    /// Total number of elements (`N`) this calculator processes. Read once
    /// by the scheduler to pick a scheduling strategy.
    fn number_of_operations(&self) -> usize;

    /// Processes row range `[from, to)` as batch `batch_index`.
    fn do_part(&self, from: usize, to: usize, batch_index: usize) -> Result<(), Error>;

    /// Called once, after every batch has completed successfully, to
    /// produce the final result.
    fn get_result(&self) -> T;
}

/// Declarative hint controlling batch size and the minimum `N` for
/// parallel execution (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadClass {
    /// Cheap per-element work (e.g. a single comparison); needs a large `N`
    /// before parallelizing pays for itself. Also the default.
    Small,
    Medium,
    Large,
    /// Expensive per-element work (e.g. allocating object references);
    /// parallelizes even for small `N`.
    Huge,
}

impl WorkloadClass {
    /// The crate's zero-config entry point.
    pub const DEFAULT: WorkloadClass = WorkloadClass::Small;

    /// `(threshold_parallel, batch_size)`.
    pub fn thresholds(self) -> (usize, usize) {
        match self {
            WorkloadClass::Small => (32_768, 1_048_576),
            WorkloadClass::Medium => (1_024, 32_768),
            WorkloadClass::Large => (32, 1_024),
            WorkloadClass::Huge => (4, 32),
        }
    }
}
