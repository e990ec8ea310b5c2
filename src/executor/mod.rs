//! The parallel batch executor (spec §4.5): a cooperative work partitioner
//! with a binary combine-tree for associative reductions, abortable by a
//! shared sentinel.

pub mod calculator;
pub mod combine_tree;
pub mod context;
pub mod schedule;
pub mod sentinel;

pub use calculator::{Calculator, WorkloadClass};
pub use combine_tree::CombineTree;
pub use context::ExecutionContext;
pub use schedule::execute;
