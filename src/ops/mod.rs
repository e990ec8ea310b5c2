//! Operators that run atop the parallel batch executor (spec §4.6/§4.7):
//! row-wise map, associative reduce, multi-column sort, and column
//! statistics.

pub mod map;
pub mod reduce;
pub mod sort;
pub mod statistics;

pub use map::{map_categorical, map_numeric, map_object};
pub use reduce::{reduce, reduce_f64};
pub use sort::multi_column_sort;
pub use statistics::{categorical_least_frequent, categorical_mode, counts, percentile, std_dev, variance, NumericStats};
