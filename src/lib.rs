//! In-memory columnar table storage and parallel batch execution.
//!
//! A [`column::Column`] is an immutable, positionally indexed value
//! sequence in one of several physical representations (dense or mapped
//! numeric, dictionary-encoded categorical, date-time, time-of-day, or
//! type-erased object). Columns are produced by freezing a
//! [`buffers`] buffer, assembled into a [`table::Table`], operated on
//! through [`ops`] (row-wise map, associative reduce, multi-column sort,
//! statistics) running atop the [`executor`] parallel batch scheduler, and
//! optionally persisted with [`persistence`].

pub mod buffers;
pub mod column;
pub mod error;
pub mod executor;
pub mod mapping;
pub mod ops;
pub mod packed;
pub mod persistence;
pub mod readers;
pub mod sort;
pub mod table;

pub use column::{Column, ColumnType, ColumnTypeId, SortOrder};
pub use error::Error;
pub use executor::{Calculator, ExecutionContext, WorkloadClass};
pub use table::{ColumnSelector, Table};
