//! The column data model: immutable, positionally indexed value sequences
//! in one of several physical representations, unified behind a single
//! [`Column`] contract.
//!
//! Modeled as a tagged union (sum type) rather than a trait-object
//! hierarchy: every physical layout is a variant of [`Column`], and the
//! contract operations (`size`, `column_type`, `has_capability`, the `fill`
//! family, `map`, `sort`) are implemented once as a match over the variant.
//! This keeps dispatch monomorphic-ish and avoids a dynamic `dyn Column`
//! vtable for what is, per row, a handful of instructions.

pub mod categorical;
pub mod numeric;
pub mod object;
pub mod temporal;

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::Error;
use crate::mapping;

pub use categorical::{CategoricalColumn, Dictionary, IndexStorage, MappedCategoricalColumn};
pub use numeric::{DenseNumericColumn, MappedNumericColumn};
pub use object::{ObjectColumn, ObjectRef};
pub use temporal::{
    DateTimeColumn, MappedDateTimeColumn, MappedTimeOfDayColumn, TemporalStorage, TimeOfDayColumn,
};

/// Sentinel marking a date-time (low precision or the seconds component of
/// high precision) value as missing.
pub const LONG_MIN: i64 = i64::MIN;

/// Sentinel marking a time-of-day value as missing. Chosen as the maximum
/// so that natural `i64` order already places missing entries last.
pub const LONG_MAX: i64 = i64::MAX;

/// Inclusive bounds on a high-precision date-time buffer's `seconds`
/// argument (spec §4.3), matching `java.time.Instant::{MIN,MAX}`'s
/// epoch-second range.
pub const INSTANT_MIN_SECOND: i64 = -31_557_014_167_219_200;
pub const INSTANT_MAX_SECOND: i64 = 31_556_889_864_403_199;

/// Threshold (spec §4.2) controlling whether [`Column::map`] prefers a
/// materialized (view) or copied representation when `prefer_view` is left
/// to the implementation's discretion.
pub const MAPPING_THRESHOLD: f64 = 0.1;

/// Capabilities a column may expose. Stored as a small bitset rather than
/// pulling in a bitflags dependency the rest of the crate has no other use
/// for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const NUMERIC_READABLE: CapabilitySet = CapabilitySet(1 << 0);
    pub const OBJECT_READABLE: CapabilitySet = CapabilitySet(1 << 1);
    pub const SORTABLE: CapabilitySet = CapabilitySet(1 << 2);
    pub const BOOLEAN: CapabilitySet = CapabilitySet(1 << 3);
    pub const NONE: CapabilitySet = CapabilitySet(0);

    pub const fn union(self, other: CapabilitySet) -> CapabilitySet {
        CapabilitySet(self.0 | other.0)
    }

    pub fn contains(self, other: CapabilitySet) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for CapabilitySet {
    type Output = CapabilitySet;
    fn bitor(self, rhs: CapabilitySet) -> CapabilitySet {
        self.union(rhs)
    }
}

/// Which built-in kind a column's type descriptor identifies, or `Custom`
/// for application-defined object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnTypeId {
    Real,
    Integer,
    Nominal,
    DateTime,
    Time,
    Custom,
}

/// Broad storage category a column type belongs to; determines which
/// `fill_*` family is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCategory {
    Numeric,
    Categorical,
    Object,
}

/// Column type descriptor (spec §3).
#[derive(Debug, Clone)]
pub struct ColumnType {
    pub id: ColumnTypeId,
    pub custom_name: Option<String>,
    pub category: ColumnCategory,
    pub element_type: &'static str,
}

impl ColumnType {
    pub fn real() -> Self {
        ColumnType {
            id: ColumnTypeId::Real,
            custom_name: None,
            category: ColumnCategory::Numeric,
            element_type: "f64",
        }
    }

    pub fn integer() -> Self {
        ColumnType {
            id: ColumnTypeId::Integer,
            custom_name: None,
            category: ColumnCategory::Numeric,
            element_type: "f64",
        }
    }

    pub fn nominal() -> Self {
        ColumnType {
            id: ColumnTypeId::Nominal,
            custom_name: None,
            category: ColumnCategory::Categorical,
            element_type: "str",
        }
    }

    pub fn date_time() -> Self {
        ColumnType {
            id: ColumnTypeId::DateTime,
            custom_name: None,
            category: ColumnCategory::Numeric,
            element_type: "i64",
        }
    }

    pub fn time() -> Self {
        ColumnType {
            id: ColumnTypeId::Time,
            custom_name: None,
            category: ColumnCategory::Numeric,
            element_type: "i64",
        }
    }

    pub fn custom(name: impl Into<String>, element_type: &'static str) -> Self {
        ColumnType {
            id: ColumnTypeId::Custom,
            custom_name: Some(name.into()),
            category: ColumnCategory::Object,
            element_type,
        }
    }
}

/// Ascending or descending sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// An immutable, positionally indexed column. See the module documentation
/// for why this is a tagged union rather than a trait-object hierarchy.
#[derive(Debug, Clone)]
pub enum Column {
    DenseNumeric(DenseNumericColumn),
    MappedNumeric(MappedNumericColumn),
    Categorical(CategoricalColumn),
    MappedCategorical(MappedCategoricalColumn),
    DateTime(DateTimeColumn),
    MappedDateTime(MappedDateTimeColumn),
    TimeOfDay(TimeOfDayColumn),
    MappedTimeOfDay(MappedTimeOfDayColumn),
    Object(ObjectColumn),
}

impl Column {
    /// Number of rows.
    pub fn size(&self) -> usize {
        match self {
            Column::DenseNumeric(c) => c.size(),
            Column::MappedNumeric(c) => c.size(),
            Column::Categorical(c) => c.size(),
            Column::MappedCategorical(c) => c.size(),
            Column::DateTime(c) => c.size(),
            Column::MappedDateTime(c) => c.size(),
            Column::TimeOfDay(c) => c.size(),
            Column::MappedTimeOfDay(c) => c.size(),
            Column::Object(c) => c.size(),
        }
    }

    /// The column's type descriptor.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::DenseNumeric(c) => c.column_type(),
            Column::MappedNumeric(c) => c.column_type(),
            Column::Categorical(c) => c.column_type(),
            Column::MappedCategorical(c) => c.column_type(),
            Column::DateTime(c) => c.column_type(),
            Column::MappedDateTime(c) => c.column_type(),
            Column::TimeOfDay(_) | Column::MappedTimeOfDay(_) => ColumnType::time(),
            Column::Object(c) => c.column_type(),
        }
    }

    /// Capability set this column exposes.
    pub fn capabilities(&self) -> CapabilitySet {
        match self {
            Column::DenseNumeric(_) | Column::MappedNumeric(_) => {
                CapabilitySet::NUMERIC_READABLE | CapabilitySet::SORTABLE
            }
            Column::Categorical(c) => c.capabilities(),
            Column::MappedCategorical(c) => c.capabilities(),
            Column::DateTime(_)
            | Column::MappedDateTime(_)
            | Column::TimeOfDay(_)
            | Column::MappedTimeOfDay(_) => {
                CapabilitySet::NUMERIC_READABLE | CapabilitySet::OBJECT_READABLE | CapabilitySet::SORTABLE
            }
            Column::Object(c) => c.capabilities(),
        }
    }

    pub fn has_capability(&self, capability: CapabilitySet) -> bool {
        self.capabilities().contains(capability)
    }

    /// Writes `min(dst.len(), size() - row_start)` consecutive values
    /// starting at `row_start` into `dst`. Positions beyond `size()` write
    /// the column's missing marker (`NaN` for numeric columns).
    pub fn fill_f64(&self, dst: &mut [f64], row_start: usize) -> usize {
        match self {
            Column::DenseNumeric(c) => c.fill_f64(dst, row_start),
            Column::MappedNumeric(c) => c.fill_f64(dst, row_start),
            Column::Categorical(c) => c.fill_f64(dst, row_start),
            Column::MappedCategorical(c) => c.fill_f64(dst, row_start),
            Column::DateTime(c) => c.fill_f64(dst, row_start),
            Column::MappedDateTime(c) => c.fill_f64(dst, row_start),
            Column::TimeOfDay(c) => c.fill_f64(dst, row_start),
            Column::MappedTimeOfDay(c) => c.fill_f64(dst, row_start),
            Column::Object(_) => 0,
        }
    }

    /// Column-major strided variant of [`Column::fill_f64`]: writes
    /// `dst[dst_offset + k * dst_stride]` for `k = 0, .., count - 1`.
    pub fn fill_f64_strided(&self, dst: &mut [f64], row_start: usize, dst_offset: usize, dst_stride: usize, count: usize) {
        let mut tmp = vec![f64::NAN; count];
        let written = self.fill_f64(&mut tmp, row_start);
        for k in 0..written.max(count).min(tmp.len()) {
            dst[dst_offset + k * dst_stride] = tmp[k];
        }
    }

    /// Writes raw category indices (`0` = missing) for categorical columns.
    /// Non-categorical columns write all zeros.
    pub fn fill_category(&self, dst: &mut [i32], row_start: usize) -> usize {
        match self {
            Column::Categorical(c) => c.fill_category(dst, row_start),
            Column::MappedCategorical(c) => c.fill_category(dst, row_start),
            _ => {
                let count = dst.len().min(self.size().saturating_sub(row_start));
                for slot in dst.iter_mut().take(count) {
                    *slot = 0;
                }
                count
            }
        }
    }

    /// Column-major strided variant of [`Column::fill_category`].
    pub fn fill_category_strided(&self, dst: &mut [i32], row_start: usize, dst_offset: usize, dst_stride: usize, count: usize) {
        let mut tmp = vec![0i32; count];
        let written = self.fill_category(&mut tmp, row_start);
        for k in 0..written.max(count).min(tmp.len()) {
            dst[dst_offset + k * dst_stride] = tmp[k];
        }
    }

    /// Writes object references (`None` = missing/null).
    pub fn fill_object(&self, dst: &mut [Option<ObjectRef>], row_start: usize) -> usize {
        match self {
            Column::Categorical(c) => c.fill_object(dst, row_start),
            Column::MappedCategorical(c) => c.fill_object(dst, row_start),
            Column::DateTime(c) => c.fill_object(dst, row_start),
            Column::MappedDateTime(c) => c.fill_object(dst, row_start),
            Column::TimeOfDay(c) => c.fill_object(dst, row_start),
            Column::MappedTimeOfDay(c) => c.fill_object(dst, row_start),
            Column::Object(c) => c.fill_object(dst, row_start),
            Column::DenseNumeric(_) | Column::MappedNumeric(_) => {
                let count = dst.len().min(self.size().saturating_sub(row_start));
                for slot in dst.iter_mut().take(count) {
                    *slot = None;
                }
                count
            }
        }
    }

    /// Single-row convenience wrapper around [`Column::fill_f64`].
    pub fn value_f64(&self, row: usize) -> f64 {
        let mut dst = [f64::NAN; 1];
        self.fill_f64(&mut dst, row);
        dst[0]
    }

    /// Single-row convenience wrapper around [`Column::fill_category`].
    pub fn value_category(&self, row: usize) -> i32 {
        let mut dst = [0i32; 1];
        self.fill_category(&mut dst, row);
        dst[0]
    }

    /// Single-row convenience wrapper around [`Column::fill_object`].
    pub fn value_object(&self, row: usize) -> Option<ObjectRef> {
        let mut dst: [Option<ObjectRef>; 1] = [None];
        self.fill_object(&mut dst, row);
        dst[0].take()
    }

    /// Column-major strided variant of [`Column::fill_object`].
    pub fn fill_object_strided(&self, dst: &mut [Option<ObjectRef>], row_start: usize, dst_offset: usize, dst_stride: usize, count: usize) {
        let mut tmp = vec![None; count];
        let written = self.fill_object(&mut tmp, row_start);
        for k in 0..written.max(count).min(tmp.len()) {
            dst[dst_offset + k * dst_stride] = tmp[k].take();
        }
    }

    /// Applies `permutation` to this column, producing either a mapped view
    /// sharing the underlying storage or a dense copy, per spec §4.2's
    /// `prefer_view` / `MAPPING_THRESHOLD` rule. Composes permutations when
    /// mapping an already-mapped column instead of nesting indirection.
    pub fn map(&self, permutation: &[u32], prefer_view: bool) -> Column {
        match self {
            Column::DenseNumeric(c) => c.map(permutation, prefer_view),
            Column::MappedNumeric(c) => c.map(permutation, prefer_view),
            Column::Categorical(c) => c.map(permutation, prefer_view),
            Column::MappedCategorical(c) => c.map(permutation, prefer_view),
            Column::DateTime(c) => c.map(permutation, prefer_view),
            Column::MappedDateTime(c) => c.map(permutation, prefer_view),
            Column::TimeOfDay(c) => c.map(permutation, prefer_view),
            Column::MappedTimeOfDay(c) => c.map(permutation, prefer_view),
            // Object has no mapped-view physical variant in spec §3's
            // inventory, so it always densifies; see DESIGN.md.
            Column::Object(c) => Column::Object(c.map_dense(permutation)),
        }
    }

    /// Returns a stable sort permutation, or
    /// [`Error::UnsupportedOperation`] if this column lacks the `sortable`
    /// capability.
    pub fn sort(&self, order: SortOrder) -> Result<Vec<u32>, Error> {
        if !self.has_capability(CapabilitySet::SORTABLE) {
            return Err(Error::unsupported_operation(
                "column does not have the sortable capability",
            ));
        }
        let ascending = order == SortOrder::Ascending;
        Ok(match self {
            Column::DenseNumeric(_) | Column::MappedNumeric(_) => {
                let values = materialize_f64(self);
                crate::sort::sort_f64(&values, ascending)
            }
            Column::Categorical(_) | Column::MappedCategorical(_) => {
                let values = materialize_f64(self);
                crate::sort::sort_f64(&values, ascending)
            }
            Column::DateTime(_) | Column::MappedDateTime(_) => {
                let values = materialize_i64_seconds(self);
                crate::sort::sort_i64(&values, ascending, |v| v == LONG_MIN)
            }
            Column::TimeOfDay(_) | Column::MappedTimeOfDay(_) => {
                let values = materialize_i64_seconds(self);
                crate::sort::sort_i64(&values, ascending, |v| v == LONG_MAX)
            }
            Column::Object(c) => c.sort(order)?,
        })
    }

    /// Orders rows `a` and `b` the way [`Column::sort`] would (missing
    /// entries last regardless of `ascending`). Used by the multi-column
    /// table sort to order within a single key column. Numeric-readable
    /// variants (including date-time and time-of-day) compare through
    /// their `f64` encoding rather than re-deriving an exact integer
    /// comparison; see DESIGN.md.
    pub(crate) fn sort_key_cmp(&self, a: usize, b: usize, ascending: bool) -> Result<Ordering, Error> {
        if !self.has_capability(CapabilitySet::SORTABLE) {
            return Err(Error::unsupported_operation(
                "column does not have the sortable capability",
            ));
        }
        match self {
            Column::Object(c) => c.compare_rows(a, b, ascending),
            _ => Ok(cmp_f64_missing_last(self.value_f64(a), self.value_f64(b), ascending)),
        }
    }

    /// `true` if rows `a` and `b` carry the same sort key under
    /// `Double.compare == 0` semantics (spec §4.6): distinct signed zeros
    /// are unequal, any two missing/NaN entries are equal. Used by the
    /// multi-column table sort to find runs that need a further recursive
    /// sort by the next column.
    pub(crate) fn sort_key_eq(&self, a: usize, b: usize) -> Result<bool, Error> {
        if !self.has_capability(CapabilitySet::SORTABLE) {
            return Err(Error::unsupported_operation(
                "column does not have the sortable capability",
            ));
        }
        match self {
            Column::Object(c) => Ok(c.compare_rows(a, b, true)? == Ordering::Equal),
            _ => {
                let (va, vb) = (self.value_f64(a), self.value_f64(b));
                Ok(match (va.is_nan(), vb.is_nan()) {
                    (true, true) => true,
                    (true, false) | (false, true) => false,
                    (false, false) => va.to_bits() == vb.to_bits(),
                })
            }
        }
    }
}

fn materialize_f64(column: &Column) -> Vec<f64> {
    let n = column.size();
    let mut out = vec![f64::NAN; n];
    column.fill_f64(&mut out, 0);
    out
}

fn materialize_i64_seconds(column: &Column) -> Vec<i64> {
    match column {
        Column::DateTime(c) => c.seconds().to_vec(),
        Column::MappedDateTime(c) => c.materialize_seconds(),
        Column::TimeOfDay(c) => c.nanos_of_day().to_vec(),
        Column::MappedTimeOfDay(c) => c.materialize_nanos_of_day(),
        _ => unreachable!("materialize_i64_seconds only called for temporal columns"),
    }
}

/// Shared helper: decide between a mapped view and a dense copy for a
/// column whose underlying storage has `underlying_size` rows, given a
/// `permutation` that may itself be the composition of an outer and an
/// existing inner permutation.
pub(crate) fn prefer_mapped_view(prefer_view: bool, permutation_len: usize, underlying_size: usize) -> bool {
    prefer_view || (permutation_len as f64) > MAPPING_THRESHOLD * (underlying_size as f64)
}

pub(crate) fn shared_slice<T: Clone>(items: &[T]) -> Arc<[T]> {
    Arc::from(items.to_vec().into_boxed_slice())
}

pub(crate) fn compose_permutations(inner: &[u32], outer: &[u32]) -> Vec<u32> {
    mapping::compose(inner, outer)
}

pub(crate) fn cmp_f64_missing_last(a: f64, b: f64, ascending: bool) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let natural = a.partial_cmp(&b).unwrap();
            if ascending {
                natural
            } else {
                natural.reverse()
            }
        }
    }
}
