//! Striped, multi-column row reader (spec §4.5).
//!
//! Reads several columns in lockstep by filling one stripe (a contiguous
//! run of rows) per column into pre-allocated column-major buffers, then
//! serving single-row access out of that stripe until it is exhausted and a
//! new one needs to be filled. This amortizes the per-call overhead of
//! [`Column::fill_f64`]/[`Column::fill_object`] across many rows instead of
//! calling through the column for every single cell.

use crate::column::{Column, ObjectRef};
use crate::error::Error;

use super::{BEFORE_FIRST_ROW, MIN_BUFFER_SIZE, STRIPE_TARGET_BYTES};

/// Which `fill_*` family a row reader should use for a given column,
/// decided once up front from the column's capabilities rather than
/// re-dispatched every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    Numeric,
    Object,
}

struct Stripe {
    lane: Lane,
    numeric: Vec<f64>,
    object: Vec<Option<ObjectRef>>,
}

/// Reads a fixed set of columns row by row, using an internal striped
/// buffer sized to roughly [`STRIPE_TARGET_BYTES`] per column (never
/// smaller than [`MIN_BUFFER_SIZE`] rows).
pub struct RowReader<'a> {
    columns: Vec<&'a Column>,
    stripes: Vec<Stripe>,
    stripe_len: usize,
    row_count: usize,
    position: i64,
    stripe_start: usize,
    stripe_filled: usize,
}

impl<'a> RowReader<'a> {
    /// Builds a row reader over `columns`. Every numeric-readable column is
    /// read through the `f64` lane; everything else falls back to the
    /// object lane. Fails if `columns` is empty or the columns have
    /// mismatched lengths.
    pub fn new(columns: Vec<&'a Column>) -> Result<Self, Error> {
        if columns.is_empty() {
            return Err(Error::invalid_argument("row reader requires at least one column"));
        }
        let row_count = columns[0].size();
        if columns.iter().any(|c| c.size() != row_count) {
            return Err(Error::invalid_argument(
                "all columns passed to a row reader must have the same length",
            ));
        }
        let stripe_len = stripe_length(&columns);
        let stripes = columns
            .iter()
            .map(|c| {
                let lane = if c.has_capability(crate::column::CapabilitySet::NUMERIC_READABLE) {
                    Lane::Numeric
                } else {
                    Lane::Object
                };
                Stripe {
                    lane,
                    numeric: if lane == Lane::Numeric { vec![f64::NAN; stripe_len] } else { Vec::new() },
                    object: if lane == Lane::Object { vec![None; stripe_len] } else { Vec::new() },
                }
            })
            .collect();
        Ok(RowReader {
            columns,
            stripes,
            stripe_len,
            row_count,
            position: BEFORE_FIRST_ROW,
            stripe_start: 0,
            stripe_filled: 0,
        })
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position + 1 < self.row_count as i64
    }

    /// Number of columns this reader was built over.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn set_position(&mut self, p: i64) -> Result<(), Error> {
        if p < BEFORE_FIRST_ROW {
            return Err(Error::out_of_range(format!(
                "row reader position {p} is before BEFORE_FIRST_ROW ({BEFORE_FIRST_ROW})"
            )));
        }
        self.position = p;
        // Invalidate the stripe; next `advance` refills from the new spot.
        self.stripe_filled = 0;
        self.stripe_start = (p + 1).max(0) as usize;
        Ok(())
    }

    /// True if column `col` in the current row is numeric-fillable (i.e.
    /// read through [`Column::fill_f64`]).
    pub fn numeric_fillable(&self, col: usize) -> bool {
        self.stripes[col].lane == Lane::Numeric
    }

    /// True if column `col` in the current row is read through
    /// [`Column::fill_object`].
    pub fn object_fillable(&self, col: usize) -> bool {
        self.stripes[col].lane == Lane::Object
    }

    fn refill_stripe(&mut self) {
        let start = self.stripe_start;
        let remaining = self.row_count - start;
        let len = self.stripe_len.min(remaining);
        for (stripe, column) in self.stripes.iter_mut().zip(self.columns.iter()) {
            match stripe.lane {
                Lane::Numeric => {
                    column.fill_f64(&mut stripe.numeric[..len], start);
                }
                Lane::Object => {
                    column.fill_object(&mut stripe.object[..len], start);
                }
            }
        }
        self.stripe_filled = len;
    }

    /// Advances to the next row, refilling the stripe buffer if needed.
    /// Returns `false` once every row has been read.
    pub fn advance(&mut self) -> bool {
        if !self.has_remaining() {
            return false;
        }
        self.position += 1;
        let pos = self.position as usize;
        if pos < self.stripe_start || pos >= self.stripe_start + self.stripe_filled {
            self.stripe_start = pos;
            self.refill_stripe();
        }
        true
    }

    /// Reads column `col` of the current row as `f64`. Panics if `col` is
    /// not numeric-fillable; callers should check [`Self::numeric_fillable`]
    /// first.
    pub fn read_f64(&self, col: usize) -> f64 {
        let offset = self.position as usize - self.stripe_start;
        self.stripes[col].numeric[offset]
    }

    /// Reads column `col` of the current row as an object reference.
    /// Panics if `col` is not object-fillable.
    pub fn read_object(&self, col: usize) -> Option<ObjectRef> {
        let offset = self.position as usize - self.stripe_start;
        self.stripes[col].object[offset].clone()
    }
}

fn stripe_length(columns: &[&Column]) -> usize {
    if columns.is_empty() {
        return MIN_BUFFER_SIZE;
    }
    // Numeric lanes cost 8 bytes/row, object lanes a pointer-ish estimate;
    // approximate with 8 bytes/row/column either way, which is exact for
    // the numeric lane and a reasonable stand-in for the object lane's
    // `Arc` pointer.
    let bytes_per_row = columns.len() * 8;
    let by_budget = (STRIPE_TARGET_BYTES / bytes_per_row.max(1)).max(MIN_BUFFER_SIZE);
    let row_count = columns[0].size().max(1);
    by_budget.min(row_count).max(MIN_BUFFER_SIZE.min(row_count))
}
