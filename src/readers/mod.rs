//! Stateful cursors over columns, plus the striped row reader for reading
//! several columns in lockstep (spec §4.5).
//!
//! Every cursor starts positioned "before the first row"
//! ([`BEFORE_FIRST_ROW`]) and is advanced explicitly; this mirrors a
//! forward-only database cursor rather than an `Iterator`, because the row
//! reader needs to move several cursors by the same stripe length at once
//! without each one owning its own buffer.

use crate::column::Column;
use crate::error::Error;

/// Position value a freshly created cursor starts at: before any row has
/// been read.
pub const BEFORE_FIRST_ROW: i64 = -1;

/// Smallest row reader stripe the executor will allocate, regardless of
/// how small the caller's requested buffer size is.
pub const MIN_BUFFER_SIZE: usize = 8;

/// Target footprint, in bytes, for a row reader's internal stripe buffers
/// when the caller does not pick an explicit row count.
pub const STRIPE_TARGET_BYTES: usize = 256 * 1024;

pub mod row;

pub use row::RowReader;

/// Shared cursor position bookkeeping used by every single-column cursor.
#[derive(Debug, Clone, Copy)]
struct CursorState {
    position: i64,
    size: usize,
}

impl CursorState {
    fn new(size: usize) -> Self {
        CursorState {
            position: BEFORE_FIRST_ROW,
            size,
        }
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn has_remaining(&self) -> bool {
        self.position + 1 < self.size as i64
    }

    /// Advances one row. Returns `false` (and leaves the cursor parked one
    /// past the last row) once exhausted, instead of failing: spec §4.5
    /// treats reading past the end as a caller bug to catch with a
    /// debug-assert, not a hard error.
    fn advance(&mut self) -> bool {
        debug_assert!(
            self.has_remaining(),
            "advancing a cursor with no remaining rows; check has_remaining() first"
        );
        if self.has_remaining() {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn set_position(&mut self, p: i64) -> Result<(), Error> {
        if p < BEFORE_FIRST_ROW {
            return Err(Error::out_of_range(format!(
                "cursor position {p} is before BEFORE_FIRST_ROW ({BEFORE_FIRST_ROW})"
            )));
        }
        self.position = p;
        Ok(())
    }
}

/// A forward-movable cursor over a single column, yielding `f64` values
/// (`NaN` for missing, matching [`Column::fill_f64`]).
pub struct NumericCursor<'a> {
    column: &'a Column,
    state: CursorState,
}

impl<'a> NumericCursor<'a> {
    pub fn new(column: &'a Column) -> Self {
        NumericCursor {
            column,
            state: CursorState::new(column.size()),
        }
    }

    pub fn position(&self) -> i64 {
        self.state.position()
    }

    pub fn has_remaining(&self) -> bool {
        self.state.has_remaining()
    }

    pub fn set_position(&mut self, p: i64) -> Result<(), Error> {
        self.state.set_position(p)
    }

    /// Advances one row and returns its value, or `None` if the cursor was
    /// already exhausted.
    pub fn read(&mut self) -> Option<f64> {
        if self.state.advance() {
            Some(self.column.value_f64(self.state.position() as usize))
        } else {
            None
        }
    }
}

/// A forward-movable cursor over a single categorical column, yielding raw
/// category indices (`0` = missing).
pub struct CategoricalCursor<'a> {
    column: &'a Column,
    state: CursorState,
}

impl<'a> CategoricalCursor<'a> {
    pub fn new(column: &'a Column) -> Self {
        CategoricalCursor {
            column,
            state: CursorState::new(column.size()),
        }
    }

    pub fn position(&self) -> i64 {
        self.state.position()
    }

    pub fn has_remaining(&self) -> bool {
        self.state.has_remaining()
    }

    pub fn set_position(&mut self, p: i64) -> Result<(), Error> {
        self.state.set_position(p)
    }

    pub fn read(&mut self) -> Option<i32> {
        if self.state.advance() {
            Some(self.column.value_category(self.state.position() as usize))
        } else {
            None
        }
    }
}

/// A forward-movable cursor over a single column, yielding type-erased
/// object references.
pub struct ObjectCursor<'a> {
    column: &'a Column,
    state: CursorState,
}

impl<'a> ObjectCursor<'a> {
    pub fn new(column: &'a Column) -> Self {
        ObjectCursor {
            column,
            state: CursorState::new(column.size()),
        }
    }

    pub fn position(&self) -> i64 {
        self.state.position()
    }

    pub fn has_remaining(&self) -> bool {
        self.state.has_remaining()
    }

    pub fn set_position(&mut self, p: i64) -> Result<(), Error> {
        self.state.set_position(p)
    }

    pub fn read(&mut self) -> Option<Option<crate::column::ObjectRef>> {
        if self.state.advance() {
            Some(self.column.value_object(self.state.position() as usize))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColumnType, DenseNumericColumn};

    fn numeric_column(values: &[f64]) -> Column {
        Column::DenseNumeric(DenseNumericColumn::new(values.to_vec(), ColumnType::real()))
    }

    #[test]
    fn cursor_starts_before_first_row() {
        let column = numeric_column(&[1.0, 2.0]);
        let cursor = NumericCursor::new(&column);
        assert_eq!(cursor.position(), BEFORE_FIRST_ROW);
    }

    #[test]
    fn cursor_reads_values_in_order_then_exhausts() {
        let column = numeric_column(&[1.0, 2.0]);
        let mut cursor = NumericCursor::new(&column);
        assert_eq!(cursor.read(), Some(1.0));
        assert_eq!(cursor.read(), Some(2.0));
        assert_eq!(cursor.read(), None);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn set_position_rejects_values_below_before_first_row() {
        let column = numeric_column(&[1.0]);
        let mut cursor = NumericCursor::new(&column);
        assert!(cursor.set_position(-2).is_err());
        assert!(cursor.set_position(-1).is_ok());
    }

    #[test]
    fn set_position_allows_seeking_forward() {
        let column = numeric_column(&[1.0, 2.0, 3.0]);
        let mut cursor = NumericCursor::new(&column);
        cursor.set_position(0).unwrap();
        assert_eq!(cursor.read(), Some(2.0));
    }
}
