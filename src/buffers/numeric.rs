//! Fixed-length and growing numeric buffers (spec §4.4). `Real` buffers
//! accept any finite or `NaN` (missing) `f64`; `Integer` buffers round every
//! written value to the nearest integral `f64` using round-half-to-even
//! before storing it.

use std::sync::Mutex;

use crate::column::{Column, ColumnType, DenseNumericColumn};
use crate::error::Error;

enum Storage {
    Fixed(Vec<f64>),
    Growing(Vec<f64>),
}

impl Storage {
    fn as_slice(&self) -> &[f64] {
        match self {
            Storage::Fixed(v) | Storage::Growing(v) => v,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [f64] {
        match self {
            Storage::Fixed(v) | Storage::Growing(v) => v,
        }
    }

    fn len(&self) -> usize {
        self.as_slice().len()
    }
}

struct Inner {
    storage: Storage,
    frozen: bool,
}

/// A numeric buffer. Created fixed-length (pre-sized, random-access `set`)
/// or growing (`push`-only, fills from position `0`).
pub struct NumericBuffer {
    inner: Mutex<Inner>,
    integer: bool,
}

impl NumericBuffer {
    /// A fixed-length buffer of `capacity` rows, all initially missing
    /// (`NaN`).
    pub fn new_fixed(capacity: usize, integer: bool) -> Self {
        NumericBuffer {
            inner: Mutex::new(Inner {
                storage: Storage::Fixed(vec![f64::NAN; capacity]),
                frozen: false,
            }),
            integer,
        }
    }

    /// An initially empty, append-only buffer.
    pub fn new_growing(integer: bool) -> Self {
        NumericBuffer {
            inner: Mutex::new(Inner {
                storage: Storage::Growing(Vec::new()),
                frozen: false,
            }),
            integer,
        }
    }

    fn normalize(&self, value: f64) -> f64 {
        if self.integer && !value.is_nan() {
            value.round_ties_even()
        } else {
            value
        }
    }

    /// Writes `value` at `row` of a fixed-length buffer.
    pub fn set(&self, row: usize, value: f64) -> Result<(), Error> {
        let normalized = self.normalize(value);
        let mut inner = self.inner.lock().expect("numeric buffer lock poisoned");
        if inner.frozen {
            return Err(Error::BufferFrozen);
        }
        let len = inner.storage.len();
        if row >= len {
            return Err(Error::out_of_range(format!(
                "row {row} is out of range for a buffer of length {len}"
            )));
        }
        inner.storage.as_mut_slice()[row] = normalized;
        Ok(())
    }

    /// Appends `value` to a growing buffer, returning its row index.
    pub fn push(&self, value: f64) -> Result<usize, Error> {
        let normalized = self.normalize(value);
        let mut inner = self.inner.lock().expect("numeric buffer lock poisoned");
        if inner.frozen {
            return Err(Error::BufferFrozen);
        }
        match &mut inner.storage {
            Storage::Growing(v) => {
                v.push(normalized);
                Ok(v.len() - 1)
            }
            Storage::Fixed(_) => Err(Error::unsupported_operation(
                "cannot push onto a fixed-length numeric buffer",
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("numeric buffer lock poisoned").storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freezes the buffer into an immutable column. Further mutation fails
    /// with [`Error::BufferFrozen`]; calling `freeze` again returns the same
    /// snapshot.
    pub fn freeze(&self) -> Column {
        let mut inner = self.inner.lock().expect("numeric buffer lock poisoned");
        inner.frozen = true;
        let data = inner.storage.as_slice().to_vec();
        let column_type = if self.integer {
            ColumnType::integer()
        } else {
            ColumnType::real()
        };
        Column::DenseNumeric(DenseNumericColumn::new(data, column_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_buffer_rejects_out_of_range_row() {
        let buf = NumericBuffer::new_fixed(2, false);
        assert!(buf.set(0, 1.0).is_ok());
        assert!(buf.set(2, 1.0).is_err());
    }

    #[test]
    fn integer_buffer_rounds_half_to_even() {
        let buf = NumericBuffer::new_fixed(4, true);
        buf.set(0, 0.5).unwrap();
        buf.set(1, 1.5).unwrap();
        buf.set(2, 2.5).unwrap();
        buf.set(3, -0.5).unwrap();
        match buf.freeze() {
            Column::DenseNumeric(c) => assert_eq!(c.values(), &[0.0, 2.0, 2.0, -0.0]),
            _ => panic!("expected dense numeric column"),
        }
    }

    #[test]
    fn frozen_buffer_rejects_further_writes() {
        let buf = NumericBuffer::new_fixed(1, false);
        buf.freeze();
        assert!(matches!(buf.set(0, 1.0), Err(Error::BufferFrozen)));
    }

    #[test]
    fn growing_buffer_cannot_be_random_access_written() {
        let buf = NumericBuffer::new_growing(false);
        assert!(buf.push(1.0).is_ok());
        assert!(buf.set(0, 2.0).is_err());
    }

    #[test]
    fn growing_buffer_freezes_pushed_values_in_order() {
        let buf = NumericBuffer::new_growing(false);
        buf.push(1.0).unwrap();
        buf.push(2.0).unwrap();
        match buf.freeze() {
            Column::DenseNumeric(c) => assert_eq!(c.values(), &[1.0, 2.0]),
            _ => panic!("expected dense numeric column"),
        }
    }
}
