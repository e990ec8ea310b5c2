//! Categorical dictionary buffers, in the five packed-index widths (spec
//! §4.1/§4.4). All five share the same dictionary-maintenance contract:
//! an append-only index-to-value vector plus a value-to-index map, guarded
//! by a single lock with double-checked lookup so concurrent writers
//! resolving the same new value don't race to insert it twice.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::column::{CategoricalColumn, Column, Dictionary, IndexStorage};
use crate::error::{self, Error};
use crate::packed::{self, IntFormat};

struct DictionaryState {
    values: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl DictionaryState {
    fn new() -> Self {
        DictionaryState {
            values: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Resolves `value` to its category index, inserting it if this is the
    /// first time it has been seen. Fails if the format is already at
    /// capacity and `value` is new.
    fn resolve(&mut self, value: &str, format: IntFormat) -> Result<u32, Error> {
        if let Some(&idx) = self.lookup.get(value) {
            return Ok(idx);
        }
        let next_index = self.values.len() as u32 + 1;
        if next_index > format.max_value() {
            log::debug!("dictionary overflow for {format:?}: rejecting new value at index {next_index}");
            return Err(error::dictionary_overflow(format));
        }
        self.values.push(value.to_owned());
        self.lookup.insert(value.to_owned(), next_index);
        Ok(next_index)
    }
}

enum PackedStorage {
    U2(Vec<u8>, usize),
    U4(Vec<u8>, usize),
    U8(Vec<u8>),
    U16(Vec<u16>),
    I32(Vec<i32>),
}

impl PackedStorage {
    fn new_fixed(format: IntFormat, capacity: usize) -> Self {
        match format {
            IntFormat::U2 => PackedStorage::U2(vec![0u8; format.bytes_per_n_elements(capacity)], capacity),
            IntFormat::U4 => PackedStorage::U4(vec![0u8; format.bytes_per_n_elements(capacity)], capacity),
            IntFormat::U8 => PackedStorage::U8(vec![0u8; capacity]),
            IntFormat::U16 => PackedStorage::U16(vec![0u16; capacity]),
            IntFormat::I32 => PackedStorage::I32(vec![0i32; capacity]),
        }
    }

    fn new_growing(format: IntFormat) -> Self {
        Self::new_fixed(format, 0)
    }

    fn len(&self) -> usize {
        match self {
            PackedStorage::U2(_, n) | PackedStorage::U4(_, n) => *n,
            PackedStorage::U8(v) => v.len(),
            PackedStorage::U16(v) => v.len(),
            PackedStorage::I32(v) => v.len(),
        }
    }

    fn set(&mut self, row: usize, index: u32) -> Result<(), Error> {
        match self {
            PackedStorage::U2(bytes, _) => packed::write_u2(bytes, row, index as u8),
            PackedStorage::U4(bytes, _) => packed::write_u4(bytes, row, index as u8),
            PackedStorage::U8(v) => {
                v[row] = index as u8;
                Ok(())
            }
            PackedStorage::U16(v) => {
                v[row] = index as u16;
                Ok(())
            }
            PackedStorage::I32(v) => {
                v[row] = index as i32;
                Ok(())
            }
        }
    }

    fn push(&mut self, index: u32) {
        match self {
            // Growing U2/U4 buffers grow 4-at-a-time to keep the packed
            // byte array aligned; see the `4`-aligned batch-size
            // requirement the parallel executor also honors for this
            // format family.
            PackedStorage::U2(bytes, n) => {
                if *n % 4 == 0 {
                    bytes.push(0);
                }
                packed::write_u2(bytes, *n, index as u8).expect("push index already capacity-checked");
                *n += 1;
            }
            PackedStorage::U4(bytes, n) => {
                if *n % 2 == 0 {
                    bytes.push(0);
                }
                packed::write_u4(bytes, *n, index as u8).expect("push index already capacity-checked");
                *n += 1;
            }
            PackedStorage::U8(v) => v.push(index as u8),
            PackedStorage::U16(v) => v.push(index as u16),
            PackedStorage::I32(v) => v.push(index as i32),
        }
    }

    fn into_index_storage(self) -> IndexStorage {
        match self {
            PackedStorage::U2(bytes, n) => IndexStorage::U2(std::sync::Arc::from(bytes.into_boxed_slice()), n),
            PackedStorage::U4(bytes, n) => IndexStorage::U4(std::sync::Arc::from(bytes.into_boxed_slice()), n),
            PackedStorage::U8(v) => IndexStorage::U8(std::sync::Arc::from(v.into_boxed_slice())),
            PackedStorage::U16(v) => IndexStorage::U16(std::sync::Arc::from(v.into_boxed_slice())),
            PackedStorage::I32(v) => IndexStorage::I32(std::sync::Arc::from(v.into_boxed_slice())),
        }
    }
}

struct Inner {
    indices: PackedStorage,
    dictionary: DictionaryState,
    frozen: bool,
}

/// A categorical buffer in a fixed packed index width.
pub struct CategoricalBuffer {
    inner: Mutex<Inner>,
    format: IntFormat,
}

impl CategoricalBuffer {
    pub fn new_fixed(format: IntFormat, capacity: usize) -> Self {
        CategoricalBuffer {
            inner: Mutex::new(Inner {
                indices: PackedStorage::new_fixed(format, capacity),
                dictionary: DictionaryState::new(),
                frozen: false,
            }),
            format,
        }
    }

    pub fn new_growing(format: IntFormat) -> Self {
        CategoricalBuffer {
            inner: Mutex::new(Inner {
                indices: PackedStorage::new_growing(format),
                dictionary: DictionaryState::new(),
                frozen: false,
            }),
            format,
        }
    }

    pub fn format(&self) -> IntFormat {
        self.format
    }

    /// Writes `value` (or clears to missing if `None`) at `row` of a
    /// fixed-length buffer. Fails with [`Error::DictionaryOverflow`] if
    /// `value` is new and the format's dictionary is already full.
    pub fn set(&self, row: usize, value: Option<&str>) -> Result<(), Error> {
        let mut inner = self.inner.lock().expect("categorical buffer lock poisoned");
        if inner.frozen {
            return Err(Error::BufferFrozen);
        }
        let len = inner.indices.len();
        if row >= len {
            return Err(Error::out_of_range(format!(
                "row {row} is out of range for a buffer of length {len}"
            )));
        }
        let index = match value {
            None => 0,
            Some(v) => inner.dictionary.resolve(v, self.format)?,
        };
        inner.indices.set(row, index)
    }

    /// Non-throwing sibling of [`set`](Self::set): `false` instead of a
    /// `DictionaryOverflow` (or any other) error.
    pub fn set_try(&self, row: usize, value: Option<&str>) -> bool {
        self.set(row, value).is_ok()
    }

    /// Appends `value` to a growing buffer, returning its row index.
    pub fn push(&self, value: Option<&str>) -> Result<usize, Error> {
        let mut inner = self.inner.lock().expect("categorical buffer lock poisoned");
        if inner.frozen {
            return Err(Error::BufferFrozen);
        }
        let index = match value {
            None => 0,
            Some(v) => inner.dictionary.resolve(v, self.format)?,
        };
        let row = inner.indices.len();
        inner.indices.push(index);
        Ok(row)
    }

    /// Non-throwing sibling of [`push`](Self::push): `None` instead of a
    /// `DictionaryOverflow` (or any other) error.
    pub fn push_try(&self, value: Option<&str>) -> Option<usize> {
        self.push(value).ok()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("categorical buffer lock poisoned").indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freezes into a plain categorical column.
    pub fn freeze(&self) -> Column {
        self.freeze_with_positive_index(None)
    }

    /// Freezes into a categorical column that also exposes the `boolean`
    /// capability, treating `positive_value`'s dictionary index as "true".
    pub fn freeze_boolean(&self, positive_value: &str) -> Result<Column, Error> {
        let index = {
            let mut inner = self.inner.lock().expect("categorical buffer lock poisoned");
            inner.dictionary.resolve(positive_value, self.format)?
        };
        Ok(self.freeze_with_positive_index(Some(index)))
    }

    fn freeze_with_positive_index(&self, positive_index: Option<u32>) -> Column {
        let mut inner = self.inner.lock().expect("categorical buffer lock poisoned");
        inner.frozen = true;
        let indices = clone_packed_storage(&inner.indices);
        let dictionary = std::sync::Arc::new(Dictionary {
            values: inner.dictionary.values.clone(),
        });
        Column::Categorical(CategoricalColumn::new(indices.into_index_storage(), dictionary, positive_index))
    }
}

fn clone_packed_storage(storage: &PackedStorage) -> PackedStorage {
    match storage {
        PackedStorage::U2(b, n) => PackedStorage::U2(b.clone(), *n),
        PackedStorage::U4(b, n) => PackedStorage::U4(b.clone(), *n),
        PackedStorage::U8(v) => PackedStorage::U8(v.clone()),
        PackedStorage::U16(v) => PackedStorage::U16(v.clone()),
        PackedStorage::I32(v) => PackedStorage::I32(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_value_reuses_dictionary_index() {
        let buf = CategoricalBuffer::new_fixed(IntFormat::U8, 3);
        buf.set(0, Some("a")).unwrap();
        buf.set(1, Some("b")).unwrap();
        buf.set(2, Some("a")).unwrap();
        match buf.freeze() {
            Column::Categorical(c) => {
                let mut dst = [0i32; 3];
                c.fill_category(&mut dst, 0);
                assert_eq!(dst, [1, 2, 1]);
            }
            _ => panic!("expected categorical column"),
        }
    }

    #[test]
    fn u2_buffer_overflows_after_three_distinct_values() {
        let buf = CategoricalBuffer::new_fixed(IntFormat::U2, 4);
        buf.set(0, Some("a")).unwrap();
        buf.set(1, Some("b")).unwrap();
        buf.set(2, Some("c")).unwrap();
        let err = buf.set(3, Some("d")).unwrap_err();
        assert!(matches!(err, Error::DictionaryOverflow { format: IntFormat::U2, max_value: 3 }));
    }

    #[test]
    fn set_try_returns_false_instead_of_failing_on_overflow() {
        let buf = CategoricalBuffer::new_fixed(IntFormat::U2, 4);
        assert!(buf.set_try(0, Some("a")));
        assert!(buf.set_try(1, Some("b")));
        assert!(buf.set_try(2, Some("c")));
        assert!(!buf.set_try(3, Some("d")));
        match buf.freeze() {
            Column::Categorical(c) => assert_eq!(c.dictionary().len(), 3),
            _ => panic!("expected categorical column"),
        }
    }

    #[test]
    fn missing_value_maps_to_index_zero() {
        let buf = CategoricalBuffer::new_fixed(IntFormat::U8, 2);
        buf.set(0, None).unwrap();
        buf.set(1, Some("x")).unwrap();
        match buf.freeze() {
            Column::Categorical(c) => {
                let mut dst = [0.0; 2];
                c.fill_f64(&mut dst, 0);
                assert!(dst[0].is_nan());
                assert_eq!(dst[1], 1.0);
            }
            _ => panic!("expected categorical column"),
        }
    }

    #[test]
    fn growing_u4_buffer_pushes_past_first_byte_boundary() {
        let buf = CategoricalBuffer::new_growing(IntFormat::U4);
        for i in 0..5 {
            buf.push(Some(&format!("v{i}"))).unwrap();
        }
        match buf.freeze() {
            Column::Categorical(c) => {
                let mut dst = [0i32; 5];
                c.fill_category(&mut dst, 0);
                assert_eq!(dst, [1, 2, 3, 4, 5]);
            }
            _ => panic!("expected categorical column"),
        }
    }

    #[test]
    fn freeze_boolean_marks_positive_index() {
        let buf = CategoricalBuffer::new_fixed(IntFormat::U8, 2);
        buf.set(0, Some("yes")).unwrap();
        buf.set(1, Some("no")).unwrap();
        let column = buf.freeze_boolean("yes").unwrap();
        assert!(column.has_capability(crate::column::CapabilitySet::BOOLEAN));
    }

    #[test]
    fn frozen_buffer_rejects_further_writes() {
        let buf = CategoricalBuffer::new_fixed(IntFormat::U8, 1);
        buf.freeze();
        assert!(matches!(buf.set(0, Some("x")), Err(Error::BufferFrozen)));
    }
}
