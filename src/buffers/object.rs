//! Object buffer: a growable or fixed-length array of type-erased
//! references, optionally carrying a total-order comparator so the frozen
//! column supports sorting.

use std::any::Any;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use crate::column::{Column, ColumnType, ObjectColumn, ObjectRef};
use crate::error::Error;

type Comparator = Arc<dyn Fn(&ObjectRef, &ObjectRef) -> Ordering + Send + Sync>;

enum Storage {
    Fixed(Vec<Option<ObjectRef>>),
    Growing(Vec<Option<ObjectRef>>),
}

impl Storage {
    fn len(&self) -> usize {
        match self {
            Storage::Fixed(v) | Storage::Growing(v) => v.len(),
        }
    }
}

struct Inner {
    storage: Storage,
    frozen: bool,
}

/// A buffer of type-erased object references.
pub struct ObjectBuffer {
    inner: Mutex<Inner>,
    column_type: ColumnType,
    comparator: Option<Comparator>,
}

impl ObjectBuffer {
    pub fn new_fixed(capacity: usize, column_type: ColumnType, comparator: Option<Comparator>) -> Self {
        ObjectBuffer {
            inner: Mutex::new(Inner {
                storage: Storage::Fixed(vec![None; capacity]),
                frozen: false,
            }),
            column_type,
            comparator,
        }
    }

    pub fn new_growing(column_type: ColumnType, comparator: Option<Comparator>) -> Self {
        ObjectBuffer {
            inner: Mutex::new(Inner {
                storage: Storage::Growing(Vec::new()),
                frozen: false,
            }),
            column_type,
            comparator,
        }
    }

    pub fn set(&self, row: usize, value: Option<Arc<dyn Any + Send + Sync>>) -> Result<(), Error> {
        let mut inner = self.inner.lock().expect("object buffer lock poisoned");
        if inner.frozen {
            return Err(Error::BufferFrozen);
        }
        match &mut inner.storage {
            Storage::Fixed(v) => {
                if row >= v.len() {
                    return Err(Error::out_of_range(format!(
                        "row {row} is out of range for a buffer of length {}",
                        v.len()
                    )));
                }
                v[row] = value;
                Ok(())
            }
            Storage::Growing(_) => Err(Error::unsupported_operation(
                "cannot random-access write a growing object buffer",
            )),
        }
    }

    pub fn push(&self, value: Option<Arc<dyn Any + Send + Sync>>) -> Result<usize, Error> {
        let mut inner = self.inner.lock().expect("object buffer lock poisoned");
        if inner.frozen {
            return Err(Error::BufferFrozen);
        }
        match &mut inner.storage {
            Storage::Growing(v) => {
                v.push(value);
                Ok(v.len() - 1)
            }
            Storage::Fixed(_) => Err(Error::unsupported_operation(
                "cannot push onto a fixed-length object buffer",
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("object buffer lock poisoned").storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn freeze(&self) -> Column {
        let mut inner = self.inner.lock().expect("object buffer lock poisoned");
        inner.frozen = true;
        let values = match &inner.storage {
            Storage::Fixed(v) | Storage::Growing(v) => v.clone(),
        };
        Column::Object(ObjectColumn::new(values, self.column_type.clone(), self.comparator.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_buffer_freezes_set_values() {
        let buf = ObjectBuffer::new_fixed(2, ColumnType::custom("tag", "str"), None);
        buf.set(0, Some(Arc::new("hello".to_string()) as ObjectRef)).unwrap();
        let column = buf.freeze();
        let mut dst: [Option<ObjectRef>; 2] = [None, None];
        column.fill_object(&mut dst, 0);
        assert_eq!(dst[0].as_ref().unwrap().downcast_ref::<String>().unwrap(), "hello");
        assert!(dst[1].is_none());
    }

    #[test]
    fn frozen_buffer_rejects_further_writes() {
        let buf = ObjectBuffer::new_fixed(1, ColumnType::custom("tag", "str"), None);
        buf.freeze();
        assert!(matches!(buf.set(0, None), Err(Error::BufferFrozen)));
    }
}
