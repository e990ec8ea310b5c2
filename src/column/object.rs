//! The object column variant: a dense array of type-erased references with
//! an optional total-order comparator.
//!
//! There is no mapped-view counterpart for object columns in the physical
//! variant inventory (spec §3 lists one for every other category); `map`
//! always densifies here. See DESIGN.md.

use std::any::Any;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::Error;

use super::{CapabilitySet, ColumnType, SortOrder};

/// Type-erased handle to an object column element. `None` represents a
/// missing/null entry.
pub type ObjectRef = Arc<dyn Any + Send + Sync>;

type Comparator = Arc<dyn Fn(&ObjectRef, &ObjectRef) -> Ordering + Send + Sync>;

#[derive(Clone)]
pub struct ObjectColumn {
    values: Arc<[Option<ObjectRef>]>,
    column_type: ColumnType,
    comparator: Option<Comparator>,
}

impl std::fmt::Debug for ObjectColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectColumn")
            .field("size", &self.values.len())
            .field("column_type", &self.column_type)
            .field("sortable", &self.comparator.is_some())
            .finish()
    }
}

impl ObjectColumn {
    pub fn new(values: Vec<Option<ObjectRef>>, column_type: ColumnType, comparator: Option<Comparator>) -> Self {
        ObjectColumn {
            values: Arc::from(values.into_boxed_slice()),
            column_type,
            comparator,
        }
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type.clone()
    }

    pub fn capabilities(&self) -> CapabilitySet {
        if self.comparator.is_some() {
            CapabilitySet::OBJECT_READABLE | CapabilitySet::SORTABLE
        } else {
            CapabilitySet::OBJECT_READABLE
        }
    }

    pub fn fill_object(&self, dst: &mut [Option<ObjectRef>], row_start: usize) -> usize {
        let count = dst.len().min(self.values.len().saturating_sub(row_start));
        for i in 0..count {
            dst[i] = self.values[row_start + i].clone();
        }
        count
    }

    /// Object columns have no mapped-view representation; `map` always
    /// produces a dense copy regardless of `prefer_view`.
    pub fn map_dense(&self, permutation: &[u32]) -> ObjectColumn {
        let copied: Vec<Option<ObjectRef>> = permutation
            .iter()
            .map(|&p| {
                if crate::mapping::is_in_range(p, self.values.len()) {
                    self.values[p as usize].clone()
                } else {
                    None
                }
            })
            .collect();
        ObjectColumn::new(copied, self.column_type.clone(), self.comparator.clone())
    }

    pub fn sort(&self, order: SortOrder) -> Result<Vec<u32>, Error> {
        if self.comparator.is_none() {
            return Err(Error::unsupported_operation(
                "object column has no comparator and cannot be sorted",
            ));
        }
        let ascending = order == SortOrder::Ascending;
        Ok(crate::sort::sort_by(self.values.len(), |a, b| {
            self.compare_rows(a, b, ascending).expect("comparator presence already checked")
        }))
    }

    /// Orders rows `a` and `b` by this column's comparator, missing entries
    /// last regardless of `ascending`. Used both by [`Self::sort`] and by
    /// the multi-column table sort when this column is a secondary key.
    pub(crate) fn compare_rows(&self, a: usize, b: usize, ascending: bool) -> Result<Ordering, Error> {
        let comparator = self.comparator.as_ref().ok_or_else(|| {
            Error::unsupported_operation("object column has no comparator and cannot be sorted")
        })?;
        let cmp = match (&self.values[a], &self.values[b]) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => comparator(x, y),
        };
        Ok(if ascending || self.values[a].is_none() || self.values[b].is_none() {
            cmp
        } else {
            cmp.reverse()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i32]) -> ObjectColumn {
        let comparator: Comparator = Arc::new(|a, b| {
            a.downcast_ref::<i32>().unwrap().cmp(b.downcast_ref::<i32>().unwrap())
        });
        let wrapped = values
            .iter()
            .map(|&v| Some(Arc::new(v) as ObjectRef))
            .collect();
        ObjectColumn::new(wrapped, ColumnType::custom("ints", "i32"), Some(comparator))
    }

    #[test]
    fn fill_object_clones_references() {
        let col = ints(&[1, 2, 3]);
        let mut dst: [Option<ObjectRef>; 3] = [None, None, None];
        col.fill_object(&mut dst, 0);
        assert_eq!(*dst[1].as_ref().unwrap().downcast_ref::<i32>().unwrap(), 2);
    }

    #[test]
    fn sort_without_comparator_is_unsupported() {
        let col = ObjectColumn::new(vec![None], ColumnType::custom("x", "i32"), None);
        assert!(col.sort(SortOrder::Ascending).is_err());
    }

    #[test]
    fn sort_with_comparator_orders_values_missing_last() {
        let mut values: Vec<Option<ObjectRef>> = vec![Some(Arc::new(3) as ObjectRef), None, Some(Arc::new(1) as ObjectRef)];
        let comparator: Comparator = Arc::new(|a, b| {
            a.downcast_ref::<i32>().unwrap().cmp(b.downcast_ref::<i32>().unwrap())
        });
        let col = ObjectColumn::new(std::mem::take(&mut values), ColumnType::custom("x", "i32"), Some(comparator));
        let perm = col.sort(SortOrder::Ascending).unwrap();
        assert_eq!(perm, vec![2, 0, 1]);
    }

    #[test]
    fn map_dense_substitutes_missing_for_out_of_range() {
        let col = ints(&[10, 20]);
        let mapped = col.map_dense(&[1, crate::mapping::OUT_OF_RANGE]);
        let mut dst: [Option<ObjectRef>; 2] = [None, None];
        mapped.fill_object(&mut dst, 0);
        assert_eq!(*dst[0].as_ref().unwrap().downcast_ref::<i32>().unwrap(), 20);
        assert!(dst[1].is_none());
    }
}
