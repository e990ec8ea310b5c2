//! Dense and mapped numeric column variants. Used for both `Real` and
//! `Integer` column types: both store `f64`, with `Integer` only
//! constraining the values buffers are allowed to write (round-half-to-even
//! at the buffer layer, not here).

use std::sync::Arc;

use super::{prefer_mapped_view, shared_slice, Column, ColumnType};

/// A dense array of `f64`, one entry per row. `NaN` marks a missing value.
#[derive(Debug, Clone)]
pub struct DenseNumericColumn {
    data: Arc<[f64]>,
    column_type: ColumnType,
}

impl DenseNumericColumn {
    pub fn new(data: impl Into<Arc<[f64]>>, column_type: ColumnType) -> Self {
        DenseNumericColumn {
            data: data.into(),
            column_type,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type.clone()
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn fill_f64(&self, dst: &mut [f64], row_start: usize) -> usize {
        let count = dst.len().min(self.data.len().saturating_sub(row_start));
        dst[..count].copy_from_slice(&self.data[row_start..row_start + count]);
        count
    }

    pub fn map(&self, permutation: &[u32], prefer_view: bool) -> Column {
        if prefer_mapped_view(prefer_view, permutation.len(), self.data.len()) {
            Column::MappedNumeric(MappedNumericColumn {
                underlying: Arc::clone(&self.data),
                perm: shared_slice(permutation),
                column_type: self.column_type.clone(),
            })
        } else {
            let copied = crate::mapping::compact(&self.data, permutation, &f64::NAN);
            Column::DenseNumeric(DenseNumericColumn::new(copied, self.column_type.clone()))
        }
    }
}

/// A numeric column viewed through a row permutation over shared storage.
/// Out-of-range permutation entries read as missing (`NaN`).
#[derive(Debug, Clone)]
pub struct MappedNumericColumn {
    underlying: Arc<[f64]>,
    perm: Arc<[u32]>,
    column_type: ColumnType,
}

impl MappedNumericColumn {
    pub fn size(&self) -> usize {
        self.perm.len()
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type.clone()
    }

    pub fn fill_f64(&self, dst: &mut [f64], row_start: usize) -> usize {
        let count = dst.len().min(self.perm.len().saturating_sub(row_start));
        for i in 0..count {
            let p = self.perm[row_start + i];
            dst[i] = if crate::mapping::is_in_range(p, self.underlying.len()) {
                self.underlying[p as usize]
            } else {
                f64::NAN
            };
        }
        count
    }

    pub fn map(&self, permutation: &[u32], prefer_view: bool) -> Column {
        let merged = super::compose_permutations(&self.perm, permutation);
        if prefer_mapped_view(prefer_view, merged.len(), self.underlying.len()) {
            Column::MappedNumeric(MappedNumericColumn {
                underlying: Arc::clone(&self.underlying),
                perm: shared_slice(&merged),
                column_type: self.column_type.clone(),
            })
        } else {
            let copied = crate::mapping::compact(&self.underlying, &merged, &f64::NAN);
            Column::DenseNumeric(DenseNumericColumn::new(copied, self.column_type.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_fill_f64_respects_row_start_and_short_dst() {
        let col = DenseNumericColumn::new(vec![1.0, 2.0, 3.0, 4.0], ColumnType::real());
        let mut dst = [0.0; 2];
        let n = col.fill_f64(&mut dst, 1);
        assert_eq!(n, 2);
        assert_eq!(dst, [2.0, 3.0]);
    }

    #[test]
    fn mapped_fill_f64_writes_nan_for_out_of_range_entries() {
        let mapped = MappedNumericColumn {
            underlying: Arc::from(vec![10.0, 20.0].into_boxed_slice()),
            perm: Arc::from(vec![1u32, crate::mapping::OUT_OF_RANGE, 0].into_boxed_slice()),
            column_type: ColumnType::real(),
        };
        let mut dst = [0.0; 3];
        mapped.fill_f64(&mut dst, 0);
        assert!(dst[1].is_nan());
        assert_eq!(dst[0], 20.0);
        assert_eq!(dst[2], 10.0);
    }

    #[test]
    fn map_on_dense_below_threshold_copies() {
        let col = DenseNumericColumn::new(vec![1.0, 2.0, 3.0, 4.0, 5.0], ColumnType::real());
        // permutation len 1 over underlying size 5 => 1/5 = 0.2 > threshold 0.1,
        // so this actually prefers a view; test the copy branch explicitly
        // with prefer_view forced off and a tiny permutation over a large
        // underlying column instead.
        let big = DenseNumericColumn::new((0..100).map(|i| i as f64).collect::<Vec<_>>(), ColumnType::real());
        match big.map(&[5], false) {
            Column::DenseNumeric(d) => assert_eq!(d.values(), &[5.0]),
            Column::MappedNumeric(_) => panic!("expected dense copy below threshold"),
            _ => unreachable!(),
        }
        let _ = col;
    }

    #[test]
    fn map_composes_existing_permutation() {
        let underlying: Arc<[f64]> = Arc::from(vec![10.0, 20.0, 30.0].into_boxed_slice());
        let first = MappedNumericColumn {
            underlying: Arc::clone(&underlying),
            perm: Arc::from(vec![2u32, 1, 0].into_boxed_slice()),
            column_type: ColumnType::real(),
        };
        match first.map(&[0, 2], true) {
            Column::MappedNumeric(m) => {
                let mut dst = [0.0; 2];
                m.fill_f64(&mut dst, 0);
                assert_eq!(dst, [30.0, 10.0]);
            }
            _ => panic!("expected mapped column"),
        }
    }
}
