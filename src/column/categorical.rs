//! Categorical column variants: a dense array of category indices plus a
//! shared dictionary, in one of five index widths (spec §4.1/§4.3).
//!
//! The dictionary's value domain is specialized to `String` here rather
//! than kept fully generic; see DESIGN.md for why.

use std::sync::Arc;

use crate::packed::{self, IntFormat};

use super::{prefer_mapped_view, shared_slice, CapabilitySet, Column, ColumnType, ObjectRef};

/// Append-only index-to-value table shared by every frozen categorical
/// column built from the same buffer. Index `0` always denotes the missing
/// / null category and has no entry in `values`.
#[derive(Debug)]
pub struct Dictionary {
    /// `values[i]` is the value for category index `i + 1`.
    pub values: Vec<String>,
}

impl Dictionary {
    pub fn get(&self, index: u32) -> Option<&str> {
        if index == 0 {
            None
        } else {
            self.values.get(index as usize - 1).map(String::as_str)
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Packed dense category indices, in one of the five supported widths.
#[derive(Debug, Clone)]
pub enum IndexStorage {
    U2(Arc<[u8]>, usize),
    U4(Arc<[u8]>, usize),
    U8(Arc<[u8]>),
    U16(Arc<[u16]>),
    I32(Arc<[i32]>),
}

impl IndexStorage {
    pub fn len(&self) -> usize {
        match self {
            IndexStorage::U2(_, n) | IndexStorage::U4(_, n) => *n,
            IndexStorage::U8(v) => v.len(),
            IndexStorage::U16(v) => v.len(),
            IndexStorage::I32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format(&self) -> IntFormat {
        match self {
            IndexStorage::U2(..) => IntFormat::U2,
            IndexStorage::U4(..) => IntFormat::U4,
            IndexStorage::U8(_) => IntFormat::U8,
            IndexStorage::U16(_) => IntFormat::U16,
            IndexStorage::I32(_) => IntFormat::I32,
        }
    }

    /// Category index at row `i`, as a non-negative `u32`.
    pub fn get(&self, i: usize) -> u32 {
        match self {
            IndexStorage::U2(bytes, _) => packed::read_u2(bytes, i) as u32,
            IndexStorage::U4(bytes, _) => packed::read_u4(bytes, i) as u32,
            IndexStorage::U8(v) => v[i] as u32,
            IndexStorage::U16(v) => v[i] as u32,
            IndexStorage::I32(v) => v[i] as u32,
        }
    }
}

/// A dense categorical column: packed indices plus a shared dictionary.
#[derive(Debug, Clone)]
pub struct CategoricalColumn {
    indices: IndexStorage,
    dictionary: Arc<Dictionary>,
    /// When set, this column also exposes the `boolean` capability: the
    /// given index is treated as "true", all other non-missing indices as
    /// "false".
    positive_index: Option<u32>,
}

impl CategoricalColumn {
    pub fn new(indices: IndexStorage, dictionary: Arc<Dictionary>, positive_index: Option<u32>) -> Self {
        CategoricalColumn {
            indices,
            dictionary,
            positive_index,
        }
    }

    pub fn size(&self) -> usize {
        self.indices.len()
    }

    pub fn column_type(&self) -> ColumnType {
        ColumnType::nominal()
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    pub fn capabilities(&self) -> CapabilitySet {
        let base = CapabilitySet::NUMERIC_READABLE | CapabilitySet::OBJECT_READABLE | CapabilitySet::SORTABLE;
        if self.positive_index.is_some() {
            base | CapabilitySet::BOOLEAN
        } else {
            base
        }
    }

    /// Category index == 0 becomes `NaN`; otherwise the index itself as a
    /// double (not the dictionary value).
    pub fn fill_f64(&self, dst: &mut [f64], row_start: usize) -> usize {
        let count = dst.len().min(self.indices.len().saturating_sub(row_start));
        for i in 0..count {
            let idx = self.indices.get(row_start + i);
            dst[i] = if idx == 0 { f64::NAN } else { idx as f64 };
        }
        count
    }

    pub fn fill_category(&self, dst: &mut [i32], row_start: usize) -> usize {
        let count = dst.len().min(self.indices.len().saturating_sub(row_start));
        for i in 0..count {
            dst[i] = self.indices.get(row_start + i) as i32;
        }
        count
    }

    pub fn fill_object(&self, dst: &mut [Option<ObjectRef>], row_start: usize) -> usize {
        let count = dst.len().min(self.indices.len().saturating_sub(row_start));
        for i in 0..count {
            let idx = self.indices.get(row_start + i);
            dst[i] = self
                .dictionary
                .get(idx)
                .map(|v| Arc::new(v.to_owned()) as ObjectRef);
        }
        count
    }

    pub fn map(&self, permutation: &[u32], prefer_view: bool) -> Column {
        if prefer_mapped_view(prefer_view, permutation.len(), self.indices.len()) {
            Column::MappedCategorical(MappedCategoricalColumn {
                indices: self.indices.clone(),
                dictionary: Arc::clone(&self.dictionary),
                positive_index: self.positive_index,
                perm: shared_slice(permutation),
            })
        } else {
            let copied = densify(&self.indices, permutation);
            Column::Categorical(CategoricalColumn::new(copied, Arc::clone(&self.dictionary), self.positive_index))
        }
    }
}

/// A categorical column viewed through a row permutation over shared
/// indices and dictionary.
#[derive(Debug, Clone)]
pub struct MappedCategoricalColumn {
    indices: IndexStorage,
    dictionary: Arc<Dictionary>,
    positive_index: Option<u32>,
    perm: Arc<[u32]>,
}

impl MappedCategoricalColumn {
    pub fn size(&self) -> usize {
        self.perm.len()
    }

    pub fn column_type(&self) -> ColumnType {
        ColumnType::nominal()
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    pub fn capabilities(&self) -> CapabilitySet {
        let base = CapabilitySet::NUMERIC_READABLE | CapabilitySet::OBJECT_READABLE | CapabilitySet::SORTABLE;
        if self.positive_index.is_some() {
            base | CapabilitySet::BOOLEAN
        } else {
            base
        }
    }

    fn resolved_index(&self, row: usize) -> u32 {
        let p = self.perm[row];
        if crate::mapping::is_in_range(p, self.indices.len()) {
            self.indices.get(p as usize)
        } else {
            0
        }
    }

    pub fn fill_f64(&self, dst: &mut [f64], row_start: usize) -> usize {
        let count = dst.len().min(self.perm.len().saturating_sub(row_start));
        for i in 0..count {
            let idx = self.resolved_index(row_start + i);
            dst[i] = if idx == 0 { f64::NAN } else { idx as f64 };
        }
        count
    }

    pub fn fill_category(&self, dst: &mut [i32], row_start: usize) -> usize {
        let count = dst.len().min(self.perm.len().saturating_sub(row_start));
        for i in 0..count {
            dst[i] = self.resolved_index(row_start + i) as i32;
        }
        count
    }

    pub fn fill_object(&self, dst: &mut [Option<ObjectRef>], row_start: usize) -> usize {
        let count = dst.len().min(self.perm.len().saturating_sub(row_start));
        for i in 0..count {
            let idx = self.resolved_index(row_start + i);
            dst[i] = self
                .dictionary
                .get(idx)
                .map(|v| Arc::new(v.to_owned()) as ObjectRef);
        }
        count
    }

    pub fn map(&self, permutation: &[u32], prefer_view: bool) -> Column {
        let merged = super::compose_permutations(&self.perm, permutation);
        if prefer_mapped_view(prefer_view, merged.len(), self.indices.len()) {
            Column::MappedCategorical(MappedCategoricalColumn {
                indices: self.indices.clone(),
                dictionary: Arc::clone(&self.dictionary),
                positive_index: self.positive_index,
                perm: shared_slice(&merged),
            })
        } else {
            let copied = densify(&self.indices, &merged);
            Column::Categorical(CategoricalColumn::new(copied, Arc::clone(&self.dictionary), self.positive_index))
        }
    }
}

fn densify(indices: &IndexStorage, perm: &[u32]) -> IndexStorage {
    let resolved: Vec<u32> = perm
        .iter()
        .map(|&p| {
            if crate::mapping::is_in_range(p, indices.len()) {
                indices.get(p as usize)
            } else {
                0
            }
        })
        .collect();
    match indices.format() {
        IntFormat::U2 => {
            let n = resolved.len();
            let mut bytes = vec![0u8; IntFormat::U2.bytes_per_n_elements(n)];
            for (i, &v) in resolved.iter().enumerate() {
                packed::write_u2(&mut bytes, i, v as u8).expect("densified U2 index in range");
            }
            IndexStorage::U2(Arc::from(bytes.into_boxed_slice()), n)
        }
        IntFormat::U4 => {
            let n = resolved.len();
            let mut bytes = vec![0u8; IntFormat::U4.bytes_per_n_elements(n)];
            for (i, &v) in resolved.iter().enumerate() {
                packed::write_u4(&mut bytes, i, v as u8).expect("densified U4 index in range");
            }
            IndexStorage::U4(Arc::from(bytes.into_boxed_slice()), n)
        }
        IntFormat::U8 => IndexStorage::U8(Arc::from(
            resolved.iter().map(|&v| v as u8).collect::<Vec<_>>().into_boxed_slice(),
        )),
        IntFormat::U16 => IndexStorage::U16(Arc::from(
            resolved.iter().map(|&v| v as u16).collect::<Vec<_>>().into_boxed_slice(),
        )),
        IntFormat::I32 => IndexStorage::I32(Arc::from(
            resolved.iter().map(|&v| v as i32).collect::<Vec<_>>().into_boxed_slice(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(values: &[&str]) -> Arc<Dictionary> {
        Arc::new(Dictionary {
            values: values.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn dictionary_index_zero_is_missing() {
        let d = dict(&["a", "b"]);
        assert_eq!(d.get(0), None);
        assert_eq!(d.get(1), Some("a"));
        assert_eq!(d.get(2), Some("b"));
    }

    #[test]
    fn fill_f64_encodes_index_not_dictionary_value() {
        let col = CategoricalColumn::new(IndexStorage::U8(Arc::from(vec![0u8, 1, 2].into_boxed_slice())), dict(&["a", "b"]), None);
        let mut dst = [0.0; 3];
        col.fill_f64(&mut dst, 0);
        assert!(dst[0].is_nan());
        assert_eq!(dst[1], 1.0);
        assert_eq!(dst[2], 2.0);
    }

    #[test]
    fn fill_object_resolves_dictionary_values() {
        let col = CategoricalColumn::new(IndexStorage::U8(Arc::from(vec![0u8, 1, 2].into_boxed_slice())), dict(&["a", "b"]), None);
        let mut dst: [Option<ObjectRef>; 3] = [None, None, None];
        col.fill_object(&mut dst, 0);
        assert!(dst[0].is_none());
        assert_eq!(dst[1].as_ref().unwrap().downcast_ref::<String>().unwrap(), "a");
        assert_eq!(dst[2].as_ref().unwrap().downcast_ref::<String>().unwrap(), "b");
    }

    #[test]
    fn mapped_out_of_range_resolves_to_missing_index() {
        let indices = IndexStorage::U8(Arc::from(vec![1u8, 2].into_boxed_slice()));
        let mapped = MappedCategoricalColumn {
            indices,
            dictionary: dict(&["a", "b"]),
            positive_index: None,
            perm: Arc::from(vec![0u32, crate::mapping::OUT_OF_RANGE].into_boxed_slice()),
        };
        let mut dst = [0i32; 2];
        mapped.fill_category(&mut dst, 0);
        assert_eq!(dst, [1, 0]);
    }

    #[test]
    fn boolean_capability_present_only_with_positive_index() {
        let col = CategoricalColumn::new(IndexStorage::U8(Arc::from(vec![1u8].into_boxed_slice())), dict(&["yes", "no"]), Some(1));
        assert!(col.capabilities().contains(CapabilitySet::BOOLEAN));
        let col2 = CategoricalColumn::new(IndexStorage::U8(Arc::from(vec![1u8].into_boxed_slice())), dict(&["yes", "no"]), None);
        assert!(!col2.capabilities().contains(CapabilitySet::BOOLEAN));
    }

    #[test]
    fn densify_round_trips_through_u2_packing() {
        let indices = IndexStorage::U2(Arc::from(vec![0b00_01_10_11u8].into_boxed_slice()), 4);
        // indices are [3, 2, 1, 0] reading MSB-first per packed.rs convention
        let perm: Vec<u32> = vec![3, 2, 1, 0];
        let out = densify(&indices, &perm);
        let resolved: Vec<u32> = (0..4).map(|i| out.get(i)).collect();
        assert_eq!(resolved, vec![0, 1, 2, 3]);
    }
}
