//! Date-time (low/high precision) and time-of-day column variants.
//!
//! Low precision date-time stores seconds-since-epoch as `i64`; high
//! precision additionally stores a nanosecond-of-second component. Both
//! share a single mapped variant, [`MappedDateTimeColumn`], since their
//! storage shape (one or two parallel `i64`/`i32` arrays plus a
//! permutation) is identical up to the presence of the nanos array.
//!
//! Time-of-day stores nanoseconds-since-midnight as `i64` and gets its own
//! mapped variant for symmetry with the rest of the contract, even though
//! spec §3's variant inventory only names "Mapped date-time" explicitly;
//! see DESIGN.md.

use std::sync::Arc;

use super::{prefer_mapped_view, shared_slice, Column, ColumnType, ObjectRef, LONG_MAX, LONG_MIN};

/// Underlying storage shared by [`DateTimeColumn`] and
/// [`MappedDateTimeColumn`].
#[derive(Debug, Clone)]
pub enum TemporalStorage {
    LowPrecision(Arc<[i64]>),
    HighPrecision { seconds: Arc<[i64]>, nanos: Arc<[i32]> },
}

impl TemporalStorage {
    pub fn len(&self) -> usize {
        match self {
            TemporalStorage::LowPrecision(s) => s.len(),
            TemporalStorage::HighPrecision { seconds, .. } => seconds.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn seconds_at(&self, i: usize) -> i64 {
        match self {
            TemporalStorage::LowPrecision(s) => s[i],
            TemporalStorage::HighPrecision { seconds, .. } => seconds[i],
        }
    }

    fn nanos_at(&self, i: usize) -> i32 {
        match self {
            TemporalStorage::LowPrecision(_) => 0,
            TemporalStorage::HighPrecision { nanos, .. } => nanos[i],
        }
    }
}

#[derive(Debug, Clone)]
pub struct DateTimeColumn {
    storage: TemporalStorage,
}

impl DateTimeColumn {
    pub fn new(storage: TemporalStorage) -> Self {
        DateTimeColumn { storage }
    }

    pub fn size(&self) -> usize {
        self.storage.len()
    }

    pub fn column_type(&self) -> ColumnType {
        ColumnType::date_time()
    }

    pub fn seconds(&self) -> Vec<i64> {
        (0..self.storage.len()).map(|i| self.storage.seconds_at(i)).collect()
    }

    pub fn fill_f64(&self, dst: &mut [f64], row_start: usize) -> usize {
        let count = dst.len().min(self.storage.len().saturating_sub(row_start));
        for i in 0..count {
            let s = self.storage.seconds_at(row_start + i);
            dst[i] = if s == LONG_MIN { f64::NAN } else { s as f64 };
        }
        count
    }

    pub fn fill_object(&self, dst: &mut [Option<ObjectRef>], row_start: usize) -> usize {
        let count = dst.len().min(self.storage.len().saturating_sub(row_start));
        for i in 0..count {
            let s = self.storage.seconds_at(row_start + i);
            dst[i] = if s == LONG_MIN {
                None
            } else {
                Some(Arc::new((s, self.storage.nanos_at(row_start + i))) as ObjectRef)
            };
        }
        count
    }

    pub fn map(&self, permutation: &[u32], prefer_view: bool) -> Column {
        if prefer_mapped_view(prefer_view, permutation.len(), self.storage.len()) {
            Column::MappedDateTime(MappedDateTimeColumn {
                storage: self.storage.clone(),
                perm: shared_slice(permutation),
            })
        } else {
            let copied = densify(&self.storage, permutation);
            Column::DateTime(DateTimeColumn::new(copied))
        }
    }
}

#[derive(Debug, Clone)]
pub struct MappedDateTimeColumn {
    storage: TemporalStorage,
    perm: Arc<[u32]>,
}

impl MappedDateTimeColumn {
    pub fn size(&self) -> usize {
        self.perm.len()
    }

    pub fn column_type(&self) -> ColumnType {
        ColumnType::date_time()
    }

    pub fn materialize_seconds(&self) -> Vec<i64> {
        self.perm
            .iter()
            .map(|&p| {
                if crate::mapping::is_in_range(p, self.storage.len()) {
                    self.storage.seconds_at(p as usize)
                } else {
                    LONG_MIN
                }
            })
            .collect()
    }

    pub fn fill_f64(&self, dst: &mut [f64], row_start: usize) -> usize {
        let count = dst.len().min(self.perm.len().saturating_sub(row_start));
        for i in 0..count {
            let s = self.resolved_seconds(row_start + i);
            dst[i] = if s == LONG_MIN { f64::NAN } else { s as f64 };
        }
        count
    }

    fn resolved_seconds(&self, row: usize) -> i64 {
        let p = self.perm[row];
        if crate::mapping::is_in_range(p, self.storage.len()) {
            self.storage.seconds_at(p as usize)
        } else {
            LONG_MIN
        }
    }

    pub fn fill_object(&self, dst: &mut [Option<ObjectRef>], row_start: usize) -> usize {
        let count = dst.len().min(self.perm.len().saturating_sub(row_start));
        for i in 0..count {
            let row = row_start + i;
            let p = self.perm[row];
            dst[i] = if crate::mapping::is_in_range(p, self.storage.len()) {
                let s = self.storage.seconds_at(p as usize);
                if s == LONG_MIN {
                    None
                } else {
                    Some(Arc::new((s, self.storage.nanos_at(p as usize))) as ObjectRef)
                }
            } else {
                None
            };
        }
        count
    }

    pub fn map(&self, permutation: &[u32], prefer_view: bool) -> Column {
        let merged = super::compose_permutations(&self.perm, permutation);
        if prefer_mapped_view(prefer_view, merged.len(), self.storage.len()) {
            Column::MappedDateTime(MappedDateTimeColumn {
                storage: self.storage.clone(),
                perm: shared_slice(&merged),
            })
        } else {
            let copied = densify(&self.storage, &merged);
            Column::DateTime(DateTimeColumn::new(copied))
        }
    }
}

fn densify(storage: &TemporalStorage, perm: &[u32]) -> TemporalStorage {
    match storage {
        TemporalStorage::LowPrecision(s) => {
            let out: Vec<i64> = perm
                .iter()
                .map(|&p| {
                    if crate::mapping::is_in_range(p, s.len()) {
                        s[p as usize]
                    } else {
                        LONG_MIN
                    }
                })
                .collect();
            TemporalStorage::LowPrecision(Arc::from(out.into_boxed_slice()))
        }
        TemporalStorage::HighPrecision { seconds, nanos } => {
            let mut out_s = Vec::with_capacity(perm.len());
            let mut out_n = Vec::with_capacity(perm.len());
            for &p in perm {
                if crate::mapping::is_in_range(p, seconds.len()) {
                    out_s.push(seconds[p as usize]);
                    out_n.push(nanos[p as usize]);
                } else {
                    out_s.push(LONG_MIN);
                    out_n.push(0);
                }
            }
            TemporalStorage::HighPrecision {
                seconds: Arc::from(out_s.into_boxed_slice()),
                nanos: Arc::from(out_n.into_boxed_slice()),
            }
        }
    }
}

/// Dense time-of-day column: nanoseconds since midnight, `LONG_MAX` marks
/// missing (chosen so natural integer order already sorts missing last).
#[derive(Debug, Clone)]
pub struct TimeOfDayColumn {
    nanos_of_day: Arc<[i64]>,
}

impl TimeOfDayColumn {
    pub fn new(nanos_of_day: impl Into<Arc<[i64]>>) -> Self {
        TimeOfDayColumn {
            nanos_of_day: nanos_of_day.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.nanos_of_day.len()
    }

    pub fn nanos_of_day(&self) -> &[i64] {
        &self.nanos_of_day
    }

    pub fn fill_f64(&self, dst: &mut [f64], row_start: usize) -> usize {
        let count = dst.len().min(self.nanos_of_day.len().saturating_sub(row_start));
        for i in 0..count {
            let v = self.nanos_of_day[row_start + i];
            dst[i] = if v == LONG_MAX { f64::NAN } else { v as f64 };
        }
        count
    }

    pub fn fill_object(&self, dst: &mut [Option<ObjectRef>], row_start: usize) -> usize {
        let count = dst.len().min(self.nanos_of_day.len().saturating_sub(row_start));
        for i in 0..count {
            let v = self.nanos_of_day[row_start + i];
            dst[i] = if v == LONG_MAX { None } else { Some(Arc::new(v) as ObjectRef) };
        }
        count
    }

    pub fn map(&self, permutation: &[u32], prefer_view: bool) -> Column {
        if prefer_mapped_view(prefer_view, permutation.len(), self.nanos_of_day.len()) {
            Column::MappedTimeOfDay(MappedTimeOfDayColumn {
                nanos_of_day: Arc::clone(&self.nanos_of_day),
                perm: shared_slice(permutation),
            })
        } else {
            let copied = crate::mapping::compact(&self.nanos_of_day, permutation, &LONG_MAX);
            Column::TimeOfDay(TimeOfDayColumn::new(copied))
        }
    }
}

#[derive(Debug, Clone)]
pub struct MappedTimeOfDayColumn {
    nanos_of_day: Arc<[i64]>,
    perm: Arc<[u32]>,
}

impl MappedTimeOfDayColumn {
    pub fn size(&self) -> usize {
        self.perm.len()
    }

    pub fn materialize_nanos_of_day(&self) -> Vec<i64> {
        crate::mapping::compact(&self.nanos_of_day, &self.perm, &LONG_MAX)
    }

    pub fn fill_f64(&self, dst: &mut [f64], row_start: usize) -> usize {
        let count = dst.len().min(self.perm.len().saturating_sub(row_start));
        for i in 0..count {
            let p = self.perm[row_start + i];
            let v = if crate::mapping::is_in_range(p, self.nanos_of_day.len()) {
                self.nanos_of_day[p as usize]
            } else {
                LONG_MAX
            };
            dst[i] = if v == LONG_MAX { f64::NAN } else { v as f64 };
        }
        count
    }

    pub fn fill_object(&self, dst: &mut [Option<ObjectRef>], row_start: usize) -> usize {
        let count = dst.len().min(self.perm.len().saturating_sub(row_start));
        for i in 0..count {
            let p = self.perm[row_start + i];
            let v = if crate::mapping::is_in_range(p, self.nanos_of_day.len()) {
                self.nanos_of_day[p as usize]
            } else {
                LONG_MAX
            };
            dst[i] = if v == LONG_MAX { None } else { Some(Arc::new(v) as ObjectRef) };
        }
        count
    }

    pub fn map(&self, permutation: &[u32], prefer_view: bool) -> Column {
        let merged = super::compose_permutations(&self.perm, permutation);
        if prefer_mapped_view(prefer_view, merged.len(), self.nanos_of_day.len()) {
            Column::MappedTimeOfDay(MappedTimeOfDayColumn {
                nanos_of_day: Arc::clone(&self.nanos_of_day),
                perm: shared_slice(&merged),
            })
        } else {
            let copied = crate::mapping::compact(&self.nanos_of_day, &merged, &LONG_MAX);
            Column::TimeOfDay(TimeOfDayColumn::new(copied))
        }
    }
}
