//! Indirect stable sort.
//!
//! Returns index permutations rather than reordering values in place, so a
//! single sort can drive [`crate::column::Column::map`] without ever
//! touching the original storage. The algorithm is a classic merge sort over
//! the index array, falling back to insertion sort below a small run
//! length; both passes are stable, which downstream code (multi-column
//! table sort, percentile interpolation) depends on.

use std::cmp::Ordering;

/// Below this run length, [`sort_by`] finishes with insertion sort instead
/// of recursing further. Insertion sort has lower constant overhead and is
/// already near-linear on the short, often nearly-sorted runs merge sort
/// bottoms out into.
const INSERTION_SORT_THRESHOLD: usize = 16;

/// Produces a stable index permutation `p` such that `cmp(p[i], p[i+1])` is
/// never [`Ordering::Greater`] for all `i`. `cmp` receives the *original*
/// indices being compared, not positions in the output.
pub fn sort_by(len: usize, cmp: impl Fn(usize, usize) -> Ordering) -> Vec<u32> {
    let mut indices: Vec<u32> = (0..len as u32).collect();
    if len > 1 {
        let mut scratch = indices.clone();
        merge_sort(&mut indices, &mut scratch, 0, len, &cmp);
    }
    indices
}

fn merge_sort(a: &mut [u32], buf: &mut [u32], lo: usize, hi: usize, cmp: &impl Fn(usize, usize) -> Ordering) {
    let len = hi - lo;
    if len <= INSERTION_SORT_THRESHOLD {
        insertion_sort(&mut a[lo..hi], cmp);
        return;
    }
    let mid = lo + len / 2;
    merge_sort(a, buf, lo, mid, cmp);
    merge_sort(a, buf, mid, hi, cmp);
    merge(a, buf, lo, mid, hi, cmp);
}

fn insertion_sort(slice: &mut [u32], cmp: &impl Fn(usize, usize) -> Ordering) {
    for i in 1..slice.len() {
        let key = slice[i];
        let mut j = i;
        while j > 0 && cmp(key as usize, slice[j - 1] as usize) == Ordering::Less {
            slice[j] = slice[j - 1];
            j -= 1;
        }
        slice[j] = key;
    }
}

fn merge(
    a: &mut [u32],
    buf: &mut [u32],
    lo: usize,
    mid: usize,
    hi: usize,
    cmp: &impl Fn(usize, usize) -> Ordering,
) {
    buf[lo..hi].copy_from_slice(&a[lo..hi]);
    let (mut i, mut j, mut k) = (lo, mid, lo);
    while i < mid && j < hi {
        // `!= Greater` (rather than `== Less`) keeps the merge stable: on a
        // tie the left run (earlier original index) wins.
        if cmp(buf[i] as usize, buf[j] as usize) != Ordering::Greater {
            a[k] = buf[i];
            i += 1;
        } else {
            a[k] = buf[j];
            j += 1;
        }
        k += 1;
    }
    a[k..k + (mid - i)].copy_from_slice(&buf[i..mid]);
    k += mid - i;
    a[k..hi].copy_from_slice(&buf[j..hi]);
}

/// Ordering for a numeric key under the column model's missing-value
/// convention: all NaNs compare equal to each other and greater than every
/// finite/infinite value, in both ascending and descending order, so NaNs
/// always end up last.
fn f64_key_cmp(x: f64, y: f64, ascending: bool) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let natural = x.partial_cmp(&y).expect("non-NaN floats are totally ordered");
            if ascending {
                natural
            } else {
                natural.reverse()
            }
        }
    }
}

/// Stable indirect sort over `values`, treating `NaN` as missing: missing
/// entries are pushed to the end regardless of `ascending`.
pub fn sort_f64(values: &[f64], ascending: bool) -> Vec<u32> {
    sort_by(values.len(), |a, b| f64_key_cmp(values[a], values[b], ascending))
}

/// Ordering for an integer key with a designated missing sentinel: missing
/// entries compare equal to each other and greater than every other value,
/// in both ascending and descending order.
fn i64_key_cmp(x: i64, y: i64, ascending: bool, is_missing: &impl Fn(i64) -> bool) -> Ordering {
    match (is_missing(x), is_missing(y)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let natural = x.cmp(&y);
            if ascending {
                natural
            } else {
                natural.reverse()
            }
        }
    }
}

/// Stable indirect sort over `values`, treating entries for which
/// `is_missing` returns `true` as missing: those entries are pushed to the
/// end regardless of `ascending`.
pub fn sort_i64(values: &[i64], ascending: bool, is_missing: impl Fn(i64) -> bool) -> Vec<u32> {
    sort_by(values.len(), |a, b| {
        i64_key_cmp(values[a], values[b], ascending, &is_missing)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_by_is_stable_on_equal_keys() {
        // Keys: [1, 1, 0]; a stable ascending sort keeps the two 1s in
        // their original relative order.
        let keys = [1, 1, 0];
        let perm = sort_by(keys.len(), |a, b| keys[a].cmp(&keys[b]));
        assert_eq!(perm, vec![2, 0, 1]);
    }

    #[test]
    fn sort_f64_pushes_nan_last_ascending_and_descending() {
        let values = [3.0, f64::NAN, 1.0, f64::NAN, 2.0];
        let asc = sort_f64(&values, true);
        assert_eq!(asc, vec![2, 4, 0, 1, 3]);
        let desc = sort_f64(&values, false);
        assert_eq!(desc, vec![0, 4, 2, 1, 3]);
    }

    #[test]
    fn sort_i64_respects_missing_sentinel() {
        let values = [5i64, i64::MIN, 1, i64::MIN, 3];
        let perm = sort_i64(&values, true, |v| v == i64::MIN);
        assert_eq!(perm, vec![2, 4, 0, 1, 3]);
    }

    #[test]
    fn sort_by_handles_runs_larger_than_insertion_threshold() {
        let n = 200;
        let values: Vec<i64> = (0..n).rev().collect();
        let perm = sort_by(values.len(), |a, b| values[a].cmp(&values[b]));
        let sorted: Vec<i64> = perm.iter().map(|&i| values[i as usize]).collect();
        let mut expected = values.clone();
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn sort_by_empty_and_singleton() {
        assert!(sort_by(0, |_, _| Ordering::Equal).is_empty());
        assert_eq!(sort_by(1, |_, _| Ordering::Equal), vec![0]);
    }
}
