//! Mapping (permutation) utilities shared by every column variant that can
//! be viewed or copied through an index permutation.
//!
//! A permutation is a plain `&[u32]`. Entry `i` gives the source position
//! row `i` of the mapped view should read from. Entries that fall outside
//! `[0, source.len())` are *not* errors: spec.md requires they decode as the
//! column's own missing marker. [`OUT_OF_RANGE`] is the canonical value this
//! module normalizes such entries to when composing permutations, so that
//! composed out-of-range-ness survives further composition without having
//! to track the original offending value.

/// Sentinel written into a composed permutation wherever the source entry
/// was out of range. Any `idx` with `idx as usize >= len` is already
/// out-of-range for a target of length `len`, so this is just a fixed,
/// always-out-of-range choice; the exact value carries no other meaning.
pub const OUT_OF_RANGE: u32 = u32::MAX;

/// `true` if `idx` is a valid position into a sequence of length `len`.
pub fn is_in_range(idx: u32, len: usize) -> bool {
    (idx as usize) < len
}

/// Produces a dense copy of `src` reordered (and possibly resized) by
/// `perm`. `perm[i]` out of range against `src.len()` writes `missing`
/// into position `i` instead of indexing `src`.
pub fn compact<T: Clone>(src: &[T], perm: &[u32], missing: &T) -> Vec<T> {
    perm.iter()
        .map(|&p| {
            if is_in_range(p, src.len()) {
                src[p as usize].clone()
            } else {
                missing.clone()
            }
        })
        .collect()
}

/// Composes two permutations so that `compose(inner, outer)[i] ==
/// inner[outer[i]]` whenever `outer[i]` is in range for `inner`, and
/// [`OUT_OF_RANGE`] otherwise. Used when mapping an already-mapped column:
/// the new view's permutation is `compose(existing_perm, new_perm)`,
/// collapsing two levels of indirection into one.
pub fn compose(inner: &[u32], outer: &[u32]) -> Vec<u32> {
    outer
        .iter()
        .map(|&o| {
            if is_in_range(o, inner.len()) {
                inner[o as usize]
            } else {
                OUT_OF_RANGE
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_copies_in_range_entries_and_substitutes_missing() {
        let src = ["a", "b", "c"];
        let perm = [2u32, OUT_OF_RANGE, 0, 5];
        let out = compact(&src, &perm, &"?");
        assert_eq!(out, vec!["c", "?", "a", "?"]);
    }

    #[test]
    fn compose_chains_two_permutations() {
        // inner: identity reverse of 3 elements
        let inner = [2u32, 1, 0];
        // outer: picks position 1 then 2 then an out-of-range index
        let outer = [1u32, 2, 9];
        let merged = compose(&inner, &outer);
        assert_eq!(merged, vec![1, 0, OUT_OF_RANGE]);
    }

    #[test]
    fn compose_propagates_out_of_range_without_inventing_valid_indices() {
        let inner = [0u32, 1];
        let outer = [OUT_OF_RANGE, 0];
        let merged = compose(&inner, &outer);
        assert_eq!(merged, vec![OUT_OF_RANGE, 0]);
    }

    #[test]
    fn is_in_range_boundary() {
        assert!(is_in_range(4, 5));
        assert!(!is_in_range(5, 5));
    }
}
