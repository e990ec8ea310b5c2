//! Associative-reduction combine-tree (spec §4.5/§9).
//!
//! A near-complete binary tree over `n_leaves` batch results, held as a
//! flat array of parent-indexed lock cells rather than pointers. Each
//! parent cell holds up to two pending children; whichever leaf arrives
//! second at a given parent combines immediately and carries the result
//! one level up, so the combiner runs exactly `n_leaves - 1` times
//! regardless of arrival order, and always in the same total order because
//! ties are broken by the lower originating leaf index (spec §5: "the
//! accumulator whose originating leaf-index is lower is the left
//! argument").

use std::sync::Mutex;

fn highest_power_of_two(n: usize) -> usize {
    debug_assert!(n > 0);
    1usize << (usize::BITS - 1 - (n as u32).leading_zeros())
}

/// Maps a 0-based leaf index to its array position in the near-complete
/// tree described in spec §9: the first `2 * (n_leaves - hob)` leaves
/// occupy freshly appended slots in the last row (in pairs, under a parent
/// that itself sits at a perfect-tree leaf position); the rest sit
/// directly at perfect-tree leaf positions.
fn leaf_array_index(leaf_index: usize, hob: usize, split_pairs: usize) -> usize {
    let base = 2 * hob - 1;
    if leaf_index < 2 * split_pairs {
        base + leaf_index
    } else {
        let offset = leaf_index - 2 * split_pairs;
        (hob - 1) + split_pairs + offset
    }
}

/// Combine-tree over `n_leaves` per-batch results of type `T`.
pub struct CombineTree<T> {
    n_leaves: usize,
    hob: usize,
    split_pairs: usize,
    /// `locks[p]` holds the two children of parent position `p`, indexed
    /// by which child (`0` = left, `1` = right) arrived.
    locks: Vec<Mutex<[Option<(usize, T)>; 2]>>,
}

impl<T> CombineTree<T> {
    /// Builds a tree for `n_leaves` batches. `n_leaves` must be at least 1.
    pub fn new(n_leaves: usize) -> Self {
        assert!(n_leaves >= 1, "a combine-tree needs at least one leaf");
        let hob = highest_power_of_two(n_leaves);
        let split_pairs = n_leaves - hob;
        let size = 2 * hob - 1 + 2 * split_pairs;
        let locks = (0..size).map(|_| Mutex::new([None, None])).collect();
        CombineTree {
            n_leaves,
            hob,
            split_pairs,
            locks,
        }
    }

    /// Submits batch `leaf_index`'s result. Returns `Some(final_result)`
    /// exactly once, from whichever call happens to complete the root —
    /// every other call returns `None`. `combiner` is called with the
    /// lower-originating-leaf-index result first.
    pub fn combine(&self, leaf_index: usize, value: T, combiner: &impl Fn(T, T) -> T) -> Option<T> {
        debug_assert!(leaf_index < self.n_leaves);
        let mut idx = leaf_array_index(leaf_index, self.hob, self.split_pairs);
        let mut current = (leaf_index, value);
        loop {
            if idx == 0 {
                return Some(current.1);
            }
            let parent = (idx - 1) / 2;
            let own_slot = if idx % 2 == 1 { 0 } else { 1 };
            let other_slot = 1 - own_slot;
            let mut cell = self.locks[parent].lock().expect("combine-tree lock poisoned");
            if let Some((other_leaf, other_val)) = cell[other_slot].take() {
                drop(cell);
                let (left, right) = if current.0 <= other_leaf {
                    (current, (other_leaf, other_val))
                } else {
                    ((other_leaf, other_val), current)
                };
                current = (left.0.min(right.0), combiner(left.1, right.1));
                idx = parent;
            } else {
                cell[own_slot] = Some(current);
                return None;
            }
        }
    }
}
