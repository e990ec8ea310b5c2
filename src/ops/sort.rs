//! Multi-column table sort (spec §4.6): sort by the first column, then
//! recursively re-sort each run of equal keys by the next column. Stable
//! overall — ties that persist through every column preserve original row
//! order.

use crate::column::{CapabilitySet, Column, SortOrder};
use crate::error::Error;

/// Produces a stable permutation sorting `columns` lexicographically:
/// primarily by `columns[0]`, breaking ties with `columns[1]`, and so on.
/// All columns must be the same length and `sortable`.
pub fn multi_column_sort(columns: &[&Column], order: SortOrder) -> Result<Vec<u32>, Error> {
    if columns.is_empty() {
        return Err(Error::invalid_argument("multi-column sort requires at least one column"));
    }
    let n = columns[0].size();
    if columns.iter().any(|c| c.size() != n) {
        return Err(Error::invalid_argument(
            "all columns passed to a multi-column sort must have the same length",
        ));
    }
    let mut perm: Vec<u32> = (0..n as u32).collect();
    sort_run(&mut perm, columns, 0, order)?;
    Ok(perm)
}

fn sort_run(run: &mut [u32], columns: &[&Column], col_index: usize, order: SortOrder) -> Result<(), Error> {
    if col_index >= columns.len() || run.len() <= 1 {
        return Ok(());
    }
    let column = columns[col_index];
    if !column.has_capability(CapabilitySet::SORTABLE) {
        return Err(Error::unsupported_operation(
            "column does not have the sortable capability",
        ));
    }
    let ascending = order == SortOrder::Ascending;

    // Sort the run by position-within-the-run (not absolute row index), so
    // ties keep the relative order left by the previous column's sort.
    let local = crate::sort::sort_by(run.len(), |a, b| {
        column
            .sort_key_cmp(run[a] as usize, run[b] as usize, ascending)
            .expect("sortable capability already checked")
    });
    let reordered: Vec<u32> = local.iter().map(|&i| run[i as usize]).collect();
    run.copy_from_slice(&reordered);

    let mut i = 0;
    while i < run.len() {
        let mut j = i + 1;
        while j < run.len()
            && column
                .sort_key_eq(run[i] as usize, run[j] as usize)
                .expect("sortable capability already checked")
        {
            j += 1;
        }
        if j - i > 1 {
            sort_run(&mut run[i..j], columns, col_index + 1, order)?;
        }
        i = j;
    }
    Ok(())
}
