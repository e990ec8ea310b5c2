//! Column statistics (spec §4.7): counts/extents, variance, NIST-style
//! percentile interpolation, and categorical mode/least-frequent.

use crate::column::{Column, Dictionary, SortOrder};
use crate::error::Error;
use crate::executor::{ExecutionContext, WorkloadClass};

use super::reduce::reduce;

/// Count, mean, min and max over a numeric-readable column's non-missing
/// values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Copy)]
struct Acc {
    count: usize,
    mean: f64,
    min: f64,
    max: f64,
}

impl Acc {
    fn empty() -> Self {
        Acc {
            count: 0,
            mean: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn singleton(v: f64) -> Self {
        Acc {
            count: 1,
            mean: v,
            min: v,
            max: v,
        }
    }
}

/// `mean_A = w * mean_A + (1 - w) * mean_B`, `w = count_A / (count_A +
/// count_B)` (spec §4.7): the numerically stable weighted-mean combine
/// used both to fold a single row into a running accumulator (as the
/// combine of that accumulator with a one-element singleton) and to merge
/// two batches' accumulators in the combine-tree.
fn combine_acc(a: Acc, b: Acc) -> Acc {
    if a.count == 0 {
        return b;
    }
    if b.count == 0 {
        return a;
    }
    let total = a.count + b.count;
    let w = a.count as f64 / total as f64;
    Acc {
        count: total,
        mean: w * a.mean + (1.0 - w) * b.mean,
        min: a.min.min(b.min),
        max: a.max.max(b.max),
    }
}

/// Counts phase (spec §4.7): per-batch `(count, mean, min, max)` combined
/// by the weighted-mean formula, then a post-pass clamps a mean that
/// numerically drifted outside `[min, max]`. Empty / all-missing columns
/// report `count == 0` and `NaN` for the rest.
pub fn counts(column: &Column, context: &ExecutionContext, workload: WorkloadClass) -> Result<NumericStats, Error> {
    let acc = reduce(
        column,
        context,
        workload,
        || Some(Acc::empty()),
        |acc, v| if v.is_nan() { acc } else { combine_acc(acc, Acc::singleton(v)) },
        combine_acc,
    )?;
    Ok(finalize(acc))
}

fn finalize(acc: Acc) -> NumericStats {
    if acc.count == 0 {
        return NumericStats {
            count: 0,
            mean: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        };
    }
    let mean = if acc.mean < acc.min || acc.mean > acc.max {
        if acc.mean.is_finite() {
            acc.mean.clamp(acc.min, acc.max)
        } else {
            f64::NAN
        }
    } else {
        acc.mean
    };
    NumericStats {
        count: acc.count,
        mean,
        min: acc.min,
        max: acc.max,
    }
}

fn combine_weighted(a: (usize, f64), b: (usize, f64)) -> (usize, f64) {
    if a.0 == 0 {
        return b;
    }
    if b.0 == 0 {
        return a;
    }
    let total = a.0 + b.0;
    let w = a.0 as f64 / total as f64;
    (total, w * a.1 + (1.0 - w) * b.1)
}

/// Population or sample variance (spec §4.7). Runs the counts phase first
/// to get the global mean, then a deviation phase accumulating the
/// weighted mean of squared deviations about it. `NaN` if `count < 2` or
/// the mean is not finite.
pub fn variance(column: &Column, context: &ExecutionContext, workload: WorkloadClass, sample: bool) -> Result<f64, Error> {
    let stats = counts(column, context, workload)?;
    if stats.count < 2 || !stats.mean.is_finite() {
        return Ok(f64::NAN);
    }
    let mean = stats.mean;
    let (n, population_variance) = reduce(
        column,
        context,
        workload,
        || Some((0usize, 0.0)),
        move |acc, v| {
            if v.is_nan() {
                acc
            } else {
                let d = v - mean;
                combine_weighted(acc, (1, d * d))
            }
        },
        combine_weighted,
    )?;
    if n < 2 {
        return Ok(f64::NAN);
    }
    Ok(if sample {
        population_variance * n as f64 / (n as f64 - 1.0)
    } else {
        population_variance
    })
}

/// Sample standard deviation: `sqrt(variance(..., sample=true))`.
pub fn std_dev(column: &Column, context: &ExecutionContext, workload: WorkloadClass) -> Result<f64, Error> {
    Ok(variance(column, context, workload, true)?.sqrt())
}

/// The `p`-th percentile (`p` in `[0, 1]`) via the NIST linear-interpolation
/// convention `rank = p * (n + 1)`, clamped to the endpoints when the rank
/// falls outside `[1, n]` (spec §4.7). Sorts the column ascending first
/// (`map(sort(asc), prefer_view=true)`) then reads it as `f64`.
pub fn percentile(column: &Column, p: f64) -> Result<f64, Error> {
    let n = column.size();
    if n == 0 {
        return Ok(f64::NAN);
    }
    let perm = column.sort(SortOrder::Ascending)?;
    let sorted = column.map(&perm, true);
    let mut values = vec![f64::NAN; n];
    sorted.fill_f64(&mut values, 0);

    let rank = p * (n as f64 + 1.0);
    if rank <= 1.0 {
        return Ok(values[0]);
    }
    if rank >= n as f64 {
        return Ok(values[n - 1]);
    }
    let lower = rank.floor() as usize;
    let fraction = rank - lower as f64;
    let lower_value = values[lower - 1];
    let upper_value = values[lower];
    Ok(lower_value + fraction * (upper_value - lower_value))
}

/// The dictionary's most frequent category, or `None` for an empty
/// dictionary / column. Ties resolve to the smallest category index.
pub fn categorical_mode(column: &Column) -> Result<Option<String>, Error> {
    categorical_extreme(column, true)
}

/// The dictionary's least frequent category, or `None` for an empty
/// dictionary / column. Ties resolve to the smallest category index.
pub fn categorical_least_frequent(column: &Column) -> Result<Option<String>, Error> {
    categorical_extreme(column, false)
}

fn categorical_extreme(column: &Column, most_frequent: bool) -> Result<Option<String>, Error> {
    let dictionary = dictionary_of(column)?;
    if dictionary.is_empty() {
        return Ok(None);
    }
    let n = column.size();
    let mut indices = vec![0i32; n];
    column.fill_category(&mut indices, 0);

    let dict_size = dictionary.len() + 1;
    let mut counts = vec![0usize; dict_size];
    for idx in indices {
        if idx > 0 && (idx as usize) < dict_size {
            counts[idx as usize] += 1;
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (index, &count) in counts.iter().enumerate().skip(1) {
        let improves = match best {
            None => true,
            Some((_, best_count)) => {
                if most_frequent {
                    count > best_count
                } else {
                    count < best_count
                }
            }
        };
        if improves {
            best = Some((index, count));
        }
    }
    Ok(best.map(|(index, _)| dictionary.get(index as u32).expect("index within domain").to_owned()))
}

fn dictionary_of(column: &Column) -> Result<std::sync::Arc<Dictionary>, Error> {
    match column {
        Column::Categorical(c) => Ok(c.dictionary().clone()),
        Column::MappedCategorical(c) => Ok(c.dictionary().clone()),
        _ => Err(Error::unsupported_operation(
            "categorical mode/least-frequent requires a categorical column",
        )),
    }
}
