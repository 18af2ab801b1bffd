//! Four-scalar summaries and distinct-value counting.

use std::cmp::Ordering;

use crate::models::Stats;

/// Mean, population std, min and max over the finite values; `None` when
/// there are none. Single pass (Welford).
pub fn summarize<'a, I>(values: I) -> Option<Stats>
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut count = 0usize;
    let mut mean = 0.0f64;
    let mut m2 = 0.0f64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for &v in values {
        if !v.is_finite() {
            continue;
        }
        count += 1;
        let delta = v - mean;
        mean += delta / count as f64;
        m2 += delta * (v - mean);
        min = min.min(v);
        max = max.max(v);
    }

    if count == 0 {
        return None;
    }
    Some(Stats {
        mean,
        std: (m2 / count as f64).max(0.0).sqrt(),
        min,
        max,
    })
}

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Sorted distinct values with their occurrence counts. NaNs form one group
/// and sort last; `-0.0` and `0.0` are the same value.
pub fn value_counts<'a, I>(values: I) -> Vec<(f64, usize)>
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut sorted: Vec<f64> = values.into_iter().copied().collect();
    sorted.sort_by(|a, b| match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
    });

    let mut counts: Vec<(f64, usize)> = Vec::new();
    for v in sorted {
        match counts.last_mut() {
            Some((last, n)) if same_value(*last, v) => *n += 1,
            _ => counts.push((v, 1)),
        }
    }
    counts
}
