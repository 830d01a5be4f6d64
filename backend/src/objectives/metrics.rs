//! Reduction statistics over accumulated series
//!
//! Every function here is total: empty series and zero targets produce 0
//! rather than NaN, so a degenerate policy still yields a well-formed
//! objective vector.

/// `Σ deficit / Σ target`, 0 when the target sum is 0
///
/// # Example
/// ```
/// use basin_sim_core_rs::objectives::aggregate_deficit_ratio;
///
/// assert_eq!(aggregate_deficit_ratio(&[1.0, 3.0], &[4.0, 4.0]), 0.5);
/// assert_eq!(aggregate_deficit_ratio(&[0.0], &[0.0]), 0.0);
/// ```
pub fn aggregate_deficit_ratio(deficit: &[f64], target: &[f64]) -> f64 {
    safe_ratio(deficit.iter().sum(), target.iter().sum())
}

/// Month-by-month `deficit / target`, 0 for months with zero target
pub fn monthly_deficit_ratios(deficit: &[f64], target: &[f64]) -> Vec<f64> {
    deficit
        .iter()
        .zip(target)
        .map(|(d, t)| safe_ratio(*d, *t))
        .collect()
}

/// Closest-observation (nearest-rank) percentile
///
/// Returns the value at 1-based rank `⌈percentile / 100 · n⌉` of the sorted
/// series; never interpolates. Returns 0 for an empty series.
///
/// # Example
/// ```
/// use basin_sim_core_rs::objectives::percentile_closest_observation;
///
/// let values: Vec<f64> = (1..=10).map(f64::from).collect();
/// assert_eq!(percentile_closest_observation(&values, 90.0), 9.0);
/// ```
pub fn percentile_closest_observation(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let rank = (percentile * n as f64 / 100.0).ceil();
    let rank = if rank.is_nan() {
        n
    } else {
        (rank as usize).clamp(1, n)
    };

    sorted[rank - 1]
}

/// Fraction of values strictly below `threshold`, 0 for an empty series
pub fn frequency_below(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| **v < threshold).count() as f64 / values.len() as f64
}

/// Timestep-wise sum of several equally long series
///
/// Shorter series contribute nothing past their end. No series → empty.
pub fn stack_sum(series: &[&[f64]]) -> Vec<f64> {
    let len = series.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut total = vec![0.0; len];
    for s in series {
        for (slot, value) in total.iter_mut().zip(s.iter()) {
            *slot += value;
        }
    }
    total
}

fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
