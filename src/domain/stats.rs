//! Cross-sectional statistics shared by the factor engines and metrics.
//!
//! All standard deviations are population (divide by n), matching the
//! STDDEV convention used for z-scores.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - m;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// True when `sd` cannot be told apart from rounding noise around `center`.
pub fn is_negligible_dispersion(sd: f64, center: f64) -> bool {
    !sd.is_finite() || sd <= f64::EPSILON * center.abs().max(1.0)
}

/// z = (x - mean) / population_std over the present values.
///
/// Missing entries stay missing and do not contribute to the statistics.
/// When the present values have zero dispersion every one maps to 0.0.
pub fn standardize(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let (Some(m), Some(sd)) = (mean(&present), population_std(&present)) else {
        return vec![None; values.len()];
    };

    values
        .iter()
        .map(|v| {
            v.map(|x| {
                if is_negligible_dispersion(sd, m) {
                    0.0
                } else {
                    (x - m) / sd
                }
            })
        })
        .collect()
}

/// Element-wise mean of aligned component columns. A row missing any
/// component is missing in the result.
pub fn row_mean(columns: &[Vec<Option<f64>>]) -> Vec<Option<f64>> {
    let rows = columns.first().map_or(0, Vec::len);
    (0..rows)
        .map(|i| {
            let parts: Option<Vec<f64>> = columns.iter().map(|c| c[i]).collect();
            parts.and_then(|p| mean(&p))
        })
        .collect()
}
