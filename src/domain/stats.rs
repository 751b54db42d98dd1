//! Descriptive statistics over plain `f64` slices.
//!
//! Variance and covariance are population moments (divide by N). Every function
//! returns `None` rather than NaN when its input cannot produce a value.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

pub fn population_std(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

/// Population covariance of two equal-length samples.
pub fn covariance(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let sum: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    Some(sum / xs.len() as f64)
}

/// Least-squares slope of `ys` on `xs` (single regressor with intercept).
/// `None` when `xs` has zero variance.
pub fn ols_slope(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let var_x = population_variance(xs)?;
    if var_x == 0.0 {
        return None;
    }
    Some(covariance(xs, ys)? / var_x)
}

/// Pearson correlation coefficient. `None` when either side is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let cov = covariance(xs, ys)?;
    let sx = population_std(xs)?;
    let sy = population_std(ys)?;
    if sx == 0.0 || sy == 0.0 {
        return None;
    }
    Some((cov / (sx * sy)).clamp(-1.0, 1.0))
}

/// Percentile with linear interpolation between closest ranks; `q` in [0, 100].
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Largest peak-to-trough decline of the path compounded from percent returns,
/// as a non-positive percent.
pub fn max_drawdown_percent(percent_returns: &[f64]) -> Option<f64> {
    if percent_returns.is_empty() {
        return None;
    }
    let mut cumulative = 1.0_f64;
    let mut running_max = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for r in percent_returns {
        cumulative *= 1.0 + r / 100.0;
        running_max = running_max.max(cumulative);
        if running_max > 0.0 {
            worst = worst.min((cumulative - running_max) / running_max);
        }
    }
    Some(worst * 100.0)
}
