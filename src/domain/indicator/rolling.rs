//! Trailing-window helpers shared by the indicators.
//!
//! Every `rolling_*` output is aligned to its input: index `i` summarises
//! `values[i + 1 - period..=i]` and is `None` for the first `period - 1` entries.

pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Population standard deviation (divides by N).
pub fn rolling_population_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let variance = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        variance.sqrt()
    })
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Mean over a window of optional values; undefined unless every entry in the window is defined.
pub fn rolling_mean_defined(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let sum: Option<f64> = window.iter().copied().sum();
        out[i] = sum.map(|s| s / period as f64);
    }
    out
}

/// Exponential moving average with alpha = 2/(period+1), seeded with the first value.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            None => v,
            Some(p) => v * alpha + p * (1.0 - alpha),
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

fn rolling<F>(values: &[f64], period: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for (offset, window) in values.windows(period).enumerate() {
        out[offset + period - 1] = Some(f(window));
    }
    out
}
