//! Daily return series derived from closing prices.

use crate::domain::price::PriceSeries;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// `(c[t] - c[t-1]) / c[t-1]` for `t >= 1`; one shorter than the input.
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

/// Daily returns scaled to percent.
pub fn percent_returns(closes: &[f64]) -> Vec<f64> {
    daily_returns(closes).into_iter().map(|r| r * 100.0).collect()
}

/// Daily returns keyed by the date of the later bar.
pub fn returns_by_date(series: &PriceSeries) -> BTreeMap<NaiveDate, f64> {
    let bars = series.bars();
    bars.windows(2)
        .map(|w| (w[1].date, (w[1].close - w[0].close) / w[0].close))
        .filter(|(_, r)| r.is_finite())
        .collect()
}

/// Closing prices of the two series on the dates they share, ascending.
pub fn align_on_dates(a: &PriceSeries, b: &PriceSeries) -> Vec<(NaiveDate, f64, f64)> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    let (xs, ys) = (a.bars(), b.bars());
    while i < xs.len() && j < ys.len() {
        match xs[i].date.cmp(&ys[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push((xs[i].date, xs[i].close, ys[j].close));
                i += 1;
                j += 1;
            }
        }
    }
    out
}
