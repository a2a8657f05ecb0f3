//! Design-matrix features: piecewise-linear trend and Fourier seasonality.

use chrono::NaiveDateTime;
use std::f64::consts::PI;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Days since the Unix epoch. Seasonal phases are anchored here so that a
/// model refit on a shifted window keeps calendar-aligned harmonics.
#[inline]
pub fn epoch_days(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp() as f64 / SECONDS_PER_DAY
}

/// Writes `[1, t, (t - c_1)+, ..., (t - c_k)+]` into `dest`.
#[inline]
pub fn trend_features(t: f64, changepoints: &[f64], dest: &mut [f64]) {
    dest[0] = 1.0;
    dest[1] = t;
    for (slot, c) in dest[2..].iter_mut().zip(changepoints) {
        *slot = (t - c).max(0.0);
    }
}

/// Writes `[sin(2 pi k d / P), cos(2 pi k d / P)]` for `k = 1..=order` into `dest`.
#[inline]
pub fn fourier_features(days: f64, period_days: f64, order: usize, dest: &mut [f64]) {
    for k in 0..order {
        let angle = 2.0 * PI * (k + 1) as f64 * days / period_days;
        dest[2 * k] = angle.sin();
        dest[2 * k + 1] = angle.cos();
    }
}

/// Changepoint locations in scaled time.
///
/// Picks up to `count` history points spread evenly over the first `range`
/// fraction of `t` (excluding the very first point). Duplicates collapse, so
/// short histories get fewer changepoints.
pub fn place_changepoints(t: &[f64], count: usize, range: f64) -> Vec<f64> {
    if t.len() < 3 || count == 0 {
        return Vec::new();
    }
    let last = ((t.len() - 1) as f64 * range).floor() as usize;
    let count = count.min(last);
    if count == 0 {
        return Vec::new();
    }

    let mut out: Vec<f64> = Vec::with_capacity(count);
    for j in 1..=count {
        let idx = (j as f64 * last as f64 / count as f64).round() as usize;
        let c = t[idx.min(t.len() - 1)];
        if out.last().map_or(true, |prev| c > *prev) {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    #[test]
    fn test_epoch_days() {
        let ts = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap().and_hms_opt(12, 0, 0).unwrap();
        assert_relative_eq!(epoch_days(ts), 1.5);
    }

    #[test]
    fn test_trend_hinges_are_zero_before_changepoint() {
        let mut row = [0.0; 4];
        trend_features(0.3, &[0.25, 0.5], &mut row);
        assert_relative_eq!(row[0], 1.0);
        assert_relative_eq!(row[1], 0.3);
        assert_relative_eq!(row[2], 0.05, epsilon = 1e-12);
        assert_eq!(row[3], 0.0);
    }

    #[test]
    fn test_fourier_full_period_returns_to_start() {
        let mut a = [0.0; 4];
        let mut b = [0.0; 4];
        fourier_features(10.0, 7.0, 2, &mut a);
        fourier_features(17.0, 7.0, 2, &mut b);
        for (x, y) in a.iter().zip(&b) {
            assert_relative_eq!(x, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_changepoints_within_range_and_increasing() {
        let t: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let cps = place_changepoints(&t, 25, 0.8);
        assert_eq!(cps.len(), 25);
        assert!(cps.windows(2).all(|w| w[0] < w[1]));
        assert!(*cps.last().unwrap() <= 0.8 + 1e-12);
        assert!(cps[0] > 0.0);
    }

    #[test]
    fn test_short_history_gets_fewer_changepoints() {
        let t = [0.0, 0.25, 0.5, 0.75, 1.0];
        let cps = place_changepoints(&t, 25, 0.8);
        assert_eq!(cps, vec![0.25, 0.5, 0.75]);
    }
}
