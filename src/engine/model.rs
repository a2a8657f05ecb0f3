use super::kernel::{epoch_days, fourier_features, trend_features};
use crate::config::{ModelConfig, SeasonalityMode};
use crate::error::{PipelineError, Result};
use crate::frame::{ForecastRow, Frequency};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One Fourier block of the design matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalBlock {
    pub name: String,
    pub period_days: f64,
    pub order: usize,
    /// First design column of this block.
    pub offset: usize,
}

impl SeasonalBlock {
    pub fn width(&self) -> usize {
        2 * self.order
    }
}

/// Fitted parameters of a [`HarmonicEngine`](super::HarmonicEngine) model.
///
/// Everything needed to re-predict lives here, so a model read back from the
/// artifact store produces exactly the rows it produced when it was fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub config: ModelConfig,
    pub frequency: Frequency,
    /// First training timestamp (`t = 0`).
    pub origin: NaiveDateTime,
    /// Last training timestamp (`t = 1`).
    pub cutoff: NaiveDateTime,
    pub span_days: f64,
    /// Additive mode divides the target by this; multiplicative fits `ln y`.
    pub value_scale: f64,
    pub n_train: usize,
    pub changepoints: Vec<f64>,
    pub seasonalities: Vec<SeasonalBlock>,
    pub coefficients: Vec<f64>,
    /// Residual standard deviation in fitted space.
    pub sigma: f64,
    /// Standard normal quantile for the configured interval width.
    pub z: f64,
}

impl FittedModel {
    pub fn n_columns(&self) -> usize {
        2 + self.changepoints.len() + self.seasonalities.iter().map(|s| s.width()).sum::<usize>()
    }

    pub fn scaled_time(&self, ts: NaiveDateTime) -> f64 {
        (epoch_days(ts) - epoch_days(self.origin)) / self.span_days
    }

    /// Fills one design row for `ts`. `row.len()` must equal [`Self::n_columns`].
    pub fn design_row(&self, ts: NaiveDateTime, row: &mut [f64]) {
        let trend_cols = 2 + self.changepoints.len();
        trend_features(self.scaled_time(ts), &self.changepoints, &mut row[..trend_cols]);
        let days = epoch_days(ts);
        for block in &self.seasonalities {
            let dest = &mut row[block.offset..block.offset + block.width()];
            fourier_features(days, block.period_days, block.order, dest);
        }
    }

    /// Predicts point, bounds and components for each timestamp, in order.
    ///
    /// Timestamps after the cutoff get intervals widened by `sqrt(1 + h / n)`
    /// where `h` is the distance from the cutoff in periods.
    pub fn predict(&self, timestamps: &[NaiveDateTime]) -> Result<Vec<ForecastRow>> {
        let p = self.n_columns();
        if self.coefficients.len() != p {
            return Err(PipelineError::FitDivergence(format!(
                "Model has {} coefficients for {} design columns",
                self.coefficients.len(),
                p
            )));
        }

        let trend_cols = 2 + self.changepoints.len();
        let cutoff_days = epoch_days(self.cutoff);
        let mut row = vec![0.0; p];
        let mut out = Vec::with_capacity(timestamps.len());

        for &ts in timestamps {
            self.design_row(ts, &mut row);
            let trend = dot(&row[..trend_cols], &self.coefficients[..trend_cols]);

            let mut fitted = trend;
            let mut seasonal = BTreeMap::new();
            for block in &self.seasonalities {
                let range = block.offset..block.offset + block.width();
                let s = dot(&row[range.clone()], &self.coefficients[range]);
                fitted += s;
                seasonal.insert(block.name.clone(), s);
            }

            let ahead = (epoch_days(ts) - cutoff_days) / self.frequency.nominal_days();
            let widen = if ahead > 0.0 { (1.0 + ahead / self.n_train as f64).sqrt() } else { 1.0 };
            let half = self.z * self.sigma * widen;

            let mut out_row = match self.config.seasonality_mode {
                SeasonalityMode::Additive => {
                    let k = self.value_scale;
                    for v in seasonal.values_mut() {
                        *v *= k;
                    }
                    let mut r = ForecastRow::new(ts, fitted * k, (fitted - half) * k, (fitted + half) * k);
                    r.trend = Some(trend * k);
                    r.seasonal = seasonal;
                    r
                }
                SeasonalityMode::Multiplicative => {
                    for v in seasonal.values_mut() {
                        *v = v.exp() - 1.0;
                    }
                    let mut r = ForecastRow::new(ts, fitted.exp(), (fitted - half).exp(), (fitted + half).exp());
                    r.trend = Some(trend.exp());
                    r.seasonal = seasonal;
                    r
                }
            };

            let finite = out_row.point.is_finite()
                && out_row.lower.is_finite()
                && out_row.upper.is_finite()
                && out_row.trend.map_or(true, f64::is_finite)
                && out_row.seasonal.values().all(|v| v.is_finite());
            if !finite {
                return Err(PipelineError::FitDivergence(format!("Non-finite prediction at {}", ts)));
            }
            // exp() can round lower/upper onto point for tiny sigma.
            out_row.lower = out_row.lower.min(out_row.point);
            out_row.upper = out_row.upper.max(out_row.point);
            out.push(out_row);
        }
        Ok(out)
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
