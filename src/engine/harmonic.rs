use super::kernel::{epoch_days, place_changepoints};
use super::model::{FittedModel, SeasonalBlock};
use super::{ForecastEngine, ModelHandle};
use crate::config::{ModelConfig, SeasonalityMode};
use crate::error::{PipelineError, Result};
use crate::frame::{ForecastFrame, Frequency, TimeSeriesFrame};
use crate::solver::{self, LeastSquaresProblem};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, warn};

pub const ENGINE_NAME: &str = "harmonic";

/// Ridge penalty standing in for a prior scale of zero.
const PINNED: f64 = 1e12;

/// (name, period in days, default Fourier order)
const SEASONALITIES: [(&str, f64, usize); 3] = [("yearly", 365.25, 10), ("weekly", 7.0, 3), ("daily", 1.0, 4)];

/// Piecewise-linear trend plus Fourier seasonality, fit by ridge regression.
///
/// The trend has an intercept, a slope and hinge terms at changepoints; each
/// enabled seasonality contributes a block of sine/cosine pairs. Prior scales
/// become ridge penalties, so a smaller scale means a stiffer component.
#[derive(Debug, Clone, Copy, Default)]
pub struct HarmonicEngine;

impl HarmonicEngine {
    pub fn fit(&self, frame: &TimeSeriesFrame, frequency: Frequency, config: &ModelConfig) -> Result<FittedModel> {
        let stamps = frame.timestamps();
        let values = frame.values();

        let (target, value_scale) = match config.seasonality_mode {
            SeasonalityMode::Additive => {
                let peak = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
                let scale = if peak > 0.0 { peak } else { 1.0 };
                (values.iter().map(|v| v / scale).collect::<Vec<_>>(), scale)
            }
            SeasonalityMode::Multiplicative => {
                if let Some(v) = values.iter().find(|v| **v <= 0.0) {
                    return Err(PipelineError::InvalidSeasonalityMode(format!(
                        "multiplicative mode requires positive values, found {}",
                        v
                    )));
                }
                (values.iter().map(|v| v.ln()).collect(), 1.0)
            }
        };

        let origin = frame.first_timestamp();
        let cutoff = frame.last_timestamp();
        let span_days = epoch_days(cutoff) - epoch_days(origin);
        let t: Vec<f64> = stamps.iter().map(|ts| (epoch_days(*ts) - epoch_days(origin)) / span_days).collect();
        let changepoints = place_changepoints(&t, config.n_changepoints, config.changepoint_range);

        let mut seasonalities = Vec::new();
        let mut offset = 2 + changepoints.len();
        let enabled = [config.yearly_seasonality, config.weekly_seasonality, config.daily_seasonality];
        for ((name, period_days, order), on) in SEASONALITIES.into_iter().zip(enabled) {
            if !on {
                continue;
            }
            let steps = period_days / frequency.nominal_days();
            if steps <= 2.0 {
                warn!(seasonality = name, frequency = %frequency, "period spans at most two samples, skipping");
                continue;
            }
            let order = order.min((steps / 2.0).floor() as usize);
            seasonalities.push(SeasonalBlock { name: name.to_string(), period_days, order, offset });
            offset += 2 * order;
        }

        let z = Normal::new(0.0, 1.0)
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?
            .inverse_cdf(0.5 + config.interval_width / 2.0);

        let mut model = FittedModel {
            config: config.clone(),
            frequency,
            origin,
            cutoff,
            span_days,
            value_scale,
            n_train: frame.len(),
            changepoints,
            seasonalities,
            coefficients: Vec::new(),
            sigma: 0.0,
            z,
        };

        let p = model.n_columns();
        let mut problem = LeastSquaresProblem::new(p);
        let mut row = vec![0.0; p];
        for (ts, y) in stamps.iter().zip(&target) {
            model.design_row(*ts, &mut row);
            problem.push_row(&row, *y);
        }
        problem.penalize(2, 2 + model.changepoints.len(), prior_penalty(config.changepoint_prior_scale));
        problem.penalize(2 + model.changepoints.len(), p, prior_penalty(config.seasonality_prior_scale));

        model.coefficients = solver::solve(&problem)?;

        let ss_res: f64 = (0..problem.rows())
            .map(|i| {
                let fitted: f64 = problem.row(i).iter().zip(&model.coefficients).map(|(x, b)| x * b).sum();
                (problem.target[i] - fitted).powi(2)
            })
            .sum();
        model.sigma = (ss_res / problem.rows() as f64).sqrt();
        if !model.sigma.is_finite() {
            return Err(PipelineError::FitDivergence("Residual variance is not finite".to_string()));
        }

        debug!(
            columns = p,
            changepoints = model.changepoints.len(),
            seasonalities = model.seasonalities.len(),
            sigma = model.sigma,
            "harmonic model fit"
        );
        Ok(model)
    }

    /// Predicts the training timestamps followed by `horizon` future periods.
    pub fn forecast(&self, model: &FittedModel, history: &TimeSeriesFrame, horizon: usize) -> Result<ForecastFrame> {
        let future = model.frequency.extend_series(history.timestamps(), horizon).ok_or_else(|| {
            PipelineError::InvalidConfig(format!("horizon {} runs past the supported calendar range", horizon))
        })?;
        let mut stamps = history.timestamps().to_vec();
        stamps.extend(future);
        let rows = model.predict(&stamps)?;
        ForecastFrame::new(model.cutoff, rows)
    }
}

fn prior_penalty(scale: f64) -> f64 {
    if scale > 0.0 {
        1.0 / (scale * scale)
    } else {
        PINNED
    }
}

impl ForecastEngine for HarmonicEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn fit_predict(
        &self,
        frame: &TimeSeriesFrame,
        horizon: usize,
        frequency: Frequency,
        config: &ModelConfig,
    ) -> Result<(ModelHandle, ForecastFrame)> {
        let model = self.fit(frame, frequency, config)?;
        let forecast = self.forecast(&model, frame, horizon)?;
        Ok((ModelHandle::from_model(ENGINE_NAME, &model)?, forecast))
    }
}
