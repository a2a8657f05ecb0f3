use super::{ForecastEngine, ModelHandle};
use crate::config::{ModelConfig, SeasonalityMode};
use crate::error::{PipelineError, Result};
use crate::frame::{ForecastFrame, Frequency, TimeSeriesFrame};
use tracing::debug;

/// Guards a [`ForecastEngine`] with input checks and an output contract check.
///
/// Input checks run in a fixed order so the reported error is deterministic
/// when several apply: configuration, spacing, seasonality mode, history length.
pub struct ForecastAdapter<'e> {
    engine: &'e dyn ForecastEngine,
}

impl<'e> ForecastAdapter<'e> {
    pub fn new(engine: &'e dyn ForecastEngine) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn fit_predict(
        &self,
        frame: &TimeSeriesFrame,
        horizon: usize,
        frequency: Frequency,
        config: &ModelConfig,
    ) -> Result<(ModelHandle, ForecastFrame)> {
        Self::check_input(frame, horizon, frequency, config)?;

        debug!(engine = self.engine.name(), rows = frame.len(), horizon, "calling engine");
        let (model, forecast) = self.engine.fit_predict(frame, horizon, frequency, config)?;

        forecast.conforms_to(frame, horizon, frequency)?;
        Ok((model, forecast))
    }

    fn check_input(frame: &TimeSeriesFrame, horizon: usize, frequency: Frequency, config: &ModelConfig) -> Result<()> {
        if horizon == 0 {
            return Err(PipelineError::InvalidConfig("horizon must be a positive integer".to_string()));
        }
        config.validate()?;

        if let Some(i) = frequency.first_irregularity(frame.timestamps()) {
            let stamps = frame.timestamps();
            return Err(PipelineError::IrregularFrequency(format!(
                "{} -> {} breaks the {} cadence (row {})",
                stamps[i],
                stamps[i + 1],
                frequency,
                i + 1
            )));
        }

        if config.seasonality_mode == SeasonalityMode::Multiplicative {
            if let Some((ts, v)) = frame.iter().find(|(_, v)| *v <= 0.0) {
                return Err(PipelineError::InvalidSeasonalityMode(format!(
                    "multiplicative seasonality requires positive values, got {} at {}",
                    v, ts
                )));
            }
        }

        let needed = frequency.periods_per_year();
        if config.yearly_seasonality && frame.len() < needed {
            return Err(PipelineError::InsufficientHistory(format!(
                "yearly seasonality needs at least {} {} observations, got {}",
                needed,
                frequency,
                frame.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HarmonicEngine;
    use crate::error::ErrorKind;
    use crate::frame::ForecastRow;
    use chrono::{NaiveDate, NaiveDateTime};

    fn month_starts(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(1949, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut out = vec![start];
        out.extend(Frequency::Monthly.extend(start, n - 1).unwrap());
        out
    }

    fn airline_like() -> TimeSeriesFrame {
        // 144 monthly points spanning [104, 622].
        let values: Vec<f64> = (0..144)
            .map(|i| {
                let season = 1.0 + 0.15 * (2.0 * std::f64::consts::PI * (i % 12) as f64 / 12.0 - 1.0).sin();
                (118.0 * (0.0117 * i as f64).exp() * season).clamp(104.0, 622.0)
            })
            .collect();
        TimeSeriesFrame::new(month_starts(144), values).unwrap()
    }

    /// Returns a fixed forecast regardless of input.
    struct CannedEngine(Vec<ForecastRow>, NaiveDateTime);

    impl ForecastEngine for CannedEngine {
        fn name(&self) -> &str {
            "canned"
        }
        fn fit_predict(
            &self,
            _: &TimeSeriesFrame,
            _: usize,
            _: Frequency,
            _: &ModelConfig,
        ) -> Result<(ModelHandle, ForecastFrame)> {
            let handle = ModelHandle { engine: "canned".into(), parameters: serde_json::Value::Null };
            Ok((handle, ForecastFrame::new(self.1, self.0.clone())?))
        }
    }

    #[test]
    fn test_monthly_history_with_horizon() {
        let frame = airline_like();
        let engine = HarmonicEngine;
        let adapter = ForecastAdapter::new(&engine);
        let (model, forecast) = adapter.fit_predict(&frame, 24, Frequency::Monthly, &ModelConfig::default()).unwrap();

        assert_eq!(forecast.len(), 168);
        let stamps: Vec<NaiveDateTime> = forecast.rows().iter().map(|r| r.timestamp).collect();
        assert_eq!(&stamps[..144], frame.timestamps());
        assert_eq!(forecast.future().len(), 24);
        assert!(forecast.rows().iter().all(|r| r.lower <= r.point && r.point <= r.upper));
        assert_eq!(model.engine, "harmonic");
        assert!(model.harmonic().is_some());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let frame = airline_like();
        let engine = HarmonicEngine;
        let adapter = ForecastAdapter::new(&engine);
        let cfg = ModelConfig::default();
        let a = adapter.fit_predict(&frame, 12, Frequency::Monthly, &cfg).unwrap();
        let b = adapter.fit_predict(&frame, 12, Frequency::Monthly, &cfg).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_irregular_spacing_rejected() {
        let mut stamps = month_starts(24);
        stamps[10] = stamps[10] + chrono::Duration::days(3);
        let frame = TimeSeriesFrame::new(stamps, vec![10.0; 24]).unwrap();
        let engine = HarmonicEngine;
        let err = ForecastAdapter::new(&engine)
            .fit_predict(&frame, 3, Frequency::Monthly, &ModelConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IrregularFrequency);
    }

    #[test]
    fn test_month_end_history_forecasts_month_ends() {
        let stamps: Vec<NaiveDateTime> = (0..24u32)
            .map(|i| {
                let next_month = NaiveDate::from_ymd_opt(2000 + ((i + 1) / 12) as i32, (i + 1) % 12 + 1, 1).unwrap();
                next_month.pred_opt().unwrap().and_hms_opt(0, 0, 0).unwrap()
            })
            .collect();
        assert_eq!(stamps[1].date(), NaiveDate::from_ymd_opt(2000, 2, 29).unwrap());
        let values = (0..24).map(|i| 100.0 + i as f64 + (i % 12) as f64).collect();
        let frame = TimeSeriesFrame::new(stamps, values).unwrap();

        let engine = HarmonicEngine;
        let (_, forecast) = ForecastAdapter::new(&engine)
            .fit_predict(&frame, 3, Frequency::Monthly, &ModelConfig::default())
            .unwrap();
        let future: Vec<NaiveDate> = forecast.future().iter().map(|r| r.timestamp.date()).collect();
        assert_eq!(
            future,
            vec![
                NaiveDate::from_ymd_opt(2002, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2002, 2, 28).unwrap(),
                NaiveDate::from_ymd_opt(2002, 3, 31).unwrap(),
            ]
        );
    }

    #[test]
    fn test_multiplicative_requires_positive_values() {
        let mut values = vec![10.0; 24];
        values[5] = -1.0;
        let frame = TimeSeriesFrame::new(month_starts(24), values).unwrap();
        let engine = HarmonicEngine;
        let err = ForecastAdapter::new(&engine)
            .fit_predict(&frame, 3, Frequency::Monthly, &ModelConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSeasonalityMode);
    }

    #[test]
    fn test_yearly_seasonality_needs_a_year() {
        let frame = TimeSeriesFrame::new(month_starts(6), vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]).unwrap();
        let engine = HarmonicEngine;
        let err = ForecastAdapter::new(&engine)
            .fit_predict(&frame, 3, Frequency::Monthly, &ModelConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientHistory);

        let cfg = ModelConfig { yearly_seasonality: false, ..Default::default() };
        assert!(ForecastAdapter::new(&engine).fit_predict(&frame, 3, Frequency::Monthly, &cfg).is_ok());
    }

    #[test]
    fn test_config_checked_before_data() {
        // Irregular data and a bad config: the config error wins.
        let mut stamps = month_starts(24);
        stamps[3] = stamps[3] + chrono::Duration::days(1);
        let frame = TimeSeriesFrame::new(stamps, vec![10.0; 24]).unwrap();
        let cfg = ModelConfig { interval_width: 1.5, ..Default::default() };
        let engine = HarmonicEngine;
        let err = ForecastAdapter::new(&engine).fit_predict(&frame, 3, Frequency::Monthly, &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_short_engine_output_rejected() {
        let frame = TimeSeriesFrame::new(month_starts(3), vec![1.0, 2.0, 3.0]).unwrap();
        let rows = frame.iter().map(|(ts, v)| ForecastRow::new(ts, v, v, v)).collect();
        let engine = CannedEngine(rows, frame.last_timestamp());
        let cfg = ModelConfig { yearly_seasonality: false, ..Default::default() };
        let err = ForecastAdapter::new(&engine).fit_predict(&frame, 2, Frequency::Monthly, &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidForecast);
    }
}
