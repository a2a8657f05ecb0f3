use super::metrics;
use crate::config::MapePolicy;
use crate::error::{PipelineError, Result};
use crate::frame::{ForecastFrame, TimeSeriesFrame};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualRow {
    pub timestamp: NaiveDateTime,
    pub actual: f64,
    pub predicted: f64,
    /// `actual - predicted`
    pub residual: f64,
}

/// Accuracy of a forecast's in-sample portion against observed values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Undefined metrics are NaN in memory and `null` on disk.
    #[serde(with = "nan_as_null")]
    pub metrics: BTreeMap<String, f64>,
    pub residuals: Vec<ResidualRow>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl EvaluationRecord {
    /// The named metric, NaN when it is absent or undefined.
    pub fn metric(&self, name: &str) -> f64 {
        self.metrics.get(name).copied().unwrap_or(f64::NAN)
    }
}

// Undefined (NaN) metrics compare equal to each other.
impl PartialEq for EvaluationRecord {
    fn eq(&self, other: &Self) -> bool {
        let same_metrics = self.metrics.len() == other.metrics.len()
            && self.metrics.iter().zip(&other.metrics).all(|((ka, va), (kb, vb))| {
                ka == kb && (va == vb || (va.is_nan() && vb.is_nan()))
            });
        same_metrics && self.residuals == other.residuals && self.warnings == other.warnings
    }
}

mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(map: &BTreeMap<String, f64>, s: S) -> Result<S::Ok, S::Error> {
        let opt: BTreeMap<&String, Option<f64>> =
            map.iter().map(|(k, v)| (k, if v.is_finite() { Some(*v) } else { None })).collect();
        opt.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, f64>, D::Error> {
        let opt = BTreeMap::<String, Option<f64>>::deserialize(d)?;
        Ok(opt.into_iter().map(|(k, v)| (k, v.unwrap_or(f64::NAN))).collect())
    }
}

/// Scores forecasts against actuals over their shared timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    pub mape_policy: MapePolicy,
}

impl Evaluator {
    pub fn new(mape_policy: MapePolicy) -> Self {
        Self { mape_policy }
    }

    /// Inner-joins `actual` with the in-sample rows of `predicted` and computes
    /// MAE, RMSE, MAPE and R2 over the matched pairs only.
    pub fn evaluate(&self, actual: &TimeSeriesFrame, predicted: &ForecastFrame) -> Result<EvaluationRecord> {
        let residuals = join(actual, predicted);
        if residuals.is_empty() {
            return Err(PipelineError::EmptyJoin(format!(
                "no timestamps shared by {} actual rows and {} in-sample forecast rows",
                actual.len(),
                predicted.in_sample().len()
            )));
        }
        let pairs: Vec<(f64, f64)> = residuals.iter().map(|r| (r.actual, r.predicted)).collect();

        let mut warnings = Vec::new();
        let mut values = BTreeMap::new();
        values.insert(metrics::MAE.to_string(), metrics::mae(&pairs));
        values.insert(metrics::RMSE.to_string(), metrics::rmse(&pairs));

        let mape = match (metrics::mape(&pairs), self.mape_policy) {
            (Some(v), _) => v,
            (None, MapePolicy::Fail) => {
                return Err(PipelineError::DivisionByZeroMetric { metric: metrics::MAPE.to_string() })
            }
            (None, MapePolicy::NanWithWarning) => {
                let msg = "MAPE undefined: at least one actual value is zero".to_string();
                warn!("{}", msg);
                warnings.push(msg);
                f64::NAN
            }
        };
        values.insert(metrics::MAPE.to_string(), mape);

        let r2 = metrics::r2(&pairs).unwrap_or_else(|| {
            let msg = "R2 undefined: actual values have zero variance".to_string();
            warn!("{}", msg);
            warnings.push(msg);
            f64::NAN
        });
        values.insert(metrics::R2.to_string(), r2);

        Ok(EvaluationRecord { metrics: values, residuals, warnings })
    }
}

/// Sorted merge of two strictly increasing timestamp sequences.
fn join(actual: &TimeSeriesFrame, predicted: &ForecastFrame) -> Vec<ResidualRow> {
    let rows = predicted.in_sample();
    let mut out = Vec::with_capacity(actual.len().min(rows.len()));
    let mut obs = actual.iter().peekable();
    let mut fc = rows.iter().peekable();

    while let (Some((ts, a)), Some(row)) = (obs.peek().copied(), fc.peek().copied()) {
        match ts.cmp(&row.timestamp) {
            Ordering::Less => {
                obs.next();
            }
            Ordering::Greater => {
                fc.next();
            }
            Ordering::Equal => {
                out.push(ResidualRow { timestamp: ts, actual: a, predicted: row.point, residual: a - row.point });
                obs.next();
                fc.next();
            }
        }
    }
    out
}
