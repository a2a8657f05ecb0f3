//! Sampling cadence of a series and calendar-aware stepping.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
    /// Same day-of-month each month, or the last day of every month.
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 6] = [
        Frequency::Hourly,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Yearly,
    ];

    /// Calendar months per period, `None` for fixed-length periods.
    fn months(&self) -> Option<u32> {
        match self {
            Frequency::Monthly => Some(1),
            Frequency::Quarterly => Some(3),
            Frequency::Yearly => Some(12),
            Frequency::Hourly | Frequency::Daily | Frequency::Weekly => None,
        }
    }

    fn seconds(&self) -> i64 {
        match self {
            Frequency::Hourly => 3_600,
            Frequency::Daily => 86_400,
            _ => 7 * 86_400,
        }
    }

    /// The timestamp `k` periods after `origin`. `None` only on calendar overflow.
    ///
    /// Calendar steps count from `origin`, so a day-30 series comes back to the
    /// 30th after February. With `month_end` every step lands on the last day of
    /// its month.
    pub fn nth_after(&self, origin: NaiveDateTime, k: usize, month_end: bool) -> Option<NaiveDateTime> {
        let k = u32::try_from(k).ok()?;
        match self.months() {
            Some(m) => {
                let ts = origin.checked_add_months(Months::new(k.checked_mul(m)?))?;
                if month_end {
                    Some(last_day_of_month(ts.date())?.and_time(ts.time()))
                } else {
                    Some(ts)
                }
            }
            None => origin.checked_add_signed(Duration::try_seconds(self.seconds().checked_mul(k as i64)?)?),
        }
    }

    /// Whether a calendar series is anchored to month ends rather than a day-of-month.
    pub fn month_end_anchored(&self, timestamps: &[NaiveDateTime]) -> bool {
        self.months().is_some() && !timestamps.is_empty() && timestamps.iter().all(|ts| is_month_end(ts.date()))
    }

    /// `count` timestamps continuing `history`, excluding the history itself.
    pub fn extend_series(&self, history: &[NaiveDateTime], count: usize) -> Option<Vec<NaiveDateTime>> {
        let origin = *history.first()?;
        let anchored = self.month_end_anchored(history);
        (history.len()..history.len() + count)
            .map(|k| self.nth_after(origin, k, anchored))
            .collect()
    }

    /// `count` consecutive timestamps following `last`, excluding `last` itself.
    pub fn extend(&self, last: NaiveDateTime, count: usize) -> Option<Vec<NaiveDateTime>> {
        self.extend_series(&[last], count)
    }

    /// Observations needed to cover one full yearly cycle.
    pub fn periods_per_year(&self) -> usize {
        match self {
            Frequency::Hourly => 8766,
            Frequency::Daily => 365,
            Frequency::Weekly => 52,
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::Yearly => 1,
        }
    }

    /// Nominal length of one period in days, used for Fourier aliasing checks.
    pub fn nominal_days(&self) -> f64 {
        match self {
            Frequency::Hourly => 1.0 / 24.0,
            Frequency::Daily => 1.0,
            Frequency::Weekly => 7.0,
            Frequency::Monthly => 365.25 / 12.0,
            Frequency::Quarterly => 365.25 / 4.0,
            Frequency::Yearly => 365.25,
        }
    }

    /// Returns the index of the first pair `(i, i + 1)` that breaks the cadence
    /// set by the first timestamp.
    pub fn first_irregularity(&self, timestamps: &[NaiveDateTime]) -> Option<usize> {
        let origin = *timestamps.first()?;
        let anchored = self.month_end_anchored(timestamps);
        timestamps
            .iter()
            .enumerate()
            .skip(1)
            .position(|(k, ts)| self.nth_after(origin, k, anchored) != Some(*ts))
    }

    /// The single frequency under which every gap in `timestamps` is exactly one step.
    pub fn infer(timestamps: &[NaiveDateTime]) -> Option<Frequency> {
        if timestamps.len() < 2 {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|f| f.first_irregularity(timestamps).is_none())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }
}

fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.day() == 1)
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?.checked_add_months(Months::new(1))?.pred_opt()
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "hourly" => Ok(Frequency::Hourly),
            "d" | "daily" => Ok(Frequency::Daily),
            "w" | "weekly" => Ok(Frequency::Weekly),
            "ms" | "m" | "monthly" => Ok(Frequency::Monthly),
            "qs" | "q" | "quarterly" => Ok(Frequency::Quarterly),
            "ys" | "y" | "yearly" => Ok(Frequency::Yearly),
            other => Err(format!("Unknown frequency '{}'", other)),
        }
    }
}
