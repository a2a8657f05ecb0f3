use super::table::RawTable;
use crate::error::{PipelineError, Result};
use crate::frame::TimeSeriesFrame;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parses the timestamp spellings accepted in source files.
///
/// Zoned RFC 3339 values are converted to UTC. `YYYY-MM` means the first of
/// the month at midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    if s.len() == 7 && s.as_bytes()[4] == b'-' {
        return NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN));
    }
    None
}

pub fn parse_value(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Resolves the (timestamp, value) column pair.
///
/// Named columns must exist. Otherwise the timestamp column is the first whose
/// first cell is a timestamp and the value column is the first other column
/// whose first cell is a number.
pub fn resolve_columns(table: &RawTable, timestamp: Option<&str>, value: Option<&str>) -> Result<(usize, usize)> {
    let named = |name: &str| {
        table.column_index(name).ok_or_else(|| {
            PipelineError::SchemaMismatch(format!("column '{}' not found in {:?}", name, table.headers))
        })
    };
    let first = table.rows.first();

    let ts_idx = match timestamp {
        Some(name) => named(name)?,
        None => first
            .and_then(|row| row.iter().position(|cell| parse_timestamp(cell).is_some()))
            .ok_or_else(|| PipelineError::SchemaMismatch("no timestamp column detected".to_string()))?,
    };
    let value_idx = match value {
        Some(name) => named(name)?,
        None => first
            .and_then(|row| {
                row.iter()
                    .enumerate()
                    .position(|(i, cell)| i != ts_idx && parse_value(cell).is_some())
            })
            .ok_or_else(|| PipelineError::SchemaMismatch("no numeric value column detected".to_string()))?,
    };
    if ts_idx == value_idx {
        return Err(PipelineError::SchemaMismatch(format!(
            "timestamp and value both map to column '{}'",
            table.headers[ts_idx]
        )));
    }
    Ok((ts_idx, value_idx))
}

/// Builds a validated frame: rows are sorted by timestamp and duplicates rejected.
pub fn to_frame(table: &RawTable, ts_idx: usize, value_idx: usize) -> Result<TimeSeriesFrame> {
    let mut pairs = Vec::with_capacity(table.len());
    for (i, row) in table.rows.iter().enumerate() {
        // +2: one for the header, one for 1-based numbering.
        let line = i + 2;
        let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");
        let ts = parse_timestamp(cell(ts_idx)).ok_or_else(|| {
            PipelineError::SchemaMismatch(format!("line {}: unparseable timestamp '{}'", line, cell(ts_idx)))
        })?;
        let value = parse_value(cell(value_idx)).ok_or_else(|| {
            PipelineError::SchemaMismatch(format!("line {}: '{}' is not a finite number", line, cell(value_idx)))
        })?;
        pairs.push((ts, value));
    }

    pairs.sort_by_key(|(ts, _)| *ts);
    if let Some(w) = pairs.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(PipelineError::SchemaMismatch(format!("duplicate timestamp {}", w[0].0)));
    }
    TimeSeriesFrame::from_pairs(pairs)
}
