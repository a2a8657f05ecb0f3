//! SVG charts drawn with plotters.

use super::format_timestamp;
use crate::analysis::EvaluationRecord;
use crate::config::ReportConfig;
use crate::error::{PipelineError, Result};
use crate::frame::{ForecastFrame, ForecastRow, TimeSeriesFrame};
use chrono::{DateTime, NaiveDateTime};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

const FORECAST_COLOR: RGBColor = RGBColor(31, 119, 180);
const BAND_COLOR: RGBColor = RGBColor(173, 216, 230);
const RESIDUAL_COLOR: RGBColor = RGBColor(214, 39, 40);

fn render_error(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Render(e.to_string())
}

fn days(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp() as f64 / 86_400.0
}

fn date_label(d: f64, fmt: &str) -> String {
    DateTime::from_timestamp((d * 86_400.0).round() as i64, 0)
        .and_then(|dt| format_timestamp(dt.naive_utc(), fmt).ok())
        .unwrap_or_default()
}

/// Min..max with 5% headroom; a degenerate span is widened to unit width.
fn span(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if hi - lo <= f64::EPSILON * hi.abs().max(1.0) {
        return (lo - 0.5)..(hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

fn band(rows: &[ForecastRow]) -> Vec<(f64, f64)> {
    rows.iter()
        .map(|r| (days(r.timestamp), r.upper))
        .chain(rows.iter().rev().map(|r| (days(r.timestamp), r.lower)))
        .collect()
}

/// Actuals as points, point forecast as a line, and the interval as a band.
pub fn forecast_svg(actual: &TimeSeriesFrame, forecast: &ForecastFrame, cfg: &ReportConfig) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (cfg.width, cfg.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let rows = forecast.rows();
        let x = span(rows.iter().map(|r| days(r.timestamp)).chain(actual.timestamps().iter().map(|t| days(*t))));
        let y = span(rows.iter().flat_map(|r| [r.lower, r.upper]).chain(actual.values().iter().copied()));

        let mut chart = ChartBuilder::on(&root)
            .caption(&cfg.title, ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x, y)
            .map_err(render_error)?;
        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc(&cfg.value_label)
            .x_label_formatter(&|d| date_label(*d, &cfg.date_format))
            .draw()
            .map_err(render_error)?;

        chart
            .draw_series(std::iter::once(Polygon::new(band(rows), BAND_COLOR.mix(0.4).filled())))
            .map_err(render_error)?
            .label("Prediction interval")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BAND_COLOR.filled()));
        chart
            .draw_series(LineSeries::new(rows.iter().map(|r| (days(r.timestamp), r.point)), &FORECAST_COLOR))
            .map_err(render_error)?
            .label("Forecast")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], FORECAST_COLOR));
        chart
            .draw_series(actual.iter().map(|(t, v)| Circle::new((days(t), v), 2, BLACK.filled())))
            .map_err(render_error)?
            .label("Actual")
            .legend(|(x, y)| Circle::new((x + 10, y), 3, BLACK.filled()));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_error)?;
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

fn draw_component(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    name: &str,
    points: &[(f64, f64)],
    cfg: &ReportConfig,
) -> Result<()> {
    let x = span(points.iter().map(|p| p.0));
    let y = span(points.iter().map(|p| p.1));
    let mut chart = ChartBuilder::on(area)
        .caption(name, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x, y)
        .map_err(render_error)?;
    chart
        .configure_mesh()
        .x_label_formatter(&|d| date_label(*d, &cfg.date_format))
        .draw()
        .map_err(render_error)?;
    chart
        .draw_series(LineSeries::new(points.iter().copied(), &FORECAST_COLOR))
        .map_err(render_error)?;
    Ok(())
}

/// One panel for the trend and one per seasonal component.
pub fn components_svg(forecast: &ForecastFrame, cfg: &ReportConfig) -> Result<String> {
    let rows = forecast.rows();
    let mut panels: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
    let trend: Vec<(f64, f64)> = rows.iter().filter_map(|r| r.trend.map(|v| (days(r.timestamp), v))).collect();
    if !trend.is_empty() {
        panels.push(("trend".to_string(), trend));
    }
    for name in forecast.component_names() {
        let series = rows
            .iter()
            .filter_map(|r| r.seasonal.get(&name).map(|v| (days(r.timestamp), *v)))
            .collect();
        panels.push((name, series));
    }
    if panels.is_empty() {
        return Err(PipelineError::Render("forecast carries no decomposition to plot".to_string()));
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (cfg.width, cfg.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        let areas = root.split_evenly((panels.len(), 1));
        for (area, (name, points)) in areas.iter().zip(&panels) {
            draw_component(area, name, points, cfg)?;
        }
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

/// In-sample fit on top, residuals below.
pub fn fit_svg(forecast: &ForecastFrame, evaluation: &EvaluationRecord, cfg: &ReportConfig) -> Result<String> {
    let residuals = &evaluation.residuals;
    let in_sample = forecast.in_sample();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (cfg.width, cfg.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        let (top, bottom) = root.split_vertically(cfg.height * 3 / 4);

        let x = span(in_sample.iter().map(|r| days(r.timestamp)));
        let y = span(in_sample.iter().flat_map(|r| [r.lower, r.upper]).chain(residuals.iter().map(|r| r.actual)));
        let mut chart = ChartBuilder::on(&top)
            .caption(format!("Forecast vs Actual: {}", cfg.title), ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(x.clone(), y)
            .map_err(render_error)?;
        chart
            .configure_mesh()
            .y_desc(&cfg.value_label)
            .x_label_formatter(&|d| date_label(*d, &cfg.date_format))
            .draw()
            .map_err(render_error)?;
        chart
            .draw_series(std::iter::once(Polygon::new(band(in_sample), BAND_COLOR.mix(0.4).filled())))
            .map_err(render_error)?;
        chart
            .draw_series(LineSeries::new(in_sample.iter().map(|r| (days(r.timestamp), r.point)), &FORECAST_COLOR))
            .map_err(render_error)?;
        chart
            .draw_series(residuals.iter().map(|r| Circle::new((days(r.timestamp), r.actual), 2, BLACK.filled())))
            .map_err(render_error)?;

        let ry = span(residuals.iter().map(|r| r.residual).chain(std::iter::once(0.0)));
        let mut chart = ChartBuilder::on(&bottom)
            .margin(20)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(x, ry)
            .map_err(render_error)?;
        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Residuals")
            .x_label_formatter(&|d| date_label(*d, &cfg.date_format))
            .draw()
            .map_err(render_error)?;
        let points: Vec<(f64, f64)> = residuals.iter().map(|r| (days(r.timestamp), r.residual)).collect();
        chart
            .draw_series(AreaSeries::new(points.iter().copied(), 0.0, RESIDUAL_COLOR.mix(0.3)))
            .map_err(render_error)?;
        chart
            .draw_series(LineSeries::new(points.iter().copied(), &RESIDUAL_COLOR))
            .map_err(render_error)?;

        root.present().map_err(render_error)?;
    }
    Ok(svg)
}
