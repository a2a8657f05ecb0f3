use crate::analysis::{metrics, EvaluationRecord};
use crate::pipeline::{PipelineReport, PipelineState, Stage, StageStatus};
use std::fmt::Write;

const RULE: &str = "--------------------------------------------------";

/// Plain-text summary of a run: one line per stage, then the outcome.
///
/// Stages that never ran are listed as skipped. When `evaluation` is given its
/// metrics are appended; undefined metrics print as `n/a`.
pub fn format_report(report: &PipelineReport, evaluation: Option<&EvaluationRecord>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "RUN '{}'", report.run_id);
    let _ = writeln!(out, "{}", RULE);

    for stage in Stage::ALL {
        match report.stages.iter().find(|s| s.stage == stage) {
            Some(outcome) => {
                let secs = outcome.elapsed.as_secs_f64();
                match &outcome.status {
                    StageStatus::Ok => {
                        let _ = writeln!(out, "  [ok]     {:<10} {:>8.3}s", stage, secs);
                    }
                    StageStatus::Err { kind, message } => {
                        let _ = writeln!(out, "  [FAILED] {:<10} {:>8.3}s  {}: {}", stage, secs, kind, message);
                    }
                }
            }
            None => {
                let _ = writeln!(out, "  [skip]   {}", stage);
            }
        }
    }
    let _ = writeln!(out, "{}", RULE);

    if let Some(record) = evaluation {
        let cells: Vec<String> = metrics::ALL
            .iter()
            .map(|name| {
                let v = record.metric(name);
                if v.is_finite() {
                    format!("{}={:.4}", name, v)
                } else {
                    format!("{}=n/a", name)
                }
            })
            .collect();
        let _ = writeln!(out, "metrics: {}", cells.join("  "));
        for warning in &record.warnings {
            let _ = writeln!(out, "warning: {}", warning);
        }
    }

    let total = report.elapsed.as_secs_f64();
    match &report.state {
        PipelineState::Done => {
            let _ = writeln!(out, "DONE in {:.3}s", total);
        }
        PipelineState::Failed { stage, kind, .. } => {
            let _ = writeln!(out, "FAILED at {} ({}) after {:.3}s", stage, kind, total);
        }
        other => {
            let _ = writeln!(out, "INCOMPLETE ({:?}) after {:.3}s", other, total);
        }
    }
    out
}
