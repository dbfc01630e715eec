//! Rendering evaluation reports as text, JSON or CSV.
//!
//! CSV has one row per configuration and curve kind, with the 11 precision values in
//! recall-level order, ready for plotting. Configurations without a curve keep their
//! row with empty cells so missing data stays visible.

use crate::curve::{recall_levels, CurveKind, ElevenPointCurve, CURVE_POINTS};
use crate::eval::{ConfigReport, EvalReport, QueryOutcome, QuerySummary};
use crate::Error;
use std::fmt::{self, Write as _};
use std::str::FromStr;

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// Plot-ready CSV.
    Csv,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown report format {other:?} (text, json, csv)")),
        }
    }
}

/// Render `report` in `format`.
pub fn render(report: &EvalReport, format: ReportFormat) -> Result<String, Error> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        ReportFormat::Csv => Ok(render_csv(report)),
    }
}

fn format_values(values: &[f64]) -> String {
    let cells: Vec<String> = values.iter().map(|v| format!("{v:.4}")).collect();
    format!("[{}]", cells.join(", "))
}

// Writing into a `String` never fails.
fn into_string(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    write(&mut out).ok();
    out
}

/// Human-readable summary of one query.
pub fn render_query_summary(query: &str, summary: &QuerySummary) -> String {
    into_string(|out| write_query_summary(out, query, summary))
}

fn write_query_summary(out: &mut String, query: &str, summary: &QuerySummary) -> fmt::Result {
    writeln!(out, "query: {query}")?;
    writeln!(
        out,
        "  documents total: {} ({} relevant)",
        summary.total_documents, summary.relevant_documents
    )?;
    writeln!(
        out,
        "  documents retrieved: {} ({} relevant)",
        summary.retrieved, summary.relevant_retrieved
    )?;
    writeln!(
        out,
        "  precision: {:.4}  recall: {:.4}",
        summary.precision, summary.recall
    )?;
    if !summary.top_hits.is_empty() {
        writeln!(out, "  top {} results:", summary.top_hits.len())?;
        for hit in &summary.top_hits {
            let mark = if hit.relevant { '+' } else { '-' };
            writeln!(
                out,
                "    {:>3}. {mark} {} | score: {:.4}",
                hit.rank, hit.title, hit.score
            )?;
        }
    }
    writeln!(out, "  raw:          {}", format_values(summary.curves.raw.values()))?;
    writeln!(
        out,
        "  interpolated: {}",
        format_values(summary.curves.interpolated.values())
    )
}

fn write_config(out: &mut String, config: &ConfigReport) -> fmt::Result {
    writeln!(
        out,
        "Engine configuration: {} [{}]",
        config.label,
        config.config.code()
    )?;
    if let Some(failure) = &config.failure {
        return writeln!(out, "  FAILED: {failure}");
    }
    for query in &config.queries {
        match &query.outcome {
            QueryOutcome::Completed(summary) => {
                for line in render_query_summary(&query.query, summary).lines() {
                    writeln!(out, "  {line}")?;
                }
            }
            QueryOutcome::Failed { error } => {
                writeln!(out, "  query: {}\n    FAILED: {error}", query.query)?;
            }
        }
    }
    for kind in [CurveKind::Raw, CurveKind::Interpolated] {
        match config.averaged(kind) {
            Some(avg) => writeln!(
                out,
                "  average {kind} ({} queries): {}",
                avg.queries,
                format_values(avg.values())
            )?,
            None => writeln!(out, "  average {kind}: missing (no query completed)")?,
        }
    }
    Ok(())
}

/// Human-readable report: per-configuration detail, then the interpolated summary.
pub fn render_text(report: &EvalReport) -> String {
    into_string(|out| write_text(out, report))
}

fn write_text(out: &mut String, report: &EvalReport) -> fmt::Result {
    writeln!(
        out,
        "Evaluation of topic {} (depth {})\n",
        report.topic, report.depth
    )?;
    for config in &report.configs {
        write_config(out, config)?;
        out.push('\n');
    }

    writeln!(out, "Average precision values (interpolated) for all engines:")?;
    for config in &report.configs {
        let values = config
            .averaged(CurveKind::Interpolated)
            .map(|avg| format_values(avg.values()))
            .unwrap_or_else(|| "missing".to_string());
        writeln!(out, "{} {values}", config.config.code())?;
    }
    Ok(())
}

fn write_csv_row(
    out: &mut String,
    code: &str,
    kind: CurveKind,
    queries: usize,
    curve: Option<&ElevenPointCurve>,
) -> fmt::Result {
    write!(out, "{code},{kind},{queries}")?;
    match curve {
        Some(curve) => {
            for v in curve.values() {
                write!(out, ",{v:.6}")?;
            }
        }
        None => out.push_str(&",".repeat(CURVE_POINTS)),
    }
    writeln!(out)
}

/// CSV: `config,variant,queries,r0.0..r1.0`.
pub fn render_csv(report: &EvalReport) -> String {
    into_string(|out| write_csv(out, report))
}

fn write_csv(out: &mut String, report: &EvalReport) -> fmt::Result {
    out.push_str("config,variant,queries");
    for level in recall_levels() {
        write!(out, ",r{level:.1}")?;
    }
    writeln!(out)?;

    for config in &report.configs {
        let code = config.config.code();
        for kind in [CurveKind::Raw, CurveKind::Interpolated] {
            let avg = config.averaged(kind);
            write_csv_row(
                out,
                &code,
                kind,
                avg.map_or(0, |a| a.queries),
                avg.map(|a| &a.curve),
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EvalPlan, PipelineConfig};
    use crate::corpus::Document;
    use crate::eval::Evaluator;
    use crate::search::LexicalSearch;

    fn report() -> EvalReport {
        let docs = vec![
            Document::new("CLIR", "cross language information retrieval", 5, true),
            Document::new("Cooking", "information about cooking", 1, false),
        ];
        let plan = EvalPlan {
            queries: vec!["information retrieval".into(), "\"broken".into()],
            engines: vec![
                PipelineConfig::from_code("211").unwrap(),
                PipelineConfig::from_code("100").unwrap(),
            ],
            ..EvalPlan::default()
        };
        Evaluator::new(&LexicalSearch, &docs).run(&plan)
    }

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn text_shows_failures_inline_and_summary() {
        let text = render(&report(), ReportFormat::Text).unwrap();
        assert!(text.contains("Engine configuration: ranking:BM25, stemming:YES, stopwords:YES [211]"));
        assert!(text.contains("+ CLIR"));
        assert!(text.contains("FAILED: query parse error"));
        assert!(text.contains("Average precision values (interpolated) for all engines:"));
        assert!(text.contains("211 [1.0000"));
    }

    #[test]
    fn csv_has_header_and_two_rows_per_config() {
        let csv = render(&report(), ReportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1 + 2 * 2);
        assert!(lines[0].starts_with("config,variant,queries,r0.0,r0.1"));
        assert!(lines[0].ends_with("r1.0"));
        assert!(lines[1].starts_with("211,raw,1,"));
        assert!(lines[2].starts_with("211,interpolated,1,"));
        assert_eq!(lines[1].split(',').count(), 3 + 11);
    }

    #[test]
    fn json_serializes_codes_and_outcomes() {
        let json = render(&report(), ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["configs"][0]["config"], "211");
        assert_eq!(value["configs"][0]["queries"][0]["outcome"]["status"], "completed");
        assert_eq!(value["configs"][0]["queries"][1]["outcome"]["status"], "failed");
        assert_eq!(
            value["configs"][0]["interpolated"]["curve"]
                .as_array()
                .unwrap()
                .len(),
            11
        );
    }
}
