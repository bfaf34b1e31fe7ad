use std::fmt::Write as _;

use serde::Serialize;
use serde_json::json;
use statlens_core::{AnalysisReport, PipelineError, Ticker, Tone};

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render_report(
    report: &AnalysisReport,
    format: OutputFormat,
    pretty: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => to_json(report, pretty),
        OutputFormat::Table => Ok(report_table(report)),
    }
}

pub fn render_resolution(
    query: &str,
    ticker: &Ticker,
    format: OutputFormat,
    pretty: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => to_json(
            &json!({
                "query": query,
                "ticker": ticker,
                "base": ticker.base(),
                "suffix": ticker.suffix().as_str(),
            }),
            pretty,
        ),
        OutputFormat::Table => Ok(format!("{query} -> {ticker}")),
    }
}

/// Single-line error used by `session` so each input line gets one answer.
pub fn render_error(query: &str, error: &PipelineError, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json!({
            "query": query,
            "error": {
                "code": error.code(),
                "message": error.to_string(),
            },
        })
        .to_string(),
        OutputFormat::Table => format!("error: {query}: {error}"),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(payload)
}

fn report_table(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", report.ticker, report.granularity);

    let metric_width = report
        .rows
        .iter()
        .map(|row| row.metric.chars().count())
        .chain(std::iter::once("Metric".len()))
        .max()
        .unwrap_or_default();
    let column_widths: Vec<usize> = report
        .periods
        .iter()
        .enumerate()
        .map(|(index, period)| {
            report
                .rows
                .iter()
                .filter_map(|row| row.values.get(index))
                .map(|value| value.chars().count())
                .chain(std::iter::once(period.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut header = format!("{:<metric_width$}", "Metric");
    for (period, width) in report.periods.iter().zip(column_widths.iter().copied()) {
        let _ = write!(header, " | {period:>width$}");
    }
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "{}", "-".repeat(header.chars().count()));

    for row in &report.rows {
        let mut line = format!("{:<metric_width$}", row.metric);
        for (value, width) in row.values.iter().zip(column_widths.iter().copied()) {
            let _ = write!(line, " | {value:>width$}");
        }
        let _ = writeln!(out, "{line}");
    }

    let summary = &report.summary;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Growth over {} periods: revenue {}, operating profit {}, PAT {}",
        report.periods.len(),
        summary.revenue_growth,
        summary.operating_profit_growth,
        summary.pat_growth
    );
    let _ = writeln!(
        out,
        "Latest revenue {}, latest PAT {}",
        summary.latest_revenue, summary.latest_pat
    );

    for observation in &report.commentary {
        let _ = writeln!(out, "[{}] {}", tone_tag(observation.tone), observation.message);
    }

    out.trim_end().to_owned()
}

const fn tone_tag(tone: Tone) -> &'static str {
    match tone {
        Tone::Positive => "+",
        Tone::Neutral => "=",
        Tone::Negative => "-",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use statlens_core::{Analyzer, AnalyzerConfig, Granularity, YahooAdapter};

    async fn mock_report() -> AnalysisReport {
        Analyzer::new(Arc::new(YahooAdapter::default()), AnalyzerConfig::default())
            .analyze("reliance", Granularity::Annual)
            .await
            .expect("mock catalog covers reliance")
    }

    #[tokio::test]
    async fn table_lists_every_metric_under_period_headers() {
        let report = mock_report().await;
        let table = render_report(&report, OutputFormat::Table, false).expect("renders");
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "RELIANCE.NS (annual)");
        assert!(lines[1].starts_with("Metric"));
        for period in &report.periods {
            assert!(lines[1].contains(period.as_str()));
        }
        for metric in statlens_core::report::TABLE_METRICS {
            assert!(lines.iter().any(|line| line.starts_with(metric)), "{metric}");
        }
        assert!(table.contains("Growth over 4 periods"));
    }

    #[tokio::test]
    async fn json_output_is_the_serialized_report() {
        let report = mock_report().await;
        let compact = render_report(&report, OutputFormat::Json, false).expect("renders");
        let parsed: serde_json::Value = serde_json::from_str(&compact).expect("valid json");
        assert_eq!(parsed["ticker"], "RELIANCE.NS");
        assert_eq!(parsed["rows"].as_array().map(Vec::len), Some(7));

        let pretty = render_report(&report, OutputFormat::Json, true).expect("renders");
        assert!(pretty.contains('\n'));
    }

    #[test]
    fn errors_render_on_one_line() {
        let error = PipelineError::SymbolNotFound {
            ticker: String::from("NOPE.NS"),
        };
        let line = render_error("nope", &error, OutputFormat::Json);
        assert!(!line.contains('\n'));
        assert!(line.contains("pipeline.symbol_not_found"));

        let text = render_error("nope", &error, OutputFormat::Table);
        assert!(text.starts_with("error: nope:"));
    }
}
