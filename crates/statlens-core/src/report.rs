//! Presentation-ready analysis output.

use serde::Serialize;

use crate::commentary::Observation;
use crate::format::{
    format_currency, format_eps, format_optional_currency, format_optional_percent,
    format_percent, to_crores,
};
use crate::metrics::DerivedMetrics;
use crate::reconcile::{Reconciliation, ResolvedLabels};
use crate::{Granularity, PeriodEnd, Ticker};

pub const METRIC_REVENUE: &str = "Revenue";
pub const METRIC_OPERATING_PROFIT: &str = "Operating Profit";
pub const METRIC_PBT: &str = "PBT";
pub const METRIC_PAT: &str = "PAT";
pub const METRIC_EPS: &str = "EPS";
pub const METRIC_OPM: &str = "OPM%";
pub const METRIC_EPS_GROWTH: &str = "EPS Growth%";

/// Table row order.
pub const TABLE_METRICS: [&str; 7] = [
    METRIC_REVENUE,
    METRIC_OPERATING_PROFIT,
    METRIC_PBT,
    METRIC_PAT,
    METRIC_EPS,
    METRIC_OPM,
    METRIC_EPS_GROWTH,
];

/// One formatted table row; `values[i]` belongs to `periods[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub metric: &'static str,
    pub values: Vec<String>,
}

/// Raw numeric series for charting, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub revenue: Vec<f64>,
    pub operating_profit: Vec<Option<f64>>,
    pub pbt: Vec<f64>,
    pub pat: Vec<f64>,
    pub eps: Vec<f64>,
    pub opm_percent: Vec<Option<f64>>,
    pub eps_growth_percent: Vec<f64>,
    pub revenue_crores: Vec<f64>,
    pub operating_profit_crores: Vec<Option<f64>>,
    pub pat_crores: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub revenue_growth_percent: f64,
    pub operating_profit_growth_percent: Option<f64>,
    pub pat_growth_percent: f64,
    pub revenue_growth: String,
    pub operating_profit_growth: String,
    pub pat_growth: String,
    pub latest_revenue: String,
    pub latest_pat: String,
}

/// Result of one successful analysis. Contains no timestamps or cache state
/// so identical inputs serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub query: String,
    pub ticker: Ticker,
    pub granularity: Granularity,
    pub periods: Vec<String>,
    pub period_ends: Vec<PeriodEnd>,
    pub operating_profit_available: bool,
    pub rows: Vec<ReportRow>,
    pub series: ChartSeries,
    pub summary: SummaryView,
    pub row_labels: ResolvedLabels,
    pub commentary: Vec<Observation>,
}

impl AnalysisReport {
    pub fn build(
        query: &str,
        ticker: Ticker,
        reconciliation: &Reconciliation,
        metrics: &DerivedMetrics,
        commentary: Vec<Observation>,
    ) -> Self {
        let records = &reconciliation.records;
        let series = ChartSeries {
            revenue: records.iter().map(|r| r.revenue).collect(),
            operating_profit: records.iter().map(|r| r.operating_profit).collect(),
            pbt: records.iter().map(|r| r.pbt).collect(),
            pat: records.iter().map(|r| r.pat).collect(),
            eps: metrics.periods.iter().map(|m| m.eps).collect(),
            opm_percent: metrics.periods.iter().map(|m| m.opm_percent).collect(),
            eps_growth_percent: metrics
                .periods
                .iter()
                .map(|m| m.eps_growth_percent)
                .collect(),
            revenue_crores: records.iter().map(|r| to_crores(r.revenue)).collect(),
            operating_profit_crores: records
                .iter()
                .map(|r| r.operating_profit.map(to_crores))
                .collect(),
            pat_crores: records.iter().map(|r| to_crores(r.pat)).collect(),
        };

        let rows = vec![
            row(METRIC_REVENUE, series.revenue.iter().copied().map(format_currency)),
            row(
                METRIC_OPERATING_PROFIT,
                series
                    .operating_profit
                    .iter()
                    .copied()
                    .map(format_optional_currency),
            ),
            row(METRIC_PBT, series.pbt.iter().copied().map(format_currency)),
            row(METRIC_PAT, series.pat.iter().copied().map(format_currency)),
            row(METRIC_EPS, series.eps.iter().copied().map(format_eps)),
            row(
                METRIC_OPM,
                series.opm_percent.iter().copied().map(format_optional_percent),
            ),
            row(
                METRIC_EPS_GROWTH,
                series.eps_growth_percent.iter().copied().map(format_percent),
            ),
        ];

        let growth = metrics.summary;
        let summary = SummaryView {
            revenue_growth_percent: growth.revenue_percent,
            operating_profit_growth_percent: growth.operating_profit_percent,
            pat_growth_percent: growth.pat_percent,
            revenue_growth: format_percent(growth.revenue_percent),
            operating_profit_growth: format_optional_percent(growth.operating_profit_percent),
            pat_growth: format_percent(growth.pat_percent),
            latest_revenue: format_optional_currency(records.last().map(|r| r.revenue)),
            latest_pat: format_optional_currency(records.last().map(|r| r.pat)),
        };

        Self {
            query: query.to_owned(),
            ticker,
            granularity: reconciliation.granularity,
            periods: records.iter().map(|r| r.label.clone()).collect(),
            period_ends: records.iter().map(|r| r.period_end).collect(),
            operating_profit_available: reconciliation.operating_profit_available,
            rows,
            series,
            summary,
            row_labels: reconciliation.labels.clone(),
            commentary,
        }
    }

    pub fn row(&self, metric: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|row| row.metric == metric)
    }
}

fn row(metric: &'static str, values: impl Iterator<Item = String>) -> ReportRow {
    ReportRow {
        metric,
        values: values.collect(),
    }
}
