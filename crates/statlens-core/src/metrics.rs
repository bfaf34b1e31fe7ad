//! Derived per-period ratios and endpoint growth.

use serde::Serialize;

use crate::reconcile::{ReconciledPeriodRecord, Reconciliation};
use crate::PeriodEnd;

/// Share counts are expressed in millions when computing EPS.
pub const SHARE_SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodMetrics {
    pub period_end: PeriodEnd,
    pub label: String,
    pub eps: f64,
    /// `None` when operating profit is unavailable or revenue is zero.
    pub opm_percent: Option<f64>,
    pub eps_growth_percent: f64,
}

/// Simple (latest − earliest) / |earliest| growth over the whole window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthSummary {
    pub revenue_percent: f64,
    pub operating_profit_percent: Option<f64>,
    pub pat_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    /// Aligned 1:1 with the reconciled records, oldest first.
    pub periods: Vec<PeriodMetrics>,
    pub summary: GrowthSummary,
}

impl DerivedMetrics {
    pub fn latest(&self) -> Option<&PeriodMetrics> {
        self.periods.last()
    }
}

pub fn derive(reconciliation: &Reconciliation) -> DerivedMetrics {
    let records = &reconciliation.records;
    let mut periods: Vec<PeriodMetrics> = Vec::with_capacity(records.len());

    for record in records {
        let eps = eps(record);
        let eps_growth_percent = periods
            .last()
            .map_or(0.0, |previous| growth_percent(previous.eps, eps));
        periods.push(PeriodMetrics {
            period_end: record.period_end,
            label: record.label.clone(),
            eps,
            opm_percent: opm_percent(record),
            eps_growth_percent,
        });
    }

    DerivedMetrics {
        periods,
        summary: summarize(reconciliation),
    }
}

/// `(latest - earliest) / |earliest| * 100`, or `0` when `earliest` is zero.
pub fn growth_percent(earliest: f64, latest: f64) -> f64 {
    if earliest == 0.0 {
        0.0
    } else {
        (latest - earliest) / earliest.abs() * 100.0
    }
}

fn eps(record: &ReconciledPeriodRecord) -> f64 {
    record.pat / (record.shares_outstanding / SHARE_SCALE)
}

fn opm_percent(record: &ReconciledPeriodRecord) -> Option<f64> {
    let operating = record.operating_profit?;
    if record.revenue == 0.0 {
        None
    } else {
        Some(operating / record.revenue * 100.0)
    }
}

fn summarize(reconciliation: &Reconciliation) -> GrowthSummary {
    let (Some(first), Some(last)) = (reconciliation.records.first(), reconciliation.records.last())
    else {
        return GrowthSummary {
            revenue_percent: 0.0,
            operating_profit_percent: None,
            pat_percent: 0.0,
        };
    };

    let operating_profit_percent = if reconciliation.operating_profit_available {
        first
            .operating_profit
            .zip(last.operating_profit)
            .map(|(earliest, latest)| growth_percent(earliest, latest))
    } else {
        None
    };

    GrowthSummary {
        revenue_percent: growth_percent(first.revenue, last.revenue),
        operating_profit_percent,
        pat_percent: growth_percent(first.pat, last.pat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{ResolvedLabels, SharesSource};
    use crate::Granularity;

    fn record(date: &str, revenue: f64, operating: Option<f64>, pat: f64, shares: f64) -> ReconciledPeriodRecord {
        let period_end = PeriodEnd::parse(date).expect("valid date");
        ReconciledPeriodRecord {
            period_end,
            label: Granularity::Annual.period_label(period_end),
            revenue,
            operating_profit: operating,
            pbt: pat,
            pat,
            shares_outstanding: shares,
            shares_source: SharesSource::Profile,
        }
    }

    fn reconciliation(records: Vec<ReconciledPeriodRecord>) -> Reconciliation {
        let operating_profit_available = records.iter().any(|r| r.operating_profit.is_some());
        Reconciliation {
            granularity: Granularity::Annual,
            records,
            operating_profit_available,
            labels: ResolvedLabels {
                revenue: String::from("Total Revenue"),
                operating_profit: None,
                pbt: String::from("Pretax Income"),
                pat: String::from("Net Income"),
            },
        }
    }

    #[test]
    fn eps_scales_shares_to_millions() {
        let derived = derive(&reconciliation(vec![record(
            "2024-03-31",
            100.0,
            Some(10.0),
            50_000_000.0,
            10_000_000.0,
        )]));
        assert_eq!(derived.periods[0].eps, 5_000_000.0);
        assert_eq!(derived.periods[0].eps_growth_percent, 0.0);
    }

    #[test]
    fn eps_growth_uses_absolute_baseline() {
        let derived = derive(&reconciliation(vec![
            record("2022-03-31", 100.0, None, -2.0, 1.0e6),
            record("2023-03-31", 100.0, None, 1.0, 1.0e6),
            record("2024-03-31", 100.0, None, 0.0, 1.0e6),
            record("2025-03-31", 100.0, None, 4.0, 1.0e6),
        ]));
        let growth: Vec<f64> = derived.periods.iter().map(|p| p.eps_growth_percent).collect();
        assert_eq!(growth, vec![0.0, 150.0, -100.0, 0.0]);
    }

    #[test]
    fn opm_is_unavailable_for_zero_revenue_or_missing_operating() {
        let derived = derive(&reconciliation(vec![
            record("2023-03-31", 0.0, Some(5.0), 1.0, 1.0e6),
            record("2024-03-31", 200.0, None, 1.0, 1.0e6),
        ]));
        assert_eq!(derived.periods[0].opm_percent, None);
        assert_eq!(derived.periods[1].opm_percent, None);
    }

    #[test]
    fn summary_is_simple_endpoint_delta() {
        let derived = derive(&reconciliation(vec![
            record("2021-03-31", 100.0, Some(10.0), 6.0, 1.0e6),
            record("2022-03-31", 120.0, Some(15.0), 9.0, 1.0e6),
            record("2023-03-31", 150.0, Some(20.0), 14.0, 1.0e6),
            record("2024-03-31", 180.0, Some(25.0), 17.0, 1.0e6),
        ]));
        assert!((derived.summary.revenue_percent - 80.0).abs() < 1e-9);
        assert_eq!(derived.summary.operating_profit_percent, Some(150.0));
        assert!((derived.summary.pat_percent - 183.333_333).abs() < 1e-3);
    }

    #[test]
    fn zero_baseline_growth_is_zero() {
        assert_eq!(growth_percent(0.0, 50.0), 0.0);
        assert_eq!(growth_percent(-50.0, -25.0), 50.0);
    }
}
