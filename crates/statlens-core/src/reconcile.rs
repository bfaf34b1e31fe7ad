//! Canonical line items from inconsistently labelled provider statements.
//!
//! The reconciler picks the first alias present for each [`Concept`], selects
//! the most recent [`PERIOD_WINDOW`] columns by period end date and emits one
//! [`ReconciledPeriodRecord`] per column, oldest first. Any required value
//! that cannot be found fails the whole reconciliation.

use serde::Serialize;
use tracing::{debug, warn};

use crate::{Concept, Granularity, PeriodEnd, PipelineError, RawStatement, StatementRow};

/// Number of most recent periods kept.
pub const PERIOD_WINDOW: usize = 4;

/// Where a period's share count came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "label")]
pub enum SharesSource {
    BalanceSheet(String),
    Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledPeriodRecord {
    pub period_end: PeriodEnd,
    pub label: String,
    pub revenue: f64,
    pub operating_profit: Option<f64>,
    pub pbt: f64,
    pub pat: f64,
    pub shares_outstanding: f64,
    pub shares_source: SharesSource,
}

/// Provider labels the income concepts resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLabels {
    pub revenue: String,
    pub operating_profit: Option<String>,
    pub pbt: String,
    pub pat: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub granularity: Granularity,
    /// Oldest first.
    pub records: Vec<ReconciledPeriodRecord>,
    pub operating_profit_available: bool,
    pub labels: ResolvedLabels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldReconciler {
    granularity: Granularity,
    window: usize,
}

impl FieldReconciler {
    pub const fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            window: PERIOD_WINDOW,
        }
    }

    pub fn reconcile(
        &self,
        income: &RawStatement,
        balance: &RawStatement,
        profile_shares: Option<f64>,
    ) -> Result<Reconciliation, PipelineError> {
        if income.is_empty() {
            return Err(PipelineError::EmptyStatement);
        }

        let revenue = required_row(income, Concept::Revenue)?;
        let operating = Concept::OperatingProfit.alias().resolve(income);
        if operating.is_none() {
            debug!(target: "statlens::reconcile", "operating profit not reported; series marked unavailable");
        }
        let pbt = required_row(income, Concept::Pbt)?;
        let pat = required_row(income, Concept::Pat)?;

        let profile_shares = profile_shares.filter(|shares| shares.is_finite() && *shares > 0.0);
        let mut warned_profile = false;
        let mut records = Vec::with_capacity(self.window);

        for (period_end, column) in self.select_columns(income) {
            let revenue_value = required_cell(revenue, column, Concept::Revenue)?;
            let pbt_value = required_cell(pbt, column, Concept::Pbt)?;
            let pat_value = required_cell(pat, column, Concept::Pat)?;

            let (shares_outstanding, shares_source) = match balance_shares(balance, period_end) {
                Some((shares, label)) => (shares, SharesSource::BalanceSheet(label.to_owned())),
                None => {
                    let shares =
                        profile_shares.ok_or(PipelineError::SharesOutstandingUnavailable)?;
                    if !warned_profile {
                        warn!(
                            target: "statlens::reconcile",
                            %period_end,
                            "balance sheet has no usable share count; using profile figure"
                        );
                        warned_profile = true;
                    }
                    (shares, SharesSource::Profile)
                }
            };

            records.push(ReconciledPeriodRecord {
                period_end,
                label: self.granularity.period_label(period_end),
                revenue: revenue_value,
                operating_profit: operating.and_then(|row| row.value(column)),
                pbt: pbt_value,
                pat: pat_value,
                shares_outstanding,
                shares_source,
            });
        }

        Ok(Reconciliation {
            granularity: self.granularity,
            records,
            operating_profit_available: operating.is_some(),
            labels: ResolvedLabels {
                revenue: revenue.label.clone(),
                operating_profit: operating.map(|row| row.label.clone()),
                pbt: pbt.label.clone(),
                pat: pat.label.clone(),
            },
        })
    }

    /// Most recent `window` columns as `(period, column index)`, oldest first.
    fn select_columns(&self, income: &RawStatement) -> Vec<(PeriodEnd, usize)> {
        let mut columns: Vec<(PeriodEnd, usize)> = income
            .periods()
            .iter()
            .copied()
            .enumerate()
            .map(|(index, period)| (period, index))
            .collect();
        columns.sort_by_key(|(period, _)| *period);
        let start = columns.len().saturating_sub(self.window);
        columns.split_off(start)
    }
}

fn required_row(income: &RawStatement, concept: Concept) -> Result<&StatementRow, PipelineError> {
    let row = concept
        .alias()
        .resolve(income)
        .ok_or(PipelineError::MissingConcept(concept))?;
    debug!(target: "statlens::reconcile", %concept, label = %row.label, "resolved concept");
    Ok(row)
}

fn required_cell(row: &StatementRow, column: usize, concept: Concept) -> Result<f64, PipelineError> {
    row.value(column)
        .ok_or(PipelineError::MissingConcept(concept))
}

/// First positive share count among the balance-sheet aliases for `period`.
fn balance_shares(balance: &RawStatement, period: PeriodEnd) -> Option<(f64, &'static str)> {
    let column = balance.column_index(period)?;
    Concept::SharesOutstanding
        .alias()
        .labels
        .iter()
        .find_map(|label| {
            balance
                .row(label)
                .and_then(|row| row.value(column))
                .filter(|shares| *shares > 0.0)
                .map(|shares| (shares, *label))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periods(raw: &[&str]) -> Vec<PeriodEnd> {
        raw.iter()
            .map(|value| PeriodEnd::parse(value).expect("valid date"))
            .collect()
    }

    fn income() -> RawStatement {
        RawStatement::new(periods(&["2023-03-31", "2024-03-31"]))
            .with_values("Total Revenue", &[100.0, 120.0])
            .and_then(|s| s.with_values("Pretax Income", &[8.0, 12.0]))
            .and_then(|s| s.with_values("Net Income", &[6.0, 9.0]))
            .expect("rows fit")
    }

    #[test]
    fn missing_operating_row_is_not_fatal() {
        let balance = RawStatement::new(periods(&["2023-03-31", "2024-03-31"]))
            .with_values("Ordinary Shares Number", &[1.0e6, 1.0e6])
            .expect("row fits");

        let result = FieldReconciler::new(Granularity::Annual)
            .reconcile(&income(), &balance, None)
            .expect("reconciles");

        assert!(!result.operating_profit_available);
        assert!(result.records.iter().all(|r| r.operating_profit.is_none()));
        assert_eq!(result.labels.operating_profit, None);
        assert_eq!(result.records[1].label, "2024");
    }

    #[test]
    fn empty_income_statement_fails_first() {
        let error = FieldReconciler::new(Granularity::Annual)
            .reconcile(&RawStatement::default(), &RawStatement::default(), None)
            .expect_err("empty");
        assert_eq!(error, PipelineError::EmptyStatement);
    }

    #[test]
    fn pbt_is_checked_before_pat() {
        let statement = RawStatement::new(periods(&["2024-03-31"]))
            .with_values("Revenue", &[1.0])
            .expect("row fits");
        let error = FieldReconciler::new(Granularity::Annual)
            .reconcile(&statement, &RawStatement::default(), Some(1.0))
            .expect_err("pbt missing");
        assert_eq!(error, PipelineError::MissingConcept(Concept::Pbt));
    }

    #[test]
    fn missing_required_cell_fails_without_partial_output() {
        let statement = RawStatement::new(periods(&["2023-03-31", "2024-03-31"]))
            .with_values("Total Revenue", &[100.0, 120.0])
            .and_then(|s| s.with_values("Pretax Income", &[8.0, 12.0]))
            .and_then(|s| s.with_row("Net Income", vec![Some(6.0), None]))
            .expect("rows fit");
        let error = FieldReconciler::new(Granularity::Annual)
            .reconcile(&statement, &RawStatement::default(), Some(1.0e6))
            .expect_err("pat cell missing");
        assert_eq!(error, PipelineError::MissingConcept(Concept::Pat));
    }

    #[test]
    fn quarterly_labels_use_month_and_year() {
        let result = FieldReconciler::new(Granularity::Quarterly)
            .reconcile(&income(), &RawStatement::default(), Some(5.0e6))
            .expect("reconciles");
        let labels: Vec<&str> = result.records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Mar-2023", "Mar-2024"]);
        assert!(result
            .records
            .iter()
            .all(|r| r.shares_source == SharesSource::Profile));
    }
}
