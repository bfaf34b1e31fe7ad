//! Behavior-driven tests for the end-to-end analysis pipeline.
//!
//! These tests drive the [`Analyzer`] over fixture statements and check the
//! reconciled periods, derived metrics and formatted report it produces.

use std::sync::Arc;

use statlens_core::report::{METRIC_EPS, METRIC_EPS_GROWTH, METRIC_OPM, METRIC_REVENUE};
use statlens_core::{
    Analyzer, AnalyzerConfig, Concept, Granularity, PeriodEnd, PipelineError, RawStatement,
    StatementBundle, StaticSource, Ticker,
};

fn periods(raw: &[&str]) -> Vec<PeriodEnd> {
    raw.iter()
        .map(|value| PeriodEnd::parse(value).expect("valid date"))
        .collect()
}

const ASCENDING: [&str; 4] = ["2021-03-31", "2022-03-31", "2023-03-31", "2024-03-31"];

fn scenario_a_income(dates: &[&str], rows: &[(&str, [f64; 4])]) -> RawStatement {
    rows.iter()
        .try_fold(RawStatement::new(periods(dates)), |statement, (label, values)| {
            statement.with_values(*label, values)
        })
        .expect("rows fit")
}

fn scenario_a_bundle() -> StatementBundle {
    let income = scenario_a_income(
        &ASCENDING,
        &[
            ("Total Revenue", [100.0, 120.0, 150.0, 180.0]),
            ("Operating Income", [10.0, 15.0, 20.0, 25.0]),
            ("Pretax Income", [8.0, 12.0, 18.0, 22.0]),
            ("Net Income", [6.0, 9.0, 14.0, 17.0]),
        ],
    );
    let balance = RawStatement::new(periods(&ASCENDING))
        .with_values("Ordinary Shares Number", &[1.0e6; 4])
        .expect("row fits");
    StatementBundle::new(
        Ticker::parse("ACME.NS").expect("valid ticker"),
        Granularity::Annual,
        income,
        balance,
    )
}

fn analyzer_for(bundle: StatementBundle) -> (Analyzer, Arc<StaticSource>) {
    let source = Arc::new(StaticSource::new().with_bundle(bundle));
    let analyzer = Analyzer::new(source.clone(), AnalyzerConfig::default());
    (analyzer, source)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected}, got {actual}"
    );
}

// =============================================================================
// Scenario A: complete statements
// =============================================================================

#[tokio::test]
async fn complete_statements_produce_four_periods_oldest_first() {
    // Given: four annual columns with every concept reported
    let (analyzer, _) = analyzer_for(scenario_a_bundle());

    // When: the company is analyzed
    let report = analyzer
        .analyze("acme", Granularity::Annual)
        .await
        .expect("scenario A reconciles");

    // Then: periods run oldest to newest
    assert_eq!(report.ticker.as_str(), "ACME.NS");
    assert_eq!(report.periods, vec!["2021", "2022", "2023", "2024"]);
    assert_eq!(report.period_ends, periods(&ASCENDING));

    // And: OPM% follows operating profit over revenue
    let opm: Vec<f64> = report
        .series
        .opm_percent
        .iter()
        .map(|value| value.expect("operating profit reported"))
        .collect();
    for (actual, expected) in opm.iter().zip([10.0, 12.5, 13.33, 13.89]) {
        assert_close(*actual, expected);
    }

    // And: EPS uses the share count in millions and growth starts at zero
    assert_eq!(report.series.eps, vec![6.0, 9.0, 14.0, 17.0]);
    assert_eq!(report.series.eps_growth_percent[0], 0.0);
    assert_close(report.series.eps_growth_percent[1], 50.0);
    assert_close(report.series.eps_growth_percent[2], 55.56);
    assert_close(report.series.eps_growth_percent[3], 21.43);
}

#[tokio::test]
async fn complete_statements_format_every_table_row() {
    let (analyzer, _) = analyzer_for(scenario_a_bundle());
    let report = analyzer
        .analyze("ACME.NS", Granularity::Annual)
        .await
        .expect("scenario A reconciles");

    let values = |metric: &str| {
        report
            .row(metric)
            .map(|row| row.values.clone())
            .expect("row present")
    };
    assert_eq!(values(METRIC_REVENUE), vec!["₹100.00", "₹120.00", "₹150.00", "₹180.00"]);
    assert_eq!(values(METRIC_OPM), vec!["10.0%", "12.5%", "13.3%", "13.9%"]);
    assert_eq!(values(METRIC_EPS), vec!["₹6.00", "₹9.00", "₹14.00", "₹17.00"]);
    assert_eq!(values(METRIC_EPS_GROWTH), vec!["0.0%", "50.0%", "55.6%", "21.4%"]);

    // Endpoint growth: (180 - 100) / 100
    assert_close(report.summary.revenue_growth_percent, 80.0);
    assert_eq!(report.summary.revenue_growth, "80.0%");
    assert_eq!(report.summary.operating_profit_growth, "150.0%");
    assert_eq!(report.summary.pat_growth, "183.3%");
    assert!(report.operating_profit_available);
}

#[tokio::test]
async fn newest_first_columns_reconcile_to_the_same_report() {
    // Given: the scenario A data with columns in provider order (newest first)
    let descending = ["2024-03-31", "2023-03-31", "2022-03-31", "2021-03-31"];
    let income = scenario_a_income(
        &descending,
        &[
            ("Total Revenue", [180.0, 150.0, 120.0, 100.0]),
            ("Operating Income", [25.0, 20.0, 15.0, 10.0]),
            ("Pretax Income", [22.0, 18.0, 12.0, 8.0]),
            ("Net Income", [17.0, 14.0, 9.0, 6.0]),
        ],
    );
    let balance = RawStatement::new(periods(&descending))
        .with_values("Ordinary Shares Number", &[1.0e6; 4])
        .expect("row fits");
    let reversed = StatementBundle::new(
        Ticker::parse("ACME.NS").expect("valid ticker"),
        Granularity::Annual,
        income,
        balance,
    );

    // When: both orderings are analyzed
    let (forward, _) = analyzer_for(scenario_a_bundle());
    let (backward, _) = analyzer_for(reversed);
    let expected = forward.analyze("acme", Granularity::Annual).await.expect("forward");
    let actual = backward.analyze("acme", Granularity::Annual).await.expect("backward");

    // Then: the reports are identical
    assert_eq!(actual, expected);
}

// =============================================================================
// Scenario B and C: missing inputs
// =============================================================================

#[tokio::test]
async fn missing_revenue_fails_without_a_report() {
    // Given: an income statement without any revenue alias
    let income = scenario_a_income(
        &ASCENDING,
        &[
            ("Gross Profit", [50.0, 60.0, 70.0, 80.0]),
            ("Pretax Income", [8.0, 12.0, 18.0, 22.0]),
            ("Net Income", [6.0, 9.0, 14.0, 17.0]),
        ],
    );
    let mut bundle = scenario_a_bundle();
    bundle.income_statement = income;
    let (analyzer, _) = analyzer_for(bundle);

    // When / Then: the pipeline reports the missing concept
    let error = analyzer
        .analyze("acme", Granularity::Annual)
        .await
        .expect_err("revenue is required");
    assert_eq!(error, PipelineError::MissingConcept(Concept::Revenue));
    assert_eq!(error.to_string(), "Revenue data not available");
}

#[tokio::test]
async fn missing_share_counts_without_profile_fallback_fail() {
    // Given: a balance sheet with no share rows and no profile figure
    let mut bundle = scenario_a_bundle();
    bundle.balance_sheet = RawStatement::new(periods(&ASCENDING))
        .with_values("Total Assets", &[1.0e9; 4])
        .expect("row fits");
    bundle.shares_outstanding = None;
    let (analyzer, _) = analyzer_for(bundle);

    // When / Then
    let error = analyzer
        .analyze("acme", Granularity::Annual)
        .await
        .expect_err("shares are required for EPS");
    assert_eq!(error, PipelineError::SharesOutstandingUnavailable);
}

#[tokio::test]
async fn missing_operating_profit_marks_the_series_unavailable() {
    let mut bundle = scenario_a_bundle();
    bundle.income_statement = scenario_a_income(
        &ASCENDING,
        &[
            ("Total Revenue", [100.0, 120.0, 150.0, 180.0]),
            ("Pretax Income", [8.0, 12.0, 18.0, 22.0]),
            ("Net Income", [6.0, 9.0, 14.0, 17.0]),
        ],
    );
    let (analyzer, _) = analyzer_for(bundle);

    let report = analyzer
        .analyze("acme", Granularity::Annual)
        .await
        .expect("operating profit is optional");
    assert!(!report.operating_profit_available);
    assert_eq!(report.series.opm_percent, vec![None; 4]);
    assert_eq!(
        report.row(METRIC_OPM).map(|row| row.values.clone()),
        Some(vec![String::from("N/A"); 4])
    );
    assert_eq!(report.summary.operating_profit_growth_percent, None);
}

// =============================================================================
// Idempotence
// =============================================================================

#[tokio::test]
async fn repeated_runs_over_cached_inputs_serialize_identically() {
    // Given: one analyzer whose cache serves the second run
    let (analyzer, source) = analyzer_for(scenario_a_bundle());

    // When: the same query runs twice
    let first = analyzer.analyze("acme", Granularity::Annual).await.expect("first");
    let second = analyzer.analyze("acme", Granularity::Annual).await.expect("second");

    // Then: the second run was a cache hit and output bytes match
    assert_eq!(source.fetch_count(), 1);
    let first = serde_json::to_string(&first).expect("serializes");
    let second = serde_json::to_string(&second).expect("serializes");
    assert_eq!(first, second);
}

#[tokio::test]
async fn mock_provider_output_is_deterministic_across_analyzers() {
    let run = || async {
        let analyzer = Analyzer::new(
            Arc::new(statlens_core::YahooAdapter::default()),
            AnalyzerConfig::default(),
        );
        let report = analyzer
            .analyze("tata consultancy services", Granularity::Quarterly)
            .await
            .expect("mock catalog covers TCS");
        serde_json::to_string(&report).expect("serializes")
    };

    let first = run().await;
    let second = run().await;
    assert_eq!(first, second);
    assert!(first.contains(r#""ticker":"TCS.NS""#));
}
