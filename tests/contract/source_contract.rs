use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use statlens_core::{
    Granularity, PipelineError, SourceErrorKind, StatementBundle, StatementRequest,
    StatementSource, StaticSource, Ticker, YahooAdapter,
};

const KNOWN: [&str; 4] = ["RELIANCE.NS", "TCS.NS", "INFY.NS", "HDFCBANK.NS"];
const GRANULARITIES: [Granularity; 2] = [Granularity::Annual, Granularity::Quarterly];

struct SourceCase {
    name: &'static str,
    source: Arc<dyn StatementSource>,
}

fn request(symbol: &str, granularity: Granularity) -> StatementRequest {
    StatementRequest::new(Ticker::parse(symbol).expect("valid ticker"), granularity)
}

/// Mock Yahoo bundles, also written to a JSON fixture and reloaded.
async fn source_cases() -> (Vec<SourceCase>, tempfile::NamedTempFile) {
    let yahoo = YahooAdapter::default();
    let mut bundles: Vec<StatementBundle> = Vec::new();
    for symbol in KNOWN {
        for granularity in GRANULARITIES {
            bundles.push(
                yahoo
                    .fetch(request(symbol, granularity))
                    .await
                    .expect("mock catalog entry"),
            );
        }
    }

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    let payload = serde_json::to_string(&bundles).expect("bundles serialize");
    file.write_all(payload.as_bytes()).expect("fixture written");
    let fixture = StaticSource::from_path(file.path()).expect("fixture loads");
    assert_eq!(fixture.len(), KNOWN.len() * GRANULARITIES.len());

    let cases = vec![
        SourceCase {
            name: "yahoo-mock",
            source: Arc::new(yahoo),
        },
        SourceCase {
            name: "static-fixture",
            source: Arc::new(fixture),
        },
    ];
    (cases, file)
}

#[tokio::test]
async fn bundles_match_the_request_and_carry_usable_statements() {
    let (cases, _file) = source_cases().await;

    for case in &cases {
        for symbol in KNOWN {
            for granularity in GRANULARITIES {
                let bundle = case
                    .source
                    .fetch(request(symbol, granularity))
                    .await
                    .unwrap_or_else(|error| panic!("{} {symbol}: {error}", case.name));

                assert_eq!(bundle.ticker.as_str(), symbol, "{}", case.name);
                assert_eq!(bundle.granularity, granularity, "{}", case.name);
                assert!(bundle.listed, "{} {symbol}", case.name);
                assert!(!bundle.income_statement.is_empty(), "{} {symbol}", case.name);

                let periods = bundle.income_statement.periods();
                let unique: HashSet<_> = periods.iter().collect();
                assert_eq!(unique.len(), periods.len(), "{} {symbol}: duplicate periods", case.name);
                for row in bundle.income_statement.rows() {
                    assert_eq!(row.values.len(), periods.len(), "{} {}", case.name, row.label);
                }

                let has_balance_shares = !bundle.balance_sheet.is_empty();
                assert!(
                    has_balance_shares || bundle.shares_outstanding.is_some(),
                    "{} {symbol}: no share count source",
                    case.name
                );
            }
        }
    }
}

#[tokio::test]
async fn unknown_symbols_are_reported_as_not_found() {
    let (cases, _file) = source_cases().await;

    for case in &cases {
        let result = case
            .source
            .fetch(request("NOSUCHCO.NS", Granularity::Annual))
            .await;
        match result {
            Ok(bundle) => assert!(!bundle.listed, "{}: unknown symbol listed", case.name),
            Err(error) => {
                assert_eq!(error.kind(), SourceErrorKind::SymbolNotFound, "{}", case.name);
                assert!(!error.retryable());
                let mapped = PipelineError::from_source(error, "NOSUCHCO.NS");
                assert_eq!(
                    mapped,
                    PipelineError::SymbolNotFound {
                        ticker: String::from("NOSUCHCO.NS")
                    }
                );
            }
        }
    }
}

#[tokio::test]
async fn repeated_fetches_return_identical_bundles() {
    let (cases, _file) = source_cases().await;

    for case in &cases {
        let first = case
            .source
            .fetch(request("INFY.NS", Granularity::Quarterly))
            .await
            .expect("first fetch");
        let second = case
            .source
            .fetch(request("INFY.NS", Granularity::Quarterly))
            .await
            .expect("second fetch");
        assert_eq!(first, second, "{}", case.name);
    }
}

#[test]
fn malformed_fixtures_are_invalid_responses() {
    let error = StaticSource::from_json_str(r#"[{"ticker":"TCS"}]"#).expect_err("bad ticker");
    assert_eq!(error.kind(), SourceErrorKind::InvalidResponse);

    let error = StaticSource::from_json_str("not json").expect_err("not json");
    assert_eq!(error.code(), "source.invalid_response");
}
