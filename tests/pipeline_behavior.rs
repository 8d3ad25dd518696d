//! Behavior-driven tests for the hourly ingestion pipeline
//!
//! These tests drive the real Alpha Vantage client, parser and warehouse store
//! through a scripted HTTP transport, and check what ends up in the warehouse
//! and in the run outcome.

use candlewick_core::{
    run_pipeline, AlphaVantageClient, HttpClient, HttpError, HttpRequest, HttpResponse, Level,
    MemorySink, PipelineRunner, PipelineSettings, PriceObservation, ProviderPolicy, RecordStore,
    ResponseParser, RunnerConfig, Stage, StoreError, Warehouse,
};
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves a canned reply per symbol and records every request it sees.
#[derive(Default)]
struct ScriptedHttpClient {
    replies: HashMap<String, Result<HttpResponse, HttpError>>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedHttpClient {
    fn reply(mut self, symbol: &str, body: serde_json::Value) -> Self {
        self.replies
            .insert(symbol.to_string(), Ok(HttpResponse::ok_json(body.to_string())));
        self
    }

    fn fail(mut self, symbol: &str, error: HttpError) -> Self {
        self.replies.insert(symbol.to_string(), Err(error));
        self
    }

    fn status(mut self, symbol: &str, status: u16) -> Self {
        self.replies
            .insert(symbol.to_string(), Ok(HttpResponse::with_status(status, "")));
        self
    }

    fn requested_symbols(&self) -> Vec<String> {
        self.requested.lock().expect("request log").clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let symbol = request
            .url
            .split(['?', '&'])
            .find_map(|pair| pair.strip_prefix("symbol="))
            .unwrap_or_default()
            .to_string();
        self.requested.lock().expect("request log").push(symbol.clone());
        let reply = self
            .replies
            .get(&symbol)
            .cloned()
            .unwrap_or_else(|| Err(HttpError::new("no scripted reply")));
        Box::pin(async move { reply })
    }
}

fn series(symbol: &str, hours: &[(&str, &str)]) -> serde_json::Value {
    let mut entries = serde_json::Map::new();
    for (timestamp, close) in hours {
        entries.insert(
            (*timestamp).to_string(),
            json!({
                "1. open": "100.0000",
                "2. high": "101.0000",
                "3. low": "99.0000",
                "4. close": close,
                "5. volume": "1000"
            }),
        );
    }
    json!({
        "Meta Data": {
            "1. Information": "Intraday (60min) open, high, low, close prices and volume",
            "2. Symbol": symbol,
            "3. Last Refreshed": "2024-01-05 19:00:00",
            "4. Interval": "60min",
            "5. Output Size": "Compact",
            "6. Time Zone": "US/Eastern"
        },
        "Time Series (60min)": entries
    })
}

fn rate_limit_note() -> serde_json::Value {
    json!({
        "Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."
    })
}

struct Harness {
    runner: PipelineRunner,
    http: Arc<ScriptedHttpClient>,
    warehouse: Warehouse,
    diagnostics: Arc<MemorySink>,
}

fn settings(config: RunnerConfig) -> PipelineSettings {
    PipelineSettings {
        runner: config,
        timeout: Duration::from_secs(5),
        base_url: Some("https://alphavantage.test/query".to_string()),
    }
}

fn harness(http: ScriptedHttpClient, config: RunnerConfig) -> Harness {
    let http = Arc::new(http);
    let warehouse = Warehouse::open_in_memory().expect("warehouse");
    let diagnostics = Arc::new(MemorySink::new());
    let runner = PipelineRunner::alphavantage(
        http.clone(),
        warehouse.clone(),
        diagnostics.clone(),
        &settings(config),
    );
    Harness {
        runner,
        http,
        warehouse,
        diagnostics,
    }
}

/// Runner over the scripted provider with a caller-supplied store.
fn runner_with_store(
    http: ScriptedHttpClient,
    store: Arc<dyn RecordStore>,
    config: RunnerConfig,
) -> (PipelineRunner, Arc<MemorySink>) {
    let diagnostics = Arc::new(MemorySink::new());
    let provider = AlphaVantageClient::new(Arc::new(http), diagnostics.clone())
        .with_base_url("https://alphavantage.test/query");
    let runner = PipelineRunner::new(
        Arc::new(provider),
        ResponseParser::new(diagnostics.clone()),
        store,
        diagnostics.clone(),
        config,
    );
    (runner, diagnostics)
}

fn symbols(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

// =============================================================================
// Pipeline: End-to-end Scenario
// =============================================================================

#[tokio::test]
async fn when_one_symbol_is_rate_limited_the_other_is_still_stored() {
    // Given: AAPL returns two hourly entries and MSFT returns a rate-limit note
    let http = ScriptedHttpClient::default()
        .reply(
            "AAPL",
            series(
                "AAPL",
                &[
                    ("2024-01-05 18:00:00", "100.5000"),
                    ("2024-01-05 19:00:00", "100.7500"),
                ],
            ),
        )
        .reply("MSFT", rate_limit_note());
    let h = harness(http, RunnerConfig::default());

    // When: The pipeline runs for a lower-case, padded AAPL and MSFT
    let outcome = h.runner.run("demo-key", &symbols(&["aapl ", "MSFT"])).await;

    // Then: AAPL is normalized and stored, MSFT contributes nothing
    assert_eq!(outcome.symbols_attempted, 2);
    assert_eq!(outcome.symbols_succeeded, 1);
    assert_eq!(outcome.records_stored, 2);
    assert!(outcome.is_degraded());
    assert_eq!(h.http.requested_symbols(), vec!["AAPL", "MSFT"]);

    let stored = h.warehouse.observations_for("AAPL").expect("read back");
    assert_eq!(stored.len(), 2);
    assert!(stored
        .iter()
        .all(|row| row.time_zone.as_deref() == Some("US/Eastern")));
    assert!(h
        .warehouse
        .observations_for("MSFT")
        .expect("read back")
        .is_empty());

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].symbol, "MSFT");
    assert_eq!(outcome.failures[0].stage, Stage::Fetch);
    assert!(outcome.failures[0].reason.starts_with("rate limited"));
}

#[tokio::test]
async fn when_run_finishes_a_single_summary_reports_the_counts() {
    // Given: One healthy symbol
    let http = ScriptedHttpClient::default().reply(
        "IBM",
        series("IBM", &[("2024-01-05 19:00:00", "161.0000")]),
    );
    let h = harness(http, RunnerConfig::default());

    // When: The pipeline runs
    let outcome = h.runner.run("demo-key", &symbols(&["IBM"])).await;

    // Then: One summary diagnostic carries attempted, succeeded and records
    let summaries: Vec<_> = h
        .diagnostics
        .filtered(Stage::Run, Level::Info)
        .into_iter()
        .filter(|event| event.message.starts_with("run completed"))
        .collect();
    assert_eq!(summaries.len(), 1);
    assert_eq!(
        summaries[0].message,
        "run completed: attempted=1, succeeded=1, records=1"
    );
    assert!(!outcome.is_degraded());
    assert!(!outcome.run_id.is_empty());
}

// =============================================================================
// Pipeline: Per-symbol Isolation
// =============================================================================

#[tokio::test]
async fn when_a_transport_error_hits_one_symbol_only_that_symbol_is_lost() {
    // Given: AAPL times out, MSFT answers with 503, IBM answers normally
    let http = ScriptedHttpClient::default()
        .fail("AAPL", HttpError::new("request timeout"))
        .status("MSFT", 503)
        .reply(
            "IBM",
            series(
                "IBM",
                &[
                    ("2024-01-05 17:00:00", "160.0000"),
                    ("2024-01-05 18:00:00", "160.5000"),
                    ("2024-01-05 19:00:00", "161.0000"),
                ],
            ),
        );
    let h = harness(http, RunnerConfig::default());

    // When: The pipeline runs over all three
    let outcome = h.runner.run("demo-key", &symbols(&["AAPL", "MSFT", "IBM"])).await;

    // Then: Only IBM's records are counted
    assert_eq!(outcome.symbols_attempted, 3);
    assert_eq!(outcome.symbols_succeeded, 1);
    assert_eq!(outcome.records_stored, 3);
    assert_eq!(h.warehouse.count_observations().expect("count"), 3);
    let failed: Vec<_> = outcome
        .failures
        .iter()
        .map(|failure| (failure.symbol.as_str(), failure.stage))
        .collect();
    assert_eq!(failed, vec![("AAPL", Stage::Fetch), ("MSFT", Stage::Fetch)]);
}

#[tokio::test]
async fn when_provider_payloads_are_unusable_each_is_a_separate_failure() {
    // Given: An error payload, an advisory-only body, a non-object body and
    // a body with no usable entries
    let http = ScriptedHttpClient::default()
        .reply("AAPL", json!({ "Error Message": "Invalid API call." }))
        .reply("MSFT", json!({ "Information": "The demo API key is for demo purposes only." }))
        .reply("IBM", json!(["unexpected"]))
        .reply("TSLA", series("TSLA", &[("2024-01-05 19:00:00", "n/a")]));
    let h = harness(http, RunnerConfig::default());

    // When: The pipeline runs
    let outcome = h
        .runner
        .run("demo-key", &symbols(&["AAPL", "MSFT", "IBM", "TSLA"]))
        .await;

    // Then: Every symbol is attempted, none succeeds, and nothing is stored
    assert_eq!(outcome.symbols_attempted, 4);
    assert_eq!(outcome.symbols_succeeded, 0);
    assert_eq!(outcome.records_stored, 0);
    assert!(outcome.is_failed());
    assert_eq!(h.warehouse.count_observations().expect("count"), 0);

    let reasons: Vec<_> = outcome
        .failures
        .iter()
        .map(|failure| (failure.symbol.as_str(), failure.reason.as_str()))
        .collect();
    assert!(reasons[0].1.starts_with("provider error"));
    assert!(reasons[1].1.starts_with("rate limited"));
    assert!(reasons[2].1.starts_with("decode error"));
    assert_eq!(reasons[3], ("TSLA", "no valid observations in response"));
}

#[tokio::test]
async fn when_the_warehouse_rejects_one_symbol_the_others_are_still_stored() {
    // Given: AAPL reports a volume beyond BIGINT, IBM a close beyond
    // DECIMAL(15,4), and MSFT arrives twice under different casing
    let mut aapl = series("AAPL", &[("2024-01-05 19:00:00", "181.0000")]);
    aapl["Time Series (60min)"]["2024-01-05 19:00:00"]["5. volume"] =
        json!("18446744073709551615");
    let http = ScriptedHttpClient::default()
        .reply("AAPL", aapl)
        .reply("IBM", series("IBM", &[("2024-01-05 19:00:00", "100000000000.0000")]))
        .reply("MSFT", series("MSFT", &[("2024-01-05 19:00:00", "370.0000")]));
    let config = RunnerConfig {
        max_concurrency: 2,
        pacing: None,
        deadline: None,
    };
    let h = harness(http, config);

    // When: The pipeline runs over all four entries
    let outcome = h
        .runner
        .run("demo-key", &symbols(&["AAPL", "IBM", "MSFT", "msft"]))
        .await;

    // Then: Both rejections are store failures and MSFT still lands
    assert_eq!(outcome.symbols_attempted, 4);
    assert_eq!(outcome.symbols_succeeded, 2);
    assert_eq!(outcome.records_stored, 2);

    let mut failures = outcome.failures.clone();
    failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].symbol, "AAPL");
    assert_eq!(failures[0].stage, Stage::Store);
    assert!(failures[0].reason.contains("exceeds BIGINT"));
    assert_eq!(failures[1].symbol, "IBM");
    assert_eq!(failures[1].stage, Stage::Store);

    for rejected in ["AAPL", "IBM"] {
        assert!(h
            .warehouse
            .observations_for(rejected)
            .expect("read back")
            .is_empty());
    }
    assert_eq!(h.warehouse.observations_for("MSFT").expect("read back").len(), 1);
    assert_eq!(h.warehouse.count_observations().expect("count"), 1);
}

/// Store that accepts every batch without writing anything.
struct DiscardingStore;

impl RecordStore for DiscardingStore {
    fn store(&self, _observations: &[PriceObservation]) -> Result<usize, StoreError> {
        Ok(0)
    }
}

#[tokio::test]
async fn when_the_store_writes_nothing_the_symbol_is_not_counted_as_stored() {
    // Given: A healthy AAPL series and a store that persists nothing
    let http = ScriptedHttpClient::default().reply(
        "AAPL",
        series("AAPL", &[("2024-01-05 19:00:00", "100.0000")]),
    );
    let (runner, diagnostics) =
        runner_with_store(http, Arc::new(DiscardingStore), RunnerConfig::default());

    // When: The pipeline runs
    let outcome = runner.run("demo-key", &symbols(&["AAPL"])).await;

    // Then: AAPL is a store failure and no records are claimed
    assert_eq!(outcome.symbols_attempted, 1);
    assert_eq!(outcome.symbols_succeeded, 0);
    assert_eq!(outcome.records_stored, 0);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].stage, Stage::Store);
    assert_eq!(outcome.failures[0].reason, "nothing stored");
    assert_eq!(diagnostics.filtered(Stage::Store, Level::Warn).len(), 1);
}

// =============================================================================
// Pipeline: Credential Gate
// =============================================================================

#[tokio::test]
async fn when_credential_is_blank_or_placeholder_no_request_is_sent() {
    for credential in ["", "   ", "your_alpha_vantage_api_key_here"] {
        // Given: A healthy provider script
        let http = ScriptedHttpClient::default().reply(
            "AAPL",
            series("AAPL", &[("2024-01-05 19:00:00", "100.0000")]),
        );
        let h = harness(http, RunnerConfig::default());

        // When: The pipeline runs without a usable credential
        let outcome = h.runner.run(credential, &symbols(&["AAPL", "MSFT"])).await;

        // Then: Nothing is attempted and the provider is never called
        assert_eq!(outcome.symbols_attempted, 0);
        assert_eq!(outcome.symbols_succeeded, 0);
        assert_eq!(outcome.records_stored, 0);
        assert!(outcome.credential_error.is_some());
        assert!(h.http.requested_symbols().is_empty());
        assert_eq!(h.diagnostics.filtered(Stage::Run, Level::Error).len(), 1);
    }
}

#[tokio::test]
async fn when_run_pipeline_gets_no_credential_it_stops_before_the_network() {
    // Given: An empty warehouse and the default provider settings
    let warehouse = Warehouse::open_in_memory().expect("warehouse");

    // When: The scheduler entry point runs without a key
    let outcome = run_pipeline(
        "",
        &symbols(&["AAPL"]),
        warehouse.clone(),
        &PipelineSettings::default(),
    )
    .await;

    // Then: The run is rejected with a fresh id and nothing is written
    assert!(outcome.credential_error.is_some());
    assert_eq!(outcome.symbols_attempted, 0);
    assert!(!outcome.run_id.is_empty());
    assert_eq!(warehouse.count_observations().expect("count"), 0);
}

#[tokio::test]
async fn when_credential_is_valid_it_never_appears_in_diagnostics() {
    // Given: A secret key
    let http = ScriptedHttpClient::default().reply(
        "AAPL",
        series("AAPL", &[("2024-01-05 19:00:00", "100.0000")]),
    );
    let h = harness(http, RunnerConfig::default());

    // When: A run completes
    h.runner.run("s3cr3t-key", &symbols(&["AAPL"])).await;

    // Then: No diagnostic leaks it
    assert!(h
        .diagnostics
        .events()
        .iter()
        .all(|event| !event.message.contains("s3cr3t-key")));
}

// =============================================================================
// Pipeline: Symbol Handling
// =============================================================================

#[tokio::test]
async fn when_symbol_list_has_blanks_they_are_skipped_and_not_attempted() {
    // Given: A list with empty and whitespace-only entries
    let http = ScriptedHttpClient::default().reply(
        "AAPL",
        series("AAPL", &[("2024-01-05 19:00:00", "100.0000")]),
    );
    let h = harness(http, RunnerConfig::default());

    // When: The pipeline runs
    let outcome = h.runner.run("demo-key", &symbols(&["", " aapl", "  "])).await;

    // Then: Only the real symbol counts
    assert_eq!(outcome.symbols_attempted, 1);
    assert_eq!(outcome.symbols_succeeded, 1);
    assert_eq!(h.http.requested_symbols(), vec!["AAPL"]);
}

#[tokio::test]
async fn when_symbol_is_invalid_it_fails_without_a_request() {
    // Given: A symbol longer than the store allows
    let h = harness(ScriptedHttpClient::default(), RunnerConfig::default());

    // When: The pipeline runs
    let outcome = h.runner.run("demo-key", &symbols(&["TOOLONGSYMBOL"])).await;

    // Then: It counts as an attempted failure and the provider is not called
    assert_eq!(outcome.symbols_attempted, 1);
    assert_eq!(outcome.symbols_succeeded, 0);
    assert_eq!(outcome.failures[0].stage, Stage::Run);
    assert!(h.http.requested_symbols().is_empty());
}

// =============================================================================
// Pipeline: Idempotence and Partial Corruption
// =============================================================================

#[tokio::test]
async fn when_the_same_hour_is_fetched_twice_the_warehouse_keeps_one_row() {
    // Given: A first run storing AAPL's 19:00 bar
    let first = ScriptedHttpClient::default().reply(
        "AAPL",
        series("AAPL", &[("2024-01-05 19:00:00", "100.0000")]),
    );
    let h = harness(first, RunnerConfig::default());
    h.runner.run("demo-key", &symbols(&["AAPL"])).await;

    // When: A second run reports a revised close for the same hour
    let second = Arc::new(ScriptedHttpClient::default().reply(
        "AAPL",
        series("AAPL", &[("2024-01-05 19:00:00", "100.2500")]),
    ));
    let rerun = PipelineRunner::alphavantage(
        second,
        h.warehouse.clone(),
        Arc::new(MemorySink::new()),
        &settings(RunnerConfig::default()),
    );
    let outcome = rerun.run("demo-key", &symbols(&["AAPL"])).await;

    // Then: The row is replaced, not duplicated
    assert_eq!(outcome.records_stored, 1);
    let stored = h.warehouse.observations_for("AAPL").expect("read back");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].close, 100.25);
}

#[tokio::test]
async fn when_one_entry_is_corrupt_the_rest_of_the_series_is_stored() {
    // Given: Four hourly entries, one with a non-numeric open
    let mut body = series(
        "AAPL",
        &[
            ("2024-01-05 16:00:00", "100.0000"),
            ("2024-01-05 17:00:00", "100.1000"),
            ("2024-01-05 18:00:00", "100.2000"),
            ("2024-01-05 19:00:00", "100.3000"),
        ],
    );
    body["Time Series (60min)"]["2024-01-05 17:00:00"]["1. open"] = json!("abc");
    let h = harness(
        ScriptedHttpClient::default().reply("AAPL", body),
        RunnerConfig::default(),
    );

    // When: The pipeline runs
    let outcome = h.runner.run("demo-key", &symbols(&["AAPL"])).await;

    // Then: Three records land and the bad hour is reported, not zero-filled
    assert_eq!(outcome.records_stored, 3);
    assert_eq!(outcome.symbols_succeeded, 1);
    let hours: Vec<_> = h
        .warehouse
        .observations_for("AAPL")
        .expect("read back")
        .into_iter()
        .map(|row| row.timestamp)
        .collect();
    assert_eq!(
        hours,
        vec![
            "2024-01-05 16:00:00",
            "2024-01-05 18:00:00",
            "2024-01-05 19:00:00"
        ]
    );
    assert_eq!(h.diagnostics.filtered(Stage::Parse, Level::Warn).len(), 1);
}

// =============================================================================
// Pipeline: Concurrency, Pacing and Deadline
// =============================================================================

#[tokio::test]
async fn when_symbols_run_concurrently_counts_match_a_sequential_run() {
    // Given: Five healthy symbols and one failing symbol
    let mut http = ScriptedHttpClient::default().status("FAIL", 500);
    let names = ["AAPL", "MSFT", "IBM", "TSLA", "NVDA"];
    for name in names {
        http = http.reply(name, series(name, &[("2024-01-05 19:00:00", "10.0000")]));
    }
    let config = RunnerConfig {
        max_concurrency: 4,
        pacing: None,
        deadline: None,
    };
    let h = harness(http, config);

    // When: The pipeline processes them four at a time
    let mut requested = symbols(&names);
    requested.push("fail".to_string());
    let outcome = h.runner.run("demo-key", &requested).await;

    // Then: Aggregates are exact
    assert_eq!(outcome.symbols_attempted, 6);
    assert_eq!(outcome.symbols_succeeded, 5);
    assert_eq!(outcome.records_stored, 5);
    assert_eq!(h.warehouse.count_observations().expect("count"), 5);
}

#[tokio::test]
async fn when_pacing_is_enabled_requests_within_budget_are_not_delayed() {
    // Given: A paced runner with budget for both symbols
    let http = ScriptedHttpClient::default()
        .reply("AAPL", series("AAPL", &[("2024-01-05 19:00:00", "1.0000")]))
        .reply("MSFT", series("MSFT", &[("2024-01-05 19:00:00", "2.0000")]));
    let h = harness(
        http,
        RunnerConfig::paced(ProviderPolicy::alphavantage_default()),
    );

    // When: The pipeline runs
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        h.runner.run("demo-key", &symbols(&["AAPL", "MSFT"])),
    )
    .await
    .expect("run finishes within the burst budget");

    // Then: Both symbols are stored
    assert_eq!(outcome.symbols_succeeded, 2);
}

#[tokio::test]
async fn when_deadline_has_passed_remaining_symbols_are_skipped() {
    // Given: A runner whose deadline is already exhausted
    let http = ScriptedHttpClient::default()
        .reply("AAPL", series("AAPL", &[("2024-01-05 19:00:00", "1.0000")]));
    let config = RunnerConfig {
        max_concurrency: 1,
        pacing: None,
        deadline: Some(Duration::ZERO),
    };
    let h = harness(http, config);

    // When: The pipeline runs
    let outcome = h.runner.run("demo-key", &symbols(&["AAPL", "MSFT"])).await;

    // Then: Skipped symbols are reported but not attempted
    assert_eq!(outcome.symbols_attempted, 0);
    assert_eq!(outcome.skipped_by_deadline, vec!["AAPL", "MSFT"]);
    assert!(h.http.requested_symbols().is_empty());
}

/// Holds AAPL's write until another symbol's write has gone through.
struct GatedStore {
    opened: Mutex<mpsc::Sender<()>>,
    gate: Mutex<mpsc::Receiver<()>>,
}

impl GatedStore {
    fn new() -> Self {
        let (opened, gate) = mpsc::channel();
        Self {
            opened: Mutex::new(opened),
            gate: Mutex::new(gate),
        }
    }
}

impl RecordStore for GatedStore {
    fn store(&self, observations: &[PriceObservation]) -> Result<usize, StoreError> {
        let waits = observations
            .first()
            .is_some_and(|observation| observation.symbol.as_str() == "AAPL");
        if waits {
            self.gate
                .lock()
                .expect("gate lock")
                .recv_timeout(Duration::from_secs(2))
                .map_err(|_| StoreError::Unrepresentable("gate never opened".to_string()))?;
        } else {
            let _ = self.opened.lock().expect("gate lock").send(());
        }
        Ok(observations.len())
    }
}

#[tokio::test]
async fn when_one_write_blocks_other_symbols_keep_progressing() {
    // Given: AAPL's write waits on MSFT's write, on a single-threaded runtime
    let http = ScriptedHttpClient::default()
        .reply("AAPL", series("AAPL", &[("2024-01-05 19:00:00", "1.0000")]))
        .reply("MSFT", series("MSFT", &[("2024-01-05 19:00:00", "2.0000")]));
    let config = RunnerConfig {
        max_concurrency: 2,
        pacing: None,
        deadline: None,
    };
    let (runner, _) = runner_with_store(http, Arc::new(GatedStore::new()), config);

    // When: Both symbols run side by side
    let outcome = runner.run("demo-key", &symbols(&["AAPL", "MSFT"])).await;

    // Then: The blocked write does not stall MSFT, so both succeed
    assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);
    assert_eq!(outcome.symbols_succeeded, 2);
    assert_eq!(outcome.records_stored, 2);
}
