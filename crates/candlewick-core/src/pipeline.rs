//! Per-run orchestration: credential gate, then fetch → parse → store for each
//! symbol, with every failure contained at the symbol boundary.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::adapters::alphavantage::AlphaVantageClient;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Stage, TracingSink};
use crate::http_client::{HttpClient, ReqwestHttpClient, DEFAULT_TIMEOUT};
use crate::parser::ResponseParser;
use crate::provider::IntradayProvider;
use crate::provider_policy::ProviderPolicy;
use crate::store::{RecordStore, WarehouseStore};
use crate::throttling::RequestPacer;
use crate::{ApiKey, Symbol, Warehouse};

/// Knobs for one [`PipelineRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Symbols processed at the same time. `1` keeps the run strictly sequential.
    pub max_concurrency: usize,
    /// Provider request budget; `None` sends requests as soon as a slot is free.
    pub pacing: Option<ProviderPolicy>,
    /// Symbols not started within this budget are skipped.
    pub deadline: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            pacing: None,
            deadline: None,
        }
    }
}

impl RunnerConfig {
    /// Sequential run paced to `policy`.
    pub fn paced(policy: ProviderPolicy) -> Self {
        Self {
            max_concurrency: policy.max_concurrency.max(1),
            pacing: Some(policy),
            deadline: None,
        }
    }
}

/// One symbol that did not end with stored records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub stage: Stage,
    pub reason: String,
}

/// Aggregate result of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub run_id: String,
    pub symbols_attempted: usize,
    pub symbols_succeeded: usize,
    pub records_stored: usize,
    pub failures: Vec<SymbolFailure>,
    pub skipped_by_deadline: Vec<String>,
    /// Set when the run stopped at the credential gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_error: Option<String>,
}

impl RunOutcome {
    fn started(run_id: String) -> Self {
        Self {
            run_id,
            symbols_attempted: 0,
            symbols_succeeded: 0,
            records_stored: 0,
            failures: Vec::new(),
            skipped_by_deadline: Vec::new(),
            credential_error: None,
        }
    }

    /// Fewer symbols succeeded than were attempted, or the run never started.
    pub fn is_degraded(&self) -> bool {
        self.credential_error.is_some() || self.symbols_succeeded < self.symbols_attempted
    }

    /// Nothing useful happened: the credential was rejected or every attempted
    /// symbol failed.
    pub fn is_failed(&self) -> bool {
        self.credential_error.is_some()
            || (self.symbols_attempted > 0 && self.symbols_succeeded == 0)
    }

    fn record(&mut self, result: SymbolResult) {
        match result {
            SymbolResult::Stored { records, .. } => {
                self.symbols_attempted += 1;
                self.symbols_succeeded += 1;
                self.records_stored += records;
            }
            SymbolResult::Failed(failure) => {
                self.symbols_attempted += 1;
                self.failures.push(failure);
            }
            SymbolResult::Skipped(symbol) => self.skipped_by_deadline.push(symbol),
        }
    }
}

enum SymbolResult {
    Stored { records: usize },
    Failed(SymbolFailure),
    Skipped(String),
}

impl SymbolResult {
    fn failed(symbol: &str, stage: Stage, reason: impl Into<String>) -> Self {
        Self::Failed(SymbolFailure {
            symbol: symbol.to_owned(),
            stage,
            reason: reason.into(),
        })
    }
}

/// Fresh run identifier.
pub fn new_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Drives fetch → parse → store for every configured symbol.
pub struct PipelineRunner {
    provider: Arc<dyn IntradayProvider>,
    parser: ResponseParser,
    store: Arc<dyn RecordStore>,
    diagnostics: Arc<dyn DiagnosticSink>,
    pacer: Option<RequestPacer>,
    max_concurrency: usize,
    deadline: Option<Duration>,
}

impl PipelineRunner {
    pub fn new(
        provider: Arc<dyn IntradayProvider>,
        parser: ResponseParser,
        store: Arc<dyn RecordStore>,
        diagnostics: Arc<dyn DiagnosticSink>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            provider,
            parser,
            store,
            diagnostics,
            pacer: config.pacing.as_ref().map(RequestPacer::from_policy),
            max_concurrency: config.max_concurrency.max(1),
            deadline: config.deadline,
        }
    }

    /// Run once under a fresh run id.
    pub async fn run(&self, credential: &str, symbols: &[String]) -> RunOutcome {
        self.run_with_id(new_run_id(), credential, symbols).await
    }

    /// Run once. Never fails: every problem ends up in the outcome and the
    /// diagnostics sink.
    pub async fn run_with_id(
        &self,
        run_id: String,
        credential: &str,
        symbols: &[String],
    ) -> RunOutcome {
        let mut outcome = RunOutcome::started(run_id);

        let api_key = match ApiKey::parse(credential) {
            Ok(api_key) => api_key,
            Err(error) => {
                self.diagnostics.emit(Diagnostic::error(
                    Stage::Run,
                    format!("run aborted before any symbol was processed: {error}"),
                ));
                outcome.credential_error = Some(error.to_string());
                return outcome;
            }
        };

        let requested: Vec<&str> = symbols
            .iter()
            .map(|symbol| symbol.trim())
            .filter(|symbol| !symbol.is_empty())
            .collect();
        self.diagnostics.emit(Diagnostic::info(
            Stage::Run,
            format!(
                "run {} started for {} symbols",
                outcome.run_id,
                requested.len()
            ),
        ));

        let cutoff = self.deadline.map(|budget| Instant::now() + budget);
        let api_key = &api_key;
        let mut results = stream::iter(requested)
            .map(|raw| self.process_symbol(raw, api_key, cutoff))
            .buffer_unordered(self.max_concurrency);

        while let Some(result) = results.next().await {
            outcome.record(result);
        }

        let summary = format!(
            "run completed: attempted={}, succeeded={}, records={}",
            outcome.symbols_attempted, outcome.symbols_succeeded, outcome.records_stored
        );
        let summary = if outcome.skipped_by_deadline.is_empty() {
            Diagnostic::info(Stage::Run, summary)
        } else {
            Diagnostic::warn(
                Stage::Run,
                format!(
                    "{summary}, skipped_by_deadline={}",
                    outcome.skipped_by_deadline.len()
                ),
            )
        };
        self.diagnostics.emit(summary);

        outcome
    }

    async fn process_symbol(
        &self,
        raw: &str,
        api_key: &ApiKey,
        cutoff: Option<Instant>,
    ) -> SymbolResult {
        if self.past(cutoff) {
            return self.skip(raw);
        }

        let symbol = match Symbol::parse(raw) {
            Ok(symbol) => symbol,
            Err(error) => return self.fail(raw, Stage::Run, error.to_string()),
        };
        let name = symbol.as_str();

        if let Some(pacer) = &self.pacer {
            pacer.ready().await;
            if self.past(cutoff) {
                return self.skip(name);
            }
        }

        let response = match self.provider.fetch(&symbol, api_key).await {
            Ok(response) => response,
            Err(error) => return self.fail(name, Stage::Fetch, error.to_string()),
        };

        let observations = self.parser.parse(&symbol, &response);
        if observations.is_empty() {
            return self.fail(name, Stage::Parse, "no valid observations in response");
        }

        // DuckDB writes block; keep them off the executor so in-flight fetches
        // for other symbols keep making progress.
        let store = Arc::clone(&self.store);
        let written = tokio::task::spawn_blocking(move || store.store(&observations)).await;
        let written = match written {
            Ok(written) => written,
            Err(error) => {
                return self.fail(name, Stage::Store, format!("store task failed: {error}"));
            }
        };

        match written {
            Ok(0) => self.fail(name, Stage::Store, "nothing stored"),
            Ok(records) => {
                self.diagnostics.emit(
                    Diagnostic::info(Stage::Store, format!("stored {records} records"))
                        .for_symbol(name),
                );
                SymbolResult::Stored { records }
            }
            Err(error) => self.fail(name, Stage::Store, error.to_string()),
        }
    }

    fn past(&self, cutoff: Option<Instant>) -> bool {
        cutoff.is_some_and(|cutoff| Instant::now() >= cutoff)
    }

    fn skip(&self, symbol: &str) -> SymbolResult {
        self.diagnostics.emit(
            Diagnostic::warn(Stage::Run, "run deadline exceeded, symbol skipped").for_symbol(symbol),
        );
        SymbolResult::Skipped(symbol.to_owned())
    }

    fn fail(&self, symbol: &str, stage: Stage, reason: impl Into<String>) -> SymbolResult {
        let reason = reason.into();
        self.diagnostics
            .emit(Diagnostic::warn(stage, format!("symbol failed: {reason}")).for_symbol(symbol));
        SymbolResult::failed(symbol, stage, reason)
    }
}

/// Provider and runner settings for an Alpha Vantage backed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub runner: RunnerConfig,
    pub timeout: Duration,
    /// Provider endpoint override; `None` uses the public Alpha Vantage URL.
    pub base_url: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            runner: RunnerConfig::paced(ProviderPolicy::alphavantage_default()),
            timeout: DEFAULT_TIMEOUT,
            base_url: None,
        }
    }
}

impl PipelineRunner {
    /// Alpha Vantage client, response parser and warehouse store sharing one sink.
    pub fn alphavantage(
        http_client: Arc<dyn HttpClient>,
        warehouse: Warehouse,
        diagnostics: Arc<dyn DiagnosticSink>,
        settings: &PipelineSettings,
    ) -> Self {
        let mut provider = AlphaVantageClient::new(http_client, diagnostics.clone())
            .with_timeout(settings.timeout);
        if let Some(base_url) = &settings.base_url {
            provider = provider.with_base_url(base_url.clone());
        }

        Self::new(
            Arc::new(provider),
            ResponseParser::new(diagnostics.clone()),
            Arc::new(WarehouseStore::new(warehouse, diagnostics.clone())),
            diagnostics,
            settings.runner.clone(),
        )
    }
}

/// Single entry point for schedulers: one Alpha Vantage run into `warehouse`,
/// with diagnostics forwarded to `tracing` under a fresh run id.
pub async fn run_pipeline(
    credential: &str,
    symbols: &[String],
    warehouse: Warehouse,
    settings: &PipelineSettings,
) -> RunOutcome {
    let run_id = new_run_id();
    let diagnostics = Arc::new(TracingSink::with_run_id(run_id.clone()));
    let runner = PipelineRunner::alphavantage(
        Arc::new(ReqwestHttpClient::new()),
        warehouse,
        diagnostics,
        settings,
    );
    runner.run_with_id(run_id, credential, symbols).await
}
