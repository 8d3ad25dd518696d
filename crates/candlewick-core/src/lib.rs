//! Core pipeline for candlewick.
//!
//! This crate contains:
//! - Validated domain values (symbols, timestamps, credentials, observations)
//! - The Alpha Vantage intraday client behind an HTTP transport seam
//! - Response parsing with per-entry fault tolerance
//! - The record store seam over the DuckDB warehouse
//! - Request pacing and the per-run pipeline orchestrator

pub mod adapters;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod parser;
pub mod pipeline;
pub mod provider;
pub mod provider_policy;
pub mod store;
pub mod throttling;

pub use adapters::{decode_response, AlphaVantageClient, RawResponse};
pub use candlewick_warehouse::{
    ObservationRow, StoredObservation, Warehouse, WarehouseConfig, WarehouseError,
};
pub use diagnostics::{
    Diagnostic, DiagnosticSink, Level, MemorySink, NullSink, Stage, TracingSink,
};
pub use domain::{ApiKey, MarketTimestamp, PriceObservation, SeriesMetadata, Symbol};
pub use error::ValidationError;
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use parser::{MalformedDataPoint, ResponseParser};
pub use pipeline::{
    new_run_id, run_pipeline, PipelineRunner, PipelineSettings, RunOutcome, RunnerConfig,
    SymbolFailure,
};
pub use provider::{FetchError, IntradayProvider};
pub use provider_policy::{ProviderPolicy, TaskRetryPolicy};
pub use store::{RecordStore, StoreError, WarehouseStore};
pub use throttling::RequestPacer;
