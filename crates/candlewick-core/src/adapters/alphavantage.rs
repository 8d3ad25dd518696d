//! Alpha Vantage `TIME_SERIES_INTRADAY` client.
//!
//! One GET per symbol, 60-minute interval, compact output size. The decoded
//! body is classified before it is handed on: explicit error payloads, rate
//! limit notes and advisory-only bodies never reach the parser.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::diagnostics::{Diagnostic, DiagnosticSink, Stage};
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT};
use crate::provider::{FetchError, IntradayProvider};
use crate::{ApiKey, Symbol};

pub const ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const INTRADAY_INTERVAL: &str = "60min";

/// Decoded intraday body: a metadata section and a time-series section keyed
/// by `YYYY-MM-DD HH:MM:SS`. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawResponse {
    #[serde(rename = "Meta Data", default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(rename = "Time Series (60min)", default)]
    pub time_series: Option<Map<String, Value>>,
    /// Advisory text the provider sent alongside data.
    #[serde(rename = "Information", default, deserialize_with = "lenient_text")]
    pub information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderNotices {
    #[serde(rename = "Error Message", default, deserialize_with = "lenient_text")]
    error_message: Option<String>,
    #[serde(rename = "Note", default, deserialize_with = "lenient_text")]
    note: Option<String>,
}

/// Decode and classify a response body.
///
/// Order: non-object body → `Decode`; `"Error Message"` → `Provider`;
/// `"Note"` → `RateLimited`; `"Information"` without a series → `RateLimited`.
pub fn decode_response(body: &str) -> Result<RawResponse, FetchError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::Decode(format!("body is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(FetchError::Decode(String::from(
            "expected a JSON object at the top level",
        )));
    }

    let notices = ProviderNotices::deserialize(&value)
        .map_err(|e| FetchError::Decode(format!("unexpected notice shape: {e}")))?;
    if let Some(message) = notices.error_message {
        return Err(FetchError::Provider(message));
    }
    if let Some(note) = notices.note {
        return Err(FetchError::RateLimited(note));
    }

    let response = RawResponse::deserialize(value)
        .map_err(|e| FetchError::Decode(format!("unexpected intraday structure: {e}")))?;
    if response.time_series.is_none() {
        if let Some(information) = response.information {
            return Err(FetchError::RateLimited(information));
        }
    }

    Ok(response)
}

/// Alpha Vantage client issuing one intraday request per symbol.
#[derive(Clone)]
pub struct AlphaVantageClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl AlphaVantageClient {
    pub fn new(http_client: Arc<dyn HttpClient>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            http_client,
            base_url: String::from(ALPHAVANTAGE_BASE_URL),
            timeout: DEFAULT_TIMEOUT,
            diagnostics,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, symbol: &Symbol, api_key: &ApiKey) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{base}{separator}function=TIME_SERIES_INTRADAY&symbol={symbol}&interval={INTRADAY_INTERVAL}&outputsize=compact&apikey={key}",
            base = self.base_url,
            symbol = urlencoding::encode(symbol.as_str()),
            key = urlencoding::encode(api_key.expose()),
        )
    }

    async fn fetch_intraday(
        &self,
        symbol: &Symbol,
        api_key: &ApiKey,
    ) -> Result<RawResponse, FetchError> {
        let endpoint = self.endpoint(symbol, api_key);
        self.diagnostics.emit(
            Diagnostic::debug(
                Stage::Fetch,
                format!(
                    "GET {}",
                    endpoint.replace(&*urlencoding::encode(api_key.expose()), "***")
                ),
            )
            .for_symbol(symbol.as_str()),
        );

        let request = HttpRequest::get(endpoint)
            .with_header("Accept", "application/json")
            .with_timeout(self.timeout);
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| FetchError::Transport(e.message().to_owned()))?;

        if !response.is_success() {
            return Err(FetchError::Transport(format!(
                "alphavantage returned status {}",
                response.status
            )));
        }

        decode_response(&response.body)
    }
}

impl IntradayProvider for AlphaVantageClient {
    fn fetch<'a>(
        &'a self,
        symbol: &'a Symbol,
        api_key: &'a ApiKey,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, FetchError>> + Send + 'a>> {
        Box::pin(self.fetch_intraday(symbol, api_key))
    }
}

/// Accept a string, or any other JSON value rendered as text.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        Value::String(text) => text,
        other => other.to_string(),
    }))
}
