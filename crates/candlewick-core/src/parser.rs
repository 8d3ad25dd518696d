//! Turns a decoded intraday response into validated observations.
//!
//! Entries are handled independently: a malformed entry is reported and
//! skipped, the rest of the series still comes through. No field is ever
//! filled in with a default.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::adapters::alphavantage::RawResponse;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Stage};
use crate::{MarketTimestamp, PriceObservation, SeriesMetadata, Symbol, ValidationError};

const OPEN_FIELD: &str = "1. open";
const HIGH_FIELD: &str = "2. high";
const LOW_FIELD: &str = "3. low";
const CLOSE_FIELD: &str = "4. close";
const VOLUME_FIELD: &str = "5. volume";

const LAST_REFRESHED_SUFFIX: &str = "Last Refreshed";
const TIME_ZONE_SUFFIX: &str = "Time Zone";

/// Why one time-series entry was skipped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedDataPoint {
    #[error("entry key '{key}' is not a YYYY-MM-DD HH:MM:SS timestamp")]
    Timestamp { key: String },

    #[error("entry is not an object")]
    NotAnObject,

    #[error("field '{field}' is missing")]
    MissingField { field: &'static str },

    #[error("field '{field}' is not a valid number: {raw}")]
    InvalidNumber { field: &'static str, raw: String },

    #[error(transparent)]
    InvalidValue(#[from] ValidationError),
}

/// Converts [`RawResponse`] bodies into [`PriceObservation`]s.
#[derive(Clone)]
pub struct ResponseParser {
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl ResponseParser {
    pub fn new(diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self { diagnostics }
    }

    /// Every well-formed entry becomes one observation carrying the series
    /// metadata. A response with no time-series section yields nothing.
    pub fn parse(&self, symbol: &Symbol, response: &RawResponse) -> Vec<PriceObservation> {
        let metadata = self.series_metadata(symbol, response.metadata.as_ref());

        let Some(series) = response.time_series.as_ref() else {
            self.diagnostics.emit(
                Diagnostic::warn(Stage::Parse, "response has no time series section")
                    .for_symbol(symbol.as_str()),
            );
            return Vec::new();
        };

        let mut observations = Vec::with_capacity(series.len());
        for (key, entry) in series {
            match parse_entry(symbol, key, entry, &metadata) {
                Ok(observation) => observations.push(observation),
                Err(defect) => self.diagnostics.emit(
                    Diagnostic::warn(Stage::Parse, format!("skipping entry {key}: {defect}"))
                        .for_symbol(symbol.as_str()),
                ),
            }
        }

        self.diagnostics.emit(
            Diagnostic::debug(
                Stage::Parse,
                format!(
                    "parsed {} of {} entries",
                    observations.len(),
                    series.len()
                ),
            )
            .for_symbol(symbol.as_str()),
        );

        observations
    }

    fn series_metadata(
        &self,
        symbol: &Symbol,
        metadata: Option<&Map<String, Value>>,
    ) -> SeriesMetadata {
        let Some(metadata) = metadata else {
            return SeriesMetadata::default();
        };

        let last_refreshed = match text_by_suffix(metadata, LAST_REFRESHED_SUFFIX) {
            Some(raw) => match MarketTimestamp::parse_lenient(raw) {
                Ok(parsed) => Some(parsed),
                Err(error) => {
                    self.diagnostics.emit(
                        Diagnostic::debug(
                            Stage::Parse,
                            format!("ignoring last refreshed value: {error}"),
                        )
                        .for_symbol(symbol.as_str()),
                    );
                    None
                }
            },
            None => None,
        };

        SeriesMetadata {
            last_refreshed,
            time_zone: text_by_suffix(metadata, TIME_ZONE_SUFFIX).map(str::to_owned),
        }
    }
}

// Metadata keys are numbered ("3. Last Refreshed", "6. Time Zone") and the
// numbering differs between endpoints.
fn text_by_suffix<'a>(metadata: &'a Map<String, Value>, suffix: &str) -> Option<&'a str> {
    metadata
        .iter()
        .find(|(key, _)| key.trim_end().ends_with(suffix))
        .and_then(|(_, value)| value.as_str())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_entry(
    symbol: &Symbol,
    key: &str,
    entry: &Value,
    metadata: &SeriesMetadata,
) -> Result<PriceObservation, MalformedDataPoint> {
    let timestamp = MarketTimestamp::parse(key).map_err(|_| MalformedDataPoint::Timestamp {
        key: key.to_owned(),
    })?;
    let fields = entry.as_object().ok_or(MalformedDataPoint::NotAnObject)?;

    let observation = PriceObservation::new(
        symbol.clone(),
        timestamp,
        price_field(fields, OPEN_FIELD)?,
        price_field(fields, HIGH_FIELD)?,
        price_field(fields, LOW_FIELD)?,
        price_field(fields, CLOSE_FIELD)?,
        volume_field(fields)?,
        metadata,
    )?;
    Ok(observation)
}

fn field<'a>(
    fields: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a Value, MalformedDataPoint> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(MalformedDataPoint::MissingField { field: name }),
        Some(value) => Ok(value),
    }
}

fn price_field(fields: &Map<String, Value>, name: &'static str) -> Result<f64, MalformedDataPoint> {
    let value = field(fields, name)?;
    let parsed = match value {
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        Value::Number(number) => number.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| MalformedDataPoint::InvalidNumber {
        field: name,
        raw: raw_text(value),
    })
}

fn volume_field(fields: &Map<String, Value>) -> Result<u64, MalformedDataPoint> {
    let value = field(fields, VOLUME_FIELD)?;
    let parsed = match value {
        Value::String(raw) => raw.trim().parse::<u64>().ok(),
        Value::Number(number) => number.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| MalformedDataPoint::InvalidNumber {
        field: VOLUME_FIELD,
        raw: raw_text(value),
    })
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}
