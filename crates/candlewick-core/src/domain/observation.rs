use serde::{Deserialize, Serialize};

use crate::{MarketTimestamp, Symbol, ValidationError};

/// Series-level metadata copied onto every observation from one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    pub last_refreshed: Option<MarketTimestamp>,
    pub time_zone: Option<String>,
}

/// One OHLCV sample for one symbol at one timestamp.
///
/// `(symbol, timestamp)` is the identity of an observation in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub symbol: Symbol,
    pub timestamp: MarketTimestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub last_refreshed: Option<MarketTimestamp>,
    pub time_zone: Option<String>,
}

impl PriceObservation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        timestamp: MarketTimestamp,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
        metadata: &SeriesMetadata,
    ) -> Result<Self, ValidationError> {
        validate_price("open", open)?;
        validate_price("high", high)?;
        validate_price("low", low)?;
        validate_price("close", close)?;

        Ok(Self {
            symbol,
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            last_refreshed: metadata.last_refreshed,
            time_zone: metadata.time_zone.clone(),
        })
    }
}

fn validate_price(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
