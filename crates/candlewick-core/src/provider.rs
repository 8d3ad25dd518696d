//! Provider seam: one request per symbol, returning a raw response or a
//! classified failure. Retries and backoff are the caller's business.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::adapters::alphavantage::RawResponse;
use crate::{ApiKey, Symbol};

/// Classified fetch-stage failure. Every variant is non-fatal to a run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection error, timeout or non-2xx status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Body could not be decoded into the expected structure.
    #[error("decode error: {0}")]
    Decode(String),

    /// Provider answered with an explicit error payload.
    #[error("provider error: {0}")]
    Provider(String),

    /// Provider answered with a rate-limit or advisory note instead of data.
    #[error("rate limited: {0}")]
    RateLimited(String),
}

impl FetchError {
    /// Stable label used in outcome reports.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_error",
            Self::Decode(_) => "decode_error",
            Self::Provider(_) => "provider_error",
            Self::RateLimited(_) => "rate_limited",
        }
    }
}

/// Source of intraday 60-minute series.
pub trait IntradayProvider: Send + Sync {
    fn fetch<'a>(
        &'a self,
        symbol: &'a Symbol,
        api_key: &'a ApiKey,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, FetchError>> + Send + 'a>>;
}
