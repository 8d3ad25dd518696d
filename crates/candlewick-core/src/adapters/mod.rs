pub mod alphavantage;

pub use alphavantage::{decode_response, AlphaVantageClient, RawResponse};
