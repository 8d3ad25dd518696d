//! # Domain Models
//!
//! Strongly-typed values that flow through the pipeline. Construction
//! validates invariants, so a value that exists is a value that may be stored.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Trimmed, upper-cased ticker of at most 10 characters |
//! | [`MarketTimestamp`] | Provider wall-clock time, second precision, no zone |
//! | [`ApiKey`] | Provider credential with redacted `Debug` output |
//! | [`PriceObservation`] | One OHLCV sample for a symbol at a timestamp |

mod credential;
mod observation;
mod symbol;
mod timestamp;

pub use credential::ApiKey;
pub use observation::{PriceObservation, SeriesMetadata};
pub use symbol::Symbol;
pub use timestamp::MarketTimestamp;
