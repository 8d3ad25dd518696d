use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

use crate::ValidationError;

const WIRE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Provider-reported wall-clock time with second precision.
///
/// No offset is attached: the value is stored exactly as the exchange
/// reported it, and the series' time-zone label travels alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarketTimestamp(PrimitiveDateTime);

impl MarketTimestamp {
    /// Parse the provider wire format `YYYY-MM-DD HH:MM:SS`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        PrimitiveDateTime::parse(input.trim(), WIRE_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidTimestamp {
                value: input.to_owned(),
            })
    }

    /// Parse either the wire format or a bare `YYYY-MM-DD` date (taken as midnight).
    pub fn parse_lenient(input: &str) -> Result<Self, ValidationError> {
        Self::parse(input).or_else(|error| {
            Date::parse(input.trim(), DATE_FORMAT)
                .map(|date| Self(PrimitiveDateTime::new(date, Time::MIDNIGHT)))
                .map_err(|_| error)
        })
    }

    /// Format back to `YYYY-MM-DD HH:MM:SS`, the form the store casts from.
    pub fn format_wire(self) -> String {
        self.0
            .format(WIRE_FORMAT)
            .unwrap_or_else(|_| self.0.to_string())
    }
}

impl Display for MarketTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_wire())
    }
}

impl Serialize for MarketTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_wire())
    }
}

impl<'de> Deserialize<'de> for MarketTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
