use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Width of the `symbol` column in `stock_data`.
pub const MAX_SYMBOL_LEN: usize = 10;

/// Exchange ticker as stored in the warehouse: upper-case ASCII, starting with
/// a letter, with `.` and `-` allowed for share classes (`BRK.B`, `RDS-A`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Trim, upper-case and validate `input` in one pass.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        let mut ticker = String::with_capacity(input.len());

        for (index, ch) in input.chars().enumerate() {
            let ch = ch.to_ascii_uppercase();
            match (index, ch) {
                (0, 'A'..='Z') => {}
                (0, _) => return Err(ValidationError::SymbolInvalidStart { ch }),
                (_, 'A'..='Z' | '0'..='9' | '.' | '-') => {}
                (_, _) => return Err(ValidationError::SymbolInvalidChar { ch, index }),
            }
            ticker.push(ch);
        }

        match ticker.len() {
            0 => Err(ValidationError::EmptySymbol),
            len if len > MAX_SYMBOL_LEN => Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            }),
            _ => Ok(Self(ticker)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}
