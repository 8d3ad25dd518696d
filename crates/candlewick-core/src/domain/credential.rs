use std::fmt::{Debug, Formatter};

use crate::ValidationError;

/// Values shipped in sample configuration files that must never reach the provider.
const PLACEHOLDER_KEYS: &[&str] = &["your_alpha_vantage_api_key_here"];

/// Provider API credential.
///
/// `Debug` output is redacted so keys never end up in diagnostics.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Accept a credential unless it is blank or a known placeholder.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingCredential);
        }
        if PLACEHOLDER_KEYS
            .iter()
            .any(|placeholder| trimmed.eq_ignore_ascii_case(placeholder))
        {
            return Err(ValidationError::PlaceholderCredential);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Same as [`ApiKey::parse`], treating an absent value as missing.
    pub fn from_optional(input: Option<&str>) -> Result<Self, ValidationError> {
        input.map_or(Err(ValidationError::MissingCredential), Self::parse)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
