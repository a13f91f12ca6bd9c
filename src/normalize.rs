//! Built-in address normalizer.
//!
//! Real cleaning rules live outside this crate behind [`AddressNormalizer`].
//! This one only canonicalizes whitespace and case and appends a locality,
//! which is enough for addresses that arrive already cleaned.

use serde::{Deserialize, Serialize};

use crate::traits::AddressNormalizer;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Appended as `", <LOCALITY>"` when the address does not mention it.
    pub locality: Option<String>,
    /// Localities that replace the default when they appear in the address.
    pub locality_overrides: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WhitespaceNormalizer {
    locality: Option<String>,
    overrides: Vec<String>,
}

impl WhitespaceNormalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        Self {
            locality: config.locality.as_deref().map(str::to_uppercase),
            overrides: config.locality_overrides.iter().map(|s| s.to_uppercase()).collect(),
        }
    }
}

impl AddressNormalizer for WhitespaceNormalizer {
    fn normalize(&self, raw: &str) -> String {
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        if text.is_empty() {
            return text;
        }

        let Some(default) = &self.locality else {
            return text;
        };
        let locality = self
            .overrides
            .iter()
            .find(|candidate| text.contains(candidate.as_str()))
            .unwrap_or(default);

        if text.ends_with(locality.as_str()) {
            text
        } else {
            format!("{}, {}", text, locality)
        }
    }
}
