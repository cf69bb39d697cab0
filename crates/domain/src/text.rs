// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Multi-language text fields.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Languages a bulletin text can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    /// German.
    De,
    /// Italian.
    It,
    /// English.
    En,
    /// French.
    Fr,
    /// Spanish.
    Es,
    /// Catalan.
    Ca,
    /// Aranese.
    Oc,
}

impl LanguageCode {
    /// Returns the ISO 639-1 code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::De => "de",
            Self::It => "it",
            Self::En => "en",
            Self::Fr => "fr",
            Self::Es => "es",
            Self::Ca => "ca",
            Self::Oc => "oc",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "de" => Ok(Self::De),
            "it" => Ok(Self::It),
            "en" => Ok(Self::En),
            "fr" => Ok(Self::Fr),
            "es" => Ok(Self::Es),
            "ca" => Ok(Self::Ca),
            "oc" => Ok(Self::Oc),
            _ => Err(DomainError::UnknownValue {
                kind: "language",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for LanguageCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

/// A text field holding one entry per language.
///
/// Empty entries are never stored, so presence of a language means
/// there is actual content for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Text(BTreeMap<LanguageCode, String>);

impl Text {
    /// Creates an empty text.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, language: LanguageCode, value: &str) -> Self {
        self.set(language, value);
        self
    }

    /// Sets the entry for `language`; a blank value removes it.
    pub fn set(&mut self, language: LanguageCode, value: &str) {
        if value.trim().is_empty() {
            self.0.remove(&language);
        } else {
            self.0.insert(language, value.to_string());
        }
    }

    /// Returns the entry for `language`.
    #[must_use]
    pub fn get(&self, language: LanguageCode) -> Option<&str> {
        self.0
            .get(&language)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Returns true if no language carries content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| v.trim().is_empty())
    }

    /// Languages that carry content.
    pub fn languages(&self) -> impl Iterator<Item = LanguageCode> + '_ {
        self.0
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, _)| *k)
    }

    /// Returns a copy where every non-empty entry of `other` overrides ours.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged: BTreeMap<LanguageCode, String> = self.0.clone();
        for (language, value) in &other.0 {
            if !value.trim().is_empty() {
                merged.insert(*language, value.clone());
            }
        }
        Self(merged)
    }

    /// Returns true if there is content in some but not all of `languages`.
    #[must_use]
    pub fn is_partially_translated(&self, languages: &[LanguageCode]) -> bool {
        !self.is_empty() && languages.iter().any(|l| self.get(*l).is_none())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_non_empty_entries_of_other() {
        let base: Text = Text::new()
            .with(LanguageCode::De, "Triebschnee")
            .with(LanguageCode::En, "Wind slab");
        let mut update: Text = Text::new().with(LanguageCode::En, "Fresh wind slab");
        update.0.insert(LanguageCode::De, String::from("  "));

        let merged: Text = base.merge(&update);

        assert_eq!(merged.get(LanguageCode::De), Some("Triebschnee"));
        assert_eq!(merged.get(LanguageCode::En), Some("Fresh wind slab"));
    }

    #[test]
    fn test_blank_value_removes_language() {
        let mut text: Text = Text::new().with(LanguageCode::It, "Neve ventata");
        text.set(LanguageCode::It, "");
        assert!(text.is_empty());
    }

    #[test]
    fn test_partial_translation_detection() {
        let languages: [LanguageCode; 3] = [LanguageCode::De, LanguageCode::It, LanguageCode::En];
        let partial: Text = Text::new().with(LanguageCode::De, "Nassschnee");
        let complete: Text = Text::new()
            .with(LanguageCode::De, "Nassschnee")
            .with(LanguageCode::It, "Neve bagnata")
            .with(LanguageCode::En, "Wet snow");

        assert!(partial.is_partially_translated(&languages));
        assert!(!complete.is_partially_translated(&languages));
        assert!(!Text::new().is_partially_translated(&languages));
    }

    #[test]
    fn test_text_serializes_as_language_map() {
        let text: Text = Text::new().with(LanguageCode::En, "Gliding snow");
        let json: String = serde_json::to_string(&text).unwrap();
        assert_eq!(json, r#"{"en":"Gliding snow"}"#);
    }

    #[test]
    fn test_language_code_parsing_is_case_insensitive() {
        assert_eq!("DE".parse::<LanguageCode>().unwrap(), LanguageCode::De);
        assert!("xx".parse::<LanguageCode>().is_err());
    }
}
