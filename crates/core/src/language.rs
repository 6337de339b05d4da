//! Language definitions for the chat session
//!
//! Each language carries a BCP-47 speech locale used by both the
//! recognizer and the synthesizer.

use serde::{Deserialize, Serialize};

/// Supported chat languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    #[serde(alias = "en", alias = "en-US")]
    English,
    #[serde(alias = "hi", alias = "hi-IN")]
    Hindi,
    #[serde(alias = "mr", alias = "mr-IN")]
    Marathi,
    #[serde(alias = "pa", alias = "pa-IN")]
    Punjabi,
    #[serde(alias = "ta", alias = "ta-IN")]
    Tamil,
}

impl Language {
    /// Get ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Marathi => "mr",
            Self::Punjabi => "pa",
            Self::Tamil => "ta",
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Marathi => "Marathi",
            Self::Punjabi => "Punjabi",
            Self::Tamil => "Tamil",
        }
    }

    /// Speech locale handed to recognition and synthesis engines
    pub fn locale(&self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::Hindi => "hi-IN",
            Self::Marathi => "mr-IN",
            Self::Punjabi => "pa-IN",
            Self::Tamil => "ta-IN",
        }
    }

    /// Parse from string (case-insensitive), accepting codes, names and locales
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "en" | "eng" | "english" | "en-us" => Some(Self::English),
            "hi" | "hin" | "hindi" | "hi-in" => Some(Self::Hindi),
            "mr" | "mar" | "marathi" | "mr-in" => Some(Self::Marathi),
            "pa" | "pan" | "punjabi" | "panjabi" | "pa-in" => Some(Self::Punjabi),
            "ta" | "tam" | "tamil" | "ta-in" => Some(Self::Tamil),
            _ => None,
        }
    }

    /// Get all supported languages
    pub fn all() -> &'static [Language] {
        &[
            Self::English,
            Self::Hindi,
            Self::Marathi,
            Self::Punjabi,
            Self::Tamil,
        ]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Language family of a locale tag ("hi-IN" -> "hi")
pub fn locale_family(locale: &str) -> &str {
    locale.split(&['-', '_'][..]).next().unwrap_or(locale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_locale() {
        assert_eq!(Language::English.locale(), "en-US");
        assert_eq!(Language::Hindi.locale(), "hi-IN");
        assert_eq!(Language::Tamil.locale(), "ta-IN");
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!(Language::from_str_loose("hi"), Some(Language::Hindi));
        assert_eq!(Language::from_str_loose("Marathi"), Some(Language::Marathi));
        assert_eq!(Language::from_str_loose("PA-IN"), Some(Language::Punjabi));
        assert_eq!(Language::from_str_loose(" tamil "), Some(Language::Tamil));
        assert_eq!(Language::from_str_loose("bengali"), None);
    }

    #[test]
    fn test_locale_family() {
        assert_eq!(locale_family("hi-IN"), "hi");
        assert_eq!(locale_family("en_GB"), "en");
        assert_eq!(locale_family("pa"), "pa");
    }

    #[test]
    fn test_all_languages() {
        let all = Language::all();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0], Language::default());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Language::Punjabi).unwrap();
        assert_eq!(json, "\"punjabi\"");

        let parsed: Language = serde_json::from_str("\"hi-IN\"").unwrap();
        assert_eq!(parsed, Language::Hindi);
    }
}
