//! Voice types for speech synthesis

use serde::{Deserialize, Serialize};

use crate::language::locale_family;

/// A voice offered by the synthesis engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Voice identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Locale the voice speaks, e.g. "hi-IN"
    pub locale: String,
}

impl VoiceInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            locale: locale.into(),
        }
    }
}

/// A single synthesis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    /// Text to speak
    pub text: String,
    /// Requested locale
    pub locale: String,
    /// Selected voice; `None` means the platform default
    #[serde(default)]
    pub voice: Option<VoiceInfo>,
}

impl Utterance {
    pub fn new(text: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            locale: locale.into(),
            voice: None,
        }
    }

    /// Set the voice
    pub fn with_voice(mut self, voice: Option<VoiceInfo>) -> Self {
        self.voice = voice;
        self
    }
}

/// Pick a voice for `locale`.
///
/// Exact locale match first, then the first voice of the same language
/// family ("hi-IN" accepts "hi-XX"), otherwise `None`.
pub fn select_voice<'a>(voices: &'a [VoiceInfo], locale: &str) -> Option<&'a VoiceInfo> {
    if let Some(exact) = voices.iter().find(|v| v.locale.eq_ignore_ascii_case(locale)) {
        return Some(exact);
    }

    let family = locale_family(locale);
    let fallback = voices
        .iter()
        .find(|v| locale_family(&v.locale).eq_ignore_ascii_case(family));
    if let Some(voice) = fallback {
        tracing::debug!(locale, voice = %voice.locale, "Using language-family voice");
    }
    fallback
}
