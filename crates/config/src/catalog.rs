//! Language catalog: welcome messages and canned keyword replies
//!
//! The built-in catalog carries the product's tables. A YAML file of the
//! same shape can replace it; keyword order in the file is match order.
//!
//! ```yaml
//! profiles:
//!   - language: hindi
//!     welcome: "नमस्ते! ..."
//!     default_reply: "..."
//!     replies:
//!       - keyword: "मौसम"
//!         reply: "..."
//! ```

use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use kisan_chat_core::Language;

use crate::ConfigError;

/// One keyword → reply entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordReply {
    /// Lower-case text searched for as a substring of the prompt
    pub keyword: String,
    /// Reply returned on a match
    pub reply: String,
}

impl KeywordReply {
    pub fn new(keyword: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            reply: reply.into(),
        }
    }
}

/// Everything the session needs to know about one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageProfile {
    pub language: Language,
    /// Welcome message shown (and spoken) after switching to this language
    pub welcome: String,
    /// Ordered keyword table; the first match wins
    #[serde(default)]
    pub replies: Vec<KeywordReply>,
    /// Reply used when no keyword matches
    pub default_reply: String,
}

impl LanguageProfile {
    /// Reply for `prompt`: first keyword contained in the lower-cased prompt,
    /// else the default reply.
    pub fn reply_for(&self, prompt: &str) -> &str {
        let prompt = prompt.to_lowercase();
        self.replies
            .iter()
            .find(|entry| prompt.contains(entry.keyword.as_str()))
            .map(|entry| entry.reply.as_str())
            .unwrap_or(&self.default_reply)
    }

    /// Whether this profile has any keyword replies
    pub fn has_replies(&self) -> bool {
        !self.replies.is_empty()
    }
}

/// Per-language welcome messages and reply tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCatalog {
    profiles: Vec<LanguageProfile>,
}

static BUILTIN: Lazy<LanguageCatalog> = Lazy::new(LanguageCatalog::builtin_tables);

impl LanguageCatalog {
    /// Build from profiles; fails without an English profile, which is the
    /// fallback for every other language.
    pub fn new(profiles: Vec<LanguageProfile>) -> Result<Self, ConfigError> {
        let catalog = Self { profiles };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The product's built-in tables
    pub fn builtin() -> &'static LanguageCatalog {
        &BUILTIN
    }

    /// Parse a YAML catalog
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let catalog: LanguageCatalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a YAML catalog from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let catalog = Self::from_yaml_str(&content)?;

        tracing::info!(
            path = %path.display(),
            languages = catalog.profiles.len(),
            "Loaded language catalog"
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.exact(Language::English).is_none() {
            return Err(ConfigError::MissingField("profiles[english]".to_string()));
        }

        for profile in &self.profiles {
            if profile.welcome.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("profiles[{}].welcome", profile.language.code()),
                    message: "Welcome message must not be empty".to_string(),
                });
            }
            if let Some(entry) = profile.replies.iter().find(|e| e.keyword.is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("profiles[{}].replies", profile.language.code()),
                    message: format!("Empty keyword for reply '{}'", entry.reply),
                });
            }
            if let Some(entry) = profile
                .replies
                .iter()
                .find(|e| e.keyword != e.keyword.to_lowercase())
            {
                return Err(ConfigError::InvalidValue {
                    field: format!("profiles[{}].replies", profile.language.code()),
                    message: format!("Keyword '{}' must be lower-case", entry.keyword),
                });
            }
        }

        Ok(())
    }

    fn exact(&self, language: Language) -> Option<&LanguageProfile> {
        self.profiles.iter().find(|p| p.language == language)
    }

    fn english(&self) -> &LanguageProfile {
        // Only a catalog deserialized without validate() can lack English
        self.exact(Language::English)
            .unwrap_or_else(|| &BUILTIN.profiles[0])
    }

    /// Welcome message for `language`, falling back to English
    pub fn welcome(&self, language: Language) -> &str {
        match self.exact(language) {
            Some(profile) => &profile.welcome,
            None => &self.english().welcome,
        }
    }

    /// Profile whose reply table serves `language`.
    ///
    /// Languages without a table are answered from the English one.
    pub fn reply_profile(&self, language: Language) -> &LanguageProfile {
        match self.exact(language) {
            Some(profile) if profile.has_replies() => profile,
            _ => self.english(),
        }
    }

    /// Canned reply for `prompt` in `language`
    pub fn reply_for(&self, prompt: &str, language: Language) -> &str {
        self.reply_profile(language).reply_for(prompt)
    }

    pub fn profiles(&self) -> &[LanguageProfile] {
        &self.profiles
    }

    fn builtin_tables() -> LanguageCatalog {
        let profiles = vec![
            LanguageProfile {
                language: Language::English,
                welcome: "Hello! I am Kisan.hal's AI assistant. Ready for your questions."
                    .to_string(),
                replies: vec![
                    KeywordReply::new(
                        "hello",
                        "Hi there! How can I assist you with your farming needs today?",
                    ),
                    KeywordReply::new(
                        "weather",
                        "The forecast for the next few days shows sunny skies with a slight \
                         chance of rain on Friday. Temperatures will be around 32°C.",
                    ),
                    KeywordReply::new(
                        "soil",
                        "For black cotton soil, it's best to plant crops like cotton, soybean, \
                         and jowar. Ensure good drainage to prevent waterlogging.",
                    ),
                    KeywordReply::new(
                        "fertilizer",
                        "A balanced NPK fertilizer (Nitrogen, Phosphorus, Potassium) is \
                         recommended. For wheat, a ratio of 120:60:40 kg/ha is generally \
                         effective. Always perform a soil test for precise recommendations.",
                    ),
                    KeywordReply::new(
                        "pest",
                        "For aphids on your cotton crop, you can use a solution of neem oil and \
                         water. Spray it on the affected plants every 7-10 days.",
                    ),
                ],
                default_reply: "That's a great question. Could you provide more details? For \
                                example, which crop and what growth stage are you concerned \
                                about?"
                    .to_string(),
            },
            LanguageProfile {
                language: Language::Hindi,
                welcome: "नमस्ते! मैं आपकी कैसे सहायता कर सकता हूँ?".to_string(),
                replies: vec![
                    KeywordReply::new(
                        "नमस्ते",
                        "नमस्ते! मैं आपकी खेती-बाड़ी में कैसे मदद कर सकता हूँ?",
                    ),
                    KeywordReply::new(
                        "मौसम",
                        "अगले कुछ दिनों के मौसम का पूर्वानुमान है कि आसमान साफ रहेगा और शुक्रवार को हल्की बारिश की संभावना है। तापमान 32°C के आसपास रहेगा।",
                    ),
                    KeywordReply::new(
                        "durg me weather",
                        "दुर्ग में मौसम साफ है, तापमान 27 डिग्री सेल्सियस के आसपास है और बारिश की कोई आशंका नहीं है।",
                    ),
                    KeywordReply::new(
                        "मिट्टी",
                        "काली कपास मिट्टी के लिए, कपास, सोयाबीन और ज्वार जैसी फसलें लगाना सबसे अच्छा है। जलभराव को रोकने के लिए अच्छी जल निकासी सुनिश्चित करें।",
                    ),
                ],
                default_reply: "यह एक बहुत अच्छा सवाल है। क्या आप अधिक जानकारी प्रदान कर सकते हैं? उदाहरण के लिए, आप किस फसल और किस विकास चरण के बारे में चिंतित हैं?".to_string(),
            },
            LanguageProfile {
                language: Language::Marathi,
                welcome: "नमस्कार! मी तुमची कशी मदत करू शकेन?".to_string(),
                replies: vec![
                    KeywordReply::new(
                        "नमस्कार",
                        "नमस्कार! मी तुमच्या शेतीच्या गरजांसाठी कशी मदत करू शकेन?",
                    ),
                    KeywordReply::new(
                        "हवामान",
                        "पुढील काही दिवसांचा हवामान अंदाज ढगाळ आकाशाचा आहे आणि शुक्रवारी पावसाची शक्यता आहे. तापमान ३०°C च्या आसपास राहील.",
                    ),
                    KeywordReply::new(
                        "माती",
                        "काळी कापूस मातीसाठी कापूस, सोयाबीन आणि ज्वारीसारखी पिके घेणे उत्तम आहे. पाणी साचू नये म्हणून चांगल्या निचऱ्याची खात्री करा.",
                    ),
                ],
                default_reply: "हा एक चांगला प्रश्न आहे. तुम्ही अधिक तपशील देऊ शकता का?".to_string(),
            },
            LanguageProfile {
                language: Language::Punjabi,
                welcome: "ਸਤ ਸ੍ਰੀ ਅਕਾਲ! ਮੈਂ ਤੁਹਾਡੀ ਕਿਵੇਂ ਮਦਦ ਕਰ ਸਕਦਾ ਹਾਂ?".to_string(),
                replies: vec![
                    KeywordReply::new(
                        "ਨਮਸਤੇ",
                        "ਸਤ ਸ੍ਰੀ ਅਕਾਲ! ਮੈਂ ਅੱਜ ਤੁਹਾਡੀਆਂ ਖੇਤੀ ਦੀਆਂ ਲੋੜਾਂ ਵਿੱਚ ਕਿਵੇਂ ਸਹਾਇਤਾ ਕਰ ਸਕਦਾ ਹਾਂ?",
                    ),
                    KeywordReply::new(
                        "ਮੌਸਮ",
                        "ਅਗਲੇ ਕੁਝ ਦਿਨਾਂ ਲਈ ਮੌਸਮ ਦੀ ਭਵਿੱਖਬਾਣੀ ਹੈ ਕਿ ਅਸਮਾਨ ਸਾਫ ਰਹੇਗਾ ਅਤੇ ਸ਼ੁੱਕਰਵਾਰ ਨੂੰ ਹਲਕੀ ਬਾਰਿਸ਼ ਹੋ ਸਕਦੀ ਹੈ। ਤਾਪਮਾਨ 32°C ਦੇ ਆਸ-ਪਾਸ ਰਹੇਗਾ।",
                    ),
                    KeywordReply::new(
                        "ਮਿੱਟੀ",
                        "ਕਾਲੀ ਕਪਾਹ ਦੀ ਮਿੱਟੀ ਲਈ, ਕਪਾਹ, ਸੋਇਆਬੀਨ ਅਤੇ ਜਵਾਰ ਵਰਗੀਆਂ ਫਸਲਾਂ ਬੀਜਣੀਆਂ ਸਭ ਤੋਂ ਵਧੀਆ ਹਨ। ਪਾਣੀ ਭਰਨ ਤੋਂ ਰੋਕਣ ਲਈ ਚੰਗੇ ਨਿਕਾਸ ਨੂੰ ਯਕੀਨੀ ਬਣਾਓ।",
                    ),
                ],
                default_reply: "ਇਹ ਇੱਕ ਬਹੁਤ ਵਧੀਆ ਸਵਾਲ ਹੈ। ਕੀ ਤੁਸੀਂ ਹੋਰ ਵੇਰਵੇ ਦੇ ਸਕਦੇ ਹੋ?".to_string(),
            },
            // Welcome only: Tamil prompts are answered from the English table
            LanguageProfile {
                language: Language::Tamil,
                welcome: "வணக்கம்! நான் உங்களுக்கு எப்படி உதவ முடியும்?".to_string(),
                replies: Vec::new(),
                default_reply: String::new(),
            },
        ];

        LanguageCatalog { profiles }
    }
}
