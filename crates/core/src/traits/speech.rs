//! Speech capability traits

use std::sync::Arc;

use crate::{Result, Utterance, VoiceInfo};

/// One recognized segment of the current utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSegment {
    /// Best-guess text of the segment
    pub text: String,
    /// Finalized segments are never revised by the engine
    pub is_final: bool,
}

impl RecognitionSegment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Events emitted by a running recognition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// New or revised results. `segments` holds every result of the session;
    /// entries before `result_index` are unchanged since the previous event.
    Result {
        result_index: usize,
        segments: Vec<RecognitionSegment>,
    },
    /// Recognition failed; the engine stops
    Error(String),
    /// Recognition ended (after `stop` or on its own)
    End,
}

/// Callback handed to the recognizer on `start`
pub type RecognitionCallback = Arc<dyn Fn(RecognitionEvent) + Send + Sync>;

/// Speech-to-text interface
///
/// Implementations wrap a continuous, interim-results-enabled engine.
/// Events may be delivered synchronously from inside `start`/`stop` or later
/// from another task.
///
/// # Example
///
/// ```ignore
/// let on_event: RecognitionCallback = Arc::new(|event| println!("{:?}", event));
/// recognizer.start("hi-IN", on_event)?;
/// // ... later
/// recognizer.stop();
/// ```
pub trait SpeechRecognizer: Send + Sync + 'static {
    /// Whether the host offers speech recognition at all
    fn is_supported(&self) -> bool;

    /// Begin continuous recognition in `locale`
    fn start(&self, locale: &str, on_event: RecognitionCallback) -> Result<()>;

    /// Stop recognition. Trailing results and an `End` event may follow.
    fn stop(&self);

    /// Get engine name for logging
    fn name(&self) -> &str;
}

/// Events emitted for a single utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    /// Audio started playing
    Started,
    /// Utterance finished
    Ended,
    /// Utterance failed or was interrupted
    Error(String),
}

/// Callback handed to the synthesizer with each utterance
pub type SynthesisCallback = Arc<dyn Fn(SynthesisEvent) + Send + Sync>;

/// Text-to-speech interface
///
/// # Example
///
/// ```ignore
/// let utterance = Utterance::new("नमस्ते", "hi-IN");
/// synthesizer.speak(utterance, Arc::new(|event| println!("{:?}", event)))?;
/// ```
pub trait SpeechSynthesizer: Send + Sync + 'static {
    /// Whether the host offers speech synthesis at all
    fn is_supported(&self) -> bool;

    /// Voices currently available
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Queue an utterance for playback
    fn speak(&self, utterance: Utterance, on_event: SynthesisCallback) -> Result<()>;

    /// Whether the engine is playing anything
    fn is_speaking(&self) -> bool;

    /// Stop and drop every queued utterance
    fn cancel(&self);

    /// Get engine name for logging
    fn name(&self) -> &str;
}
