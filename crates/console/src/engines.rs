//! Terminal speech engines
//!
//! The recognizer turns typed lines into finalized segments while the mic is
//! on; the synthesizer prints utterances instead of playing them.

use std::sync::Arc;

use parking_lot::Mutex;

use kisan_chat_core::{
    RecognitionCallback, RecognitionEvent, RecognitionSegment, Result, SpeechRecognizer,
    SpeechSynthesizer, SynthesisCallback, SynthesisEvent, Utterance, VoiceInfo,
};

#[derive(Default)]
struct TypedState {
    callback: Option<RecognitionCallback>,
    segments: Vec<RecognitionSegment>,
}

/// Recognizer fed from the keyboard
#[derive(Default)]
pub struct TypedRecognizer {
    state: Mutex<TypedState>,
}

impl TypedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `line` as the next finalized segment
    pub fn hear(&self, line: &str) {
        let (callback, segments) = {
            let mut state = self.state.lock();
            let Some(callback) = state.callback.clone() else {
                return;
            };
            let text = if state.segments.is_empty() {
                line.to_string()
            } else {
                format!(" {}", line)
            };
            state.segments.push(RecognitionSegment::final_text(text));
            (callback, state.segments.clone())
        };

        callback(RecognitionEvent::Result {
            result_index: 0,
            segments,
        });
    }
}

impl SpeechRecognizer for TypedRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    fn start(&self, locale: &str, on_event: RecognitionCallback) -> Result<()> {
        let mut state = self.state.lock();
        state.callback = Some(on_event);
        state.segments.clear();
        tracing::debug!(locale, "Typed recognizer listening");
        Ok(())
    }

    fn stop(&self) {
        let callback = self.state.lock().callback.take();
        if let Some(callback) = callback {
            callback(RecognitionEvent::End);
        }
    }

    fn name(&self) -> &str {
        "typed"
    }
}

/// Synthesizer that prints each utterance
pub struct PrintingSynthesizer {
    voices: Vec<VoiceInfo>,
}

impl PrintingSynthesizer {
    pub fn new() -> Self {
        Self {
            voices: vec![
                VoiceInfo::new("console-en", "Console English", "en-US"),
                VoiceInfo::new("console-hi", "Console Hindi", "hi-IN"),
                VoiceInfo::new("console-mr", "Console Marathi", "mr-IN"),
            ],
        }
    }
}

impl Default for PrintingSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSynthesizer for PrintingSynthesizer {
    fn is_supported(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    fn speak(&self, utterance: Utterance, on_event: SynthesisCallback) -> Result<()> {
        on_event(SynthesisEvent::Started);
        let voice = utterance
            .voice
            .as_ref()
            .map(|v| v.name.as_str())
            .unwrap_or("default voice");
        println!("  (speaking {} / {}) {}", utterance.locale, voice, utterance.text);
        on_event(SynthesisEvent::Ended);
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        false
    }

    fn cancel(&self) {}

    fn name(&self) -> &str {
        "printing"
    }
}

/// Both engines, sharing the recognizer with the input loop
pub fn console_engines() -> (Arc<TypedRecognizer>, Arc<PrintingSynthesizer>) {
    (Arc::new(TypedRecognizer::new()), Arc::new(PrintingSynthesizer::new()))
}
