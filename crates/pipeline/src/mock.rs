//! Scripted speech capabilities
//!
//! Deterministic stand-ins for a host's speech engines. Tests and the console
//! demo drive them by hand: push recognition results, finish or fail the
//! current utterance, or mark the capability unsupported.

use std::collections::VecDeque;

use parking_lot::Mutex;

use kisan_chat_core::{
    Error, RecognitionCallback, RecognitionEvent, RecognitionSegment, Result, SpeechRecognizer,
    SpeechSynthesizer, SynthesisCallback, SynthesisEvent, Utterance, VoiceInfo,
};

#[derive(Default)]
struct RecognizerScript {
    /// Callback of every `start`, oldest first
    callbacks: Vec<RecognitionCallback>,
    last_locale: Option<String>,
    running: bool,
    starts: usize,
    stops: usize,
    fail_next_start: Option<String>,
    /// Delivered from inside `stop`, before `End`
    on_stop: Vec<RecognitionEvent>,
}

/// Speech recognizer driven by explicit `emit*` calls
pub struct MockRecognizer {
    supported: bool,
    script: Mutex<RecognizerScript>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self {
            supported: true,
            script: Mutex::new(RecognizerScript::default()),
        }
    }

    /// A recognizer the host does not offer
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Deliver `event` to the callback of the latest `start`
    pub fn emit(&self, event: RecognitionEvent) {
        let callback = self.script.lock().callbacks.last().cloned();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    /// Deliver `event` to the callback of the `index`-th `start`
    pub fn emit_to(&self, index: usize, event: RecognitionEvent) {
        let callback = self.script.lock().callbacks.get(index).cloned();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    pub fn emit_result(&self, result_index: usize, segments: Vec<RecognitionSegment>) {
        self.emit(RecognitionEvent::Result {
            result_index,
            segments,
        });
    }

    /// Single finalized segment
    pub fn emit_final(&self, text: impl Into<String>) {
        self.emit_result(0, vec![RecognitionSegment::final_text(text)]);
    }

    /// Make the next `start` fail with `message`
    pub fn fail_next_start(&self, message: impl Into<String>) {
        self.script.lock().fail_next_start = Some(message.into());
    }

    /// Events delivered synchronously by the next `stop`, ahead of `End`
    pub fn on_stop_emit(&self, events: Vec<RecognitionEvent>) {
        self.script.lock().on_stop = events;
    }

    pub fn is_running(&self) -> bool {
        self.script.lock().running
    }

    pub fn start_count(&self) -> usize {
        self.script.lock().starts
    }

    pub fn stop_count(&self) -> usize {
        self.script.lock().stops
    }

    pub fn last_locale(&self) -> Option<String> {
        self.script.lock().last_locale.clone()
    }
}

impl Default for MockRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn start(&self, locale: &str, on_event: RecognitionCallback) -> Result<()> {
        let mut script = self.script.lock();
        if let Some(message) = script.fail_next_start.take() {
            return Err(Error::Recognition(message));
        }
        script.callbacks.push(on_event);
        script.last_locale = Some(locale.to_string());
        script.running = true;
        script.starts += 1;
        Ok(())
    }

    fn stop(&self) {
        let (callback, trailing) = {
            let mut script = self.script.lock();
            script.stops += 1;
            if !script.running {
                return;
            }
            script.running = false;
            (
                script.callbacks.last().cloned(),
                std::mem::take(&mut script.on_stop),
            )
        };

        if let Some(callback) = callback {
            for event in trailing {
                callback(event);
            }
            callback(RecognitionEvent::End);
        }
    }

    fn name(&self) -> &str {
        "mock-recognizer"
    }
}

#[derive(Default)]
struct SynthesizerScript {
    queue: VecDeque<(Utterance, SynthesisCallback)>,
    /// Every utterance ever queued
    spoken: Vec<Utterance>,
    callbacks: Vec<SynthesisCallback>,
    cancels: usize,
}

/// Speech synthesizer that starts utterances immediately and finishes them
/// on request
pub struct MockSynthesizer {
    supported: bool,
    voices: Vec<VoiceInfo>,
    script: Mutex<SynthesizerScript>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self {
            supported: true,
            voices: Vec::new(),
            script: Mutex::new(SynthesizerScript::default()),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn with_voices(mut self, voices: Vec<VoiceInfo>) -> Self {
        self.voices = voices;
        self
    }

    /// End the utterance at the head of the queue
    pub fn finish_current(&self) {
        let head = self.script.lock().queue.pop_front();
        if let Some((_, callback)) = head {
            callback(SynthesisEvent::Ended);
        }
    }

    /// Fail the utterance at the head of the queue
    pub fn fail_current(&self, message: impl Into<String>) {
        let head = self.script.lock().queue.pop_front();
        if let Some((_, callback)) = head {
            callback(SynthesisEvent::Error(message.into()));
        }
    }

    /// Utterances queued or playing right now
    pub fn active_utterances(&self) -> usize {
        self.script.lock().queue.len()
    }

    pub fn current_text(&self) -> Option<String> {
        self.script
            .lock()
            .queue
            .front()
            .map(|(utterance, _)| utterance.text.clone())
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.script.lock().spoken.clone()
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.script
            .lock()
            .spoken
            .iter()
            .map(|u| u.text.clone())
            .collect()
    }

    pub fn cancel_count(&self) -> usize {
        self.script.lock().cancels
    }

    /// Callback handed over with the `index`-th utterance
    pub fn callback_at(&self, index: usize) -> Option<SynthesisCallback> {
        self.script.lock().callbacks.get(index).cloned()
    }
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSynthesizer for MockSynthesizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    fn speak(&self, utterance: Utterance, on_event: SynthesisCallback) -> Result<()> {
        if !self.supported {
            return Err(Error::CapabilityUnavailable("speech synthesis".to_string()));
        }

        let starts_now = {
            let mut script = self.script.lock();
            let starts_now = script.queue.is_empty();
            script.spoken.push(utterance.clone());
            script.callbacks.push(on_event.clone());
            script.queue.push_back((utterance, on_event.clone()));
            starts_now
        };

        if starts_now {
            on_event(SynthesisEvent::Started);
        }
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        !self.script.lock().queue.is_empty()
    }

    fn cancel(&self) {
        let dropped: Vec<_> = {
            let mut script = self.script.lock();
            script.cancels += 1;
            script.queue.drain(..).collect()
        };

        for (_, callback) in dropped {
            callback(SynthesisEvent::Error("interrupted".to_string()));
        }
    }

    fn name(&self) -> &str {
        "mock-synthesizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_recognizer_stop_delivers_trailing_then_end() {
        let recognizer = MockRecognizer::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        recognizer
            .start("en-US", Arc::new(move |event| sink.lock().push(event)))
            .unwrap();

        recognizer.on_stop_emit(vec![RecognitionEvent::Result {
            result_index: 0,
            segments: vec![RecognitionSegment::final_text("soil")],
        }]);
        recognizer.stop();

        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], RecognitionEvent::End);
        assert!(!recognizer.is_running());
    }

    #[test]
    fn test_synthesizer_cancel_interrupts_queue() {
        let synthesizer = MockSynthesizer::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        synthesizer
            .speak(
                Utterance::new("hello", "en-US"),
                Arc::new(move |event| sink.lock().push(event)),
            )
            .unwrap();
        assert!(synthesizer.is_speaking());

        synthesizer.cancel();
        assert!(!synthesizer.is_speaking());
        assert_eq!(
            events.lock().as_slice(),
            [
                SynthesisEvent::Started,
                SynthesisEvent::Error("interrupted".to_string())
            ]
        );
    }
}
