//! Speech capture adapter
//!
//! Wraps a continuous, interim-results [`SpeechRecognizer`] and exposes the
//! incremental transcript plus listening state. Every `start` opens a new
//! generation; events tagged with an older generation are dropped, so a
//! recognizer that keeps firing after `abort` cannot touch the transcript.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use kisan_chat_core::{
    RecognitionCallback, RecognitionEvent, RecognitionSegment, Result, SpeechRecognizer,
};

/// Observable capture state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureState {
    pub is_listening: bool,
    pub transcript: String,
}

/// Called with a snapshot after every state change
pub type CaptureObserver = Arc<dyn Fn(&CaptureState) + Send + Sync>;

struct CaptureInner {
    state: CaptureState,
    generation: u64,
    locale: String,
    disposed: bool,
}

struct Shared {
    inner: Mutex<CaptureInner>,
    observer: RwLock<Option<CaptureObserver>>,
}

impl Shared {
    fn notify(&self, snapshot: &CaptureState) {
        let observer = self.observer.read().clone();
        if let Some(observer) = observer {
            observer(snapshot);
        }
    }

    fn handle_event(&self, generation: u64, event: RecognitionEvent) {
        let snapshot = {
            let mut inner = self.inner.lock();
            if inner.generation != generation || inner.disposed {
                tracing::trace!(
                    generation,
                    current = inner.generation,
                    "Dropping stale recognition event"
                );
                return;
            }

            match event {
                RecognitionEvent::Result {
                    result_index,
                    segments,
                } => {
                    let transcript = compose_transcript(result_index, &segments);
                    if transcript == inner.state.transcript {
                        return;
                    }
                    inner.state.transcript = transcript;
                }
                RecognitionEvent::Error(message) => {
                    tracing::warn!(error = %message, "Speech recognition error");
                    if !inner.state.is_listening {
                        return;
                    }
                    inner.state.is_listening = false;
                }
                RecognitionEvent::End => {
                    if !inner.state.is_listening {
                        return;
                    }
                    tracing::debug!("Speech recognition ended");
                    inner.state.is_listening = false;
                }
            }
            inner.state.clone()
        };

        self.notify(&snapshot);
    }
}

/// Transcript of one result event: finalized segments from `result_index`
/// onwards, followed by the interim ones.
pub fn compose_transcript(result_index: usize, segments: &[RecognitionSegment]) -> String {
    let tail = segments.get(result_index..).unwrap_or(&[]);
    let mut finals = String::new();
    let mut interims = String::new();
    for segment in tail {
        if segment.is_final {
            finals.push_str(&segment.text);
        } else {
            interims.push_str(&segment.text);
        }
    }
    finals + &interims
}

/// Speech-to-text capture over an injected recognizer
///
/// # Example
///
/// ```ignore
/// let capture = SpeechCapture::new(recognizer, "hi-IN");
/// capture.set_observer(Arc::new(|state| println!("{}", state.transcript)));
/// capture.start()?;
/// // ...
/// capture.stop();
/// ```
pub struct SpeechCapture {
    recognizer: Arc<dyn SpeechRecognizer>,
    shared: Arc<Shared>,
}

impl SpeechCapture {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, locale: impl Into<String>) -> Self {
        Self {
            recognizer,
            shared: Arc::new(Shared {
                inner: Mutex::new(CaptureInner {
                    state: CaptureState::default(),
                    generation: 0,
                    locale: locale.into(),
                    disposed: false,
                }),
                observer: RwLock::new(None),
            }),
        }
    }

    /// Install the state observer, replacing any previous one
    pub fn set_observer(&self, observer: CaptureObserver) {
        *self.shared.observer.write() = Some(observer);
    }

    pub fn has_support(&self) -> bool {
        self.recognizer.is_supported()
    }

    pub fn is_listening(&self) -> bool {
        self.shared.inner.lock().state.is_listening
    }

    pub fn transcript(&self) -> String {
        self.shared.inner.lock().state.transcript.clone()
    }

    pub fn state(&self) -> CaptureState {
        self.shared.inner.lock().state.clone()
    }

    pub fn locale(&self) -> String {
        self.shared.inner.lock().locale.clone()
    }

    /// Generation opened by the latest `start` (or closed by `abort`)
    pub fn generation(&self) -> u64 {
        self.shared.inner.lock().generation
    }

    /// Transcript of a stopped capture, or `None` once `generation` has been
    /// superseded by a restart or abort
    pub fn finished_transcript(&self, generation: u64) -> Option<String> {
        let inner = self.shared.inner.lock();
        (inner.generation == generation && !inner.state.is_listening && !inner.disposed)
            .then(|| inner.state.transcript.clone())
    }

    /// Start listening with a fresh transcript.
    ///
    /// No-op without recognizer support, while already listening, or after
    /// `dispose`.
    pub fn start(&self) -> Result<()> {
        if !self.has_support() {
            tracing::debug!(engine = self.recognizer.name(), "Speech recognition not supported");
            return Ok(());
        }

        let (generation, locale, snapshot) = {
            let mut inner = self.shared.inner.lock();
            if inner.disposed || inner.state.is_listening {
                return Ok(());
            }
            inner.generation += 1;
            inner.state.is_listening = true;
            inner.state.transcript.clear();
            (inner.generation, inner.locale.clone(), inner.state.clone())
        };
        self.shared.notify(&snapshot);

        let shared = Arc::clone(&self.shared);
        let on_event: RecognitionCallback =
            Arc::new(move |event| shared.handle_event(generation, event));

        tracing::info!(
            engine = self.recognizer.name(),
            locale = %locale,
            generation,
            "Starting speech capture"
        );

        if let Err(e) = self.recognizer.start(&locale, on_event) {
            tracing::warn!(error = %e, "Failed to start speech recognition");
            let snapshot = {
                let mut inner = self.shared.inner.lock();
                if inner.generation != generation || !inner.state.is_listening {
                    return Err(e);
                }
                inner.state.is_listening = false;
                inner.state.clone()
            };
            self.shared.notify(&snapshot);
            return Err(e);
        }

        Ok(())
    }

    /// Stop listening. The transcript stands; trailing results of the same
    /// generation may still revise it.
    pub fn stop(&self) {
        let snapshot = {
            let mut inner = self.shared.inner.lock();
            if !inner.state.is_listening {
                return;
            }
            inner.state.is_listening = false;
            inner.state.clone()
        };
        self.shared.notify(&snapshot);

        tracing::debug!(engine = self.recognizer.name(), "Stopping speech capture");
        self.recognizer.stop();
    }

    /// Stop listening, drop any late events and clear the transcript
    pub fn abort(&self) {
        let (was_listening, snapshot) = {
            let mut inner = self.shared.inner.lock();
            let was_listening = inner.state.is_listening;
            let changed = was_listening || !inner.state.transcript.is_empty();
            inner.generation += 1;
            inner.state = CaptureState::default();
            (was_listening, changed.then(|| inner.state.clone()))
        };

        if let Some(snapshot) = snapshot {
            self.shared.notify(&snapshot);
        }
        if was_listening {
            tracing::debug!(engine = self.recognizer.name(), "Aborting speech capture");
            self.recognizer.stop();
        }
    }

    /// Re-target the recognition locale; an active capture is aborted
    pub fn set_language(&self, locale: impl Into<String>) {
        let locale = locale.into();
        self.abort();
        let mut inner = self.shared.inner.lock();
        if inner.locale != locale {
            tracing::debug!(from = %inner.locale, to = %locale, "Capture locale changed");
            inner.locale = locale;
        }
    }

    /// Abort and detach; later `start` calls are no-ops
    pub fn dispose(&self) {
        self.abort();
        self.shared.inner.lock().disposed = true;
        *self.shared.observer.write() = None;
    }
}

impl std::fmt::Debug for SpeechCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("SpeechCapture")
            .field("engine", &self.recognizer.name())
            .field("locale", &inner.locale)
            .field("state", &inner.state)
            .field("generation", &inner.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRecognizer;

    fn capture() -> (Arc<MockRecognizer>, SpeechCapture) {
        let recognizer = Arc::new(MockRecognizer::new());
        let capture = SpeechCapture::new(recognizer.clone(), "en-US");
        (recognizer, capture)
    }

    #[test]
    fn test_compose_transcript_finals_then_interims() {
        let segments = vec![
            RecognitionSegment::final_text("old "),
            RecognitionSegment::interim("wea"),
            RecognitionSegment::final_text("tell me "),
            RecognitionSegment::interim("ther"),
        ];
        assert_eq!(compose_transcript(1, &segments), "tell me weather");
        assert_eq!(compose_transcript(0, &segments), "old tell me weather");
        assert_eq!(compose_transcript(9, &segments), "");
    }

    #[test]
    fn test_start_and_results() {
        let (recognizer, capture) = capture();
        capture.start().unwrap();
        assert!(capture.is_listening());
        assert_eq!(recognizer.last_locale().as_deref(), Some("en-US"));

        recognizer.emit_result(0, vec![RecognitionSegment::interim("so")]);
        assert_eq!(capture.transcript(), "so");

        recognizer.emit_result(0, vec![RecognitionSegment::final_text("soil")]);
        assert_eq!(capture.transcript(), "soil");
    }

    #[test]
    fn test_start_clears_previous_transcript() {
        let (recognizer, capture) = capture();
        capture.start().unwrap();
        recognizer.emit_result(0, vec![RecognitionSegment::final_text("first")]);
        capture.stop();
        assert_eq!(capture.transcript(), "first");

        capture.start().unwrap();
        assert_eq!(capture.transcript(), "");
        assert_eq!(recognizer.start_count(), 2);
    }

    #[test]
    fn test_finished_transcript_belongs_to_its_generation() {
        let (recognizer, capture) = capture();
        capture.start().unwrap();
        let first = capture.generation();
        recognizer.emit_final("soil");
        assert_eq!(capture.finished_transcript(first), None);

        capture.stop();
        assert_eq!(capture.finished_transcript(first).as_deref(), Some("soil"));

        capture.start().unwrap();
        recognizer.emit_final("weather");
        capture.stop();
        assert_eq!(capture.finished_transcript(first), None);
        assert_eq!(
            capture.finished_transcript(capture.generation()).as_deref(),
            Some("weather")
        );
    }

    #[test]
    fn test_start_while_listening_is_noop() {
        let (recognizer, capture) = capture();
        capture.start().unwrap();
        capture.start().unwrap();
        assert_eq!(recognizer.start_count(), 1);

        capture.stop();
        capture.stop();
        assert_eq!(recognizer.stop_count(), 1);
    }

    #[test]
    fn test_trailing_results_after_stop() {
        let (recognizer, capture) = capture();
        capture.start().unwrap();
        recognizer.emit_result(0, vec![RecognitionSegment::interim("pes")]);
        capture.stop();
        assert!(!capture.is_listening());

        recognizer.emit_result(0, vec![RecognitionSegment::final_text("pest")]);
        assert_eq!(capture.transcript(), "pest");
    }

    #[test]
    fn test_error_and_end_stop_listening() {
        let (recognizer, capture) = capture();
        capture.start().unwrap();
        recognizer.emit_result(0, vec![RecognitionSegment::final_text("hello")]);
        recognizer.emit(RecognitionEvent::Error("no-speech".to_string()));
        assert!(!capture.is_listening());
        assert_eq!(capture.transcript(), "hello");

        capture.start().unwrap();
        recognizer.emit(RecognitionEvent::End);
        assert!(!capture.is_listening());
    }

    #[test]
    fn test_abort_discards_late_events() {
        let (recognizer, capture) = capture();
        capture.start().unwrap();
        recognizer.emit_result(0, vec![RecognitionSegment::interim("mau")]);
        capture.abort();
        assert_eq!(capture.state(), CaptureState::default());

        recognizer.emit_result(0, vec![RecognitionSegment::final_text("mausam")]);
        assert_eq!(capture.transcript(), "");
    }

    #[test]
    fn test_set_language_retargets() {
        let (recognizer, capture) = capture();
        capture.start().unwrap();
        capture.set_language("hi-IN");
        assert!(!capture.is_listening());
        assert_eq!(capture.locale(), "hi-IN");

        capture.start().unwrap();
        assert_eq!(recognizer.last_locale().as_deref(), Some("hi-IN"));
    }

    #[test]
    fn test_unsupported_is_noop() {
        let recognizer = Arc::new(MockRecognizer::unsupported());
        let capture = SpeechCapture::new(recognizer.clone(), "en-US");
        assert!(!capture.has_support());
        capture.start().unwrap();
        assert!(!capture.is_listening());
        capture.stop();
        assert_eq!(recognizer.start_count(), 0);
        assert_eq!(recognizer.stop_count(), 0);
    }

    #[test]
    fn test_start_failure_resets_listening() {
        let (recognizer, capture) = capture();
        recognizer.fail_next_start("not-allowed");
        assert!(capture.start().is_err());
        assert!(!capture.is_listening());
    }

    #[test]
    fn test_observer_sees_each_change() {
        let (recognizer, capture) = capture();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        capture.set_observer(Arc::new(move |state: &CaptureState| {
            sink.lock().push(state.clone())
        }));

        capture.start().unwrap();
        recognizer.emit_result(0, vec![RecognitionSegment::interim("a")]);
        recognizer.emit_result(0, vec![RecognitionSegment::interim("ab")]);
        capture.stop();

        let transcripts: Vec<_> = seen.lock().iter().map(|s| s.transcript.clone()).collect();
        assert_eq!(transcripts, ["", "a", "ab", "ab"]);
        assert!(!seen.lock().last().unwrap().is_listening);
    }

    #[test]
    fn test_dispose() {
        let (recognizer, capture) = capture();
        capture.start().unwrap();
        capture.dispose();
        assert!(!capture.is_listening());
        capture.start().unwrap();
        assert_eq!(recognizer.start_count(), 1);
    }
}
