//! Speech playback adapter
//!
//! At most one utterance is active: `speak` cancels whatever is playing
//! before queueing the next one. Synthesis callbacks carry the generation of
//! the utterance they belong to and are ignored once it has been superseded.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use kisan_chat_core::{
    select_voice, Result, SpeechSynthesizer, SynthesisCallback, SynthesisEvent, Utterance,
};

/// Called with the new `is_speaking` value after every change
pub type PlaybackObserver = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct PlaybackInner {
    is_speaking: bool,
    /// An utterance has been handed to the synthesizer and has not finished
    active: bool,
    generation: u64,
    disposed: bool,
}

#[derive(Default)]
struct Shared {
    inner: Mutex<PlaybackInner>,
    observer: RwLock<Option<PlaybackObserver>>,
}

impl Shared {
    fn notify(&self, is_speaking: bool) {
        let observer = self.observer.read().clone();
        if let Some(observer) = observer {
            observer(is_speaking);
        }
    }

    fn handle_event(&self, generation: u64, event: SynthesisEvent) {
        let changed = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                tracing::trace!(generation, "Dropping stale synthesis event");
                return;
            }

            let was_speaking = inner.is_speaking;
            match event {
                SynthesisEvent::Started => {
                    inner.is_speaking = true;
                }
                SynthesisEvent::Ended => {
                    inner.is_speaking = false;
                    inner.active = false;
                }
                SynthesisEvent::Error(message) => {
                    tracing::warn!(error = %message, "Speech synthesis error");
                    inner.is_speaking = false;
                    inner.active = false;
                }
            }
            (inner.is_speaking != was_speaking).then_some(inner.is_speaking)
        };

        if let Some(is_speaking) = changed {
            self.notify(is_speaking);
        }
    }
}

/// Text-to-speech playback over an injected synthesizer
pub struct SpeechPlayback {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    shared: Arc<Shared>,
}

impl SpeechPlayback {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Install the speaking-state observer, replacing any previous one
    pub fn set_observer(&self, observer: PlaybackObserver) {
        *self.shared.observer.write() = Some(observer);
    }

    pub fn has_support(&self) -> bool {
        self.synthesizer.is_supported()
    }

    pub fn is_speaking(&self) -> bool {
        self.shared.inner.lock().is_speaking
    }

    /// Whether an utterance is queued or playing
    pub fn is_active(&self) -> bool {
        self.shared.inner.lock().active
    }

    /// Speak `text` in `locale`, replacing any active utterance.
    ///
    /// Empty text, missing synthesizer support and a disposed adapter are
    /// all no-ops.
    pub fn speak(&self, text: &str, locale: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        if !self.has_support() {
            tracing::debug!(engine = self.synthesizer.name(), "Speech synthesis not supported");
            return Ok(());
        }
        if self.shared.inner.lock().disposed {
            return Ok(());
        }

        if self.is_active() || self.synthesizer.is_speaking() {
            self.cancel();
        }

        let voices = self.synthesizer.voices();
        let voice = select_voice(&voices, locale).cloned();
        if voice.is_none() {
            tracing::warn!(
                locale,
                available = voices.len(),
                "No voice for locale, using platform default"
            );
        }

        let generation = {
            let mut inner = self.shared.inner.lock();
            inner.generation += 1;
            inner.active = true;
            inner.generation
        };

        let shared = Arc::clone(&self.shared);
        let on_event: SynthesisCallback =
            Arc::new(move |event| shared.handle_event(generation, event));

        tracing::debug!(
            engine = self.synthesizer.name(),
            locale,
            voice = voice.as_ref().map(|v| v.name.as_str()).unwrap_or("default"),
            chars = text.chars().count(),
            "Speaking"
        );

        let utterance = Utterance::new(text, locale).with_voice(voice);
        if let Err(e) = self.synthesizer.speak(utterance, on_event) {
            tracing::warn!(error = %e, "Failed to queue utterance");
            let changed = {
                let mut inner = self.shared.inner.lock();
                if inner.generation == generation {
                    let was_speaking = inner.is_speaking;
                    inner.active = false;
                    inner.is_speaking = false;
                    was_speaking
                } else {
                    false
                }
            };
            if changed {
                self.shared.notify(false);
            }
            return Err(e);
        }

        Ok(())
    }

    /// Stop playback and drop queued utterances
    pub fn cancel(&self) {
        if !self.has_support() {
            return;
        }

        let was_speaking = {
            let mut inner = self.shared.inner.lock();
            let was_speaking = inner.is_speaking;
            inner.generation += 1;
            inner.is_speaking = false;
            inner.active = false;
            was_speaking
        };

        self.synthesizer.cancel();
        if was_speaking {
            self.shared.notify(false);
        }
    }

    /// Cancel and detach; later `speak` calls are no-ops
    pub fn dispose(&self) {
        self.cancel();
        self.shared.inner.lock().disposed = true;
        *self.shared.observer.write() = None;
    }
}

impl std::fmt::Debug for SpeechPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("SpeechPlayback")
            .field("engine", &self.synthesizer.name())
            .field("is_speaking", &inner.is_speaking)
            .field("active", &inner.active)
            .field("generation", &inner.generation)
            .finish()
    }
}
