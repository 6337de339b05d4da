//! Chat Session Controller
//!
//! Owns the history, mode, language and pending input of one chat, and
//! coordinates the reply source with speech capture and playback.
//!
//! ## State machine
//!
//! ```text
//!          submit(text)                 reply settles / future dropped
//!   Idle ───────────────▶ AwaitingResolution ───────────────────────────▶ Idle
//! ```
//!
//! Mode and language switches cancel capture and playback, reset the history
//! to a single welcome message and bump the session generation. They leave
//! the phase alone, so at most one resolution is ever in flight; a reply that
//! settles under an older generation is discarded.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use kisan_chat_config::{ChatConfig, LanguageCatalog};
use kisan_chat_core::{
    ChatMode, History, Language, Message, ReplySource, SpeechRecognizer, SpeechSynthesizer,
};
use kisan_chat_pipeline::{CaptureObserver, CaptureState, SpeechCapture, SpeechPlayback};

use crate::AgentError;

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Resolution phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingResolution,
}

/// Session events
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A user or agent message was appended
    MessageAppended(Message),
    /// History was replaced by a single welcome message
    HistoryReset { welcome: Message },
    ModeChanged { old: ChatMode, new: ChatMode },
    LanguageChanged { old: Language, new: Language },
    PendingInputChanged(String),
    ResolutionStarted { generation: u64 },
    /// The reply source failed; the fallback reply is used instead
    ResolutionFailed { error: String },
    /// A reply settled after a mode/language switch and was dropped
    ReplyDiscarded { text: String },
    ListeningChanged(bool),
    SpeakingChanged(bool),
}

/// Result of a submit
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing to send after trimming
    Empty,
    /// The agent message appended for this submit
    Replied(Message),
    /// The reply arrived after a switch and was dropped
    Discarded,
}

/// Result of a microphone toggle
#[derive(Debug, Clone, PartialEq)]
pub enum MicOutcome {
    /// The host has no speech recognition
    Unsupported,
    ListeningStarted,
    /// Capture stopped without a submission
    ListeningStopped,
    /// Capture stopped and the transcript was submitted
    Submitted(SubmitOutcome),
}

struct SessionState {
    mode: ChatMode,
    language: Language,
    history: History,
    pending_input: String,
    phase: SessionPhase,
    generation: u64,
    /// Last listening flag seen from capture
    listening: bool,
}

/// Puts the phase back to Idle if a submit future is dropped mid-resolution
struct ResolutionGuard<'a> {
    state: &'a Mutex<SessionState>,
    armed: bool,
}

impl ResolutionGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().phase = SessionPhase::Idle;
            tracing::debug!("Resolution abandoned");
        }
    }
}

/// Builder for [`ChatSession`]
///
/// # Example
///
/// ```ignore
/// let session = ChatSession::builder(settings.chat.clone())
///     .catalog(catalog.clone())
///     .replies(Arc::new(KeywordResolver::new(catalog, &settings.resolver)))
///     .recognizer(recognizer)
///     .synthesizer(synthesizer)
///     .build()?;
/// ```
pub struct ChatSessionBuilder {
    id: Option<String>,
    config: ChatConfig,
    catalog: Option<Arc<LanguageCatalog>>,
    replies: Option<Arc<dyn ReplySource>>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl ChatSessionBuilder {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            id: None,
            config,
            catalog: None,
            replies: None,
            recognizer: None,
            synthesizer: None,
        }
    }

    /// Session id (random UUID if unset)
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Language catalog (built-in tables if unset)
    pub fn catalog(mut self, catalog: Arc<LanguageCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn replies(mut self, replies: Arc<dyn ReplySource>) -> Self {
        self.replies = Some(replies);
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn build(self) -> Result<ChatSession, AgentError> {
        let replies = self
            .replies
            .ok_or_else(|| AgentError::Initialization("reply source not configured".into()))?;
        let recognizer = self
            .recognizer
            .ok_or_else(|| AgentError::Initialization("speech recognizer not configured".into()))?;
        let synthesizer = self
            .synthesizer
            .ok_or_else(|| AgentError::Initialization("speech synthesizer not configured".into()))?;
        let catalog = self
            .catalog
            .unwrap_or_else(|| Arc::new(LanguageCatalog::builtin().clone()));

        let id = self.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mode = self.config.default_mode;
        let language = self.config.default_language;
        let welcome = match mode {
            ChatMode::Text => self.config.initial_greeting.clone(),
            ChatMode::Voice => catalog.welcome(language).to_string(),
        };

        let state = Arc::new(Mutex::new(SessionState {
            mode,
            language,
            history: History::with_welcome(welcome),
            pending_input: String::new(),
            phase: SessionPhase::Idle,
            generation: 0,
            listening: false,
        }));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let capture = SpeechCapture::new(recognizer, language.locale());
        capture.set_observer(capture_observer(Arc::clone(&state), event_tx.clone()));

        let playback = SpeechPlayback::new(synthesizer);
        let speaking_tx = event_tx.clone();
        playback.set_observer(Arc::new(move |speaking| {
            let _ = speaking_tx.send(ChatEvent::SpeakingChanged(speaking));
        }));

        tracing::info!(
            session_id = %id,
            mode = %mode,
            language = %language,
            reply_source = replies.name(),
            speech_input = capture.has_support(),
            speech_output = playback.has_support(),
            "Chat session created"
        );

        Ok(ChatSession {
            id,
            config: self.config,
            catalog,
            replies,
            capture,
            playback,
            state,
            event_tx,
        })
    }
}

/// Mirrors the capture transcript into pending input while listening
fn capture_observer(
    state: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<ChatEvent>,
) -> CaptureObserver {
    Arc::new(move |capture: &CaptureState| {
        let (listening_changed, pending) = {
            let mut state = state.lock();
            let listening_changed =
                (state.listening != capture.is_listening).then_some(capture.is_listening);
            state.listening = capture.is_listening;

            let pending = if capture.is_listening && state.pending_input != capture.transcript {
                state.pending_input = capture.transcript.clone();
                Some(capture.transcript.clone())
            } else {
                None
            };
            (listening_changed, pending)
        };

        if let Some(listening) = listening_changed {
            let _ = events.send(ChatEvent::ListeningChanged(listening));
        }
        if let Some(pending) = pending {
            let _ = events.send(ChatEvent::PendingInputChanged(pending));
        }
    })
}

/// One text/voice chat
pub struct ChatSession {
    id: String,
    config: ChatConfig,
    catalog: Arc<LanguageCatalog>,
    replies: Arc<dyn ReplySource>,
    capture: SpeechCapture,
    playback: SpeechPlayback,
    state: Arc<Mutex<SessionState>>,
    event_tx: broadcast::Sender<ChatEvent>,
}

impl ChatSession {
    pub fn builder(config: ChatConfig) -> ChatSessionBuilder {
        ChatSessionBuilder::new(config)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> ChatMode {
        self.state.lock().mode
    }

    pub fn language(&self) -> Language {
        self.state.lock().language
    }

    pub fn history(&self) -> History {
        self.state.lock().history.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().history.as_slice().to_vec()
    }

    pub fn pending_input(&self) -> String {
        self.state.lock().pending_input.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    pub fn is_resolving(&self) -> bool {
        self.phase() == SessionPhase::AwaitingResolution
    }

    /// Incremented on every mode or language switch
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn is_listening(&self) -> bool {
        self.capture.is_listening()
    }

    pub fn is_speaking(&self) -> bool {
        self.playback.is_speaking()
    }

    pub fn has_speech_input(&self) -> bool {
        self.capture.has_support()
    }

    pub fn has_speech_output(&self) -> bool {
        self.playback.has_support()
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: ChatEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Replace the typed input
    pub fn set_pending_input(&self, text: impl Into<String>) {
        let text = text.into();
        {
            let mut state = self.state.lock();
            if state.pending_input == text {
                return;
            }
            state.pending_input = text.clone();
        }
        self.emit(ChatEvent::PendingInputChanged(text));
    }

    /// Submit the pending input
    pub async fn submit_pending(&self) -> Result<SubmitOutcome, AgentError> {
        let pending = self.pending_input();
        self.submit(&pending).await
    }

    /// Send `text` to the reply source.
    ///
    /// The trimmed text is appended as a user message before resolution
    /// starts; the reply (or the fallback reply on failure) is appended when
    /// it settles and spoken in voice mode. Rejected with
    /// [`AgentError::Busy`] while another reply is resolving.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, AgentError> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return Ok(SubmitOutcome::Empty);
        }

        let (generation, language, user_message, had_pending) = {
            let mut state = self.state.lock();
            if state.phase == SessionPhase::AwaitingResolution {
                tracing::debug!(session_id = %self.id, "Submit rejected, reply in flight");
                return Err(AgentError::Busy);
            }

            let message = Message::user(prompt);
            state.history.push(message.clone());
            let had_pending = !state.pending_input.is_empty();
            state.pending_input.clear();
            state.phase = SessionPhase::AwaitingResolution;
            (state.generation, state.language, message, had_pending)
        };
        let mut guard = ResolutionGuard {
            state: &self.state,
            armed: true,
        };

        self.emit(ChatEvent::MessageAppended(user_message));
        if had_pending {
            self.emit(ChatEvent::PendingInputChanged(String::new()));
        }
        self.emit(ChatEvent::ResolutionStarted { generation });

        tracing::info!(
            session_id = %self.id,
            language = %language,
            generation,
            source = self.replies.name(),
            "Resolving reply"
        );

        let reply = match self.replies.resolve(prompt, language).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Reply source failed, using fallback");
                self.emit(ChatEvent::ResolutionFailed {
                    error: e.to_string(),
                });
                self.config.fallback_reply.clone()
            }
        };

        let settled = {
            let mut state = self.state.lock();
            state.phase = SessionPhase::Idle;
            guard.disarm();

            if state.generation != generation && self.config.discard_stale_replies {
                None
            } else {
                let message = Message::agent(reply.clone());
                state.history.push(message.clone());
                Some((message, state.mode, state.language))
            }
        };

        let Some((message, mode, language)) = settled else {
            tracing::debug!(
                session_id = %self.id,
                generation,
                "Reply arrived after a switch, discarded"
            );
            self.emit(ChatEvent::ReplyDiscarded { text: reply });
            return Ok(SubmitOutcome::Discarded);
        };

        self.emit(ChatEvent::MessageAppended(message.clone()));
        if mode == ChatMode::Voice {
            self.speak(&message.text, language);
        }

        Ok(SubmitOutcome::Replied(message))
    }

    fn speak(&self, text: &str, language: Language) {
        if !self.playback.has_support() {
            return;
        }
        if let Err(e) = self.playback.speak(text, language.locale()) {
            tracing::warn!(session_id = %self.id, error = %e, "Playback failed");
        }
    }

    /// Bump the generation, clear pending input and reset the history.
    /// Returns the new welcome message and whether pending input was cleared.
    fn reset_for_switch(
        &self,
        state: &mut SessionState,
        welcome: String,
    ) -> (Option<Message>, bool) {
        state.generation += 1;
        let had_pending = !state.pending_input.is_empty();
        state.pending_input.clear();
        state.history.reset(welcome);
        (state.history.last().cloned(), had_pending)
    }

    fn announce_reset(&self, welcome: Option<Message>, had_pending: bool) {
        if had_pending {
            self.emit(ChatEvent::PendingInputChanged(String::new()));
        }
        if let Some(welcome) = welcome {
            self.emit(ChatEvent::HistoryReset { welcome });
        }
    }

    /// Switch between text and voice input. Returns false if `mode` is
    /// already active.
    pub fn switch_mode(&self, mode: ChatMode) -> bool {
        if self.mode() == mode {
            return false;
        }

        self.capture.abort();
        self.playback.cancel();

        let (old, language, welcome, had_pending) = {
            let mut state = self.state.lock();
            if state.mode == mode {
                return false;
            }
            let old = state.mode;
            state.mode = mode;
            let text = match mode {
                ChatMode::Text => self.config.text_greeting.clone(),
                ChatMode::Voice => self.catalog.welcome(state.language).to_string(),
            };
            let (welcome, had_pending) = self.reset_for_switch(&mut state, text);
            (old, state.language, welcome, had_pending)
        };

        tracing::info!(session_id = %self.id, from = %old, to = %mode, "Mode switched");
        self.emit(ChatEvent::ModeChanged { old, new: mode });
        self.announce_reset(welcome.clone(), had_pending);

        if mode == ChatMode::Voice {
            if let Some(welcome) = welcome {
                self.speak(&welcome.text, language);
            }
        }
        true
    }

    /// Switch the conversation language. Returns false if `language` is
    /// already active.
    pub fn switch_language(&self, language: Language) -> bool {
        if self.language() == language {
            return false;
        }

        self.capture.set_language(language.locale());
        self.playback.cancel();

        let (old, welcome, had_pending) = {
            let mut state = self.state.lock();
            if state.language == language {
                return false;
            }
            let old = state.language;
            state.language = language;
            let text = self.catalog.welcome(language).to_string();
            let (welcome, had_pending) = self.reset_for_switch(&mut state, text);
            (old, welcome, had_pending)
        };

        tracing::info!(session_id = %self.id, from = %old, to = %language, "Language switched");
        self.emit(ChatEvent::LanguageChanged { old, new: language });
        self.announce_reset(welcome.clone(), had_pending);

        if let Some(welcome) = welcome {
            self.speak(&welcome.text, language);
        }
        true
    }

    /// Microphone button.
    ///
    /// Not listening: start capture (refused while a reply is resolving or
    /// being spoken). Listening: stop capture; in voice mode wait the settle
    /// delay and submit the transcript, in text mode leave it in the pending
    /// input.
    pub async fn toggle_microphone(&self) -> Result<MicOutcome, AgentError> {
        if !self.capture.has_support() {
            return Ok(MicOutcome::Unsupported);
        }

        if !self.capture.is_listening() {
            if self.is_resolving() || self.playback.is_speaking() {
                tracing::debug!(session_id = %self.id, "Microphone blocked while busy");
                return Err(AgentError::Busy);
            }
            self.capture.start()?;
            return Ok(MicOutcome::ListeningStarted);
        }

        let (generation, mode) = {
            let state = self.state.lock();
            (state.generation, state.mode)
        };
        let capture_generation = self.capture.generation();
        self.capture.stop();

        if mode == ChatMode::Text {
            let transcript = self.capture.transcript();
            if !transcript.is_empty() {
                self.set_pending_input(transcript);
            }
            return Ok(MicOutcome::ListeningStopped);
        }

        tokio::time::sleep(Duration::from_millis(self.config.mic_settle_ms)).await;

        let transcript = match self.capture.finished_transcript(capture_generation) {
            Some(transcript) if self.generation() == generation => transcript,
            _ => {
                tracing::debug!(session_id = %self.id, "Capture superseded during settle delay");
                return Ok(MicOutcome::ListeningStopped);
            }
        };
        if transcript.trim().is_empty() {
            tracing::debug!(session_id = %self.id, "Empty transcript, nothing submitted");
            return Ok(MicOutcome::ListeningStopped);
        }

        self.submit(&transcript).await.map(MicOutcome::Submitted)
    }

    /// Dispose capture and playback
    pub fn shutdown(&self) {
        self.capture.dispose();
        self.playback.dispose();
        tracing::info!(session_id = %self.id, "Chat session shut down");
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.capture.dispose();
        self.playback.dispose();
    }
}
