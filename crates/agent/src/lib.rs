//! Chat session controller
//!
//! Features:
//! - Text and voice input modes with per-mode welcome messages
//! - Language switching that cancels in-flight capture/playback
//! - Canned keyword replies with simulated latency
//! - Stale-reply protection via session generations
//! - One-shot location requests

pub mod chat_session;
pub mod location;
pub mod resolver;

pub use chat_session::{
    ChatEvent, ChatSession, ChatSessionBuilder, MicOutcome, SessionPhase, SubmitOutcome,
};
pub use location::request_location;
pub use resolver::KeywordResolver;

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    /// A reply is still resolving (or being spoken, for the microphone)
    #[error("Session busy")]
    Busy,

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Speech error: {0}")]
    Speech(#[from] kisan_chat_core::Error),

    #[error(transparent)]
    Location(#[from] kisan_chat_core::LocationError),
}
