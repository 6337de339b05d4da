//! Core traits and types for the Kisan chat session
//!
//! This crate provides foundational types used across all other crates:
//! - Capability traits for injected host services (speech, replies, location)
//! - Language definitions and speech locales
//! - Messages, chat modes and the append-only history
//! - Voice selection for synthesis
//! - Error types

pub mod conversation;
pub mod error;
pub mod language;
pub mod location;
pub mod traits;
pub mod voice_config;

pub use conversation::{ChatMode, History, Message, Sender};
pub use error::{Error, Result};
pub use language::{locale_family, Language};
pub use location::{Coordinates, LocationError};
pub use voice_config::{select_voice, Utterance, VoiceInfo};

// Trait re-exports
pub use traits::{
    // Location
    LocationProvider,
    // Replies
    ReplySource,
    // Speech
    RecognitionCallback, RecognitionEvent, RecognitionSegment, SpeechRecognizer,
    SpeechSynthesizer, SynthesisCallback, SynthesisEvent,
};
