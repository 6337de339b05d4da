//! Speech capture and playback adapters
//!
//! This crate wraps the host's speech capabilities for the chat session:
//! - Speech capture: continuous recognition with interim results, exposed as
//!   an incremental transcript and a listening flag
//! - Speech playback: one utterance at a time with locale-based voice selection
//! - Scripted mock engines for tests and the console demo
//!
//! Both adapters tag engine callbacks with a generation so that late events
//! from an aborted capture or a cancelled utterance are discarded.

pub mod mock;
pub mod stt;
pub mod tts;

pub use mock::{MockRecognizer, MockSynthesizer};
pub use stt::{compose_transcript, CaptureObserver, CaptureState, SpeechCapture};
pub use tts::{PlaybackObserver, SpeechPlayback};
