//! Speech-to-text capture

mod capture;

pub use capture::{compose_transcript, CaptureObserver, CaptureState, SpeechCapture};
