//! Text-to-speech playback

mod playback;

pub use playback::{PlaybackObserver, SpeechPlayback};
