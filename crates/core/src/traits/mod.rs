//! Capability traits consumed by the chat session
//!
//! The session never touches platform speech engines or services directly;
//! every host capability is injected through one of these traits, each with
//! an explicit support flag so a missing capability degrades instead of
//! failing.
//!
//! ```text
//! Speech:
//!   - SpeechRecognizer: continuous speech → text with interim results
//!   - SpeechSynthesizer: text → speech playback
//!
//! Replies:
//!   - ReplySource: prompt + language → reply text
//!
//! Location:
//!   - LocationProvider: current device position
//! ```

mod location;
mod reply;
mod speech;

pub use location::LocationProvider;
pub use reply::ReplySource;
pub use speech::{
    RecognitionCallback, RecognitionEvent, RecognitionSegment, SpeechRecognizer,
    SpeechSynthesizer, SynthesisCallback, SynthesisEvent,
};
