//! Error taxonomy shared by the capability adapters and the controller
//!
//! None of these are fatal to a session: capture and playback failures
//! degrade to not-listening / not-speaking, and resolution failures are
//! replaced with a fallback reply.

use thiserror::Error;

use crate::location::LocationError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The host has no such capability (speech APIs absent)
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Recognition error: {0}")]
    Recognition(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Resolution failure: {0}")]
    Resolution(String),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),
}

pub type Result<T> = std::result::Result<T, Error>;
