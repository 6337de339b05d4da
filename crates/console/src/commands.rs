//! Console command parsing

use kisan_chat_core::{ChatMode, Language};

/// One line of console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mode(ChatMode),
    Language(Language),
    Mic,
    History,
    Help,
    Quit,
    /// Typed text, or a recognized phrase while the mic is on
    Input(String),
}

pub const HELP: &str = "\
Commands:
  /mode text|voice   switch input mode
  /lang <code>       switch language (en, hi, mr, pa, ta)
  /mic               toggle the microphone
  /history           print the conversation
  /help              show this help
  /quit              exit
Anything else is sent as a message (or spoken into the mic while it is on).";

/// Parse a console line
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Input(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    match (name, arg) {
        ("mode", Some(mode)) => ChatMode::from_str_loose(mode)
            .map(Command::Mode)
            .ok_or_else(|| format!("Unknown mode '{}'", mode)),
        ("lang", Some(code)) => Language::from_str_loose(code)
            .map(Command::Language)
            .ok_or_else(|| format!("Unknown language '{}'", code)),
        ("mode", None) | ("lang", None) => Err(format!("/{} needs an argument", name)),
        ("mic", _) => Ok(Command::Mic),
        ("history", _) => Ok(Command::History),
        ("help", _) => Ok(Command::Help),
        ("quit", _) | ("exit", _) => Ok(Command::Quit),
        _ => Err(format!("Unknown command '/{}'", name)),
    }
}
