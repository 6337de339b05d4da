//! Kisan chat console
//!
//! Drives a chat session from the terminal: typed lines are messages, or
//! recognized speech while the mic is on; spoken replies are printed.

mod commands;
mod engines;

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use kisan_chat_agent::{AgentError, ChatEvent, ChatSession, KeywordResolver, MicOutcome};
use kisan_chat_config::{load_settings, Settings};
use kisan_chat_core::Sender;

use commands::Command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("KISAN_CHAT_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&settings);
    tracing::info!("Starting Kisan chat console v{}", env!("CARGO_PKG_VERSION"));

    let catalog = Arc::new(
        settings
            .load_catalog()
            .context("failed to load language catalog")?,
    );
    let (recognizer, synthesizer) = engines::console_engines();

    let session = ChatSession::builder(settings.chat.clone())
        .catalog(catalog.clone())
        .replies(Arc::new(KeywordResolver::new(catalog, &settings.resolver)))
        .recognizer(recognizer.clone())
        .synthesizer(synthesizer)
        .build()
        .context("failed to build chat session")?;

    spawn_event_printer(&session);

    println!("{}", commands::HELP);
    print_history(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match commands::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("! {}", message);
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{}", commands::HELP),
            Command::History => print_history(&session),
            Command::Mode(mode) => {
                if !session.switch_mode(mode) {
                    println!("! already in {} mode", mode);
                }
            }
            Command::Language(language) => {
                if !session.switch_language(language) {
                    println!("! already speaking {}", language.name());
                }
            }
            Command::Mic => match session.toggle_microphone().await {
                Ok(MicOutcome::Unsupported) => println!("! speech input unavailable"),
                Ok(MicOutcome::ListeningStarted) => {
                    println!("(mic on: type what you say, /mic to stop)")
                }
                Ok(_) => {}
                Err(AgentError::Busy) => println!("! wait for the current reply"),
                Err(e) => println!("! {}", e),
            },
            Command::Input(text) if session.is_listening() => recognizer.hear(&text),
            Command::Input(text) => {
                session.set_pending_input(text);
                match session.submit_pending().await {
                    Ok(_) => {}
                    Err(AgentError::Busy) => println!("! wait for the current reply"),
                    Err(e) => println!("! {}", e),
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}

fn spawn_event_printer(session: &ChatSession) {
    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ChatEvent::MessageAppended(message)) if message.sender == Sender::Agent => {
                    println!("AI: {}", message.text);
                }
                Ok(ChatEvent::HistoryReset { welcome }) => {
                    println!("--- new conversation ---");
                    println!("AI: {}", welcome.text);
                }
                Ok(ChatEvent::ListeningChanged(false)) => println!("(mic off)"),
                Ok(ChatEvent::ResolutionStarted { .. }) => println!("AI is typing..."),
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event printer lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn print_history(session: &ChatSession) {
    println!(
        "[{} mode, {}]",
        session.mode(),
        session.language().name()
    );
    for message in session.history().iter() {
        let who = match message.sender {
            Sender::User => "You",
            Sender::Agent => "AI",
        };
        println!("{}: {}", who, message.text);
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("kisan_chat={},warn", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    subscriber.with(fmt_layer).init();
}
