//! Integration tests for the chat session (capture -> resolver -> playback)
//!
//! These drive a full session over the scripted speech engines with the
//! real keyword resolver and the configured latency.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use kisan_chat_agent::{ChatEvent, ChatSession, KeywordResolver, MicOutcome, SubmitOutcome};
use kisan_chat_config::Settings;
use kisan_chat_core::{ChatMode, Language, RecognitionSegment, Sender};
use kisan_chat_pipeline::{MockRecognizer, MockSynthesizer};

struct Harness {
    session: Arc<ChatSession>,
    recognizer: Arc<MockRecognizer>,
    synthesizer: Arc<MockSynthesizer>,
}

fn harness(settings: &Settings) -> Harness {
    let catalog = Arc::new(settings.load_catalog().unwrap());
    let recognizer = Arc::new(MockRecognizer::new());
    let synthesizer = Arc::new(MockSynthesizer::new());
    let session = ChatSession::builder(settings.chat.clone())
        .id("integration")
        .catalog(catalog.clone())
        .replies(Arc::new(KeywordResolver::new(catalog, &settings.resolver)))
        .recognizer(recognizer.clone())
        .synthesizer(synthesizer.clone())
        .build()
        .unwrap();

    Harness {
        session: Arc::new(session),
        recognizer,
        synthesizer,
    }
}

/// A spoken Hindi question is answered and read back in Hindi
#[tokio::test(start_paused = true)]
async fn test_voice_round_trip_in_hindi() {
    let h = harness(&Settings::default());

    assert!(h.session.switch_mode(ChatMode::Voice));
    assert!(h.session.switch_language(Language::Hindi));
    h.synthesizer.finish_current();

    assert_eq!(
        h.session.toggle_microphone().await.unwrap(),
        MicOutcome::ListeningStarted
    );
    h.recognizer.emit_result(
        0,
        vec![
            RecognitionSegment::final_text("मिट्टी "),
            RecognitionSegment::interim("के बारे में"),
        ],
    );
    assert_eq!(h.session.pending_input(), "मिट्टी के बारे में");

    let outcome = h.session.toggle_microphone().await.unwrap();
    let MicOutcome::Submitted(SubmitOutcome::Replied(reply)) = outcome else {
        panic!("expected a reply, got {:?}", outcome);
    };
    assert!(reply.text.starts_with("काली कपास मिट्टी"));

    let messages = h.session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].sender, Sender::User);
    assert_eq!(messages[2].sender, Sender::Agent);

    let spoken = h.synthesizer.spoken();
    let last = spoken.last().unwrap();
    assert_eq!(last.text, reply.text);
    assert_eq!(last.locale, "hi-IN");
    assert_eq!(h.synthesizer.active_utterances(), 1);
}

/// Replies honour the configured latency window
#[tokio::test(start_paused = true)]
async fn test_reply_latency() {
    let h = harness(&Settings::default());

    let started = tokio::time::Instant::now();
    h.session.submit("weather").await.unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1000));
    assert!(elapsed <= Duration::from_millis(2001));
}

/// A language switch during resolution drops the late reply
#[tokio::test(start_paused = true)]
async fn test_language_switch_discards_in_flight_reply() {
    let h = harness(&Settings::default());
    let mut events = h.session.subscribe();

    let session = Arc::clone(&h.session);
    let pending = tokio::spawn(async move { session.submit("pest").await });
    while !h.session.is_resolving() {
        tokio::task::yield_now().await;
    }

    h.session.switch_language(Language::Marathi);
    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(outcome, SubmitOutcome::Discarded);

    let messages = h.session.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].text.starts_with("नमस्कार"));

    let mut discarded = None;
    while let Ok(Ok(event)) = timeout(Duration::from_millis(10), events.recv()).await {
        if let ChatEvent::ReplyDiscarded { text } = event {
            discarded = Some(text);
        }
    }
    assert!(discarded.unwrap().starts_with("For aphids"));

    // the session accepts the next question in the new language
    let outcome = h.session.submit("हवामान").await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Replied(m) if m.text.contains("शुक्रवारी")));
}

/// History keeps append order across several exchanges
#[tokio::test(start_paused = true)]
async fn test_history_order() {
    let h = harness(&Settings::default());

    for prompt in ["hello", "soil", "xyz"] {
        h.session.submit(prompt).await.unwrap();
    }

    let senders: Vec<_> = h.session.messages().iter().map(|m| m.sender).collect();
    assert_eq!(
        senders,
        [
            Sender::Agent,
            Sender::User,
            Sender::Agent,
            Sender::User,
            Sender::Agent,
            Sender::User,
            Sender::Agent,
        ]
    );

    let history = h.session.history();
    let timestamps: Vec<_> = history.iter().map(|m| m.timestamp).collect();
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
}

/// A custom catalog file replaces the built-in tables
#[tokio::test]
async fn test_custom_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.yaml");
    std::fs::write(
        &path,
        r#"
profiles:
  - language: english
    welcome: "Welcome to the test farm"
    default_reply: "No idea"
    replies:
      - keyword: "paddy"
        reply: "Transplant paddy after 25 days"
"#,
    )
    .unwrap();

    let mut settings = Settings::default();
    settings.catalog_path = Some(path.to_string_lossy().into_owned());
    settings.resolver.min_latency_ms = 0;
    settings.resolver.max_latency_ms = 0;
    let h = harness(&settings);

    h.session.switch_mode(ChatMode::Voice);
    assert_eq!(h.session.messages()[0].text, "Welcome to the test farm");

    let outcome = h.session.submit("When to transplant PADDY?").await.unwrap();
    assert!(
        matches!(outcome, SubmitOutcome::Replied(m) if m.text == "Transplant paddy after 25 days")
    );
}
