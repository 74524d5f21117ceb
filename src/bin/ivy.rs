//! ivy: terminal client for the helloivy guided chat
//!
//! Walks the student through the scripted questions, then relays free-form
//! messages to the server's chat endpoint. `/record` streams audio clips to
//! the server's relay socket.

use helloivy::config::ClientConfig;
use helloivy::conversation::{
    ConversationContext, ConversationController, ConversationState, HttpResponder, Phase,
    Speaker, Transcript, TranscriptEvent, Typewriter, SCRIPT_LEN,
};
use helloivy::relay::{AudioRelay, AudioSource, CaptureHandle, SocketSession, WavFileSource};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "Commands: /start  /record [file.wav]  /stop  /quit";

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Start,
    Record(Option<&'a str>),
    Stop,
    Quit,
    Help,
    Unknown(&'a str),
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line);
    };
    let mut parts = command.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());
    match name {
        "start" => Input::Start,
        "record" => Input::Record(arg),
        "stop" => Input::Stop,
        "quit" | "exit" => Input::Quit,
        "help" => Input::Help,
        _ => Input::Unknown(line),
    }
}

/// A capture in progress plus the relay that owns its socket
struct Recording {
    relay: AudioRelay<SocketSession>,
    handle: CaptureHandle,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they don't interleave with the chat
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helloivy=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    let transcript = Transcript::new();
    tokio::spawn(print_transcript(transcript.subscribe()));

    let mut controller = ConversationController::new(
        ConversationContext::new(config.reply_latency, config.greeting_latency),
        HttpResponder::new(config.chat_url()),
        Typewriter::new(transcript.clone(), config.tick),
        transcript.clone(),
    );

    // Lines are read on their own task so input typed during a reveal can be
    // discarded instead of queued
    let (line_tx, mut lines) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = stdin.next_line().await {
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    println!("{HELP}");
    controller.start().await;
    settle(&transcript, &mut lines).await;
    print_progress(controller.state());

    let mut recording: Option<Recording> = None;
    while let Some(line) = lines.recv().await {
        match parse_input(&line) {
            Input::Start => controller.start().await,
            Input::Message(text) => controller.submit(text).await,
            Input::Record(path) => {
                if recording.is_some() {
                    println!("Already recording. Use /stop first.");
                } else {
                    recording = start_recording(&config, path).await;
                }
            }
            Input::Stop => match recording.take() {
                Some(rec) => stop_recording(rec).await,
                None => println!("Not recording."),
            },
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Unknown(command) => println!("Unknown command {command}. {HELP}"),
        }
        settle(&transcript, &mut lines).await;
        print_progress(controller.state());
    }

    if let Some(rec) = recording.take() {
        stop_recording(rec).await;
    }
    Ok(())
}

/// Wait for running reveals to finish, then drop anything typed meanwhile
async fn settle(transcript: &Transcript, lines: &mut mpsc::UnboundedReceiver<String>) {
    while transcript.is_revealing() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let mut dropped = 0;
    while lines.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        println!("(ignored {dropped} line(s) typed while Ivy was responding)");
    }
}

fn print_progress(state: &ConversationState) {
    if state.phase() == Phase::Scripted {
        println!("[Question {} of {SCRIPT_LEN}]", state.index() + 1);
    }
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Print assistant messages as they are revealed
async fn print_transcript(mut events: broadcast::Receiver<TranscriptEvent>) {
    // Characters already printed per revealing message
    let mut printed: HashMap<String, usize> = HashMap::new();
    let mut stdout = std::io::stdout();

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Transcript printer lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            TranscriptEvent::Appended(message) if message.sender == Speaker::Assistant => {
                let _ = write!(stdout, "\nIvy: {}", message.text);
                if message.revealing {
                    printed.insert(message.id, message.text.chars().count());
                } else {
                    let _ = writeln!(stdout);
                }
            }
            TranscriptEvent::Appended(_) => {}
            TranscriptEvent::Updated {
                id,
                text,
                revealing,
            } => {
                let Some(count) = printed.get_mut(&id) else {
                    continue;
                };
                let fresh: String = text.chars().skip(*count).collect();
                *count += fresh.chars().count();
                let _ = write!(stdout, "{fresh}");
                if !revealing {
                    printed.remove(&id);
                    let _ = writeln!(stdout);
                }
            }
            TranscriptEvent::Cleared => {
                printed.clear();
                let _ = writeln!(stdout, "\n--- new conversation ---");
            }
        }
        let _ = stdout.flush();
    }
}

async fn start_recording(config: &ClientConfig, path: Option<&str>) -> Option<Recording> {
    let mut source: Box<dyn AudioSource> = match path {
        Some(path) => Box::new(WavFileSource::new(path)),
        None => match microphone() {
            Ok(source) => source,
            Err(reason) => {
                println!("{reason}");
                return None;
            }
        },
    };

    let url = config.socket_url();
    let session = match SocketSession::connect(&url).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Relay socket unavailable");
            println!("Relay socket unavailable ({e}); clips will be skipped.");
            SocketSession::offline()
        }
    };

    let relay = AudioRelay::new(Arc::new(session), config.chunk_period);
    match relay.start_capture(source.as_mut()) {
        Ok(handle) => {
            println!(
                "Recording in {}s clips. /stop to finish.",
                config.chunk_period.as_secs()
            );
            Some(Recording { relay, handle })
        }
        Err(e) => {
            println!("Could not start recording: {e}");
            None
        }
    }
}

async fn stop_recording(recording: Recording) {
    let summary = recording.handle.stop().await;
    println!(
        "Recording stopped: {} clip(s) sent, {} skipped, {} receipt(s) so far.",
        summary.clips_sent,
        summary.clips_skipped,
        recording.relay.transport().receipts()
    );
}

#[cfg(feature = "mic")]
fn microphone() -> Result<Box<dyn AudioSource>, String> {
    Ok(Box::new(helloivy::relay::MicSource))
}

#[cfg(not(feature = "mic"))]
fn microphone() -> Result<Box<dyn AudioSource>, String> {
    Err("Built without microphone support; use /record <file.wav>.".to_string())
}
