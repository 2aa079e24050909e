//! Codex demo - one prompt, one turn.
//!
//! Spawns `codex app-server`, starts a thread, runs a single prompt and prints
//! the final response. With `--replay` (or `CODEX_DEMO_REPLAY`) the app-server
//! is replaced by a recorded transcript, so the demo runs without a codex
//! install. `--record` captures a live session in the same format.
//!
//! ```text
//! cargo run -p codex-demo -- "Say hello"
//! cargo run -p codex-demo -- --replay demo/transcripts/quickstart.json
//! cargo run -p codex-demo -- --record session.json --stream "List the files here"
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use codex_protocol::methods;
use codex_protocol::types::ClientInfo;
use codex_sdk::{
    AutoApproveHandler, Codex, Input, Options, SpawnOptions, StderrSink, Thread, ThreadStartOptions,
};
use codex_transport::{ProcessTransport, RecordTransport, ReplayTransport, Transcript};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Command line for the demo
#[derive(Parser, Debug)]
#[command(name = "codex-demo", version, about = "Run one prompt against the Codex app-server")]
struct Cli {
    /// Prompt to send
    #[arg(default_value = "Say hello")]
    prompt: String,

    /// Path to the codex binary
    #[arg(long, env = "CODEX_PATH", default_value = "codex")]
    codex_path: String,

    /// Replay this transcript instead of spawning the app-server
    #[arg(long, env = "CODEX_DEMO_REPLAY", conflicts_with = "record")]
    replay: Option<PathBuf>,

    /// Save the live session as a transcript
    #[arg(long)]
    record: Option<PathBuf>,

    /// Model for the new thread
    #[arg(long)]
    model: Option<String>,

    /// `key=value` passed to the app-server as `--config`
    #[arg(long = "config", value_name = "KEY=VALUE")]
    config_overrides: Vec<String>,

    /// Print every notification as it arrives
    #[arg(long)]
    stream: bool,

    /// Approve every command and file change without asking
    #[arg(long)]
    auto_approve: bool,

    /// Debug-level logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut options = Options::default();
    if cli.auto_approve {
        options = options.with_approval_handler(Arc::new(AutoApproveHandler));
    }

    let mut recorder = None;
    if let Some(path) = &cli.replay {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading transcript {}", path.display()))?;
        let transcript = Transcript::from_json(&text).context("parsing transcript")?;
        info!(path = %path.display(), entries = transcript.len(), "replaying transcript");
        options = options
            .with_transport(ReplayTransport::new(transcript))
            .with_client_info(replay_client_info());
    } else {
        let spawn = spawn_options(&cli);
        if cli.record.is_some() {
            let process = ProcessTransport::spawn(spawn.into_process_config())
                .context("starting codex app-server")?;
            let transport = Arc::new(RecordTransport::new(process));
            recorder = Some(transport.clone());
            options = options.with_transport(transport);
        } else {
            options = options.with_spawn(spawn);
        }
        options = options.with_client_info(live_client_info());
    }

    let codex = Codex::connect(options).await.context("connecting to codex")?;
    let outcome = run_prompt(&codex, &cli).await;
    codex.close().await?;

    if let (Some(transport), Some(path)) = (recorder, &cli.record) {
        let json = transport.transcript().to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("writing transcript {}", path.display()))?;
        info!(path = %path.display(), "transcript saved");
    }

    println!("{}", outcome?);
    Ok(())
}

async fn run_prompt(codex: &Codex, cli: &Cli) -> Result<String> {
    let mut thread_options = ThreadStartOptions::default();
    if let Some(model) = &cli.model {
        thread_options = thread_options.with_model(model.clone());
    }
    let thread = codex.start_thread(thread_options).await?;
    info!(thread_id = thread.id(), "thread ready");

    if cli.stream {
        stream_turn(&thread, &cli.prompt).await
    } else {
        let result = thread.run(cli.prompt.clone(), None).await?;
        Ok(result.final_response)
    }
}

async fn stream_turn(thread: &Thread, prompt: &str) -> Result<String> {
    let mut stream = thread.run_streamed(vec![Input::text(prompt)], None).await?;
    let mut last_text = String::new();
    loop {
        let note = stream.next().await?;
        eprintln!("<- {} {}", note.method, note.params.clone().unwrap_or_default());
        if let Some(text) = note
            .params
            .as_ref()
            .and_then(|p| p.pointer("/item/text"))
            .and_then(|t| t.as_str())
        {
            last_text = text.to_string();
        }
        match note.method.as_str() {
            methods::TURN_COMPLETED => return Ok(last_text),
            methods::TURN_FAILED => bail!("turn failed"),
            _ => {}
        }
    }
}

fn spawn_options(cli: &Cli) -> SpawnOptions {
    let mut spawn = SpawnOptions::default()
        .with_codex_path(cli.codex_path.clone())
        .with_stderr(if cli.verbose { StderrSink::Log } else { StderrSink::Discard });
    for override_ in &cli.config_overrides {
        spawn = spawn.with_config_override(override_.clone());
    }
    spawn
}

fn live_client_info() -> ClientInfo {
    ClientInfo::new("codex-demo", env!("CARGO_PKG_VERSION")).with_title("Codex Demo")
}

/// Identity baked into the bundled transcripts
fn replay_client_info() -> ClientInfo {
    ClientInfo::new("codex-demo", "replay").with_title("Codex Demo")
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUICKSTART: &str = include_str!("../transcripts/quickstart.json");

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["codex-demo", "--config", "model=\"o3\""]).unwrap();
        assert_eq!(cli.prompt, "Say hello");
        assert_eq!(spawn_options(&cli).args(), vec!["app-server", "--config", "model=\"o3\""]);
        let both = ["codex-demo", "--replay", "a.json", "--record", "b.json"];
        assert!(Cli::try_parse_from(both).is_err());
    }

    #[tokio::test]
    async fn test_bundled_transcript_replays() {
        let transcript = Transcript::from_json(QUICKSTART).unwrap();
        let replay = Arc::new(ReplayTransport::new(transcript));
        let codex = Codex::connect(
            Options::default()
                .with_transport(replay.clone())
                .with_client_info(replay_client_info()),
        )
        .await
        .unwrap();

        let cli = Cli::try_parse_from(["codex-demo"]).unwrap();
        let response = run_prompt(&codex, &cli).await.unwrap();
        assert_eq!(response, "Hello from a replayed app-server!");
        assert!(replay.is_finished());
    }
}
