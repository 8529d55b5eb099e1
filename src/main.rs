use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voice_tutor::audio::PlaybackEventReceiver;
use voice_tutor::{
    create_router, AppState, Config, FileAudioDevice, FileDeviceConfig, Grade, HttpTransfer,
    Language, LessonController, SessionContext,
};

#[derive(Parser)]
#[command(name = "voice-tutor", version, about = "Record speech, ask the tutor, play the reply")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(long, default_value = "config/voice-tutor")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record one clip, upload it and print the session
    Run(SessionArgs),
    /// Serve the session over HTTP
    Serve(SessionArgs),
}

#[derive(Args)]
struct SessionArgs {
    /// Lesson language (English, Sinhala, Tamil)
    #[arg(long, default_value = "English")]
    language: Language,

    /// Lesson grade (1-13)
    #[arg(long, default_value = "1")]
    grade: Grade,

    /// WAV clip used as the microphone
    #[arg(long)]
    clip: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Voice Tutor v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Tutor endpoint: {} ({:?} replies)", cfg.transfer.endpoint, cfg.transfer.response_mode);

    match cli.command {
        Command::Run(args) => run_once(&cfg, args).await,
        Command::Serve(args) => serve(&cfg, args).await,
    }
}

async fn build_controller(
    cfg: &Config,
    args: SessionArgs,
) -> Result<(LessonController, PlaybackEventReceiver)> {
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let device = FileAudioDevice::new(
        FileDeviceConfig::new(args.clip, PathBuf::from(&cfg.storage.recordings_path)),
        events_tx,
    );
    let transfer = HttpTransfer::new(
        cfg.transfer.endpoint.clone(),
        PathBuf::from(&cfg.storage.responses_path),
        cfg.transfer_timeout(),
    )?;

    let controller = LessonController::create(
        cfg.controller_config(),
        SessionContext::new(args.language, args.grade),
        Box::new(device),
        Box::new(transfer),
    )
    .await;

    Ok((controller, events_rx))
}

async fn run_once(cfg: &Config, args: SessionArgs) -> Result<()> {
    let (mut controller, mut events) = build_controller(cfg, args).await?;

    controller.start_recording().await;
    controller.stop_recording().await;

    // Let an auto-played reply run to completion
    if controller.active_playback().is_some() {
        if let Some(event) = events.recv().await {
            controller.handle_playback_event(event);
        }
    }

    let snapshot = serde_json::to_string_pretty(&controller.snapshot())?;
    println!("{}", snapshot);

    if let Some(message) = controller.last_message() {
        warn!("Session ended with: {}", message);
    }

    controller.shutdown().await;

    Ok(())
}

async fn serve(cfg: &Config, args: SessionArgs) -> Result<()> {
    let (controller, mut events) = build_controller(cfg, args).await?;
    let state = AppState::new(controller);

    let forward = state.controller.clone();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            forward.lock().await.handle_playback_event(event);
        }
    });

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .await
        .context("HTTP server failed")?;

    Ok(())
}
