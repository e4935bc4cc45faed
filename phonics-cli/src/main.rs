// Phonics keyboard command line interface
// Plays letter sounds, speaks text and manages custom recordings

mod recordings;

use anyhow::Context;
use clap::{Parser, Subcommand};
use phonics_core::mapping::{known_graphemes, resolve_phoneme_key};
use phonics_core::{icon_for, normalize, speech_text, KeyboardCase, PhonicsConfig};
use phonics_spk::{
    EspeakEngine, PlaybackOrchestrator, PlaybackOutcome, Resolution, SpeechEngine, SpeechParams, VoiceDirectory,
    VoicePolicy,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "phonics")]
#[command(about = "Phonics keyboard audio: letter sounds, speech and custom recordings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML or JSON)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the sound of one or more letters or graphemes
    Play {
        /// Letters or graphemes, e.g. `s a t` or `sh`
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Print each outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Speak arbitrary text
    Say {
        text: String,

        /// Speaking rate, 1.0 is normal
        #[arg(long)]
        rate: Option<f32>,

        /// Pitch, 1.0 is normal
        #[arg(long)]
        pitch: Option<f32>,

        /// Volume (0.0-1.0)
        #[arg(long)]
        volume: Option<f32>,
    },

    /// Show the sound file locator for a letter or grapheme
    Path { input: String },

    /// List letters and graphemes with their sound keys
    Letters {
        /// Show letters in lowercase
        #[arg(long)]
        lowercase: bool,
    },

    /// List speech voices and the one that would be used
    Voices,

    /// Record a custom sound from the microphone
    Record {
        /// Letter or grapheme to record
        input: String,

        /// Seconds to record (Ctrl-C stops early)
        #[arg(long, short, default_value = "3")]
        seconds: u64,

        /// Input device name (substring match)
        #[arg(long)]
        device: Option<String>,
    },

    /// Manage saved custom recordings
    #[command(subcommand)]
    Recordings(recordings::RecordingCommands),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("PHONICS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PhonicsConfig> {
    let config = match path {
        Some(path) => {
            let mut config = PhonicsConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            config.apply_env();
            config
        }
        None => PhonicsConfig::from_env(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Play { inputs, json } => play(config, &inputs, json).await?,
        Commands::Say {
            text,
            rate,
            pitch,
            volume,
        } => say(config, &text, rate, pitch, volume).await?,
        Commands::Path { input } => show_path(config, &input)?,
        Commands::Letters { lowercase } => show_letters(lowercase),
        Commands::Voices => show_voices(&config).await?,
        Commands::Record {
            input,
            seconds,
            device,
        } => recordings::record(&config, &input, seconds, device).await?,
        Commands::Recordings(cmd) => recordings::handle(&config, cmd).await?,
    }

    Ok(())
}

async fn play(config: PhonicsConfig, inputs: &[String], json: bool) -> anyhow::Result<()> {
    let orchestrator = PlaybackOrchestrator::with_default_devices(config)?;
    orchestrator.warm_up().await;

    for input in inputs {
        let outcome = tokio::select! {
            outcome = orchestrator.play(input) => outcome,
            _ = tokio::signal::ctrl_c() => {
                orchestrator.stop();
                info!("Interrupted");
                return Ok(());
            }
        };
        report(&outcome, json)?;
    }
    Ok(())
}

async fn say(
    config: PhonicsConfig,
    text: &str,
    rate: Option<f32>,
    pitch: Option<f32>,
    volume: Option<f32>,
) -> anyhow::Result<()> {
    let defaults = SpeechParams::from_config(&config.voice);
    let params = SpeechParams {
        rate: rate.unwrap_or(defaults.rate),
        pitch: pitch.unwrap_or(defaults.pitch),
        volume: volume.unwrap_or(defaults.volume),
    };
    params.validate()?;

    let orchestrator = PlaybackOrchestrator::with_default_devices(config)?;
    orchestrator.warm_up().await;

    let outcome = tokio::select! {
        outcome = orchestrator.speak_text(text, params) => outcome,
        _ = tokio::signal::ctrl_c() => {
            orchestrator.stop();
            return Ok(());
        }
    };
    report(&outcome, false)
}

fn report(outcome: &PlaybackOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(outcome)?);
        return Ok(());
    }

    let label = outcome
        .grapheme
        .as_ref()
        .map(|g| g.to_string())
        .unwrap_or_else(|| outcome.input.clone());
    match outcome.resolution {
        Resolution::Played(tier) => println!("{}: played ({})", label, tier),
        Resolution::Exhausted => println!("{}: no sound available", label),
        Resolution::Rejected => println!("{:?}: not a letter or known grapheme", outcome.input),
        Resolution::Superseded => println!("{}: interrupted", label),
    }
    Ok(())
}

fn show_path(config: PhonicsConfig, input: &str) -> anyhow::Result<()> {
    let grapheme = normalize(input).with_context(|| format!("{:?} is not a letter or known grapheme", input))?;
    let resolver = phonics_spk::AssetResolver::from_config(&config.audio);
    println!("{}", resolver.locator(&resolve_phoneme_key(&grapheme)));
    Ok(())
}

fn show_letters(lowercase: bool) {
    let case = if lowercase {
        KeyboardCase::Lower
    } else {
        KeyboardCase::Upper
    };

    println!("{:<6} {:<6} {:<8} {}", "KEY", "SOUND", "SPEECH", "PICTURE");
    for raw in known_graphemes() {
        let Some(grapheme) = normalize(raw) else {
            warn!("Sound table entry {:?} does not normalize", raw);
            continue;
        };
        println!(
            "{:<6} {:<6} {:<8} {}",
            case.display(&grapheme),
            resolve_phoneme_key(&grapheme),
            speech_text(&grapheme),
            icon_for(&grapheme).unwrap_or("-")
        );
    }
}

async fn show_voices(config: &PhonicsConfig) -> anyhow::Result<()> {
    let engine = EspeakEngine::new();
    if !engine.is_available() {
        anyhow::bail!("{} is not installed", engine.name());
    }

    let directory = VoiceDirectory::new(VoicePolicy::from_config(&config.voice));
    directory.refresh(&engine).await?;
    let selected = directory.selected();

    for voice in directory.candidates() {
        let marker = if selected.as_ref() == Some(&voice) { "*" } else { " " };
        println!("{} {:<14} {}", marker, voice.lang, voice.name);
    }
    if selected.is_none() {
        println!("No {} voice found; the engine default will be used", config.voice.language);
    }
    Ok(())
}
