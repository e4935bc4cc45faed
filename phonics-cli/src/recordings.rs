// Custom recording management: record, list, delete, import

use anyhow::Context;
use clap::Subcommand;
use phonics_core::{normalize, resolve_phoneme_key, PhonemeKey, PhonicsConfig};
use phonics_sc::AudioRecorder;
use phonics_storage::{Recording, RecordingStore, SledRecordingStore};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const MAX_IMPORT_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Subcommand)]
pub enum RecordingCommands {
    /// List sound keys that have a custom recording
    List,

    /// Delete the custom recording for a letter or grapheme
    Delete { input: String },

    /// Save an existing audio file as the custom recording for a letter or grapheme
    Import { input: String, file: PathBuf },
}

fn sound_key(input: &str) -> anyhow::Result<PhonemeKey> {
    let grapheme = normalize(input).with_context(|| format!("{:?} is not a letter or known grapheme", input))?;
    Ok(resolve_phoneme_key(&grapheme))
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("webm") => "audio/webm",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

pub async fn handle(config: &PhonicsConfig, cmd: RecordingCommands) -> anyhow::Result<()> {
    let store = SledRecordingStore::from_config(&config.storage);

    match cmd {
        RecordingCommands::List => {
            let keys = store.list_keys().await?;
            if keys.is_empty() {
                println!("No custom recordings in {}", store.path().display());
            }
            for key in keys {
                match store.get(&key).await? {
                    Some(rec) => println!(
                        "{:<6} {:>8} bytes  {:<12} {}",
                        key,
                        rec.audio.len(),
                        rec.mime,
                        rec.recorded_at.to_rfc3339()
                    ),
                    None => println!("{}", key),
                }
            }
        }
        RecordingCommands::Delete { input } => {
            let key = sound_key(&input)?;
            store.delete(key.as_str()).await?;
            println!("Deleted recording for {}", key);
        }
        RecordingCommands::Import { input, file } => {
            let key = sound_key(&input)?;
            let size = tokio::fs::metadata(&file)
                .await
                .with_context(|| format!("Cannot read {}", file.display()))?
                .len();
            if size > MAX_IMPORT_SIZE {
                anyhow::bail!("{} is too large ({} bytes, max {})", file.display(), size, MAX_IMPORT_SIZE);
            }

            let audio = tokio::fs::read(&file).await?;
            store.save(key.as_str(), Recording::new(audio, mime_for(&file))).await?;
            println!("Saved {} as the recording for {}", file.display(), key);
        }
    }
    Ok(())
}

pub async fn record(config: &PhonicsConfig, input: &str, seconds: u64, device: Option<String>) -> anyhow::Result<()> {
    let key = sound_key(input)?;
    let recorder = match device {
        Some(name) => AudioRecorder::with_device(name),
        None => AudioRecorder::new(),
    };

    recorder.start()?;
    println!("Recording {} for {} s...", key, seconds);
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
        _ = tokio::signal::ctrl_c() => info!("Recording stopped early"),
    }
    let recording = recorder.stop()?;

    if recording.is_empty() {
        warn!("Nothing was captured for {}", key);
        anyhow::bail!("No audio captured");
    }

    let store = SledRecordingStore::from_config(&config.storage);
    let size = recording.audio.len();
    store.save(key.as_str(), recording).await?;
    println!("Saved {} bytes as the recording for {}", size, key);
    Ok(())
}
