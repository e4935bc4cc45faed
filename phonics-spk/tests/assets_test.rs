//! Tests for bundled sound file lookup

use phonics_core::config::AudioConfig;
use phonics_core::PhonemeKey;
use phonics_spk::{asset_source, AssetResolver, AssetSource, AudioError, FsAssets};
use std::time::Duration;

#[tokio::test]
async fn test_fs_assets_fetch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("SH.mp3"), b"mp3-bytes").unwrap();

    let resolver = AssetResolver::new(dir.path().to_string_lossy(), ".mp3", 3);
    let assets = FsAssets::new(resolver);

    let clip = assets.fetch(&PhonemeKey::new("sh")).await.unwrap();
    assert_eq!(clip.as_ref(), b"mp3-bytes");

    match assets.fetch(&PhonemeKey::new("ch")).await {
        Err(AudioError::AssetNotFound(path)) => assert!(path.ends_with("CH.mp3")),
        other => panic!("expected AssetNotFound, got {:?}", other.map(|b| b.len())),
    }
}

#[tokio::test]
async fn test_locator_carries_cache_version() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_string_lossy().to_string();
    let assets = FsAssets::new(AssetResolver::new(format!("{}/", root), ".mp3", 3));
    assert_eq!(assets.locate(&PhonemeKey::new("c")), format!("{}/C.mp3?v=3", root));
}

#[test]
fn test_asset_source_selection() {
    let local = AudioConfig::default();
    let source = asset_source(&local, Duration::from_secs(1)).unwrap();
    assert_eq!(source.locate(&PhonemeKey::new("a")), "audio/phonics/en-GB/A.mp3?v=3");

    let remote = AudioConfig {
        asset_root: "https://sounds.example.org/en-GB".to_string(),
        ..AudioConfig::default()
    };
    let source = asset_source(&remote, Duration::from_secs(1)).unwrap();
    assert_eq!(
        source.locate(&PhonemeKey::new("ai")),
        "https://sounds.example.org/en-GB/AI.mp3?v=3"
    );
}
