//! End-to-end tier resolution tests for the playback orchestrator

mod common;

use common::*;
use phonics_spk::{PlaybackState, Resolution, SpeechParams, Tier, TierResult};
use phonics_storage::{Recording, RecordingStore};
use std::time::Duration;

async fn wait_for_state(harness: &Harness, want: PlaybackState) {
    let mut rx = harness.orchestrator.subscribe_state();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|state| *state == want))
        .await
        .expect("state reached in time")
        .expect("state channel open");
}

#[tokio::test]
async fn test_custom_recording_wins() {
    let h = Harness::new(test_config(), FakeAssets::new().with_file("B", b"file-b"));
    h.store.save("b", Recording::wav(&b"my-b"[..])).await.unwrap();

    let outcome = h.orchestrator.play("b").await;
    assert_eq!(outcome.resolution, Resolution::Played(Tier::CustomRecording));
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(outcome.key.as_ref().unwrap().as_str(), "B");

    // Lower tiers never consulted
    assert_eq!(h.assets.fetch_count(), 0);
    assert!(h.spoken().is_empty());
    assert_eq!(h.output.started(), vec![bytes::Bytes::from_static(b"my-b")]);
    assert_eq!(h.orchestrator.state(), PlaybackState::Idle);
    assert!(!h.orchestrator.is_active());
}

#[tokio::test]
async fn test_deleted_recording_falls_back_to_file() {
    let h = Harness::new(test_config(), FakeAssets::new().with_file("B", b"file-b"));
    h.store.save("B", Recording::wav(&b"my-b"[..])).await.unwrap();
    h.store.delete("B").await.unwrap();

    let outcome = h.orchestrator.play("B").await;
    assert_eq!(outcome.resolution, Resolution::Played(Tier::StaticFile));
    assert_eq!(outcome.result_for(Tier::CustomRecording), Some(&TierResult::Missing));
    assert_eq!(h.output.started(), vec![bytes::Bytes::from_static(b"file-b")]);
    assert!(h.spoken().is_empty());
}

#[tokio::test]
async fn test_missing_file_falls_back_to_speech() {
    let h = Harness::new(test_config(), FakeAssets::new());

    let outcome = h.orchestrator.play("b").await;
    assert_eq!(outcome.resolution, Resolution::Played(Tier::Speech));
    assert_eq!(outcome.result_for(Tier::StaticFile), Some(&TierResult::Missing));
    assert_eq!(h.spoken(), vec!["buh".to_string()]);

    let utterances = h.speech.utterances.lock().clone();
    assert_eq!(utterances[0].voice.as_ref().unwrap().name, "Google UK English Female");
    assert!((utterances[0].params.rate - 0.85).abs() < f32::EPSILON);
    assert_eq!(h.output.started(), vec![bytes::Bytes::from_static(b"speech:buh")]);
}

#[tokio::test]
async fn test_digraphs_share_the_mapped_sound() {
    let h = Harness::new(test_config(), FakeAssets::new().with_file("QU", b"file-qu"));
    h.store.save("C", Recording::wav(&b"my-c"[..])).await.unwrap();

    for input in ["ck", "k", "C"] {
        let outcome = h.orchestrator.play(input).await;
        assert_eq!(outcome.resolution, Resolution::Played(Tier::CustomRecording), "{}", input);
        assert_eq!(outcome.key.as_ref().unwrap().as_str(), "C");
    }

    let outcome = h.orchestrator.play("q").await;
    assert_eq!(outcome.grapheme.as_ref().unwrap().as_str(), "Q");
    assert_eq!(outcome.resolution, Resolution::Played(Tier::StaticFile));
}

#[tokio::test]
async fn test_invalid_input_rejected_without_side_effects() {
    let h = Harness::new(test_config(), FakeAssets::new().with_file("A", b"file-a"));

    for input in ["", "   ", "1", "xyz", "é", "!"] {
        let outcome = h.orchestrator.play(input).await;
        assert_eq!(outcome.resolution, Resolution::Rejected, "{:?}", input);
        assert!(outcome.attempts.is_empty());
    }

    assert!(h.output.started().is_empty());
    assert_eq!(h.assets.fetch_count(), 0);
    assert!(h.spoken().is_empty());
    assert_eq!(h.orchestrator.state(), PlaybackState::Idle);
}

#[tokio::test]
async fn test_rejected_input_leaves_current_sound_playing() {
    let h = Harness::new(test_config(), FakeAssets::new().with_file("A", ENDLESS));
    let first = {
        let orchestrator = h.orchestrator.clone();
        tokio::spawn(async move { orchestrator.play("a").await })
    };
    wait_for_state(&h, PlaybackState::Playing(Tier::StaticFile)).await;

    assert_eq!(h.orchestrator.play("7").await.resolution, Resolution::Rejected);
    assert_eq!(h.output.live(), 1);

    h.orchestrator.stop();
    assert_eq!(first.await.unwrap().resolution, Resolution::Superseded);
}

#[tokio::test]
async fn test_broken_recording_falls_through_once() {
    let h = Harness::new(test_config(), FakeAssets::new().with_file("S", b"file-s"));
    h.store.save("S", Recording::wav(BROKEN)).await.unwrap();

    let outcome = h.orchestrator.play("s").await;
    assert_eq!(outcome.resolution, Resolution::Played(Tier::StaticFile));
    assert!(matches!(outcome.result_for(Tier::CustomRecording), Some(TierResult::Failed(_))));

    // The recording was tried exactly once
    let started = h.output.started();
    assert_eq!(started.len(), 2);
    assert_eq!(started[0].as_ref(), BROKEN);
    assert_eq!(h.output.live(), 0);
}

#[tokio::test]
async fn test_empty_recording_is_missing() {
    let h = Harness::new(test_config(), FakeAssets::new().with_file("N", b"file-n"));
    h.store.save("N", Recording::wav(Vec::<u8>::new())).await.unwrap();

    let outcome = h.orchestrator.play("n").await;
    assert_eq!(outcome.result_for(Tier::CustomRecording), Some(&TierResult::Missing));
    assert_eq!(outcome.resolution, Resolution::Played(Tier::StaticFile));
}

#[tokio::test]
async fn test_undecodable_file_falls_to_speech() {
    let h = Harness::new(test_config(), FakeAssets::new().with_file("T", UNDECODABLE));

    let outcome = h.orchestrator.play("t").await;
    assert!(matches!(outcome.result_for(Tier::StaticFile), Some(TierResult::Failed(_))));
    assert_eq!(outcome.resolution, Resolution::Played(Tier::Speech));
    assert_eq!(h.spoken(), vec!["tuh".to_string()]);
}

#[tokio::test]
async fn test_stalled_file_times_out_to_speech() {
    let h = Harness::new(test_config(), FakeAssets::new().with_stalled("B"));

    let started = tokio::time::Instant::now();
    let outcome = h.orchestrator.play("b").await;
    assert_eq!(outcome.resolution, Resolution::Played(Tier::Speech));
    match outcome.result_for(Tier::StaticFile) {
        Some(TierResult::Failed(reason)) => assert!(reason.contains("not ready"), "{}", reason),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_endless_clip_cut_off_by_playback_timeout() {
    let mut config = test_config();
    config.playback.playback_timeout_ms = 100;
    let h = Harness::new(config, FakeAssets::new().with_file("M", ENDLESS));

    let outcome = h.orchestrator.play("m").await;
    assert_eq!(outcome.resolution, Resolution::Played(Tier::StaticFile));
    assert!(!outcome.attempted(Tier::Speech));
    assert!(h.spoken().is_empty());
    assert_eq!(h.output.stats.stops.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(h.output.live(), 0);
    assert_eq!(h.orchestrator.state(), PlaybackState::Idle);
}

#[tokio::test]
async fn test_long_recording_never_reaches_lower_tiers() {
    let mut config = test_config();
    config.playback.playback_timeout_ms = 100;
    let h = Harness::with_clip_duration(
        config,
        FakeAssets::new().with_file("B", b"file-b"),
        Duration::from_millis(300),
    );
    h.store.save("B", Recording::wav(&b"my-long-b"[..])).await.unwrap();

    let outcome = h.orchestrator.play("b").await;
    assert_eq!(outcome.resolution, Resolution::Played(Tier::CustomRecording));
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(h.output.started(), vec![bytes::Bytes::from_static(b"my-long-b")]);
    assert_eq!(h.assets.fetch_count(), 0);
    assert!(h.spoken().is_empty());
    assert_eq!(h.output.live(), 0);
}

#[tokio::test]
async fn test_multi_letter_spoken_as_written() {
    let h = Harness::new(test_config(), FakeAssets::new());

    let outcome = h.orchestrator.play("SH").await;
    assert_eq!(outcome.resolution, Resolution::Played(Tier::Speech));
    assert_eq!(h.spoken(), vec!["sh".to_string()]);
}

#[tokio::test]
async fn test_multi_letter_speech_disabled() {
    let mut config = test_config();
    config.playback.synthesize_multi_letter = false;
    let h = Harness::new(config, FakeAssets::new());

    let outcome = h.orchestrator.play("igh").await;
    assert_eq!(outcome.resolution, Resolution::Exhausted);
    assert!(matches!(outcome.result_for(Tier::Speech), Some(TierResult::Skipped(_))));
    assert!(h.spoken().is_empty());
    assert_eq!(h.orchestrator.state(), PlaybackState::Idle);

    // Single letters still reach speech
    assert_eq!(h.orchestrator.play("i").await.resolution, Resolution::Played(Tier::Speech));
}

#[tokio::test]
async fn test_all_tiers_fail() {
    let h = Harness::with_speech(test_config(), FakeAssets::new(), speech_stub(Vec::new(), false));

    let outcome = h.orchestrator.play("d").await;
    assert_eq!(outcome.resolution, Resolution::Exhausted);
    assert!(Tier::ORDER.iter().all(|tier| outcome.attempted(*tier)));
    assert!(h.output.started().is_empty());
    assert_eq!(h.orchestrator.state(), PlaybackState::Idle);
    assert!(!h.orchestrator.is_active());
}

#[tokio::test]
async fn test_voice_list_loaded_on_first_speech() {
    let h = Harness::new(test_config(), FakeAssets::new());
    assert!(!h.orchestrator.voices().is_settled());

    h.orchestrator.play("b").await;
    h.orchestrator.play("d").await;

    assert!(h.orchestrator.voices().is_settled());
    assert_eq!(h.speech.voice_queries.load(std::sync::atomic::Ordering::SeqCst), 1);
    let utterances = h.speech.utterances.lock().clone();
    assert!(utterances
        .iter()
        .all(|u| u.voice.as_ref().map(|v| v.name.as_str()) == Some("Google UK English Female")));
}

#[tokio::test]
async fn test_no_regional_voice_uses_engine_default() {
    let speech = speech_stub(vec![phonics_spk::VoiceCandidate::new("Samantha", "en-US")], true);
    let h = Harness::with_speech(test_config(), FakeAssets::new(), speech);

    assert_eq!(h.orchestrator.play("g").await.resolution, Resolution::Played(Tier::Speech));
    let utterances = h.speech.utterances.lock().clone();
    assert!(utterances[0].voice.is_none());
    assert_eq!(utterances[0].language, "en-GB");
}

#[tokio::test]
async fn test_speak_text() {
    let h = Harness::new(test_config(), FakeAssets::new());
    let params = SpeechParams {
        rate: 1.0,
        pitch: 1.0,
        volume: 0.5,
    };

    let outcome = h.orchestrator.speak_text("Well done!", params).await;
    assert_eq!(outcome.resolution, Resolution::Played(Tier::Speech));
    assert!(outcome.grapheme.is_none());

    let utterances = h.speech.utterances.lock().clone();
    assert_eq!(utterances[0].text, "Well done!");
    assert_eq!(utterances[0].params, params);

    assert_eq!(h.orchestrator.speak_text("  ", params).await.resolution, Resolution::Rejected);
    let bad = SpeechParams { volume: 3.0, ..params };
    assert_eq!(h.orchestrator.speak_text("cat", bad).await.resolution, Resolution::Rejected);
}

#[tokio::test]
async fn test_audio_path() {
    let h = Harness::new(test_config(), FakeAssets::new());
    assert_eq!(h.orchestrator.audio_path("ck").as_deref(), Some("test://C"));
    assert_eq!(h.orchestrator.audio_path(" ai ").as_deref(), Some("test://AI"));
    assert_eq!(h.orchestrator.audio_path("?"), None);
}

#[tokio::test]
async fn test_update_settings() {
    let h = Harness::new(test_config(), FakeAssets::new());

    h.orchestrator.update_settings(Some(1.2), Some(0.5)).unwrap();
    let config = h.orchestrator.config();
    assert!((config.voice.rate - 1.2).abs() < f32::EPSILON);
    assert!((config.audio.volume - 0.5).abs() < f32::EPSILON);

    assert!(h.orchestrator.update_settings(None, Some(2.0)).is_err());
    assert!((h.orchestrator.config().audio.volume - 0.5).abs() < f32::EPSILON);

    h.orchestrator.play("f").await;
    let utterances = h.speech.utterances.lock().clone();
    assert!((utterances[0].params.rate - 1.2).abs() < f32::EPSILON);
    assert!((utterances[0].params.volume - 0.5).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_warm_up() {
    let h = Harness::new(test_config(), FakeAssets::new());
    h.orchestrator.warm_up().await;

    assert_eq!(h.output.stats.warm_ups.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(h.orchestrator.voices().is_settled());
    assert_eq!(
        h.orchestrator.voices().selected().unwrap().name,
        "Google UK English Female"
    );
}
