//! Tests for backend resolution from injected capabilities

mod common;

use bridge_traits::MediaElementFactory;
use common::{FakeElementFactory, FakeHandleFactory, HandleCommand};
use core_playback::{AudioTrack, PlaybackError, TrackBackend};
use core_runtime::config::{BackendPreference, CoreConfig, PlaybackConfig};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_prefers_poll_driven_when_both_injected() {
    let handles = FakeHandleFactory::new();
    let config = CoreConfig::builder()
        .handle_factory(handles.clone())
        .element_factory(FakeElementFactory::new())
        .build()
        .unwrap();

    let backend = TrackBackend::from_config(&config).unwrap();
    assert_eq!(backend.name(), "poll-driven");

    let track = backend.create_track("intro.mp3");
    assert_eq!(track.src(), "intro.mp3");

    track.play();
    assert_eq!(handles.created(), 1);
    assert!(matches!(
        handles.latest().commands()[0],
        HandleCommand::Play(_)
    ));
}

#[test]
fn test_falls_back_to_event_driven() {
    let elements = FakeElementFactory::new();
    let config = CoreConfig::builder()
        .element_factory(elements.clone())
        .build()
        .unwrap();

    let backend = TrackBackend::from_config(&config).unwrap();
    assert_eq!(backend.name(), "event-driven");

    let _track = backend.create_track("intro.ogg");
    assert_eq!(elements.created(), 1);
}

#[test]
fn test_explicit_preference_is_honored() {
    let config = CoreConfig::builder()
        .handle_factory(FakeHandleFactory::new())
        .element_factory(FakeElementFactory::new())
        .preference(BackendPreference::EventDriven)
        .build()
        .unwrap();

    let backend = TrackBackend::from_config(&config).unwrap();
    assert_eq!(backend.name(), "event-driven");
}

#[test]
fn test_missing_capability_is_reported() {
    // Fields are public, so a config can bypass the builder checks
    let elements: Arc<dyn MediaElementFactory> = FakeElementFactory::new();
    let config = CoreConfig {
        element_factory: Some(elements),
        handle_factory: None,
        preference: BackendPreference::PollDriven,
        playback: PlaybackConfig::default(),
    };

    let err = TrackBackend::from_config(&config).unwrap_err();
    assert!(err.is_capability_error());
    assert!(matches!(err, PlaybackError::Runtime(_)));
}

#[test]
fn test_playback_settings_are_carried() {
    let playback = PlaybackConfig::default().with_poll_interval(Duration::from_millis(500));
    let config = CoreConfig::builder()
        .handle_factory(FakeHandleFactory::new())
        .playback(playback.clone())
        .build()
        .unwrap();

    let backend = TrackBackend::from_config(&config).unwrap();
    assert_eq!(backend.playback(), &playback);
}

#[test]
fn test_inert_tracks_from_unavailable_factory() {
    let backend =
        TrackBackend::poll_driven(FakeHandleFactory::unavailable(), PlaybackConfig::default());
    let track = backend.create_track("intro.mp3");

    track.play();
    assert!(!track.can_play());
    assert!(!track.is_playing());

    let backend =
        TrackBackend::event_driven(FakeElementFactory::unavailable(), PlaybackConfig::default());
    let track = backend.create_track("intro.mp3");
    assert!(!track.can_play());
}
