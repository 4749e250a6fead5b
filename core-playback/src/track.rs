//! # Track Contract
//!
//! The backend-agnostic interface every track implements, plus the pieces of
//! state both backends share.
//!
//! ## Overview
//!
//! A track is bound to one immutable `src` for its whole life. Commands
//! (`play`, `pause`, `stop`, `seek_to`, `set_volume`, `destroy`) never block
//! and never fail; their effects are observed through the track's
//! [`MessageChannel`]. Getters are reads of cached state, except `duration`
//! and `buffered_percent` which may pull lazily from the native object while
//! the cached value is still unknown.
//!
//! ## Lifecycle
//!
//! | from | trigger | to |
//! |------|---------|----|
//! | `Idle` | `play()` | `Loading` |
//! | `Loading` | native reports the source loaded | `Ready` |
//! | `Loading` / `Ready` | native reports running | `Playing` |
//! | `Playing` | `pause()`, stall detected | `Ready` |
//! | `Playing` | end of source | `Finished` |
//! | `Finished` | `play()` | `Loading` |
//! | any | `destroy()` | `Idle` (the channel survives) |

use crate::error::{PlaybackError, Result};
use bridge_traits::platform::PlatformSendSync;
use bridge_traits::MediaError;
use core_runtime::events::{MessageChannel, MessageStream};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ============================================================================
// Playback State
// ============================================================================

/// Coarse playback state derived from a track's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing loaded yet, or the native object was released.
    #[default]
    Idle,
    /// `play()` was issued and the source is still loading.
    Loading,
    /// The source is loaded but not playing.
    Ready,
    Playing,
    /// Playback reached the end of the source.
    Finished,
}

/// The four flags the playback state is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TrackFlags {
    pub is_playing: bool,
    pub is_finished: bool,
    pub is_loading: bool,
    pub has_loaded: bool,
}

impl TrackFlags {
    pub fn state(&self) -> PlaybackState {
        if self.is_playing {
            PlaybackState::Playing
        } else if self.is_finished {
            PlaybackState::Finished
        } else if self.is_loading {
            PlaybackState::Loading
        } else if self.has_loaded {
            PlaybackState::Ready
        } else {
            PlaybackState::Idle
        }
    }
}

// ============================================================================
// Track Identity
// ============================================================================

/// Identity assigned once by the owning collection.
#[derive(Debug, Default)]
pub(crate) struct TrackId(OnceLock<u64>);

impl TrackId {
    pub fn get(&self) -> Option<u64> {
        self.0.get().copied()
    }

    pub fn set(&self, id: u64) -> Result<()> {
        self.0.set(id).map_err(|requested| PlaybackError::IdAlreadyAssigned {
            current: self.get().unwrap_or(requested),
            requested,
        })
    }
}

// ============================================================================
// Numeric helpers
// ============================================================================

/// Clamps a volume to `[0, 1]`. `NaN` maps to 0.
pub(crate) fn clamp_volume(volume: f64) -> f64 {
    volume.max(0.0).min(1.0)
}

/// Rounds to 2 decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Seconds targeted by a seek. `None` when a percentage seek cannot be
/// resolved because the duration is unknown.
pub(crate) fn seek_target(time: f64, by_percent: bool, duration: Option<f64>) -> Option<f64> {
    if by_percent {
        duration.map(|duration| time * duration / 100.0)
    } else {
        Some(time)
    }
}

/// Returns the duration if the native value denotes a known duration.
pub(crate) fn known_duration(raw: f64) -> Option<f64> {
    (raw.is_finite() && raw > 0.0).then_some(raw)
}

// ============================================================================
// Audio Track
// ============================================================================

/// Unified playback contract implemented by every backend.
///
/// Tracks are shared behind `Arc<dyn AudioTrack>`; all methods take `&self`.
///
/// # Example
///
/// ```ignore
/// let track = backend.create_track("https://cdn.example.com/song.mp3");
/// let mut messages = track.subscribe();
///
/// track.play();
/// while let Ok(message) = messages.recv().await {
///     println!("{} -> {:?}", message.event_name(), message.value());
/// }
/// ```
pub trait AudioTrack: PlatformSendSync {
    /// Immutable source identifier.
    fn src(&self) -> &str;

    /// Identity assigned by the owning collection, if any.
    fn id(&self) -> Option<u64>;

    /// Assigns the track's identity.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::IdAlreadyAssigned`] on a second assignment.
    fn set_id(&self, id: u64) -> Result<()>;

    /// Starts playback, recreating the native object if it was released.
    fn play(&self);

    /// Pauses playback. No-op when not playing.
    fn pause(&self);

    fn stop(&self);

    /// Seeks to `time` seconds, or to `time` percent of the duration when
    /// `by_percent` is set. Emits a `Seek` message carrying `time` as given.
    fn seek_to(&self, time: f64, by_percent: bool);

    /// Stores `volume` clamped to `[0, 1]` and pushes it to the native object.
    fn set_volume(&self, volume: f64);

    /// Releases the native object and resets transient state. The message
    /// channel stays open and a later `play()` emits on it again.
    fn destroy(&self);

    /// The track's long-lived message channel. Always the same instance.
    fn observer(&self) -> &MessageChannel;

    /// Subscribes to the track's message channel.
    fn subscribe(&self) -> MessageStream {
        self.observer().subscribe()
    }

    /// Duration in seconds, `None` while unknown.
    fn duration(&self) -> Option<f64>;

    /// Downloaded fraction of the source in `[0, 1]`.
    fn buffered_percent(&self) -> f64;

    /// Elapsed seconds.
    fn progress(&self) -> f64;

    /// `progress / duration` in `[0, 1]`, 0 while the duration is unknown.
    fn completed(&self) -> f64;

    fn volume(&self) -> f64;

    /// Whether the source can be played by the native layer.
    fn can_play(&self) -> bool;

    fn is_playing(&self) -> bool;

    fn is_finished(&self) -> bool;

    fn is_loading(&self) -> bool;

    fn has_loaded(&self) -> bool;

    /// Last native error since the track was last played or destroyed.
    fn error(&self) -> Option<MediaError>;

    fn state(&self) -> PlaybackState;
}
