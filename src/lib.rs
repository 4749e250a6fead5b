//! Facade crate for the track layer.
//!
//! Host applications depend on `track-bridge` alone and reach the workspace
//! crates through the re-exports below: native contracts from
//! `bridge-traits`, the message channel and configuration from
//! `core-runtime`, and the tracks themselves from `core-playback`.

pub use bridge_traits as bridge;
pub use core_playback as playback;
pub use core_runtime as runtime;

pub use core_playback::{
    AudioTrack, ElementTrack, PlaybackError, PlaybackState, PolledTrack, TrackBackend,
};
pub use core_runtime::{
    BackendPreference, CoreConfig, Message, MessageChannel, MessageStream, MessageValue,
    PlaybackConfig, StatusCode,
};
