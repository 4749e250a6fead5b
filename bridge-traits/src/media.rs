//! Native media primitive contracts.
//!
//! Two very different native audio sources sit behind these traits:
//!
//! - An **event-driven media element** ([`MediaElement`]) that pushes a rich
//!   set of lifecycle events and answers synchronous reads of its current
//!   time, duration and volume.
//! - A **poll-driven media handle** ([`MediaHandle`]) living behind a mobile
//!   WebView bridge. It only reports coarse status transitions through a
//!   listener and must be sampled for duration, buffering and position.
//!
//! Host applications provide a factory for whichever primitive their platform
//! ships. Native objects report back exclusively through the listener handed
//! to the factory; the core never registers ad-hoc closures on them.

use crate::{error::Result, platform::PlatformSendSync};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Shared Types
// ============================================================================

/// Error object reported by a native primitive.
///
/// Both primitive families use the same numeric code space (aborted, network,
/// decode, source not supported). The raw code is kept verbatim so callers
/// can interpret vendor-specific values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaError {
    /// Raw native error code.
    pub code: u16,
    /// Optional diagnostic message supplied by the native layer.
    pub message: Option<String>,
}

impl MediaError {
    pub const ABORTED: u16 = 1;
    pub const NETWORK: u16 = 2;
    pub const DECODE: u16 = 3;
    pub const SRC_NOT_SUPPORTED: u16 = 4;

    pub fn new(code: u16) -> Self {
        Self {
            code,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Classify the raw code.
    pub fn kind(&self) -> MediaErrorKind {
        match self.code {
            Self::ABORTED => MediaErrorKind::Aborted,
            Self::NETWORK => MediaErrorKind::Network,
            Self::DECODE => MediaErrorKind::Decode,
            Self::SRC_NOT_SUPPORTED => MediaErrorKind::SourceNotSupported,
            _ => MediaErrorKind::Other,
        }
    }
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{:?} ({}): {}", self.kind(), self.code, message),
            None => write!(f, "{:?} ({})", self.kind(), self.code),
        }
    }
}

/// Coarse classification of [`MediaError`] codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorKind {
    Aborted,
    Network,
    Decode,
    SourceNotSupported,
    Other,
}

// ============================================================================
// Event-Driven Primitive
// ============================================================================

/// Preload hint passed to the media element at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preload {
    #[default]
    None,
    Metadata,
    Auto,
}

impl Preload {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preload::None => "none",
            Preload::Metadata => "metadata",
            Preload::Auto => "auto",
        }
    }
}

/// Lifecycle events pushed by a [`MediaElement`].
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEvent {
    LoadStart,
    LoadedMetadata,
    CanPlay,
    CanPlayThrough,
    Playing,
    Pause,
    TimeUpdate,
    DurationChange,
    Progress,
    Suspend,
    Ended,
    Error(MediaError),
}

/// Receives every event a [`MediaElement`] fires.
pub trait ElementListener: PlatformSendSync {
    fn on_event(&self, event: ElementEvent);
}

/// In-process media element that reports its own lifecycle.
///
/// Reads are synchronous and never block. `duration()` returns `NaN` (or any
/// non-positive value) while the duration is unknown.
pub trait MediaElement: PlatformSendSync {
    fn play(&self);

    fn pause(&self);

    /// Current playback time in seconds.
    fn current_time(&self) -> f64;

    /// Move the playhead to `seconds`.
    fn set_current_time(&self, seconds: f64);

    /// Total duration in seconds, `NaN` when unknown.
    fn duration(&self) -> f64;

    fn paused(&self) -> bool;

    fn volume(&self) -> f64;

    fn set_volume(&self, volume: f64);

    /// Probe whether a MIME type such as `audio/mp3` can be played.
    fn can_play_type(&self, mime_type: &str) -> bool;

    /// Last error recorded by the element, if any.
    fn error(&self) -> Option<MediaError>;
}

/// Creates media elements bound to a single source.
pub trait MediaElementFactory: PlatformSendSync {
    /// Construct an element for `src`. Events are delivered to `listener`
    /// for the lifetime of the element.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotAvailable`](crate::BridgeError::NotAvailable)
    /// when the host cannot provide media elements.
    fn create(
        &self,
        src: &str,
        preload: Preload,
        listener: Arc<dyn ElementListener>,
    ) -> Result<Arc<dyn MediaElement>>;
}

// ============================================================================
// Poll-Driven Primitive
// ============================================================================

/// Coarse status transitions reported by a [`MediaHandle`].
///
/// Numeric values match the native bridge's wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HandleStatus {
    None = 0,
    Starting = 1,
    Running = 2,
    Paused = 3,
    Stopped = 4,
    /// The native layer entered an error state.
    Error = 9,
}

/// Options forwarded with every play command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayOptions {
    /// Keep playing while the device screen is locked.
    pub play_when_locked: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            play_when_locked: true,
        }
    }
}

/// Receives the callbacks of a [`MediaHandle`].
///
/// Callbacks may arrive on any thread at any time after the handle is
/// created, including after it has been released.
pub trait HandleListener: PlatformSendSync {
    /// Invoked on every status transition. `detail` carries the extra
    /// argument the bridge attaches to error-state transitions.
    fn on_status(&self, status: HandleStatus, detail: Option<MediaError>);

    /// Invoked once when playback reaches the end of the source.
    fn on_complete(&self);

    /// Invoked when the native layer fails to load or decode the source.
    fn on_error(&self, error: MediaError);

    /// Invoked when the bridge reports the handle's initial volume.
    fn on_initial_volume(&self, _volume: f64) {}
}

/// Native media handle that exposes no continuous telemetry.
///
/// Duration and buffered fraction are cheap synchronous reads of values the
/// bridge caches; the position has to travel across the bridge and is pulled
/// asynchronously.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaHandle: PlatformSendSync {
    /// Duration in seconds, negative while unknown.
    fn duration(&self) -> f64;

    /// Downloaded fraction of the source in `[0, 1]`.
    fn buffered_fraction(&self) -> f64;

    /// Pull the current position in seconds. A negative value means the
    /// position is not available yet.
    async fn current_position(&self) -> Result<f64>;

    fn play(&self, options: PlayOptions);

    fn pause(&self);

    fn stop(&self);

    fn seek_to(&self, millis: u64);

    fn set_volume(&self, volume: f64);

    /// Release the OS-level resources backing this handle.
    fn release(&self);
}

/// Creates media handles bound to a single source.
pub trait MediaHandleFactory: PlatformSendSync {
    /// Construct a handle for `src` reporting to `listener`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotAvailable`](crate::BridgeError::NotAvailable)
    /// when the native bridge is missing.
    fn create(&self, src: &str, listener: Arc<dyn HandleListener>)
        -> Result<Arc<dyn MediaHandle>>;
}
