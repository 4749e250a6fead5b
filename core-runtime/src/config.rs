//! # Core Configuration Module
//!
//! Provides configuration and capability injection for the track layer.
//!
//! ## Overview
//!
//! Native media capabilities are resolved exactly once, at the application
//! boundary, and handed to the core through a [`CoreConfig`]. Nothing in the
//! track layer probes ambient global state to discover what the host offers.
//!
//! ## Capabilities
//!
//! - `MediaHandleFactory` - Poll-driven native handles (mobile WebView bridge)
//! - `MediaElementFactory` - Event-driven media elements (browser / desktop)
//!
//! At least one capability matching the [`BackendPreference`] is required.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{BackendPreference, CoreConfig, PlaybackConfig};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .handle_factory(Arc::new(BridgeMediaFactory::new()))
//!     .preference(BackendPreference::PollDriven)
//!     .playback(PlaybackConfig::default())
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! The builder fails fast with an actionable
//! [`Error::CapabilityMissing`] when the preferred backend cannot be served:
//!
//! ```should_panic
//! use core_runtime::config::{BackendPreference, CoreConfig};
//!
//! let config = CoreConfig::builder()
//!     .preference(BackendPreference::EventDriven)
//!     .build()
//!     .expect("Should fail - no media element factory");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{MediaElementFactory, MediaHandleFactory, Preload};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for the poll interval.
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);

// ============================================================================
// Playback Configuration
// ============================================================================

/// Per-track playback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Sampling period of the poll-driven backend.
    ///
    /// Default: 1 second.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Messages buffered per subscriber before it starts lagging.
    ///
    /// Default: 100.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Preload hint for event-driven media elements.
    ///
    /// Default: `none`.
    #[serde(default)]
    pub preload: Preload,

    /// Keep playing while the screen is locked (poll-driven handles).
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub play_when_locked: bool,

    /// Release the native handle when playback completes naturally.
    ///
    /// Only the poll-driven backend honors this; event-driven elements are
    /// cheap and stay alive until the caller destroys the track.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub release_on_complete: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            event_buffer_size: default_event_buffer_size(),
            preload: Preload::default(),
            play_when_locked: true,
            release_on_complete: true,
        }
    }
}

impl PlaybackConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn with_preload(mut self, preload: Preload) -> Self {
        self.preload = preload;
        self
    }

    pub fn with_play_when_locked(mut self, enabled: bool) -> Self {
        self.play_when_locked = enabled;
        self
    }

    pub fn with_release_on_complete(mut self, enabled: bool) -> Self {
        self.release_on_complete = enabled;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config(
                "Poll interval must be greater than 0ms".to_string(),
            ));
        }

        if self.poll_interval > MAX_POLL_INTERVAL {
            return Err(Error::Config(
                "Poll interval exceeds maximum of 60 seconds".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Core Configuration
// ============================================================================

/// Which backend the host wants tracks to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPreference {
    /// Require the poll-driven native handle.
    PollDriven,
    /// Require the event-driven media element.
    EventDriven,
    /// Use the poll-driven handle when injected, else the media element.
    #[default]
    PreferPollDriven,
}

/// Core configuration holding injected capabilities and playback settings.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Factory for event-driven media elements
    pub element_factory: Option<Arc<dyn MediaElementFactory>>,

    /// Factory for poll-driven media handles
    pub handle_factory: Option<Arc<dyn MediaHandleFactory>>,

    /// Backend selection policy
    pub preference: BackendPreference,

    /// Per-track settings
    pub playback: PlaybackConfig,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field(
                "element_factory",
                &self
                    .element_factory
                    .as_ref()
                    .map(|_| "MediaElementFactory { ... }"),
            )
            .field(
                "handle_factory",
                &self
                    .handle_factory
                    .as_ref()
                    .map(|_| "MediaHandleFactory { ... }"),
            )
            .field("preference", &self.preference)
            .field("playback", &self.playback)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates settings and checks that the preferred backend is available.
    pub fn validate(&self) -> Result<()> {
        self.playback.validate()?;

        match self.preference {
            BackendPreference::PollDriven if self.handle_factory.is_none() => {
                Err(handle_factory_missing_error())
            }
            BackendPreference::EventDriven if self.element_factory.is_none() => {
                Err(element_factory_missing_error())
            }
            BackendPreference::PreferPollDriven
                if self.handle_factory.is_none() && self.element_factory.is_none() =>
            {
                Err(Error::CapabilityMissing {
                    capability: "MediaHandleFactory | MediaElementFactory".to_string(),
                    message: "No native media capability was injected. \
                             Mobile: inject the WebView bridge's media handle factory. \
                             Browser/desktop: inject a media element factory."
                        .to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

fn handle_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaHandleFactory".to_string(),
        message: "Poll-driven playback requires a MediaHandleFactory. \
                 Mobile: inject the WebView bridge's media handle factory, \
                 or select BackendPreference::EventDriven."
            .to_string(),
    }
}

fn element_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaElementFactory".to_string(),
        message: "Event-driven playback requires a MediaElementFactory. \
                 Browser/desktop: inject a media element factory, \
                 or select BackendPreference::PollDriven."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    element_factory: Option<Arc<dyn MediaElementFactory>>,
    handle_factory: Option<Arc<dyn MediaHandleFactory>>,
    preference: BackendPreference,
    playback: Option<PlaybackConfig>,
}

impl CoreConfigBuilder {
    /// Injects the event-driven media element factory.
    pub fn element_factory(mut self, factory: Arc<dyn MediaElementFactory>) -> Self {
        self.element_factory = Some(factory);
        self
    }

    /// Injects the poll-driven media handle factory.
    pub fn handle_factory(mut self, factory: Arc<dyn MediaHandleFactory>) -> Self {
        self.handle_factory = Some(factory);
        self
    }

    pub fn preference(mut self, preference: BackendPreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = Some(playback);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] when the preferred backend has no
    /// factory and [`Error::Config`] for invalid playback settings.
    pub fn build(self) -> Result<CoreConfig> {
        let config = CoreConfig {
            element_factory: self.element_factory,
            handle_factory: self.handle_factory,
            preference: self.preference,
            playback: self.playback.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
