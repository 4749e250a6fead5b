//! Backend selection.
//!
//! The native capability is resolved once from [`CoreConfig`] at the
//! application boundary. Every track created afterwards uses the resolved
//! backend; nothing probes the host again.

use crate::element::ElementTrack;
use crate::error::Result;
use crate::polled::PolledTrack;
use crate::track::AudioTrack;
use bridge_traits::{MediaElementFactory, MediaHandleFactory};
use core_runtime::config::{BackendPreference, CoreConfig, PlaybackConfig};
use core_runtime::Error;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// A resolved track backend.
#[derive(Clone)]
pub enum TrackBackend {
    /// Tracks wrap media elements that push their own lifecycle events.
    EventDriven {
        factory: Arc<dyn MediaElementFactory>,
        playback: PlaybackConfig,
    },
    /// Tracks wrap native handles sampled on a fixed cadence.
    PollDriven {
        factory: Arc<dyn MediaHandleFactory>,
        playback: PlaybackConfig,
    },
}

impl TrackBackend {
    /// Resolves the backend from injected capabilities.
    ///
    /// # Errors
    ///
    /// Returns a capability error when the preferred backend has no factory,
    /// or a configuration error for invalid playback settings.
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        config.validate()?;
        let playback = config.playback.clone();

        let backend = match config.preference {
            BackendPreference::EventDriven => config
                .element_factory
                .clone()
                .map(|factory| Self::EventDriven { factory, playback }),
            BackendPreference::PollDriven => config
                .handle_factory
                .clone()
                .map(|factory| Self::PollDriven { factory, playback }),
            BackendPreference::PreferPollDriven => match (&config.handle_factory, &config.element_factory) {
                (Some(factory), _) => Some(Self::PollDriven {
                    factory: Arc::clone(factory),
                    playback,
                }),
                (None, Some(factory)) => Some(Self::EventDriven {
                    factory: Arc::clone(factory),
                    playback,
                }),
                (None, None) => None,
            },
        };

        let backend = backend.ok_or_else(|| Error::CapabilityMissing {
            capability: "MediaHandleFactory | MediaElementFactory".to_string(),
            message: "No native media capability matches the backend preference".to_string(),
        })?;

        info!(backend = backend.name(), "Resolved track backend");
        Ok(backend)
    }

    pub fn event_driven(factory: Arc<dyn MediaElementFactory>, playback: PlaybackConfig) -> Self {
        Self::EventDriven { factory, playback }
    }

    pub fn poll_driven(factory: Arc<dyn MediaHandleFactory>, playback: PlaybackConfig) -> Self {
        Self::PollDriven { factory, playback }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::EventDriven { .. } => "event-driven",
            Self::PollDriven { .. } => "poll-driven",
        }
    }

    pub fn playback(&self) -> &PlaybackConfig {
        match self {
            Self::EventDriven { playback, .. } | Self::PollDriven { playback, .. } => playback,
        }
    }

    /// Creates a track bound to `src`.
    pub fn create_track(&self, src: impl Into<String>) -> Arc<dyn AudioTrack> {
        match self {
            Self::EventDriven { factory, playback } => {
                Arc::new(ElementTrack::new(src, Arc::clone(factory), playback))
            }
            Self::PollDriven { factory, playback } => {
                Arc::new(PolledTrack::new(src, Arc::clone(factory), playback.clone()))
            }
        }
    }
}

impl fmt::Debug for TrackBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackBackend")
            .field("kind", &self.name())
            .field("playback", self.playback())
            .finish()
    }
}
