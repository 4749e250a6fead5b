//! # Event-Driven Backend
//!
//! [`ElementTrack`] wraps a [`MediaElement`] that pushes its own granular
//! lifecycle events. The track translates each event into the minimal state
//! change and re-emits it under the matching [`StatusCode`]; it never invents
//! telemetry of its own.
//!
//! | native event | state change | status |
//! |--------------|--------------|--------|
//! | load start | - | `LoadStart` |
//! | loaded metadata | cache duration | `LoadedMetadata` |
//! | can play | loaded, not loading | `Starting` |
//! | can play through | - | `CanPlayThrough` |
//! | playing | playing, not finished | `Running` |
//! | pause | not playing | `Paused` |
//! | time update | progress, completed (while playing) | `Position` |
//! | duration change | cache duration | `DurationChange` |
//! | progress | - | `Progress` |
//! | suspend | - | `Suspend` |
//! | ended | finished, progress reset | `Stopped` |
//! | error | not playing | `Error` |
//!
//! Natural completion does not release the element; that is left to the
//! caller through [`AudioTrack::destroy`].

use crate::error::Result;
use crate::track::{
    clamp_volume, known_duration, seek_target, AudioTrack, PlaybackState, TrackFlags, TrackId,
};
use bridge_traits::{
    ElementEvent, ElementListener, MediaElement, MediaElementFactory, MediaError, Preload,
};
use core_runtime::config::PlaybackConfig;
use core_runtime::events::{Message, MessageChannel, MessageValue, StatusCode};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace, warn};

/// Track backed by an event-driven media element.
pub struct ElementTrack {
    id: TrackId,
    inner: Arc<ElementInner>,
}

struct ElementInner {
    src: String,
    preload: Preload,
    factory: Arc<dyn MediaElementFactory>,
    channel: MessageChannel,
    state: parking_lot::Mutex<ElementState>,
}

struct ElementState {
    element: Option<Arc<dyn MediaElement>>,
    /// Bumped whenever an element is created or released.
    generation: u64,
    flags: TrackFlags,
    progress: f64,
    completed: f64,
    duration: Option<f64>,
    volume: f64,
    last_error: Option<MediaError>,
}

impl ElementState {
    fn new() -> Self {
        Self {
            element: None,
            generation: 0,
            flags: TrackFlags::default(),
            progress: 0.0,
            completed: 0.0,
            duration: None,
            volume: 1.0,
            last_error: None,
        }
    }

    /// Caches a native duration reading. The cached duration never decreases.
    fn observe_duration(&mut self, raw: f64) {
        if let Some(duration) = known_duration(raw) {
            if self.duration.map_or(true, |current| duration > current) {
                self.duration = Some(duration);
            }
        }
    }

    fn reset(&mut self) {
        self.flags = TrackFlags::default();
        self.progress = 0.0;
        self.completed = 0.0;
        self.last_error = None;
    }
}

/// Listener handed to the element; routes events back to the track.
struct ElementEvents {
    inner: Weak<ElementInner>,
    generation: u64,
}

impl ElementListener for ElementEvents {
    fn on_event(&self, event: ElementEvent) {
        if let Some(inner) = self.inner.upgrade() {
            inner.handle_event(self.generation, event);
        }
    }
}

impl ElementTrack {
    /// Creates a track for `src` and its media element.
    ///
    /// When the factory cannot provide an element the track is inert until
    /// a later `play()` succeeds in creating one.
    pub fn new(
        src: impl Into<String>,
        factory: Arc<dyn MediaElementFactory>,
        config: &PlaybackConfig,
    ) -> Self {
        let inner = Arc::new(ElementInner {
            src: src.into(),
            preload: config.preload,
            factory,
            channel: MessageChannel::new(config.event_buffer_size),
            state: parking_lot::Mutex::new(ElementState::new()),
        });
        inner.attach();

        Self {
            id: TrackId::default(),
            inner,
        }
    }

    /// Preload hint the element was created with.
    pub fn preload(&self) -> Preload {
        self.inner.preload
    }

    fn element(&self) -> Option<Arc<dyn MediaElement>> {
        self.inner.state.lock().element.clone()
    }
}

impl ElementInner {
    /// Returns the current element, creating one if none exists.
    fn attach(self: &Arc<Self>) -> Option<Arc<dyn MediaElement>> {
        let generation = {
            let mut state = self.state.lock();
            if let Some(element) = &state.element {
                return Some(Arc::clone(element));
            }
            state.generation += 1;
            state.generation
        };

        let listener = Arc::new(ElementEvents {
            inner: Arc::downgrade(self),
            generation,
        });

        match self.factory.create(&self.src, self.preload, listener) {
            Ok(element) => {
                debug!(src = %self.src, preload = self.preload.as_str(), "Created media element");
                self.state.lock().element = Some(Arc::clone(&element));
                Some(element)
            }
            Err(e) => {
                warn!(src = %self.src, error = %e, "Media element unavailable, track is inert");
                None
            }
        }
    }

    fn handle_event(&self, generation: u64, event: ElementEvent) {
        let element = {
            let state = self.state.lock();
            if state.generation != generation {
                trace!(src = %self.src, ?event, "Ignoring event from released element");
                return;
            }
            state.element.clone()
        };

        // Native reads happen before taking the lock again
        let (current_time, native_duration) = match (&event, &element) {
            (
                ElementEvent::TimeUpdate | ElementEvent::LoadedMetadata | ElementEvent::DurationChange,
                Some(element),
            ) => (element.current_time(), element.duration()),
            _ => (0.0, f64::NAN),
        };

        let mut state = self.state.lock();
        if state.generation != generation {
            return;
        }

        let message = match event {
            ElementEvent::LoadStart => Message::new(StatusCode::LoadStart, MessageValue::None),
            ElementEvent::LoadedMetadata => {
                state.observe_duration(native_duration);
                Message::new(StatusCode::LoadedMetadata, MessageValue::None)
            }
            ElementEvent::CanPlay => {
                debug!(src = %self.src, "Loaded track");
                state.flags.is_loading = false;
                state.flags.has_loaded = true;
                Message::new(StatusCode::Starting, MessageValue::None)
            }
            ElementEvent::CanPlayThrough => {
                Message::new(StatusCode::CanPlayThrough, MessageValue::None)
            }
            ElementEvent::Playing => {
                info!(src = %self.src, "Playing track");
                state.flags.is_finished = false;
                state.flags.is_playing = true;
                Message::new(StatusCode::Running, MessageValue::None)
            }
            ElementEvent::Pause => {
                state.flags.is_playing = false;
                Message::new(StatusCode::Paused, MessageValue::None)
            }
            ElementEvent::Suspend => Message::new(StatusCode::Suspend, MessageValue::None),
            ElementEvent::Progress => Message::new(StatusCode::Progress, MessageValue::None),
            ElementEvent::DurationChange => {
                state.observe_duration(native_duration);
                let value = state
                    .duration
                    .map_or(MessageValue::None, MessageValue::Duration);
                Message::new(StatusCode::DurationChange, value)
            }
            ElementEvent::TimeUpdate => {
                // Zero readings show up while buffering and are not progress
                if state.flags.is_playing && current_time > 0.0 {
                    state.progress = current_time;
                    state.completed = match known_duration(native_duration) {
                        Some(duration) => {
                            ((current_time / duration * 100.0).trunc() / 100.0).min(1.0)
                        }
                        None => 0.0,
                    };
                }
                trace!(src = %self.src, position = state.progress, "Time update");
                Message::new(
                    StatusCode::Position,
                    MessageValue::Position {
                        completed: state.completed,
                        position: state.progress,
                    },
                )
            }
            ElementEvent::Ended => {
                info!(src = %self.src, "Finished playback");
                state.progress = 0.0;
                state.completed = 0.0;
                state.flags.has_loaded = false;
                state.flags.is_playing = false;
                state.flags.is_finished = true;
                Message::new(StatusCode::Stopped, MessageValue::None)
            }
            ElementEvent::Error(error) => {
                warn!(src = %self.src, %error, "Audio error");
                state.flags.is_playing = false;
                state.last_error = Some(error.clone());
                Message::new(StatusCode::Error, MessageValue::Error(error))
            }
        };

        self.channel.emit(message).ok();
    }
}

impl AudioTrack for ElementTrack {
    fn src(&self) -> &str {
        &self.inner.src
    }

    fn id(&self) -> Option<u64> {
        self.id.get()
    }

    fn set_id(&self, id: u64) -> Result<()> {
        self.id.set(id)
    }

    fn play(&self) {
        let Some(element) = self.inner.attach() else {
            return;
        };

        {
            let mut state = self.inner.state.lock();
            if !state.flags.has_loaded {
                info!(src = %self.inner.src, "Loading track");
                state.flags.is_loading = true;
            }
            state.flags.is_finished = false;
            state.last_error = None;
        }

        element.play();
    }

    fn pause(&self) {
        let element = {
            let mut state = self.inner.state.lock();
            if !state.flags.is_playing {
                return;
            }
            state.flags.is_playing = false;
            state.element.clone()
        };

        info!(src = %self.inner.src, "Pausing track");
        if let Some(element) = element {
            element.pause();
        }
    }

    fn stop(&self) {
        if self.element().is_none() {
            return;
        }
        self.pause();
        self.inner.state.lock().flags.is_finished = true;
    }

    fn seek_to(&self, time: f64, by_percent: bool) {
        let Some(element) = self.element() else {
            return;
        };
        let duration = if by_percent { self.duration() } else { None };

        self.inner
            .channel
            .emit(Message::new(StatusCode::Seek, MessageValue::Seek(time)))
            .ok();

        match seek_target(time, by_percent, duration) {
            Some(seconds) => {
                debug!(src = %self.inner.src, seconds, "Seeking");
                element.set_current_time(seconds.max(0.0));
            }
            None => debug!(src = %self.inner.src, time, "Duration unknown, percentage seek skipped"),
        }
    }

    fn set_volume(&self, volume: f64) {
        let volume = clamp_volume(volume);
        let element = {
            let mut state = self.inner.state.lock();
            state.volume = volume;
            state.element.clone()
        };
        if let Some(element) = element {
            element.set_volume(volume);
        }
    }

    fn destroy(&self) {
        let (element, was_playing) = {
            let mut state = self.inner.state.lock();
            let Some(element) = state.element.take() else {
                return;
            };
            let was_playing = state.flags.is_playing;
            state.generation += 1;
            state.reset();
            (element, was_playing)
        };

        if was_playing {
            element.pause();
        }
        info!(src = %self.inner.src, "Released track");
    }

    fn observer(&self) -> &MessageChannel {
        &self.inner.channel
    }

    fn duration(&self) -> Option<f64> {
        let element = {
            let state = self.inner.state.lock();
            if state.duration.is_some() {
                return state.duration;
            }
            state.element.clone()
        };

        let raw = element?.duration();
        let mut state = self.inner.state.lock();
        state.observe_duration(raw);
        state.duration
    }

    fn buffered_percent(&self) -> f64 {
        0.0
    }

    fn progress(&self) -> f64 {
        self.inner.state.lock().progress
    }

    fn completed(&self) -> f64 {
        self.inner.state.lock().completed
    }

    fn volume(&self) -> f64 {
        self.inner.state.lock().volume
    }

    fn can_play(&self) -> bool {
        let Some(element) = self.element() else {
            return false;
        };
        let src = self.inner.src.as_str();
        let extension = src.rsplit_once('.').map_or(src, |(_, extension)| extension);
        element.can_play_type(&format!("audio/{extension}"))
    }

    fn is_playing(&self) -> bool {
        self.inner.state.lock().flags.is_playing
    }

    fn is_finished(&self) -> bool {
        self.inner.state.lock().flags.is_finished
    }

    fn is_loading(&self) -> bool {
        self.inner.state.lock().flags.is_loading
    }

    fn has_loaded(&self) -> bool {
        self.inner.state.lock().flags.has_loaded
    }

    fn error(&self) -> Option<MediaError> {
        let (last_error, element) = {
            let state = self.inner.state.lock();
            (state.last_error.clone(), state.element.clone())
        };
        last_error.or_else(|| element.and_then(|element| element.error()))
    }

    fn state(&self) -> PlaybackState {
        self.inner.state.lock().flags.state()
    }
}

impl fmt::Debug for ElementTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementTrack")
            .field("src", &self.inner.src)
            .field("id", &self.id.get())
            .field("state", &self.state())
            .finish()
    }
}
