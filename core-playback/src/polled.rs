//! # Poll-Driven Backend
//!
//! [`PolledTrack`] wraps a [`MediaHandle`] that only reports coarse status
//! transitions. Duration, buffering and position are synthesized by sampling
//! the handle on a fixed cadence while it exists.
//!
//! ## Native status mapping
//!
//! | status | effect |
//! |--------|--------|
//! | starting | loaded |
//! | running | playing, not loading |
//! | paused / stopped | not playing |
//! | error | not playing, buffered reset, polling stopped |
//!
//! Every status is re-emitted under the [`StatusCode`] with the same name.
//!
//! ## Poll cycle
//!
//! 1. Pull the duration while unknown; cache it rounded to 2 decimals and emit
//!    `DurationChange`. A lazy `duration()` read that finds it first emits the
//!    same message.
//! 2. Pull the buffered fraction; when it changed, emit `Progress` with a
//!    single buffered range `0..fraction * duration`.
//! 3. Pull the position. Negative readings and pull failures end the cycle.
//! 4. Store the rounded position, feed the [`StallDetector`], recompute the
//!    completed ratio and emit `ProgressEnabled` once per native handle.
//! 5. Emit `Position`.
//!
//! Natural completion releases the handle (see
//! [`PlaybackConfig::release_on_complete`]).

use crate::error::{PlaybackError, Result};
use crate::stall::StallDetector;
use crate::track::{
    clamp_volume, round2, seek_target, AudioTrack, PlaybackState, TrackFlags, TrackId,
};
use bridge_traits::{
    HandleListener, HandleStatus, MediaError, MediaHandle, MediaHandleFactory, PlayOptions,
};
use core_runtime::config::PlaybackConfig;
use core_runtime::events::{Message, MessageChannel, MessageValue, StatusCode, TimeRanges};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// Track backed by a poll-driven native media handle.
pub struct PolledTrack {
    id: TrackId,
    inner: Arc<PolledInner>,
}

struct PolledInner {
    src: String,
    factory: Arc<dyn MediaHandleFactory>,
    config: PlaybackConfig,
    channel: MessageChannel,
    state: parking_lot::Mutex<PolledState>,
}

struct PolledState {
    handle: Option<Arc<dyn MediaHandle>>,
    /// Bumped whenever a handle is created or released.
    generation: u64,
    timer: Option<JoinHandle<()>>,
    flags: TrackFlags,
    progress: f64,
    completed: f64,
    duration: Option<f64>,
    buffered: f64,
    volume: f64,
    progress_enabled_sent: bool,
    detector: StallDetector,
    last_error: Option<MediaError>,
    /// The factory refused to create a handle on the last attempt.
    unavailable: bool,
}

impl PolledState {
    fn new() -> Self {
        Self {
            handle: None,
            generation: 0,
            timer: None,
            flags: TrackFlags::default(),
            progress: 0.0,
            completed: 0.0,
            duration: None,
            buffered: 0.0,
            volume: 1.0,
            progress_enabled_sent: false,
            detector: StallDetector::new(),
            last_error: None,
            unavailable: false,
        }
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Returns the handle if `generation` is still current.
    fn handle_for(&self, generation: u64) -> Option<Arc<dyn MediaHandle>> {
        if self.generation == generation {
            self.handle.clone()
        } else {
            None
        }
    }

    /// Caches a native duration reading, rounded. Unknown and non-positive
    /// readings are ignored; the cached value never decreases.
    fn observe_duration(&mut self, raw: f64) -> bool {
        if !(raw.is_finite() && raw > 0.0) {
            return false;
        }
        let duration = round2(raw);
        if self.duration.map_or(true, |current| duration > current) {
            self.duration = Some(duration);
            return true;
        }
        false
    }
}

/// Listener handed to the native handle; routes callbacks back to the track.
struct HandleEvents {
    inner: Weak<PolledInner>,
    generation: u64,
}

impl HandleListener for HandleEvents {
    fn on_status(&self, status: HandleStatus, detail: Option<MediaError>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.handle_status(self.generation, status, detail);
        }
    }

    fn on_complete(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.handle_complete(self.generation);
        }
    }

    fn on_error(&self, error: MediaError) {
        if let Some(inner) = self.inner.upgrade() {
            inner.handle_error(self.generation, error);
        }
    }

    fn on_initial_volume(&self, volume: f64) {
        if let Some(inner) = self.inner.upgrade() {
            let mut state = inner.state.lock();
            if state.generation == self.generation {
                state.volume = clamp_volume(volume);
                debug!(src = %inner.src, volume = state.volume, "Got initial volume");
            }
        }
    }
}

impl PolledTrack {
    /// Creates a track for `src`. The native handle is created on first
    /// `play()`.
    pub fn new(
        src: impl Into<String>,
        factory: Arc<dyn MediaHandleFactory>,
        config: PlaybackConfig,
    ) -> Self {
        let channel = MessageChannel::new(config.event_buffer_size);
        Self {
            id: TrackId::default(),
            inner: Arc::new(PolledInner {
                src: src.into(),
                factory,
                config,
                channel,
                state: parking_lot::Mutex::new(PolledState::new()),
            }),
        }
    }

    /// Runs one poll cycle immediately.
    ///
    /// Useful when the host resumes from the background, where the OS may
    /// have suspended playback without telling the native layer.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::NoActiveHandle`] when no native handle exists.
    pub async fn poll_now(&self) -> Result<()> {
        let generation = {
            let state = self.inner.state.lock();
            if state.handle.is_none() {
                return Err(PlaybackError::NoActiveHandle);
            }
            state.generation
        };

        self.inner.sample(generation).await;
        Ok(())
    }

    /// Whether the poll timer is running.
    pub fn is_polling(&self) -> bool {
        self.inner
            .state
            .lock()
            .timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    /// The last positions fed to the stall detector, oldest first.
    pub fn recent_positions(&self) -> [f64; 3] {
        *self.inner.state.lock().detector.positions()
    }

    fn handle(&self) -> Option<Arc<dyn MediaHandle>> {
        self.inner.state.lock().handle.clone()
    }
}

impl PolledInner {
    /// Returns the current handle, creating one if none exists.
    fn attach(self: &Arc<Self>) -> Option<Arc<dyn MediaHandle>> {
        let generation = {
            let mut state = self.state.lock();
            if let Some(handle) = &state.handle {
                return Some(Arc::clone(handle));
            }
            state.generation += 1;
            state.progress_enabled_sent = false;
            state.generation
        };

        let listener = Arc::new(HandleEvents {
            inner: Arc::downgrade(self),
            generation,
        });

        match self.factory.create(&self.src, listener) {
            Ok(handle) => {
                debug!(src = %self.src, generation, "Created media handle");
                let mut state = self.state.lock();
                state.handle = Some(Arc::clone(&handle));
                state.unavailable = false;
                Some(handle)
            }
            Err(e) => {
                warn!(src = %self.src, error = %e, "Media handle unavailable, track is inert");
                self.state.lock().unavailable = true;
                None
            }
        }
    }

    fn emit(&self, status: StatusCode, value: MessageValue) {
        self.channel.emit(Message::new(status, value)).ok();
    }

    fn handle_status(&self, generation: u64, status: HandleStatus, detail: Option<MediaError>) {
        let mut state = self.state.lock();
        if state.generation != generation {
            trace!(src = %self.src, ?status, "Ignoring status from released handle");
            return;
        }
        debug!(src = %self.src, ?status, "Native status");

        let message = match status {
            HandleStatus::None => Message::new(StatusCode::None, MessageValue::None),
            HandleStatus::Starting => {
                debug!(src = %self.src, "Loaded track");
                state.flags.has_loaded = true;
                Message::new(StatusCode::Starting, MessageValue::None)
            }
            HandleStatus::Running => {
                info!(src = %self.src, "Playing track");
                state.flags.is_playing = true;
                state.flags.is_loading = false;
                Message::new(StatusCode::Running, MessageValue::None)
            }
            HandleStatus::Paused => {
                info!(src = %self.src, "Paused track");
                state.flags.is_playing = false;
                Message::new(StatusCode::Paused, MessageValue::None)
            }
            HandleStatus::Stopped => {
                info!(src = %self.src, "Stopped track");
                state.flags.is_playing = false;
                Message::new(StatusCode::Stopped, MessageValue::None)
            }
            HandleStatus::Error => {
                warn!(src = %self.src, ?detail, "Audio error state");
                state.flags.is_playing = false;
                state.buffered = 0.0;
                state.stop_timer();
                if let Some(error) = &detail {
                    state.last_error = Some(error.clone());
                }
                let value = detail.map_or(MessageValue::None, MessageValue::Error);
                Message::new(StatusCode::Error, value)
            }
        };

        self.channel.emit(message).ok();
    }

    fn handle_complete(&self, generation: u64) {
        let handle = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            info!(src = %self.src, "Finished playback");
            state.stop_timer();
            state.progress = 0.0;
            state.completed = 0.0;
            state.buffered = 0.0;
            state.flags.has_loaded = false;
            state.flags.is_loading = false;
            state.flags.is_finished = true;
            state.flags.is_playing = false;

            if !self.config.release_on_complete {
                return;
            }
            state.generation += 1;
            state.detector.reset();
            state.handle.take()
        };

        if let Some(handle) = handle {
            handle.release();
            info!(src = %self.src, "Released track");
        }
    }

    fn handle_error(&self, generation: u64, error: MediaError) {
        let mut state = self.state.lock();
        if state.generation != generation {
            return;
        }
        warn!(src = %self.src, %error, "Audio error");
        state.flags.is_playing = false;
        state.last_error = Some(error.clone());
        self.channel
            .emit(Message::new(StatusCode::Error, MessageValue::Error(error)))
            .ok();
    }

    fn pause(&self) {
        let handle = {
            let mut state = self.state.lock();
            if !state.flags.is_playing {
                return;
            }
            state.flags.is_playing = false;
            state.stop_timer();
            state.handle.clone()
        };

        info!(src = %self.src, "Pausing track");
        if let Some(handle) = handle {
            handle.pause();
        }
    }

    fn start_timer(self: &Arc<Self>, generation: u64) {
        let mut state = self.state.lock();
        state.stop_timer();
        state.detector.reset();

        if tokio::runtime::Handle::try_current().is_err() {
            warn!(src = %self.src, "No async runtime available, position polling disabled");
            return;
        }

        let period = self.config.poll_interval;
        state.timer = Some(spawn_poll_loop(run_poll_loop(
            Arc::downgrade(self),
            generation,
            period,
        )));
    }

    /// Runs one poll cycle against the handle of `generation`.
    ///
    /// Returns `false` once the cycle observed that polling should end.
    async fn sample(&self, generation: u64) -> bool {
        let (handle, duration_known) = {
            let state = self.state.lock();
            match state.handle_for(generation) {
                Some(handle) => (handle, state.duration.is_some()),
                None => return false,
            }
        };

        if !duration_known {
            let raw = handle.duration();
            let mut state = self.state.lock();
            if state.generation != generation {
                return false;
            }
            if state.observe_duration(raw) {
                debug!(src = %self.src, duration = ?state.duration, "Duration available");
                if let Some(duration) = state.duration {
                    self.emit(StatusCode::DurationChange, MessageValue::Duration(duration));
                }
            }
        }

        let fraction = handle.buffered_fraction();
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return false;
            }
            if let Some(duration) = state.duration {
                if fraction > 0.0 && fraction != state.buffered {
                    state.buffered = fraction;
                    self.emit(
                        StatusCode::Progress,
                        MessageValue::Buffered {
                            buffered: TimeRanges::from_start(fraction * duration),
                            fraction,
                        },
                    );
                }
            }
        }

        let position = match handle.current_position().await {
            Ok(position) => position,
            Err(e) => {
                warn!(src = %self.src, error = %e, "Error getting position");
                return true;
            }
        };
        if position < 0.0 {
            trace!(src = %self.src, position, "Position not available yet");
            return true;
        }

        let stalled = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return false;
            }

            state.progress = round2(position);
            let progress = state.progress;
            let stalled = state.detector.record(progress);
            state.completed = match state.duration {
                Some(duration) => round2(progress / duration).min(1.0),
                None => 0.0,
            };
            trace!(src = %self.src, position = progress, completed = state.completed, "Polled position");

            if state.duration.is_some() && progress > 0.0 && !state.progress_enabled_sent {
                state.progress_enabled_sent = true;
                self.emit(StatusCode::ProgressEnabled, MessageValue::None);
            }
            self.emit(
                StatusCode::Position,
                MessageValue::Position {
                    completed: state.completed,
                    position: progress,
                },
            );
            stalled
        };

        if stalled {
            debug!(src = %self.src, "Position stalled, pausing");
            self.pause();
            return false;
        }
        true
    }
}

async fn run_poll_loop(inner: Weak<PolledInner>, generation: u64, period: Duration) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        if !inner.sample(generation).await {
            break;
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_poll_loop<F>(future: F) -> JoinHandle<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(future)
}

#[cfg(target_arch = "wasm32")]
fn spawn_poll_loop<F>(future: F) -> JoinHandle<()>
where
    F: std::future::Future<Output = ()> + 'static,
{
    tokio::task::spawn_local(future)
}

impl AudioTrack for PolledTrack {
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
        let Some(handle) = self.inner.attach() else {
            return;
        };

        let generation = {
            let mut state = self.inner.state.lock();
            if !state.flags.has_loaded {
                info!(src = %self.inner.src, "Loading track");
                state.flags.is_loading = true;
            }
            state.flags.is_finished = false;
            state.last_error = None;
            state.generation
        };

        handle.play(PlayOptions {
            play_when_locked: self.inner.config.play_when_locked,
        });
        self.inner.start_timer(generation);
    }

    fn pause(&self) {
        self.inner.pause();
    }

    fn stop(&self) {
        let handle = {
            let mut state = self.inner.state.lock();
            state.stop_timer();
            state.handle.clone()
        };

        if let Some(handle) = handle {
            info!(src = %self.inner.src, "Stopping track");
            handle.stop();
        }
    }

    fn seek_to(&self, time: f64, by_percent: bool) {
        let Some(handle) = self.handle() else {
            return;
        };
        let duration = if by_percent { self.duration() } else { None };

        self.inner.emit(StatusCode::Seek, MessageValue::Seek(time));

        match seek_target(time, by_percent, duration) {
            Some(seconds) => {
                let millis = (seconds * 1000.0).max(0.0) as u64;
                debug!(src = %self.inner.src, millis, "Seeking");
                handle.seek_to(millis);
            }
            None => debug!(src = %self.inner.src, time, "Duration unknown, percentage seek skipped"),
        }
    }

    fn set_volume(&self, volume: f64) {
        let volume = clamp_volume(volume);
        let handle = {
            let mut state = self.inner.state.lock();
            state.volume = volume;
            state.handle.clone()
        };
        if let Some(handle) = handle {
            handle.set_volume(volume);
        }
    }

    fn destroy(&self) {
        let handle = {
            let mut state = self.inner.state.lock();
            let Some(handle) = state.handle.take() else {
                return;
            };
            state.stop_timer();
            state.generation += 1;
            state.flags = TrackFlags::default();
            state.progress = 0.0;
            state.completed = 0.0;
            state.buffered = 0.0;
            state.detector.reset();
            state.last_error = None;
            handle
        };

        handle.release();
        info!(src = %self.inner.src, "Released track");
    }

    fn observer(&self) -> &MessageChannel {
        &self.inner.channel
    }

    fn duration(&self) -> Option<f64> {
        let handle = {
            let state = self.inner.state.lock();
            if state.duration.is_some() {
                return state.duration;
            }
            state.handle.clone()
        };

        // The poll cycle only announces durations it finds unknown
        let raw = handle?.duration();
        let mut state = self.inner.state.lock();
        if state.observe_duration(raw) {
            if let Some(duration) = state.duration {
                self.inner
                    .emit(StatusCode::DurationChange, MessageValue::Duration(duration));
            }
        }
        state.duration
    }

    fn buffered_percent(&self) -> f64 {
        let handle = {
            let state = self.inner.state.lock();
            if state.buffered > 0.0 {
                return state.buffered;
            }
            state.handle.clone()
        };

        let Some(handle) = handle else {
            return 0.0;
        };
        let fraction = handle.buffered_fraction().max(0.0).min(1.0);
        self.inner.state.lock().buffered = fraction;
        fraction
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
        !self.inner.state.lock().unavailable
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
        self.inner.state.lock().last_error.clone()
    }

    fn state(&self) -> PlaybackState {
        self.inner.state.lock().flags.state()
    }
}

impl Drop for PolledTrack {
    fn drop(&mut self) {
        let handle = {
            let mut state = self.inner.state.lock();
            state.stop_timer();
            state.generation += 1;
            state.handle.take()
        };
        if let Some(handle) = handle {
            handle.release();
        }
    }
}

impl fmt::Debug for PolledTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolledTrack")
            .field("src", &self.inner.src)
            .field("id", &self.id.get())
            .field("state", &self.state())
            .field("polling", &self.is_polling())
            .finish()
    }
}
