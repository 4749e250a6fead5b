//! Fake native primitives shared by the track integration tests.
//!
//! The fakes record every command they receive and let tests fire the
//! callbacks a real native layer would fire.

#![allow(dead_code)]

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BridgeError, ElementEvent, ElementListener, HandleListener, HandleStatus, MediaElement,
    MediaElementFactory, MediaError, MediaHandle, MediaHandleFactory, PlayOptions, Preload,
};
use core_runtime::events::{Message, MessageStream, StatusCode};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ============================================================================
// Poll-driven handle
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum HandleCommand {
    Play(PlayOptions),
    Pause,
    Stop,
    Seek(u64),
    Volume(f64),
    Release,
}

struct FakeHandleState {
    duration: f64,
    buffered: f64,
    positions: VecDeque<BridgeResult<f64>>,
    commands: Vec<HandleCommand>,
}

pub struct FakeHandle {
    pub src: String,
    listener: Arc<dyn HandleListener>,
    state: Mutex<FakeHandleState>,
}

impl FakeHandle {
    fn new(src: &str, listener: Arc<dyn HandleListener>) -> Self {
        Self {
            src: src.to_string(),
            listener,
            state: Mutex::new(FakeHandleState {
                duration: -1.0,
                buffered: 0.0,
                positions: VecDeque::new(),
                commands: Vec::new(),
            }),
        }
    }

    pub fn set_duration(&self, duration: f64) {
        self.state.lock().unwrap().duration = duration;
    }

    pub fn set_buffered(&self, fraction: f64) {
        self.state.lock().unwrap().buffered = fraction;
    }

    /// Queues position readings returned by subsequent pulls.
    pub fn push_positions(&self, positions: &[f64]) {
        let mut state = self.state.lock().unwrap();
        state.positions.extend(positions.iter().map(|p| Ok(*p)));
    }

    pub fn push_position_error(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .positions
            .push_back(Err(BridgeError::OperationFailed(message.to_string())));
    }

    pub fn commands(&self) -> Vec<HandleCommand> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn count(&self, command: &HandleCommand) -> usize {
        self.commands().iter().filter(|c| *c == command).count()
    }

    pub fn pauses(&self) -> usize {
        self.count(&HandleCommand::Pause)
    }

    pub fn released(&self) -> bool {
        self.count(&HandleCommand::Release) > 0
    }

    pub fn report(&self, status: HandleStatus) {
        self.listener.on_status(status, None);
    }

    pub fn report_error_state(&self, error: MediaError) {
        self.listener.on_status(HandleStatus::Error, Some(error));
    }

    pub fn complete(&self) {
        self.listener.on_complete();
    }

    pub fn fail(&self, error: MediaError) {
        self.listener.on_error(error);
    }

    pub fn report_initial_volume(&self, volume: f64) {
        self.listener.on_initial_volume(volume);
    }

    fn record(&self, command: HandleCommand) {
        self.state.lock().unwrap().commands.push(command);
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl MediaHandle for FakeHandle {
    fn duration(&self) -> f64 {
        self.state.lock().unwrap().duration
    }

    fn buffered_fraction(&self) -> f64 {
        self.state.lock().unwrap().buffered
    }

    async fn current_position(&self) -> BridgeResult<f64> {
        self.state
            .lock()
            .unwrap()
            .positions
            .pop_front()
            .unwrap_or(Ok(-1.0))
    }

    fn play(&self, options: PlayOptions) {
        self.record(HandleCommand::Play(options));
    }

    fn pause(&self) {
        self.record(HandleCommand::Pause);
    }

    fn stop(&self) {
        self.record(HandleCommand::Stop);
    }

    fn seek_to(&self, millis: u64) {
        self.record(HandleCommand::Seek(millis));
    }

    fn set_volume(&self, volume: f64) {
        self.record(HandleCommand::Volume(volume));
    }

    fn release(&self) {
        self.record(HandleCommand::Release);
    }
}

/// Hands out [`FakeHandle`]s and remembers every one it created.
#[derive(Default)]
pub struct FakeHandleFactory {
    unavailable: bool,
    handles: Mutex<Vec<Arc<FakeHandle>>>,
}

impl FakeHandleFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A factory for a host without the native bridge.
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            unavailable: true,
            ..Self::default()
        })
    }

    pub fn created(&self) -> usize {
        self.handles.lock().unwrap().len()
    }

    pub fn handle(&self, index: usize) -> Arc<FakeHandle> {
        Arc::clone(&self.handles.lock().unwrap()[index])
    }

    pub fn latest(&self) -> Arc<FakeHandle> {
        let handles = self.handles.lock().unwrap();
        Arc::clone(handles.last().expect("no handle created"))
    }
}

impl MediaHandleFactory for FakeHandleFactory {
    fn create(
        &self,
        src: &str,
        listener: Arc<dyn HandleListener>,
    ) -> BridgeResult<Arc<dyn MediaHandle>> {
        if self.unavailable {
            return Err(BridgeError::NotAvailable("Media plugin not installed".into()));
        }
        let handle = Arc::new(FakeHandle::new(src, listener));
        self.handles.lock().unwrap().push(Arc::clone(&handle));
        Ok(handle)
    }
}

// ============================================================================
// Event-driven element
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ElementCommand {
    Play,
    Pause,
    Seek(f64),
    Volume(f64),
}

struct FakeElementState {
    current_time: f64,
    duration: f64,
    paused: bool,
    volume: f64,
    error: Option<MediaError>,
    commands: Vec<ElementCommand>,
}

pub struct FakeElement {
    pub src: String,
    pub preload: Preload,
    playable: Vec<String>,
    listener: Arc<dyn ElementListener>,
    state: Mutex<FakeElementState>,
}

impl FakeElement {
    /// Sets what the element reports for current time and duration.
    pub fn set_times(&self, current_time: f64, duration: f64) {
        let mut state = self.state.lock().unwrap();
        state.current_time = current_time;
        state.duration = duration;
    }

    pub fn set_error(&self, error: MediaError) {
        self.state.lock().unwrap().error = Some(error);
    }

    pub fn fire(&self, event: ElementEvent) {
        self.listener.on_event(event);
    }

    pub fn commands(&self) -> Vec<ElementCommand> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn count(&self, command: &ElementCommand) -> usize {
        self.commands().iter().filter(|c| *c == command).count()
    }

    fn record(&self, command: ElementCommand) {
        self.state.lock().unwrap().commands.push(command);
    }
}

impl MediaElement for FakeElement {
    fn play(&self) {
        self.state.lock().unwrap().paused = false;
        self.record(ElementCommand::Play);
    }

    fn pause(&self) {
        self.state.lock().unwrap().paused = true;
        self.record(ElementCommand::Pause);
    }

    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        self.state.lock().unwrap().current_time = seconds;
        self.record(ElementCommand::Seek(seconds));
    }

    fn duration(&self) -> f64 {
        self.state.lock().unwrap().duration
    }

    fn paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn volume(&self) -> f64 {
        self.state.lock().unwrap().volume
    }

    fn set_volume(&self, volume: f64) {
        self.state.lock().unwrap().volume = volume;
        self.record(ElementCommand::Volume(volume));
    }

    fn can_play_type(&self, mime_type: &str) -> bool {
        self.playable.iter().any(|playable| playable == mime_type)
    }

    fn error(&self) -> Option<MediaError> {
        self.state.lock().unwrap().error.clone()
    }
}

/// Hands out [`FakeElement`]s and remembers every one it created.
pub struct FakeElementFactory {
    unavailable: bool,
    playable: Vec<String>,
    elements: Mutex<Vec<Arc<FakeElement>>>,
}

impl FakeElementFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            unavailable: false,
            playable: vec!["audio/mp3".to_string(), "audio/ogg".to_string()],
            elements: Mutex::new(Vec::new()),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            unavailable: true,
            playable: Vec::new(),
            elements: Mutex::new(Vec::new()),
        })
    }

    pub fn created(&self) -> usize {
        self.elements.lock().unwrap().len()
    }

    pub fn element(&self, index: usize) -> Arc<FakeElement> {
        Arc::clone(&self.elements.lock().unwrap()[index])
    }

    pub fn latest(&self) -> Arc<FakeElement> {
        let elements = self.elements.lock().unwrap();
        Arc::clone(elements.last().expect("no element created"))
    }
}

impl MediaElementFactory for FakeElementFactory {
    fn create(
        &self,
        src: &str,
        preload: Preload,
        listener: Arc<dyn ElementListener>,
    ) -> BridgeResult<Arc<dyn MediaElement>> {
        if self.unavailable {
            return Err(BridgeError::NotAvailable("No media element support".into()));
        }
        let element = Arc::new(FakeElement {
            src: src.to_string(),
            preload,
            playable: self.playable.clone(),
            listener,
            state: Mutex::new(FakeElementState {
                current_time: 0.0,
                duration: f64::NAN,
                paused: true,
                volume: 1.0,
                error: None,
                commands: Vec::new(),
            }),
        });
        self.elements.lock().unwrap().push(Arc::clone(&element));
        Ok(element)
    }
}

// ============================================================================
// Message helpers
// ============================================================================

pub fn statuses(messages: &[Message]) -> Vec<StatusCode> {
    messages.iter().map(|message| message.status()).collect()
}

/// Drains everything queued on `stream` and returns the statuses.
pub fn drain_statuses(stream: &mut MessageStream) -> Vec<StatusCode> {
    statuses(&stream.drain())
}
