//! # Message Channel
//!
//! Provides the status-tagged event stream every track publishes on, built on
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The message channel consists of:
//! - **StatusCode**: Dense, append-only enumeration of event kinds
//! - **Message**: Immutable value whose `eventName` is derived from its status
//! - **MessageChannel**: Single-producer, multi-consumer broadcast channel
//! - **MessageStream**: Subscriber wrapper with optional filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  native event  ┌───────┐    emit     ┌────────────────┐   subscribe   ┌────────────┐
//! │ native media ├───────────────>│ Track ├────────────>│ MessageChannel ├──────────────>│ Subscriber │
//! └──────────────┘                └───────┘             └────────────────┘               └────────────┘
//! ```
//!
//! Delivery is multicast and replay-free: a subscriber only observes messages
//! emitted after it subscribed. The channel outlives the native object that
//! feeds it, so subscribers keep receiving after a track recreates its native
//! handle.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{Message, MessageChannel, MessageValue, StatusCode};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let channel = MessageChannel::new(16);
//! let mut stream = channel.subscribe();
//!
//! channel.emit(Message::new(StatusCode::Running, MessageValue::None)).ok();
//!
//! let message = stream.recv().await.unwrap();
//! assert_eq!(message.event_name(), "Running");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` messages.
//!   This is non-fatal; the subscriber keeps receiving newer messages.
//! - **`RecvError::Closed`**: The owning track was dropped.

use bridge_traits::MediaError;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for a track's message channel.
///
/// Subscribers that fall further behind receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Status Codes
// ============================================================================

/// Human-readable names, index-aligned with [`StatusCode`].
pub const STATUS_NAMES: [&str; 15] = [
    "None",
    "Starting",
    "Running",
    "Paused",
    "Stopped",
    "Position",
    "Progress",
    "Suspend",
    "Seek",
    "Error",
    "DurationChange",
    "ProgressEnabled",
    "CanPlayThrough",
    "LoadStart",
    "LoadedMetadata",
];

/// Wire-level status code carried by every [`Message`].
///
/// The numeric values are persisted and logged by consumers. New codes are
/// appended at the end; existing values never move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum StatusCode {
    None = 0,
    Starting = 1,
    Running = 2,
    Paused = 3,
    Stopped = 4,
    Position = 5,
    Progress = 6,
    Suspend = 7,
    Seek = 8,
    Error = 9,
    DurationChange = 10,
    ProgressEnabled = 11,
    CanPlayThrough = 12,
    LoadStart = 13,
    LoadedMetadata = 14,
}

impl StatusCode {
    /// Every status code in table order.
    pub const ALL: [StatusCode; 15] = [
        StatusCode::None,
        StatusCode::Starting,
        StatusCode::Running,
        StatusCode::Paused,
        StatusCode::Stopped,
        StatusCode::Position,
        StatusCode::Progress,
        StatusCode::Suspend,
        StatusCode::Seek,
        StatusCode::Error,
        StatusCode::DurationChange,
        StatusCode::ProgressEnabled,
        StatusCode::CanPlayThrough,
        StatusCode::LoadStart,
        StatusCode::LoadedMetadata,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Looks up the status for a raw wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Name from the status table.
    pub fn name(self) -> &'static str {
        STATUS_NAMES[self as usize]
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

// ============================================================================
// Message Payloads
// ============================================================================

/// Buffered time ranges in seconds, shaped like a media element's
/// `TimeRanges`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRanges {
    ranges: Vec<(f64, f64)>,
}

impl TimeRanges {
    /// A single range spanning `0..end`.
    pub fn from_start(end: f64) -> Self {
        Self {
            ranges: vec![(0.0, end)],
        }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn start(&self, index: usize) -> Option<f64> {
        self.ranges.get(index).map(|(start, _)| *start)
    }

    pub fn end(&self, index: usize) -> Option<f64> {
        self.ranges.get(index).map(|(_, end)| *end)
    }
}

/// Payload attached to a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum MessageValue {
    /// No payload beyond the status itself.
    None,
    /// Playback position in seconds and the completed ratio in `[0, 1]`.
    Position { completed: f64, position: f64 },
    /// Newly observed duration in seconds.
    Duration(f64),
    /// Buffered ranges and the raw buffered fraction.
    Buffered { buffered: TimeRanges, fraction: f64 },
    /// The seek argument exactly as the caller passed it.
    Seek(f64),
    /// Native error, passed through verbatim.
    Error(MediaError),
}

// ============================================================================
// Message
// ============================================================================

/// Immutable, status-tagged event delivered to subscribers.
///
/// The event name is never supplied by the caller; it is always the
/// [`STATUS_NAMES`] entry for the status.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    status: StatusCode,
    value: MessageValue,
}

impl Message {
    pub fn new(status: StatusCode, value: MessageValue) -> Self {
        Self { status, value }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn value(&self) -> &MessageValue {
        &self.value
    }

    pub fn event_name(&self) -> &'static str {
        self.status.name()
    }

    pub fn into_value(self) -> MessageValue {
        self.value
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Message", 3)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("eventName", self.event_name())?;
        state.serialize_field("value", &self.value)?;
        state.end()
    }
}

// ============================================================================
// Message Channel
// ============================================================================

/// Broadcast channel owned by one track.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (messages are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
///
/// Cloning the channel yields another handle to the same underlying stream.
/// The channel is only closed when every handle is dropped.
#[derive(Clone)]
pub struct MessageChannel {
    sender: broadcast::Sender<Message>,
}

impl MessageChannel {
    /// Creates a new channel buffering up to `capacity` messages per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a message to all current subscribers.
    ///
    /// Returns the number of subscribers that received the message, or an
    /// error when nobody is subscribed.
    pub fn emit(&self, message: Message) -> Result<usize, SendError<Message>> {
        self.sender.send(message)
    }

    /// Creates a new subscriber. Past messages are not replayed.
    pub fn subscribe(&self) -> MessageStream {
        MessageStream::new(self.sender.subscribe())
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Returns `true` if both handles refer to the same underlying channel.
    pub fn same_channel(&self, other: &MessageChannel) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

impl Default for MessageChannel {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for MessageChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageChannel")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Message Stream
// ============================================================================

type MessageFilter = Box<dyn Fn(&Message) -> bool + Send + Sync>;

/// A subscriber on a [`MessageChannel`] with optional filtering.
///
/// ```rust
/// use core_runtime::events::{MessageChannel, StatusCode};
///
/// let channel = MessageChannel::new(16);
/// let errors = channel
///     .subscribe()
///     .filter(|message| message.status() == StatusCode::Error);
/// ```
pub struct MessageStream {
    receiver: Receiver<Message>,
    filter: Option<MessageFilter>,
}

impl MessageStream {
    pub fn new(receiver: Receiver<Message>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only messages matching `predicate` are returned by `recv()` and
    /// `try_recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, message: &Message) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(message))
    }

    /// Receives the next message that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// messages and `RecvError::Closed` once the owning track is gone.
    pub async fn recv(&mut self) -> Result<Message, RecvError> {
        loop {
            let message = self.receiver.recv().await?;
            if self.accepts(&message) {
                return Ok(message);
            }
        }
    }

    /// Attempts to receive a message without waiting.
    ///
    /// Returns `None` if no matching message is currently queued.
    pub fn try_recv(&mut self) -> Option<Result<Message, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => {
                    if self.accepts(&message) {
                        return Some(Ok(message));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drains every queued message that passes the filter.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Some(result) = self.try_recv() {
            match result {
                Ok(message) => messages.push(message),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        messages
    }
}

impl fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
