//! # Core Runtime Module
//!
//! Provides the runtime infrastructure shared by every track backend:
//! - Message channel (status codes, messages, broadcast subscription)
//! - Configuration and capability injection
//! - Logging and tracing bootstrap
//!
//! ## Overview
//!
//! Tracks publish status-tagged [`Message`](events::Message)s on a
//! [`MessageChannel`](events::MessageChannel) they own for their whole
//! lifetime. Native capabilities are resolved once at the application
//! boundary through [`CoreConfig`](config::CoreConfig) and passed down
//! explicitly.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{BackendPreference, CoreConfig, CoreConfigBuilder, PlaybackConfig};
pub use error::{Error, Result};
pub use events::{Message, MessageChannel, MessageStream, MessageValue, StatusCode, TimeRanges};
