//! # Playback Track Module
//!
//! Provides one playback contract over two incompatible native audio
//! primitives.
//!
//! ## Overview
//!
//! This module handles:
//! - The [`AudioTrack`] contract shared by every backend
//! - An event-driven backend translating media element events ([`ElementTrack`])
//! - A poll-driven backend synthesizing telemetry from a native handle ([`PolledTrack`])
//! - Stall detection for native layers that never report an unexpected pause
//! - Backend resolution from injected capabilities ([`TrackBackend`])

pub mod backend;
pub mod element;
pub mod error;
pub mod polled;
pub mod stall;
pub mod track;

pub use backend::TrackBackend;
pub use element::ElementTrack;
pub use error::{PlaybackError, Result};
pub use polled::PolledTrack;
pub use stall::StallDetector;
pub use track::{AudioTrack, PlaybackState};
