//! # Host Bridge Traits
//!
//! Native media abstraction traits that must be implemented by each host
//! platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the track layer and the native
//! audio primitives it drives. The primitives themselves are black boxes;
//! only their command surface and callback contract are specified here.
//!
//! ## Traits
//!
//! ### Event-driven primitive
//! - [`MediaElementFactory`](media::MediaElementFactory) - Creates elements for a source
//! - [`MediaElement`](media::MediaElement) - Commands and synchronous reads
//! - [`ElementListener`](media::ElementListener) - Receives pushed lifecycle events
//!
//! ### Poll-driven primitive
//! - [`MediaHandleFactory`](media::MediaHandleFactory) - Creates handles for a source
//! - [`MediaHandle`](media::MediaHandle) - Commands plus duration/buffer/position pulls
//! - [`HandleListener`](media::HandleListener) - Status, completion and error callbacks
//!
//! ## Platform Requirements
//!
//! | Platform | Primitive | Typical backing |
//! |----------|-----------|-----------------|
//! | Browser / desktop WebView | event-driven | HTML media element |
//! | Mobile WebView bridge | poll-driven | OS media player behind the bridge |
//!
//! ## Missing Capabilities
//!
//! Factories report a missing native layer with
//! [`BridgeError::NotAvailable`](error::BridgeError::NotAvailable). The track
//! layer degrades to an inert track instead of failing.
//!
//! ## Thread Safety
//!
//! Native targets require `Send + Sync` (see [`platform::PlatformSendSync`]);
//! on `wasm32` the bounds are dropped.

pub mod error;
pub mod media;
pub mod platform;

pub use error::BridgeError;

// Re-export commonly used types
pub use media::{
    ElementEvent, ElementListener, HandleListener, HandleStatus, MediaElement,
    MediaElementFactory, MediaError, MediaErrorKind, MediaHandle, MediaHandleFactory,
    PlayOptions, Preload,
};
