//! # Playback Error Types
//!
//! Track commands never fail: native failures surface as `Error` messages on
//! the track's channel, pull failures are logged, arguments are clamped. The
//! errors below cover the few fallible APIs around the commands.

use thiserror::Error;

/// Errors that can occur around track operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The owning collection already assigned an identity to this track.
    #[error("Track id already assigned: {current} (requested {requested})")]
    IdAlreadyAssigned { current: u64, requested: u64 },

    /// The track has no native object to operate on.
    #[error("No active native handle")]
    NoActiveHandle,

    /// Configuration or capability resolution failed.
    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

impl PlaybackError {
    /// Returns `true` if the host lacks a required native capability.
    pub fn is_capability_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::Runtime(core_runtime::Error::CapabilityMissing { .. })
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_classification() {
        let config: PlaybackError = core_runtime::Error::Config("zero interval".into()).into();
        assert!(!config.is_capability_error());

        let runtime: PlaybackError = core_runtime::Error::CapabilityMissing {
            capability: "MediaHandleFactory".into(),
            message: "inject it".into(),
        }
        .into();
        assert!(runtime.is_capability_error());
        assert!(!PlaybackError::NoActiveHandle.is_capability_error());
    }

    #[test]
    fn test_id_error_message() {
        let err = PlaybackError::IdAlreadyAssigned {
            current: 3,
            requested: 7,
        };
        assert_eq!(err.to_string(), "Track id already assigned: 3 (requested 7)");
    }
}
