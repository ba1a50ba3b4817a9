//! Error types for backdrop.
//!
//! The simulation engine itself is infallible: an unavailable canvas or a
//! degenerate number simply produces an empty or neutral frame. Errors only
//! exist at the edges where the engine meets the outside world: loading
//! configuration, parsing names, writing snapshots, and driving a window.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or does not match the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be written back out as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A value parsed correctly but cannot be used.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// An unknown name was given for a variant or theme.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}` (expected one of: {expected})")]
pub struct ParseKindError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Errors that can occur when exporting a frame to an image file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The surface has no canvas (not mounted, disposed, or zero-sized).
    #[error("surface has no canvas to capture")]
    Unavailable,
    /// Encoding or writing the image failed.
    #[error("failed to write snapshot: {0}")]
    Encode(#[from] image::ImageError),
}

/// Errors that can occur when running the windowed viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Failed to create or run the event loop.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// Failed to create, resize, or present the software framebuffer.
    #[error("failed to present frame: {0}")]
    Present(#[from] softbuffer::SoftBufferError),
}
