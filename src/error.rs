//! Error types for layout shift capture and rendering

use thiserror::Error;

/// Result type alias for capture and rendering operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while inspecting a page or rendering its shifts
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to start the browser or prepare the tab
    #[error("Browser initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load a URL
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// Failed to render a frame
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Failed to install or read the in-page recorder
    #[error("Script execution failed: {0}")]
    ScriptError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Cookie file missing or malformed
    #[error("Invalid cookie file: {0}")]
    CookieError(String),

    /// The page context cannot report layout shifts
    #[error("Layout shift observation is unavailable: {0}")]
    Unsupported(String),

    /// Geometry and shift values are not index-aligned
    #[error("Shift data integrity violation: {0}")]
    Integrity(String),

    /// Failed to decode the background or encode the animation
    #[error("Image encoding failed: {0}")]
    EncodeError(String),

    /// Filesystem failure while reading inputs or writing outputs
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::EncodeError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", err))
    }
}
