//! RGSS error types

use thiserror::Error;

/// Result type used across the runtime
pub type RgssResult<T> = Result<T, RgssError>;

/// Runtime errors surfaced to the calling script
#[derive(Debug, Error)]
pub enum RgssError {
    /// Invalid dimension or argument at creation time
    #[error("Construction error: {0}")]
    Construction(String),

    /// Operation on a disposed or unknown entity
    #[error("Resource state error: {0}")]
    ResourceState(String),

    /// Feature or format the runtime does not support
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Malformed serialized data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Font error: {0}")]
    Font(String),

    /// Display device failure
    #[error("Device error: {0}")]
    Device(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RgssError {
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction(message.into())
    }

    /// Error for an operation attempted on a disposed object
    pub fn disposed(what: &str) -> Self {
        Self::ResourceState(format!("{} has been disposed", what))
    }

    pub fn resource_state(message: impl Into<String>) -> Self {
        Self::ResourceState(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    /// Whether this error came from argument validation at construction time
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Construction(_))
    }

    /// Whether this error came from touching a disposed object
    pub fn is_resource_state(&self) -> bool {
        matches!(self, Self::ResourceState(_))
    }
}
