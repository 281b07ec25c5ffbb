/// Result alias that carries the custom [`BraidError`] type.
pub type Result<T> = std::result::Result<T, BraidError>;

/// Common error type for the core crate.
///
/// Nothing inside the frame loop is fatal: geometry, input and texture problems
/// are recovered locally. These variants surface from configuration loading,
/// exports and backend calls, where the caller decides what to do.
#[derive(Debug, thiserror::Error)]
pub enum BraidError {
    /// Free-form message for failures that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration files that could not be parsed or serialised.
    #[error("configuration error: {0}")]
    Json(#[from] serde_json::Error),
    /// Texture files that could not be decoded.
    #[error("texture error: {0}")]
    Image(#[from] image::ImageError),
    /// A configuration value outside the range the engine can work with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A parameter name that does not map onto any camera or group field.
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
}

impl BraidError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn invalid_config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
