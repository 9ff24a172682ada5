// Error types for the JSON renderer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    /// A value could not be encoded against its descriptor.
    ///
    /// `path` locates the offending value (`$`, `$.user.name`, `$.items[2]`).
    #[error("Encoding error at {path}: {reason}")]
    Encoding { path: String, reason: String },

    #[error("Invalid type descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("No renderer installed under '{0}'")]
    UnknownRenderer(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn encoding(path: impl Into<String>, reason: impl Into<String>) -> Self {
        RenderError::Encoding {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error was raised while encoding a value
    pub fn is_encoding(&self) -> bool {
        matches!(self, RenderError::Encoding { .. })
    }
}

impl From<RenderError> for armature_core::Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Encoding { .. } | RenderError::InvalidDescriptor(_) => {
                armature_core::Error::Serialization(err.to_string())
            }
            RenderError::ConfigLoad(_) | RenderError::ConfigParse(_) => {
                armature_core::Error::Configuration(err.to_string())
            }
            RenderError::UnknownRenderer(_) => armature_core::Error::Internal(err.to_string()),
            RenderError::Io(e) => armature_core::Error::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
